//! The subset of the KubeVirt and CDI API types needed to describe the
//! manifests emitted by `virtctl create`.
//!
//! Types only carry the fields we populate. Empty collections and unset
//! options are left out of the serialized form.

use const_format::concatcp;

pub mod cdi;
pub mod clone;
pub mod instancetype;
pub mod kubevirt;
pub mod meta;

pub const KUBEVIRT_GROUP: &str = "kubevirt.io";
pub const KUBEVIRT_API_VERSION: &str = concatcp!(KUBEVIRT_GROUP, "/v1");

pub const INSTANCETYPE_GROUP: &str = concatcp!("instancetype.", KUBEVIRT_GROUP);
pub const INSTANCETYPE_API_VERSION: &str = concatcp!(INSTANCETYPE_GROUP, "/v1beta1");

pub const CLONE_GROUP: &str = concatcp!("clone.", KUBEVIRT_GROUP);
pub const CLONE_API_VERSION: &str = concatcp!(CLONE_GROUP, "/v1beta1");

pub const SNAPSHOT_GROUP: &str = concatcp!("snapshot.", KUBEVIRT_GROUP);
