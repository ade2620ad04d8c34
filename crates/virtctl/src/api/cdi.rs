//! Containerized Data Importer types used in `dataVolumeTemplates`.

use std::collections::BTreeMap;

use serde::Serialize;
use strum::{Display, EnumString};

use crate::quantity::Quantity;

/// Where the data of a DataVolume comes from.
///
/// Serialized externally tagged, i.e. as `{http: {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataVolumeSource {
    Blank(BlankSource),
    Gcs(GcsSource),
    Http(HttpSource),
    Imageio(ImageIoSource),
    Pvc(PvcSource),
    Registry(RegistrySource),
    S3(S3Source),
    Snapshot(SnapshotSource),
    Vddk(VddkSource),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlankSource {}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GcsSource {
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub secret_ref: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpSource {
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub secret_ref: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cert_config_map: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_headers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secret_extra_headers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageIoSource {
    pub url: String,
    pub disk_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub secret_ref: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cert_config_map: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PvcSource {
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SnapshotSource {
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RegistryPullMethod {
    Pod,
    Node,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_stream: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_method: Option<RegistryPullMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_config_map: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Source {
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub secret_ref: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cert_config_map: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VddkSource {
    pub url: String,
    pub uuid: String,
    pub backing_file: String,
    pub thumbprint: String,
    pub secret_ref: String,
    #[serde(rename = "initImageURL", skip_serializing_if = "String::is_empty")]
    pub init_image_url: String,
}

pub const DATA_SOURCE_KIND: &str = "DataSource";

/// Reference to a DataSource populating the DataVolume.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataVolumeSourceRef {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceRequirements {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub requests: BTreeMap<String, Quantity>,
}

impl ResourceRequirements {
    fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StorageSpec {
    #[serde(skip_serializing_if = "ResourceRequirements::is_empty")]
    pub resources: ResourceRequirements,
}

impl StorageSpec {
    /// Storage requesting `size`, or leaving the size to the provisioner.
    pub fn with_size(size: Option<Quantity>) -> Self {
        let mut storage = Self::default();
        if let Some(size) = size {
            storage.resources.requests.insert("storage".into(), size);
        }
        storage
    }

    #[cfg(test)]
    pub fn size(&self) -> Option<&Quantity> {
        self.resources.requests.get("storage")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataVolumeSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<DataVolumeSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<DataVolumeSourceRef>,
    pub storage: StorageSpec,
}
