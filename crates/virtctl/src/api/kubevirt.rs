//! `kubevirt.io/v1` VirtualMachine types.

use serde::Serialize;
use strum::{Display, EnumString, VariantNames};

use super::cdi::DataVolumeSpec;
use super::meta::{LocalObjectReference, ObjectMeta};
use crate::quantity::Quantity;

pub const VIRTUAL_MACHINE_KIND: &str = "VirtualMachine";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachine {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: VirtualMachineSpec,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, EnumString, Display, VariantNames,
)]
pub enum RunStrategy {
    #[default]
    Always,
    Manual,
    Halted,
    Once,
    RerunOnFailure,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_strategy: Option<RunStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instancetype: Option<Matcher>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preference: Option<Matcher>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_volume_templates: Vec<DataVolumeTemplateSpec>,
    pub template: VirtualMachineInstanceTemplateSpec,
}

/// How to react when an instancetype or preference cannot be inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InferFromVolumeFailurePolicy {
    Reject,
    Ignore,
}

/// Instancetype or preference matcher of a VirtualMachine.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Matcher {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub infer_from_volume: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infer_from_volume_failure_policy: Option<InferFromVolumeFailurePolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DataVolumeTemplateSpec {
    pub metadata: ObjectMeta,
    pub spec: DataVolumeSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VirtualMachineInstanceTemplateSpec {
    pub spec: VirtualMachineInstanceSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineInstanceSpec {
    pub domain: DomainSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_grace_period_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub access_credentials: Vec<AccessCredential>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DomainSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<Memory>,
    pub devices: Devices,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Memory {
    pub guest: Quantity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Devices {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disks: Vec<Disk>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Disk {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_order: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Volume {
    pub name: String,
    #[serde(flatten)]
    pub source: VolumeSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VolumeSource {
    ContainerDisk(ContainerDiskSource),
    PersistentVolumeClaim(PersistentVolumeClaimSource),
    DataVolume(DataVolumeRef),
    CloudInitNoCloud(CloudInitSource),
    CloudInitConfigDrive(CloudInitSource),
    Sysprep(SysprepSource),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerDiskSource {
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaimSource {
    pub claim_name: String,
}

/// Volume backed by a DataVolume, usually one from `dataVolumeTemplates`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataVolumeRef {
    pub name: String,
}

/// Payload of both the NoCloud and the ConfigDrive cloud-init volumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudInitSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_data_base64: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SysprepSource {
    ConfigMap(LocalObjectReference),
    Secret(LocalObjectReference),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessCredential {
    SshPublicKey(SshPublicKeyAccessCredential),
    UserPassword(UserPasswordAccessCredential),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SshPublicKeyAccessCredential {
    pub source: AccessCredentialSource,
    pub propagation_method: SshPropagationMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPasswordAccessCredential {
    pub source: AccessCredentialSource,
    pub propagation_method: PasswordPropagationMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessCredentialSource {
    pub secret: AccessCredentialSecretSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessCredentialSecretSource {
    pub secret_name: String,
}

impl AccessCredentialSource {
    pub fn secret(name: impl Into<String>) -> Self {
        Self {
            secret: AccessCredentialSecretSource {
                secret_name: name.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SshPropagationMethod {
    QemuGuestAgent(QemuGuestAgentSshPropagation),
    NoCloud(EmptyPropagation),
    ConfigDrive(EmptyPropagation),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QemuGuestAgentSshPropagation {
    pub users: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PasswordPropagationMethod {
    QemuGuestAgent(EmptyPropagation),
}

/// Serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmptyPropagation {}
