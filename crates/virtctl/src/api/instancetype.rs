//! `instancetype.kubevirt.io` instancetype and preference types.

use serde::Serialize;
use strum::{Display, EnumString, VariantNames};

use super::meta::ObjectMeta;
use crate::quantity::Quantity;

pub const INSTANCETYPE_KIND: &str = "VirtualMachineInstancetype";
pub const CLUSTER_INSTANCETYPE_KIND: &str = "VirtualMachineClusterInstancetype";
pub const PREFERENCE_KIND: &str = "VirtualMachinePreference";
pub const CLUSTER_PREFERENCE_KIND: &str = "VirtualMachineClusterPreference";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineInstancetype {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: InstancetypeSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstancetypeSpec {
    pub cpu: CpuInstancetype,
    pub memory: MemoryInstancetype,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub gpus: Vec<DeviceRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub host_devices: Vec<DeviceRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_threads_policy: Option<IoThreadsPolicy>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuInstancetype {
    pub guest: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryInstancetype {
    pub guest: Quantity,
}

/// A GPU or host device assigned to the guest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRequest {
    pub name: String,
    pub device_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, Display, VariantNames)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum IoThreadsPolicy {
    Shared,
    Auto,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachinePreference {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: PreferenceSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreferenceSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuPreferences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<VolumePreferences>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine: Option<MachinePreferences>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuPreferences {
    #[serde(rename = "preferredCPUTopology")]
    pub preferred_cpu_topology: PreferredCpuTopology,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumePreferences {
    pub preferred_storage_class_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MachinePreferences {
    pub preferred_machine_type: String,
}

/// Preferred guest CPU topology. The `prefer*` spellings are deprecated
/// aliases which are still accepted by the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, Display, VariantNames)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum PreferredCpuTopology {
    Sockets,
    Cores,
    Threads,
    Spread,
    Any,
    PreferSockets,
    PreferCores,
    PreferThreads,
    PreferSpread,
    PreferAny,
}
