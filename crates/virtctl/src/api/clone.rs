//! `clone.kubevirt.io` VirtualMachineClone.

use std::collections::BTreeMap;

use serde::Serialize;

use super::meta::{ObjectMeta, TypedLocalObjectReference};

pub const CLONE_KIND: &str = "VirtualMachineClone";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineClone {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: CloneSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneSpec {
    pub source: TypedLocalObjectReference,
    pub target: TypedLocalObjectReference,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotation_filters: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub label_filters: Vec<String>,
    #[serde(skip_serializing_if = "CloneTemplateFilters::is_empty")]
    pub template: CloneTemplateFilters,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub new_mac_addresses: BTreeMap<String, String>,
    #[serde(rename = "newSMBiosSerial", skip_serializing_if = "Option::is_none")]
    pub new_smbios_serial: Option<String>,
}

/// Label and annotation filters applied to the VM template.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneTemplateFilters {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotation_filters: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub label_filters: Vec<String>,
}

impl CloneTemplateFilters {
    pub fn is_empty(&self) -> bool {
        self.annotation_filters.is_empty() && self.label_filters.is_empty()
    }
}
