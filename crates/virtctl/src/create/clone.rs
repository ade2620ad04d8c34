//! `virtctl create clone`

use std::collections::BTreeMap;

use clap::Parser;
use color_eyre::Result;
use indoc::indoc;

use crate::api::clone::{CloneSpec, CloneTemplateFilters, VirtualMachineClone, CLONE_KIND};
use crate::api::kubevirt::VIRTUAL_MACHINE_KIND;
use crate::api::meta::{ObjectMeta, TypedLocalObjectReference};
use crate::api::{CLONE_API_VERSION, KUBEVIRT_GROUP, SNAPSHOT_GROUP};
use crate::clientconfig::ClientConfig;
use crate::params::FlagError;
use crate::utils::generate_name;

const SOURCE_TYPE_FLAG: &str = "source-type";
const TARGET_TYPE_FLAG: &str = "target-type";
const NEW_MAC_ADDRESS_FLAG: &str = "new-mac-address";

const SNAPSHOT_KIND: &str = "VirtualMachineSnapshot";

const EXAMPLES: &str = indoc! { "
    Examples:
      # Clone vm1 into a VM with a generated name:
      virtctl create clone --source-name vm1

      # Clone vm1 into vm2 and assign a new MAC address to interface eth0:
      virtctl create clone --source-name vm1 --target-name vm2 --new-mac-address eth0:02-00-00-00-00-01

      # Create a VM from a snapshot, keeping only some labels:
      virtctl create clone --source-name snap1 --source-type vmsnapshot --label-filter 'app/*' --label-filter '!app/secret'
" };

/// Options of `virtctl create clone`
#[derive(Debug, Parser)]
#[clap(after_help = EXAMPLES)]
pub struct CreateCloneOpts {
    /// Name of the clone object (default: clone-<random>)
    #[clap(long)]
    pub name: Option<String>,

    /// Name of the clone source
    #[clap(long)]
    pub source_name: Option<String>,

    /// Name of the created VM; generated by the cluster when omitted
    #[clap(long)]
    pub target_name: Option<String>,

    /// Type of the clone source (vm or vmsnapshot)
    #[clap(long = SOURCE_TYPE_FLAG, default_value = "vm")]
    pub source_type: String,

    /// Type of the clone target (vm)
    #[clap(long = TARGET_TYPE_FLAG)]
    pub target_type: Option<String>,

    /// Labels of the source to copy to the target; wildcards and ! negation
    /// are supported. Can be provided multiple times.
    #[clap(long = "label-filter")]
    pub label_filters: Vec<String>,

    /// Annotations of the source to copy to the target. Can be provided multiple times.
    #[clap(long = "annotation-filter")]
    pub annotation_filters: Vec<String>,

    /// Labels of the VM template to copy to the target. Can be provided multiple times.
    #[clap(long = "template-label-filter")]
    pub template_label_filters: Vec<String>,

    /// Annotations of the VM template to copy to the target. Can be provided multiple times.
    #[clap(long = "template-annotation-filter")]
    pub template_annotation_filters: Vec<String>,

    /// New MAC address of an interface, as interfaceName:newMacAddress with
    /// the address written in dash notation. Can be provided multiple times.
    #[clap(long = NEW_MAC_ADDRESS_FLAG)]
    pub new_mac_addresses: Vec<String>,

    /// New SMBios serial number of the target
    #[clap(long)]
    pub new_smbios_serial: Option<String>,
}

fn source_ref(source_type: &str, name: String) -> Result<TypedLocalObjectReference, FlagError> {
    let (group, kind) = match source_type.to_lowercase().as_str() {
        "vm" | "virtualmachine" => (KUBEVIRT_GROUP, VIRTUAL_MACHINE_KIND),
        "snapshot" | "vmsnapshot" | "virtualmachinesnapshot" => (SNAPSHOT_GROUP, SNAPSHOT_KIND),
        _ => {
            return Err(FlagError::new(
                SOURCE_TYPE_FLAG,
                format!("invalid source type \"{source_type}\", supported values are: vm, vmsnapshot"),
            ))
        }
    };
    Ok(TypedLocalObjectReference {
        api_group: Some(group.to_owned()),
        kind: kind.to_owned(),
        name,
    })
}

fn target_ref(
    target_type: Option<&str>,
    name: Option<String>,
) -> Result<TypedLocalObjectReference, FlagError> {
    if let Some(t) = target_type {
        if !matches!(t.to_lowercase().as_str(), "vm" | "virtualmachine") {
            return Err(FlagError::new(
                TARGET_TYPE_FLAG,
                format!("invalid target type \"{t}\", supported values are: vm"),
            ));
        }
    }
    Ok(TypedLocalObjectReference {
        api_group: Some(KUBEVIRT_GROUP.to_owned()),
        kind: VIRTUAL_MACHINE_KIND.to_owned(),
        name: name.unwrap_or_default(),
    })
}

fn parse_new_mac_addresses(values: &[String]) -> Result<BTreeMap<String, String>, FlagError> {
    let mut macs = BTreeMap::new();
    for value in values {
        let (iface, mac) = match value.split(':').collect::<Vec<_>>().as_slice() {
            [iface, mac] if !iface.is_empty() && !mac.is_empty() => {
                (iface.to_string(), mac.to_string())
            }
            _ => {
                return Err(FlagError::new(
                    NEW_MAC_ADDRESS_FLAG,
                    format!("\"{value}\" is not in the form of interfaceName:newMacAddress"),
                ))
            }
        };
        if macs.insert(iface.clone(), mac).is_some() {
            return Err(FlagError::new(
                NEW_MAC_ADDRESS_FLAG,
                format!("interface \"{iface}\" was specified multiple times"),
            ));
        }
    }
    Ok(macs)
}

/// Build the clone object described by `opts`.
pub fn build(opts: &CreateCloneOpts, client: &ClientConfig) -> Result<VirtualMachineClone> {
    let source_name = opts
        .source_name
        .clone()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| color_eyre::eyre::eyre!("source name must not be empty"))?;
    let source = source_ref(&opts.source_type, source_name)?;
    let target = target_ref(opts.target_type.as_deref(), opts.target_name.clone())?;
    let new_mac_addresses = parse_new_mac_addresses(&opts.new_mac_addresses)?;

    let namespace = client.overridden_namespace()?;
    let name = opts.name.clone().unwrap_or_else(|| generate_name("clone"));

    Ok(VirtualMachineClone {
        api_version: CLONE_API_VERSION.to_owned(),
        kind: CLONE_KIND.to_owned(),
        metadata: ObjectMeta::new(name, namespace),
        spec: CloneSpec {
            source,
            target,
            annotation_filters: opts.annotation_filters.clone(),
            label_filters: opts.label_filters.clone(),
            template: CloneTemplateFilters {
                annotation_filters: opts.template_annotation_filters.clone(),
                label_filters: opts.template_label_filters.clone(),
            },
            new_mac_addresses,
            new_smbios_serial: opts.new_smbios_serial.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    fn run_with(args: &[&str], client: &ClientConfig) -> Result<VirtualMachineClone> {
        let opts =
            CreateCloneOpts::try_parse_from(std::iter::once("clone").chain(args.iter().copied()))?;
        build(&opts, client)
    }

    fn run(args: &[&str]) -> Result<VirtualMachineClone> {
        run_with(args, &ClientConfig::isolated(None))
    }

    fn vm_ref(name: &str) -> TypedLocalObjectReference {
        TypedLocalObjectReference {
            api_group: Some("kubevirt.io".into()),
            kind: "VirtualMachine".into(),
            name: name.into(),
        }
    }

    #[test]
    fn test_defaults() {
        let clone = run(&["--source-name", "vm1"]).unwrap();
        assert_eq!(clone.api_version, "clone.kubevirt.io/v1beta1");
        assert_eq!(clone.kind, "VirtualMachineClone");
        assert!(clone.metadata.name.starts_with("clone-"));
        assert_eq!(clone.spec.source, vm_ref("vm1"));
        // The target is always set, even without a type or name
        assert_eq!(clone.spec.target, vm_ref(""));
        assert!(clone.spec.template.is_empty());
    }

    #[test]
    fn test_all_flags() {
        let clone = run_with(
            &[
                "--name=my-clone",
                "--source-name=snap",
                "--source-type=VirtualMachineSnapshot",
                "--target-name=vm2",
                "--target-type=vm",
                "--label-filter=app/*",
                "--label-filter=!app/secret",
                "--annotation-filter=*",
                "--template-label-filter=tl",
                "--template-annotation-filter=ta",
                "--new-mac-address=eth0:02-00-00-00-00-01",
                "--new-mac-address=eth1:02-00-00-00-00-02",
                "--new-smbios-serial=serial",
            ],
            &ClientConfig::isolated(Some("ns")),
        )
        .unwrap();
        assert_eq!(clone.metadata, ObjectMeta::new("my-clone", Some("ns".into())));
        assert_eq!(
            clone.spec,
            CloneSpec {
                source: TypedLocalObjectReference {
                    api_group: Some("snapshot.kubevirt.io".into()),
                    kind: "VirtualMachineSnapshot".into(),
                    name: "snap".into(),
                },
                target: vm_ref("vm2"),
                annotation_filters: vec!["*".into()],
                label_filters: vec!["app/*".into(), "!app/secret".into()],
                template: CloneTemplateFilters {
                    annotation_filters: vec!["ta".into()],
                    label_filters: vec!["tl".into()],
                },
                new_mac_addresses: BTreeMap::from([
                    ("eth0".into(), "02-00-00-00-00-01".into()),
                    ("eth1".into(), "02-00-00-00-00-02".into()),
                ]),
                new_smbios_serial: Some("serial".into()),
            }
        );

        let out = crate::manifest::to_yaml(&clone).unwrap();
        assert!(out.contains("newSMBiosSerial: serial"), "{out}");
        let docs = yaml_rust2::YamlLoader::load_from_str(&out).unwrap();
        assert_eq!(
            docs[0]["spec"]["newMacAddresses"]["eth0"].as_str(),
            Some("02-00-00-00-00-01")
        );
        assert_eq!(docs[0]["spec"]["target"]["name"].as_str(), Some("vm2"));
    }

    #[test]
    fn test_errors() {
        let cases: &[(&[&str], &str)] = &[
            (&[], "source name must not be empty"),
            (&["--source-name="], "source name must not be empty"),
            (
                &["--source-name=vm1", "--source-type=pvc"],
                "failed to parse \"--source-type\" flag: invalid source type \"pvc\", supported values are: vm, vmsnapshot",
            ),
            (
                &["--source-name=vm1", "--target-type=vmsnapshot"],
                "failed to parse \"--target-type\" flag: invalid target type \"vmsnapshot\", supported values are: vm",
            ),
            (
                &["--source-name=vm1", "--new-mac-address=eth0"],
                "failed to parse \"--new-mac-address\" flag: \"eth0\" is not in the form of interfaceName:newMacAddress",
            ),
            (
                &["--source-name=vm1", "--new-mac-address=eth0:02:00:00:00:00:01"],
                "failed to parse \"--new-mac-address\" flag: \"eth0:02:00:00:00:00:01\" is not in the form of interfaceName:newMacAddress",
            ),
            (
                &["--source-name=vm1", "--new-mac-address=:02-00-00-00-00-01"],
                "failed to parse \"--new-mac-address\" flag: \":02-00-00-00-00-01\" is not in the form of interfaceName:newMacAddress",
            ),
            (
                &["--source-name=vm1", "--new-mac-address=eth0:"],
                "failed to parse \"--new-mac-address\" flag: \"eth0:\" is not in the form of interfaceName:newMacAddress",
            ),
            (
                &["--source-name=vm1", "--new-mac-address=eth0:a", "--new-mac-address=eth0:b"],
                "failed to parse \"--new-mac-address\" flag: interface \"eth0\" was specified multiple times",
            ),
        ];
        for (args, expected) in cases {
            let err = run(args).unwrap_err();
            assert_eq!(err.to_string(), *expected);
        }
    }
}
