//! `virtctl create preference`

use clap::Parser;
use color_eyre::Result;
use indoc::indoc;
use itertools::Itertools;
use strum::VariantNames;

use crate::api::instancetype::{
    CpuPreferences, MachinePreferences, PreferenceSpec, PreferredCpuTopology,
    VirtualMachinePreference, VolumePreferences, CLUSTER_PREFERENCE_KIND, PREFERENCE_KIND,
};
use crate::api::meta::ObjectMeta;
use crate::api::INSTANCETYPE_API_VERSION;
use crate::clientconfig::ClientConfig;
use crate::params::FlagError;
use crate::utils::generate_name;

const CPU_TOPOLOGY_FLAG: &str = "cpu-topology";

const EXAMPLES: &str = indoc! { "
    Examples:
      # Create a manifest for a VirtualMachineClusterPreference:
      virtctl create preference

      # Create a manifest for a namespaced VirtualMachinePreference with a random name:
      virtctl create preference --namespaced

      # Create a manifest preferring a storage class and a machine type:
      virtctl create preference --volume-storage-class=local --machine-type=pc-q35-rhel9.2.0
" };

/// Options of `virtctl create preference`
#[derive(Debug, Parser)]
#[clap(after_help = EXAMPLES)]
pub struct CreatePreferenceOpts {
    /// Name of the preference (default: preference-<random>)
    #[clap(long)]
    pub name: Option<String>,

    /// Create a namespaced VirtualMachinePreference instead of a cluster-wide one
    #[clap(long)]
    pub namespaced: bool,

    /// Preferred CPU topology of the guest (sockets, cores, threads, spread or any)
    #[clap(long = CPU_TOPOLOGY_FLAG)]
    pub cpu_topology: Option<String>,

    /// Preferred storage class of volumes
    #[clap(long)]
    pub volume_storage_class: Option<String>,

    /// Preferred machine type of the guest
    #[clap(long)]
    pub machine_type: Option<String>,
}

fn parse_cpu_topology(value: &str) -> Result<PreferredCpuTopology, FlagError> {
    value.parse().map_err(|_| {
        FlagError::new(
            CPU_TOPOLOGY_FLAG,
            format!(
                "invalid CPU topology \"{value}\", supported values are: {}",
                PreferredCpuTopology::VARIANTS.iter().join(", ")
            ),
        )
    })
}

/// Build the preference described by `opts`.
pub fn build(
    opts: &CreatePreferenceOpts,
    client: &ClientConfig,
) -> Result<VirtualMachinePreference> {
    let cpu = opts
        .cpu_topology
        .as_deref()
        .map(parse_cpu_topology)
        .transpose()?
        .map(|preferred_cpu_topology| CpuPreferences {
            preferred_cpu_topology,
        });
    let volumes = opts
        .volume_storage_class
        .clone()
        .map(|preferred_storage_class_name| VolumePreferences {
            preferred_storage_class_name,
        });
    let machine = opts
        .machine_type
        .clone()
        .map(|preferred_machine_type| MachinePreferences {
            preferred_machine_type,
        });

    let (kind, namespace) = if opts.namespaced {
        (PREFERENCE_KIND, client.overridden_namespace()?)
    } else {
        (CLUSTER_PREFERENCE_KIND, None)
    };
    let name = opts
        .name
        .clone()
        .unwrap_or_else(|| generate_name("preference"));

    Ok(VirtualMachinePreference {
        api_version: INSTANCETYPE_API_VERSION.to_owned(),
        kind: kind.to_owned(),
        metadata: ObjectMeta::new(name, namespace),
        spec: PreferenceSpec {
            cpu,
            volumes,
            machine,
        },
    })
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    fn run_with(args: &[&str], client: &ClientConfig) -> Result<VirtualMachinePreference> {
        let opts = CreatePreferenceOpts::try_parse_from(
            std::iter::once("preference").chain(args.iter().copied()),
        )?;
        build(&opts, client)
    }

    fn run(args: &[&str]) -> Result<VirtualMachinePreference> {
        run_with(args, &ClientConfig::isolated(None))
    }

    #[test]
    fn test_defaults() {
        let pref = run(&[]).unwrap();
        assert_eq!(pref.api_version, "instancetype.kubevirt.io/v1beta1");
        assert_eq!(pref.kind, "VirtualMachineClusterPreference");
        assert!(pref.metadata.name.starts_with("preference-"));
        assert_eq!(pref.spec, PreferenceSpec::default());

        let out = crate::manifest::to_yaml(&pref).unwrap();
        assert!(out.ends_with("spec: {}\n"), "{out}");
    }

    #[test]
    fn test_namespaced() {
        let client = ClientConfig::isolated(Some("my-ns"));
        let pref = run_with(&["--namespaced", "--name=p"], &client).unwrap();
        assert_eq!(pref.kind, "VirtualMachinePreference");
        assert_eq!(pref.metadata, ObjectMeta::new("p", Some("my-ns".into())));

        let pref = run_with(&["--namespaced"], &ClientConfig::isolated(None)).unwrap();
        assert_eq!(pref.metadata.namespace, None);
    }

    #[test]
    fn test_preferences() {
        let pref = run(&[
            "--cpu-topology=spread",
            "--volume-storage-class=local",
            "--machine-type=pc-q35-rhel9.2.0",
        ])
        .unwrap();
        assert_eq!(
            pref.spec,
            PreferenceSpec {
                cpu: Some(CpuPreferences {
                    preferred_cpu_topology: PreferredCpuTopology::Spread
                }),
                volumes: Some(VolumePreferences {
                    preferred_storage_class_name: "local".into()
                }),
                machine: Some(MachinePreferences {
                    preferred_machine_type: "pc-q35-rhel9.2.0".into()
                }),
            }
        );

        let out = crate::manifest::to_yaml(&pref).unwrap();
        assert!(out.contains("preferredCPUTopology: spread"), "{out}");
        assert!(out.contains("preferredStorageClassName: local"), "{out}");
    }

    #[test]
    fn test_deprecated_topology() {
        let pref = run(&["--cpu-topology=preferSockets"]).unwrap();
        assert_eq!(
            pref.spec.cpu.unwrap().preferred_cpu_topology,
            PreferredCpuTopology::PreferSockets
        );
    }

    #[test]
    fn test_invalid_topology() {
        let err = run(&["--cpu-topology=numa"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to parse \"--cpu-topology\" flag: invalid CPU topology \"numa\", supported values are: \
             sockets, cores, threads, spread, any, preferSockets, preferCores, preferThreads, preferSpread, preferAny"
        );
    }
}
