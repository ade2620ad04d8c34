//! `virtctl create` generates manifests of KubeVirt objects
//!
//! Every subcommand only builds an object from its flags and prints it as
//! YAML; nothing is sent to the cluster. The result can be piped into
//! `kubectl create -f -`.

use clap::Subcommand;
use color_eyre::Result;
use serde::Serialize;

use crate::clientconfig::ClientConfig;

pub mod clone;
pub mod instancetype;
pub mod preference;
pub mod vm;

/// Kinds of objects `virtctl create` can generate
#[derive(Debug, Subcommand)]
pub enum CreateCommands {
    /// Create a VirtualMachine manifest
    ///
    /// Volumes, cloud-init data and access credentials are described with
    /// flags; instancetype and preference are inferred from the boot volume
    /// unless given explicitly.
    Vm(vm::CreateVmOpts),

    /// Create a VirtualMachineClone manifest
    Clone(clone::CreateCloneOpts),

    /// Create a VirtualMachineInstancetype or VirtualMachineClusterInstancetype manifest
    Instancetype(instancetype::CreateInstancetypeOpts),

    /// Create a VirtualMachinePreference or VirtualMachineClusterPreference manifest
    Preference(preference::CreatePreferenceOpts),
}

impl CreateCommands {
    pub fn run(self, client: &ClientConfig) -> Result<()> {
        match self {
            CreateCommands::Vm(opts) => print_manifest(&vm::build(&opts, client)?),
            CreateCommands::Clone(opts) => print_manifest(&clone::build(&opts, client)?),
            CreateCommands::Instancetype(opts) => {
                print_manifest(&instancetype::build(&opts, client)?)
            }
            CreateCommands::Preference(opts) => print_manifest(&preference::build(&opts, client)?),
        }
    }
}

fn print_manifest<T: Serialize>(obj: &T) -> Result<()> {
    print!("{}", crate::manifest::to_yaml(obj)?);
    Ok(())
}
