//! `virtctl create vm`
//!
//! The VirtualMachine is assembled by a fixed sequence of build steps. The
//! order of the volume steps matters: it is the order the volumes appear in
//! the manifest and therefore the implicit boot order of the guest.

use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use clap::Parser;
use color_eyre::Result;
use indoc::indoc;
use itertools::Itertools;
use strum::VariantNames;
use tracing::debug;

use crate::api::cdi::DataVolumeSpec;
use crate::api::kubevirt::{
    DataVolumeRef, DataVolumeTemplateSpec, Disk, Matcher, Memory, RunStrategy, VirtualMachine,
    VirtualMachineInstanceSpec, VirtualMachineSpec, Volume, VolumeSource, VIRTUAL_MACHINE_KIND,
};
use crate::api::meta::ObjectMeta;
use crate::api::KUBEVIRT_API_VERSION;
use crate::clientconfig::ClientConfig;
use crate::params::{self, split_prefixed_name, FlagError};
use crate::quantity::Quantity;
use crate::utils::{generate_name, validate_dns1123_label};

mod access_cred;
mod cloudinit;
mod inference;
mod volumes;

use access_cred::AccessCredParams;
use cloudinit::CloudInitType;
use volumes::{BlankParams, SizedSourceParams, SourceParams, SysprepParams};

const NAME_FLAG: &str = "name";
const RUN_STRATEGY_FLAG: &str = "run-strategy";
const TERMINATION_GRACE_PERIOD_FLAG: &str = "termination-grace-period";
const MEMORY_FLAG: &str = "memory";
const INSTANCETYPE_FLAG: &str = "instancetype";
const INFER_INSTANCETYPE_FLAG: &str = "infer-instancetype";
const INFER_INSTANCETYPE_FROM_FLAG: &str = "infer-instancetype-from";
const PREFERENCE_FLAG: &str = "preference";
const INFER_PREFERENCE_FLAG: &str = "infer-preference";
const INFER_PREFERENCE_FROM_FLAG: &str = "infer-preference-from";
const CONTAINERDISK_VOLUME_FLAG: &str = "volume-containerdisk";
const PVC_VOLUME_FLAG: &str = "volume-pvc";
const DATASOURCE_VOLUME_FLAG: &str = "volume-datasource";
const CLONE_PVC_VOLUME_FLAG: &str = "volume-clone-pvc";
const BLANK_VOLUME_FLAG: &str = "volume-blank";
const IMPORT_VOLUME_FLAG: &str = "volume-import";
const SYSPREP_VOLUME_FLAG: &str = "volume-sysprep";
const USER_FLAG: &str = "user";
const PASSWORD_FILE_FLAG: &str = "password-file";
const SSH_KEY_FLAG: &str = "ssh-key";
const GA_MANAGE_SSH_FLAG: &str = "ga-manage-ssh";
const CLOUD_INIT_FLAG: &str = "cloud-init";
const CLOUD_INIT_USER_DATA_FLAG: &str = "cloud-init-user-data";
const CLOUD_INIT_NETWORK_DATA_FLAG: &str = "cloud-init-network-data";
const ACCESS_CRED_FLAG: &str = "access-cred";

const DEFAULT_MEMORY: &str = "512Mi";

const INSTANCETYPE_KINDS: &[&str] = &[
    "virtualmachineinstancetype",
    "virtualmachineclusterinstancetype",
];
const PREFERENCE_KINDS: &[&str] = &["virtualmachinepreference", "virtualmachineclusterpreference"];

const EXAMPLES: &str = indoc! { r#"
    Examples:
      # Create a manifest for a simple VM with a random name:
      virtctl create vm

      # Create a VM booting from a containerdisk, with cloud-init user and SSH key:
      virtctl create vm --name my-vm --volume-containerdisk src:quay.io/containerdisks/fedora:latest --user fedora --ssh-key "ssh-ed25519 AAAA..."

      # Create a VM with an explicit instancetype and preference:
      virtctl create vm --instancetype u1.medium --preference virtualmachinepreference/fedora

      # Create a VM cloning a PVC, inferring instancetype and preference from it:
      virtctl create vm --volume-clone-pvc src:my-ns/my-pvc --infer-instancetype --infer-preference

      # Create a VM importing a disk over http and booting from it:
      virtctl create vm --volume-import type:http,url:https://example.com/disk.img,size:10Gi,bootorder:1

      # Create a VM whose SSH key is injected by the guest agent from a secret:
      virtctl create vm --volume-datasource src:fedora --access-cred type:ssh,src:my-keys,user:fedora

      # Create the VM directly in the cluster:
      virtctl create vm --volume-datasource src:my-ns/fedora | kubectl create -f -
"# };

/// Options of `virtctl create vm`
#[derive(Debug, Parser)]
#[clap(after_help = EXAMPLES)]
pub struct CreateVmOpts {
    /// Name of the VM (default: vm-<random>)
    #[clap(long = NAME_FLAG)]
    pub name: Option<String>,

    /// Run strategy of the VM
    #[clap(long = RUN_STRATEGY_FLAG, default_value = "Always")]
    pub run_strategy: String,

    /// Grace period in seconds for the VM to shut down
    #[clap(long = TERMINATION_GRACE_PERIOD_FLAG, default_value_t = 180, allow_negative_numbers = true)]
    pub termination_grace_period: i64,

    /// Amount of guest memory (default: 512Mi)
    #[clap(
        long = MEMORY_FLAG,
        conflicts_with_all = ["instancetype", "infer_instancetype", "infer_instancetype_from"]
    )]
    pub memory: Option<String>,

    /// Instancetype of the VM, as [kind/]name. The kind defaults to
    /// virtualmachineclusterinstancetype.
    #[clap(
        long = INSTANCETYPE_FLAG,
        conflicts_with_all = ["infer_instancetype", "infer_instancetype_from"]
    )]
    pub instancetype: Option<String>,

    /// Infer the instancetype from the boot volume. Enabled by default,
    /// failures are only fatal when requested explicitly.
    #[clap(
        long = INFER_INSTANCETYPE_FLAG,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        conflicts_with = "infer_instancetype_from"
    )]
    pub infer_instancetype: Option<bool>,

    /// Name of the volume to infer the instancetype from
    #[clap(long = INFER_INSTANCETYPE_FROM_FLAG)]
    pub infer_instancetype_from: Option<String>,

    /// Preference of the VM, as [kind/]name. The kind defaults to
    /// virtualmachineclusterpreference.
    #[clap(
        long = PREFERENCE_FLAG,
        conflicts_with_all = ["infer_preference", "infer_preference_from"]
    )]
    pub preference: Option<String>,

    /// Infer the preference from the boot volume. Enabled by default,
    /// failures are only fatal when requested explicitly.
    #[clap(
        long = INFER_PREFERENCE_FLAG,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        conflicts_with = "infer_preference_from"
    )]
    pub infer_preference: Option<bool>,

    /// Name of the volume to infer the preference from
    #[clap(long = INFER_PREFERENCE_FROM_FLAG)]
    pub infer_preference_from: Option<String>,

    #[clap(
        long = CONTAINERDISK_VOLUME_FLAG,
        help = params::help::<SourceParams>("Containerdisk to be used by the VM. Can be provided multiple times.")
    )]
    pub containerdisk_volumes: Vec<String>,

    #[clap(
        long = PVC_VOLUME_FLAG,
        help = params::help::<SourceParams>("PVC to be used by the VM, without a namespace. Can be provided multiple times.")
    )]
    pub pvc_volumes: Vec<String>,

    #[clap(
        long = DATASOURCE_VOLUME_FLAG,
        help = params::help::<SizedSourceParams>("DataSource to be cloned by the VM, as [namespace/]name. Can be provided multiple times.")
    )]
    pub datasource_volumes: Vec<String>,

    #[clap(
        long = CLONE_PVC_VOLUME_FLAG,
        help = params::help::<SizedSourceParams>("PVC to be cloned by the VM, as namespace/name. Can be provided multiple times.")
    )]
    pub clone_pvc_volumes: Vec<String>,

    #[clap(
        long = BLANK_VOLUME_FLAG,
        help = params::help::<BlankParams>("Blank volume to be created for the VM. Can be provided multiple times.")
    )]
    pub blank_volumes: Vec<String>,

    #[clap(long = IMPORT_VOLUME_FLAG, help = volumes::import_help())]
    pub import_volumes: Vec<String>,

    #[clap(
        long = SYSPREP_VOLUME_FLAG,
        help = params::help::<SysprepParams>("ConfigMap or Secret with sysprep answer files. The type defaults to configmap.")
    )]
    pub sysprep_volume: Option<String>,

    /// User to create in the guest with cloud-init
    #[clap(long = USER_FLAG)]
    pub user: Option<String>,

    /// File holding the password of the cloud-init user. The password is
    /// stored in cleartext in the manifest.
    #[clap(long = PASSWORD_FILE_FLAG)]
    pub password_file: Option<Utf8PathBuf>,

    /// SSH public key to authorize for the cloud-init user. Can be provided
    /// multiple times or as a comma separated list.
    #[clap(long = SSH_KEY_FLAG, value_delimiter = ',')]
    pub ssh_keys: Vec<String>,

    /// Allow the guest agent to manage SSH keys (sets the SELinux boolean
    /// virt_qemu_ga_manage_ssh with cloud-init)
    #[clap(
        long = GA_MANAGE_SSH_FLAG,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub ga_manage_ssh: Option<bool>,

    /// Cloud-init data source (nocloud, configdrive or none; default: nocloud)
    #[clap(long = CLOUD_INIT_FLAG)]
    pub cloud_init: Option<String>,

    /// Base64 encoded cloud-init user data, replacing the generated user data
    #[clap(
        long = CLOUD_INIT_USER_DATA_FLAG,
        conflicts_with_all = ["user", "password_file", "ssh_keys", "ga_manage_ssh"]
    )]
    pub cloud_init_user_data: Option<String>,

    /// Base64 encoded cloud-init network data
    #[clap(long = CLOUD_INIT_NETWORK_DATA_FLAG)]
    pub cloud_init_network_data: Option<String>,

    #[clap(long = ACCESS_CRED_FLAG, help = params::help::<AccessCredParams>(access_cred::HELP))]
    pub access_creds: Vec<String>,
}

/// State carried between the build steps.
#[derive(Debug)]
pub(super) struct VmBuilder {
    vm: VirtualMachine,
    /// Volume names by boot order
    boot_orders: BTreeMap<u32, String>,
    /// The data source requested with `--cloud-init`
    cloud_init: Option<CloudInitType>,
    /// Set by access credentials propagated through cloud-init
    cloud_init_required: Option<CloudInitType>,
    /// Set by access credentials propagated through the guest agent
    ga_manage_ssh_implied: bool,
}

type BuildStep = fn(&mut VmBuilder, &CreateVmOpts) -> Result<()>;

const BUILD_STEPS: &[(&str, BuildStep)] = &[
    ("run strategy", VmBuilder::with_run_strategy),
    ("instancetype", VmBuilder::with_instancetype),
    ("preference", VmBuilder::with_preference),
    ("containerdisk volumes", VmBuilder::with_containerdisk_volumes),
    ("pvc volumes", VmBuilder::with_pvc_volumes),
    ("datasource volumes", VmBuilder::with_datasource_volumes),
    ("clone-pvc volumes", VmBuilder::with_clone_pvc_volumes),
    ("blank volumes", VmBuilder::with_blank_volumes),
    ("imported volumes", VmBuilder::with_import_volumes),
    ("sysprep volume", VmBuilder::with_sysprep_volume),
    ("access credentials", VmBuilder::with_access_creds),
    ("cloud-init", VmBuilder::with_cloud_init),
    ("inference", VmBuilder::with_inference),
];

impl VmBuilder {
    fn new(opts: &CreateVmOpts, name: String, namespace: Option<String>) -> Result<Self> {
        let memory: Quantity = opts
            .memory
            .as_deref()
            .unwrap_or(DEFAULT_MEMORY)
            .parse()
            .map_err(|e| FlagError::new(MEMORY_FLAG, e))?;
        let cloud_init = opts
            .cloud_init
            .as_deref()
            .map(cloudinit::parse_cloud_init_type)
            .transpose()?;

        let mut vm = VirtualMachine {
            api_version: KUBEVIRT_API_VERSION.to_owned(),
            kind: VIRTUAL_MACHINE_KIND.to_owned(),
            metadata: ObjectMeta::new(name, namespace),
            spec: VirtualMachineSpec::default(),
        };
        let spec = &mut vm.spec.template.spec;
        spec.termination_grace_period_seconds = Some(opts.termination_grace_period);
        spec.domain.memory = Some(Memory { guest: memory });

        Ok(Self {
            vm,
            boot_orders: BTreeMap::new(),
            cloud_init,
            cloud_init_required: None,
            ga_manage_ssh_implied: false,
        })
    }

    fn vm_name(&self) -> &str {
        &self.vm.metadata.name
    }

    fn template_spec(&mut self) -> &mut VirtualMachineInstanceSpec {
        &mut self.vm.spec.template.spec
    }

    fn has_volume(&self, name: &str) -> bool {
        self.vm
            .spec
            .template
            .spec
            .volumes
            .iter()
            .any(|v| v.name == name)
    }

    /// Add a volume to the VM, and a disk when a boot order is given.
    fn add_volume(
        &mut self,
        flag: &'static str,
        name: String,
        source: VolumeSource,
        boot_order: Option<u32>,
    ) -> Result<(), FlagError> {
        validate_dns1123_label(&name).map_err(|e| FlagError::new(flag, e))?;
        if self.has_volume(&name) {
            return Err(FlagError::new(
                flag,
                format!("there is already a volume with name \"{name}\""),
            ));
        }
        if let Some(order) = boot_order {
            if order == 0 {
                return Err(FlagError::new(flag, "bootorder must be greater than 0"));
            }
            if self.boot_orders.contains_key(&order) {
                return Err(FlagError::new(
                    flag,
                    format!("bootorder {order} was specified multiple times"),
                ));
            }
            self.boot_orders.insert(order, name.clone());
            self.template_spec().domain.devices.disks.push(Disk {
                name: name.clone(),
                boot_order: Some(order),
            });
        }
        self.template_spec().volumes.push(Volume { name, source });
        Ok(())
    }

    /// Add a DataVolumeTemplate and the volume referencing it.
    fn add_data_volume(
        &mut self,
        flag: &'static str,
        name: String,
        spec: DataVolumeSpec,
        boot_order: Option<u32>,
    ) -> Result<(), FlagError> {
        let source = VolumeSource::DataVolume(DataVolumeRef { name: name.clone() });
        self.add_volume(flag, name.clone(), source, boot_order)?;
        self.vm.spec.data_volume_templates.push(DataVolumeTemplateSpec {
            metadata: ObjectMeta::new(name, None),
            spec,
        });
        Ok(())
    }

    fn with_run_strategy(&mut self, opts: &CreateVmOpts) -> Result<()> {
        let strategy: RunStrategy = opts.run_strategy.parse().map_err(|_| {
            FlagError::new(
                RUN_STRATEGY_FLAG,
                format!(
                    "invalid run strategy \"{}\", supported values are: {}",
                    opts.run_strategy,
                    RunStrategy::VARIANTS.iter().join(", ")
                ),
            )
        })?;
        self.vm.spec.run_strategy = Some(strategy);
        Ok(())
    }

    fn with_instancetype(&mut self, opts: &CreateVmOpts) -> Result<()> {
        let Some(value) = opts.instancetype.as_deref() else {
            return Ok(());
        };
        let matcher = kind_matcher(INSTANCETYPE_FLAG, "instancetype", INSTANCETYPE_KINDS, value)?;
        self.vm.spec.instancetype = Some(matcher);
        // The instancetype provides the guest memory
        self.template_spec().domain.memory = None;
        Ok(())
    }

    fn with_preference(&mut self, opts: &CreateVmOpts) -> Result<()> {
        let Some(value) = opts.preference.as_deref() else {
            return Ok(());
        };
        let matcher = kind_matcher(PREFERENCE_FLAG, "preference", PREFERENCE_KINDS, value)?;
        self.vm.spec.preference = Some(matcher);
        Ok(())
    }
}

/// Parse a `[kind/]name` instancetype or preference reference.
fn kind_matcher(
    flag: &'static str,
    what: &str,
    kinds: &[&str],
    value: &str,
) -> Result<Matcher, FlagError> {
    let (kind, name) = split_prefixed_name(value).map_err(|e| FlagError::new(flag, e))?;
    let kind = kind.unwrap_or_default();
    if !kind.is_empty() && !kinds.contains(&kind) {
        return Err(FlagError::new(
            flag,
            format!(
                "invalid {what} kind \"{kind}\", supported values are: {}",
                kinds.join(", ")
            ),
        ));
    }
    Ok(Matcher {
        name: name.to_owned(),
        kind: kind.to_owned(),
        ..Default::default()
    })
}

/// Build the VirtualMachine described by `opts`.
pub fn build(opts: &CreateVmOpts, client: &ClientConfig) -> Result<VirtualMachine> {
    let namespace = client.overridden_namespace()?;
    let name = opts.name.clone().unwrap_or_else(|| generate_name("vm"));
    debug!("Creating VM {name}");

    let mut builder = VmBuilder::new(opts, name, namespace)?;
    for (step, f) in BUILD_STEPS {
        debug!("Applying {step}");
        f(&mut builder, opts)?;
    }
    Ok(builder.vm)
}
