//! The cloud-init volume of `virtctl create vm`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use itertools::Itertools;
use strum::{Display, EnumString, VariantNames};
use tracing::{debug, warn};

use super::{
    CreateVmOpts, VmBuilder, CLOUD_INIT_FLAG, CLOUD_INIT_NETWORK_DATA_FLAG,
    CLOUD_INIT_USER_DATA_FLAG, PASSWORD_FILE_FLAG,
};
use crate::api::kubevirt::{CloudInitSource, Volume, VolumeSource};
use crate::params::FlagError;

const CLOUD_INIT_DISK: &str = "cloudinitdisk";

const GA_MANAGE_SSH_RUNCMD: &str = "\nruncmd:\n  - [ setsebool, -P, 'virt_qemu_ga_manage_ssh', 'on' ]";

/// Data source of the cloud-init volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, VariantNames)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub(super) enum CloudInitType {
    NoCloud,
    ConfigDrive,
    None,
}

pub(super) fn parse_cloud_init_type(value: &str) -> Result<CloudInitType, FlagError> {
    value.parse().map_err(|_| {
        FlagError::new(
            CLOUD_INIT_FLAG,
            format!(
                "invalid cloud-init data source type \"{value}\", supported values are: {}",
                CloudInitType::VARIANTS.iter().join(", ")
            ),
        )
    })
}

fn validate_base64(flag: &'static str, value: &str) -> Result<(), FlagError> {
    STANDARD
        .decode(value)
        .map(drop)
        .map_err(|e| FlagError::new(flag, format!("invalid base64 data: {e}")))
}

fn read_password(path: &camino::Utf8Path) -> Result<String> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| FlagError::new(PASSWORD_FILE_FLAG, format!("reading {path}: {e}")))?;
    Ok(data.trim().to_owned())
}

/// Render the `#cloud-config` user data for the user related flags.
fn user_data(opts: &CreateVmOpts, ga_manage_ssh: bool) -> Result<String> {
    let mut config = String::from("#cloud-config");
    if let Some(user) = opts.user.as_deref().filter(|u| !u.is_empty()) {
        config.push_str("\nuser: ");
        config.push_str(user);
    }
    if let Some(path) = opts.password_file.as_deref() {
        let password = read_password(path)?;
        if !password.is_empty() {
            config.push_str(&format!("\npassword: {password}\nchpasswd: {{ expire: False }}"));
        }
    }
    if !opts.ssh_keys.is_empty() {
        config.push_str("\nssh_authorized_keys:");
        for key in &opts.ssh_keys {
            config.push_str("\n  - ");
            config.push_str(key);
        }
    }
    if ga_manage_ssh {
        config.push_str(GA_MANAGE_SSH_RUNCMD);
    }
    Ok(config)
}

/// Whether `--cloud-init=none` discards data the user passed. A user name
/// alone or implied guest agent key management does not count.
fn warn_on_none(opts: &CreateVmOpts) -> bool {
    opts.password_file.is_some()
        || !opts.ssh_keys.is_empty()
        || opts.ga_manage_ssh == Some(true)
        || opts.cloud_init_user_data.is_some()
        || opts.cloud_init_network_data.is_some()
}

impl VmBuilder {
    pub(super) fn with_cloud_init(&mut self, opts: &CreateVmOpts) -> Result<()> {
        let ga_manage_ssh = opts.ga_manage_ssh.unwrap_or(self.ga_manage_ssh_implied);
        let has_content = opts.user.is_some()
            || opts.password_file.is_some()
            || !opts.ssh_keys.is_empty()
            || ga_manage_ssh
            || opts.cloud_init_user_data.is_some()
            || opts.cloud_init_network_data.is_some()
            || self.cloud_init_required.is_some();
        if !has_content {
            return Ok(());
        }

        if opts.password_file.is_some() {
            warn!("--{PASSWORD_FILE_FLAG}: The password is stored in cleartext in the VM definition!");
        }

        let ty = self
            .cloud_init
            .or(self.cloud_init_required)
            .unwrap_or(CloudInitType::NoCloud);
        if ty == CloudInitType::None {
            if warn_on_none(opts) {
                warn!("--{CLOUD_INIT_FLAG} was set to none, not creating a data source although other cloud-init options were set");
            }
            return Ok(());
        }

        if self.has_volume(CLOUD_INIT_DISK) {
            return Err(eyre!("there is already a volume with name \"{CLOUD_INIT_DISK}\""));
        }

        let mut source = CloudInitSource::default();
        if let Some(data) = opts.cloud_init_network_data.as_deref() {
            validate_base64(CLOUD_INIT_NETWORK_DATA_FLAG, data)?;
            source.network_data_base64 = Some(data.to_owned());
        }
        match opts.cloud_init_user_data.as_deref() {
            Some(data) => {
                validate_base64(CLOUD_INIT_USER_DATA_FLAG, data)?;
                source.user_data_base64 = Some(data.to_owned());
            }
            None => source.user_data = Some(user_data(opts, ga_manage_ssh)?),
        }

        debug!("Adding {ty} cloud-init volume");
        let source = match ty {
            CloudInitType::ConfigDrive => VolumeSource::CloudInitConfigDrive(source),
            _ => VolumeSource::CloudInitNoCloud(source),
        };
        self.template_spec().volumes.push(Volume {
            name: CLOUD_INIT_DISK.to_owned(),
            source,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cloud_init_type() {
        assert_eq!(parse_cloud_init_type("NoCloud").unwrap(), CloudInitType::NoCloud);
        assert_eq!(parse_cloud_init_type("configdrive").unwrap(), CloudInitType::ConfigDrive);
        assert_eq!(parse_cloud_init_type("NONE").unwrap(), CloudInitType::None);
        assert_eq!(
            parse_cloud_init_type("cdrom").unwrap_err().to_string(),
            "failed to parse \"--cloud-init\" flag: invalid cloud-init data source type \"cdrom\", supported values are: nocloud, configdrive, none"
        );
    }

    #[test]
    fn test_validate_base64() {
        validate_base64(CLOUD_INIT_USER_DATA_FLAG, "I2Nsb3VkLWNvbmZpZw==").unwrap();
        let err = validate_base64(CLOUD_INIT_USER_DATA_FLAG, "not base64!").unwrap_err();
        assert!(
            err.to_string()
                .starts_with("failed to parse \"--cloud-init-user-data\" flag: invalid base64 data"),
            "{err}"
        );
    }

    #[test]
    fn test_warn_on_none() {
        use clap::Parser;

        let opts = |args: &[&str]| {
            CreateVmOpts::try_parse_from(std::iter::once("vm").chain(args.iter().copied())).unwrap()
        };
        assert!(!warn_on_none(&opts(&["--cloud-init=none", "--user=fedora"])));
        assert!(!warn_on_none(&opts(&["--cloud-init=none", "--ga-manage-ssh=false"])));
        assert!(warn_on_none(&opts(&["--cloud-init=none", "--ssh-key=ssh-ed25519 AAAA"])));
        assert!(warn_on_none(&opts(&["--cloud-init=none", "--ga-manage-ssh"])));
        assert!(warn_on_none(&opts(&["--cloud-init=none", "--password-file=/tmp/pw"])));
        assert!(warn_on_none(&opts(&["--cloud-init=none", "--cloud-init-user-data=I2Nsb3VkLWNvbmZpZw=="])));
        assert!(warn_on_none(&opts(&["--cloud-init=none", "--cloud-init-network-data=dmVyc2lvbjogMg=="])));
    }
}
