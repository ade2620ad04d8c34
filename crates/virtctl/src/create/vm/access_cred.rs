//! `--access-cred`: credentials KubeVirt injects into the guest at runtime.

use color_eyre::Result;
use itertools::Itertools;
use strum::{Display, EnumString, VariantNames};
use tracing::debug;

use super::cloudinit::CloudInitType;
use super::{CreateVmOpts, VmBuilder, ACCESS_CRED_FLAG, USER_FLAG};
use crate::api::kubevirt::{
    AccessCredential, AccessCredentialSource, EmptyPropagation, PasswordPropagationMethod,
    QemuGuestAgentSshPropagation, SshPropagationMethod, SshPublicKeyAccessCredential,
    UserPasswordAccessCredential,
};
use crate::params::{self, split_prefixed_name, FlagError, FromParams, Params, ParamsError};

pub(super) const HELP: &str = "Secret holding credentials to inject into the guest. \
     The type defaults to ssh, the method to ga. Can be provided multiple times.";

/// Params of `--access-cred`.
#[derive(Debug)]
pub(super) struct AccessCredParams {
    cred_type: Option<String>,
    src: Option<String>,
    method: Option<String>,
    user: Option<String>,
}

impl FromParams for AccessCredParams {
    const SUPPORTED: &'static [(&'static str, &'static str)] = &[
        ("type", "string"),
        ("src", "string"),
        ("method", "string"),
        ("user", "string"),
    ];

    fn from_params(params: &mut Params) -> Result<Self, ParamsError> {
        Ok(Self {
            cred_type: params.take("type"),
            src: params.take("src"),
            method: params.take("method"),
            user: params.take("user"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, VariantNames)]
#[strum(serialize_all = "lowercase")]
enum AccessCredType {
    Ssh,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, VariantNames)]
#[strum(serialize_all = "lowercase")]
enum SshMethod {
    Ga,
    NoCloud,
    ConfigDrive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, VariantNames)]
#[strum(serialize_all = "lowercase")]
enum PasswordMethod {
    Ga,
}

// The methods are worded in plural, unlike the type.
const CRED_TYPE: &str = "access credential type";
const SSH_METHOD: &str = "access credentials ssh method";
const PASSWORD_METHOD: &str = "access credentials password method";

fn parse_variant<T>(what: &str, value: Option<&str>, default: T) -> Result<T, FlagError>
where
    T: std::str::FromStr + VariantNames,
{
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Ok(default);
    };
    value.to_lowercase().parse().map_err(|_| {
        FlagError::new(
            ACCESS_CRED_FLAG,
            format!(
                "invalid {what} \"{value}\", supported values are: {}",
                T::VARIANTS.iter().join(", ")
            ),
        )
    })
}

fn reject_user(user: Option<&str>) -> Result<(), FlagError> {
    if user.is_some() {
        return Err(FlagError::new(
            ACCESS_CRED_FLAG,
            "user cannot be specified with selected access credential type and method",
        ));
    }
    Ok(())
}

impl VmBuilder {
    /// Require cloud-init of type `required`, failing if `--cloud-init` or
    /// another credential asked for a different one.
    fn require_cloud_init(&mut self, required: CloudInitType) -> Result<(), FlagError> {
        if let Some(requested) = self.cloud_init.filter(|t| *t != required) {
            return Err(FlagError::new(
                ACCESS_CRED_FLAG,
                format!(
                    "method param and value passed to --cloud-init have to match: {required} vs {requested}"
                ),
            ));
        }
        if let Some(other) = self.cloud_init_required.filter(|t| *t != required) {
            return Err(FlagError::new(
                ACCESS_CRED_FLAG,
                format!("access credential methods must not mix {other} and {required}"),
            ));
        }
        self.cloud_init_required = Some(required);
        Ok(())
    }

    fn access_credential(
        &mut self,
        opts: &CreateVmOpts,
        value: &str,
    ) -> Result<AccessCredential, FlagError> {
        let p: AccessCredParams = params::map(ACCESS_CRED_FLAG, value)?;
        let src = p
            .src
            .filter(|s| !s.is_empty())
            .ok_or_else(|| FlagError::new(ACCESS_CRED_FLAG, "src must be specified"))?;
        let (namespace, name) =
            split_prefixed_name(&src).map_err(|e| FlagError::new(ACCESS_CRED_FLAG, e))?;
        if namespace.is_some() {
            return Err(FlagError::new(
                ACCESS_CRED_FLAG,
                format!("not allowed to specify namespace of secret \"{name}\""),
            ));
        }
        let source = AccessCredentialSource::secret(name);

        let cred_type = parse_variant(CRED_TYPE, p.cred_type.as_deref(), AccessCredType::Ssh)?;
        let method = p.method.as_deref();
        let user = p.user.as_deref().filter(|u| !u.is_empty());
        match cred_type {
            AccessCredType::Ssh => {
                let ssh_method = parse_variant(SSH_METHOD, method, SshMethod::Ga)?;
                let propagation_method = match ssh_method {
                    SshMethod::Ga => {
                        let user = user.or(opts.user.as_deref()).ok_or_else(|| {
                            FlagError::new(
                                ACCESS_CRED_FLAG,
                                format!(
                                    "user must be specified with access credential ssh method ga (\"--{USER_FLAG}\" flag or param \"user\")"
                                ),
                            )
                        })?;
                        // Let the guest agent manage the authorized keys
                        if opts.ga_manage_ssh.is_none() {
                            self.ga_manage_ssh_implied = true;
                        }
                        SshPropagationMethod::QemuGuestAgent(QemuGuestAgentSshPropagation {
                            users: vec![user.to_owned()],
                        })
                    }
                    SshMethod::NoCloud => {
                        reject_user(user)?;
                        self.require_cloud_init(CloudInitType::NoCloud)?;
                        SshPropagationMethod::NoCloud(EmptyPropagation {})
                    }
                    SshMethod::ConfigDrive => {
                        reject_user(user)?;
                        self.require_cloud_init(CloudInitType::ConfigDrive)?;
                        SshPropagationMethod::ConfigDrive(EmptyPropagation {})
                    }
                };
                Ok(AccessCredential::SshPublicKey(SshPublicKeyAccessCredential {
                    source,
                    propagation_method,
                }))
            }
            AccessCredType::Password => {
                let PasswordMethod::Ga = parse_variant(PASSWORD_METHOD, method, PasswordMethod::Ga)?;
                reject_user(user)?;
                Ok(AccessCredential::UserPassword(UserPasswordAccessCredential {
                    source,
                    propagation_method: PasswordPropagationMethod::QemuGuestAgent(
                        EmptyPropagation {},
                    ),
                }))
            }
        }
    }

    pub(super) fn with_access_creds(&mut self, opts: &CreateVmOpts) -> Result<()> {
        for value in &opts.access_creds {
            let cred = self.access_credential(opts, value)?;
            debug!("Adding access credential {cred:?}");
            self.template_spec().access_credentials.push(cred);
        }
        Ok(())
    }
}
