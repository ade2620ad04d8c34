//! `virtctl create instancetype`

use clap::Parser;
use color_eyre::Result;
use indoc::indoc;
use itertools::Itertools;
use strum::VariantNames;

use crate::api::instancetype::{
    CpuInstancetype, DeviceRequest, InstancetypeSpec, IoThreadsPolicy, MemoryInstancetype,
    VirtualMachineInstancetype, CLUSTER_INSTANCETYPE_KIND, INSTANCETYPE_KIND,
};
use crate::api::meta::ObjectMeta;
use crate::api::INSTANCETYPE_API_VERSION;
use crate::clientconfig::ClientConfig;
use crate::params::{self, FlagError, FromParams, Params, ParamsError};
use crate::quantity::Quantity;
use crate::utils::generate_name;

const MEMORY_FLAG: &str = "memory";
const GPU_FLAG: &str = "gpu";
const HOST_DEVICE_FLAG: &str = "hostdevice";
const IO_THREADS_POLICY_FLAG: &str = "iothreadspolicy";

const EXAMPLES: &str = indoc! { "
    Examples:
      # Create a manifest for a VirtualMachineClusterInstancetype:
      virtctl create instancetype --cpu 2 --memory 256Mi

      # Create a manifest for a namespaced VirtualMachineInstancetype:
      virtctl create instancetype --namespaced --cpu 2 --memory 256Mi

      # Create a manifest with a passed-through GPU:
      virtctl create instancetype --cpu 2 --memory 256Mi --gpu name:gpu1,devicename:nvidia/gpu1
" };

/// Options of `virtctl create instancetype`
#[derive(Debug, Parser)]
#[clap(after_help = EXAMPLES)]
pub struct CreateInstancetypeOpts {
    /// Name of the instancetype (default: instancetype-<random>)
    #[clap(long)]
    pub name: Option<String>,

    /// Number of vCPUs of the guest
    #[clap(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub cpu: u32,

    /// Amount of guest memory, e.g. 256Mi or 2Gi
    #[clap(long)]
    pub memory: String,

    #[clap(
        long = GPU_FLAG,
        help = params::help::<DeviceParams>("GPU to pass through to the guest. Can be provided multiple times.")
    )]
    pub gpus: Vec<String>,

    #[clap(
        long = HOST_DEVICE_FLAG,
        help = params::help::<DeviceParams>("Host device to pass through to the guest. Can be provided multiple times.")
    )]
    pub host_devices: Vec<String>,

    /// IO threads policy (shared or auto)
    #[clap(long = IO_THREADS_POLICY_FLAG)]
    pub io_threads_policy: Option<String>,

    /// Create a namespaced VirtualMachineInstancetype instead of a cluster-wide one
    #[clap(long)]
    pub namespaced: bool,
}

/// Params of `--gpu` and `--hostdevice`.
#[derive(Debug)]
struct DeviceParams {
    name: Option<String>,
    device_name: Option<String>,
}

impl FromParams for DeviceParams {
    const SUPPORTED: &'static [(&'static str, &'static str)] =
        &[("name", "string"), ("devicename", "string")];

    fn from_params(params: &mut Params) -> Result<Self, ParamsError> {
        Ok(Self {
            name: params.take("name"),
            device_name: params.take("devicename"),
        })
    }
}

fn device_request(flag: &'static str, value: &str) -> Result<DeviceRequest, FlagError> {
    let p: DeviceParams = params::map(flag, value)?;
    let name = p
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| FlagError::new(flag, "name must be specified"))?;
    let device_name = p
        .device_name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| FlagError::new(flag, "devicename must be specified"))?;
    Ok(DeviceRequest { name, device_name })
}

fn device_requests(flag: &'static str, values: &[String]) -> Result<Vec<DeviceRequest>, FlagError> {
    values.iter().map(|v| device_request(flag, v)).collect()
}

/// Build the instancetype described by `opts`.
pub fn build(
    opts: &CreateInstancetypeOpts,
    client: &ClientConfig,
) -> Result<VirtualMachineInstancetype> {
    let memory: Quantity = opts
        .memory
        .parse()
        .map_err(|e| FlagError::new(MEMORY_FLAG, e))?;
    if !memory.is_positive() {
        return Err(FlagError::new(MEMORY_FLAG, "memory must be greater than zero").into());
    }

    let io_threads_policy = opts
        .io_threads_policy
        .as_deref()
        .map(|v| {
            v.parse::<IoThreadsPolicy>().map_err(|_| {
                FlagError::new(
                    IO_THREADS_POLICY_FLAG,
                    format!(
                        "invalid IOThreadsPolicy \"{v}\", supported values are: {}",
                        IoThreadsPolicy::VARIANTS.iter().join(", ")
                    ),
                )
            })
        })
        .transpose()?;

    let (kind, namespace) = if opts.namespaced {
        (INSTANCETYPE_KIND, client.overridden_namespace()?)
    } else {
        (CLUSTER_INSTANCETYPE_KIND, None)
    };
    let name = opts
        .name
        .clone()
        .unwrap_or_else(|| generate_name("instancetype"));

    Ok(VirtualMachineInstancetype {
        api_version: INSTANCETYPE_API_VERSION.to_owned(),
        kind: kind.to_owned(),
        metadata: ObjectMeta::new(name, namespace),
        spec: InstancetypeSpec {
            cpu: CpuInstancetype { guest: opts.cpu },
            memory: MemoryInstancetype { guest: memory },
            gpus: device_requests(GPU_FLAG, &opts.gpus)?,
            host_devices: device_requests(HOST_DEVICE_FLAG, &opts.host_devices)?,
            io_threads_policy,
        },
    })
}
