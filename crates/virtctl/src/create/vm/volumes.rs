//! Volume flags of `virtctl create vm`.
//!
//! Containerdisks and PVCs are used directly by the VM. Everything else is
//! described by a DataVolumeTemplate which CDI populates when the VM is
//! created; `--volume-datasource`, `--volume-clone-pvc` and `--volume-blank`
//! are shorthands for the matching `--volume-import` types.

use color_eyre::Result;
use strum::{Display, EnumString, VariantNames};

use super::{
    CreateVmOpts, VmBuilder, BLANK_VOLUME_FLAG, CLONE_PVC_VOLUME_FLAG, CONTAINERDISK_VOLUME_FLAG,
    DATASOURCE_VOLUME_FLAG, IMPORT_VOLUME_FLAG, PVC_VOLUME_FLAG, SYSPREP_VOLUME_FLAG,
};
use crate::api::cdi::{
    BlankSource, DataVolumeSource, DataVolumeSourceRef, DataVolumeSpec, GcsSource, HttpSource,
    ImageIoSource, PvcSource, RegistryPullMethod, RegistrySource, S3Source, SnapshotSource,
    StorageSpec, VddkSource, DATA_SOURCE_KIND,
};
use crate::api::kubevirt::{
    ContainerDiskSource, PersistentVolumeClaimSource, SysprepSource, VolumeSource,
};
use crate::api::meta::LocalObjectReference;
use crate::params::{
    self, get_param_by_name, split_prefixed_name, FlagError, FromParams, Params, ParamsError,
};
use crate::quantity::Quantity;
use crate::utils::generate_name;

const SYSPREP_VOLUME_NAME: &str = "sysprepdisk";

/// Params of `--volume-containerdisk` and `--volume-pvc`.
#[derive(Debug)]
pub(super) struct SourceParams {
    src: Option<String>,
    name: Option<String>,
    boot_order: Option<u32>,
}

impl FromParams for SourceParams {
    const SUPPORTED: &'static [(&'static str, &'static str)] =
        &[("src", "string"), ("name", "string"), ("bootorder", "uint")];

    fn from_params(params: &mut Params) -> Result<Self, ParamsError> {
        Ok(Self {
            src: params.take("src"),
            name: params.take("name"),
            boot_order: params.take_uint("bootorder")?,
        })
    }
}

/// Params of `--volume-datasource` and `--volume-clone-pvc`.
#[derive(Debug)]
pub(super) struct SizedSourceParams {
    src: Option<String>,
    name: Option<String>,
    size: Option<Quantity>,
    boot_order: Option<u32>,
}

impl FromParams for SizedSourceParams {
    const SUPPORTED: &'static [(&'static str, &'static str)] = &[
        ("src", "string"),
        ("name", "string"),
        ("size", "resource.Quantity"),
        ("bootorder", "uint"),
    ];

    fn from_params(params: &mut Params) -> Result<Self, ParamsError> {
        Ok(Self {
            src: params.take("src"),
            name: params.take("name"),
            size: params.take_quantity("size")?,
            boot_order: params.take_uint("bootorder")?,
        })
    }
}

/// Params of `--volume-blank`.
#[derive(Debug)]
pub(super) struct BlankParams {
    name: Option<String>,
    size: Option<Quantity>,
}

impl FromParams for BlankParams {
    const SUPPORTED: &'static [(&'static str, &'static str)] =
        &[("name", "string"), ("size", "resource.Quantity")];

    fn from_params(params: &mut Params) -> Result<Self, ParamsError> {
        Ok(Self {
            name: params.take("name"),
            size: params.take_quantity("size")?,
        })
    }
}

/// Params of `--volume-sysprep`.
#[derive(Debug)]
pub(super) struct SysprepParams {
    src: Option<String>,
    source_type: Option<String>,
}

impl FromParams for SysprepParams {
    const SUPPORTED: &'static [(&'static str, &'static str)] =
        &[("src", "string"), ("type", "string")];

    fn from_params(params: &mut Params) -> Result<Self, ParamsError> {
        Ok(Self {
            src: params.take("src"),
            source_type: params.take("type"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, VariantNames)]
#[strum(serialize_all = "lowercase")]
enum SysprepSourceType {
    ConfigMap,
    Secret,
}

/// Types accepted by `--volume-import`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, VariantNames)]
#[strum(serialize_all = "lowercase")]
enum ImportType {
    Blank,
    Gcs,
    Http,
    Imageio,
    Pvc,
    Registry,
    S3,
    Vddk,
    Snapshot,
    Ds,
}

/// Params shared by every `--volume-import` type.
#[derive(Debug, Default)]
struct ImportCommon {
    name: Option<String>,
    size: Option<Quantity>,
    boot_order: Option<u32>,
}

impl ImportCommon {
    const SUPPORTED: [(&'static str, &'static str); 3] = [
        ("name", "string"),
        ("size", "resource.Quantity"),
        ("bootorder", "uint"),
    ];

    fn take(params: &mut Params) -> Result<Self, ParamsError> {
        // Already evaluated to pick the import type
        params.take("type");
        Ok(Self {
            name: params.take("name"),
            size: params.take_quantity("size")?,
            boot_order: params.take_uint("bootorder")?,
        })
    }
}

/// How the DataVolume is populated.
#[derive(Debug)]
enum ImportSource {
    Source(DataVolumeSource),
    SourceRef(DataVolumeSourceRef),
}

/// A `--volume-import` type with its own params.
trait Import: FromParams {
    const SIZE_REQUIRED: bool = true;

    fn into_parts(self) -> Result<(ImportCommon, ImportSource), String>;
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn split_src(src: Option<String>) -> Result<(Option<String>, String), String> {
    let src = required(src).ok_or("src must be specified")?;
    let (namespace, name) = split_prefixed_name(&src).map_err(|e| format!("src invalid: {e}"))?;
    Ok((namespace.map(ToOwned::to_owned), name.to_owned()))
}

fn pvc_source(src: Option<String>) -> Result<ImportSource, String> {
    let (namespace, name) = split_src(src)?;
    let namespace = namespace.ok_or_else(|| format!("namespace of pvc \"{name}\" must be specified"))?;
    Ok(ImportSource::Source(DataVolumeSource::Pvc(PvcSource {
        namespace,
        name,
    })))
}

fn data_source_ref(src: Option<String>) -> Result<ImportSource, String> {
    let (namespace, name) = split_src(src)?;
    Ok(ImportSource::SourceRef(DataVolumeSourceRef {
        kind: DATA_SOURCE_KIND.to_owned(),
        namespace,
        name,
    }))
}

#[derive(Debug)]
struct BlankImport {
    common: ImportCommon,
}

impl FromParams for BlankImport {
    const SUPPORTED: &'static [(&'static str, &'static str)] = &ImportCommon::SUPPORTED;

    fn from_params(params: &mut Params) -> Result<Self, ParamsError> {
        Ok(Self {
            common: ImportCommon::take(params)?,
        })
    }
}

impl Import for BlankImport {
    fn into_parts(self) -> Result<(ImportCommon, ImportSource), String> {
        let source = DataVolumeSource::Blank(BlankSource {});
        Ok((self.common, ImportSource::Source(source)))
    }
}

#[derive(Debug)]
struct GcsImport {
    common: ImportCommon,
    url: Option<String>,
    secret_ref: Option<String>,
}

impl FromParams for GcsImport {
    const SUPPORTED: &'static [(&'static str, &'static str)] = &[
        ("name", "string"),
        ("size", "resource.Quantity"),
        ("bootorder", "uint"),
        ("url", "string"),
        ("secretref", "string"),
    ];

    fn from_params(params: &mut Params) -> Result<Self, ParamsError> {
        Ok(Self {
            common: ImportCommon::take(params)?,
            url: params.take("url"),
            secret_ref: params.take("secretref"),
        })
    }
}

impl Import for GcsImport {
    fn into_parts(self) -> Result<(ImportCommon, ImportSource), String> {
        let url = required(self.url).ok_or("url is required with gcs volume source")?;
        let source = DataVolumeSource::Gcs(GcsSource {
            url,
            secret_ref: self.secret_ref.unwrap_or_default(),
        });
        Ok((self.common, ImportSource::Source(source)))
    }
}

#[derive(Debug)]
struct HttpImport {
    common: ImportCommon,
    url: Option<String>,
    secret_ref: Option<String>,
    cert_config_map: Option<String>,
    extra_headers: Option<String>,
    secret_extra_headers: Option<String>,
}

impl FromParams for HttpImport {
    const SUPPORTED: &'static [(&'static str, &'static str)] = &[
        ("name", "string"),
        ("size", "resource.Quantity"),
        ("bootorder", "uint"),
        ("url", "string"),
        ("secretref", "string"),
        ("certconfigmap", "string"),
        ("extraheaders", "[]string"),
        ("secretextraheaders", "[]string"),
    ];

    fn from_params(params: &mut Params) -> Result<Self, ParamsError> {
        Ok(Self {
            common: ImportCommon::take(params)?,
            url: params.take("url"),
            secret_ref: params.take("secretref"),
            cert_config_map: params.take("certconfigmap"),
            extra_headers: params.take("extraheaders"),
            secret_extra_headers: params.take("secretextraheaders"),
        })
    }
}

impl Import for HttpImport {
    fn into_parts(self) -> Result<(ImportCommon, ImportSource), String> {
        let url = required(self.url).ok_or("url is required with http volume source")?;
        let source = DataVolumeSource::Http(HttpSource {
            url,
            secret_ref: self.secret_ref.unwrap_or_default(),
            cert_config_map: self.cert_config_map.unwrap_or_default(),
            extra_headers: self.extra_headers.into_iter().collect(),
            secret_extra_headers: self.secret_extra_headers.into_iter().collect(),
        });
        Ok((self.common, ImportSource::Source(source)))
    }
}

#[derive(Debug)]
struct ImageIoImport {
    common: ImportCommon,
    url: Option<String>,
    disk_id: Option<String>,
    secret_ref: Option<String>,
    cert_config_map: Option<String>,
}

impl FromParams for ImageIoImport {
    const SUPPORTED: &'static [(&'static str, &'static str)] = &[
        ("name", "string"),
        ("size", "resource.Quantity"),
        ("bootorder", "uint"),
        ("url", "string"),
        ("diskid", "string"),
        ("secretref", "string"),
        ("certconfigmap", "string"),
    ];

    fn from_params(params: &mut Params) -> Result<Self, ParamsError> {
        Ok(Self {
            common: ImportCommon::take(params)?,
            url: params.take("url"),
            disk_id: params.take("diskid"),
            secret_ref: params.take("secretref"),
            cert_config_map: params.take("certconfigmap"),
        })
    }
}

impl Import for ImageIoImport {
    fn into_parts(self) -> Result<(ImportCommon, ImportSource), String> {
        let (Some(url), Some(disk_id)) = (required(self.url), required(self.disk_id)) else {
            return Err("url and diskid are both required with imageio volume source".into());
        };
        let source = DataVolumeSource::Imageio(ImageIoSource {
            url,
            disk_id,
            secret_ref: self.secret_ref.unwrap_or_default(),
            cert_config_map: self.cert_config_map.unwrap_or_default(),
        });
        Ok((self.common, ImportSource::Source(source)))
    }
}

/// `type:pvc` clones a PVC of any namespace.
#[derive(Debug)]
struct PvcImport {
    common: ImportCommon,
    src: Option<String>,
}

impl FromParams for PvcImport {
    const SUPPORTED: &'static [(&'static str, &'static str)] = &[
        ("name", "string"),
        ("size", "resource.Quantity"),
        ("bootorder", "uint"),
        ("src", "string"),
    ];

    fn from_params(params: &mut Params) -> Result<Self, ParamsError> {
        Ok(Self {
            common: ImportCommon::take(params)?,
            src: params.take("src"),
        })
    }
}

impl Import for PvcImport {
    const SIZE_REQUIRED: bool = false;

    fn into_parts(self) -> Result<(ImportCommon, ImportSource), String> {
        Ok((self.common, pvc_source(self.src)?))
    }
}

#[derive(Debug)]
struct RegistryImport {
    common: ImportCommon,
    url: Option<String>,
    image_stream: Option<String>,
    pull_method: Option<String>,
    secret_ref: Option<String>,
    cert_config_map: Option<String>,
}

impl FromParams for RegistryImport {
    const SUPPORTED: &'static [(&'static str, &'static str)] = &[
        ("name", "string"),
        ("size", "resource.Quantity"),
        ("bootorder", "uint"),
        ("url", "string"),
        ("imagestream", "string"),
        ("pullmethod", "string"),
        ("secretref", "string"),
        ("certconfigmap", "string"),
    ];

    fn from_params(params: &mut Params) -> Result<Self, ParamsError> {
        Ok(Self {
            common: ImportCommon::take(params)?,
            url: params.take("url"),
            image_stream: params.take("imagestream"),
            pull_method: params.take("pullmethod"),
            secret_ref: params.take("secretref"),
            cert_config_map: params.take("certconfigmap"),
        })
    }
}

impl Import for RegistryImport {
    fn into_parts(self) -> Result<(ImportCommon, ImportSource), String> {
        let pull_method = required(self.pull_method)
            .map(|m| m.parse::<RegistryPullMethod>())
            .transpose()
            .map_err(|_| "pullmethod must be set to pod or node")?;
        let url = required(self.url);
        let image_stream = required(self.image_stream);
        if url.is_some() == image_stream.is_some() {
            return Err("exactly one of url or imagestream must be defined".into());
        }
        let source = DataVolumeSource::Registry(RegistrySource {
            url,
            image_stream,
            pull_method,
            secret_ref: required(self.secret_ref),
            cert_config_map: required(self.cert_config_map),
        });
        Ok((self.common, ImportSource::Source(source)))
    }
}

#[derive(Debug)]
struct S3Import {
    common: ImportCommon,
    url: Option<String>,
    secret_ref: Option<String>,
    cert_config_map: Option<String>,
}

impl FromParams for S3Import {
    const SUPPORTED: &'static [(&'static str, &'static str)] = &[
        ("name", "string"),
        ("size", "resource.Quantity"),
        ("bootorder", "uint"),
        ("url", "string"),
        ("secretref", "string"),
        ("certconfigmap", "string"),
    ];

    fn from_params(params: &mut Params) -> Result<Self, ParamsError> {
        Ok(Self {
            common: ImportCommon::take(params)?,
            url: params.take("url"),
            secret_ref: params.take("secretref"),
            cert_config_map: params.take("certconfigmap"),
        })
    }
}

impl Import for S3Import {
    fn into_parts(self) -> Result<(ImportCommon, ImportSource), String> {
        let url = required(self.url).ok_or("url is required with s3 volume source")?;
        let source = DataVolumeSource::S3(S3Source {
            url,
            secret_ref: self.secret_ref.unwrap_or_default(),
            cert_config_map: self.cert_config_map.unwrap_or_default(),
        });
        Ok((self.common, ImportSource::Source(source)))
    }
}

#[derive(Debug)]
struct VddkImport {
    common: ImportCommon,
    url: Option<String>,
    uuid: Option<String>,
    thumbprint: Option<String>,
    secret_ref: Option<String>,
    backing_file: Option<String>,
    init_image_url: Option<String>,
}

impl FromParams for VddkImport {
    const SUPPORTED: &'static [(&'static str, &'static str)] = &[
        ("name", "string"),
        ("size", "resource.Quantity"),
        ("bootorder", "uint"),
        ("url", "string"),
        ("uuid", "string"),
        ("thumbprint", "string"),
        ("secretref", "string"),
        ("backingfile", "string"),
        ("initimageurl", "string"),
    ];

    fn from_params(params: &mut Params) -> Result<Self, ParamsError> {
        Ok(Self {
            common: ImportCommon::take(params)?,
            url: params.take("url"),
            uuid: params.take("uuid"),
            thumbprint: params.take("thumbprint"),
            secret_ref: params.take("secretref"),
            backing_file: params.take("backingfile"),
            init_image_url: params.take("initimageurl"),
        })
    }
}

impl Import for VddkImport {
    fn into_parts(self) -> Result<(ImportCommon, ImportSource), String> {
        let need = |value: Option<String>, param: &str| {
            required(value).ok_or_else(|| format!("{param} is required with vddk volume source"))
        };
        let source = DataVolumeSource::Vddk(VddkSource {
            url: need(self.url, "url")?,
            uuid: need(self.uuid, "uuid")?,
            thumbprint: need(self.thumbprint, "thumbprint")?,
            secret_ref: need(self.secret_ref, "secretref")?,
            backing_file: need(self.backing_file, "backingfile")?,
            init_image_url: self.init_image_url.unwrap_or_default(),
        });
        Ok((self.common, ImportSource::Source(source)))
    }
}

/// `type:snapshot` restores a VolumeSnapshot of any namespace.
#[derive(Debug)]
struct SnapshotImport {
    common: ImportCommon,
    src: Option<String>,
}

impl FromParams for SnapshotImport {
    const SUPPORTED: &'static [(&'static str, &'static str)] = &[
        ("name", "string"),
        ("size", "resource.Quantity"),
        ("bootorder", "uint"),
        ("src", "string"),
    ];

    fn from_params(params: &mut Params) -> Result<Self, ParamsError> {
        Ok(Self {
            common: ImportCommon::take(params)?,
            src: params.take("src"),
        })
    }
}

impl Import for SnapshotImport {
    const SIZE_REQUIRED: bool = false;

    fn into_parts(self) -> Result<(ImportCommon, ImportSource), String> {
        let (namespace, name) = split_src(self.src)?;
        let namespace =
            namespace.ok_or_else(|| format!("namespace of snapshot \"{name}\" must be specified"))?;
        let source = DataVolumeSource::Snapshot(SnapshotSource { namespace, name });
        Ok((self.common, ImportSource::Source(source)))
    }
}

/// `type:ds` clones a DataSource; the namespace defaults to the VM's.
#[derive(Debug)]
struct DataSourceImport {
    common: ImportCommon,
    src: Option<String>,
}

impl FromParams for DataSourceImport {
    const SUPPORTED: &'static [(&'static str, &'static str)] = &[
        ("name", "string"),
        ("size", "resource.Quantity"),
        ("bootorder", "uint"),
        ("src", "string"),
    ];

    fn from_params(params: &mut Params) -> Result<Self, ParamsError> {
        Ok(Self {
            common: ImportCommon::take(params)?,
            src: params.take("src"),
        })
    }
}

impl Import for DataSourceImport {
    const SIZE_REQUIRED: bool = false;

    fn into_parts(self) -> Result<(ImportCommon, ImportSource), String> {
        Ok((self.common, data_source_ref(self.src)?))
    }
}

fn import_line<T: FromParams>(ty: ImportType) -> String {
    format!("  type:{ty},{}", params::supported::<T>())
}

/// Help of `--volume-import`, listing the params of every type.
pub(super) fn import_help() -> String {
    let lines = [
        import_line::<BlankImport>(ImportType::Blank),
        import_line::<GcsImport>(ImportType::Gcs),
        import_line::<HttpImport>(ImportType::Http),
        import_line::<ImageIoImport>(ImportType::Imageio),
        import_line::<PvcImport>(ImportType::Pvc),
        import_line::<RegistryImport>(ImportType::Registry),
        import_line::<S3Import>(ImportType::S3),
        import_line::<VddkImport>(ImportType::Vddk),
        import_line::<SnapshotImport>(ImportType::Snapshot),
        import_line::<DataSourceImport>(ImportType::Ds),
    ];
    format!(
        "Volume to be imported into a DataVolume. Can be provided multiple times.\n\
         Supported parameters:\n{}",
        lines.join("\n")
    )
}

fn map_import<T: Import>(
    flag: &'static str,
    value: &str,
) -> Result<(ImportCommon, ImportSource), FlagError> {
    let imported: T = params::map(flag, value)?;
    let (common, source) = imported
        .into_parts()
        .map_err(|msg| FlagError::new(flag, msg))?;
    if T::SIZE_REQUIRED && common.size.is_none() {
        return Err(FlagError::new(flag, "size must be specified"));
    }
    Ok((common, source))
}

fn parse_import(value: &str) -> Result<(ImportCommon, ImportSource), FlagError> {
    let flag = IMPORT_VOLUME_FLAG;
    let ty = get_param_by_name("type", value).map_err(|e| match e {
        ParamsError::NotFound(_) => FlagError::new(flag, "type must be specified"),
        e => FlagError::new(flag, e),
    })?;
    let ty: ImportType = ty.parse().map_err(|_| {
        FlagError::new(
            flag,
            format!("invalid volume import type \"{ty}\", see help for supported values"),
        )
    })?;
    match ty {
        ImportType::Blank => map_import::<BlankImport>(flag, value),
        ImportType::Gcs => map_import::<GcsImport>(flag, value),
        ImportType::Http => map_import::<HttpImport>(flag, value),
        ImportType::Imageio => map_import::<ImageIoImport>(flag, value),
        ImportType::Pvc => map_import::<PvcImport>(flag, value),
        ImportType::Registry => map_import::<RegistryImport>(flag, value),
        ImportType::S3 => map_import::<S3Import>(flag, value),
        ImportType::Vddk => map_import::<VddkImport>(flag, value),
        ImportType::Snapshot => map_import::<SnapshotImport>(flag, value),
        ImportType::Ds => map_import::<DataSourceImport>(flag, value),
    }
}

impl VmBuilder {
    fn add_imported_volume(
        &mut self,
        flag: &'static str,
        common: ImportCommon,
        source: ImportSource,
    ) -> Result<(), FlagError> {
        let name = required(common.name).unwrap_or_else(|| generate_name("imported-volume"));
        let mut spec = DataVolumeSpec {
            storage: StorageSpec::with_size(common.size),
            ..Default::default()
        };
        match source {
            ImportSource::Source(s) => spec.source = Some(s),
            ImportSource::SourceRef(r) => spec.source_ref = Some(r),
        }
        self.add_data_volume(flag, name, spec, common.boot_order)
    }

    pub(super) fn with_containerdisk_volumes(&mut self, opts: &CreateVmOpts) -> Result<()> {
        let flag = CONTAINERDISK_VOLUME_FLAG;
        for (i, value) in opts.containerdisk_volumes.iter().enumerate() {
            let p: SourceParams = params::map(flag, value)?;
            let image = required(p.src).ok_or_else(|| FlagError::new(flag, "src must be specified"))?;
            let name = required(p.name)
                .unwrap_or_else(|| format!("{}-containerdisk-{i}", self.vm_name()));
            let source = VolumeSource::ContainerDisk(ContainerDiskSource { image });
            self.add_volume(flag, name, source, p.boot_order)?;
        }
        Ok(())
    }

    pub(super) fn with_pvc_volumes(&mut self, opts: &CreateVmOpts) -> Result<()> {
        let flag = PVC_VOLUME_FLAG;
        for value in &opts.pvc_volumes {
            let p: SourceParams = params::map(flag, value)?;
            let (namespace, claim_name) = split_src(p.src).map_err(|e| FlagError::new(flag, e))?;
            if namespace.is_some() {
                return Err(FlagError::new(
                    flag,
                    format!("not allowed to specify namespace of pvc \"{claim_name}\""),
                )
                .into());
            }
            let name = required(p.name).unwrap_or_else(|| claim_name.clone());
            let source =
                VolumeSource::PersistentVolumeClaim(PersistentVolumeClaimSource { claim_name });
            self.add_volume(flag, name, source, p.boot_order)?;
        }
        Ok(())
    }

    pub(super) fn with_datasource_volumes(&mut self, opts: &CreateVmOpts) -> Result<()> {
        let flag = DATASOURCE_VOLUME_FLAG;
        for value in &opts.datasource_volumes {
            let p: SizedSourceParams = params::map(flag, value)?;
            let source = data_source_ref(p.src).map_err(|e| FlagError::new(flag, e))?;
            let common = ImportCommon {
                name: p.name,
                size: p.size,
                boot_order: p.boot_order,
            };
            self.add_imported_volume(flag, common, source)?;
        }
        Ok(())
    }

    pub(super) fn with_clone_pvc_volumes(&mut self, opts: &CreateVmOpts) -> Result<()> {
        let flag = CLONE_PVC_VOLUME_FLAG;
        for value in &opts.clone_pvc_volumes {
            let p: SizedSourceParams = params::map(flag, value)?;
            let source = pvc_source(p.src).map_err(|e| FlagError::new(flag, e))?;
            let common = ImportCommon {
                name: p.name,
                size: p.size,
                boot_order: p.boot_order,
            };
            self.add_imported_volume(flag, common, source)?;
        }
        Ok(())
    }

    pub(super) fn with_blank_volumes(&mut self, opts: &CreateVmOpts) -> Result<()> {
        let flag = BLANK_VOLUME_FLAG;
        for value in &opts.blank_volumes {
            let p: BlankParams = params::map(flag, value)?;
            if p.size.is_none() {
                return Err(FlagError::new(flag, "size must be specified").into());
            }
            let common = ImportCommon {
                name: p.name,
                size: p.size,
                boot_order: None,
            };
            let source = ImportSource::Source(DataVolumeSource::Blank(BlankSource {}));
            self.add_imported_volume(flag, common, source)?;
        }
        Ok(())
    }

    pub(super) fn with_import_volumes(&mut self, opts: &CreateVmOpts) -> Result<()> {
        for value in &opts.import_volumes {
            let (common, source) = parse_import(value)?;
            self.add_imported_volume(IMPORT_VOLUME_FLAG, common, source)?;
        }
        Ok(())
    }

    pub(super) fn with_sysprep_volume(&mut self, opts: &CreateVmOpts) -> Result<()> {
        let flag = SYSPREP_VOLUME_FLAG;
        let Some(value) = opts.sysprep_volume.as_deref() else {
            return Ok(());
        };
        let p: SysprepParams = params::map(flag, value)?;
        let (namespace, name) = split_src(p.src).map_err(|e| FlagError::new(flag, e))?;
        if namespace.is_some() {
            return Err(FlagError::new(
                flag,
                format!("not allowed to specify namespace of configmap or secret \"{name}\""),
            )
            .into());
        }
        let source_type = match required(p.source_type) {
            None => SysprepSourceType::ConfigMap,
            Some(t) => t.to_lowercase().parse().map_err(|_| {
                FlagError::new(
                    flag,
                    format!(
                        "invalid sysprep source type \"{t}\", supported values are: {}",
                        SysprepSourceType::VARIANTS.join(", ")
                    ),
                )
            })?,
        };
        let reference = LocalObjectReference { name };
        let source = match source_type {
            SysprepSourceType::ConfigMap => SysprepSource::ConfigMap(reference),
            SysprepSourceType::Secret => SysprepSource::Secret(reference),
        };
        self.add_volume(
            flag,
            SYSPREP_VOLUME_NAME.to_owned(),
            VolumeSource::Sysprep(source),
            None,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_help() {
        let help = import_help();
        assert!(help.contains("  type:blank,name:string,size:resource.Quantity,bootorder:uint\n"));
        assert!(help.contains(
            "  type:vddk,name:string,size:resource.Quantity,bootorder:uint,url:string,uuid:string,\
             thumbprint:string,secretref:string,backingfile:string,initimageurl:string"
        ));
        assert!(help.ends_with("type:ds,name:string,size:resource.Quantity,bootorder:uint,src:string"));
    }

    #[test]
    fn test_parse_import_type() {
        let (common, source) = parse_import("type:http,url:http://example.com/disk.img,size:1Gi").unwrap();
        assert_eq!(common.size.unwrap().as_str(), "1Gi");
        assert!(matches!(
            source,
            ImportSource::Source(DataVolumeSource::Http(HttpSource { ref url, .. })) if url == "http://example.com/disk.img"
        ));

        let (common, source) = parse_import("TYPE:ds,src:my-ns/fedora").unwrap();
        assert!(common.size.is_none());
        assert!(matches!(
            source,
            ImportSource::SourceRef(DataVolumeSourceRef { ref namespace, .. }) if namespace.as_deref() == Some("my-ns")
        ));
    }

    #[test]
    fn test_sysprep_type_names() {
        assert_eq!(SysprepSourceType::VARIANTS, &["configmap", "secret"]);
        assert_eq!("configmap".parse::<SysprepSourceType>().unwrap(), SysprepSourceType::ConfigMap);
    }
}
