//! Inferring the instancetype and preference from a volume.
//!
//! Inference is enabled by default. When the user did not ask for it
//! explicitly, failures are not reported: the matcher is then only added if a
//! suitable volume exists, and it tells KubeVirt to ignore inference failures.

use color_eyre::eyre::eyre;
use color_eyre::Result;
use tracing::debug;

use super::{CreateVmOpts, VmBuilder};
use crate::api::cdi::{DataVolumeSource, DATA_SOURCE_KIND};
use crate::api::kubevirt::{InferFromVolumeFailurePolicy, Matcher, Volume, VolumeSource};

const INVALID_VOLUME_ERROR: &str =
    "inference of instancetype or preference works only with datasources, datavolumes or pvcs";
const INVALID_DATA_VOLUME_ERROR: &str = "this datavolume is not valid to infer an instancetype or preference from (source needs to be PVC, Registry or Snapshot, sourceRef needs to be DataSource)";

/// What the matcher is inferred for.
#[derive(Debug, Clone, Copy)]
enum Target {
    Instancetype,
    Preference,
}

impl VmBuilder {
    /// The volume to infer from when none was named: the disk with the
    /// lowest boot order, else the first volume.
    fn default_infer_volume(&self) -> Result<String> {
        if let Some(name) = self.boot_orders.values().next() {
            return Ok(name.clone());
        }
        self.vm
            .spec
            .template
            .spec
            .volumes
            .first()
            .map(|v| v.name.clone())
            .ok_or_else(|| eyre!("at least one volume is needed to infer an instance type or preference"))
    }

    fn volume(&self, name: &str) -> Result<&Volume> {
        self.vm
            .spec
            .template
            .spec
            .volumes
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| eyre!("there is no volume with name \"{name}\""))
    }

    fn check_infer_volume(&self, volume: &Volume) -> Result<()> {
        match &volume.source {
            VolumeSource::PersistentVolumeClaim(_) => Ok(()),
            VolumeSource::DataVolume(dv) => {
                let Some(template) = self
                    .vm
                    .spec
                    .data_volume_templates
                    .iter()
                    .find(|t| t.metadata.name == dv.name)
                else {
                    // Not created by this VM, nothing to check
                    return Ok(());
                };
                let spec = &template.spec;
                let valid_source = matches!(
                    spec.source,
                    Some(
                        DataVolumeSource::Pvc(_)
                            | DataVolumeSource::Registry(_)
                            | DataVolumeSource::Snapshot(_)
                    )
                );
                let valid_ref = spec
                    .source_ref
                    .as_ref()
                    .is_some_and(|r| r.kind == DATA_SOURCE_KIND);
                if valid_source || valid_ref {
                    Ok(())
                } else {
                    Err(eyre!(INVALID_DATA_VOLUME_ERROR))
                }
            }
            _ => Err(eyre!(INVALID_VOLUME_ERROR)),
        }
    }

    fn infer(&mut self, target: Target, from: Option<&str>, explicit: bool) -> Result<()> {
        let from = match from {
            Some(name) => name.to_owned(),
            None => self.default_infer_volume()?,
        };
        let volume = self.volume(&from)?;
        self.check_infer_volume(volume)?;
        debug!("Inferring {target:?} from volume {from}");

        let matcher = Matcher {
            infer_from_volume: from,
            infer_from_volume_failure_policy: (!explicit)
                .then_some(InferFromVolumeFailurePolicy::Ignore),
            ..Default::default()
        };
        match target {
            Target::Instancetype => {
                self.vm.spec.instancetype = Some(matcher);
                // Keep the memory as fallback if inference may fail
                if explicit {
                    self.template_spec().domain.memory = None;
                }
            }
            Target::Preference => self.vm.spec.preference = Some(matcher),
        }
        Ok(())
    }

    pub(super) fn with_inference(&mut self, opts: &CreateVmOpts) -> Result<()> {
        let explicit = opts.infer_instancetype.is_some() || opts.infer_instancetype_from.is_some();
        if opts.infer_instancetype.unwrap_or(true)
            && opts.instancetype.is_none()
            && opts.memory.is_none()
        {
            let r = self.infer(
                Target::Instancetype,
                opts.infer_instancetype_from.as_deref(),
                explicit,
            );
            match r {
                Err(e) if !explicit => debug!("Skipping instancetype inference: {e}"),
                r => r?,
            }
        }

        let explicit = opts.infer_preference.is_some() || opts.infer_preference_from.is_some();
        if opts.infer_preference.unwrap_or(true) && opts.preference.is_none() {
            let r = self.infer(
                Target::Preference,
                opts.infer_preference_from.as_deref(),
                explicit,
            );
            match r {
                Err(e) if !explicit => debug!("Skipping preference inference: {e}"),
                r => r?,
            }
        }
        Ok(())
    }
}
