//! Resolution of the namespace the generated objects belong to.
//!
//! Mirrors how kubectl picks its namespace: an explicit `--namespace` wins,
//! then the namespace of the current kubeconfig context, then `default`.
//! Only an explicitly requested namespace is written into manifests.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use tracing::debug;
use yaml_rust2::{Yaml, YamlLoader};

const DEFAULT_NAMESPACE: &str = "default";

/// Cluster connection options shared by all commands.
#[derive(Debug, Clone, Default, Args)]
pub struct ClientConfig {
    /// Path to the kubeconfig file to use
    #[clap(long, global = true)]
    pub kubeconfig: Option<Utf8PathBuf>,

    /// The name of the kubeconfig context to use
    #[clap(long, global = true)]
    pub context: Option<String>,

    /// If present, the namespace scope for this CLI request
    #[clap(short = 'n', long, global = true)]
    pub namespace: Option<String>,
}

impl ClientConfig {
    /// Returns the namespace and whether it was explicitly requested.
    pub fn namespace(&self) -> Result<(String, bool)> {
        if let Some(ns) = self.namespace.as_deref().filter(|ns| !ns.is_empty()) {
            return Ok((ns.to_owned(), true));
        }
        let ns = self
            .kubeconfig_namespace()?
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_owned());
        Ok((ns, false))
    }

    /// The explicitly requested namespace, if any.
    pub fn overridden_namespace(&self) -> Result<Option<String>> {
        let (namespace, overridden) = self.namespace()?;
        debug!("Using namespace {namespace} (overridden: {overridden})");
        Ok(overridden.then_some(namespace))
    }

    /// A config which never reads the user's kubeconfig.
    #[cfg(test)]
    pub(crate) fn isolated(namespace: Option<&str>) -> Self {
        Self {
            kubeconfig: Some("/nonexistent/kubeconfig".into()),
            context: None,
            namespace: namespace.map(ToOwned::to_owned),
        }
    }

    fn kubeconfig_paths(&self) -> Vec<Utf8PathBuf> {
        if let Some(path) = &self.kubeconfig {
            return vec![path.clone()];
        }
        if let Some(paths) = std::env::var("KUBECONFIG").ok().filter(|v| !v.is_empty()) {
            return paths
                .split(':')
                .filter(|p| !p.is_empty())
                .map(Utf8PathBuf::from)
                .collect();
        }
        dirs::home_dir()
            .and_then(|home| Utf8PathBuf::from_path_buf(home).ok())
            .map(|home| vec![home.join(".kube/config")])
            .unwrap_or_default()
    }

    fn kubeconfig_namespace(&self) -> Result<Option<String>> {
        let mut docs = Vec::new();
        for path in self.kubeconfig_paths() {
            if let Some(doc) = load_kubeconfig(&path)? {
                docs.push(doc);
            }
        }
        Ok(context_namespace(&docs, self.context.as_deref()))
    }
}

/// Load a kubeconfig file, treating a missing file as absent.
fn load_kubeconfig(path: &Utf8Path) -> Result<Option<Yaml>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No kubeconfig at {path}");
            return Ok(None);
        }
        Err(e) => return Err(e).with_context(|| format!("Reading kubeconfig {path}")),
    };
    let mut docs = YamlLoader::load_from_str(&contents)
        .with_context(|| format!("Parsing kubeconfig {path}"))?;
    if docs.is_empty() {
        return Ok(None);
    }
    let doc = docs.swap_remove(0);
    if !matches!(doc, Yaml::Hash(_)) {
        return Err(eyre!("Parsing kubeconfig {path}: expected a mapping"));
    }
    Ok(Some(doc))
}

/// Find the namespace of the selected context. When several kubeconfig files
/// are merged the first file defining a value wins.
fn context_namespace(docs: &[Yaml], context: Option<&str>) -> Option<String> {
    let current = context
        .map(ToOwned::to_owned)
        .or_else(|| {
            docs.iter()
                .find_map(|doc| doc["current-context"].as_str().map(ToOwned::to_owned))
        })
        .filter(|c| !c.is_empty())?;
    let ctx = docs
        .iter()
        .filter_map(|doc| doc["contexts"].as_vec())
        .flatten()
        .find(|ctx| ctx["name"].as_str() == Some(current.as_str()))?;
    ctx["context"]["namespace"]
        .as_str()
        .filter(|ns| !ns.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use similar_asserts::assert_eq;

    use super::*;

    const KUBECONFIG: &str = indoc! { "
        apiVersion: v1
        kind: Config
        current-context: dev
        contexts:
          - name: dev
            context:
              cluster: local
              namespace: dev-ns
          - name: prod
            context:
              cluster: remote
              namespace: prod-ns
          - name: bare
            context:
              cluster: local
    " };

    fn write_kubeconfig(contents: &str) -> (tempfile::TempDir, Utf8PathBuf) {
        let td = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(td.path().join("config")).unwrap();
        std::fs::write(&path, contents).unwrap();
        (td, path)
    }

    fn config(kubeconfig: &Utf8Path) -> ClientConfig {
        ClientConfig {
            kubeconfig: Some(kubeconfig.to_owned()),
            ..Default::default()
        }
    }

    #[test]
    fn test_explicit_namespace() {
        let cfg = ClientConfig {
            namespace: Some("my-ns".into()),
            kubeconfig: Some("/nonexistent/kubeconfig".into()),
            ..Default::default()
        };
        assert_eq!(cfg.namespace().unwrap(), ("my-ns".to_owned(), true));
        assert_eq!(cfg.overridden_namespace().unwrap().as_deref(), Some("my-ns"));
    }

    #[test]
    fn test_current_context_namespace() {
        let (_td, path) = write_kubeconfig(KUBECONFIG);
        let cfg = config(&path);
        assert_eq!(cfg.namespace().unwrap(), ("dev-ns".to_owned(), false));
        assert_eq!(cfg.overridden_namespace().unwrap(), None);
    }

    #[test]
    fn test_context_override() {
        let (_td, path) = write_kubeconfig(KUBECONFIG);
        let mut cfg = config(&path);
        cfg.context = Some("prod".into());
        assert_eq!(cfg.namespace().unwrap().0, "prod-ns");
        cfg.context = Some("bare".into());
        assert_eq!(cfg.namespace().unwrap().0, "default");
        cfg.context = Some("missing".into());
        assert_eq!(cfg.namespace().unwrap().0, "default");
    }

    #[test]
    fn test_missing_kubeconfig() {
        let cfg = config(Utf8Path::new("/nonexistent/kubeconfig"));
        assert_eq!(cfg.namespace().unwrap(), ("default".to_owned(), false));
    }

    #[test]
    fn test_malformed_kubeconfig() {
        let (_td, path) = write_kubeconfig("contexts: [unterminated");
        assert!(config(&path).namespace().is_err());
        let (_td, path) = write_kubeconfig("- just\n- a list\n");
        assert!(config(&path).namespace().is_err());
    }

    #[test]
    fn test_merged_kubeconfigs() {
        let first = YamlLoader::load_from_str("current-context: prod\n").unwrap();
        let second = YamlLoader::load_from_str(KUBECONFIG).unwrap();
        let docs = [first[0].clone(), second[0].clone()];
        assert_eq!(context_namespace(&docs, None).as_deref(), Some("prod-ns"));
    }
}
