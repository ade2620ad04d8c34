use std::path::Path;
use std::process::Output;

use color_eyre::eyre::eyre;
use color_eyre::Result;
use libtest_mimic::{Arguments, Trial};
use tracing::debug;
use xshell::{cmd, Shell};
use yaml_rust2::{Yaml, YamlLoader};

mod tests {
    pub mod create_clone;
    pub mod create_instancetype;
    pub mod create_vm;
    pub mod namespace;
}

/// Get the path to the virtctl binary, checking VIRTCTL_PATH env var first, then falling back to "virtctl"
pub(crate) fn get_virtctl_command() -> Result<String> {
    if let Ok(path) = std::env::var("VIRTCTL_PATH") {
        return Ok(path);
    }
    // Force the user to set this if we're running from the project dir
    if let Some(path) = ["target/debug/virtctl", "target/release/virtctl"]
        .into_iter()
        .find(|p| Path::new(p).exists())
    {
        return Err(eyre!(
            "Detected {path} - set VIRTCTL_PATH={path} to run using this binary"
        ));
    }
    Ok("virtctl".to_owned())
}

/// Run virtctl with `args`. The user's kubeconfig is never consulted unless
/// `kubeconfig` is given.
pub(crate) fn run_virtctl_with_kubeconfig(args: &[&str], kubeconfig: &str) -> Output {
    let sh = Shell::new().unwrap();
    let virtctl = get_virtctl_command().unwrap();
    let _env = sh.push_env("KUBECONFIG", kubeconfig);
    debug!("Running {virtctl} {args:?}");
    cmd!(sh, "{virtctl} {args...}")
        .ignore_status()
        .quiet()
        .output()
        .unwrap()
}

pub(crate) fn run_virtctl(args: &[&str]) -> Output {
    run_virtctl_with_kubeconfig(args, "/nonexistent/kubeconfig")
}

/// Run virtctl and parse the single YAML document it prints.
pub(crate) fn create_manifest(args: &[&str]) -> Yaml {
    let output = run_virtctl(args);
    assert_success(&output, args);
    parse_manifest(&output)
}

pub(crate) fn parse_manifest(output: &Output) -> Yaml {
    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    let mut docs = YamlLoader::load_from_str(&stdout).unwrap();
    assert_eq!(docs.len(), 1, "expected a single document:\n{stdout}");
    docs.remove(0)
}

pub(crate) fn assert_success(output: &Output, args: &[&str]) {
    assert!(
        output.status.success(),
        "virtctl {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Assert that virtctl failed and return its stderr.
pub(crate) fn assert_failure(args: &[&str]) -> String {
    let output = run_virtctl(args);
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    assert!(
        !output.status.success(),
        "virtctl {args:?} unexpectedly succeeded: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    assert!(output.stdout.is_empty(), "no manifest expected on failure");
    stderr
}

fn install_tracing() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .init();
}

fn main() {
    install_tracing();
    let args = Arguments::from_args();

    let tests = vec![
        Trial::test("create_vm_defaults", || {
            tests::create_vm::test_create_vm_defaults();
            Ok(())
        }),
        Trial::test("create_vm_volumes", || {
            tests::create_vm::test_create_vm_volumes();
            Ok(())
        }),
        Trial::test("create_vm_cloud_init", || {
            tests::create_vm::test_create_vm_cloud_init();
            Ok(())
        }),
        Trial::test("create_vm_password_warning", || {
            tests::create_vm::test_create_vm_password_warning();
            Ok(())
        }),
        Trial::test("create_vm_cloud_init_none_warning", || {
            tests::create_vm::test_create_vm_cloud_init_none_warning();
            Ok(())
        }),
        Trial::test("create_vm_errors", || {
            tests::create_vm::test_create_vm_errors();
            Ok(())
        }),
        Trial::test("create_clone", || {
            tests::create_clone::test_create_clone();
            Ok(())
        }),
        Trial::test("create_clone_errors", || {
            tests::create_clone::test_create_clone_errors();
            Ok(())
        }),
        Trial::test("create_instancetype", || {
            tests::create_instancetype::test_create_instancetype();
            Ok(())
        }),
        Trial::test("create_instancetype_required_flags", || {
            tests::create_instancetype::test_create_instancetype_required_flags();
            Ok(())
        }),
        Trial::test("create_preference", || {
            tests::create_instancetype::test_create_preference();
            Ok(())
        }),
        Trial::test("namespace_flag", || {
            tests::namespace::test_namespace_flag();
            Ok(())
        }),
        Trial::test("namespace_from_kubeconfig", || {
            tests::namespace::test_namespace_from_kubeconfig();
            Ok(())
        }),
    ];

    libtest_mimic::run(&args, tests).exit();
}
