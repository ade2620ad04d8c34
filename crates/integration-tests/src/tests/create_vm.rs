use std::io::Write;

use yaml_rust2::Yaml;

use crate::{assert_failure, create_manifest, parse_manifest, run_virtctl};

fn volume_names(vm: &Yaml) -> Vec<String> {
    vm["spec"]["template"]["spec"]["volumes"]
        .as_vec()
        .map(|volumes| {
            volumes
                .iter()
                .filter_map(|v| v["name"].as_str().map(ToOwned::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

pub fn test_create_vm_defaults() {
    let vm = create_manifest(&["create", "vm"]);
    assert_eq!(vm["apiVersion"].as_str(), Some("kubevirt.io/v1"));
    assert_eq!(vm["kind"].as_str(), Some("VirtualMachine"));
    let name = vm["metadata"]["name"].as_str().unwrap();
    assert!(name.starts_with("vm-"), "unexpected generated name {name}");
    assert!(vm["metadata"]["namespace"].is_badvalue());
    assert_eq!(vm["spec"]["runStrategy"].as_str(), Some("Always"));

    let spec = &vm["spec"]["template"]["spec"];
    assert_eq!(spec["terminationGracePeriodSeconds"].as_i64(), Some(180));
    assert_eq!(spec["domain"]["memory"]["guest"].as_str(), Some("512Mi"));
    // Nothing to infer from without volumes
    assert!(vm["spec"]["instancetype"].is_badvalue());
    assert!(spec["volumes"].is_badvalue());

    // Every run generates a fresh name
    let other = create_manifest(&["create", "vm"]);
    assert_ne!(vm["metadata"]["name"], other["metadata"]["name"]);
}

pub fn test_create_vm_volumes() {
    let vm = create_manifest(&[
        "create",
        "vm",
        "--name",
        "my-vm",
        "--volume-import",
        "type:http,url:https://example.com/disk.img,size:10Gi,name:imported",
        "--volume-containerdisk",
        "src:quay.io/containerdisks/fedora:latest",
        "--volume-datasource",
        "src:os-images/fedora,name:root,bootorder:1",
    ]);
    // Volumes are ordered by kind, not by the order of the flags
    assert_eq!(
        volume_names(&vm),
        vec!["my-vm-containerdisk-0", "root", "imported"]
    );

    let templates = vm["spec"]["dataVolumeTemplates"].as_vec().unwrap();
    assert_eq!(templates.len(), 2);
    let root = &templates[0];
    assert_eq!(root["metadata"]["name"].as_str(), Some("root"));
    assert_eq!(
        root["spec"]["sourceRef"]["kind"].as_str(),
        Some("DataSource")
    );
    assert_eq!(
        root["spec"]["sourceRef"]["namespace"].as_str(),
        Some("os-images")
    );
    let imported = &templates[1];
    assert_eq!(
        imported["spec"]["source"]["http"]["url"].as_str(),
        Some("https://example.com/disk.img")
    );

    let disks = vm["spec"]["template"]["spec"]["domain"]["devices"]["disks"]
        .as_vec()
        .unwrap();
    assert_eq!(disks.len(), 1);
    assert_eq!(disks[0]["name"].as_str(), Some("root"));
    assert_eq!(disks[0]["bootOrder"].as_i64(), Some(1));

    // The datasource with the lowest boot order is used for inference
    let instancetype = &vm["spec"]["instancetype"];
    assert_eq!(instancetype["inferFromVolume"].as_str(), Some("root"));
    assert_eq!(
        instancetype["inferFromVolumeFailurePolicy"].as_str(),
        Some("Ignore")
    );
    assert_eq!(vm["spec"]["preference"]["inferFromVolume"].as_str(), Some("root"));
}

pub fn test_create_vm_cloud_init() {
    let vm = create_manifest(&[
        "create",
        "vm",
        "--user",
        "fedora",
        "--ssh-key",
        "ssh-ed25519 AAAA key1",
        "--cloud-init",
        "configdrive",
    ]);
    assert_eq!(volume_names(&vm), vec!["cloudinitdisk"]);
    let volume = &vm["spec"]["template"]["spec"]["volumes"][0];
    let user_data = volume["cloudInitConfigDrive"]["userData"].as_str().unwrap();
    assert_eq!(
        user_data,
        "#cloud-config\nuser: fedora\nssh_authorized_keys:\n  - ssh-ed25519 AAAA key1"
    );
}

pub fn test_create_vm_password_warning() {
    let mut password_file = tempfile::NamedTempFile::new().unwrap();
    writeln!(password_file, "s3cret").unwrap();
    let path = password_file.path().to_str().unwrap().to_owned();

    let output = run_virtctl(&["create", "vm", "--user", "fedora", "--password-file", &path]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("The password is stored in cleartext in the VM definition"),
        "missing warning: {stderr}"
    );
    let vm = parse_manifest(&output);
    let user_data = vm["spec"]["template"]["spec"]["volumes"][0]["cloudInitNoCloud"]["userData"]
        .as_str()
        .unwrap();
    assert!(user_data.contains("\npassword: s3cret\n"), "{user_data}");
}

pub fn test_create_vm_cloud_init_none_warning() {
    let output = run_virtctl(&[
        "create",
        "vm",
        "--ssh-key",
        "ssh-ed25519 AAAA key1",
        "--cloud-init",
        "none",
    ]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("was set to none"), "missing warning: {stderr}");
    let vm = parse_manifest(&output);
    assert!(volume_names(&vm).is_empty());

    let output = run_virtctl(&["create", "vm", "--user", "fedora", "--cloud-init", "none"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("was set to none"), "unexpected warning: {stderr}");
}

pub fn test_create_vm_errors() {
    let stderr = assert_failure(&["create", "vm", "--run-strategy", "Sometimes"]);
    assert!(
        stderr.contains("failed to parse \"--run-strategy\" flag: invalid run strategy \"Sometimes\""),
        "{stderr}"
    );

    let stderr = assert_failure(&["create", "vm", "--volume-pvc", "src:other-ns/my-pvc"]);
    assert!(
        stderr.contains("not allowed to specify namespace of pvc"),
        "{stderr}"
    );

    let stderr = assert_failure(&["create", "vm", "--volume-import", "type:http,size:1Gi"]);
    assert!(
        stderr.contains("url is required with http volume source"),
        "{stderr}"
    );

    // Rejected by the argument parser
    let stderr = assert_failure(&["create", "vm", "--memory", "1Gi", "--instancetype", "u1.small"]);
    assert!(stderr.contains("cannot be used with"), "{stderr}");

    let stderr = assert_failure(&[
        "create",
        "vm",
        "--infer-instancetype",
        "--volume-containerdisk",
        "src:quay.io/containerdisks/fedora:latest",
    ]);
    assert!(
        stderr.contains("inference of instancetype or preference works only with datasources"),
        "{stderr}"
    );
}
