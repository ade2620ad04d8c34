use crate::{assert_failure, create_manifest};

pub fn test_create_clone() {
    let clone = create_manifest(&[
        "create",
        "clone",
        "--source-name",
        "snap1",
        "--source-type",
        "vmsnapshot",
        "--target-name",
        "vm2",
        "--label-filter",
        "app/*",
        "--label-filter",
        "!app/secret",
        "--new-mac-address",
        "eth0:02-00-00-00-00-01",
    ]);
    assert_eq!(clone["apiVersion"].as_str(), Some("clone.kubevirt.io/v1beta1"));
    assert_eq!(clone["kind"].as_str(), Some("VirtualMachineClone"));
    assert!(clone["metadata"]["name"]
        .as_str()
        .unwrap()
        .starts_with("clone-"));

    let spec = &clone["spec"];
    assert_eq!(spec["source"]["kind"].as_str(), Some("VirtualMachineSnapshot"));
    assert_eq!(
        spec["source"]["apiGroup"].as_str(),
        Some("snapshot.kubevirt.io")
    );
    assert_eq!(spec["source"]["name"].as_str(), Some("snap1"));
    assert_eq!(spec["target"]["kind"].as_str(), Some("VirtualMachine"));
    assert_eq!(spec["target"]["name"].as_str(), Some("vm2"));
    let filters: Vec<_> = spec["labelFilters"]
        .as_vec()
        .unwrap()
        .iter()
        .filter_map(|f| f.as_str())
        .collect();
    assert_eq!(filters, vec!["app/*", "!app/secret"]);
    assert_eq!(
        spec["newMacAddresses"]["eth0"].as_str(),
        Some("02-00-00-00-00-01")
    );
}

pub fn test_create_clone_errors() {
    let stderr = assert_failure(&["create", "clone"]);
    assert!(stderr.contains("source name must not be empty"), "{stderr}");

    let stderr = assert_failure(&["create", "clone", "--source-name", "vm1", "--source-type", "pod"]);
    assert!(
        stderr.contains("failed to parse \"--source-type\" flag: invalid source type \"pod\""),
        "{stderr}"
    );

    let stderr = assert_failure(&[
        "create",
        "clone",
        "--source-name",
        "vm1",
        "--new-mac-address",
        "eth0",
    ]);
    assert!(
        stderr.contains("is not in the form of interfaceName:newMacAddress"),
        "{stderr}"
    );
}
