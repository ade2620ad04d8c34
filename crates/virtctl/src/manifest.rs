//! Rendering of API objects as YAML manifests.

use color_eyre::Result;
use serde::Serialize;
use serde_json::Value;
use yaml_rust2::{yaml, Yaml, YamlEmitter};

fn json_to_yaml(value: Value) -> Yaml {
    match value {
        Value::Null => Yaml::Null,
        Value::Bool(b) => Yaml::Boolean(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Yaml::Integer(i),
            None => Yaml::Real(n.to_string()),
        },
        Value::String(s) => Yaml::String(s),
        Value::Array(items) => Yaml::Array(items.into_iter().map(json_to_yaml).collect()),
        Value::Object(map) => {
            let mut hash = yaml::Hash::new();
            for (k, v) in map {
                hash.insert(Yaml::String(k), json_to_yaml(v));
            }
            Yaml::Hash(hash)
        }
    }
}

/// Serialize `obj` to a YAML document.
///
/// Keys are sorted, multi-line strings (cloud-init user data) are emitted as
/// literal blocks and the output ends with a newline.
pub fn to_yaml<T: Serialize>(obj: &T) -> Result<String> {
    let value = json_to_yaml(serde_json::to_value(obj)?);
    let mut out_str = String::new();
    let mut emitter = YamlEmitter::new(&mut out_str);
    emitter.multiline_strings(true);
    emitter.dump(&value)?;
    let body = out_str.strip_prefix("---\n").unwrap_or(&out_str);
    Ok(format!("{body}\n"))
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use similar_asserts::assert_eq;

    use super::*;
    use crate::api::meta::ObjectMeta;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Example {
        kind: &'static str,
        api_version: &'static str,
        metadata: ObjectMeta,
        replicas: i64,
        items: Vec<&'static str>,
    }

    #[test]
    fn test_to_yaml() {
        let obj = Example {
            kind: "Example",
            api_version: "example.io/v1",
            metadata: ObjectMeta::new("test", None),
            replicas: 3,
            items: vec!["a", "b"],
        };
        let expected = indoc! { "
            apiVersion: example.io/v1
            items:
              - a
              - b
            kind: Example
            metadata:
              name: test
            replicas: 3
        " };
        assert_eq!(to_yaml(&obj).unwrap(), expected);
    }

    #[test]
    fn test_multiline_round_trip() {
        let data = "#cloud-config\nuser: fedora\nruncmd:\n  - [ setsebool, -P, 'virt_qemu_ga_manage_ssh', 'on' ]";
        let out = to_yaml(&serde_json::json!({ "userData": data })).unwrap();
        let docs = yaml_rust2::YamlLoader::load_from_str(&out).unwrap();
        assert_eq!(docs[0]["userData"].as_str(), Some(data));
    }
}
