//! Purpose: JSON envelopes for plugin descriptions, decode summaries and transform results.
//! Exports: `descriptor_json`, `fingerprint`, `decode_json`, `transform_json`, `probe_json`.
//! Role: Keep CLI output key names in one place.
//! Invariants: Stable key names; optional keys are omitted rather than null.

use emplug::api::{Category, PluginDescriptor, TransformOutcome};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};

pub(crate) fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut output = String::from("sha256:");
    for byte in digest.iter() {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}

pub(crate) fn descriptor_json(descriptor: &PluginDescriptor, fingerprint: Option<&str>) -> Value {
    let mut map = Map::new();
    map.insert("name".to_string(), json!(descriptor.name));
    map.insert(
        "path".to_string(),
        json!(descriptor.path.display().to_string()),
    );
    map.insert("category".to_string(), json!(descriptor.category));
    map.insert("abi".to_string(), json!(descriptor.version.to_string()));
    map.insert("abi_raw".to_string(), json!(descriptor.version.raw()));
    if let Some(fingerprint) = fingerprint {
        map.insert("fingerprint".to_string(), json!(fingerprint));
    }
    Value::Object(map)
}

/// Adds category-specific keys to a descriptor envelope.
pub(crate) fn with_details(mut value: Value, details: Map<String, Value>) -> Value {
    if let Value::Object(map) = &mut value {
        map.extend(details);
    }
    value
}

pub(crate) fn probe_json(path: &str, found: &[(Category, String)]) -> Value {
    let categories: Vec<Value> = found
        .iter()
        .map(|(category, abi)| json!({ "category": category, "abi": abi }))
        .collect();
    json!({ "path": path, "categories": categories })
}

pub(crate) struct DecodeSummary {
    pub opened: bool,
    pub format: Map<String, Value>,
    pub frame_sizes: Vec<usize>,
    pub digest: String,
    pub duration: Option<u32>,
}

pub(crate) fn decode_json(descriptor: Value, summary: &DecodeSummary) -> Value {
    let total: usize = summary.frame_sizes.iter().sum();
    let mut map = Map::new();
    map.insert("plugin".to_string(), descriptor);
    map.insert("opened".to_string(), json!(summary.opened));
    map.insert("format".to_string(), Value::Object(summary.format.clone()));
    if let Some(duration) = summary.duration {
        map.insert("duration".to_string(), json!(duration));
    }
    map.insert("frames".to_string(), json!(summary.frame_sizes));
    map.insert("total_bytes".to_string(), json!(total));
    map.insert("digest".to_string(), json!(summary.digest));
    Value::Object(map)
}

pub(crate) fn transform_json(
    descriptor: Value,
    outcome: &TransformOutcome,
    output: &str,
) -> Value {
    let mut map = Map::new();
    map.insert("plugin".to_string(), descriptor);
    map.insert("applied".to_string(), json!(outcome.is_applied()));
    match outcome {
        TransformOutcome::Applied { output: bytes, backup } => {
            map.insert("output".to_string(), json!(output));
            map.insert("bytes".to_string(), json!(bytes.len()));
            if let Some(backup) = backup {
                map.insert("backup".to_string(), json!(backup.display().to_string()));
            }
        }
        TransformOutcome::Fallback { error, .. } => {
            if let Value::Object(error) = crate::error_json(error) {
                map.extend(error);
            }
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::{fingerprint, probe_json};
    use emplug::api::Category;

    #[test]
    fn fingerprint_is_lowercase_hex_sha256() {
        assert_eq!(
            fingerprint(b""),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn probe_lists_categories_in_order() {
        let value = probe_json(
            "/p/lib.so",
            &[
                (Category::Decoder, "2.0".to_string()),
                (Category::Encoder, "2.0".to_string()),
            ],
        );
        assert_eq!(value["categories"][0]["category"], "decoder");
        assert_eq!(value["categories"][1]["abi"], "2.0");
    }
}
