use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::error::EngineError;
use crate::model::NormalizedContext;

/// Recursively sorts object keys and renders compact JSON. Two semantically
/// equal values always produce the same byte string.
pub fn canonical_json(value: &Value) -> String {
    sort_json(value.clone()).to_string()
}

fn sort_json(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sort_json(v))).collect();
            Value::Object(sorted.into_iter().collect::<Map<String, Value>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_json).collect()),
        _ => value,
    }
}

/// Cache key for one composition input. Relic ids are sorted ascending so
/// permutations of the same selection share a key; the engine version is
/// folded in so a version bump misses every prior entry.
pub fn composition_key(
    relic_ids: &[String],
    context: &NormalizedContext,
    engine_version: &str,
) -> Result<String, EngineError> {
    let mut sorted_ids: Vec<&str> = relic_ids.iter().map(String::as_str).collect();
    sorted_ids.sort_unstable();

    let context_value = serde_json::to_value(context).map_err(|err| EngineError::Internal {
        reason: format!("context serialization failed: {err}"),
    })?;
    let payload = json!({
        "context": context_value,
        "relic_ids": sorted_ids,
        "version": engine_version,
    });

    let mut hasher = Sha256::new();
    hasher.update(canonical_json(&payload).as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
