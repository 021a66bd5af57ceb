// Backend settings change tracking
use serde_json::{Map, Value};

/// Fields of `edited` whose value differs from `initial`, including new fields.
pub fn changed_fields(
    initial: &Map<String, Value>,
    edited: &Map<String, Value>,
) -> Map<String, Value> {
    edited
        .iter()
        .filter(|(key, value)| initial.get(key.as_str()) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
