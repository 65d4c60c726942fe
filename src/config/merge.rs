//! Layer merging
//!
//! Tables merge key by key. Anything else, arrays included, is replaced
//! wholesale by the later layer.

use serde_json::Value;

/// Fold `overlay` into `base` in place.
pub fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(table), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match table.get_mut(&key) {
                    Some(slot) => merge_into(slot, value),
                    None => {
                        table.insert(key, value);
                    }
                }
            }
        }
        (slot, overlay) => *slot = overlay,
    }
}

/// Merge layers lowest precedence first.
pub fn merge_layers(layers: impl IntoIterator<Item = Value>) -> Value {
    let mut merged = Value::Null;
    for layer in layers {
        merge_into(&mut merged, layer);
    }
    merged
}
