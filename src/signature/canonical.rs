//! Canonical JSON rendering.
//!
//! Object keys are emitted in sorted order so that two structurally equal
//! argument lists always render to the same text, regardless of how the map
//! backing `serde_json::Value` orders its entries.

use serde::Serialize;
use serde_json::Value;

use crate::error::SignatureError;

/// Serializes `args` into a plain JSON value and its canonical text.
pub(crate) fn snapshot<A>(args: &A) -> Result<(Value, String), SignatureError>
where
    A: Serialize + ?Sized,
{
    let value = serde_json::to_value(args).map_err(|e| SignatureError::Unserializable {
        reason: e.to_string(),
    })?;
    let mut text = String::new();
    write_value(&value, &mut text);
    Ok((value, text))
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_value(item, out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
