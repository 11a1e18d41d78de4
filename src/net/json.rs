//! JSON extraction utilities for raw provider payloads.
//!
//! Provider detail payloads are deeply nested and differently shaped per
//! service; the relations normalizer navigates them with dot notation
//! instead of one typed struct per provider quirk.
//!
//! # Examples
//!
//! ```rust
//! use shirabe::net::json;
//! use serde_json::json;
//!
//! let data = json!({
//!     "data": {
//!         "Media": {
//!             "status": "FINISHED",
//!             "relations": { "edges": [] }
//!         }
//!     }
//! });
//!
//! let status = json::extract_str(&data, "data.Media.status");
//! assert_eq!(status, Some("FINISHED"));
//! ```

use serde_json::Value;

/// Extracts a value from nested JSON using dot notation.
///
/// Navigates objects by key and arrays by numeric index
/// (e.g. `"data.relations.0.entry"`). Returns `None` if any path
/// segment is missing.
pub fn extract_path<'a>(json: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = json;

    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Extracts a string at the given dot-notation path.
pub fn extract_str<'a>(json: &'a Value, path: &str) -> Option<&'a str> {
    extract_path(json, path).and_then(Value::as_str)
}

/// Extracts an array at the given dot-notation path.
///
/// Returns an empty slice when the path is missing or not an array, so
/// callers can iterate unconditionally.
pub fn extract_array<'a>(json: &'a Value, path: &str) -> &'a [Value] {
    extract_path(json, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Extracts a number as `f64` at the given dot-notation path.
pub fn extract_f64(json: &Value, path: &str) -> Option<f64> {
    extract_path(json, path).and_then(Value::as_f64)
}

/// Extracts an integer as `i64` at the given dot-notation path.
pub fn extract_i64(json: &Value, path: &str) -> Option<i64> {
    extract_path(json, path).and_then(Value::as_i64)
}
