//! Canonical JSON serialization for Strata types.
//!
//! This module provides special JSON handling for types that don't have
//! a standard JSON representation:
//!
//! | Type | JSON Representation |
//! |------|---------------------|
//! | Bytes | `{"$bytes": "<base64>"}` |
//! | NaN | `{"$f64": "NaN"}` |
//! | +Infinity | `{"$f64": "+Inf"}` |
//! | -Infinity | `{"$f64": "-Inf"}` |
//! | -0.0 | `{"$f64": "-0.0"}` |
//!
//! This ensures round-trip serialization preserves exact values.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde::de;
use serde_json::Value as JsonValue;
use strata_core::Value;

/// Serialize a Value to canonical JSON.
///
/// Handles special cases:
/// - Bytes are encoded as `{"$bytes": "<base64>"}`
/// - Special floats (NaN, +/-Inf, -0.0) are encoded as `{"$f64": "..."}`
pub fn serialize_value<S>(value: &Value, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let json_value = value_to_json(value);
    json_value.serialize(serializer)
}

/// Deserialize a Value from canonical JSON.
///
/// Recognizes special encodings:
/// - `{"$bytes": "<base64>"}` -> Bytes
/// - `{"$f64": "..."}` -> Float with special value
pub fn deserialize_value<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    let json_value = JsonValue::deserialize(deserializer)?;
    json_to_value(&json_value).map_err(de::Error::custom)
}

/// Convert a Value to a JSON value with special encoding.
pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::Number((*i).into()),
        Value::Float(f) => float_to_json(*f),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Bytes(b) => {
            let encoded = BASE64.encode(b);
            serde_json::json!({"$bytes": encoded})
        }
        Value::Array(arr) => {
            let items: Vec<JsonValue> = arr.iter().map(value_to_json).collect();
            JsonValue::Array(items)
        }
        Value::Object(map) => {
            let obj: serde_json::Map<String, JsonValue> = map
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect();
            JsonValue::Object(obj)
        }
    }
}

/// Convert a JSON value to a Value, recognizing special encodings.
pub fn json_to_value(json: &JsonValue) -> Result<Value, String> {
    match json {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(b) => Ok(Value::Bool(*b)),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err("Invalid number".to_string())
            }
        }
        JsonValue::String(s) => Ok(Value::String(s.clone())),
        JsonValue::Array(arr) => {
            let items: Result<Vec<Value>, String> = arr.iter().map(json_to_value).collect();
            Ok(Value::Array(items?))
        }
        JsonValue::Object(obj) => {
            // Check for special encodings
            if let Some(bytes_value) = obj.get("$bytes") {
                if obj.len() == 1 {
                    if let JsonValue::String(encoded) = bytes_value {
                        let decoded = BASE64
                            .decode(encoded)
                            .map_err(|e| format!("Invalid base64: {}", e))?;
                        return Ok(Value::Bytes(decoded));
                    }
                }
            }
            if let Some(float_value) = obj.get("$f64") {
                if obj.len() == 1 {
                    if let JsonValue::String(s) = float_value {
                        let f = json_special_float_from_str(s)?;
                        return Ok(Value::Float(f));
                    }
                }
            }

            // Regular object
            let map: Result<std::collections::HashMap<String, Value>, String> = obj
                .iter()
                .map(|(k, v)| json_to_value(v).map(|val| (k.clone(), val)))
                .collect();
            Ok(Value::Object(map?))
        }
    }
}

/// Convert a float to JSON, handling special values.
fn float_to_json(f: f64) -> JsonValue {
    if f.is_nan() {
        serde_json::json!({"$f64": "NaN"})
    } else if f.is_infinite() {
        if f.is_sign_positive() {
            serde_json::json!({"$f64": "+Inf"})
        } else {
            serde_json::json!({"$f64": "-Inf"})
        }
    } else if f == 0.0 && f.is_sign_negative() {
        serde_json::json!({"$f64": "-0.0"})
    } else {
        // Regular float - use standard JSON number
        serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or_else(|| {
                // Fallback for edge cases (shouldn't happen with normal floats)
                serde_json::json!({"$f64": format!("{}", f)})
            })
    }
}

/// Parse a special float string.
fn json_special_float_from_str(s: &str) -> Result<f64, String> {
    match s {
        "NaN" => Ok(f64::NAN),
        "+Inf" => Ok(f64::INFINITY),
        "-Inf" => Ok(f64::NEG_INFINITY),
        "-0.0" => Ok(-0.0_f64),
        other => other
            .parse::<f64>()
            .map_err(|e| format!("Invalid float: {}", e)),
    }
}

/// A wrapper for Value that uses canonical JSON serialization.
///
/// Use this when you need to serialize a Value with special handling.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalValue(pub Value);

impl Serialize for CanonicalValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize_value(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for CanonicalValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_value(deserializer).map(CanonicalValue)
    }
}

impl From<Value> for CanonicalValue {
    fn from(v: Value) -> Self {
        CanonicalValue(v)
    }
}

impl From<CanonicalValue> for Value {
    fn from(v: CanonicalValue) -> Self {
        v.0
    }
}
