//! Bound parameter values.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A value bound to a named placeholder (`{:name}`) in a resolved
/// identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(JsonValue),
    Array(Vec<SqlParam>),
}

impl SqlParam {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&JsonValue> for SqlParam {
    /// Coerce a `serde_json::Value` leaf into a bound parameter.
    ///
    /// Scalars map to their matching variant; arrays and objects fall back
    /// to [`SqlParam::Json`], matching the "JSON-encode the rest" policy
    /// used by the static request evaluator for non-scalar values.
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Self::Float(f)
                } else {
                    Self::Json(value.clone())
                }
            }
            JsonValue::String(s) => Self::Text(s.clone()),
            JsonValue::Array(_) | JsonValue::Object(_) => Self::Json(value.clone()),
        }
    }
}
