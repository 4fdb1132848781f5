//! Static request evaluator (spec §4.3).
//!
//! Resolves `@request.method`, `@request.query.*`, `@request.data.*`
//! (for the plain, non-relation, non-select-each forms `walker` doesn't
//! intercept first), and the fixed `@request.auth.<simple>` field list --
//! none of which require joining anything.

use super::result::ResolverResult;
use super::RecordFieldResolver;
use crate::error::Result;
use indexmap::IndexMap;
use recordpath_sql::SqlParam;
use serde_json::{Map, Value};

impl<'a> RecordFieldResolver<'a> {
    /// `@request.method`.
    pub(crate) fn resolve_request_method(&mut self) -> Result<ResolverResult> {
        let method = self
            .request
            .as_ref()
            .map(|r| r.method.clone())
            .unwrap_or_default();
        self.bind_value(&Value::String(method))
    }

    /// `@request.query.<k>[.<k2>...]` / `@request.data.<k>[.<k2>...]`,
    /// including the `.isset` modifier.
    pub(crate) fn resolve_request_map_path(
        &mut self,
        map: &Map<String, Value>,
        segments: &[String],
    ) -> Result<ResolverResult> {
        if let Some(last) = segments.last() {
            if last == "isset" {
                let key_path = &segments[..segments.len() - 1];
                let set = lookup(map, key_path).is_some();
                return Ok(ResolverResult::identifier(if set { "TRUE" } else { "FALSE" }));
            }
        }
        match lookup(map, segments) {
            Some(value) => self.bind_value(&value.clone()),
            None => Ok(ResolverResult::null()),
        }
    }

    /// `@request.auth.<simple>`, served from the snapshotted public
    /// export (or `NULL` if there is no authenticated record).
    pub(crate) fn resolve_request_auth_simple(&mut self, field: &str) -> Result<ResolverResult> {
        let auth = match self.request.as_ref().and_then(|r| r.auth_record.clone()) {
            Some(a) => a,
            None => return Ok(ResolverResult::null()),
        };
        let value = match field {
            "id" => Value::String(auth.id.clone()),
            "collectionId" => Value::String(auth.collection.id.clone()),
            "collectionName" => Value::String(auth.collection.name.clone()),
            _ => auth.public_export.get(field).cloned().unwrap_or(Value::Null),
        };
        self.bind_value(&value)
    }

    /// Turn a resolved JSON value into a bound placeholder identifier,
    /// following the scalar/non-scalar coercion policy from spec §4.3.
    pub(crate) fn bind_value(&mut self, value: &Value) -> Result<ResolverResult> {
        match value {
            Value::Null => Ok(ResolverResult::null()),
            Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                let param = SqlParam::from(value);
                Ok(self.mint_placeholder(param))
            }
            Value::Array(_) | Value::Object(_) => {
                let json_str = serde_json::to_string(value).unwrap_or_default();
                Ok(self.mint_placeholder(SqlParam::Text(json_str)))
            }
        }
    }

    pub(crate) fn mint_placeholder(&mut self, param: SqlParam) -> ResolverResult {
        let name = self.next_placeholder_name();
        let mut params = IndexMap::new();
        params.insert(name.clone(), param);
        ResolverResult::identifier(format!("{{:{}}}", name)).with_params(params)
    }
}

/// Look up a dotted key chain in a JSON object, returning `None` if any
/// key along the chain is missing or an intermediate value isn't an
/// object. A key present with a JSON `null` value still counts as found.
fn lookup<'v>(map: &'v Map<String, Value>, keys: &[String]) -> Option<&'v Value> {
    let (first, rest) = keys.split_first()?;
    let mut cur = map.get(first)?;
    for key in rest {
        cur = match cur {
            Value::Object(m) => m.get(key)?,
            _ => return None,
        };
    }
    Some(cur)
}
