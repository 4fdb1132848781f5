//! Join registry (spec §4.2, §4.6): an ordered, deduped-by-alias list of
//! joins to attach to the caller's SELECT.

use indexmap::IndexMap;

/// A single join record. `on` is `None` for joins that intentionally
/// carry no join condition (e.g. the `@collection.*` root, which fans out
/// unconditionally).
#[derive(Clone, Debug, PartialEq)]
pub struct Join {
    pub table_name: String,
    pub table_alias: String,
    pub on: Option<String>,
    /// `true` when `table_name` is a raw table-valued expression (a
    /// `json_each(...)` call) rather than a plain table name.
    pub raw: bool,
}

impl Join {
    pub fn new(table_name: impl Into<String>, table_alias: impl Into<String>, on: Option<String>) -> Self {
        Self {
            table_name: table_name.into(),
            table_alias: table_alias.into(),
            on,
            raw: false,
        }
    }

    /// A join whose `table_name` is a raw SQL expression, e.g. the
    /// `json_each(...)` wrapper used when traversing relation/select
    /// columns (spec §4.6).
    pub fn raw_expr(table_expr: impl Into<String>, table_alias: impl Into<String>, on: Option<String>) -> Self {
        Self {
            table_name: table_expr.into(),
            table_alias: table_alias.into(),
            on,
            raw: true,
        }
    }
}

/// Ordered, deduped-by-alias list of joins.
///
/// Registering an alias that already exists replaces the prior entry in
/// place, keeping its original position -- which is what PocketBase-style
/// resolvers rely on so that re-resolving the same relation path twice in
/// one filter doesn't grow the join list or change join order.
#[derive(Clone, Debug, Default)]
pub struct JoinRegistry {
    order: Vec<String>,
    by_alias: IndexMap<String, Join>,
}

impl JoinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a join, replacing any prior join under the same alias.
    pub fn register(&mut self, join: Join) {
        if !self.by_alias.contains_key(&join.table_alias) {
            self.order.push(join.table_alias.clone());
        }
        self.by_alias.insert(join.table_alias.clone(), join);
    }

    pub fn contains_alias(&self, alias: &str) -> bool {
        self.by_alias.contains_key(alias)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Joins in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Join> {
        self.order.iter().map(move |alias| &self.by_alias[alias])
    }
}

/// The `json_each` wrapper (spec §4.6) that normalizes scalar
/// single-relation storage and JSON-array multi-relation storage into a
/// uniform iterable.
pub fn json_each_case(column_ref: &str) -> String {
    format!(
        "json_each(CASE WHEN json_valid({col}) THEN {col} ELSE json_array({col}) END)",
        col = column_ref
    )
}
