//! Multi-match builder (spec §4.5).
//!
//! Mirrors every join made in the main walk into a parallel chain rooted
//! under a fresh alias of the base table, so the filter expression
//! builder can realize `ANY`/`ALL`-style comparisons without the main
//! query's joins collapsing multi-valued rows out from under a simple
//! `=`/`!=`/`>` comparison.
//!
//! The walker drives this in lockstep with the main walk (same design as
//! the rest of the module: one mapper, projected twice) rather than
//! replaying a separately-recorded event log -- every join the walker
//! registers in the outer query, it also mirrors here under the
//! multi-match alias, and only attaches the result if any hop actually
//! crossed a multi-valued edge.

use super::join::Join;
use super::result::MultiMatchSubquery;
use indexmap::IndexMap;
use recordpath_sql::SqlParam;

/// Accumulates the parallel join chain for one `resolve()` call.
pub struct MultiMatchState {
    active: bool,
    from_table: String,
    from_alias: String,
    joins: Vec<Join>,
    params: IndexMap<String, SqlParam>,
}

impl MultiMatchState {
    /// `base_table` is the resolver's base collection table name; the
    /// mirror is always rooted at `__mm_<base_table>`, regardless of
    /// which root form (`@collection`, `@request.data`, ...) the path
    /// under resolution used.
    pub fn new(base_table: &str) -> Self {
        Self {
            active: false,
            from_table: base_table.to_string(),
            from_alias: format!("__mm_{}", base_table),
            joins: Vec::new(),
            params: IndexMap::new(),
        }
    }

    /// Mark that a multi-valued hop occurred; the subquery will only be
    /// attached to the result if this was called at least once.
    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn from_alias(&self) -> &str {
        &self.from_alias
    }

    /// The alias value references should resolve against right now: the
    /// most recently mirrored join's alias, or the root alias if no hop
    /// has been mirrored yet.
    pub fn current_alias(&self) -> &str {
        self.joins
            .last()
            .map(|j| j.table_alias.as_str())
            .unwrap_or(&self.from_alias)
    }

    pub fn push_join(&mut self, join: Join) {
        self.joins.push(join);
    }

    pub fn bind_param(&mut self, name: impl Into<String>, value: SqlParam) {
        self.params.insert(name.into(), value);
    }

    /// Finalize into the subquery descriptor consumed by the (out of
    /// scope) filter expression builder.
    pub fn into_subquery(self, value_identifier: String) -> MultiMatchSubquery {
        MultiMatchSubquery {
            from_table: self.from_table,
            from_alias: self.from_alias,
            joins: self.joins,
            params: self.params,
            value_identifier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_by_default() {
        let mm = MultiMatchState::new("demo4");
        assert!(!mm.is_active());
        assert_eq!(mm.current_alias(), "__mm_demo4");
    }

    #[test]
    fn test_push_join_advances_current_alias() {
        let mut mm = MultiMatchState::new("demo4");
        mm.activate();
        mm.push_join(Join::new("demo4", "__mm_demo4_self_rel_one", None));
        assert_eq!(mm.current_alias(), "__mm_demo4_self_rel_one");
        let subquery = mm.into_subquery("[[__mm_demo4_self_rel_one.title]]".into());
        assert_eq!(subquery.joins.len(), 1);
        assert_eq!(subquery.from_alias, "__mm_demo4");
    }
}
