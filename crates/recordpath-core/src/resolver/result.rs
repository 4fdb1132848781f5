//! The outcome of resolving a single field path (spec §3).

use super::join::Join;
use indexmap::IndexMap;
use recordpath_sql::SqlParam;
use std::sync::Arc;

/// A post-processor that wraps the final compiled expression string. Used
/// to AND-append the `emailVisibility = TRUE` guard without the walker
/// needing to know how the surrounding operator expression is shaped.
pub type AfterBuild = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// The parallel mirror join chain used to preserve per-row ALL/ANY
/// semantics when a path crosses a multi-valued relation (spec §4.5).
///
/// This resolver only *assembles* the descriptor; it does not know how to
/// render it into a `WHERE ... IN (SELECT ...)`-style subquery -- that is
/// the filter expression builder's job.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiMatchSubquery {
    pub from_table: String,
    pub from_alias: String,
    pub joins: Vec<Join>,
    pub params: IndexMap<String, SqlParam>,
    pub value_identifier: String,
}

/// The result of resolving one field path.
#[derive(Clone)]
pub struct ResolverResult {
    pub identifier: String,
    pub params: IndexMap<String, SqlParam>,
    pub after_build: Option<AfterBuild>,
    pub multi_match_subquery: Option<MultiMatchSubquery>,
}

impl ResolverResult {
    /// A plain identifier with no params, no guard, no multi-match.
    pub fn identifier(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            params: IndexMap::new(),
            after_build: None,
            multi_match_subquery: None,
        }
    }

    pub fn null() -> Self {
        Self::identifier("NULL")
    }

    pub fn with_params(mut self, params: IndexMap<String, SqlParam>) -> Self {
        self.params = params;
        self
    }

    pub fn with_after_build(mut self, hook: AfterBuild) -> Self {
        self.after_build = Some(hook);
        self
    }

    pub fn with_multi_match(mut self, subquery: MultiMatchSubquery) -> Self {
        self.multi_match_subquery = Some(subquery);
        self
    }

    /// Apply `after_build`, if any, to a compiled expression string
    /// (e.g. `"[[users.email]] > 1"`).
    pub fn build_expr(&self, expr: &str) -> String {
        match &self.after_build {
            Some(hook) => hook(expr),
            None => expr.to_string(),
        }
    }
}

impl std::fmt::Debug for ResolverResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverResult")
            .field("identifier", &self.identifier)
            .field("params", &self.params)
            .field("has_after_build", &self.after_build.is_some())
            .field("multi_match_subquery", &self.multi_match_subquery)
            .finish()
    }
}

/// The standard email-visibility guard: ANDs
/// `[[alias.emailVisibility]] = TRUE` onto the compiled expression.
pub fn email_visibility_guard(alias: &str) -> AfterBuild {
    let alias = alias.to_string();
    Arc::new(move |expr: &str| format!("({}) AND ([[{}.emailVisibility]] = TRUE)", expr, alias))
}
