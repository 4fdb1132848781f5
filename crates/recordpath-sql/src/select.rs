//! A minimal SELECT query stand-in.
//!
//! The full query builder that turns a filter/sort expression tree into a
//! complete SQL statement lives outside this crate's scope; it is an
//! external collaborator the resolver only ever touches through the
//! narrow `Distinct`/`LeftJoin` surface below. This type exists so that
//! surface is real and testable rather than an unchecked trait.

use crate::identifier::escape_ident;

/// A single LEFT JOIN clause, in registration order.
#[derive(Clone, Debug, PartialEq)]
pub struct JoinClause {
    pub table: String,
    pub alias: String,
    pub on: Option<String>,
    /// `true` for a table-valued expression (e.g. `json_each(...)`) that
    /// must be emitted verbatim rather than quoted as a plain identifier.
    pub raw: bool,
}

impl JoinClause {
    pub fn new(table: impl Into<String>, alias: impl Into<String>, on: Option<String>) -> Self {
        Self {
            table: table.into(),
            alias: alias.into(),
            on,
            raw: false,
        }
    }

    pub fn raw_expr(table: impl Into<String>, alias: impl Into<String>, on: Option<String>) -> Self {
        Self {
            table: table.into(),
            alias: alias.into(),
            on,
            raw: true,
        }
    }

    fn to_sql(&self) -> String {
        let table_sql = if self.raw {
            self.table.clone()
        } else {
            escape_ident(&self.table)
        };
        let mut sql = format!(" LEFT JOIN {} {}", table_sql, escape_ident(&self.alias));
        if let Some(on) = &self.on {
            sql.push_str(" ON ");
            sql.push_str(on);
        }
        sql
    }
}

/// A SELECT statement under construction, exposing just enough surface
/// (`distinct`, `left_join`, column/from/where) for `UpdateQuery` to be
/// exercised end to end against a real rendered SQL string.
#[derive(Clone, Debug, Default)]
pub struct SelectQuery {
    from: String,
    columns: Vec<String>,
    joins: Vec<JoinClause>,
    where_clause: Option<String>,
    distinct: bool,
}

impl SelectQuery {
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            ..Default::default()
        }
    }

    /// Select `table.*` from the base table.
    pub fn select_all(mut self) -> Self {
        self.columns = vec![format!("{}.*", escape_ident(&self.from))];
        self
    }

    pub fn where_raw(mut self, clause: impl Into<String>) -> Self {
        self.where_clause = Some(clause.into());
        self
    }

    /// Set or clear DISTINCT.
    pub fn distinct(&mut self, on: bool) -> &mut Self {
        self.distinct = on;
        self
    }

    /// Append a LEFT JOIN clause.
    pub fn left_join(&mut self, table: &str, alias: &str, on: Option<&str>) -> &mut Self {
        self.joins
            .push(JoinClause::new(table, alias, on.map(|s| s.to_string())));
        self
    }

    /// Append a LEFT JOIN whose table position is a raw SQL expression
    /// (e.g. `json_each(...)`) rather than a plain table name.
    pub fn left_join_raw(&mut self, expr: &str, alias: &str, on: Option<&str>) -> &mut Self {
        self.joins
            .push(JoinClause::raw_expr(expr, alias, on.map(|s| s.to_string())));
        self
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn build(&self) -> String {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&self.columns.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(&escape_ident(&self.from));
        for join in &self.joins {
            sql.push_str(&join.to_sql());
        }
        if let Some(w) = &self.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(w);
        }
        sql
    }
}
