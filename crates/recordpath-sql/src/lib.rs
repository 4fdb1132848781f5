//! Minimal SQL helpers for recordpath.
//!
//! This crate deliberately does not contain a general query builder: the
//! query builder that assembles a complete SQL statement is an external
//! collaborator of the field resolver. What lives here is just enough to
//! make the resolver's `UpdateQuery` contract exercisable end-to-end: safe
//! identifier quoting, a small bound-parameter type, and a `SelectQuery`
//! stand-in exposing the `Distinct`/`LeftJoin` surface the resolver drives.

pub mod identifier;
mod param;
mod select;

pub use identifier::{bracket_ident, columnify, escape_ident, is_valid_identifier};
pub use param::SqlParam;
pub use select::{JoinClause, SelectQuery};

/// Prelude for common imports.
pub mod prelude {
    pub use super::{bracket_ident, columnify, escape_ident, JoinClause, SelectQuery, SqlParam};
}
