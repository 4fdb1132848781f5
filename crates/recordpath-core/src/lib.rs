//! Recordpath Core - the record field resolver.
//!
//! This crate provides the component that translates a dotted,
//! user-supplied field path (`self_rel_many.self_rel_one.title`,
//! `@request.auth.email`, `@collection.products.price`) into a SQL
//! identifier, a set of bound parameters, the JOIN clauses needed for
//! that identifier to resolve, and -- when the path crosses a
//! multi-valued relation -- a multi-match subquery descriptor that
//! preserves per-row `ANY`/`ALL` semantics.
//!
//! # Architecture
//!
//! 1. **Path tokenizer** (`resolver::path`) - split and validate a dotted path
//! 2. **Collection registry** (`dao`, `schema`) - load and cache collections
//! 3. **Static request evaluator** (`resolver::static_eval`) - `@request.*` paths that need no JOIN
//! 4. **Path walker** (`resolver::walker`) - walk relation/json/select segments, register joins
//! 5. **Multi-match builder** (`resolver::multimatch`) - mirror the walk for per-row semantics
//! 6. **Query applier** (`RecordFieldResolver::update_query`) - attach joins and DISTINCT
//!
//! # Example
//!
//! ```
//! use recordpath_core::{Collection, Field, InMemoryDao, RecordFieldResolver};
//!
//! let demo4 = Collection::new("demo4_id", "demo4", false)
//!     .with_field(Field::scalar("title"))
//!     .with_field(Field::relation("self_rel_one", "demo4_id", Some(1)));
//! let dao = InMemoryDao::new().with_collection(demo4.clone());
//!
//! let mut resolver = RecordFieldResolver::new(&dao, demo4, None, false);
//! let result = resolver.resolve("self_rel_one.title").unwrap();
//! assert_eq!(result.identifier, "[[demo4_self_rel_one.title]]");
//! ```

pub mod config;
pub mod dao;
pub mod error;
pub mod request;
pub mod resolver;
pub mod schema;

pub use config::ResolverConfig;
pub use dao::{Dao, InMemoryDao};
pub use error::{Error, Result};
pub use request::{AuthRecord, RequestData};
pub use resolver::{AfterBuild, MultiMatchSubquery, RecordFieldResolver, ResolverResult};
pub use schema::{Collection, Field, FieldType};

/// Prelude for common imports.
pub mod prelude {
    pub use super::config::ResolverConfig;
    pub use super::dao::{Dao, InMemoryDao};
    pub use super::error::{Error, Result};
    pub use super::request::{AuthRecord, RequestData};
    pub use super::resolver::{RecordFieldResolver, ResolverResult};
    pub use super::schema::{Collection, Field, FieldType};
}
