//! The record field resolver.
//!
//! A `RecordFieldResolver` is constructed once per request for a base
//! collection and an optional request context, then driven through
//! repeated `resolve(path)` calls (one per distinct field path the filter
//! parser encounters) and a single trailing `update_query(...)` call that
//! applies the accumulated JOINs and DISTINCT to the caller's SELECT.

mod join;
mod multimatch;
mod path;
mod result;
mod static_eval;
mod walker;

pub use join::{json_each_case, Join, JoinRegistry};
pub use multimatch::MultiMatchState;
pub use path::{tokenize, PathRoot, TokenizedPath};
pub use result::{email_visibility_guard, AfterBuild, MultiMatchSubquery, ResolverResult};

use crate::config::ResolverConfig;
use crate::dao::Dao;
use crate::error::Result;
use crate::request::RequestData;
use crate::schema::Collection;
use recordpath_sql::SelectQuery;
use std::collections::HashMap;
use tracing::debug;

/// A resolver instance. Not thread-safe (spec §5): all mutable state is
/// confined to the instance and is meant to live for the scope of one
/// request.
pub struct RecordFieldResolver<'a> {
    dao: &'a dyn Dao,
    pub(crate) base_collection: Collection,
    pub(crate) request: Option<RequestData>,
    pub(crate) allow_hidden_fields: bool,
    pub(crate) config: ResolverConfig,
    pub(crate) collections: HashMap<String, Collection>,
    pub(crate) joins: JoinRegistry,
    pub(crate) next_placeholder: u32,
}

impl<'a> RecordFieldResolver<'a> {
    /// Construct a resolver for `base_collection`, snapshotting
    /// `request` and consulting `dao` for every other collection touched
    /// during the walk. The base collection is pre-seeded into the
    /// registry's cache per spec §4.2.
    pub fn new(
        dao: &'a dyn Dao,
        base_collection: Collection,
        request: Option<RequestData>,
        allow_hidden_fields: bool,
    ) -> Self {
        Self::with_config(dao, base_collection, request, allow_hidden_fields, ResolverConfig::default())
    }

    pub fn with_config(
        dao: &'a dyn Dao,
        base_collection: Collection,
        request: Option<RequestData>,
        allow_hidden_fields: bool,
        config: ResolverConfig,
    ) -> Self {
        let mut collections = HashMap::new();
        collections.insert(base_collection.name.to_lowercase(), base_collection.clone());
        collections.insert(base_collection.id.to_lowercase(), base_collection.clone());

        debug!(collection = %base_collection.name, allow_hidden_fields, "constructed record field resolver");

        Self {
            dao,
            base_collection,
            request,
            allow_hidden_fields,
            config,
            collections,
            joins: JoinRegistry::new(),
            next_placeholder: 0,
        }
    }

    /// Resolve a dotted field path into a `ResolverResult`.
    pub fn resolve(&mut self, path: &str) -> Result<ResolverResult> {
        let tokenized = path::tokenize(path)?;
        debug!(path, root = ?tokenized.root, "resolving field path");
        walker::resolve_tokenized(self, tokenized)
    }

    /// Apply every registered join (in registration order, as LEFT JOIN)
    /// and set DISTINCT on `query` iff at least one join was registered.
    pub fn update_query(&self, query: &mut SelectQuery) -> Result<()> {
        for join in self.joins.iter() {
            if join.raw {
                query.left_join_raw(&join.table_name, &join.table_alias, join.on.as_deref());
            } else {
                query.left_join(&join.table_name, &join.table_alias, join.on.as_deref());
            }
        }
        query.distinct(!self.joins.is_empty());
        Ok(())
    }

    pub fn joins(&self) -> &JoinRegistry {
        &self.joins
    }

    /// Load a collection by name or id, consulting the cache first
    /// (spec §4.2: the registry must be consulted before any external
    /// lookup).
    pub(crate) fn load_collection(&mut self, name_or_id: &str) -> Result<Collection> {
        let key = name_or_id.to_lowercase();
        if let Some(c) = self.collections.get(&key) {
            return Ok(c.clone());
        }
        let collection = self.dao.find_collection_by_name_or_id(name_or_id)?;
        self.collections.insert(collection.name.to_lowercase(), collection.clone());
        self.collections.insert(collection.id.to_lowercase(), collection.clone());
        Ok(collection)
    }

    /// Mint a fresh, deterministic placeholder name (`f0`, `f1`, ...),
    /// namespaced per resolver instance so two resolvers running
    /// concurrently in different requests never collide. See DESIGN.md.
    pub(crate) fn next_placeholder_name(&mut self) -> String {
        let name = format!("{}{}", self.config.placeholder_prefix, self.next_placeholder);
        self.next_placeholder += 1;
        name
    }
}
