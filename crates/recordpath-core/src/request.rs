//! The request context a resolver is constructed against.

use crate::schema::Collection;
use serde_json::{Map, Value};

/// The authenticated record attached to a request, if any.
///
/// `public_export` is a snapshot taken once, at construction time, of the
/// record's public export *ignoring* `emailVisibility` -- i.e. `email` is
/// always present in this map. This sidesteps toggling a shared record's
/// visibility flag and restoring it afterward: rather than mutate a
/// record the caller still owns, the caller hands the resolver an
/// already-ignoring-visibility view (see DESIGN.md for the reasoning).
#[derive(Clone, Debug, PartialEq)]
pub struct AuthRecord {
    pub id: String,
    pub collection: Collection,
    pub public_export: Map<String, Value>,
}

impl AuthRecord {
    pub fn new(id: impl Into<String>, collection: Collection, public_export: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            collection,
            public_export,
        }
    }

    /// Look up a key in the snapshotted export. Returns `None` both for
    /// an absent key and for one holding JSON `null`... except the
    /// resolver's `.isset` handling needs to distinguish the two, so it
    /// goes through `public_export.contains_key` directly rather than
    /// this helper.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.public_export.get(key)
    }
}

/// Snapshotted request context: method, query map, data map, and
/// optional authenticated record.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct RequestData {
    pub method: String,
    pub query: Map<String, Value>,
    pub data: Map<String, Value>,
    pub auth_record: Option<AuthRecord>,
}

impl RequestData {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            query: Map::new(),
            data: Map::new(),
            auth_record: None,
        }
    }

    pub fn with_query(mut self, query: Map<String, Value>) -> Self {
        self.query = query;
        self
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    pub fn with_auth(mut self, auth_record: AuthRecord) -> Self {
        self.auth_record = Some(auth_record);
        self
    }
}
