//! Collections and fields: the dynamic, user-authored schema the path
//! walker indexes into.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// System fields present on every collection, regardless of its schema.
pub const BASE_SYSTEM_FIELDS: &[&str] = &["id", "created", "updated"];

/// Additional implicit system fields auth collections gain.
pub const AUTH_SYSTEM_FIELDS: &[&str] = &["username", "verified", "emailVisibility", "email"];

/// Simple `@request.auth.<simple>` fields servable straight from the
/// snapshotted public export, without joining anything.
pub const REQUEST_AUTH_SIMPLE_FIELDS: &[&str] = &[
    "id",
    "collectionId",
    "collectionName",
    "username",
    "email",
    "emailVisibility",
    "verified",
    "created",
    "updated",
];

/// A field's type, and the options relevant to path resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldType {
    /// Any scalar type not otherwise distinguished here (text, number,
    /// bool, email, url, editor, date, file, ...). The resolver only
    /// needs to know it terminates a path.
    Scalar,
    /// A JSON column; the remaining path segments index into it.
    Json,
    /// A closed enumeration, stored like a relation (scalar id or JSON
    /// array of ids).
    Select { max_select: Option<i32> },
    /// A reference to one or more records in another collection.
    Relation {
        collection_id: String,
        max_select: Option<i32>,
    },
}

impl FieldType {
    /// Whether a value of this type may hold more than one item (`nil` or
    /// `>1` `max_select` means multi-valued; `1` means single).
    pub fn is_multi_valued(&self) -> bool {
        match self {
            Self::Select { max_select } | Self::Relation { max_select, .. } => {
                !matches!(max_select, Some(1))
            }
            Self::Scalar | Self::Json => false,
        }
    }
}

/// A single field in a collection's schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
}

impl Field {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Scalar,
        }
    }

    pub fn json(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Json,
        }
    }

    pub fn select(name: impl Into<String>, max_select: Option<i32>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Select { max_select },
        }
    }

    pub fn relation(
        name: impl Into<String>,
        collection_id: impl Into<String>,
        max_select: Option<i32>,
    ) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Relation {
                collection_id: collection_id.into(),
                max_select,
            },
        }
    }
}

/// A named, schema-bearing collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    pub is_auth: bool,
    pub fields: IndexMap<String, Field>,
}

impl Collection {
    pub fn new(id: impl Into<String>, name: impl Into<String>, is_auth: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_auth,
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Look up a user-schema field by name (not system fields).
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Whether `name` is an always-present system field of this
    /// collection (base model fields, plus the auth-only fields when this
    /// is an auth collection).
    pub fn is_system_field(&self, name: &str) -> bool {
        BASE_SYSTEM_FIELDS.contains(&name) || (self.is_auth && AUTH_SYSTEM_FIELDS.contains(&name))
    }
}
