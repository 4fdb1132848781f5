//! Error types for the record field resolver.

use thiserror::Error;

/// Result type for recordpath-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors the resolver can return from `Resolve`.
///
/// All of these are compile-time filter errors: the caller (the filter
/// expression builder) is expected to surface them to the user verbatim,
/// never retry, and never attempt to recover inside the resolver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("unresolvable field: {0}")]
    UnresolvableField(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    #[error("unknown field {field} in collection {collection}")]
    UnknownField { collection: String, field: String },

    #[error("field {field} in collection {collection} is not a relation")]
    NotARelation { collection: String, field: String },

    #[error("failed to interpret options for field {field} in collection {collection}: {reason}")]
    OptionsInitFailed {
        collection: String,
        field: String,
        reason: String,
    },
}

impl Error {
    /// A short, stable code suitable for embedding in a machine-readable
    /// compile-error payload, in the same spirit as the workspace's
    /// `postrust_core::error::Error::code`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnresolvableField(_) => "RP-FIELD-100",
            Self::InvalidPath(_) => "RP-FIELD-101",
            Self::UnknownCollection(_) => "RP-FIELD-200",
            Self::UnknownField { .. } => "RP-FIELD-201",
            Self::NotARelation { .. } => "RP-FIELD-202",
            Self::OptionsInitFailed { .. } => "RP-FIELD-300",
        }
    }

    /// All of the resolver's error surfaces are client-input errors (bad
    /// filter path), never server errors.
    pub fn is_client_error(&self) -> bool {
        true
    }

    /// An HTTP status an embedding host can map this error to. Every
    /// variant here is a bad filter path submitted by the caller, so this
    /// is always in the 400 range, never 5xx.
    pub fn status_hint(&self) -> u16 {
        match self {
            Self::UnresolvableField(_) | Self::InvalidPath(_) => 400,
            Self::UnknownCollection(_) | Self::UnknownField { .. } => 404,
            Self::NotARelation { .. } | Self::OptionsInitFailed { .. } => 400,
        }
    }
}
