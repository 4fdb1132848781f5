//! Configuration surface for the embedding host.
//!
//! These knobs are genuinely configurable without changing the resolver's
//! documented semantics (they govern defaults and cosmetic naming, not the
//! walk rules themselves). They exist for the out-of-scope filter/query
//! subsystem that constructs resolvers, not for the resolver's own
//! algorithms, which always consult the explicit `allow_hidden_fields`
//! argument passed to `RecordFieldResolver::new`.

use serde::{Deserialize, Serialize};

/// Resolver-level configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Default value for `allow_hidden_fields` when the embedding host
    /// doesn't have an explicit per-request answer (e.g. superuser
    /// contexts default this to `true`).
    #[serde(default)]
    pub allow_hidden_fields_by_default: bool,

    /// Prefix used when minting placeholder names for scalar
    /// `@request.*` values (see the static request evaluator).
    #[serde(default = "default_placeholder_prefix")]
    pub placeholder_prefix: String,
}

fn default_placeholder_prefix() -> String {
    "f".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            allow_hidden_fields_by_default: false,
            placeholder_prefix: default_placeholder_prefix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ResolverConfig::default();
        assert!(!cfg.allow_hidden_fields_by_default);
        assert_eq!(cfg.placeholder_prefix, "f");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let cfg: ResolverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, ResolverConfig::default());
    }

    #[test]
    fn test_deserialize_overrides() {
        let cfg: ResolverConfig =
            serde_json::from_str(r#"{"allow_hidden_fields_by_default": true, "placeholder_prefix": "p"}"#)
                .unwrap();
        assert!(cfg.allow_hidden_fields_by_default);
        assert_eq!(cfg.placeholder_prefix, "p");
    }
}
