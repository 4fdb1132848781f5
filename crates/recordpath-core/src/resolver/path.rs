//! Path tokenizer / validator (spec §4.1).
//!
//! Splits a dotted field path and checks it against the four whitelisted
//! forms, using `nom` for the per-segment `\w+` check the same way the
//! rest of the workspace leans on `nom` for small, structural parses.

use crate::error::{Error, Result};
use nom::{bytes::complete::take_while1, combinator::all_consuming, IResult};

fn word_chars(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

fn is_word(segment: &str) -> bool {
    all_consuming(word_chars)(segment).is_ok()
}

/// Which root form a tokenized path matched, and what (if anything) was
/// consumed from the front of the path to get there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathRoot {
    /// A plain schema path rooted at the base collection.
    Plain,
    /// `@request.method`.
    RequestMethod,
    /// `@request.query.<...>`.
    RequestQuery,
    /// `@request.data.<...>`.
    RequestData,
    /// `@request.auth.<...>`.
    RequestAuth,
    /// `@collection.<name>.<...>`.
    Collection { name: String },
}

/// A validated path: its root form, plus the segments remaining after the
/// root tokens (`@request`, `@request.auth`, `@collection.<name>`, ...)
/// have been dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenizedPath {
    pub root: PathRoot,
    pub segments: Vec<String>,
}

/// Tokenize and validate a dotted field path against the whitelist in
/// spec §4.1. Returns `UnresolvableField` if the path matches no
/// whitelisted root, `InvalidPath` if it picks a root but is otherwise
/// structurally malformed (too few segments, empty segments from a
/// leading/trailing/doubled dot).
pub fn tokenize(path: &str) -> Result<TokenizedPath> {
    if path.is_empty() {
        return Err(Error::UnresolvableField(path.to_string()));
    }

    let raw: Vec<&str> = path.split('.').collect();
    if raw.iter().any(|s| s.is_empty()) {
        return Err(Error::InvalidPath(path.to_string()));
    }

    match raw[0] {
        "@request" => tokenize_request(path, &raw),
        "@collection" => tokenize_collection(path, &raw),
        s if s.starts_with('@') => Err(Error::UnresolvableField(path.to_string())),
        _ => {
            for s in &raw {
                if !is_word(s) {
                    return Err(Error::UnresolvableField(path.to_string()));
                }
            }
            Ok(TokenizedPath {
                root: PathRoot::Plain,
                segments: raw.iter().map(|s| s.to_string()).collect(),
            })
        }
    }
}

fn tokenize_request(path: &str, raw: &[&str]) -> Result<TokenizedPath> {
    if raw.len() < 2 {
        return Err(Error::InvalidPath(path.to_string()));
    }
    match raw[1] {
        "method" => {
            if raw.len() != 2 {
                return Err(Error::InvalidPath(path.to_string()));
            }
            Ok(TokenizedPath {
                root: PathRoot::RequestMethod,
                segments: vec![],
            })
        }
        "auth" | "data" | "query" => {
            if raw.len() < 3 {
                return Err(Error::InvalidPath(path.to_string()));
            }
            let rest = &raw[2..];
            for s in rest {
                if !is_word(s) {
                    return Err(Error::UnresolvableField(path.to_string()));
                }
            }
            let root = match raw[1] {
                "auth" => PathRoot::RequestAuth,
                "data" => PathRoot::RequestData,
                _ => PathRoot::RequestQuery,
            };
            Ok(TokenizedPath {
                root,
                segments: rest.iter().map(|s| s.to_string()).collect(),
            })
        }
        _ => Err(Error::UnresolvableField(path.to_string())),
    }
}

fn tokenize_collection(path: &str, raw: &[&str]) -> Result<TokenizedPath> {
    if raw.len() < 3 {
        return Err(Error::InvalidPath(path.to_string()));
    }
    if !is_word(raw[1]) {
        return Err(Error::UnresolvableField(path.to_string()));
    }
    let rest = &raw[2..];
    for s in rest {
        if !is_word(s) {
            return Err(Error::UnresolvableField(path.to_string()));
        }
    }
    Ok(TokenizedPath {
        root: PathRoot::Collection {
            name: raw[1].to_string(),
        },
        segments: rest.iter().map(|s| s.to_string()).collect(),
    })
}
