//! Safe SQL identifier handling.
//!
//! The resolved storage backend here quotes identifiers with backticks
//! (as seen throughout the field resolver's end-to-end scenarios, e.g.
//! `` SELECT `demo4`.* FROM `demo4` ``) and substitutes resolved field
//! references through a `[[alias.column]]` placeholder syntax rather than
//! inlining a quoted identifier directly. Both forms funnel user-supplied
//! path segments through [`columnify`] first, which is what keeps a
//! resolved identifier free of anything the caller didn't put there.

/// Escape a table/alias identifier for use in FROM/JOIN clauses.
///
/// Wraps the identifier in backticks, doubling any embedded backtick.
///
/// # Examples
///
/// ```
/// use recordpath_sql::escape_ident;
///
/// assert_eq!(escape_ident("demo4"), "`demo4`");
/// assert_eq!(escape_ident("weird`name"), "`weird``name`");
/// ```
pub fn escape_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Build a `[[alias.column]]` field reference, the placeholder syntax the
/// enclosing query builder substitutes for a properly quoted, joined
/// column reference.
///
/// # Examples
///
/// ```
/// use recordpath_sql::bracket_ident;
///
/// assert_eq!(bracket_ident("demo4", "title"), "[[demo4.title]]");
/// ```
pub fn bracket_ident(alias: &str, column: &str) -> String {
    format!("[[{}.{}]]", alias, column)
}

/// Reduce a user-supplied path segment to the `[A-Za-z0-9_]` character
/// class, dropping every other byte.
///
/// Aliases and JSON path keys are built by concatenating `columnify`'d
/// segments, so no raw user text can ever smuggle a quote, bracket, or
/// SQL keyword into an emitted identifier.
///
/// # Examples
///
/// ```
/// use recordpath_sql::columnify;
///
/// assert_eq!(columnify("title"), "title");
/// assert_eq!(columnify("weird name; DROP"), "weirdnameDROP");
/// ```
pub fn columnify(segment: &str) -> String {
    segment
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Check whether `s` is entirely made up of word characters (letters,
/// digits, underscore) and non-empty.
pub fn is_valid_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_ident() {
        assert_eq!(escape_ident("demo4"), "`demo4`");
        assert_eq!(escape_ident("a`b"), "`a``b`");
    }

    #[test]
    fn test_bracket_ident() {
        assert_eq!(bracket_ident("demo4", "title"), "[[demo4.title]]");
    }

    #[test]
    fn test_columnify_strips_everything_outside_whitelist() {
        assert_eq!(columnify("title"), "title");
        assert_eq!(columnify("a.b.c"), "abc");
        assert_eq!(columnify("'); DROP TABLE users; --"), "DROPTABLEusers");
    }

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("title"));
        assert!(is_valid_identifier("_hidden"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("has space"));
        assert!(!is_valid_identifier("has.dot"));
    }
}
