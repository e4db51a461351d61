//! Route-rule compiler.
//!
//! A rule is a literal path in which `<name>` marks a named capture:
//!
//! ```text
//! /users/<user_id>/posts/<post_id>
//!        ↓ compile
//! ^/users/(?P<user_id>[-._~()'!*:@,;=A-Za-z0-9_]+)/posts/(?P<post_id>[-._~()'!*:@,;=A-Za-z0-9_]+)$
//! ```
//!
//! A capture matches one or more URI-safe characters: ASCII letters, digits
//! and `_`, plus `-._~()'!*:@,;=`. It never crosses a `/` and never swallows `%`, `<`,
//! `>`, brackets, braces, `|`, `^` or whitespace. Everything outside a
//! capture is matched literally. The whole path must match.
//!
//! Only `<` + ASCII word characters + `>` is capture syntax. `<user-id>` is left
//! as literal text.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Error;

static CAPTURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([A-Za-z0-9_]+)>").expect("capture syntax regex is valid"));

const SAFE_URI: &str = r"-._~()'!*:@,;=A-Za-z0-9_";

/// A compiled route rule.
///
/// Patterns order by their compiled source text, never by identity: two
/// patterns compiled from the same rule by different routers are distinct
/// values that compare equal.
#[derive(Clone)]
pub struct Pattern {
    rule: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles `rule` into an anchored matcher.
    pub fn compile(rule: &str) -> Result<Self, Error> {
        let mut source = String::with_capacity(rule.len() + 2);
        source.push('^');

        let mut last = 0;
        for caps in CAPTURE.captures_iter(rule) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else { continue };
            source.push_str(&regex::escape(&rule[last..whole.start()]));
            source.push_str(&format!(r"(?P<{}>[{SAFE_URI}]+)", name.as_str()));
            last = whole.end();
        }
        source.push_str(&regex::escape(&rule[last..]));
        source.push('$');

        let regex = Regex::new(&source).map_err(|source| Error::InvalidPattern {
            rule: rule.to_owned(),
            source,
        })?;
        Ok(Self { rule: rule.to_owned(), regex })
    }

    /// The rule text this pattern was compiled from.
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// The compiled regular-expression source.
    pub fn source(&self) -> &str {
        self.regex.as_str()
    }

    /// Matches the full `path`, returning the named captures on success.
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let caps = self.regex.captures(path)?;
        let args = self.regex
            .capture_names()
            .flatten()
            .filter_map(|name| caps.name(name).map(|m| (name.to_owned(), m.as_str().to_owned())))
            .collect();
        Some(args)
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source() == other.source()
    }
}

impl Eq for Pattern {}

impl PartialOrd for Pattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pattern {
    fn cmp(&self, other: &Self) -> Ordering {
        self.source().cmp(other.source())
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("rule", &self.rule)
            .field("source", &self.source())
            .finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_rule_matches_whole_path_only() {
        let p = Pattern::compile("/single").unwrap();
        assert!(p.is_match("/single"));
        assert!(!p.is_match("/single/extra"));
        assert!(!p.is_match("/prefix/single"));
    }

    #[test]
    fn extracts_named_segments() {
        let p = Pattern::compile("/single/<single_id>/double/<double_id>").unwrap();
        let args = p.captures("/single/1234/double/5678").unwrap();
        assert_eq!(args["single_id"], "1234");
        assert_eq!(args["double_id"], "5678");
        assert!(p.captures("/single/1234/invalid/5678").is_none());
    }

    #[test]
    fn capture_accepts_safe_characters_only() {
        let p = Pattern::compile("/files/<name>").unwrap();
        assert!(p.is_match("/files/a-b.c_d~(e)'!*:@,;="));
        assert!(!p.is_match("/files/a/b"));
        assert!(!p.is_match("/files/a%20b"));
        assert!(!p.is_match("/files/a b"));
        assert!(!p.is_match("/files/"));
        assert!(!p.is_match("/files/josé"));
        assert!(!p.is_match("/files/\u{663}"));
    }

    #[test]
    fn literal_text_is_not_a_regex() {
        let p = Pattern::compile("/v1.0/items").unwrap();
        assert!(p.is_match("/v1.0/items"));
        assert!(!p.is_match("/v1x0/items"));
    }

    #[test]
    fn non_word_capture_names_stay_literal() {
        let p = Pattern::compile("/users/<user-id>").unwrap();
        assert!(p.is_match("/users/<user-id>"));
        assert!(!p.is_match("/users/42"));
    }

    #[test]
    fn same_rule_compiles_to_equal_but_distinct_patterns() {
        let a = Pattern::compile("/items/<id>").unwrap();
        let b = Pattern::compile("/items/<id>").unwrap();
        assert_eq!(a, b);
        assert!(!std::ptr::eq(&a, &b));
    }

    #[test]
    fn orders_by_source_text() {
        let literal = Pattern::compile("/single/test").unwrap();
        let capture = Pattern::compile("/single/<id>").unwrap();
        let short = Pattern::compile("/single").unwrap();
        assert!(literal > capture);
        assert!(capture > short);
    }
}
