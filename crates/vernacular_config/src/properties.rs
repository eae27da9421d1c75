//! Flat key/value configuration and its text format.
//!
//! The text format is the conventional `.properties` layout:
//!
//! ```text
//! # comment
//! ! also a comment
//! context.provider = thread
//! language.available: en, fr, \
//!                     de
//! resources messages
//! greeting = caf\u00e9\tbar
//! ```
//!
//! Keys and values are separated by the first unescaped `=`, `:` or
//! whitespace. A trailing backslash continues the logical line, and leading
//! whitespace on the continuation is dropped. Escapes `\t`, `\n`, `\r`, `\f`,
//! `\uXXXX` are decoded; any other escaped character stands for itself.

use crate::error::PropertiesError;
use std::collections::BTreeMap;

/// An ordered set of string properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Creates an empty property set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses properties text.
    ///
    /// Later occurrences of a key replace earlier ones.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed `\u` escapes.
    pub fn parse(text: &str) -> Result<Self, PropertiesError> {
        let mut properties = Self::new();
        let mut lines = text.lines().enumerate();

        while let Some((index, raw)) = lines.next() {
            let line_number = index + 1;
            let first = raw.trim_start();
            if first.is_empty() || first.starts_with('#') || first.starts_with('!') {
                continue;
            }

            let mut logical = String::new();
            let mut current = first;
            loop {
                if ends_with_continuation(current) {
                    logical.push_str(&current[..current.len() - 1]);
                    match lines.next() {
                        Some((_, next)) => current = next.trim_start(),
                        None => break,
                    }
                } else {
                    logical.push_str(current);
                    break;
                }
            }

            let (key, value) = split_key_value(&logical);
            let key = unescape(key, line_number)?;
            let value = unescape(value, line_number)?;
            properties.entries.insert(key, value);
        }

        Ok(properties)
    }

    /// Returns the value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Sets `key` to `value`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Builder form of [`insert()`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Iterates over the entries whose key starts with `prefix`, yielding the
    /// key with the prefix stripped.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.entries
            .range::<str, _>((core::ops::Bound::Included(prefix), core::ops::Bound::Unbounded))
            .map_while(move |(key, value)| {
                key.strip_prefix(prefix)
                    .map(|rest| (rest, value.as_str()))
            })
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Properties {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.entries.extend(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into())),
        );
    }
}

/// A line continues when it ends with an odd number of backslashes.
fn ends_with_continuation(line: &str) -> bool {
    line.bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

fn split_key_value(line: &str) -> (&str, &str) {
    let bytes = line.as_bytes();
    let mut escaped = false;
    let mut key_end = bytes.len();

    for (i, &b) in bytes.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' => escaped = true,
            b'=' | b':' | b' ' | b'\t' | b'\x0c' => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start_matches([' ', '\t', '\x0c']);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches([' ', '\t', '\x0c']);
    }
    (key, rest)
}

fn unescape(text: &str, line: usize) -> Result<String, PropertiesError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0c'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = (hex.len() == 4)
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32)
                    .ok_or_else(|| PropertiesError {
                        line,
                        reason: format!("malformed \\u escape '\\u{hex}'"),
                    })?;
                out.push(code);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_separators_and_comments() {
        let props = Properties::parse(
            "# comment\n\
             ! another\n\
             \n\
             a=1\n\
             b : 2\n\
             c 3\n\
             d\n",
        )
        .unwrap();

        assert_eq!(props.get("a"), Some("1"));
        assert_eq!(props.get("b"), Some("2"));
        assert_eq!(props.get("c"), Some("3"));
        assert_eq!(props.get("d"), Some(""));
        assert_eq!(props.len(), 4);
    }

    #[test]
    fn joins_continuation_lines() {
        let props = Properties::parse("list = en, \\\n        fr, \\\n   de\nnext=x").unwrap();
        assert_eq!(props.get("list"), Some("en, fr, de"));
        assert_eq!(props.get("next"), Some("x"));
    }

    #[test]
    fn escaped_backslash_is_not_a_continuation() {
        let props = Properties::parse("path = c:\\\\dir\\\\\nnext=1").unwrap();
        assert_eq!(props.get("path"), Some("c:\\dir\\"));
        assert_eq!(props.get("next"), Some("1"));
    }

    #[test]
    fn decodes_escapes() {
        let props = Properties::parse("k\\=ey = caf\\u00e9\\tx\\ny").unwrap();
        assert_eq!(props.get("k=ey"), Some("caf\u{e9}\tx\ny"));
    }

    #[test]
    fn rejects_malformed_unicode_escape() {
        let err = Properties::parse("ok=1\nbad = \\u12").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn later_keys_win() {
        let props = Properties::parse("a=1\na=2").unwrap();
        assert_eq!(props.get("a"), Some("2"));
    }

    #[test]
    fn prefix_iteration_strips_prefix() {
        let props = Properties::new()
            .with("resources", "messages")
            .with("resources.named.errors", "errors")
            .with("resources.named.mail", "mail")
            .with("strategy", "scoped");

        let named: Vec<_> = props.with_prefix("resources.named.").collect();
        assert_eq!(named, [("errors", "errors"), ("mail", "mail")]);
    }
}
