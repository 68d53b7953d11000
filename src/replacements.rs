//! Placeholder tokens and their replacement values.

use crate::error::{Error, Result};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Opening delimiter of a placeholder token.
pub const TOKEN_OPEN: &str = "{{";

/// Closing delimiter of a placeholder token.
pub const TOKEN_CLOSE: &str = "}}";

/// Wrap a placeholder name in the token delimiters.
///
/// ```
/// assert_eq!(redeck::token("COMPANY_NAME"), "{{COMPANY_NAME}}");
/// ```
pub fn token(name: &str) -> String {
    format!("{}{}{}", TOKEN_OPEN, name, TOKEN_CLOSE)
}

/// Find every delimited token in a piece of text, in order of appearance.
pub fn find_tokens(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(rel_open) = text[pos..].find(TOKEN_OPEN) {
        let search_from = pos + rel_open + TOKEN_OPEN.len();
        let Some(rel_close) = text[search_from..].find(TOKEN_CLOSE) else {
            break;
        };
        let close = search_from + rel_close;
        // innermost opening delimiter: "{{{{X}}" yields "{{X}}"
        let open = pos + text[pos..close].rfind(TOKEN_OPEN).unwrap_or(rel_open);
        let end = close + TOKEN_CLOSE.len();
        if close > open + TOKEN_OPEN.len() {
            found.push(&text[open..end]);
        }
        pos = end;
    }
    found
}

/// A scalar that can be written into slide text.
///
/// Deserializes from a JSON string or number. Anything else, or text holding
/// characters XML 1.0 cannot carry, is rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReplacementValue {
    /// Plain text
    Text(String),
    /// A number, written in its shortest JSON form (e.g., `1500`, `2.5`)
    Number(serde_json::Number),
}

impl ReplacementValue {
    /// Convert an arbitrary JSON value, rejecting anything that is not a
    /// string or a number.
    pub fn from_json(key: &str, value: &Value) -> Result<Self> {
        let scalar = Self::scalar(value).map_err(|found| invalid(key, found))?;
        scalar.validate(key)?;
        Ok(scalar)
    }

    fn scalar(value: &Value) -> std::result::Result<Self, &'static str> {
        match value {
            Value::String(s) => Ok(ReplacementValue::Text(s.clone())),
            Value::Number(n) => Ok(ReplacementValue::Number(n.clone())),
            other => Err(json_kind(other)),
        }
    }

    /// Check that the value can be written into an `a:t` element.
    pub fn validate(&self, key: &str) -> Result<()> {
        let forbidden = match self {
            ReplacementValue::Text(s) => s.chars().any(|c| !is_xml_char(c)),
            ReplacementValue::Number(n) => n.to_string().chars().any(|c| !is_xml_char(c)),
        };
        if forbidden {
            return Err(invalid(key, "control character"));
        }
        Ok(())
    }
}

/// XML 1.0 `Char` production; surrogates cannot occur in a Rust `char`.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

fn invalid(key: &str, found: &str) -> Error {
    Error::InvalidReplacementValue {
        key: key.to_string(),
        found: found.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl<'de> Deserialize<'de> for ReplacementValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let scalar = Self::scalar(&value).map_err(|found| {
            de::Error::custom(format!("expected string or number, found {}", found))
        })?;
        if let ReplacementValue::Text(s) = &scalar {
            if !s.chars().all(is_xml_char) {
                return Err(de::Error::custom("control character in replacement text"));
            }
        }
        Ok(scalar)
    }
}

impl fmt::Display for ReplacementValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplacementValue::Text(s) => f.write_str(s),
            ReplacementValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<String> for ReplacementValue {
    fn from(s: String) -> Self {
        ReplacementValue::Text(s)
    }
}

impl From<&str> for ReplacementValue {
    fn from(s: &str) -> Self {
        ReplacementValue::Text(s.to_string())
    }
}

impl From<i64> for ReplacementValue {
    fn from(n: i64) -> Self {
        ReplacementValue::Number(n.into())
    }
}

impl From<u64> for ReplacementValue {
    fn from(n: u64) -> Self {
        ReplacementValue::Number(n.into())
    }
}

/// Mapping from exact token (delimiters included) to replacement value.
///
/// Keys are matched literally. Iteration is in key order, which makes
/// substitution deterministic when one value contains another key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplacementMap {
    entries: BTreeMap<String, ReplacementValue>,
}

impl ReplacementMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite a replacement.
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<ReplacementValue>) {
        self.entries.insert(token.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, token: impl Into<String>, value: impl Into<ReplacementValue>) -> Self {
        self.insert(token, value);
        self
    }

    /// Build a map from a JSON object of token → scalar.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| invalid("<root>", json_kind(value)))?;

        let mut map = Self::new();
        for (key, value) in object {
            map.insert(key.clone(), ReplacementValue::from_json(key, value)?);
        }
        Ok(map)
    }

    /// Parse a map from JSON text. A value that is not a writable scalar is
    /// an [`Error::InvalidReplacementValue`], not a configuration error.
    pub fn parse_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_json(&value)
    }

    /// Check every value with [`ReplacementValue::validate`].
    pub fn validate(&self) -> Result<()> {
        self.iter().try_for_each(|(key, value)| value.validate(key))
    }

    /// Look up the value for a token.
    pub fn get(&self, token: &str) -> Option<&ReplacementValue> {
        self.entries.get(token)
    }

    /// Iterate tokens and values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ReplacementValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of replacements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ReplacementMap
where
    K: Into<String>,
    V: Into<ReplacementValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
