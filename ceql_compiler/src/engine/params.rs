//! Grammar parameter table
//!
//! Parameters must be declared before they can be read or written. A parser keeps one
//! table of declared defaults and, while a parse is active, a live copy that rules may
//! modify without affecting later parses.

use super::error::{ParseError, RuleResult};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Value held by a grammar parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Declared but not configured (e.g. a corpus without lemma annotation)
    Unset,
    Bool(bool),
    Text(String),
    /// Lookup table, e.g. simple POS alias to tag regex
    Map(BTreeMap<String, String>),
    /// Name set, e.g. allowed XML tags
    Set(BTreeSet<String>),
}

impl ParamValue {
    pub fn text(value: &str) -> Self {
        Self::Text(value.to_string())
    }

    pub fn optional_text(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => Self::text(v),
            _ => Self::Unset,
        }
    }

    pub fn set<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Set(names.into_iter().map(Into::into).collect())
    }

    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Bool(_) => "a boolean",
            Self::Text(_) => "a string",
            Self::Map(_) => "a lookup table",
            Self::Set(_) => "a name set",
        }
    }
}

/// Named parameter table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamTable {
    values: HashMap<String, ParamValue>,
}

impl ParamTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a fixed list of declarations
    pub fn with_declarations<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, ParamValue)>,
    {
        Self {
            values: entries
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }

    /// Declare a new parameter with its initial value
    pub fn declare(&mut self, name: &str, value: ParamValue) -> RuleResult<()> {
        if self.values.contains_key(name) {
            return Err(ParseError::DuplicateParameter {
                name: name.to_string(),
            });
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> RuleResult<&ParamValue> {
        self.values
            .get(name)
            .ok_or_else(|| ParseError::UndeclaredParameter {
                name: name.to_string(),
            })
    }

    pub fn set(&mut self, name: &str, value: ParamValue) -> RuleResult<()> {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ParseError::UndeclaredParameter {
                name: name.to_string(),
            }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parameter names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
