//! Per-corpus grammar configuration
//!
//! Describes which attributes a corpus provides to the query grammar. Loaded by hosts from
//! TOML and written into a parser's parameter table with `GrammarConfig::apply`.

use crate::engine::{ParamValue, ParseError, Parser};
use crate::grammar::parameters;
use crate::logging::codes::{self, Code};
use crate::{log_error, log_success};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Errors raised while loading a grammar configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read grammar configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid grammar configuration: {0}")]
    Format(#[from] toml::de::Error),

    #[error("Invalid value for '{field}': {reason}")]
    Value { field: String, reason: String },
}

impl ConfigError {
    pub fn value_error(field: &str, reason: &str) -> Self {
        Self::Value {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::Io { .. } => codes::config::CONFIG_READ_ERROR,
            Self::Format(_) => codes::config::CONFIG_FORMAT_ERROR,
            Self::Value { .. } => codes::config::CONFIG_VALUE_ERROR,
        }
    }
}

/// Attributes and tag tables a corpus makes available to queries
///
/// An empty string for an attribute name means the corpus does not have it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrammarConfig {
    pub pos_attribute: String,
    pub lemma_attribute: String,
    /// Simple POS alias to tag regex
    pub simple_pos: BTreeMap<String, String>,
    pub simple_pos_attribute: String,
    pub combo_attribute: String,
    /// XML tags and structural distance regions allowed in queries
    pub s_attributes: BTreeSet<String>,
    pub default_ignore_case: bool,
    pub default_ignore_diac: bool,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            pos_attribute: "pos".to_string(),
            lemma_attribute: "lemma".to_string(),
            simple_pos: BTreeMap::new(),
            simple_pos_attribute: String::new(),
            combo_attribute: String::new(),
            s_attributes: ["s".to_string()].into_iter().collect(),
            default_ignore_case: false,
            default_ignore_diac: false,
        }
    }
}

impl GrammarConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GrammarConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let result = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
            .and_then(|content| Self::from_toml_str(&content));

        match &result {
            Ok(config) => {
                log_success!(codes::success::CONFIG_LOADED, "Grammar configuration loaded",
                    "path" => path.display(),
                    "s_attributes" => config.s_attributes.len(),
                    "simple_pos_tags" => config.simple_pos.len()
                );
            }
            Err(error) => {
                log_error!(error.error_code(), "Failed to load grammar configuration",
                    "path" => path.display(),
                    "error" => error
                );
            }
        }
        result
    }

    /// Check attribute and region names
    pub fn validate(&self) -> Result<(), ConfigError> {
        let attributes = [
            ("pos_attribute", &self.pos_attribute),
            ("lemma_attribute", &self.lemma_attribute),
            ("simple_pos_attribute", &self.simple_pos_attribute),
            ("combo_attribute", &self.combo_attribute),
        ];
        for (field, name) in attributes {
            if !name.is_empty() && !is_attribute_name(name) {
                return Err(ConfigError::value_error(
                    field,
                    &format!("'{}' is not a valid attribute name", name),
                ));
            }
        }

        if let Some(region) = self.s_attributes.iter().find(|name| !is_attribute_name(name)) {
            return Err(ConfigError::value_error(
                "s_attributes",
                &format!("'{}' is not a valid attribute name", region),
            ));
        }

        if self.simple_pos.keys().any(|tag| tag.trim().is_empty()) {
            return Err(ConfigError::value_error(
                "simple_pos",
                "simple POS tags must not be empty",
            ));
        }

        Ok(())
    }

    /// Write every setting into the parser's parameter table
    pub fn apply(&self, parser: &mut Parser) -> Result<(), ParseError> {
        let simple_pos = if self.simple_pos.is_empty() {
            ParamValue::Unset
        } else {
            ParamValue::Map(self.simple_pos.clone())
        };

        let settings = [
            (
                parameters::POS_ATTRIBUTE,
                ParamValue::optional_text(Some(&self.pos_attribute)),
            ),
            (
                parameters::LEMMA_ATTRIBUTE,
                ParamValue::optional_text(Some(&self.lemma_attribute)),
            ),
            (parameters::SIMPLE_POS, simple_pos),
            (
                parameters::SIMPLE_POS_ATTRIBUTE,
                ParamValue::optional_text(Some(&self.simple_pos_attribute)),
            ),
            (
                parameters::COMBO_ATTRIBUTE,
                ParamValue::optional_text(Some(&self.combo_attribute)),
            ),
            (
                parameters::S_ATTRIBUTES,
                ParamValue::Set(self.s_attributes.clone()),
            ),
            (
                parameters::DEFAULT_IGNORE_CASE,
                ParamValue::Bool(self.default_ignore_case),
            ),
            (
                parameters::DEFAULT_IGNORE_DIAC,
                ParamValue::Bool(self.default_ignore_diac),
            ),
        ];
        for (name, value) in settings {
            parser.set_param(name, value)?;
        }

        log_success!(codes::success::GRAMMAR_CONFIGURED, "Grammar parameters applied",
            "flavour" => parser.flavour(),
            "lemma" => !self.lemma_attribute.is_empty(),
            "simple_pos" => !self.simple_pos.is_empty(),
            "combo" => !self.combo_attribute.is_empty()
        );
        Ok(())
    }
}

/// Corpus attribute handle: letter or underscore, then letters, digits, `_` or `-`
fn is_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::CeqlParser;
    use assert_matches::assert_matches;
    use std::io::Write;

    const SAMPLE: &str = r#"
pos_attribute = "tag"
lemma_attribute = "hw"
simple_pos_attribute = "class"
s_attributes = ["s", "p", "text_genre"]
default_ignore_case = true

[simple_pos]
N = "NN.*"
V = "VV.*"
"#;

    #[test]
    fn test_from_toml_str() {
        let config = GrammarConfig::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.pos_attribute, "tag");
        assert_eq!(config.lemma_attribute, "hw");
        assert_eq!(config.combo_attribute, "");
        assert_eq!(config.simple_pos.get("N").map(String::as_str), Some("NN.*"));
        assert_eq!(config.s_attributes.len(), 3);
        assert!(config.default_ignore_case);
        assert!(!config.default_ignore_diac);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = GrammarConfig::from_toml_str("").unwrap();
        assert_eq!(config, GrammarConfig::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let error = GrammarConfig::from_toml_str("pos_atribute = \"tag\"").unwrap_err();
        assert_matches!(error, ConfigError::Format(_));
        assert_eq!(error.error_code(), codes::config::CONFIG_FORMAT_ERROR);
    }

    #[test]
    fn test_invalid_attribute_name() {
        assert_matches!(
            GrammarConfig::from_toml_str("lemma_attribute = \"1 lemma\""),
            Err(ConfigError::Value { field, .. }) if field == "lemma_attribute"
        );
        assert_matches!(
            GrammarConfig::from_toml_str("s_attributes = [\"s\", \"\"]"),
            Err(ConfigError::Value { field, .. }) if field == "s_attributes"
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = GrammarConfig::load(file.path()).unwrap();
        assert_eq!(config.lemma_attribute, "hw");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let error = GrammarConfig::load(&dir.path().join("missing.toml")).unwrap_err();

        assert_matches!(error, ConfigError::Io { .. });
        assert_eq!(error.error_code(), codes::config::CONFIG_READ_ERROR);
    }

    #[test]
    fn test_apply_to_parser() {
        let config = GrammarConfig::from_toml_str(SAMPLE).unwrap();
        let mut parser = CeqlParser::new();
        config.apply(&mut parser).unwrap();

        assert_eq!(
            parser.parse("{dog}_{N}").unwrap(),
            "[hw=\"dog\"%c & class=\"NN.*\"]"
        );
        assert_eq!(
            parser.parse("<text_genre=news> a:C").unwrap(),
            "<text_genre=\"news\"> [word=\"a\"]"
        );
    }

    #[test]
    fn test_apply_unsets_missing_attributes() {
        let config = GrammarConfig {
            lemma_attribute: String::new(),
            ..GrammarConfig::default()
        };
        let mut parser = CeqlParser::with_config(&config, crate::grammar::Flavour::Ceql).unwrap();

        assert_matches!(parser.parse("{dog}"), Err(ParseError::LemmaNotAvailable));
    }
}
