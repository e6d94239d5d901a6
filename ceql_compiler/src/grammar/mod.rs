//! CEQL grammar: rule tables, grammar parameters and the ready-to-use parser
//!
//! The base CEQL grammar lives in `ceql` (phrase queries, token expressions, attribute
//! constraints), `proximity` (`MU(meet ...)` queries) and `wildcard` (wildcard pattern to
//! regex). The CQPweb flavour in `cqpweb` overrides the lemma pattern rule on top of the
//! base table.

pub mod ceql;
pub mod cqpweb;
pub mod proximity;
pub mod wildcard;

use crate::config::corpus::GrammarConfig;
use crate::engine::{ParamTable, ParamValue, Parser, ParseError, Rule, RuleTable};
use crate::log_info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

/// Names of the grammar parameters every flavour declares
pub mod parameters {
    /// Attribute holding the full part-of-speech tag
    pub const POS_ATTRIBUTE: &str = "pos_attribute";
    /// Attribute holding the lemma
    pub const LEMMA_ATTRIBUTE: &str = "lemma_attribute";
    /// Simple POS alias table (alias to tag regex)
    pub const SIMPLE_POS: &str = "simple_pos";
    /// Attribute the simple POS regexes are matched against
    pub const SIMPLE_POS_ATTRIBUTE: &str = "simple_pos_attribute";
    /// Attribute encoding lemma and simple POS as `lemma_TAG`
    pub const COMBO_ATTRIBUTE: &str = "combo_attribute";
    /// XML tags and structural distance regions allowed in queries
    pub const S_ATTRIBUTES: &str = "s_attributes";
    pub const DEFAULT_IGNORE_CASE: &str = "default_ignore_case";
    pub const DEFAULT_IGNORE_DIAC: &str = "default_ignore_diac";
}

/// Grammar flavour selecting the rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavour {
    #[default]
    Ceql,
    Cqpweb,
}

impl Flavour {
    pub fn name(&self) -> &'static str {
        match self {
            Flavour::Ceql => "ceql",
            Flavour::Cqpweb => "cqpweb",
        }
    }

    pub fn rule_table(&self) -> RuleTable {
        match self {
            Flavour::Ceql => ceql_rules(),
            Flavour::Cqpweb => cqpweb_rules(),
        }
    }
}

impl fmt::Display for Flavour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Flavour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ceql" => Ok(Flavour::Ceql),
            "cqpweb" => Ok(Flavour::Cqpweb),
            other => Err(format!("unknown grammar flavour '{}' (use ceql or cqpweb)", other)),
        }
    }
}

/// Rule table of the base CEQL grammar
pub fn ceql_rules() -> RuleTable {
    let mut table = RuleTable::new("ceql", Rule::CeqlQuery);
    table
        .register(Rule::CeqlQuery, ceql::ceql_query)
        .register(Rule::PhraseQuery, ceql::phrase_query)
        .register(Rule::PhraseElement, ceql::phrase_element)
        .register(Rule::XmlTag, ceql::xml_tag)
        .register(Rule::TokenExpression, ceql::token_expression)
        .register(Rule::WordOrLemmaConstraint, ceql::word_or_lemma_constraint)
        .register(Rule::WordOrLemma, ceql::word_or_lemma)
        .register(Rule::WordPattern, ceql::word_pattern)
        .register(Rule::LemmaPattern, ceql::lemma_pattern)
        .register(Rule::PosConstraint, ceql::pos_constraint)
        .register(Rule::PosTag, ceql::pos_tag)
        .register(Rule::SimplePos, ceql::simple_pos)
        .register(Rule::ProximityQuery, proximity::proximity_query)
        .register(Rule::ProximityExpression, proximity::proximity_expression)
        .register(Rule::DistanceExpression, proximity::distance_expression)
        .register(Rule::WildcardPattern, wildcard::wildcard_pattern)
        .register(Rule::WildcardRegex, wildcard::wildcard_regex)
        .register(Rule::WildcardItem, wildcard::wildcard_item);
    table
}

/// Rule table of the CQPweb grammar: the CEQL table plus the combined lemma/POS search
pub fn cqpweb_rules() -> RuleTable {
    let mut table = ceql_rules().extend("cqpweb");
    table.override_rule(Rule::LemmaPattern, cqpweb::lemma_pattern);
    table
}

/// Declared grammar parameters with their default values
pub fn default_parameters() -> ParamTable {
    ParamTable::with_declarations([
        (parameters::POS_ATTRIBUTE, ParamValue::text("pos")),
        (parameters::LEMMA_ATTRIBUTE, ParamValue::text("lemma")),
        (parameters::SIMPLE_POS, ParamValue::Unset),
        (parameters::SIMPLE_POS_ATTRIBUTE, ParamValue::Unset),
        (parameters::COMBO_ATTRIBUTE, ParamValue::Unset),
        (parameters::S_ATTRIBUTES, ParamValue::set(["s"])),
        (parameters::DEFAULT_IGNORE_CASE, ParamValue::Bool(false)),
        (parameters::DEFAULT_IGNORE_DIAC, ParamValue::Bool(false)),
    ])
}

/// CEQL query compiler of one grammar flavour
///
/// Dereferences to the underlying `Parser` for parsing, parameters and diagnostics.
#[derive(Debug)]
pub struct CeqlParser {
    parser: Parser,
    flavour: Flavour,
}

impl CeqlParser {
    /// Base CEQL grammar with default parameters
    pub fn new() -> Self {
        Self::with_flavour(Flavour::Ceql)
    }

    /// CQPweb grammar with default parameters
    pub fn cqpweb() -> Self {
        Self::with_flavour(Flavour::Cqpweb)
    }

    pub fn with_flavour(flavour: Flavour) -> Self {
        let parser = Parser::with_parameters(flavour.rule_table(), default_parameters());
        log_info!("Grammar parser created", "flavour" => flavour);
        Self { parser, flavour }
    }

    /// Parser of the given flavour configured for one corpus
    pub fn with_config(config: &GrammarConfig, flavour: Flavour) -> Result<Self, ParseError> {
        let mut parser = Self::with_flavour(flavour);
        config.apply(&mut parser)?;
        Ok(parser)
    }

    pub fn grammar(&self) -> Flavour {
        self.flavour
    }

    pub fn into_inner(self) -> Parser {
        self.parser
    }
}

impl Default for CeqlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for CeqlParser {
    type Target = Parser;

    fn deref(&self) -> &Parser {
        &self.parser
    }
}

impl DerefMut for CeqlParser {
    fn deref_mut(&mut self) -> &mut Parser {
        &mut self.parser
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flavour_from_str() {
        assert_eq!("ceql".parse::<Flavour>().unwrap(), Flavour::Ceql);
        assert_eq!("CQPweb".parse::<Flavour>().unwrap(), Flavour::Cqpweb);
        assert!("sql".parse::<Flavour>().is_err());
    }

    #[test]
    fn test_every_rule_registered() {
        let table = ceql_rules();
        for rule in Rule::ALL {
            assert!(table.lookup(rule).is_some(), "missing handler for {}", rule);
        }
    }

    #[test]
    fn test_cqpweb_overrides_lemma_pattern_only() {
        let table = cqpweb_rules();
        for rule in Rule::ALL {
            assert_eq!(table.is_overridden(rule), rule == Rule::LemmaPattern);
        }
        assert_eq!(table.flavour(), "cqpweb");
    }

    #[test]
    fn test_default_parameters() {
        let parser = CeqlParser::new();

        assert_eq!(
            parser.param_text(parameters::POS_ATTRIBUTE).unwrap().as_deref(),
            Some("pos")
        );
        assert_eq!(parser.param_map(parameters::SIMPLE_POS).unwrap(), None);
        assert!(parser.param_set(parameters::S_ATTRIBUTES).unwrap().contains("s"));
        assert!(!parser.param_bool(parameters::DEFAULT_IGNORE_CASE).unwrap());
        assert_eq!(parser.declared_params().len(), 8);
    }
}
