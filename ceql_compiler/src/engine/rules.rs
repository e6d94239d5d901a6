//! Rule identifiers and handler tables
//!
//! Grammar flavours are compositions: a base table of handlers plus an override table
//! consulted first. An override reaches the handler it replaces through `Parser::call_base`.

use super::error::RuleResult;
use super::fragment::Fragment;
use super::Parser;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Grammar rule handler: receives the parser and the input substring
///
/// Returning `Ok(None)` is a grammar bug and is reported as an empty-result error.
pub type RuleFn = fn(&mut Parser, &str) -> RuleResult<Option<Fragment>>;

/// Every rule the CEQL grammars know about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rule {
    CeqlQuery,
    PhraseQuery,
    PhraseElement,
    XmlTag,
    ProximityQuery,
    ProximityExpression,
    DistanceExpression,
    TokenExpression,
    WordOrLemmaConstraint,
    WordOrLemma,
    WordPattern,
    LemmaPattern,
    PosConstraint,
    PosTag,
    SimplePos,
    WildcardPattern,
    WildcardRegex,
    WildcardItem,
}

impl Rule {
    pub const ALL: [Rule; 18] = [
        Rule::CeqlQuery,
        Rule::PhraseQuery,
        Rule::PhraseElement,
        Rule::XmlTag,
        Rule::ProximityQuery,
        Rule::ProximityExpression,
        Rule::DistanceExpression,
        Rule::TokenExpression,
        Rule::WordOrLemmaConstraint,
        Rule::WordOrLemma,
        Rule::WordPattern,
        Rule::LemmaPattern,
        Rule::PosConstraint,
        Rule::PosTag,
        Rule::SimplePos,
        Rule::WildcardPattern,
        Rule::WildcardRegex,
        Rule::WildcardItem,
    ];

    /// Rule name as shown in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Rule::CeqlQuery => "ceql_query",
            Rule::PhraseQuery => "phrase_query",
            Rule::PhraseElement => "phrase_element",
            Rule::XmlTag => "xml_tag",
            Rule::ProximityQuery => "proximity_query",
            Rule::ProximityExpression => "proximity_expression",
            Rule::DistanceExpression => "distance_expression",
            Rule::TokenExpression => "token_expression",
            Rule::WordOrLemmaConstraint => "word_or_lemma_constraint",
            Rule::WordOrLemma => "word_or_lemma",
            Rule::WordPattern => "word_pattern",
            Rule::LemmaPattern => "lemma_pattern",
            Rule::PosConstraint => "pos_constraint",
            Rule::PosTag => "pos_tag",
            Rule::SimplePos => "simple_pos",
            Rule::WildcardPattern => "wildcard_pattern",
            Rule::WildcardRegex => "wildcard_regex",
            Rule::WildcardItem => "wildcard_item",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Rule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rule::ALL
            .iter()
            .copied()
            .find(|rule| rule.name() == s)
            .ok_or_else(|| format!("unknown rule '{}'", s))
    }
}

/// Handler table for one grammar flavour
#[derive(Clone)]
pub struct RuleTable {
    flavour: &'static str,
    default_rule: Rule,
    base: HashMap<Rule, RuleFn>,
    overrides: HashMap<Rule, RuleFn>,
}

impl RuleTable {
    pub fn new(flavour: &'static str, default_rule: Rule) -> Self {
        Self {
            flavour,
            default_rule,
            base: HashMap::new(),
            overrides: HashMap::new(),
        }
    }

    /// Register a base handler
    pub fn register(&mut self, rule: Rule, handler: RuleFn) -> &mut Self {
        self.base.insert(rule, handler);
        self
    }

    /// Register a handler consulted before the base handler
    pub fn override_rule(&mut self, rule: Rule, handler: RuleFn) -> &mut Self {
        self.overrides.insert(rule, handler);
        self
    }

    /// Derive a new flavour sharing this table's base handlers
    pub fn extend(&self, flavour: &'static str) -> Self {
        Self {
            flavour,
            default_rule: self.default_rule,
            base: self.base.clone(),
            overrides: HashMap::new(),
        }
    }

    /// Effective handler for a rule
    pub fn lookup(&self, rule: Rule) -> Option<RuleFn> {
        self.overrides
            .get(&rule)
            .or_else(|| self.base.get(&rule))
            .copied()
    }

    /// Base handler, ignoring overrides
    pub fn base(&self, rule: Rule) -> Option<RuleFn> {
        self.base.get(&rule).copied()
    }

    pub fn is_overridden(&self, rule: Rule) -> bool {
        self.overrides.contains_key(&rule)
    }

    pub fn default_rule(&self) -> Rule {
        self.default_rule
    }

    pub fn flavour(&self) -> &'static str {
        self.flavour
    }
}

impl fmt::Debug for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut base: Vec<&Rule> = self.base.keys().collect();
        base.sort();
        let mut overrides: Vec<&Rule> = self.overrides.keys().collect();
        overrides.sort();

        f.debug_struct("RuleTable")
            .field("flavour", &self.flavour)
            .field("default_rule", &self.default_rule)
            .field("base", &base)
            .field("overrides", &overrides)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_handler(_: &mut Parser, input: &str) -> RuleResult<Option<Fragment>> {
        Ok(Some(Fragment::text(format!("base:{}", input))))
    }

    fn override_handler(_: &mut Parser, input: &str) -> RuleResult<Option<Fragment>> {
        Ok(Some(Fragment::text(format!("override:{}", input))))
    }

    #[test]
    fn test_rule_names_round_trip() {
        for rule in Rule::ALL {
            assert_eq!(rule.name().parse::<Rule>().unwrap(), rule);
        }
        assert!("no_such_rule".parse::<Rule>().is_err());
    }

    #[test]
    fn test_override_consulted_first() {
        let mut table = RuleTable::new("test", Rule::LemmaPattern);
        table.register(Rule::LemmaPattern, base_handler);
        let mut extended = table.extend("extended");
        extended.override_rule(Rule::LemmaPattern, override_handler);

        assert!(extended.is_overridden(Rule::LemmaPattern));
        assert!(!table.is_overridden(Rule::LemmaPattern));
        assert_eq!(
            extended.lookup(Rule::LemmaPattern).map(|f| f as usize),
            Some(override_handler as RuleFn as usize)
        );
        assert_eq!(
            extended.base(Rule::LemmaPattern).map(|f| f as usize),
            Some(base_handler as RuleFn as usize)
        );
        assert!(extended.lookup(Rule::XmlTag).is_none());
        assert_eq!(extended.flavour(), "extended");
    }
}
