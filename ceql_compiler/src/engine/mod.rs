//! Backtracking rule engine
//!
//! A `Parser` runs grammar rules from a `RuleTable` against query text. Rules call each
//! other through `call`, attempt alternatives through `try_call`, and process token
//! sequences through `apply`, which gives them a scoped group stack for bracket handling.
//! Per-parse state (call stack, live parameters, groups) lives on the parser and is reset
//! at the start of every parse, so one instance can compile any number of queries in turn
//! but never two at once.

pub mod diagnostics;
pub mod error;
pub mod fragment;
pub mod frame;
pub mod groups;
pub mod params;
pub mod rules;

pub use diagnostics::Diagnosis;
pub use error::{Imbalance, ParseError, RuleResult};
pub use fragment::Fragment;
pub use frame::{ApplyProgress, FrameKind, ParseFrame};
pub use groups::GroupStack;
pub use params::{ParamTable, ParamValue};
pub use rules::{Rule, RuleFn, RuleTable};

use crate::config::compile_time::query::{MAX_CALL_DEPTH, MAX_QUERY_LENGTH};
use crate::config::runtime::ParserPreferences;
use crate::logging::codes;
use crate::{log_debug, log_error, log_success};
use std::collections::{BTreeMap, BTreeSet};

/// Saved parser state for rollback after a failed attempt
#[derive(Debug, Clone)]
pub struct ParserCheckpoint {
    /// Snapshot of the active parameter table
    pub params: ParamTable,
    /// Call stack depth at the time of the snapshot
    pub stack_depth: usize,
    /// Group stack of the enclosing Apply, if any
    pub groups: Option<GroupStack>,
}

/// Rule engine state for one grammar flavour
pub struct Parser {
    rules: RuleTable,
    defaults: ParamTable,
    live: Option<ParamTable>,
    stack: Vec<ParseFrame>,
    groups: Option<GroupStack>,
    next_frame_id: u64,
    parsing: bool,
    input: String,
    diagnosis: Option<Diagnosis>,
    preferences: ParserPreferences,
}

impl Parser {
    /// Create a parser over a rule table with no declared parameters
    pub fn new(rules: RuleTable) -> Self {
        Self::with_preferences(rules, ParserPreferences::default())
    }

    /// Create a parser with a prepared table of declared parameters
    pub fn with_parameters(rules: RuleTable, defaults: ParamTable) -> Self {
        let mut parser = Self::new(rules);
        parser.defaults = defaults;
        parser
    }

    pub fn with_preferences(rules: RuleTable, preferences: ParserPreferences) -> Self {
        log_debug!("Creating rule engine",
            "flavour" => rules.flavour(),
            "default_rule" => rules.default_rule()
        );

        Self {
            rules,
            defaults: ParamTable::new(),
            live: None,
            stack: Vec::new(),
            groups: None,
            next_frame_id: 1,
            parsing: false,
            input: String::new(),
            diagnosis: None,
            preferences,
        }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn flavour(&self) -> &'static str {
        self.rules.flavour()
    }

    pub fn preferences(&self) -> &ParserPreferences {
        &self.preferences
    }

    pub fn set_preferences(&mut self, preferences: ParserPreferences) {
        self.preferences = preferences;
    }

    pub fn is_parsing(&self) -> bool {
        self.parsing
    }

    /// Input of the current (or most recent) parse
    pub fn input(&self) -> &str {
        &self.input
    }

    // ========================================================================
    // ENTRY POINTS
    // ========================================================================

    /// Translate a query with the grammar's default rule
    pub fn parse(&mut self, input: &str) -> Result<String, ParseError> {
        let rule = self.rules.default_rule();
        self.parse_rule(input, rule)
    }

    /// Translate input using a specific rule as the entry point
    pub fn parse_rule(&mut self, input: &str, rule: Rule) -> Result<String, ParseError> {
        if self.parsing {
            return Err(ParseError::Reentrancy);
        }

        self.parsing = true;
        self.reset(input);

        let outcome = crate::logging::with_query_context(input, || {
            log_debug!("Parsing query",
                "rule" => rule,
                "length" => input.len(),
                "flavour" => self.rules.flavour()
            );

            match self.run(rule, input) {
                Ok(fragment) => {
                    let cqp = fragment.into_code();
                    if self.preferences.log_translations {
                        log_success!(codes::success::QUERY_TRANSLATED, "Query translated",
                            "rule" => rule,
                            "cqp" => cqp
                        );
                    }
                    Ok(cqp)
                }
                Err(error) => {
                    let diagnosis = Diagnosis::new(error.clone(), &self.stack);
                    log_error!(error.error_code(), "Query translation failed",
                        "rule" => rule,
                        "error" => error.flattened_message(),
                        "trace_lines" => diagnosis.lines.len()
                    );
                    self.diagnosis = Some(diagnosis);
                    Err(error)
                }
            }
        });

        self.live = None;
        self.groups = None;
        self.stack.clear();
        self.parsing = false;

        outcome
    }

    fn reset(&mut self, input: &str) {
        self.live = Some(self.defaults.clone());
        self.stack.clear();
        self.groups = None;
        self.next_frame_id = 1;
        self.input = input.to_string();
        self.diagnosis = None;
    }

    fn run(&mut self, rule: Rule, input: &str) -> RuleResult<Fragment> {
        if input.len() > MAX_QUERY_LENGTH {
            return Err(ParseError::QueryTooLong {
                length: input.len(),
                limit: MAX_QUERY_LENGTH,
            });
        }
        self.call(rule, input)
    }

    // ========================================================================
    // RULE INVOCATION
    // ========================================================================

    fn lookup(&self, rule: Rule) -> RuleResult<RuleFn> {
        self.rules.lookup(rule).ok_or_else(|| {
            log_error!(codes::engine::UNKNOWN_RULE, "Grammar has no handler for rule",
                "rule" => rule,
                "flavour" => self.rules.flavour()
            );
            ParseError::UnknownRule {
                rule: rule.to_string(),
            }
        })
    }

    /// Run a rule on an input substring
    pub fn call(&mut self, rule: Rule, input: &str) -> RuleResult<Fragment> {
        let handler = self.lookup(rule)?;
        self.invoke(rule, handler, input)
    }

    /// Run the base handler of a rule, bypassing any override
    pub fn call_base(&mut self, rule: Rule, input: &str) -> RuleResult<Fragment> {
        let handler = self.rules.base(rule).ok_or_else(|| ParseError::UnknownRule {
            rule: rule.to_string(),
        })?;
        self.invoke(rule, handler, input)
    }

    /// Run a rule and return its code as a string
    pub fn call_code(&mut self, rule: Rule, input: &str) -> RuleResult<String> {
        Ok(self.call(rule, input)?.into_code())
    }

    /// Attempt a rule, rolling back all parser state if it fails
    pub fn try_call(&mut self, rule: Rule, input: &str) -> Option<Fragment> {
        let checkpoint = self.save_checkpoint();
        match self.call(rule, input) {
            Ok(fragment) => Some(fragment),
            Err(error) => {
                log_debug!("Rule attempt failed, restoring checkpoint",
                    "rule" => rule,
                    "error" => error.flattened_message()
                );
                self.restore_checkpoint(checkpoint);
                None
            }
        }
    }

    fn invoke(&mut self, rule: Rule, handler: RuleFn, input: &str) -> RuleResult<Fragment> {
        self.check_depth()?;
        let id = self.push_frame(|id| ParseFrame::call(id, rule, input));

        if self.preferences.trace_rule_calls {
            log_debug!("Rule call",
                "rule" => rule,
                "input" => input,
                "depth" => self.stack.len()
            );
        }

        let fragment = handler(self, input)?.ok_or_else(|| ParseError::EmptyResult {
            rule: rule.to_string(),
        })?;

        self.pop_frame(id, rule)?;
        Ok(fragment)
    }

    /// Apply a rule to each item in turn, collecting non-empty results
    ///
    /// The rule runs with a fresh group stack; every group it opens must be closed by the
    /// time the items are exhausted.
    pub fn apply(&mut self, rule: Rule, items: Vec<String>) -> RuleResult<Vec<Fragment>> {
        let handler = self.lookup(rule)?;
        self.check_depth()?;
        let id = self.push_frame(|id| ParseFrame::apply(id, rule, items));
        let index = self.stack.len() - 1;
        let saved_groups = self.groups.replace(GroupStack::new());

        loop {
            let next = match self.stack.get_mut(index).and_then(|f| f.progress.as_mut()) {
                Some(progress) => progress.advance(),
                None => {
                    return Err(ParseError::StackCorruption {
                        rule: rule.to_string(),
                        expected: id,
                        found: self.stack.get(index).map(|f| f.id).unwrap_or(0),
                    })
                }
            };
            let Some(item) = next else {
                break;
            };

            let fragment = self.invoke(rule, handler, &item)?;
            if !fragment.is_empty() {
                self.current_groups("apply")?.push(fragment);
            }
        }

        let groups = self
            .groups
            .take()
            .ok_or_else(|| ParseError::NotInApplyContext {
                operation: "apply".to_string(),
            })?;
        let results = groups.finish()?;

        self.pop_frame(id, rule)?;
        self.groups = saved_groups;
        Ok(results)
    }

    fn check_depth(&self) -> RuleResult<()> {
        if self.stack.len() >= MAX_CALL_DEPTH {
            return Err(ParseError::MaxCallDepth {
                limit: MAX_CALL_DEPTH,
            });
        }
        Ok(())
    }

    fn push_frame<F>(&mut self, make: F) -> u64
    where
        F: FnOnce(u64) -> ParseFrame,
    {
        let id = self.next_frame_id;
        self.next_frame_id += 1;
        self.stack.push(make(id));
        id
    }

    fn pop_frame(&mut self, id: u64, rule: Rule) -> RuleResult<()> {
        match self.stack.pop() {
            Some(frame) if frame.id == id => Ok(()),
            other => {
                let found = other.as_ref().map(|frame| frame.id).unwrap_or(0);
                log_error!(codes::engine::STACK_CORRUPTION, "Call stack corrupted",
                    "rule" => rule,
                    "expected" => id,
                    "found" => found
                );
                if let Some(frame) = other {
                    self.stack.push(frame);
                }
                Err(ParseError::StackCorruption {
                    rule: rule.to_string(),
                    expected: id,
                    found,
                })
            }
        }
    }

    // ========================================================================
    // BACKTRACKING SUPPORT
    // ========================================================================

    /// Save current parser state
    pub fn save_checkpoint(&self) -> ParserCheckpoint {
        ParserCheckpoint {
            params: self.active_params().clone(),
            stack_depth: self.stack.len(),
            groups: self.groups.clone(),
        }
    }

    /// Restore parser state from checkpoint
    pub fn restore_checkpoint(&mut self, checkpoint: ParserCheckpoint) {
        *self.active_params_mut() = checkpoint.params;
        self.stack.truncate(checkpoint.stack_depth);
        self.groups = checkpoint.groups;
    }

    // ========================================================================
    // GROUP OPERATIONS
    // ========================================================================

    fn current_groups(&mut self, operation: &str) -> RuleResult<&mut GroupStack> {
        self.groups
            .as_mut()
            .ok_or_else(|| ParseError::NotInApplyContext {
                operation: operation.to_string(),
            })
    }

    /// Open a named group in the current Apply
    pub fn begin_group(&mut self, name: &str) -> RuleResult<()> {
        self.current_groups("begin_group")?.begin(name)
    }

    /// Close the innermost group and return its accumulated results
    pub fn end_group(&mut self, name: &str) -> RuleResult<Vec<Fragment>> {
        self.current_groups("end_group")?.end(name)
    }

    /// Number of groups currently open in the current Apply
    pub fn nesting_level(&self) -> RuleResult<usize> {
        self.groups
            .as_ref()
            .map(GroupStack::nesting_level)
            .ok_or_else(|| ParseError::NotInApplyContext {
                operation: "nesting_level".to_string(),
            })
    }

    /// Results accumulated so far in the innermost group
    pub fn group_items(&self) -> RuleResult<&[Fragment]> {
        self.groups
            .as_ref()
            .map(GroupStack::top)
            .ok_or_else(|| ParseError::NotInApplyContext {
                operation: "group_items".to_string(),
            })
    }

    /// Take the results of the innermost group, leaving it open and empty
    pub fn drain_group_items(&mut self) -> RuleResult<Vec<Fragment>> {
        Ok(self.current_groups("drain_group_items")?.drain_top())
    }

    // ========================================================================
    // PARAMETERS
    // ========================================================================

    fn active_params(&self) -> &ParamTable {
        self.live.as_ref().unwrap_or(&self.defaults)
    }

    fn active_params_mut(&mut self) -> &mut ParamTable {
        match self.live.as_mut() {
            Some(live) => live,
            None => &mut self.defaults,
        }
    }

    /// Declare a parameter (a default outside a parse, a parse-local one during a parse)
    pub fn new_param(&mut self, name: &str, value: ParamValue) -> RuleResult<()> {
        self.active_params_mut().declare(name, value)
    }

    pub fn set_param(&mut self, name: &str, value: ParamValue) -> RuleResult<()> {
        self.active_params_mut().set(name, value)
    }

    pub fn get_param(&self, name: &str) -> RuleResult<&ParamValue> {
        self.active_params().get(name)
    }

    pub fn declared_params(&self) -> Vec<&str> {
        self.active_params().names()
    }

    /// String parameter; unset or empty reads as `None`
    pub fn param_text(&self, name: &str) -> RuleResult<Option<String>> {
        match self.get_param(name)? {
            ParamValue::Unset => Ok(None),
            ParamValue::Text(value) if value.is_empty() => Ok(None),
            ParamValue::Text(value) => Ok(Some(value.clone())),
            _ => Err(ParseError::parameter_type(name, "a string")),
        }
    }

    /// Boolean parameter; unset reads as `false`
    pub fn param_bool(&self, name: &str) -> RuleResult<bool> {
        match self.get_param(name)? {
            ParamValue::Unset => Ok(false),
            ParamValue::Bool(value) => Ok(*value),
            _ => Err(ParseError::parameter_type(name, "a boolean")),
        }
    }

    /// Lookup-table parameter; unset or empty reads as `None`
    pub fn param_map(&self, name: &str) -> RuleResult<Option<BTreeMap<String, String>>> {
        match self.get_param(name)? {
            ParamValue::Unset => Ok(None),
            ParamValue::Map(map) if map.is_empty() => Ok(None),
            ParamValue::Map(map) => Ok(Some(map.clone())),
            _ => Err(ParseError::parameter_type(name, "a lookup table")),
        }
    }

    /// Name-set parameter; unset reads as empty
    pub fn param_set(&self, name: &str) -> RuleResult<BTreeSet<String>> {
        match self.get_param(name)? {
            ParamValue::Unset => Ok(BTreeSet::new()),
            ParamValue::Set(names) => Ok(names.clone()),
            _ => Err(ParseError::parameter_type(name, "a name set")),
        }
    }

    // ========================================================================
    // DIAGNOSTICS
    // ========================================================================

    /// Error and call trace of the last failed parse (empty after a success)
    pub fn error_message(&self) -> &[String] {
        self.diagnosis
            .as_ref()
            .map(|diagnosis| diagnosis.lines.as_slice())
            .unwrap_or(&[])
    }

    /// The diagnostic lines rendered as an HTML fragment
    pub fn html_error_message(&self) -> String {
        self.diagnosis
            .as_ref()
            .map(Diagnosis::to_html)
            .unwrap_or_default()
    }

    pub fn last_error(&self) -> Option<&ParseError> {
        self.diagnosis.as_ref().map(|diagnosis| &diagnosis.error)
    }

    pub fn diagnosis(&self) -> Option<&Diagnosis> {
        self.diagnosis.as_ref()
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("rules", &self.rules)
            .field("parsing", &self.parsing)
            .field("params", &self.active_params().names())
            .field("stack_depth", &self.stack.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // Small test grammar: a sequence of letters and brackets, echoed back.

    fn echo(p: &mut Parser, input: &str) -> RuleResult<Option<Fragment>> {
        let items = input.split_whitespace().map(str::to_string).collect();
        let results = p.apply(Rule::PhraseElement, items)?;
        let codes: Vec<String> = results.into_iter().map(Fragment::into_code).collect();
        Ok(Some(Fragment::text(codes.join(" "))))
    }

    fn element(p: &mut Parser, input: &str) -> RuleResult<Option<Fragment>> {
        match input {
            "(" => {
                p.begin_group("(")?;
                Ok(Some(Fragment::Empty))
            }
            ")" => {
                let items = p.end_group("(")?;
                let inner: Vec<&str> = items.iter().map(Fragment::code).collect();
                Ok(Some(Fragment::text(format!("({})", inner.join(" ")))))
            }
            "[" => {
                p.begin_group("[")?;
                Ok(Some(Fragment::Empty))
            }
            "]" => {
                p.end_group("]")?;
                Ok(Some(Fragment::Empty))
            }
            "depth" => Ok(Some(Fragment::text(p.nesting_level()?.to_string()))),
            "nothing" => Ok(None),
            "fail" => Err(ParseError::EmptyPattern),
            "corrupt" => {
                p.stack.push(ParseFrame::call(999, Rule::XmlTag, "corrupt"));
                Ok(Some(Fragment::text("x")))
            }
            "reenter" => {
                p.parse("x")?;
                Ok(Some(Fragment::text("x")))
            }
            "setparam" => {
                p.set_param("flag", ParamValue::Bool(true))?;
                Ok(Some(Fragment::text("set")))
            }
            "try" => {
                let attempt = p.try_call(Rule::XmlTag, "anything");
                let flag = p.param_bool("flag")?;
                Ok(Some(Fragment::text(format!("{} {}", attempt.is_some(), flag))))
            }
            other => Ok(Some(Fragment::text(other.to_uppercase()))),
        }
    }

    fn failing_with_side_effects(p: &mut Parser, _: &str) -> RuleResult<Option<Fragment>> {
        p.set_param("flag", ParamValue::Bool(true))?;
        p.begin_group("(")?;
        Err(ParseError::NoTagsAllowed)
    }

    fn test_parser() -> Parser {
        let mut table = RuleTable::new("test", Rule::CeqlQuery);
        table
            .register(Rule::CeqlQuery, echo)
            .register(Rule::PhraseElement, element)
            .register(Rule::XmlTag, failing_with_side_effects);
        let mut parser = Parser::new(table);
        parser.new_param("flag", ParamValue::Bool(false)).unwrap();
        parser
    }

    #[test]
    fn test_parse_echo() {
        let mut parser = test_parser();
        assert_eq!(parser.parse("a ( b c ) d").unwrap(), "A (B C) D");
        assert!(parser.error_message().is_empty());
        assert!(!parser.is_parsing());
    }

    #[test]
    fn test_nesting_level() {
        let mut parser = test_parser();
        assert_eq!(parser.parse("depth ( depth ( depth ) )").unwrap(), "0 (1 (2))");
    }

    #[test]
    fn test_too_many_opening() {
        let mut parser = test_parser();
        let error = parser.parse("( a").unwrap_err();

        assert_matches!(
            error,
            ParseError::UnbalancedGrouping {
                imbalance: Imbalance::TooManyOpening
            }
        );
        assert!(parser.error_message()[0].contains("too many opening delimiters"));
    }

    #[test]
    fn test_too_many_closing() {
        let mut parser = test_parser();
        assert_matches!(
            parser.parse("a )"),
            Err(ParseError::UnbalancedGrouping {
                imbalance: Imbalance::TooManyClosing
            })
        );
    }

    #[test]
    fn test_mismatched_group() {
        let mut parser = test_parser();
        assert_matches!(
            parser.parse("[ a ]"),
            Err(ParseError::MismatchedGroup { .. })
        );
    }

    #[test]
    fn test_empty_result_detected() {
        let mut parser = test_parser();
        assert_matches!(
            parser.parse("a nothing"),
            Err(ParseError::EmptyResult { rule }) if rule == "phrase_element"
        );
    }

    #[test]
    fn test_unknown_rule() {
        let mut parser = test_parser();
        assert_matches!(
            parser.parse_rule("x", Rule::WildcardItem),
            Err(ParseError::UnknownRule { rule }) if rule == "wildcard_item"
        );
    }

    #[test]
    fn test_stack_corruption_detected() {
        let mut parser = test_parser();
        let error = parser.parse("corrupt").unwrap_err();

        assert_matches!(error, ParseError::StackCorruption { expected: 3, found: 999, .. });
        assert!(error.is_internal());
    }

    #[test]
    fn test_reentrancy_rejected() {
        let mut parser = test_parser();
        assert_matches!(parser.parse("reenter"), Err(ParseError::Reentrancy));
        assert!(!parser.is_parsing());
        assert_eq!(parser.parse("ok").unwrap(), "OK");
    }

    #[test]
    fn test_group_operations_outside_apply() {
        let mut parser = test_parser();
        assert_matches!(
            parser.begin_group("("),
            Err(ParseError::NotInApplyContext { .. })
        );
        assert_matches!(
            parser.end_group("("),
            Err(ParseError::NotInApplyContext { .. })
        );
        assert_matches!(
            parser.nesting_level(),
            Err(ParseError::NotInApplyContext { .. })
        );
    }

    #[test]
    fn test_try_call_restores_state() {
        let mut parser = test_parser();
        assert_eq!(parser.parse("try depth").unwrap(), "false false 0");
    }

    #[test]
    fn test_live_params_do_not_leak() {
        let mut parser = test_parser();
        assert_eq!(parser.parse("setparam").unwrap(), "set");
        assert_eq!(parser.param_bool("flag").unwrap(), false);
    }

    #[test]
    fn test_param_declaration_errors() {
        let mut parser = test_parser();
        assert_matches!(
            parser.new_param("flag", ParamValue::Unset),
            Err(ParseError::DuplicateParameter { .. })
        );
        assert_matches!(
            parser.get_param("missing"),
            Err(ParseError::UndeclaredParameter { .. })
        );
        assert_matches!(
            parser.param_text("flag"),
            Err(ParseError::ParameterType { .. })
        );
    }

    #[test]
    fn test_failure_trace() {
        let mut parser = test_parser();
        parser.parse("a fail b").unwrap_err();
        let lines = parser.error_message();

        assert_eq!(lines[0], "Empty wildcard pattern is not allowed");
        assert_eq!(lines[1], "when parsing 'fail' as **phrase_element**");
        assert_eq!(
            lines[2],
            "when applying **phrase_element** at position: a fail ^^ b"
        );
        assert_eq!(lines[3], "when parsing 'a fail b' as **ceql_query**");
        assert!(parser.html_error_message().contains("<b>phrase_element</b>"));
        assert_matches!(parser.last_error(), Some(ParseError::EmptyPattern));
    }

    #[test]
    fn test_diagnosis_cleared_by_next_parse() {
        let mut parser = test_parser();
        parser.parse("fail").unwrap_err();
        assert!(!parser.error_message().is_empty());

        parser.parse("fine").unwrap();
        assert!(parser.error_message().is_empty());
        assert!(parser.last_error().is_none());
    }

    #[test]
    fn test_query_too_long() {
        let mut parser = test_parser();
        let input = "a ".repeat(MAX_QUERY_LENGTH);
        assert_matches!(parser.parse(&input), Err(ParseError::QueryTooLong { .. }));
    }
}
