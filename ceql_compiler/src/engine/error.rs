//! Error types for the rule engine and CEQL grammar
//!
//! Every rule-level failure is one `ParseError` variant. Variants map to stable codes in the
//! logging registry so hosts can classify a rejected query without matching on message text.

use crate::logging::{codes, Code};

pub type RuleResult<T> = Result<T, ParseError>;

/// Which side of a group stack imbalance was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Imbalance {
    /// Groups still open when an Apply finished
    TooManyOpening,
    /// A close was requested with no open group
    TooManyClosing,
    /// More groups open at once than the nesting limit allows
    TooDeeplyNested { limit: usize },
}

impl std::fmt::Display for Imbalance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Imbalance::TooManyOpening => write!(f, "too many opening delimiters"),
            Imbalance::TooManyClosing => write!(f, "too many closing delimiters"),
            Imbalance::TooDeeplyNested { limit } => {
                write!(f, "more than {} nested groups", limit)
            }
        }
    }
}

/// Query compilation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    // ------------------------------------------------------------------
    // Engine invariants
    // ------------------------------------------------------------------
    #[error("Parser is not reentrant: a parse is already active on this instance")]
    Reentrancy,

    #[error("Internal error: no grammar rule named '{rule}'")]
    UnknownRule { rule: String },

    #[error("Internal error: rule '{rule}' returned no result")]
    EmptyResult { rule: String },

    #[error("Internal error: call stack corrupted (expected frame #{expected} for rule '{rule}', found #{found})")]
    StackCorruption {
        rule: String,
        expected: u64,
        found: u64,
    },

    #[error("Internal error: {operation} called outside of a rule application")]
    NotInApplyContext { operation: String },

    #[error("Internal error: grammar parameter '{name}' has not been declared")]
    UndeclaredParameter { name: String },

    #[error("Internal error: grammar parameter '{name}' is already declared")]
    DuplicateParameter { name: String },

    #[error("Internal error: grammar parameter '{name}' should be {expected}")]
    ParameterType { name: String, expected: String },

    #[error("Internal error: proximity query did not reduce to a single term ({shape})")]
    InternalShiftReduce { shape: String },

    #[error("Internal error: {pending} pending results in proximity expression (at most 2 allowed)")]
    InternalState { pending: usize },

    #[error("Internal error: cannot combine {shape} in proximity expression (expected term, operator, term)")]
    InvalidReduceState { shape: String },

    #[error("Query is too deeply nested (more than {limit} rule levels)")]
    MaxCallDepth { limit: usize },

    // ------------------------------------------------------------------
    // Grammar violations
    // ------------------------------------------------------------------
    #[error("Bracketing is not balanced: {imbalance}")]
    UnbalancedGrouping { imbalance: Imbalance },

    #[error("Opening delimiter {opened} is closed by {closed}")]
    MismatchedGroup { opened: String, closed: String },

    #[error("Invalid query modifier (?{modifier}): use (?longest), (?shortest), (?standard) or (?traditional)")]
    InvalidModifier { modifier: String },

    #[error("Alternatives separator '{separator}' may only be used inside a group")]
    AlternationOutsideGroup { separator: String },

    #[error("Empty group {delimiters} is not allowed")]
    EmptyGroup { delimiters: String },

    #[error("Empty alternative in group {group} is not allowed (remove the superfluous '|')")]
    EmptyAlternative { group: String },

    #[error("Invalid quantifier '{quantifier}' after closing parenthesis: use ?, *, + or {{m,n}}")]
    InvalidQuantifier { quantifier: String },

    #[error("Invalid XML tag {tag}: use <name>, <name=value> or </name>")]
    InvalidTagSyntax { tag: String },

    #[error("Proximity query must not end with a distance operator (distance {operator})")]
    IncompleteProximity { operator: String },

    #[error("Distance operator {operator} must appear between two terms")]
    DistanceOperatorPosition { operator: String },

    #[error("Term '{term}' must be separated from the preceding term by a distance operator")]
    TermPosition { term: String },

    #[error("Token skip '{skip}' is not allowed in a proximity query (use a distance operator instead)")]
    SkipNotAllowedInProximity { skip: String },

    #[error("Invalid distance range in {operator}: {reason}")]
    InvalidRange { operator: String, reason: String },

    #[error("Structural distance {operator} must be written in the two-sided form <<{region}>>")]
    StructuralDistanceMustBeTwoSided { operator: String, region: String },

    #[error("Invalid distance operator {operator}: use <<n>>, >>m,n>>, <<m,n<< or <<region>>")]
    InvalidDistance { operator: String },

    #[error("More than one '_' separator in '{expression}' (use '\\_' to match a literal underscore)")]
    MultipleSeparators { expression: String },

    #[error("Token expression '{expression}' must specify a word form, lemma or tag")]
    EmptyTokenExpression { expression: String },

    #[error("Invalid flag '{flag}' in :{flags} (use c, C, d or D)")]
    InvalidFlag { flag: char, flags: String },

    #[error("Lone or unbalanced curly brace in '{expression}'")]
    UnbalancedBrace { expression: String },

    #[error("Invalid backslash escape in '{pattern}': {reason}")]
    InvalidEscape { pattern: String, reason: String },

    #[error("Empty wildcard pattern is not allowed")]
    EmptyPattern,

    #[error("Too many slashes in '{expression}': use {{headword/TAG}}")]
    TooManySlashes { expression: String },

    #[error("Missing headword in '{expression}'{hint}")]
    MissingHeadword { expression: String, hint: String },

    #[error("Query is too long ({length} bytes, maximum is {limit})")]
    QueryTooLong { length: usize, limit: usize },

    // ------------------------------------------------------------------
    // Configuration gaps
    // ------------------------------------------------------------------
    #[error("XML tags are not allowed in queries on this corpus")]
    NoTagsAllowed,

    #[error("Lemma search is not available for this corpus")]
    LemmaNotAvailable,

    #[error("Part-of-speech tags are not available for this corpus")]
    NoPosAttribute,

    #[error("Simple part-of-speech tags are not available for this corpus")]
    SimplePosNotAvailable,

    #[error("Combined lemma and simple POS search is not available for this corpus ({reason})")]
    ComboSearchNotAvailable { reason: String },

    // ------------------------------------------------------------------
    // Unknown values
    // ------------------------------------------------------------------
    #[error("XML tag <{tag}> is not allowed: use one of {allowed}")]
    DisallowedTag { tag: String, allowed: String },

    #[error("Unknown structural distance <<{region}>>: use one of {allowed}")]
    UnknownStructuralDistance { region: String, allowed: String },

    #[error("Unknown simple POS tag {{{tag}}}: use one of {allowed}")]
    UnknownSimplePosTag { tag: String, allowed: String },
}

impl ParseError {
    /// Create an unbalanced grouping error
    pub fn unbalanced(imbalance: Imbalance) -> Self {
        Self::UnbalancedGrouping { imbalance }
    }

    /// Create an error for a group closed by the wrong delimiter
    pub fn mismatched_group(opened: &str, closed: &str) -> Self {
        Self::MismatchedGroup {
            opened: opened.to_string(),
            closed: closed.to_string(),
        }
    }

    /// Create a parameter type error
    pub fn parameter_type(name: &str, expected: &str) -> Self {
        Self::ParameterType {
            name: name.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Create an invalid range error
    pub fn invalid_range(operator: &str, reason: &str) -> Self {
        Self::InvalidRange {
            operator: operator.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid escape error
    pub fn invalid_escape(pattern: &str, reason: &str) -> Self {
        Self::InvalidEscape {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Get error code for global logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::Reentrancy => codes::engine::REENTRANT_PARSE,
            Self::UnknownRule { .. } => codes::engine::UNKNOWN_RULE,
            Self::EmptyResult { .. } => codes::engine::EMPTY_RESULT,
            Self::StackCorruption { .. } => codes::engine::STACK_CORRUPTION,
            Self::NotInApplyContext { .. } => codes::engine::NOT_IN_APPLY_CONTEXT,
            Self::UndeclaredParameter { .. } => codes::engine::UNDECLARED_PARAMETER,
            Self::DuplicateParameter { .. } => codes::engine::DUPLICATE_PARAMETER,
            Self::ParameterType { .. } => codes::engine::PARAMETER_TYPE,
            Self::InternalShiftReduce { .. }
            | Self::InternalState { .. }
            | Self::InvalidReduceState { .. } => codes::engine::SHIFT_REDUCE_STATE,
            Self::MaxCallDepth { .. } => codes::engine::MAX_CALL_DEPTH,

            Self::UnbalancedGrouping { .. } => codes::grammar::UNBALANCED_GROUPING,
            Self::MismatchedGroup { .. } => codes::grammar::MISMATCHED_GROUP,
            Self::InvalidModifier { .. } => codes::grammar::INVALID_MODIFIER,
            Self::AlternationOutsideGroup { .. } => codes::grammar::ALTERNATION_OUTSIDE_GROUP,
            Self::EmptyGroup { .. } => codes::grammar::EMPTY_GROUP,
            Self::EmptyAlternative { .. } => codes::grammar::EMPTY_ALTERNATIVE,
            Self::InvalidQuantifier { .. } => codes::grammar::INVALID_QUANTIFIER,
            Self::InvalidTagSyntax { .. } => codes::grammar::INVALID_TAG_SYNTAX,
            Self::IncompleteProximity { .. } => codes::grammar::INCOMPLETE_PROXIMITY,
            Self::DistanceOperatorPosition { .. } | Self::TermPosition { .. } => {
                codes::grammar::OPERATOR_POSITION
            }
            Self::SkipNotAllowedInProximity { .. } => codes::grammar::SKIP_IN_PROXIMITY,
            Self::InvalidRange { .. } => codes::grammar::INVALID_RANGE,
            Self::StructuralDistanceMustBeTwoSided { .. } => {
                codes::grammar::STRUCTURAL_DISTANCE_SHAPE
            }
            Self::InvalidDistance { .. } => codes::grammar::INVALID_DISTANCE,
            Self::MultipleSeparators { .. } => codes::grammar::MULTIPLE_SEPARATORS,
            Self::EmptyTokenExpression { .. } => codes::grammar::EMPTY_TOKEN_EXPRESSION,
            Self::InvalidFlag { .. } => codes::grammar::INVALID_FLAG,
            Self::UnbalancedBrace { .. } => codes::grammar::UNBALANCED_BRACE,
            Self::InvalidEscape { .. } => codes::grammar::INVALID_ESCAPE,
            Self::EmptyPattern => codes::grammar::EMPTY_PATTERN,
            Self::TooManySlashes { .. } => codes::grammar::TOO_MANY_SLASHES,
            Self::MissingHeadword { .. } => codes::grammar::MISSING_HEADWORD,
            Self::QueryTooLong { .. } => codes::grammar::QUERY_TOO_LONG,

            Self::NoTagsAllowed => codes::availability::NO_TAGS_ALLOWED,
            Self::LemmaNotAvailable => codes::availability::LEMMA_NOT_AVAILABLE,
            Self::NoPosAttribute => codes::availability::NO_POS_ATTRIBUTE,
            Self::SimplePosNotAvailable => codes::availability::SIMPLE_POS_NOT_AVAILABLE,
            Self::ComboSearchNotAvailable { .. } => codes::availability::COMBO_SEARCH_NOT_AVAILABLE,

            Self::DisallowedTag { .. } => codes::values::DISALLOWED_TAG,
            Self::UnknownStructuralDistance { .. } => codes::values::UNKNOWN_STRUCTURAL_DISTANCE,
            Self::UnknownSimplePosTag { .. } => codes::values::UNKNOWN_SIMPLE_POS_TAG,
        }
    }

    /// Check whether the error signals a bug in the engine or grammar rather than bad input
    pub fn is_internal(&self) -> bool {
        self.category() == "Engine" && !matches!(self, Self::MaxCallDepth { .. })
    }

    /// Check if this error requires halting
    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.error_code().as_str())
    }

    /// Get error severity
    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.error_code().as_str()).as_str()
    }

    /// Get error category
    pub fn category(&self) -> &'static str {
        codes::get_category(self.error_code().as_str())
    }

    /// Get error description
    pub fn description(&self) -> &'static str {
        codes::get_description(self.error_code().as_str())
    }

    /// Get recommended action
    pub fn recommended_action(&self) -> &'static str {
        codes::get_action(self.error_code().as_str())
    }

    /// Error text on a single line, newlines replaced by a visible separator
    pub fn flattened_message(&self) -> String {
        self.to_string()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" // ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_follow_taxonomy() {
        assert_eq!(ParseError::Reentrancy.error_code().as_str(), "Q001");
        assert_eq!(
            ParseError::unbalanced(Imbalance::TooManyOpening)
                .error_code()
                .as_str(),
            "Q100"
        );
        assert_eq!(ParseError::LemmaNotAvailable.error_code().as_str(), "Q201");
        assert_eq!(
            ParseError::UnknownSimplePosTag {
                tag: "X".into(),
                allowed: "N, V".into()
            }
            .error_code()
            .as_str(),
            "Q302"
        );
    }

    #[test]
    fn test_unbalanced_messages_name_the_side() {
        let opening = ParseError::unbalanced(Imbalance::TooManyOpening).to_string();
        let closing = ParseError::unbalanced(Imbalance::TooManyClosing).to_string();

        assert!(opening.contains("too many opening delimiters"));
        assert!(closing.contains("too many closing delimiters"));
    }

    #[test]
    fn test_internal_classification() {
        assert!(ParseError::StackCorruption {
            rule: "x".into(),
            expected: 1,
            found: 2
        }
        .is_internal());
        assert!(ParseError::InternalState { pending: 3 }.is_internal());
        assert!(!ParseError::MaxCallDepth { limit: 10 }.is_internal());
        assert!(!ParseError::EmptyPattern.is_internal());
        assert_eq!(ParseError::NoTagsAllowed.category(), "Availability");
    }

    #[test]
    fn test_flattened_message() {
        let error = ParseError::MissingHeadword {
            expression: "/N".into(),
            hint: "\nDid you mean _{N}?".into(),
        };
        let flat = error.flattened_message();

        assert!(!flat.contains('\n'));
        assert!(flat.contains(" // Did you mean _{N}?"));
    }

    #[test]
    fn test_brace_formatting_in_messages() {
        let error = ParseError::UnknownSimplePosTag {
            tag: "ADJ".into(),
            allowed: "N, V".into(),
        };
        assert_eq!(
            error.to_string(),
            "Unknown simple POS tag {ADJ}: use one of N, V"
        );
    }
}
