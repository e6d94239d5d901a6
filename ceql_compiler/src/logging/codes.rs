//! Diagnostic codes and their registered metadata
//!
//! Query-level codes follow the error taxonomy of the compiler:
//! `Q0xx` engine invariants, `Q1xx` grammar violations, `Q2xx` configuration gaps,
//! `Q3xx` unknown values. `C0xx` covers corpus configuration loading, `ERR0xx` the host
//! process and `I0xx` successful operations.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Error or success code, e.g. `Q104`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Registered metadata, if any
    pub fn metadata(&self) -> Option<&'static ErrorMetadata> {
        get_error_metadata(self.0)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Severity::Critical, Severity::High, Severity::Medium, Severity::Low]
            .into_iter()
            .find(|severity| severity.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown severity '{}'", s))
    }
}

/// What the registry knows about one code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: Code,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    /// Unrecoverable codes stop the host rather than the single query
    pub fn requires_halt(&self) -> bool {
        !self.recoverable
    }
}

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

/// Corpus configuration loading error codes
pub mod config {
    use super::Code;

    pub const CONFIG_READ_ERROR: Code = Code::new("C001");
    pub const CONFIG_FORMAT_ERROR: Code = Code::new("C002");
    pub const CONFIG_VALUE_ERROR: Code = Code::new("C003");
}

/// Rule engine invariant codes (bugs in the engine or grammar, not in user input)
pub mod engine {
    use super::Code;

    pub const REENTRANT_PARSE: Code = Code::new("Q001");
    pub const UNKNOWN_RULE: Code = Code::new("Q002");
    pub const EMPTY_RESULT: Code = Code::new("Q003");
    pub const STACK_CORRUPTION: Code = Code::new("Q004");
    pub const NOT_IN_APPLY_CONTEXT: Code = Code::new("Q005");
    pub const UNDECLARED_PARAMETER: Code = Code::new("Q006");
    pub const DUPLICATE_PARAMETER: Code = Code::new("Q007");
    pub const SHIFT_REDUCE_STATE: Code = Code::new("Q008");
    pub const MAX_CALL_DEPTH: Code = Code::new("Q009");
    pub const PARAMETER_TYPE: Code = Code::new("Q010");
}

/// Grammar violation codes
pub mod grammar {
    use super::Code;

    pub const UNBALANCED_GROUPING: Code = Code::new("Q100");
    pub const MISMATCHED_GROUP: Code = Code::new("Q101");
    pub const INVALID_MODIFIER: Code = Code::new("Q102");
    pub const ALTERNATION_OUTSIDE_GROUP: Code = Code::new("Q103");
    pub const EMPTY_GROUP: Code = Code::new("Q104");
    pub const EMPTY_ALTERNATIVE: Code = Code::new("Q105");
    pub const INVALID_QUANTIFIER: Code = Code::new("Q106");
    pub const INVALID_TAG_SYNTAX: Code = Code::new("Q107");
    pub const INCOMPLETE_PROXIMITY: Code = Code::new("Q108");
    pub const OPERATOR_POSITION: Code = Code::new("Q109");
    pub const SKIP_IN_PROXIMITY: Code = Code::new("Q110");
    pub const INVALID_RANGE: Code = Code::new("Q111");
    pub const STRUCTURAL_DISTANCE_SHAPE: Code = Code::new("Q112");
    pub const INVALID_DISTANCE: Code = Code::new("Q113");
    pub const MULTIPLE_SEPARATORS: Code = Code::new("Q114");
    pub const EMPTY_TOKEN_EXPRESSION: Code = Code::new("Q115");
    pub const INVALID_FLAG: Code = Code::new("Q116");
    pub const UNBALANCED_BRACE: Code = Code::new("Q117");
    pub const INVALID_ESCAPE: Code = Code::new("Q118");
    pub const EMPTY_PATTERN: Code = Code::new("Q119");
    pub const TOO_MANY_SLASHES: Code = Code::new("Q120");
    pub const MISSING_HEADWORD: Code = Code::new("Q121");
    pub const QUERY_TOO_LONG: Code = Code::new("Q122");
}

/// Configuration-gap codes: the query uses a feature the corpus does not support
pub mod availability {
    use super::Code;

    pub const NO_TAGS_ALLOWED: Code = Code::new("Q200");
    pub const LEMMA_NOT_AVAILABLE: Code = Code::new("Q201");
    pub const NO_POS_ATTRIBUTE: Code = Code::new("Q202");
    pub const SIMPLE_POS_NOT_AVAILABLE: Code = Code::new("Q203");
    pub const COMBO_SEARCH_NOT_AVAILABLE: Code = Code::new("Q204");
}

/// Unknown-value codes: a name is not found in its configured table
pub mod values {
    use super::Code;

    pub const DISALLOWED_TAG: Code = Code::new("Q300");
    pub const UNKNOWN_STRUCTURAL_DISTANCE: Code = Code::new("Q301");
    pub const UNKNOWN_SIMPLE_POS_TAG: Code = Code::new("Q302");
}

/// Success and informational codes
pub mod success {
    use super::Code;

    pub const OPERATION_COMPLETED_SUCCESSFULLY: Code = Code::new("I001");
    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");
    pub const QUERY_TRANSLATED: Code = Code::new("I010");
    pub const GRAMMAR_CONFIGURED: Code = Code::new("I011");
    pub const CONFIG_LOADED: Code = Code::new("I012");
}

/// `(code, severity, recoverable, description, recommended action)`
type Entry = (Code, Severity, bool, &'static str, &'static str);

const SYSTEM: &[Entry] = &[
    (
        system::INTERNAL_ERROR,
        Severity::Critical,
        false,
        "Critical internal system error",
        "File a bug report including the query text",
    ),
    (
        system::INITIALIZATION_FAILURE,
        Severity::Critical,
        false,
        "System initialization failure",
        "Check logging configuration and environment variables",
    ),
];

const CONFIGURATION: &[Entry] = &[
    (
        config::CONFIG_READ_ERROR,
        Severity::High,
        false,
        "Corpus grammar configuration could not be read",
        "Check the configuration file path and permissions",
    ),
    (
        config::CONFIG_FORMAT_ERROR,
        Severity::High,
        false,
        "Corpus grammar configuration is not valid TOML",
        "Fix the TOML syntax reported in the message",
    ),
    (
        config::CONFIG_VALUE_ERROR,
        Severity::High,
        false,
        "Corpus grammar configuration contains an unusable value",
        "Check attribute names and alias tables",
    ),
];

const ENGINE: &[Entry] = &[
    (
        engine::REENTRANT_PARSE,
        Severity::Critical,
        false,
        "Parse started while another parse is active on the same parser",
        "Use a separate parser instance per concurrent query",
    ),
    (
        engine::UNKNOWN_RULE,
        Severity::Critical,
        false,
        "Grammar has no handler for the requested rule",
        "Register the rule in the grammar rule table",
    ),
    (
        engine::EMPTY_RESULT,
        Severity::Critical,
        false,
        "Grammar rule returned no value",
        "Rules must return a fragment or raise an error",
    ),
    (
        engine::STACK_CORRUPTION,
        Severity::Critical,
        false,
        "Call stack corrupted: popped frame is not the one pushed",
        "File a bug report including the query text",
    ),
    (
        engine::NOT_IN_APPLY_CONTEXT,
        Severity::Critical,
        false,
        "Group operation used outside of a rule application",
        "Only call BeginGroup/EndGroup from rules run by Apply",
    ),
    (
        engine::UNDECLARED_PARAMETER,
        Severity::High,
        false,
        "Grammar parameter used before it was declared",
        "Declare the parameter with new_param before using it",
    ),
    (
        engine::DUPLICATE_PARAMETER,
        Severity::High,
        false,
        "Grammar parameter declared twice",
        "Remove the duplicate declaration",
    ),
    (
        engine::SHIFT_REDUCE_STATE,
        Severity::Critical,
        false,
        "Proximity shift-reduce parser reached an impossible state",
        "File a bug report including the query text",
    ),
    (
        engine::MAX_CALL_DEPTH,
        Severity::High,
        true,
        "Rule nesting exceeds the configured maximum depth",
        "Simplify the query or reduce nesting",
    ),
    (
        engine::PARAMETER_TYPE,
        Severity::High,
        false,
        "Grammar parameter holds a value of the wrong type",
        "Check the corpus configuration value for this parameter",
    ),
];

const GRAMMAR: &[Entry] = &[
    (
        grammar::UNBALANCED_GROUPING,
        Severity::Low,
        true,
        "Opening and closing delimiters are not balanced",
        "Check that every opening bracket has a matching closing bracket",
    ),
    (
        grammar::MISMATCHED_GROUP,
        Severity::Low,
        true,
        "Closing delimiter does not match the most recent opening delimiter",
        "Close groups in the reverse order they were opened",
    ),
    (
        grammar::INVALID_MODIFIER,
        Severity::Low,
        true,
        "Unknown matching strategy modifier",
        "Use one of (?longest), (?shortest), (?standard), (?traditional)",
    ),
    (
        grammar::ALTERNATION_OUTSIDE_GROUP,
        Severity::Low,
        true,
        "Alternatives separator used outside of a group",
        "Enclose alternatives in parentheses or square brackets",
    ),
    (
        grammar::EMPTY_GROUP,
        Severity::Low,
        true,
        "Group contains nothing",
        "Remove the empty group or add content to it",
    ),
    (
        grammar::EMPTY_ALTERNATIVE,
        Severity::Low,
        true,
        "Empty alternative in a phrase group",
        "Remove the superfluous '|' separator",
    ),
    (
        grammar::INVALID_QUANTIFIER,
        Severity::Low,
        true,
        "Unrecognized quantifier after closing parenthesis",
        "Use ?, *, + or {m,n} after ')'",
    ),
    (
        grammar::INVALID_TAG_SYNTAX,
        Severity::Low,
        true,
        "Malformed XML tag",
        "Write tags as <name>, <name=value> or </name>",
    ),
    (
        grammar::INCOMPLETE_PROXIMITY,
        Severity::Low,
        true,
        "Proximity query ends with a distance operator",
        "Add a term after the last distance operator",
    ),
    (
        grammar::OPERATOR_POSITION,
        Severity::Low,
        true,
        "Term or distance operator in an invalid position",
        "Alternate terms and distance operators",
    ),
    (
        grammar::SKIP_IN_PROXIMITY,
        Severity::Low,
        true,
        "Token skips are not allowed in proximity queries",
        "Use a distance operator instead of * or +",
    ),
    (
        grammar::INVALID_RANGE,
        Severity::Low,
        true,
        "Invalid numeric distance range",
        "Use <<n>> or a one-sided range such as >>m,n>>",
    ),
    (
        grammar::STRUCTURAL_DISTANCE_SHAPE,
        Severity::Low,
        true,
        "Structural distance used with a one-sided operator",
        "Write structural distances as <<name>>",
    ),
    (
        grammar::INVALID_DISTANCE,
        Severity::Low,
        true,
        "Malformed distance operator",
        "Use <<n>>, >>m,n>>, <<m,n<< or <<region>>",
    ),
    (
        grammar::MULTIPLE_SEPARATORS,
        Severity::Low,
        true,
        "More than one '_' separator in a token expression",
        "Use '\\_' to match a literal underscore",
    ),
    (
        grammar::EMPTY_TOKEN_EXPRESSION,
        Severity::Low,
        true,
        "Token expression has neither word nor POS constraint",
        "Add a word form, lemma or tag",
    ),
    (
        grammar::INVALID_FLAG,
        Severity::Low,
        true,
        "Unknown case/diacritic flag",
        "Use the flags c, C, d or D",
    ),
    (
        grammar::UNBALANCED_BRACE,
        Severity::Low,
        true,
        "Lone or unbalanced curly brace",
        "Enclose the whole lemma or tag in {...}",
    ),
    (
        grammar::INVALID_ESCAPE,
        Severity::Low,
        true,
        "Invalid backslash escape in wildcard pattern",
        "Backslashes may only escape a following character",
    ),
    (
        grammar::EMPTY_PATTERN,
        Severity::Low,
        true,
        "Wildcard pattern is empty",
        "Provide at least one character or wildcard",
    ),
    (
        grammar::TOO_MANY_SLASHES,
        Severity::Low,
        true,
        "More than one '/' in a headword search",
        "Use {headword/TAG} with a single slash",
    ),
    (
        grammar::MISSING_HEADWORD,
        Severity::Low,
        true,
        "Headword missing in a lemma search",
        "Write {headword/TAG}, or _{TAG} for a tag-only search",
    ),
    (
        grammar::QUERY_TOO_LONG,
        Severity::Medium,
        true,
        "Query exceeds the maximum allowed length",
        "Shorten the query",
    ),
];

const AVAILABILITY: &[Entry] = &[
    (
        availability::NO_TAGS_ALLOWED,
        Severity::Low,
        true,
        "Corpus does not allow XML tags in queries",
        "Remove XML tags from the query",
    ),
    (
        availability::LEMMA_NOT_AVAILABLE,
        Severity::Low,
        true,
        "Corpus has no lemma annotation",
        "Search for word forms instead of {lemma}",
    ),
    (
        availability::NO_POS_ATTRIBUTE,
        Severity::Low,
        true,
        "Corpus has no part-of-speech annotation",
        "Remove the _TAG part of the query",
    ),
    (
        availability::SIMPLE_POS_NOT_AVAILABLE,
        Severity::Low,
        true,
        "Corpus has no simple POS tagset",
        "Use full part-of-speech tags instead of _{TAG}",
    ),
    (
        availability::COMBO_SEARCH_NOT_AVAILABLE,
        Severity::Low,
        true,
        "Combined lemma and simple POS search is not available",
        "Search with {lemma}_{TAG} or {lemma} instead",
    ),
];

const UNKNOWN_VALUES: &[Entry] = &[
    (
        values::DISALLOWED_TAG,
        Severity::Low,
        true,
        "XML tag is not allowed for this corpus",
        "Use one of the listed XML tags",
    ),
    (
        values::UNKNOWN_STRUCTURAL_DISTANCE,
        Severity::Low,
        true,
        "Unknown structural distance region",
        "Use one of the listed region names",
    ),
    (
        values::UNKNOWN_SIMPLE_POS_TAG,
        Severity::Low,
        true,
        "Unknown simple POS tag",
        "Use one of the listed simple POS tags",
    ),
];

const SUCCESS: &[Entry] = &[
    (
        success::OPERATION_COMPLETED_SUCCESSFULLY,
        Severity::Low,
        true,
        "Operation completed successfully",
        "No action required",
    ),
    (
        success::SYSTEM_INITIALIZATION_COMPLETED,
        Severity::Low,
        true,
        "Logging system initialized",
        "No action required",
    ),
    (
        success::QUERY_TRANSLATED,
        Severity::Low,
        true,
        "Query translated to CQP",
        "Hand the CQP query to the corpus engine",
    ),
    (
        success::GRAMMAR_CONFIGURED,
        Severity::Low,
        true,
        "Grammar parameters applied from corpus configuration",
        "No action required",
    ),
    (
        success::CONFIG_LOADED,
        Severity::Low,
        true,
        "Corpus configuration loaded",
        "No action required",
    ),
];

/// Every entry table with the category its codes report
const FAMILIES: &[(&str, &[Entry])] = &[
    ("System", SYSTEM),
    ("Configuration", CONFIGURATION),
    ("Engine", ENGINE),
    ("Grammar", GRAMMAR),
    ("Availability", AVAILABILITY),
    ("UnknownValue", UNKNOWN_VALUES),
    ("Success", SUCCESS),
];

static REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    REGISTRY.get_or_init(|| {
        FAMILIES
            .iter()
            .flat_map(|(category, entries)| entries.iter().map(move |entry| (*category, entry)))
            .map(|(category, &(code, severity, recoverable, description, recommended_action))| {
                let metadata = ErrorMetadata {
                    code,
                    category,
                    severity,
                    recoverable,
                    description,
                    recommended_action,
                };
                (code.as_str(), metadata)
            })
            .collect()
    })
}

pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    registry().get(code)
}

fn lookup<T>(code: &str, field: fn(&ErrorMetadata) -> T, fallback: T) -> T {
    get_error_metadata(code).map(field).unwrap_or(fallback)
}

/// Unregistered codes read as `Medium`
pub fn get_severity(code: &str) -> Severity {
    lookup(code, |m| m.severity, Severity::Medium)
}

/// Unregistered codes are treated as recoverable
pub fn is_recoverable(code: &str) -> bool {
    lookup(code, |m| m.recoverable, true)
}

pub fn requires_halt(code: &str) -> bool {
    lookup(code, ErrorMetadata::requires_halt, false)
}

pub fn get_description(code: &str) -> &'static str {
    lookup(code, |m| m.description, "Unknown error")
}

pub fn get_action(code: &str) -> &'static str {
    lookup(code, |m| m.recommended_action, "No specific action available")
}

pub fn get_category(code: &str) -> &'static str {
    lookup(code, |m| m.category, "Unknown")
}

/// Every family must register metadata for its codes, and no code may appear twice
pub fn validate_registry() -> Result<(), String> {
    let mut seen = std::collections::HashSet::new();
    for (category, entries) in FAMILIES {
        if entries.is_empty() {
            return Err(format!("No codes registered for category {}", category));
        }
        for (code, ..) in entries.iter() {
            if !seen.insert(code.as_str()) {
                return Err(format!("Code {} registered twice", code));
            }
        }
    }
    Ok(())
}
