use assert_matches::assert_matches;
use ceql_compiler::logging::{self, codes, LogLevel, LoggingService, MemoryLogger};
use ceql_compiler::{CeqlParser, ParseError};
use std::sync::Arc;

#[test]
fn test_trace_for_unclosed_group() {
    let mut parser = CeqlParser::new();
    parser.parse("(dog").unwrap_err();

    assert_eq!(
        parser.error_message(),
        &[
            "Bracketing is not balanced: too many opening delimiters".to_string(),
            "when applying **phrase_element** at position: ( dog ^^".to_string(),
            "when parsing '(dog' as **phrase_query**, **ceql_query**".to_string(),
        ]
    );
}

#[test]
fn test_trace_for_nested_rule_failure() {
    let mut parser = CeqlParser::new();
    parser.parse("the cat_N_V sat").unwrap_err();
    let lines = parser.error_message();

    assert!(lines[0].starts_with("More than one '_' separator in 'cat_N_V'"));
    assert_eq!(
        lines[1],
        "when parsing 'cat_N_V' as **token_expression**, **phrase_element**"
    );
    assert_eq!(
        lines[2],
        "when applying **phrase_element** at position: the cat_N_V ^^ sat"
    );
    assert_eq!(
        lines[3],
        "when parsing 'the cat_N_V sat' as **phrase_query**, **ceql_query**"
    );
    assert_eq!(lines.len(), 4);
}

#[test]
fn test_trace_through_wildcard_application() {
    let mut parser = CeqlParser::new();
    parser.parse("colo[u,r").unwrap_err();
    let lines = parser.error_message();

    assert!(lines
        .iter()
        .any(|line| line == "when applying **wildcard_item** at position: colo [ u , r ^^"));
    assert!(lines
        .iter()
        .any(|line| line.contains("**word_pattern**, **word_or_lemma**")));
}

#[test]
fn test_html_rendering() {
    let mut parser = CeqlParser::new();
    parser.parse("<p> dog").unwrap_err();
    let html = parser.html_error_message();

    assert!(html.starts_with("<p class=\"error-message\">XML tag &lt;p&gt; is not allowed"));
    assert!(html.contains("<b>xml_tag</b>"));
    assert!(html.contains("<span class=\"error-position\">^^</span>"));
    assert!(html.ends_with("</ul>"));
}

#[test]
fn test_success_clears_diagnosis() {
    let mut parser = CeqlParser::new();
    parser.parse("a | b").unwrap_err();
    assert_matches!(
        parser.last_error(),
        Some(ParseError::AlternationOutsideGroup { .. })
    );

    parser.parse("a b").unwrap();
    assert!(parser.error_message().is_empty());
    assert_eq!(parser.html_error_message(), "");
}

#[test]
fn test_error_classification() {
    let mut parser = CeqlParser::new();

    let grammar = parser.parse("a_b_c").unwrap_err();
    assert_eq!(grammar.category(), "Grammar");
    assert!(!grammar.is_internal());
    assert!(!grammar.requires_halt());

    let config_gap = parser.parse("_{N}").unwrap_err();
    assert_eq!(config_gap.category(), "Availability");

    let unknown = parser.parse("<p>").unwrap_err();
    assert_eq!(unknown.category(), "UnknownValue");
}

#[test]
fn test_events_carry_query_context() {
    let memory = Arc::new(MemoryLogger::new());
    let service = LoggingService::new(memory.clone(), LogLevel::Debug);
    if logging::init_global_logging_with_service(Arc::new(service)).is_err() {
        return;
    }

    let mut parser = CeqlParser::new();
    parser.parse("dog_N_V").unwrap_err();
    parser.parse("dog_N").unwrap();

    let failure = memory
        .get_events_with_code(codes::grammar::MULTIPLE_SEPARATORS)
        .into_iter()
        .find(|event| event.query.as_deref() == Some("dog_N_V"));
    assert!(failure.is_some());
    assert!(memory
        .failures()
        .contains(&("dog_N_V".to_string(), codes::grammar::MULTIPLE_SEPARATORS)));
    assert!(memory
        .translations()
        .contains(&("dog_N".to_string(), "[word=\"dog\" & pos=\"N\"]".to_string())));
    assert!(logging::get_current_query_context().is_none());
}
