//! Compiled regular expressions shared by the grammar and diagnostics
//!
//! Each pattern is compiled once on first use. A pattern that fails to compile is cached
//! as `None`, and callers treat that as "no match", so a broken pattern surfaces as a
//! grammar error on the affected construct instead of a panic.

use regex::Regex;
use std::sync::OnceLock;

fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

/// `**rule**` emphasis markers in diagnostic lines
pub fn bold_marker() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&CELL, r"\*\*(.+?)\*\*")
}

/// Proximity distance operator: `<<n>>`, `>>m,n>>`, `<<m,n<<` or `<<region>>`
///
/// Captures: 1 opening arrows, 2 optional lower bound, 3 number or region, 4 closing arrows.
pub fn distance_operator() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    cached(
        &CELL,
        r"^(<<|>>)\s*(?:(\d+)\s*,\s*)?(\d+|[A-Za-z_][A-Za-z0-9_]*)\s*(<<|>>)$",
    )
}

/// Counted repetition after a closing parenthesis; the grammar checks the bounds
pub fn counted_quantifier() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&CELL, r"^\{(\d*)(?:(,)(\d*))?\}$")
}

/// XML tag: `<name>`, `<name=value>` or `</name>`
///
/// Captures: 1 closing slash, 2 tag name, 3 optional value.
pub fn xml_tag() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    cached(
        &CELL,
        r"^<\s*(/?)\s*([A-Za-z_][A-Za-z0-9_\-]*)\s*(?:=\s*(.*?))?\s*>$",
    )
}

/// Query modifier directive at the start of a phrase query, e.g. `(?longest)`
pub fn query_modifier() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    cached(&CELL, r"^\(\?([^)]*)\)\s*(.*)$")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        assert!(bold_marker().is_some());
        assert!(distance_operator().is_some());
        assert!(counted_quantifier().is_some());
        assert!(xml_tag().is_some());
        assert!(query_modifier().is_some());
    }

    #[test]
    fn test_distance_operator_captures() {
        let re = distance_operator().unwrap();

        let caps = re.captures(">>2,5>>").unwrap();
        assert_eq!(&caps[1], ">>");
        assert_eq!(caps.get(2).map(|m| m.as_str()), Some("2"));
        assert_eq!(&caps[3], "5");
        assert_eq!(&caps[4], ">>");

        let caps = re.captures("<< s >>").unwrap();
        assert!(caps.get(2).is_none());
        assert_eq!(&caps[3], "s");

        assert!(re.captures("<<>>").is_none());
        assert!(re.captures("<<2").is_none());
    }

    #[test]
    fn test_counted_quantifier() {
        let re = counted_quantifier().unwrap();
        for valid in ["{2}", "{2,4}", "{2,}", "{,4}"] {
            assert!(re.is_match(valid), "{}", valid);
        }
        for invalid in ["{a}", "{2,4", "2,4}", "{2;4}"] {
            assert!(!re.is_match(invalid), "{}", invalid);
        }
    }

    #[test]
    fn test_xml_tag_captures() {
        let re = xml_tag().unwrap();

        let caps = re.captures("<text_genre=fict*>").unwrap();
        assert_eq!(&caps[1], "");
        assert_eq!(&caps[2], "text_genre");
        assert_eq!(caps.get(3).map(|m| m.as_str()), Some("fict*"));

        let caps = re.captures("</s>").unwrap();
        assert_eq!(&caps[1], "/");
        assert_eq!(&caps[2], "s");

        assert!(re.captures("<1s>").is_none());
    }
}
