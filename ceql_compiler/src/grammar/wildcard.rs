//! Wildcard pattern to regular expression compiler

use crate::engine::fragment::split_alternatives;
use crate::engine::{Fragment, ParseError, Parser, Rule, RuleResult};
use crate::lexical;

/// Wildcard metacharacters and class escapes with their regex translation
pub const WILDCARD_TABLE: &[(&str, &str)] = &[
    ("?", "."),
    ("*", ".*"),
    ("+", ".+"),
    (r"\a", r"\pL"),
    (r"\A", r"\pL+"),
    (r"\l", r"\p{Ll}"),
    (r"\L", r"\p{Ll}+"),
    (r"\u", r"\p{Lu}"),
    (r"\U", r"\p{Lu}+"),
    (r"\d", r"\pN"),
    (r"\D", r"\pN+"),
    (r"\w", r"[\pL\pN'-]"),
    (r"\W", r"[\pL\pN'-]+"),
];

pub fn translate_wildcard(token: &str) -> Option<&'static str> {
    WILDCARD_TABLE
        .iter()
        .find(|(wildcard, _)| *wildcard == token)
        .map(|(_, regex)| *regex)
}

/// Wildcard pattern as a quoted CQP regex
///
/// Literal double quotes are already doubled by the item translation.
pub fn wildcard_pattern(p: &mut Parser, input: &str) -> RuleResult<Option<Fragment>> {
    let regex = p.call_code(Rule::WildcardRegex, input)?;
    Ok(Some(Fragment::text(format!("\"{}\"", regex))))
}

/// Wildcard pattern as an unquoted regex
pub fn wildcard_regex(p: &mut Parser, input: &str) -> RuleResult<Option<Fragment>> {
    check_escapes(input)?;
    if input.is_empty() {
        return Err(ParseError::EmptyPattern);
    }

    let items = p.apply(Rule::WildcardItem, lexical::wildcard_tokens(input))?;
    let regex: String = items.iter().map(Fragment::code).collect();
    Ok(Some(Fragment::text(regex)))
}

fn check_escapes(pattern: &str) -> RuleResult<()> {
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            continue;
        }
        match chars.next() {
            Some('\\') => {
                return Err(ParseError::invalid_escape(
                    pattern,
                    "a literal backslash cannot be matched",
                ))
            }
            Some(_) => {}
            None => {
                return Err(ParseError::invalid_escape(
                    pattern,
                    "the pattern ends in a backslash",
                ))
            }
        }
    }
    Ok(())
}

/// One token of a wildcard pattern
pub fn wildcard_item(p: &mut Parser, token: &str) -> RuleResult<Option<Fragment>> {
    if let Some(regex) = translate_wildcard(token) {
        return Ok(Some(Fragment::text(regex)));
    }

    match token {
        "[" => {
            p.begin_group("[")?;
            Ok(Some(Fragment::Empty))
        }
        "," => {
            if p.nesting_level()? == 0 {
                return Err(ParseError::AlternationOutsideGroup {
                    separator: ",".to_string(),
                });
            }
            Ok(Some(Fragment::Separator))
        }
        "]" => close_alternation(p).map(Some),
        literal => Ok(Some(Fragment::text(lexical::escape_literal(literal)))),
    }
}

/// Close a `[...]` group; empty alternatives make the whole group optional
fn close_alternation(p: &mut Parser) -> RuleResult<Fragment> {
    let items = p.end_group("[")?;

    let mut optional = false;
    let mut alternatives = Vec::new();
    for alternative in split_alternatives(items) {
        if alternative.is_empty() {
            optional = true;
        } else {
            alternatives.push(alternative.iter().map(Fragment::code).collect::<String>());
        }
    }

    if alternatives.is_empty() {
        return Err(ParseError::EmptyGroup {
            delimiters: "[]".to_string(),
        });
    }

    let suffix = if optional { "?" } else { "" };
    Ok(Fragment::text(format!("({}){}", alternatives.join("|"), suffix)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Imbalance;
    use crate::grammar::CeqlParser;
    use assert_matches::assert_matches;

    fn regex(pattern: &str) -> Result<String, ParseError> {
        CeqlParser::new().parse_rule(pattern, Rule::WildcardRegex)
    }

    #[test]
    fn test_metacharacters() {
        assert_eq!(regex("c?t").unwrap(), "c.t");
        assert_eq!(regex("walk*").unwrap(), "walk.*");
        assert_eq!(regex("+ing").unwrap(), ".+ing");
        assert_eq!(regex(r"\u\l+").unwrap(), r"\p{Lu}\p{Ll}.+");
    }

    #[test]
    fn test_literals_escaped() {
        assert_eq!(regex("e.g.").unwrap(), r"e\.g\.");
        assert_eq!(regex(r"\*").unwrap(), r"\*");
        assert_eq!(regex(r"\[x\]").unwrap(), r"\[x\]");
    }

    #[test]
    fn test_alternation() {
        assert_eq!(regex("colo[u,]r").unwrap(), "colo(u)?r");
        assert_eq!(regex("[cat,dog]s").unwrap(), "(cat|dog)s");
        assert_eq!(regex("[un,,re]do").unwrap(), "(un|re)?do");
        assert_eq!(regex("[a*,b]").unwrap(), "(a.*|b)");
    }

    #[test]
    fn test_alternation_errors() {
        assert_matches!(regex("[]"), Err(ParseError::EmptyGroup { .. }));
        assert_matches!(regex("[,]"), Err(ParseError::EmptyGroup { .. }));
        assert_matches!(regex("a,b"), Err(ParseError::AlternationOutsideGroup { .. }));
        assert_matches!(
            regex("[a"),
            Err(ParseError::UnbalancedGrouping {
                imbalance: Imbalance::TooManyOpening
            })
        );
        assert_matches!(
            regex("a]"),
            Err(ParseError::UnbalancedGrouping {
                imbalance: Imbalance::TooManyClosing
            })
        );
    }

    #[test]
    fn test_invalid_escapes() {
        assert_matches!(regex(r"a\\b"), Err(ParseError::InvalidEscape { .. }));
        assert_matches!(regex(r"ab\"), Err(ParseError::InvalidEscape { .. }));
    }

    #[test]
    fn test_empty_pattern() {
        assert_matches!(regex(""), Err(ParseError::EmptyPattern));
    }

    #[test]
    fn test_quoted_pattern() {
        let mut parser = CeqlParser::new();
        assert_eq!(
            parser.parse_rule("say \"hi\"", Rule::WildcardPattern).unwrap(),
            "\"say \"\"hi\"\"\""
        );
    }
}
