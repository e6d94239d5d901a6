//! Phrase queries, token expressions and attribute constraints

use super::parameters;
use crate::engine::fragment::split_alternatives;
use crate::engine::{Fragment, ParseError, Parser, Rule, RuleResult};
use crate::lexical::tokenizer::{is_closed_distance_operator, is_skip_run};
use crate::lexical::{self, patterns};

/// Modifiers accepted in a leading `(?...)` directive
const QUERY_MODIFIERS: &[&str] = &["longest", "shortest", "standard", "traditional"];

/// Top-level dispatch to a phrase or proximity query
pub fn ceql_query(p: &mut Parser, input: &str) -> RuleResult<Option<Fragment>> {
    let query = lexical::normalize_whitespace(input);
    if query.is_empty() {
        return Err(ParseError::EmptyTokenExpression {
            expression: input.to_string(),
        });
    }

    let is_proximity = lexical::proximity_tokens(&query)
        .iter()
        .any(|token| is_closed_distance_operator(token));
    let rule = if is_proximity {
        Rule::ProximityQuery
    } else {
        Rule::PhraseQuery
    };
    p.call(rule, &query).map(Some)
}

/// Sequence of phrase elements with an optional leading query modifier
pub fn phrase_query(p: &mut Parser, input: &str) -> RuleResult<Option<Fragment>> {
    let (modifier, body) = split_modifier(input)?;

    let tokens = lexical::phrase_tokens(body);
    if tokens.is_empty() {
        return Err(ParseError::EmptyTokenExpression {
            expression: input.to_string(),
        });
    }
    let elements = p.apply(Rule::PhraseElement, tokens)?;
    let mut codes: Vec<String> = elements.into_iter().map(Fragment::into_code).collect();
    if let Some(modifier) = modifier {
        codes.insert(0, format!("(?{})", modifier));
    }
    Ok(Some(Fragment::text(codes.join(" "))))
}

fn split_modifier(input: &str) -> RuleResult<(Option<&str>, &str)> {
    let captures = match patterns::query_modifier().and_then(|re| re.captures(input)) {
        Some(captures) => captures,
        None => return Ok((None, input)),
    };
    let (Some(modifier), Some(body)) = (captures.get(1), captures.get(2)) else {
        return Ok((None, input));
    };
    if !QUERY_MODIFIERS.contains(&modifier.as_str()) {
        return Err(ParseError::InvalidModifier {
            modifier: modifier.as_str().to_string(),
        });
    }
    Ok((Some(modifier.as_str()), body.as_str()))
}

/// One token of a phrase query
pub fn phrase_element(p: &mut Parser, token: &str) -> RuleResult<Option<Fragment>> {
    if token == "(" {
        p.begin_group("(")?;
        return Ok(Some(Fragment::Empty));
    }

    if token == "|" {
        if p.nesting_level()? == 0 {
            return Err(ParseError::AlternationOutsideGroup {
                separator: "|".to_string(),
            });
        }
        return Ok(Some(Fragment::Separator));
    }

    if let Some(quantifier) = token.strip_prefix(')') {
        return close_phrase_group(p, quantifier).map(Some);
    }

    if token.starts_with('<') && token.ends_with('>') {
        return p.call(Rule::XmlTag, token).map(Some);
    }

    if is_skip_run(token) {
        return Ok(Some(Fragment::text(skip_quantifier(token))));
    }

    if let Some(anchored) = token.strip_prefix('@') {
        let code = p.call_code(Rule::TokenExpression, anchored)?;
        return Ok(Some(Fragment::text(format!("@{}", code))));
    }

    p.call(Rule::TokenExpression, token).map(Some)
}

fn close_phrase_group(p: &mut Parser, quantifier: &str) -> RuleResult<Fragment> {
    validate_quantifier(quantifier)?;
    let items = p.end_group("(")?;
    if items.is_empty() {
        return Err(ParseError::EmptyGroup {
            delimiters: "()".to_string(),
        });
    }

    let mut alternatives = Vec::new();
    for alternative in split_alternatives(items) {
        if alternative.is_empty() {
            return Err(ParseError::EmptyAlternative {
                group: "(...)".to_string(),
            });
        }
        let codes: Vec<&str> = alternative.iter().map(Fragment::code).collect();
        alternatives.push(codes.join(" "));
    }

    Ok(Fragment::text(format!("({}){}", alternatives.join("|"), quantifier)))
}

fn validate_quantifier(quantifier: &str) -> RuleResult<()> {
    let invalid = || ParseError::InvalidQuantifier {
        quantifier: quantifier.to_string(),
    };
    match quantifier {
        "" | "?" | "*" | "+" => return Ok(()),
        _ => {}
    }

    let captures = patterns::counted_quantifier()
        .and_then(|re| re.captures(quantifier))
        .ok_or_else(invalid)?;
    let bound = |index: usize| -> RuleResult<Option<u32>> {
        match captures.get(index).map(|m| m.as_str()) {
            None | Some("") => Ok(None),
            Some(digits) => digits.parse().map(Some).map_err(|_| invalid()),
        }
    };
    let min = bound(1)?;
    let has_comma = captures.get(2).is_some();
    let max = bound(3)?;

    // `{m}`, `{m,}` and `{m,n}` with n >= m and n > 0
    match (min, has_comma, max) {
        (None, _, _) => Err(invalid()),
        (Some(0), false, _) => Err(invalid()),
        (Some(_), true, Some(0)) => Err(invalid()),
        (Some(min), true, Some(max)) if max < min => Err(invalid()),
        _ => Ok(()),
    }
}

/// Translate a run of `+` and `*` into a repeated empty token
fn skip_quantifier(run: &str) -> String {
    let required = run.chars().filter(|&c| c == '+').count();
    let optional = run.len() - required;
    match (required, optional) {
        (0, 1) => "[]?".to_string(),
        (1, 0) => "[]".to_string(),
        _ => format!("[]{{{},{}}}", required, required + optional),
    }
}

/// XML start tag, end tag or start tag with value constraint
pub fn xml_tag(p: &mut Parser, input: &str) -> RuleResult<Option<Fragment>> {
    let invalid = || ParseError::InvalidTagSyntax {
        tag: input.to_string(),
    };
    let captures = patterns::xml_tag()
        .and_then(|re| re.captures(input))
        .ok_or_else(invalid)?;
    let closing = captures.get(1).map(|m| !m.as_str().is_empty()).unwrap_or(false);
    let name = captures.get(2).map(|m| m.as_str()).ok_or_else(invalid)?;
    let value = captures.get(3).map(|m| m.as_str());

    if closing && value.is_some() {
        return Err(invalid());
    }

    let allowed = p.param_set(parameters::S_ATTRIBUTES)?;
    if allowed.is_empty() {
        return Err(ParseError::NoTagsAllowed);
    }
    if !allowed.contains(name) {
        return Err(ParseError::DisallowedTag {
            tag: name.to_string(),
            allowed: lexical::sorted_names(&allowed),
        });
    }

    let code = match (closing, value) {
        (true, _) => format!("</{}>", name),
        (false, None) => format!("<{}>", name),
        (false, Some(value)) => {
            let pattern = p.call_code(Rule::WildcardPattern, value)?;
            format!("<{}={}>", name, pattern)
        }
    };
    Ok(Some(Fragment::text(code)))
}

/// Word/lemma part and POS part of a single token, separated by `_`
pub fn token_expression(p: &mut Parser, input: &str) -> RuleResult<Option<Fragment>> {
    let parts = lexical::split_unescaped(input, '_');
    if parts.len() > 2 {
        return Err(ParseError::MultipleSeparators {
            expression: input.to_string(),
        });
    }

    let word = parts.first().copied().filter(|part| !part.is_empty());
    let pos = parts.get(1).copied().filter(|part| !part.is_empty());
    if word.is_none() && pos.is_none() {
        return Err(ParseError::EmptyTokenExpression {
            expression: input.to_string(),
        });
    }

    let mut constraints = Vec::with_capacity(2);
    if let Some(word) = word {
        constraints.push(p.call_code(Rule::WordOrLemmaConstraint, word)?);
    }
    if let Some(pos) = pos {
        constraints.push(p.call_code(Rule::PosConstraint, pos)?);
    }
    Ok(Some(Fragment::text(format!("[{}]", constraints.join(" & ")))))
}

/// Word or lemma pattern with optional `:flags` suffix
pub fn word_or_lemma_constraint(p: &mut Parser, input: &str) -> RuleResult<Option<Fragment>> {
    let mut ignore_case = p.param_bool(parameters::DEFAULT_IGNORE_CASE)?;
    let mut ignore_diac = p.param_bool(parameters::DEFAULT_IGNORE_DIAC)?;

    let (pattern, flags) = split_flags(input);
    if let Some(flags) = flags {
        for flag in flags.chars() {
            match flag {
                'c' => ignore_case = true,
                'C' => ignore_case = false,
                'd' => ignore_diac = true,
                'D' => ignore_diac = false,
                other => {
                    return Err(ParseError::InvalidFlag {
                        flag: other,
                        flags: flags.to_string(),
                    })
                }
            }
        }
    }

    let code = p.call_code(Rule::WordOrLemma, pattern)?;
    let suffix = match (ignore_case, ignore_diac) {
        (true, true) => "%cd",
        (true, false) => "%c",
        (false, true) => "%d",
        (false, false) => "",
    };
    Ok(Some(Fragment::text(format!("{}{}", code, suffix))))
}

/// Split a trailing unescaped `:letters` suffix off a pattern
fn split_flags(input: &str) -> (&str, Option<&str>) {
    match lexical::find_last_unescaped(input, ':') {
        Some(index) => {
            let flags = &input[index + 1..];
            if !flags.is_empty() && flags.chars().all(|c| c.is_ascii_alphabetic()) {
                (&input[..index], Some(flags))
            } else {
                (input, None)
            }
        }
        None => (input, None),
    }
}

/// Route a braced or `%`-suffixed pattern to `braced`, anything else to `plain`
fn route_attribute_pattern(
    p: &mut Parser,
    input: &str,
    braced: Rule,
    plain: Rule,
) -> RuleResult<Option<Fragment>> {
    let opening = lexical::unescaped_positions(input, '{');
    let closing = lexical::unescaped_positions(input, '}');

    if !opening.is_empty() || !closing.is_empty() {
        let well_formed = opening == [0] && closing == [input.len() - 1] && input.len() >= 2;
        if !well_formed {
            return Err(ParseError::UnbalancedBrace {
                expression: input.to_string(),
            });
        }
        return p.call(braced, &input[1..input.len() - 1]).map(Some);
    }

    if lexical::ends_with_unescaped(input, '%') {
        return p.call(braced, &input[..input.len() - 1]).map(Some);
    }

    p.call(plain, input).map(Some)
}

/// `{lemma}`, `lemma%` or a word form pattern
pub fn word_or_lemma(p: &mut Parser, input: &str) -> RuleResult<Option<Fragment>> {
    route_attribute_pattern(p, input, Rule::LemmaPattern, Rule::WordPattern)
}

pub fn word_pattern(p: &mut Parser, input: &str) -> RuleResult<Option<Fragment>> {
    let pattern = p.call_code(Rule::WildcardPattern, input)?;
    Ok(Some(Fragment::text(format!("word={}", pattern))))
}

pub fn lemma_pattern(p: &mut Parser, input: &str) -> RuleResult<Option<Fragment>> {
    let attribute = p
        .param_text(parameters::LEMMA_ATTRIBUTE)?
        .ok_or(ParseError::LemmaNotAvailable)?;
    let pattern = p.call_code(Rule::WildcardPattern, input)?;
    Ok(Some(Fragment::text(format!("{}={}", attribute, pattern))))
}

/// `{ALIAS}`, `ALIAS%` or a full POS tag pattern
pub fn pos_constraint(p: &mut Parser, input: &str) -> RuleResult<Option<Fragment>> {
    route_attribute_pattern(p, input, Rule::SimplePos, Rule::PosTag)
}

pub fn pos_tag(p: &mut Parser, input: &str) -> RuleResult<Option<Fragment>> {
    let attribute = p
        .param_text(parameters::POS_ATTRIBUTE)?
        .ok_or(ParseError::NoPosAttribute)?;
    let pattern = p.call_code(Rule::WildcardPattern, input)?;
    Ok(Some(Fragment::text(format!("{}={}", attribute, pattern))))
}

/// Simple POS alias looked up in the configured tagset table
pub fn simple_pos(p: &mut Parser, input: &str) -> RuleResult<Option<Fragment>> {
    let regex = lookup_simple_pos(p, input)?;
    let attribute = match p.param_text(parameters::SIMPLE_POS_ATTRIBUTE)? {
        Some(attribute) => attribute,
        None => p
            .param_text(parameters::POS_ATTRIBUTE)?
            .ok_or(ParseError::NoPosAttribute)?,
    };
    Ok(Some(Fragment::text(format!(
        "{}={}",
        attribute,
        lexical::quote(&regex)
    ))))
}

/// Tag regex for a simple POS alias
pub(crate) fn lookup_simple_pos(p: &Parser, tag: &str) -> RuleResult<String> {
    let table = p
        .param_map(parameters::SIMPLE_POS)?
        .ok_or(ParseError::SimplePosNotAvailable)?;
    table
        .get(tag)
        .cloned()
        .ok_or_else(|| ParseError::UnknownSimplePosTag {
            tag: tag.to_string(),
            allowed: lexical::sorted_names(table.keys()),
        })
}
