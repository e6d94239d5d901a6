//! CQPweb grammar extension: combined lemma and simple POS search `{headword/TAG}`

use super::ceql::lookup_simple_pos;
use super::parameters;
use crate::engine::{Fragment, ParseError, Parser, Rule, RuleResult};
use crate::lexical;

/// Lemma pattern accepting an optional `/TAG` simple POS suffix
///
/// Without a tag the base lemma pattern rule handles the input.
pub fn lemma_pattern(p: &mut Parser, input: &str) -> RuleResult<Option<Fragment>> {
    let parts = lexical::split_unescaped(input, '/');
    let (headword, tag) = match parts.as_slice() {
        [headword] => (*headword, ""),
        [headword, tag] => (*headword, *tag),
        _ => {
            return Err(ParseError::TooManySlashes {
                expression: input.to_string(),
            })
        }
    };

    if headword.is_empty() {
        let hint = if tag.is_empty() {
            String::new()
        } else {
            format!(" (did you mean _{{{}}}?)", tag)
        };
        return Err(ParseError::MissingHeadword {
            expression: input.to_string(),
            hint,
        });
    }
    if tag.is_empty() {
        return p.call_base(Rule::LemmaPattern, headword).map(Some);
    }

    let headword_regex = p.call_code(Rule::WildcardRegex, headword)?;
    if p.param_map(parameters::SIMPLE_POS)?.is_none() {
        return Err(ParseError::ComboSearchNotAvailable {
            reason: "no simple POS tagset is configured".to_string(),
        });
    }
    let tag_regex = lookup_simple_pos(p, tag)?;

    // The headword regex is already escaped for a quoted string; only the tag regex is raw.
    if let Some(combo) = p.param_text(parameters::COMBO_ATTRIBUTE)? {
        return Ok(Some(Fragment::text(format!(
            "{}=\"({})_{}\"",
            combo,
            headword_regex,
            tag_regex.replace('"', "\"\"")
        ))));
    }

    let lemma = p.param_text(parameters::LEMMA_ATTRIBUTE)?;
    let simple_pos = p.param_text(parameters::SIMPLE_POS_ATTRIBUTE)?;
    match (lemma, simple_pos) {
        (Some(lemma), Some(simple_pos)) => {
            // The tag constraint comes first so that a %c/%d suffix binds to the lemma only.
            Ok(Some(Fragment::text(format!(
                "{}={} & {}=\"{}\"",
                simple_pos,
                lexical::quote(&tag_regex),
                lemma,
                headword_regex
            ))))
        }
        (None, _) => Err(ParseError::ComboSearchNotAvailable {
            reason: "no lemma attribute is configured".to_string(),
        }),
        (_, None) => Err(ParseError::ComboSearchNotAvailable {
            reason: "no simple POS attribute is configured".to_string(),
        }),
    }
}
