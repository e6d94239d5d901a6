//! Proximity queries: terms combined by distance operators into `MU(meet ...)`
//!
//! Elements are reduced shift-reduce style inside each group level. A level holds at most
//! a pending term and a pending operator; when the next term arrives the three are folded
//! into a single `(meet left right distance)` term.

use super::parameters;
use crate::engine::fragment::describe_shape;
use crate::engine::{Fragment, ParseError, Parser, Rule, RuleResult};
use crate::lexical::tokenizer::{is_distance_operator, is_skip_run};
use crate::lexical::{self, patterns};

/// Distance between the words of a multi-word run
const ADJACENT: &str = ">>1,1>>";

pub fn proximity_query(p: &mut Parser, input: &str) -> RuleResult<Option<Fragment>> {
    let tokens = expand_runs(lexical::proximity_tokens(input));
    let results = p.apply(Rule::ProximityExpression, tokens)?;
    let term = reduce_complete(&results)?;
    Ok(Some(Fragment::text(format!("MU{}", term))))
}

/// Rewrite each multi-word term as adjacent terms nested to the right
fn expand_runs(tokens: Vec<String>) -> Vec<String> {
    let mut expanded = Vec::with_capacity(tokens.len());
    for token in tokens {
        let words: Vec<&str> = token.split_whitespace().collect();
        if words.len() > 1 && !is_distance_operator(&token) {
            expand_run(&words, &mut expanded);
        } else {
            expanded.push(token);
        }
    }
    expanded
}

fn expand_run(words: &[&str], out: &mut Vec<String>) {
    match words {
        [] => {}
        [last] => out.push(last.to_string()),
        [first, rest @ ..] => {
            out.push("(".to_string());
            out.push(first.to_string());
            out.push(ADJACENT.to_string());
            expand_run(rest, out);
            out.push(")".to_string());
        }
    }
}

/// A finished group level must hold exactly one term
fn reduce_complete(items: &[Fragment]) -> RuleResult<String> {
    match items {
        [Fragment::Term(term)] => Ok(term.clone()),
        [Fragment::Term(_), Fragment::Op(operator)] => Err(ParseError::IncompleteProximity {
            operator: operator.clone(),
        }),
        [] => Err(ParseError::EmptyGroup {
            delimiters: "()".to_string(),
        }),
        other => Err(ParseError::InternalShiftReduce {
            shape: describe_shape(other),
        }),
    }
}

fn pending_results(p: &Parser) -> RuleResult<usize> {
    let pending = p.group_items()?.len();
    if pending > 2 {
        return Err(ParseError::InternalState { pending });
    }
    Ok(pending)
}

/// One element of a proximity query: term, operator or parenthesis
pub fn proximity_expression(p: &mut Parser, token: &str) -> RuleResult<Option<Fragment>> {
    let pending = pending_results(p)?;

    if token == "(" {
        if pending == 1 {
            return Err(ParseError::TermPosition {
                term: token.to_string(),
            });
        }
        p.begin_group("(")?;
        return Ok(Some(Fragment::Empty));
    }

    if token == ")" {
        let items = p.end_group("(")?;
        let term = reduce_complete(&items)?;
        return shift_term(p, term).map(Some);
    }

    if is_distance_operator(token) {
        if pending != 1 {
            return Err(ParseError::DistanceOperatorPosition {
                operator: token.to_string(),
            });
        }
        let distance = p.call_code(Rule::DistanceExpression, token)?;
        return Ok(Some(Fragment::Op(distance)));
    }

    if is_skip_run(token) {
        return Err(ParseError::SkipNotAllowedInProximity {
            skip: token.to_string(),
        });
    }

    if pending == 1 {
        return Err(ParseError::TermPosition {
            term: token.to_string(),
        });
    }
    let term = p.call_code(Rule::TokenExpression, token)?;
    shift_term(p, term).map(Some)
}

/// Push a new term, folding it with a pending term and operator
fn shift_term(p: &mut Parser, term: String) -> RuleResult<Fragment> {
    match pending_results(p)? {
        0 => Ok(Fragment::Term(term)),
        1 => Err(ParseError::TermPosition { term }),
        _ => {
            let pending = p.drain_group_items()?;
            match pending.as_slice() {
                [Fragment::Term(left), Fragment::Op(distance)] => Ok(Fragment::Term(format!(
                    "(meet {} {} {})",
                    left, term, distance
                ))),
                other => Err(ParseError::InvalidReduceState {
                    shape: describe_shape(other),
                }),
            }
        }
    }
}

/// Numeric or structural distance operator
pub fn distance_expression(p: &mut Parser, token: &str) -> RuleResult<Option<Fragment>> {
    let invalid = || ParseError::InvalidDistance {
        operator: token.to_string(),
    };
    let captures = patterns::distance_operator()
        .and_then(|re| re.captures(token))
        .ok_or_else(invalid)?;
    let opening = captures.get(1).map(|m| m.as_str()).ok_or_else(invalid)?;
    let lower = captures.get(2).map(|m| m.as_str());
    let value = captures.get(3).map(|m| m.as_str()).ok_or_else(invalid)?;
    let closing = captures.get(4).map(|m| m.as_str()).ok_or_else(invalid)?;

    let code = if value.chars().all(|c| c.is_ascii_digit()) {
        let max: u32 = value.parse().map_err(|_| invalid())?;
        let min: Option<u32> = match lower {
            Some(digits) => Some(digits.parse().map_err(|_| invalid())?),
            None => None,
        };
        numeric_distance(token, opening, closing, min, max)?
    } else {
        if lower.is_some() {
            return Err(invalid());
        }
        structural_distance(p, token, opening, closing, value)?
    };

    Ok(Some(Fragment::Op(code)))
}

fn numeric_distance(
    token: &str,
    opening: &str,
    closing: &str,
    min: Option<u32>,
    max: u32,
) -> RuleResult<String> {
    match (opening, closing) {
        ("<<", ">>") => {
            if min.is_some() {
                return Err(ParseError::invalid_range(
                    token,
                    "a range m,n needs a one-sided operator >>m,n>> or <<m,n<<",
                ));
            }
            if max < 1 {
                return Err(ParseError::invalid_range(token, "the distance must be at least 1"));
            }
            Ok(format!("-{} {}", max, max))
        }
        (">>", ">>") | ("<<", "<<") => {
            let min = min.unwrap_or(1).max(1);
            if max < min {
                return Err(ParseError::invalid_range(
                    token,
                    "the maximum distance is smaller than the minimum",
                ));
            }
            if opening == ">>" {
                Ok(format!("{} {}", min, max))
            } else {
                Ok(format!("-{} -{}", max, min))
            }
        }
        _ => Err(ParseError::InvalidDistance {
            operator: token.to_string(),
        }),
    }
}

fn structural_distance(
    p: &Parser,
    token: &str,
    opening: &str,
    closing: &str,
    region: &str,
) -> RuleResult<String> {
    if (opening, closing) != ("<<", ">>") {
        return Err(ParseError::StructuralDistanceMustBeTwoSided {
            operator: token.to_string(),
            region: region.to_string(),
        });
    }
    let allowed = p.param_set(parameters::S_ATTRIBUTES)?;
    if !allowed.contains(region) {
        return Err(ParseError::UnknownStructuralDistance {
            region: region.to_string(),
            allowed: lexical::sorted_names(&allowed),
        });
    }
    Ok(region.to_string())
}
