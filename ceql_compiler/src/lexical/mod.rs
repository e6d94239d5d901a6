//! Escape-aware string utilities and tokenizers
//!
//! A backslash makes the following character literal everywhere in CEQL, so every split,
//! search and tokenizer here steps over `\x` pairs as a unit.

pub mod patterns;
pub mod tokenizer;

pub use tokenizer::{phrase_tokens, proximity_tokens, wildcard_tokens};

/// Characters that must be backslash-escaped in a CQP regular expression
pub const REGEX_METACHARACTERS: &[char] = &[
    '.', '?', '*', '+', '|', '(', ')', '{', '}', '[', ']', '^', '$',
];

/// Byte offsets of every unescaped occurrence of `target`
pub fn unescaped_positions(s: &str, target: char) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut escaped = false;
    for (index, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == target {
            positions.push(index);
        }
    }
    positions
}

/// Split on every unescaped `separator`, keeping escapes intact in the parts
pub fn split_unescaped(s: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for index in unescaped_positions(s, separator) {
        parts.push(&s[start..index]);
        start = index + separator.len_utf8();
    }
    parts.push(&s[start..]);
    parts
}

pub fn find_last_unescaped(s: &str, target: char) -> Option<usize> {
    unescaped_positions(s, target).last().copied()
}

/// Check whether the string ends in an unescaped `target`
pub fn ends_with_unescaped(s: &str, target: char) -> bool {
    match find_last_unescaped(s, target) {
        Some(index) => index + target.len_utf8() == s.len(),
        None => false,
    }
}

/// Collapse runs of whitespace to single spaces and trim both ends
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compile literal text to a regex fragment for a double-quoted CQP string
///
/// Backslash escapes are resolved to the escaped character, regex metacharacters are
/// escaped and double quotes are doubled.
pub fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 2);
    let mut escaped = false;
    for c in s.chars() {
        if !escaped && c == '\\' {
            escaped = true;
            continue;
        }
        escaped = false;
        if REGEX_METACHARACTERS.contains(&c) {
            out.push('\\');
            out.push(c);
        } else if c == '"' {
            out.push_str("\"\"");
        } else {
            out.push(c);
        }
    }
    out
}

/// Quote a regex as a CQP string literal, doubling embedded double quotes
pub fn quote(regex: &str) -> String {
    format!("\"{}\"", regex.replace('"', "\"\""))
}

/// Join names sorted case-insensitively, for "use one of ..." messages
pub fn sorted_names<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let mut names: Vec<&String> = names.into_iter().collect();
    if names.is_empty() {
        return "(none)".to_string();
    }
    names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    names
        .iter()
        .map(|name| name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_unescaped() {
        assert_eq!(split_unescaped("cat_N", '_'), vec!["cat", "N"]);
        assert_eq!(split_unescaped(r"a\_b_c", '_'), vec![r"a\_b", "c"]);
        assert_eq!(split_unescaped("a__b", '_'), vec!["a", "", "b"]);
        assert_eq!(split_unescaped("plain", '_'), vec!["plain"]);
    }

    #[test]
    fn test_escaped_backslash_does_not_escape_next() {
        assert_eq!(unescaped_positions(r"a\\_b", '_'), vec![3]);
    }

    #[test]
    fn test_ends_with_unescaped() {
        assert!(ends_with_unescaped("walk%", '%'));
        assert!(!ends_with_unescaped(r"walk\%", '%'));
        assert!(!ends_with_unescaped("wa%lk", '%'));
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  big \t\n dog "), "big dog");
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal("a.b"), r"a\.b");
        assert_eq!(escape_literal(r"\?"), r"\?");
        assert_eq!(escape_literal(r"\_x"), "_x");
        assert_eq!(escape_literal("say \"hi\""), "say \"\"hi\"\"");
        assert_eq!(escape_literal("(x|y)"), r"\(x\|y\)");
    }

    #[test]
    fn test_sorted_names() {
        let names: Vec<String> = vec!["s".into(), "P".into(), "text".into(), "np".into()];
        assert_eq!(sorted_names(&names), "np, P, s, text");
        assert_eq!(sorted_names(&Vec::<String>::new()), "(none)");
    }
}
