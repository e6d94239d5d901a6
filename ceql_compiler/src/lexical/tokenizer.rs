//! Tokenizers for phrase queries, proximity queries and wildcard patterns

/// Wildcard metacharacters that always form a token of their own
const WILDCARD_METACHARACTERS: &[char] = &['?', '*', '+', '[', ',', ']'];

/// Letters forming a two-character class escape in wildcard patterns
const WILDCARD_CLASS_ESCAPES: &[char] = &['a', 'A', 'l', 'L', 'u', 'U', 'd', 'D', 'w', 'W'];

/// Accumulates characters into the current token
#[derive(Debug, Default)]
struct TokenBuffer {
    tokens: Vec<String>,
    current: String,
}

impl TokenBuffer {
    fn push_char(&mut self, c: char) {
        self.current.push(c);
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.tokens.push(std::mem::take(&mut self.current));
        }
    }

    /// Emit a complete token, ending the current one first
    fn emit(&mut self, token: String) {
        self.flush();
        self.tokens.push(token);
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.tokens
    }
}

/// Split a phrase query into whitespace-separated elements
///
/// `(` and `|` are always tokens of their own. `)` forms a token together with any
/// quantifier that follows it, and an XML tag `<...>` is a single token even when it
/// contains spaces.
pub fn phrase_tokens(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut buffer = TokenBuffer::default();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                buffer.push_char(c);
                if let Some(&next) = chars.get(i + 1) {
                    buffer.push_char(next);
                    i += 1;
                }
            }
            '(' | '|' => buffer.emit(c.to_string()),
            ')' => {
                let end = quantifier_end(&chars, i + 1);
                buffer.emit(chars[i..end].iter().filter(|c| !c.is_whitespace()).collect());
                i = end;
                continue;
            }
            '<' => match chars[i..].iter().position(|&c| c == '>') {
                Some(offset) => {
                    buffer.emit(chars[i..=i + offset].iter().collect());
                    i += offset + 1;
                    continue;
                }
                None => buffer.push_char(c),
            },
            c if c.is_whitespace() => buffer.flush(),
            _ => buffer.push_char(c),
        }
        i += 1;
    }

    buffer.finish()
}

/// End of the quantifier suffix starting at `start`, just after a `)`
fn quantifier_end(chars: &[char], start: usize) -> usize {
    if chars.get(start) == Some(&'{') {
        if let Some(offset) = chars[start..].iter().position(|&c| c == '}') {
            return start + offset + 1;
        }
    }
    let mut end = start;
    while let Some(&c) = chars.get(end) {
        if c.is_whitespace() || matches!(c, '(' | ')' | '|' | '<') {
            break;
        }
        end += 1;
    }
    end
}

/// Split a wildcard pattern into literal runs, metacharacters and class escapes
pub fn wildcard_tokens(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut buffer = TokenBuffer::default();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            match chars.get(i + 1) {
                Some(&next) if WILDCARD_CLASS_ESCAPES.contains(&next) => {
                    buffer.emit(format!("\\{}", next));
                }
                Some(&next) => {
                    buffer.push_char(c);
                    buffer.push_char(next);
                }
                None => buffer.push_char(c),
            }
            i += 2;
            continue;
        }
        if WILDCARD_METACHARACTERS.contains(&c) {
            buffer.emit(c.to_string());
        } else {
            buffer.push_char(c);
        }
        i += 1;
    }

    buffer.finish()
}

/// Split a proximity query into terms, parentheses and distance operators
///
/// An operator runs from `<<` or `>>` up to and including the next `<<` or `>>`. Terms
/// keep their internal spaces so that multi-word runs can be expanded by the caller.
pub fn proximity_tokens(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let flush = |current: &mut String, tokens: &mut Vec<String>| {
        let trimmed = current.trim();
        if !trimmed.is_empty() {
            tokens.push(trimmed.to_string());
        }
        current.clear();
    };

    let mut rest = input;
    while let Some(c) = rest.chars().next() {
        if c == '\\' {
            let escaped: String = rest.chars().take(2).collect();
            current.push_str(&escaped);
            rest = &rest[escaped.len()..];
            continue;
        }
        if c == '(' || c == ')' {
            flush(&mut current, &mut tokens);
            tokens.push(c.to_string());
            rest = &rest[1..];
            continue;
        }
        if rest.starts_with("<<") || rest.starts_with(">>") {
            flush(&mut current, &mut tokens);
            let end = next_arrows(&rest[2..]).map(|offset| offset + 4).unwrap_or(rest.len());
            tokens.push(rest[..end].to_string());
            rest = &rest[end..];
            continue;
        }
        current.push(c);
        rest = &rest[c.len_utf8()..];
    }
    flush(&mut current, &mut tokens);

    tokens
}

fn next_arrows(s: &str) -> Option<usize> {
    match (s.find("<<"), s.find(">>")) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Check whether a token is a run of `*` and `+` skip markers
pub fn is_skip_run(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c == '*' || c == '+')
}

/// Check whether a token is a proximity distance operator
pub fn is_distance_operator(token: &str) -> bool {
    token.starts_with("<<") || token.starts_with(">>")
}

/// Operator token with both its opening and closing arrows, e.g. `<<3>>` or `<<x>>`
pub fn is_closed_distance_operator(token: &str) -> bool {
    token.len() > 4
        && is_distance_operator(token)
        && (token.ends_with("<<") || token.ends_with(">>"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_phrase_tokens_groups() {
        assert_eq!(
            phrase_tokens("(big|small) dog"),
            strings(&["(", "big", "|", "small", ")", "dog"])
        );
        assert_eq!(
            phrase_tokens("(a b)+ c (d){2, 3}"),
            strings(&["(", "a", "b", ")+", "c", "(", "d", "){2,3}"])
        );
    }

    #[test]
    fn test_phrase_tokens_xml_tags() {
        assert_eq!(
            phrase_tokens("<s>the<text_id = a b>dog</s>"),
            strings(&["<s>", "the", "<text_id = a b>", "dog", "</s>"])
        );
    }

    #[test]
    fn test_phrase_tokens_keep_escapes() {
        assert_eq!(
            phrase_tokens(r"\( a\|b \)"),
            strings(&[r"\(", r"a\|b", r"\)"])
        );
    }

    #[test]
    fn test_phrase_tokens_quantifier_stops_at_delimiter() {
        assert_eq!(phrase_tokens("(a)?(b)"), strings(&["(", "a", ")?", "(", "b", ")"]));
        assert_eq!(phrase_tokens("(a)x"), strings(&["(", "a", ")x"]));
    }

    #[test]
    fn test_wildcard_tokens() {
        assert_eq!(
            wildcard_tokens("colo[,u]r*"),
            strings(&["colo", "[", ",", "u", "]", "r", "*"])
        );
        assert_eq!(
            wildcard_tokens(r"a\d\W\.b"),
            strings(&["a", r"\d", r"\W", r"\.b"])
        );
    }

    #[test]
    fn test_proximity_tokens() {
        assert_eq!(
            proximity_tokens("dog << 2 >> cat"),
            strings(&["dog", "<< 2 >>", "cat"])
        );
        assert_eq!(
            proximity_tokens("(big dog)>>s>>cat"),
            strings(&["(", "big dog", ")", ">>s>>", "cat"])
        );
        assert_eq!(proximity_tokens("dog <<3"), strings(&["dog", "<<3"]));
    }

    #[test]
    fn test_skip_run_detection() {
        assert!(is_skip_run("*"));
        assert!(is_skip_run("++*"));
        assert!(!is_skip_run("a*"));
        assert!(!is_skip_run(""));
    }

    #[test]
    fn test_closed_distance_operator() {
        assert!(is_closed_distance_operator("<<3>>"));
        assert!(is_closed_distance_operator("<< s >>"));
        assert!(is_closed_distance_operator("<<2,4<<"));
        assert!(!is_closed_distance_operator(">>"));
        assert!(!is_closed_distance_operator("<<3"));
        assert!(!is_closed_distance_operator("<<>>"));
    }
}
