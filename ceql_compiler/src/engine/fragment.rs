//! Typed partial results produced by grammar rules

/// A piece of translated CQP code together with its grammatical role
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Rule consumed its input without producing code (e.g. an opening bracket)
    Empty,
    /// Plain CQP code
    Text(String),
    /// Alternation separator inside an open group
    Separator,
    /// Complete proximity term
    Term(String),
    /// Proximity distance operator
    Op(String),
}

impl Fragment {
    pub fn text(code: impl Into<String>) -> Self {
        Self::Text(code.into())
    }

    /// Check whether Apply should drop this result
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(code) => code.is_empty(),
            _ => false,
        }
    }

    /// CQP code carried by this fragment
    pub fn code(&self) -> &str {
        match self {
            Self::Text(code) | Self::Term(code) | Self::Op(code) => code,
            Self::Empty | Self::Separator => "",
        }
    }

    pub fn into_code(self) -> String {
        match self {
            Self::Text(code) | Self::Term(code) | Self::Op(code) => code,
            Self::Empty | Self::Separator => String::new(),
        }
    }

    /// Short role name used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Text(_) => "text",
            Self::Separator => "separator",
            Self::Term(_) => "term",
            Self::Op(_) => "operator",
        }
    }

    pub fn is_separator(&self) -> bool {
        matches!(self, Self::Separator)
    }
}

/// Split a group's results into alternatives at each separator
pub fn split_alternatives(items: Vec<Fragment>) -> Vec<Vec<Fragment>> {
    let mut alternatives = vec![Vec::new()];
    for item in items {
        if item.is_separator() {
            alternatives.push(Vec::new());
        } else if let Some(current) = alternatives.last_mut() {
            current.push(item);
        }
    }
    alternatives
}

/// Describe a fragment sequence by kind, e.g. `term, operator`
pub fn describe_shape(items: &[Fragment]) -> String {
    if items.is_empty() {
        return "nothing".to_string();
    }
    items
        .iter()
        .map(Fragment::kind)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_detection() {
        assert!(Fragment::Empty.is_empty());
        assert!(Fragment::text("").is_empty());
        assert!(!Fragment::Separator.is_empty());
        assert!(!Fragment::Op(String::new()).is_empty());
    }

    #[test]
    fn test_split_alternatives() {
        let items = vec![
            Fragment::text("a"),
            Fragment::Separator,
            Fragment::text("b"),
            Fragment::text("c"),
            Fragment::Separator,
        ];
        let alternatives = split_alternatives(items);

        assert_eq!(alternatives.len(), 3);
        assert_eq!(alternatives[1].len(), 2);
        assert!(alternatives[2].is_empty());
    }

    #[test]
    fn test_describe_shape() {
        let items = vec![Fragment::Term("t".into()), Fragment::Op("1 2".into())];
        assert_eq!(describe_shape(&items), "term, operator");
        assert_eq!(describe_shape(&[]), "nothing");
    }
}
