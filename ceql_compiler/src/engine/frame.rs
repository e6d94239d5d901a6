//! Call-stack frames
//!
//! One frame per active rule invocation. Frames of a failed parse stay on the stack and
//! become the diagnostic trace.

use super::rules::Rule;
use std::collections::VecDeque;

/// Progress of a rule applied across a token sequence
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplyProgress {
    pub consumed: Vec<String>,
    pub remaining: VecDeque<String>,
}

impl ApplyProgress {
    pub fn new(items: Vec<String>) -> Self {
        Self {
            consumed: Vec::new(),
            remaining: items.into(),
        }
    }

    /// Move the next item from remaining to consumed and return it
    pub fn advance(&mut self) -> Option<String> {
        let item = self.remaining.pop_front()?;
        self.consumed.push(item.clone());
        Some(item)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Call,
    Apply,
}

/// Activation record for a single rule invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFrame {
    pub id: u64,
    pub rule: Rule,
    pub input: String,
    pub progress: Option<ApplyProgress>,
}

impl ParseFrame {
    pub fn call(id: u64, rule: Rule, input: &str) -> Self {
        Self {
            id,
            rule,
            input: input.to_string(),
            progress: None,
        }
    }

    pub fn apply(id: u64, rule: Rule, items: Vec<String>) -> Self {
        Self {
            id,
            rule,
            input: items.join(" "),
            progress: Some(ApplyProgress::new(items)),
        }
    }

    pub fn kind(&self) -> FrameKind {
        if self.progress.is_some() {
            FrameKind::Apply
        } else {
            FrameKind::Call
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_progress_advance() {
        let mut progress = ApplyProgress::new(vec!["a".into(), "b".into()]);

        assert_eq!(progress.advance().as_deref(), Some("a"));
        assert_eq!(progress.consumed, vec!["a".to_string()]);
        assert_eq!(progress.remaining.len(), 1);
        assert_eq!(progress.advance().as_deref(), Some("b"));
        assert_eq!(progress.advance(), None);
    }

    #[test]
    fn test_frame_kinds() {
        let call = ParseFrame::call(1, Rule::TokenExpression, "cat");
        let apply = ParseFrame::apply(2, Rule::PhraseElement, vec!["big".into(), "dog".into()]);

        assert_eq!(call.kind(), FrameKind::Call);
        assert_eq!(apply.kind(), FrameKind::Apply);
        assert_eq!(apply.input, "big dog");
    }
}
