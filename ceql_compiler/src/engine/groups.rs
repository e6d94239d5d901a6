//! Nested group accumulator used while a rule is applied across tokens

use super::error::{Imbalance, ParseError, RuleResult};
use super::fragment::Fragment;
use crate::config::compile_time::query::MAX_GROUP_DEPTH;

#[derive(Debug, Clone, PartialEq, Eq)]
struct GroupLevel {
    name: String,
    items: Vec<Fragment>,
}

/// Stack of result lists, one per open bracket scope
///
/// The base level always exists and is never closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStack {
    levels: Vec<GroupLevel>,
}

impl Default for GroupStack {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupStack {
    pub fn new() -> Self {
        Self {
            levels: vec![GroupLevel {
                name: String::new(),
                items: Vec::new(),
            }],
        }
    }

    /// Number of open groups above the base level
    pub fn nesting_level(&self) -> usize {
        self.levels.len() - 1
    }

    /// Open a new named scope
    pub fn begin(&mut self, name: &str) -> RuleResult<()> {
        if self.nesting_level() >= MAX_GROUP_DEPTH {
            return Err(ParseError::unbalanced(Imbalance::TooDeeplyNested {
                limit: MAX_GROUP_DEPTH,
            }));
        }
        self.levels.push(GroupLevel {
            name: name.to_string(),
            items: Vec::new(),
        });
        Ok(())
    }

    /// Close the innermost scope, which must have been opened with the same name
    pub fn end(&mut self, name: &str) -> RuleResult<Vec<Fragment>> {
        if self.nesting_level() == 0 {
            return Err(ParseError::unbalanced(Imbalance::TooManyClosing));
        }
        let opened = self
            .levels
            .last()
            .map(|level| level.name.clone())
            .unwrap_or_default();
        if opened != name {
            return Err(ParseError::mismatched_group(&opened, name));
        }
        Ok(self.levels.pop().map(|level| level.items).unwrap_or_default())
    }

    /// Append a result to the innermost scope
    pub fn push(&mut self, fragment: Fragment) {
        if let Some(level) = self.levels.last_mut() {
            level.items.push(fragment);
        }
    }

    /// Results accumulated in the innermost scope
    pub fn top(&self) -> &[Fragment] {
        self.levels
            .last()
            .map(|level| level.items.as_slice())
            .unwrap_or(&[])
    }

    /// Remove and return the results of the innermost scope, leaving it open
    pub fn drain_top(&mut self) -> Vec<Fragment> {
        self.levels
            .last_mut()
            .map(|level| std::mem::take(&mut level.items))
            .unwrap_or_default()
    }

    /// Consume the stack, requiring that all groups were closed
    pub fn finish(mut self) -> RuleResult<Vec<Fragment>> {
        if self.nesting_level() != 0 {
            return Err(ParseError::unbalanced(Imbalance::TooManyOpening));
        }
        Ok(self.levels.pop().map(|level| level.items).unwrap_or_default())
    }
}
