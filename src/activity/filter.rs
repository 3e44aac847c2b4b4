//! Include/exclude glob filtering on conversation names.

use glob::Pattern;

use crate::models::conversation::Conversation;
use crate::{AppError, Result};

/// Compiled name filter. An empty include list admits every name; an
/// exclude match always wins.
#[derive(Debug, Clone, Default)]
pub struct ConversationFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl ConversationFilter {
    /// Compile the given glob patterns.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the first invalid pattern.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// Whether `name` passes the filter.
    #[must_use]
    pub fn allows(&self, name: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|p| p.matches(name));
        included && !self.exclude.iter().any(|p| p.matches(name))
    }

    /// Keep conversations whose name or ID passes the filter.
    #[must_use]
    pub fn apply(&self, conversations: Vec<Conversation>) -> Vec<Conversation> {
        conversations
            .into_iter()
            .filter(|conv| self.allows_conversation(conv))
            .collect()
    }

    fn allows_conversation(&self, conv: &Conversation) -> bool {
        let included = self.include.is_empty()
            || self
                .include
                .iter()
                .any(|p| p.matches(&conv.name) || p.matches(&conv.id));
        let excluded = self
            .exclude
            .iter()
            .any(|p| p.matches(&conv.name) || p.matches(&conv.id));
        included && !excluded
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|raw| {
            Pattern::new(raw)
                .map_err(|err| AppError::Config(format!("invalid pattern {raw:?}: {err}")))
        })
        .collect()
}
