//! Hand-off contract with the external archiving tool.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::window::DateWindow;
use crate::{AppError, Result};

/// Conversation IDs and the UTC window to archive.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExportRequest {
    /// Conversations to export; never empty.
    pub conversation_ids: Vec<String>,
    /// Inclusive start of the window.
    pub start_utc: DateTime<Utc>,
    /// Exclusive end of the window.
    pub end_utc: DateTime<Utc>,
}

impl ExportRequest {
    /// Build a request for `conversation_ids` over `window`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if no conversation IDs are given.
    pub fn new(conversation_ids: Vec<String>, window: DateWindow) -> Result<Self> {
        if conversation_ids.is_empty() {
            return Err(AppError::Config(
                "export request needs at least one conversation".into(),
            ));
        }
        Ok(Self {
            conversation_ids,
            start_utc: window.start_utc,
            end_utc: window.end_utc,
        })
    }
}
