//! Workspace user directory loaded once per run.

use std::collections::HashMap;

use tracing::info;

use crate::models::user::DirectoryUser;
use crate::slack::api::UsersPage;
use crate::slack::gateway::{ApiGateway, ApiScope, PAGE_LIMIT};
use crate::Result;

/// Method listing every workspace user.
pub const USERS_LIST_METHOD: &str = "users.list";

/// Read-only map of workspace users keyed by ID.
#[derive(Debug, Clone, Default)]
pub struct DirectoryIndex {
    users: HashMap<String, DirectoryUser>,
}

impl DirectoryIndex {
    /// Build an index; later duplicates replace earlier ones.
    pub fn from_users(users: impl IntoIterator<Item = DirectoryUser>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|user| (user.id.clone(), user))
                .collect(),
        }
    }

    /// Fetch every page of `users.list`.
    ///
    /// # Errors
    ///
    /// Returns the gateway error for any failed page.
    pub async fn fetch(gateway: &ApiGateway) -> Result<Self> {
        let members = gateway
            .paginate::<UsersPage>(ApiScope::Platform, USERS_LIST_METHOD, &[("limit", PAGE_LIMIT)])
            .await?;
        let index = Self::from_users(members.into_iter().map(DirectoryUser::from));
        info!(users = index.len(), "loaded workspace directory");
        Ok(index)
    }

    /// Look up a user by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&DirectoryUser> {
        self.users.get(id)
    }

    /// Number of users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
