use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// Row of the `profiles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Display name for a user with neither a name nor a usable e-mail.
pub const FALLBACK_DISPLAY_NAME: &str = "User";

impl Profile {
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            name: None,
            email: email.into(),
            role: Role::User,
            avatar_url: None,
        }
    }

    /// Name if set, otherwise the local part of the e-mail address.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        match self.email.split('@').next() {
            Some(local) if !local.is_empty() => local.to_string(),
            _ => FALLBACK_DISPLAY_NAME.to_string(),
        }
    }
}

/// Self-service profile edit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Profile {
    pub fn apply(&mut self, input: ProfileInput) {
        if let Some(name) = input.name {
            self.name = Some(name.trim().to_string()).filter(|n| !n.is_empty());
        }
        if let Some(avatar_url) = input.avatar_url {
            self.avatar_url = Some(avatar_url).filter(|u| !u.is_empty());
        }
    }
}

/// Identity a request acts as. Passed explicitly to every scoped operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn user(user_id: Uuid) -> Self {
        Self::new(user_id, Role::User)
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn can_access(&self, task: &Task) -> bool {
        self.is_admin() || task.owner_id == self.user_id
    }
}
