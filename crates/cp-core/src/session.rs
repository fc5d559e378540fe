//! # SessionContext
//!
//! The request-scoped record of who is acting. Built by the host adapter
//! for every request and passed explicitly into each operation; there is
//! no ambient global. A fresh session always starts `Anonymous`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::User;

/// State machine: `Anonymous` → `Authenticated` on successful credential
/// verification; back to `Anonymous` on logout or self-deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SessionContext {
    #[default]
    Anonymous,
    Authenticated {
        user_id: Uuid,
        username: String,
        is_admin: bool,
    },
}

impl SessionContext {
    /// The context produced by a successful `login`.
    pub fn for_user(user: &User) -> Self {
        SessionContext::Authenticated {
            user_id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionContext::Authenticated { .. })
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, SessionContext::Authenticated { is_admin: true, .. })
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            SessionContext::Anonymous => None,
            SessionContext::Authenticated { user_id, .. } => Some(*user_id),
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            SessionContext::Anonymous => None,
            SessionContext::Authenticated { username, .. } => Some(username),
        }
    }
}
