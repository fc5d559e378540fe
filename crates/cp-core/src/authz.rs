//! # Authorization Gate
//!
//! A pure decision function over (session, requested operation, target
//! ownership). Every write path runs through `authorize` before touching
//! storage. Permitted actions execute immediately; nothing is audited.

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::session::SessionContext;

/// The gated operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PublishContent,
    AddComment,
    AddLike,
    DeleteOwnAccount,
    /// Permitted for the recorded owner, or any admin.
    DeleteContent { owner_id: Uuid },
    // Admin-only from here down.
    DeleteAnyUser,
    DeleteAnyComment,
    SetAdmin,
    ListAccounts,
}

impl Action {
    fn requires_admin(&self) -> bool {
        matches!(
            self,
            Action::DeleteAnyUser | Action::DeleteAnyComment | Action::SetAdmin | Action::ListAccounts
        )
    }
}

/// Returns the acting user's id when the action is permitted.
pub fn authorize(ctx: &SessionContext, action: Action) -> Result<Uuid> {
    let (user_id, is_admin) = match ctx {
        SessionContext::Authenticated { user_id, is_admin, .. } => (*user_id, *is_admin),
        SessionContext::Anonymous => {
            return Err(AppError::Unauthorized("login required".into()));
        }
    };

    if action.requires_admin() && !is_admin {
        return Err(AppError::Unauthorized("admin role required".into()));
    }

    if let Action::DeleteContent { owner_id } = action {
        // Admin bypasses the ownership check.
        if owner_id != user_id && !is_admin {
            return Err(AppError::Unauthorized("not the owner of this content".into()));
        }
    }

    Ok(user_id)
}
