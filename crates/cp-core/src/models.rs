//! # Domain Models
//!
//! These structs represent the core entities of Commonplace.
//! We use UUID v7 for time-ordered, globally unique identification.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::error::AppError;

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// PHC-format Argon2id digest; never leaves the credential layer.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Capability flag, independent of content ownership.
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// The two publishable verticals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Article,
    Video,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Article => "article",
            ContentKind::Video => "video",
        }
    }
}

impl std::str::FromStr for ContentKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "article" => Ok(ContentKind::Article),
            "video" => Ok(ContentKind::Video),
            other => Err(AppError::Validation(format!("unknown content kind: {other}"))),
        }
    }
}

/// A publishable unit: an article or a video post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub kind: ContentKind,
    pub title: String,
    /// Article body, or video description.
    pub body: String,
    /// Reference into the MediaStore; video vertical only.
    pub media_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A comment attached to one content item.
///
/// `parent_comment_id` denotes a direct reply (article vertical only).
/// Threads are exactly two levels deep; replies-to-replies are not modeled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub content_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub parent_comment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One like on a video post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: Uuid,
    pub content_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Hash-free account view for the admin listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: Uuid,
    pub username: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}
