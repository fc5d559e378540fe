//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{AccountSummary, Comment, Content, Like, User};

/// Persistence contract for accounts.
#[async_trait]
pub trait CredentialRepo: Send + Sync {
    /// Fails with `DuplicateUsername` when the name is taken.
    async fn insert_user(&self, user: &User) -> Result<()>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Hash-free summaries for the admin view.
    async fn list_accounts(&self) -> Result<Vec<AccountSummary>>;

    /// Returns affected rows; 0 means the username does not exist.
    async fn set_admin(&self, username: &str, is_admin: bool) -> Result<u64>;

    /// Cascades to owned content (with its comments and likes), authored
    /// comments, and placed likes, in a single transaction.
    /// Returns affected user rows; 0 on an already-removed id.
    async fn delete_user(&self, id: Uuid) -> Result<u64>;
}

/// Persistence contract for articles and video posts.
#[async_trait]
pub trait ContentRepo: Send + Sync {
    async fn create(&self, content: &Content) -> Result<()>;
    async fn find(&self, id: Uuid) -> Result<Option<Content>>;

    /// All content with the author's username, in creation order.
    async fn list_all(&self) -> Result<Vec<(Content, String)>>;

    /// One owner's content, in creation order.
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Content>>;

    /// Unconditional delete; cascades comments and likes in a single
    /// transaction. Returns affected content rows; 0 is a no-op.
    async fn delete(&self, id: Uuid) -> Result<u64>;
}

/// Persistence contract for comment threads.
#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn add(&self, comment: &Comment) -> Result<()>;
    async fn find(&self, id: Uuid) -> Result<Option<Comment>>;

    /// Comments with no parent, with author usernames, in creation order.
    async fn top_level(&self, content_id: Uuid) -> Result<Vec<(Comment, String)>>;

    /// Direct replies to one comment, with author usernames, in creation order.
    async fn replies(&self, parent_id: Uuid) -> Result<Vec<(Comment, String)>>;

    /// Returns affected rows; 0 on an already-removed id.
    async fn delete(&self, id: Uuid) -> Result<u64>;
}

/// Persistence contract for video likes.
#[async_trait]
pub trait LikeRepo: Send + Sync {
    /// Deduplicated per (content, user); a repeat like is absorbed silently.
    async fn add(&self, like: &Like) -> Result<()>;
    async fn count(&self, content_id: Uuid) -> Result<i64>;
}

/// Credential hashing contract.
pub trait AuthProvider: Send + Sync {
    /// Produces a salted PHC-format digest of the plaintext.
    fn hash_password(&self, password: &str) -> Result<String>;
    /// Recomputes and compares; malformed stored hashes verify as false.
    fn verify_password(&self, password: &str, hash: &str) -> bool;
}

/// Media storage contract for video uploads.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persists raw bytes and returns a media_ref for the Content model.
    async fn save_upload(&self, data: Vec<u8>, content_type: &str) -> Result<String>;
    /// Returns the URL or path the host resolves the ref against.
    fn media_url(&self, media_ref: &str) -> String;
}
