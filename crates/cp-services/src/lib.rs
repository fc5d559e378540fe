//! # cp-services
//!
//! The `Platform` service: every user intent as one method. Each method
//! takes the request's `SessionContext` explicitly and runs the
//! authorization gate before touching a port, so no write path can bypass
//! the role rules. Reads are ungated except where they need an identity.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use cp_core::authz::{authorize, Action};
use cp_core::error::{AppError, Result};
use cp_core::models::{AccountSummary, Comment, Content, ContentKind, Like, User};
use cp_core::traits::{AuthProvider, CommentRepo, ContentRepo, CredentialRepo, LikeRepo};
use cp_core::SessionContext;

pub struct Platform {
    users: Arc<dyn CredentialRepo>,
    contents: Arc<dyn ContentRepo>,
    comments: Arc<dyn CommentRepo>,
    likes: Arc<dyn LikeRepo>,
    auth: Arc<dyn AuthProvider>,
}

impl Platform {
    pub fn new(
        users: Arc<dyn CredentialRepo>,
        contents: Arc<dyn ContentRepo>,
        comments: Arc<dyn CommentRepo>,
        likes: Arc<dyn LikeRepo>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self { users, contents, comments, likes, auth }
    }

    // ── Accounts ────────────────────────────────────────────────────────

    /// Open to anonymous callers. Registration does not start a session.
    pub async fn register(&self, username: &str, password: &str) -> Result<Uuid> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::Validation("username must not be empty".into()));
        }
        if password.is_empty() {
            return Err(AppError::Validation("password must not be empty".into()));
        }

        let user = User {
            id: Uuid::now_v7(),
            username: username.to_string(),
            password_hash: self.auth.hash_password(password)?,
            is_admin: false,
            created_at: Utc::now(),
        };
        self.users.insert_user(&user).await?;
        log::info!("registered user '{username}'");
        Ok(user.id)
    }

    /// Unknown usernames and wrong passwords both come back as
    /// `InvalidCredentials`; the caller cannot tell which it was.
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        if !self.auth.verify_password(password, &user.password_hash) {
            return Err(AppError::InvalidCredentials);
        }
        log::info!("user '{username}' logged in");
        Ok(user)
    }

    /// Removes the caller's account and cascades through everything they
    /// own or wrote. The host clears the session afterwards.
    pub async fn delete_own_account(&self, ctx: &SessionContext) -> Result<()> {
        let user_id = authorize(ctx, Action::DeleteOwnAccount)?;
        self.users.delete_user(user_id).await?;
        Ok(())
    }

    pub async fn delete_user_by_username(
        &self,
        ctx: &SessionContext,
        username: &str,
    ) -> Result<()> {
        authorize(ctx, Action::DeleteAnyUser)?;
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound("user".into(), username.into()))?;
        self.users.delete_user(user.id).await?;
        Ok(())
    }

    pub async fn set_admin(
        &self,
        ctx: &SessionContext,
        username: &str,
        is_admin: bool,
    ) -> Result<()> {
        authorize(ctx, Action::SetAdmin)?;
        let affected = self.users.set_admin(username, is_admin).await?;
        if affected == 0 {
            return Err(AppError::NotFound("user".into(), username.into()));
        }
        log::info!("set is_admin={is_admin} for '{username}'");
        Ok(())
    }

    /// Admin view. Summaries only; password hashes never leave storage.
    pub async fn list_accounts(&self, ctx: &SessionContext) -> Result<Vec<AccountSummary>> {
        authorize(ctx, Action::ListAccounts)?;
        self.users.list_accounts().await
    }

    // ── Content ─────────────────────────────────────────────────────────

    pub async fn publish_article(
        &self,
        ctx: &SessionContext,
        title: &str,
        body: &str,
    ) -> Result<Uuid> {
        self.publish(ctx, ContentKind::Article, title, body, None).await
    }

    pub async fn publish_video(
        &self,
        ctx: &SessionContext,
        title: &str,
        description: &str,
        media_ref: Option<String>,
    ) -> Result<Uuid> {
        self.publish(ctx, ContentKind::Video, title, description, media_ref).await
    }

    async fn publish(
        &self,
        ctx: &SessionContext,
        kind: ContentKind,
        title: &str,
        body: &str,
        media_ref: Option<String>,
    ) -> Result<Uuid> {
        let owner_id = authorize(ctx, Action::PublishContent)?;
        if title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".into()));
        }

        let content = Content {
            id: Uuid::now_v7(),
            owner_id,
            kind,
            title: title.to_string(),
            body: body.to_string(),
            media_ref,
            created_at: Utc::now(),
        };
        self.contents.create(&content).await?;
        log::info!("published {} '{}'", kind.as_str(), content.title);
        Ok(content.id)
    }

    /// Public listing, creation order, with author usernames.
    pub async fn list_all(&self) -> Result<Vec<(Content, String)>> {
        self.contents.list_all().await
    }

    pub async fn list_mine(&self, ctx: &SessionContext) -> Result<Vec<Content>> {
        let user_id = ctx
            .user_id()
            .ok_or_else(|| AppError::Unauthorized("login required".into()))?;
        self.contents.list_by_owner(user_id).await
    }

    /// "Other content by this author" — public, resolved by username.
    pub async fn list_by_author(&self, username: &str) -> Result<Vec<Content>> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound("user".into(), username.into()))?;
        self.contents.list_by_owner(user.id).await
    }

    pub async fn get_content(&self, content_id: Uuid) -> Result<Content> {
        self.contents
            .find(content_id)
            .await?
            .ok_or_else(|| AppError::NotFound("content".into(), content_id.to_string()))
    }

    /// Owner or admin. A missing id is `NotFound`; a live id owned by
    /// someone else is an explicit `Unauthorized`, never a silent no-op.
    pub async fn delete_content(&self, ctx: &SessionContext, content_id: Uuid) -> Result<()> {
        let content = self.get_content(content_id).await?;
        authorize(ctx, Action::DeleteContent { owner_id: content.owner_id })?;
        // A concurrent delete winning the race leaves zero rows; that is
        // still success here.
        self.contents.delete(content_id).await?;
        Ok(())
    }

    // ── Comments ────────────────────────────────────────────────────────

    /// Adds a top-level comment, or a reply when `parent_comment_id` is
    /// set. Replies exist on the article vertical only, must target a
    /// top-level comment, and must stay on the same content item.
    pub async fn add_comment(
        &self,
        ctx: &SessionContext,
        content_id: Uuid,
        body: &str,
        parent_comment_id: Option<Uuid>,
    ) -> Result<Uuid> {
        let author_id = authorize(ctx, Action::AddComment)?;
        if body.trim().is_empty() {
            return Err(AppError::Validation("comment must not be empty".into()));
        }
        let content = self.get_content(content_id).await?;

        if let Some(parent_id) = parent_comment_id {
            if content.kind != ContentKind::Article {
                return Err(AppError::Validation(
                    "video comments are flat; replies exist on articles only".into(),
                ));
            }
            let parent = self
                .comments
                .find(parent_id)
                .await?
                .ok_or_else(|| AppError::NotFound("comment".into(), parent_id.to_string()))?;
            if parent.content_id != content_id {
                return Err(AppError::Validation(
                    "reply must target a comment on the same content".into(),
                ));
            }
            if parent.parent_comment_id.is_some() {
                return Err(AppError::Validation(
                    "threads are two levels deep; replies to replies are not supported".into(),
                ));
            }
        }

        let comment = Comment {
            id: Uuid::now_v7(),
            content_id,
            author_id,
            body: body.to_string(),
            parent_comment_id,
            created_at: Utc::now(),
        };
        self.comments.add(&comment).await?;
        Ok(comment.id)
    }

    pub async fn top_level_comments(&self, content_id: Uuid) -> Result<Vec<(Comment, String)>> {
        self.get_content(content_id).await?;
        self.comments.top_level(content_id).await
    }

    pub async fn replies(&self, comment_id: Uuid) -> Result<Vec<(Comment, String)>> {
        self.comments
            .find(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("comment".into(), comment_id.to_string()))?;
        self.comments.replies(comment_id).await
    }

    /// Admin-only. Deleting an already-removed id is a no-op.
    pub async fn delete_comment(&self, ctx: &SessionContext, comment_id: Uuid) -> Result<()> {
        authorize(ctx, Action::DeleteAnyComment)?;
        self.comments.delete(comment_id).await?;
        Ok(())
    }

    // ── Likes (video vertical) ──────────────────────────────────────────

    /// One like per user per video; repeats are absorbed.
    pub async fn add_like(&self, ctx: &SessionContext, content_id: Uuid) -> Result<()> {
        let user_id = authorize(ctx, Action::AddLike)?;
        let content = self.get_content(content_id).await?;
        if content.kind != ContentKind::Video {
            return Err(AppError::Validation("likes exist on the video vertical only".into()));
        }

        let like = Like {
            id: Uuid::now_v7(),
            content_id,
            user_id,
            created_at: Utc::now(),
        };
        self.likes.add(&like).await
    }

    pub async fn like_count(&self, content_id: Uuid) -> Result<i64> {
        self.get_content(content_id).await?;
        self.likes.count(content_id).await
    }
}
