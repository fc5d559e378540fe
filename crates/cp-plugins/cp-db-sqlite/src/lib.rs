//! # cp-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational
//! model and the `cp-core` domain models. One `SqlitePool` backs every
//! repository port; multi-statement cascades run inside a transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cp_core::error::{AppError, Result};
use cp_core::models::{AccountSummary, Comment, Content, ContentKind, Like, User};
use cp_core::traits::{CommentRepo, ContentRepo, CredentialRepo, LikeRepo};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

pub struct SqliteStore {
    pool: SqlitePool,
}

// Helpers for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

fn db_err(e: sqlx::Error) -> AppError {
    AppError::Internal(format!("database error: {e}"))
}

fn user_from_row(row: &SqliteRow) -> User {
    User {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        is_admin: row.get("is_admin"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    }
}

fn content_from_row(row: &SqliteRow) -> Result<Content> {
    Ok(Content {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        owner_id: blob_to_uuid(row.get::<Vec<u8>, _>("owner_id").as_slice()),
        kind: row.get::<String, _>("kind").parse::<ContentKind>()?,
        title: row.get("title"),
        body: row.get("body"),
        media_ref: row.get("media_ref"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    })
}

fn comment_from_row(row: &SqliteRow) -> Comment {
    Comment {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        content_id: blob_to_uuid(row.get::<Vec<u8>, _>("content_id").as_slice()),
        author_id: blob_to_uuid(row.get::<Vec<u8>, _>("author_id").as_slice()),
        body: row.get("body"),
        parent_comment_id: row
            .get::<Option<Vec<u8>>, _>("parent_comment_id")
            .map(|b| blob_to_uuid(b.as_slice())),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
    }
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id            BLOB PRIMARY KEY,
        username      TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        is_admin      INTEGER NOT NULL DEFAULT 0,
        created_at    TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS contents (
        id         BLOB PRIMARY KEY,
        owner_id   BLOB NOT NULL,
        kind       TEXT NOT NULL,
        title      TEXT NOT NULL,
        body       TEXT NOT NULL,
        media_ref  TEXT,
        created_at TEXT NOT NULL,
        FOREIGN KEY(owner_id) REFERENCES users(id)
    )",
    "CREATE TABLE IF NOT EXISTS comments (
        id                BLOB PRIMARY KEY,
        content_id        BLOB NOT NULL,
        author_id         BLOB NOT NULL,
        body              TEXT NOT NULL,
        parent_comment_id BLOB,
        created_at        TEXT NOT NULL,
        FOREIGN KEY(content_id) REFERENCES contents(id),
        FOREIGN KEY(author_id)  REFERENCES users(id)
    )",
    "CREATE TABLE IF NOT EXISTS likes (
        id         BLOB PRIMARY KEY,
        content_id BLOB NOT NULL,
        user_id    BLOB NOT NULL,
        created_at TEXT NOT NULL,
        FOREIGN KEY(content_id) REFERENCES contents(id),
        FOREIGN KEY(user_id)    REFERENCES users(id)
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_likes_content_user ON likes(content_id, user_id)",
];

impl SqliteStore {
    /// Opens (creating if absent) the database at `url` and applies the
    /// idempotent schema.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(db_err)?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// In-memory store on a single pooled connection. A shared-cache pool
    /// would hand each connection its own empty database, so the pool is
    /// pinned to one connection here.
    pub async fn connect_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(db_err)?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(db_err)?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
        }
        log::debug!("schema ensured");
        Ok(())
    }
}

#[async_trait]
impl CredentialRepo for SqliteStore {
    /// Inserts a new account. The UNIQUE constraint on `username` is the
    /// single source of truth for name collisions.
    async fn insert_user(&self, user: &User) -> Result<()> {
        let res = sqlx::query(
            "INSERT INTO users (id, username, password_hash, is_admin, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(user.id))
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AppError::DuplicateUsername(user.username.clone()))
            }
            Err(e) => Err(db_err(e)),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(|r| user_from_row(&r)))
    }

    async fn list_accounts(&self) -> Result<Vec<AccountSummary>> {
        let rows = sqlx::query(
            "SELECT id, username, is_admin, created_at FROM users ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|row| AccountSummary {
                id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
                username: row.get("username"),
                is_admin: row.get("is_admin"),
                created_at: row.get::<DateTime<Utc>, _>("created_at"),
            })
            .collect())
    }

    async fn set_admin(&self, username: &str, is_admin: bool) -> Result<u64> {
        let res = sqlx::query("UPDATE users SET is_admin = ? WHERE username = ?")
            .bind(is_admin)
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected())
    }

    /// Removes the account and everything hanging off it: owned content
    /// (with that content's comments and likes), comments the user wrote
    /// anywhere, and likes the user placed. One transaction, so an
    /// interrupted cascade never leaves orphans.
    async fn delete_user(&self, id: Uuid) -> Result<u64> {
        let blob = uuid_to_blob(id);
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            "DELETE FROM likes WHERE user_id = ? \
             OR content_id IN (SELECT id FROM contents WHERE owner_id = ?)",
        )
        .bind(&blob)
        .bind(&blob)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        sqlx::query(
            "DELETE FROM comments WHERE author_id = ? \
             OR content_id IN (SELECT id FROM contents WHERE owner_id = ?)",
        )
        .bind(&blob)
        .bind(&blob)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        sqlx::query("DELETE FROM contents WHERE owner_id = ?")
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        let res = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        log::info!("deleted user {id} ({} row)", res.rows_affected());
        Ok(res.rows_affected())
    }
}

#[async_trait]
impl ContentRepo for SqliteStore {
    async fn create(&self, content: &Content) -> Result<()> {
        sqlx::query(
            "INSERT INTO contents (id, owner_id, kind, title, body, media_ref, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(content.id))
        .bind(uuid_to_blob(content.owner_id))
        .bind(content.kind.as_str())
        .bind(&content.title)
        .bind(&content.body)
        .bind(&content.media_ref)
        .bind(content.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Content>> {
        let row = sqlx::query("SELECT * FROM contents WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| content_from_row(&r)).transpose()
    }

    /// Creation order is explicit; storage default ordering is never
    /// relied upon.
    async fn list_all(&self) -> Result<Vec<(Content, String)>> {
        let rows = sqlx::query(
            "SELECT c.*, u.username FROM contents c \
             JOIN users u ON c.owner_id = u.id \
             ORDER BY c.created_at ASC, c.id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(|row| Ok((content_from_row(row)?, row.get("username"))))
            .collect()
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Content>> {
        let rows = sqlx::query(
            "SELECT * FROM contents WHERE owner_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(uuid_to_blob(owner_id))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(content_from_row).collect()
    }

    /// Deletes the content row with its comments and likes in one
    /// transaction. Deleting an already-removed id affects zero rows.
    async fn delete(&self, id: Uuid) -> Result<u64> {
        let blob = uuid_to_blob(id);
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query("DELETE FROM likes WHERE content_id = ?")
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        sqlx::query("DELETE FROM comments WHERE content_id = ?")
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        let res = sqlx::query("DELETE FROM contents WHERE id = ?")
            .bind(&blob)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(res.rows_affected())
    }
}

#[async_trait]
impl CommentRepo for SqliteStore {
    async fn add(&self, comment: &Comment) -> Result<()> {
        sqlx::query(
            "INSERT INTO comments (id, content_id, author_id, body, parent_comment_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(comment.id))
        .bind(uuid_to_blob(comment.content_id))
        .bind(uuid_to_blob(comment.author_id))
        .bind(&comment.body)
        .bind(comment.parent_comment_id.map(uuid_to_blob))
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Comment>> {
        let row = sqlx::query("SELECT * FROM comments WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(|r| comment_from_row(&r)))
    }

    async fn top_level(&self, content_id: Uuid) -> Result<Vec<(Comment, String)>> {
        let rows = sqlx::query(
            "SELECT c.*, u.username FROM comments c \
             JOIN users u ON c.author_id = u.id \
             WHERE c.content_id = ? AND c.parent_comment_id IS NULL \
             ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(uuid_to_blob(content_id))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .iter()
            .map(|row| (comment_from_row(row), row.get("username")))
            .collect())
    }

    async fn replies(&self, parent_id: Uuid) -> Result<Vec<(Comment, String)>> {
        let rows = sqlx::query(
            "SELECT c.*, u.username FROM comments c \
             JOIN users u ON c.author_id = u.id \
             WHERE c.parent_comment_id = ? \
             ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(uuid_to_blob(parent_id))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .iter()
            .map(|row| (comment_from_row(row), row.get("username")))
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        let res = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(res.rows_affected())
    }
}

#[async_trait]
impl LikeRepo for SqliteStore {
    /// `INSERT OR IGNORE` against the (content_id, user_id) unique index;
    /// a repeat like by the same user is absorbed without error.
    async fn add(&self, like: &Like) -> Result<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO likes (id, content_id, user_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(like.id))
        .bind(uuid_to_blob(like.content_id))
        .bind(uuid_to_blob(like.user_id))
        .bind(like.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn count(&self, content_id: Uuid) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM likes WHERE content_id = ?")
            .bind(uuid_to_blob(content_id))
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.get::<i64, _>("count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    // SqliteStore implements every port; several ports share method names
    // (add, find, delete), so tests address it through one port at a time.
    fn ports(
        store: &SqliteStore,
    ) -> (
        &dyn CredentialRepo,
        &dyn ContentRepo,
        &dyn CommentRepo,
        &dyn LikeRepo,
    ) {
        (store, store, store, store)
    }

    fn user(name: &str) -> User {
        User {
            id: Uuid::now_v7(),
            username: name.to_string(),
            password_hash: "$argon2id$test".to_string(),
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    fn article(owner: &User, title: &str) -> Content {
        Content {
            id: Uuid::now_v7(),
            owner_id: owner.id,
            kind: ContentKind::Article,
            title: title.to_string(),
            body: "body".to_string(),
            media_ref: None,
            created_at: Utc::now(),
        }
    }

    fn video(owner: &User, title: &str) -> Content {
        Content {
            id: Uuid::now_v7(),
            owner_id: owner.id,
            kind: ContentKind::Video,
            title: title.to_string(),
            body: "description".to_string(),
            media_ref: Some("ab/cd/abcdef".to_string()),
            created_at: Utc::now(),
        }
    }

    fn comment(content: &Content, author: &User, body: &str, parent: Option<Uuid>) -> Comment {
        Comment {
            id: Uuid::now_v7(),
            content_id: content.id,
            author_id: author.id,
            body: body.to_string(),
            parent_comment_id: parent,
            created_at: Utc::now(),
        }
    }

    fn like(content: &Content, by: &User) -> Like {
        Like {
            id: Uuid::now_v7(),
            content_id: content.id,
            user_id: by.id,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected_once() {
        let store = SqliteStore::connect_memory().await.unwrap();
        let (users, _, _, _) = ports(&store);

        let first = user("alice");
        users.insert_user(&first).await.unwrap();

        let second = user("alice");
        let err = users.insert_user(&second).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername(name) if name == "alice"));

        // Exactly one row persists.
        assert_eq!(users.list_accounts().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listing_is_in_creation_order() {
        let store = SqliteStore::connect_memory().await.unwrap();
        let (users, contents, _, _) = ports(&store);
        let alice = user("alice");
        users.insert_user(&alice).await.unwrap();

        for title in ["first", "second", "third"] {
            contents.create(&article(&alice, title)).await.unwrap();
        }

        let all = contents.list_all().await.unwrap();
        let titles: Vec<&str> = all.iter().map(|(c, _)| c.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
        assert!(all.iter().all(|(_, author)| author == "alice"));
    }

    #[tokio::test]
    async fn thread_queries_partition_by_parent() {
        let store = SqliteStore::connect_memory().await.unwrap();
        let (users, contents, comments, _) = ports(&store);
        let alice = user("alice");
        let bob = user("bob");
        users.insert_user(&alice).await.unwrap();
        users.insert_user(&bob).await.unwrap();

        let post = article(&alice, "threaded");
        contents.create(&post).await.unwrap();

        let top = comment(&post, &alice, "hi", None);
        comments.add(&top).await.unwrap();
        let reply = comment(&post, &bob, "hello back", Some(top.id));
        comments.add(&reply).await.unwrap();
        let other_top = comment(&post, &bob, "separate thread", None);
        comments.add(&other_top).await.unwrap();

        let tops = comments.top_level(post.id).await.unwrap();
        assert_eq!(tops.len(), 2);
        assert_eq!(tops[0].0.body, "hi");
        assert_eq!(tops[0].1, "alice");

        let replies = comments.replies(top.id).await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0.body, "hello back");
        assert_eq!(replies[0].1, "bob");

        assert!(comments.replies(other_top.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn likes_are_deduplicated_per_user() {
        let store = SqliteStore::connect_memory().await.unwrap();
        let (users, contents, _, likes) = ports(&store);
        let alice = user("alice");
        let bob = user("bob");
        users.insert_user(&alice).await.unwrap();
        users.insert_user(&bob).await.unwrap();

        let clip = video(&alice, "clip");
        contents.create(&clip).await.unwrap();

        likes.add(&like(&clip, &bob)).await.unwrap();
        likes.add(&like(&clip, &bob)).await.unwrap();
        assert_eq!(likes.count(clip.id).await.unwrap(), 1);

        likes.add(&like(&clip, &alice)).await.unwrap();
        assert_eq!(likes.count(clip.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn content_delete_cascades_comments_and_likes() {
        let store = SqliteStore::connect_memory().await.unwrap();
        let (users, contents, comments, likes) = ports(&store);
        let alice = user("alice");
        let bob = user("bob");
        users.insert_user(&alice).await.unwrap();
        users.insert_user(&bob).await.unwrap();

        let clip = video(&alice, "clip");
        contents.create(&clip).await.unwrap();
        comments.add(&comment(&clip, &bob, "nice", None)).await.unwrap();
        likes.add(&like(&clip, &bob)).await.unwrap();

        assert_eq!(contents.delete(clip.id).await.unwrap(), 1);
        assert!(contents.find(clip.id).await.unwrap().is_none());
        assert!(comments.top_level(clip.id).await.unwrap().is_empty());
        assert_eq!(likes.count(clip.id).await.unwrap(), 0);

        // Deleting again is a no-op, not an error.
        assert_eq!(contents.delete(clip.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn user_delete_cascades_everything_they_touched() {
        let store = SqliteStore::connect_memory().await.unwrap();
        let (users, contents, comments, likes) = ports(&store);
        let alice = user("alice");
        let bob = user("bob");
        users.insert_user(&alice).await.unwrap();
        users.insert_user(&bob).await.unwrap();

        let owned = article(&alice, "alice writes");
        contents.create(&owned).await.unwrap();
        let bobs = video(&bob, "bob films");
        contents.create(&bobs).await.unwrap();

        // Bob comments on Alice's article; Alice comments on Bob's video
        // and likes it.
        comments.add(&comment(&owned, &bob, "from bob", None)).await.unwrap();
        comments.add(&comment(&bobs, &alice, "from alice", None)).await.unwrap();
        likes.add(&like(&bobs, &alice)).await.unwrap();

        assert_eq!(users.delete_user(alice.id).await.unwrap(), 1);

        // Alice's content is gone along with the comments under it.
        let remaining = contents.list_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].0.id, bobs.id);
        assert!(comments.top_level(owned.id).await.unwrap().is_empty());

        // Her comment and like on Bob's video are gone too.
        assert!(comments.top_level(bobs.id).await.unwrap().is_empty());
        assert_eq!(likes.count(bobs.id).await.unwrap(), 0);

        // Already-removed user id resolves to a no-op.
        assert_eq!(users.delete_user(alice.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn set_admin_reports_affected_rows() {
        let store = SqliteStore::connect_memory().await.unwrap();
        let (users, _, _, _) = ports(&store);
        let alice = user("alice");
        users.insert_user(&alice).await.unwrap();

        assert_eq!(users.set_admin("alice", true).await.unwrap(), 1);
        assert!(users.find_by_username("alice").await.unwrap().unwrap().is_admin);
        assert_eq!(users.set_admin("nobody", true).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn account_listing_never_carries_hashes() {
        let store = SqliteStore::connect_memory().await.unwrap();
        let (users, _, _, _) = ports(&store);
        users.insert_user(&user("alice")).await.unwrap();

        let accounts = users.list_accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].username, "alice");
        // AccountSummary has no hash field; the assertion is the type.
    }
}
