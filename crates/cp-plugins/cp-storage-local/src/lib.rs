//! # cp-storage-local
//!
//! Local filesystem implementation of `MediaStore`.
//! Content-addressable storage with directory sharding: the SHA-256 of the
//! blob is its ref, so re-uploading the same bytes deduplicates for free.

use async_trait::async_trait;
use cp_core::error::{AppError, Result};
use cp_core::traits::MediaStore;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::fs;

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./data/uploads")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/static/uploads")
    url_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, url_prefix: String) -> Self {
        Self { root_path: root, url_prefix }
    }

    /// Generates a sharded path: "ab/cd/ef...hash"
    fn sharded_path(&self, hash: &str) -> PathBuf {
        let mut path = self.root_path.clone();
        path.push(&hash[0..2]);
        path.push(&hash[2..4]);
        path.push(hash);
        path
    }
}

fn io_err(e: std::io::Error) -> AppError {
    AppError::Internal(format!("media store i/o failed: {e}"))
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    /// Saves an upload under its SHA-256 hash and returns the hash as the
    /// media_ref.
    async fn save_upload(&self, data: Vec<u8>, _content_type: &str) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(&data);
        let hash = hex::encode(hasher.finalize());

        let target_path = self.sharded_path(&hash);
        let parent = target_path
            .parent()
            .ok_or_else(|| AppError::Internal("media root has no parent".into()))?;
        fs::create_dir_all(parent).await.map_err(io_err)?;

        if fs::try_exists(&target_path).await.map_err(io_err)? {
            return Ok(hash);
        }
        fs::write(&target_path, &data).await.map_err(io_err)?;
        Ok(hash)
    }

    fn media_url(&self, media_ref: &str) -> String {
        if media_ref.len() < 4 {
            return format!("{}/{}", self.url_prefix, media_ref);
        }
        format!(
            "{}/{}/{}/{}",
            self.url_prefix,
            &media_ref[0..2],
            &media_ref[2..4],
            media_ref
        )
    }
}
