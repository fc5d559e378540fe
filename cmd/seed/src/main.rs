//! Bootstraps the first admin account.
//!
//! No HTTP intent may mint an admin, so a fresh deployment runs this once:
//!
//! ```text
//! SEED_ADMIN_USER=root SEED_ADMIN_PASS=... cargo run -p seed
//! ```
//!
//! Running it again promotes the existing account instead of failing.

use std::env;

use anyhow::Context;
use chrono::Utc;
use uuid::Uuid;

use cp_auth_argon2::Argon2AuthProvider;
use cp_core::models::User;
use cp_core::traits::{AuthProvider, CredentialRepo};
use cp_db_sqlite::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let db_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:commonplace.db".to_string());
    let username = env::var("SEED_ADMIN_USER").unwrap_or_else(|_| "admin".to_string());
    let password = env::var("SEED_ADMIN_PASS").context("SEED_ADMIN_PASS must be set")?;

    let store = SqliteStore::connect(&db_url).await?;
    let auth = Argon2AuthProvider::new();

    match store.find_by_username(&username).await? {
        Some(existing) if existing.is_admin => {
            log::info!("'{username}' is already an admin; nothing to do");
        }
        Some(_) => {
            store.set_admin(&username, true).await?;
            log::info!("promoted existing account '{username}' to admin");
        }
        None => {
            let user = User {
                id: Uuid::now_v7(),
                username: username.clone(),
                password_hash: auth.hash_password(&password)?,
                is_admin: true,
                created_at: Utc::now(),
            };
            store.insert_user(&user).await?;
            log::info!("created admin account '{username}'");
        }
    }

    Ok(())
}
