//! # Commonplace Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::env;
use std::sync::Arc;

use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::Key;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

use cp_api::handlers::AppState;
use cp_services::Platform;

// Feature-gated imports: the binary is compiled to order
#[cfg(feature = "db-sqlite")]
use cp_db_sqlite::SqliteStore;

#[cfg(feature = "storage-local")]
use cp_storage_local::LocalMediaStore;

#[cfg(feature = "auth-argon2")]
use cp_auth_argon2::Argon2AuthProvider;

fn session_key() -> Key {
    match env::var("SESSION_KEY") {
        Ok(material) if material.len() >= 64 => Key::derive_from(material.as_bytes()),
        Ok(_) => {
            log::warn!("SESSION_KEY shorter than 64 bytes; generating an ephemeral key");
            Key::generate()
        }
        Err(_) => {
            log::warn!("SESSION_KEY unset; sessions will not survive a restart");
            Key::generate()
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // 1. Initialize Database Implementation
    #[cfg(feature = "db-sqlite")]
    let store = {
        let db_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:commonplace.db".to_string());
        Arc::new(SqliteStore::connect(&db_url).await.expect("Failed to init SQLite"))
    };

    // 2. Initialize Storage Implementation
    #[cfg(feature = "storage-local")]
    let media = {
        let root = env::var("MEDIA_ROOT").unwrap_or_else(|_| "./data/uploads".to_string());
        let prefix =
            env::var("MEDIA_URL_PREFIX").unwrap_or_else(|_| "/static/uploads".to_string());
        Arc::new(LocalMediaStore::new(root.into(), prefix))
    };

    // 3. Initialize Auth Implementation
    #[cfg(feature = "auth-argon2")]
    let auth = Arc::new(Argon2AuthProvider::new());

    // 4. Wrap in AppState shared by every worker
    let platform =
        Platform::new(store.clone(), store.clone(), store.clone(), store, auth);
    let state = web::Data::new(AppState { platform, media });

    let key = session_key();
    let bind = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    log::info!("🚀 Commonplace starting on http://{bind}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .configure(cp_api::configure_routes)
    })
    .bind(bind)?
    .run()
    .await
}
