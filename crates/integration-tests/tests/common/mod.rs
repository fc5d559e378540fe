//! Shared fixture: a full application over the real plugins, backed by an
//! in-memory database and a throwaway media directory.
#![allow(dead_code)] // not every test binary uses every helper

use std::sync::Arc;

use actix_http::Request;
use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web, Error};
use uuid::Uuid;

use cp_api::handlers::AppState;
use cp_auth_argon2::Argon2AuthProvider;
use cp_core::traits::MediaStore;
use cp_db_sqlite::SqliteStore;
use cp_services::Platform;
use cp_storage_local::LocalMediaStore;

pub async fn state() -> (web::Data<AppState>, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::connect_memory().await.unwrap());
    let platform = Platform::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(Argon2AuthProvider::new()),
    );
    let media_root = std::env::temp_dir().join(format!("commonplace-test-{}", Uuid::now_v7()));
    let media: Arc<dyn MediaStore> =
        Arc::new(LocalMediaStore::new(media_root, "/static/uploads".into()));
    (web::Data::new(AppState { platform, media }), store)
}

pub fn session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_secure(false)
        .build()
}

/// Registers `username` with the fixture password and returns the session
/// cookie from a follow-up login.
pub async fn signup<S, B>(app: &S, username: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(serde_json::json!({ "username": username, "password": "pw1" }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    login(app, username, "pw1").await
}

pub async fn login<S, B>(app: &S, username: &str, password: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(serde_json::json!({ "username": username, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    resp.response()
        .cookies()
        .next()
        .expect("login must set the session cookie")
        .into_owned()
}
