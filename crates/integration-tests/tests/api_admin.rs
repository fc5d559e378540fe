//! Moderation surface: role changes, the account listing, admin deletes.
//!
//! The first admin is minted the way the seed binary does it: directly
//! against the credential store, since no HTTP path may create one.

mod common;

use actix_web::http::StatusCode;
use actix_web::{test, App};
use cp_api::configure_routes;
use cp_core::traits::CredentialRepo;
use serde_json::json;

use common::{login, session_middleware, signup, state};

#[actix_web::test]
async fn moderation_requires_the_admin_role() {
    let (state, _) = state().await;
    let app = test::init_service(
        App::new().app_data(state).wrap(session_middleware()).configure(configure_routes),
    )
    .await;

    let cookie = signup(&app, "alice").await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/admin/accounts").cookie(cookie.clone()).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/admin/users/alice/role")
            .cookie(cookie.clone())
            .set_json(json!({ "is_admin": true }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete().uri("/admin/users/alice").cookie(cookie).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn account_listing_is_hash_free() {
    let (state, store) = state().await;
    let app = test::init_service(
        App::new().app_data(state).wrap(session_middleware()).configure(configure_routes),
    )
    .await;

    signup(&app, "root").await;
    store.set_admin("root", true).await.unwrap();
    let admin = login(&app, "root", "pw1").await;
    signup(&app, "alice").await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/admin/accounts").cookie(admin).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let accounts: serde_json::Value = test::read_body_json(resp).await;
    let entries = accounts.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    for entry in entries {
        assert!(entry["username"].is_string());
        assert!(entry.get("password_hash").is_none());
    }
}

#[actix_web::test]
async fn promotion_takes_effect_on_next_login() {
    let (state, store) = state().await;
    let app = test::init_service(
        App::new().app_data(state).wrap(session_middleware()).configure(configure_routes),
    )
    .await;

    signup(&app, "root").await;
    store.set_admin("root", true).await.unwrap();
    let admin = login(&app, "root", "pw1").await;
    signup(&app, "alice").await;

    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/admin/users/alice/role")
            .cookie(admin.clone())
            .set_json(json!({ "is_admin": true }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/login")
            .set_json(json!({ "username": "alice", "password": "pw1" }))
            .to_request(),
    )
    .await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["is_admin"], true);

    // Demote an unknown name: reported, not crashed.
    let resp = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/admin/users/ghost/role")
            .cookie(admin)
            .set_json(json!({ "is_admin": false }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn admin_can_remove_any_user_content_and_comment() {
    let (state, store) = state().await;
    let app = test::init_service(
        App::new().app_data(state).wrap(session_middleware()).configure(configure_routes),
    )
    .await;

    signup(&app, "root").await;
    store.set_admin("root", true).await.unwrap();
    let admin = login(&app, "root", "pw1").await;
    let alice = signup(&app, "alice").await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/articles")
            .cookie(alice.clone())
            .set_json(json!({ "title": "T", "body": "B" }))
            .to_request(),
    )
    .await;
    let created: serde_json::Value = test::read_body_json(resp).await;
    let content_id = created["id"].as_str().unwrap().to_string();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/contents/{content_id}/comments"))
            .cookie(alice)
            .set_json(json!({ "body": "hi" }))
            .to_request(),
    )
    .await;
    let comment: serde_json::Value = test::read_body_json(resp).await;
    let comment_id = comment["id"].as_str().unwrap().to_string();

    // Admin removes the comment without owning it.
    let resp = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/comments/{comment_id}"))
            .cookie(admin.clone())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // Admin deletes the whole account by username; its content follows.
    let resp = test::call_service(
        &app,
        test::TestRequest::delete().uri("/admin/users/alice").cookie(admin.clone()).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/contents").to_request()).await;
    let listing: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(listing.as_array().unwrap().len(), 0);

    let resp = test::call_service(
        &app,
        test::TestRequest::delete().uri("/admin/users/ghost").cookie(admin).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
