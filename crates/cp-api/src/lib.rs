//! # cp-api
//!
//! The web routing and orchestration layer for Commonplace. Handlers speak
//! JSON; page rendering belongs to the host front end.

pub mod error;
pub mod handlers;
pub mod session;

use actix_web::web;

/// Configures the routes for the platform.
///
/// # Developer Note
/// We use a scoped configuration to allow the main binary to mount
/// the API under different paths if needed (e.g., /api/v1/).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            // Accounts
            .route("/register", web::post().to(handlers::register))
            .route("/login", web::post().to(handlers::login))
            .route("/logout", web::post().to(handlers::logout))
            .route("/account", web::delete().to(handlers::delete_account))
            // Content
            .route("/contents", web::get().to(handlers::list_contents))
            .route("/contents/mine", web::get().to(handlers::list_my_contents))
            .route("/contents/{id}", web::delete().to(handlers::delete_content))
            .route("/users/{username}/contents", web::get().to(handlers::list_author_contents))
            .route("/articles", web::post().to(handlers::publish_article))
            .route("/videos", web::post().to(handlers::publish_video))
            .route("/uploads", web::post().to(handlers::upload_media))
            // Comment threads
            .route("/contents/{id}/comments", web::get().to(handlers::top_level_comments))
            .route("/contents/{id}/comments", web::post().to(handlers::add_comment))
            .route("/comments/{id}/replies", web::get().to(handlers::replies))
            .route("/comments/{id}", web::delete().to(handlers::delete_comment))
            // Likes (video vertical)
            .route("/contents/{id}/likes", web::post().to(handlers::add_like))
            .route("/contents/{id}/likes", web::get().to(handlers::like_count))
            // Moderation
            .route("/admin/accounts", web::get().to(handlers::list_accounts))
            .route("/admin/users/{username}/role", web::put().to(handlers::set_role))
            .route("/admin/users/{username}", web::delete().to(handlers::delete_user)),
    );
}
