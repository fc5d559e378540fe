//! # cp-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the
//! `Platform` service. Every handler materializes the request's
//! `SessionContext` first and lets the service's authorization gate decide.

use std::sync::Arc;

use actix_multipart::Multipart;
use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use futures_util::StreamExt as _;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cp_core::error::AppError;
use cp_core::models::{Comment, Content};
use cp_core::traits::MediaStore;
use cp_services::Platform;

use crate::error::ApiError;
use crate::session;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub platform: Platform,
    pub media: Arc<dyn MediaStore>,
}

type ApiResult = Result<HttpResponse, ApiError>;

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct PublishArticleRequest {
    pub title: String,
    pub body: String,
}

#[derive(Deserialize)]
pub struct PublishVideoRequest {
    pub title: String,
    pub description: String,
    pub media_ref: Option<String>,
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub body: String,
    pub parent_comment_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct RoleRequest {
    pub is_admin: bool,
}

#[derive(Serialize)]
struct IdResponse {
    id: Uuid,
}

#[derive(Serialize)]
struct SessionResponse {
    user_id: Uuid,
    username: String,
    is_admin: bool,
}

#[derive(Serialize)]
struct ContentEntry {
    id: Uuid,
    kind: &'static str,
    title: String,
    body: String,
    media_ref: Option<String>,
    author: Option<String>,
    created_at: DateTime<Utc>,
}

impl ContentEntry {
    fn new(content: Content, author: Option<String>) -> Self {
        Self {
            id: content.id,
            kind: content.kind.as_str(),
            title: content.title,
            body: content.body,
            media_ref: content.media_ref,
            author,
            created_at: content.created_at,
        }
    }
}

#[derive(Serialize)]
struct CommentEntry {
    id: Uuid,
    author: String,
    body: String,
    parent_comment_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<(Comment, String)> for CommentEntry {
    fn from((comment, author): (Comment, String)) -> Self {
        Self {
            id: comment.id,
            author,
            body: comment.body,
            parent_comment_id: comment.parent_comment_id,
            created_at: comment.created_at,
        }
    }
}

#[derive(Serialize)]
struct UploadResponse {
    media_ref: String,
    url: String,
}

#[derive(Serialize)]
struct LikeCountResponse {
    count: i64,
}

// ── Accounts ────────────────────────────────────────────────────────────

/// Registration reports success without starting a session; the client
/// logs in afterwards.
pub async fn register(
    data: web::Data<AppState>,
    body: web::Json<CredentialsRequest>,
) -> ApiResult {
    let id = data.platform.register(&body.username, &body.password).await?;
    Ok(HttpResponse::Created().json(IdResponse { id }))
}

pub async fn login(
    data: web::Data<AppState>,
    http_session: Session,
    body: web::Json<CredentialsRequest>,
) -> ApiResult {
    let user = data.platform.login(&body.username, &body.password).await?;
    session::establish(&http_session, &user)?;
    Ok(HttpResponse::Ok().json(SessionResponse {
        user_id: user.id,
        username: user.username,
        is_admin: user.is_admin,
    }))
}

pub async fn logout(http_session: Session) -> ApiResult {
    session::clear(&http_session);
    Ok(HttpResponse::NoContent().finish())
}

pub async fn delete_account(data: web::Data<AppState>, http_session: Session) -> ApiResult {
    let ctx = session::current(&http_session);
    data.platform.delete_own_account(&ctx).await?;
    session::clear(&http_session);
    Ok(HttpResponse::NoContent().finish())
}

// ── Content ─────────────────────────────────────────────────────────────

pub async fn publish_article(
    data: web::Data<AppState>,
    http_session: Session,
    body: web::Json<PublishArticleRequest>,
) -> ApiResult {
    let ctx = session::current(&http_session);
    let id = data.platform.publish_article(&ctx, &body.title, &body.body).await?;
    Ok(HttpResponse::Created().json(IdResponse { id }))
}

pub async fn publish_video(
    data: web::Data<AppState>,
    http_session: Session,
    body: web::Json<PublishVideoRequest>,
) -> ApiResult {
    let ctx = session::current(&http_session);
    let body = body.into_inner();
    let id = data
        .platform
        .publish_video(&ctx, &body.title, &body.description, body.media_ref)
        .await?;
    Ok(HttpResponse::Created().json(IdResponse { id }))
}

/// Receives the raw upload on behalf of the blob-store collaborator and
/// answers with the media_ref a video publish can carry.
pub async fn upload_media(
    data: web::Data<AppState>,
    http_session: Session,
    mut payload: Multipart,
) -> ApiResult {
    let ctx = session::current(&http_session);
    if !ctx.is_authenticated() {
        return Err(AppError::Unauthorized("login required".into()).into());
    }

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(multipart_err)?;
        if field.name() != "media" {
            continue;
        }
        let content_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            bytes.extend_from_slice(&chunk.map_err(multipart_err)?);
        }
        if bytes.is_empty() {
            return Err(AppError::Validation("uploaded file is empty".into()).into());
        }

        let media_ref = data.media.save_upload(bytes, &content_type).await?;
        let url = data.media.media_url(&media_ref);
        return Ok(HttpResponse::Created().json(UploadResponse { media_ref, url }));
    }

    Err(AppError::Validation("multipart field 'media' is required".into()).into())
}

fn multipart_err(e: actix_multipart::MultipartError) -> ApiError {
    ApiError(AppError::Validation(format!("malformed multipart payload: {e}")))
}

pub async fn list_contents(data: web::Data<AppState>) -> ApiResult {
    let entries: Vec<ContentEntry> = data
        .platform
        .list_all()
        .await?
        .into_iter()
        .map(|(content, author)| ContentEntry::new(content, Some(author)))
        .collect();
    Ok(HttpResponse::Ok().json(entries))
}

pub async fn list_my_contents(data: web::Data<AppState>, http_session: Session) -> ApiResult {
    let ctx = session::current(&http_session);
    let entries: Vec<ContentEntry> = data
        .platform
        .list_mine(&ctx)
        .await?
        .into_iter()
        .map(|content| ContentEntry::new(content, None))
        .collect();
    Ok(HttpResponse::Ok().json(entries))
}

pub async fn list_author_contents(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult {
    let username = path.into_inner();
    let entries: Vec<ContentEntry> = data
        .platform
        .list_by_author(&username)
        .await?
        .into_iter()
        .map(|content| ContentEntry::new(content, Some(username.clone())))
        .collect();
    Ok(HttpResponse::Ok().json(entries))
}

pub async fn delete_content(
    data: web::Data<AppState>,
    http_session: Session,
    path: web::Path<Uuid>,
) -> ApiResult {
    let ctx = session::current(&http_session);
    data.platform.delete_content(&ctx, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ── Comment threads ─────────────────────────────────────────────────────

pub async fn add_comment(
    data: web::Data<AppState>,
    http_session: Session,
    path: web::Path<Uuid>,
    body: web::Json<CommentRequest>,
) -> ApiResult {
    let ctx = session::current(&http_session);
    let id = data
        .platform
        .add_comment(&ctx, path.into_inner(), &body.body, body.parent_comment_id)
        .await?;
    Ok(HttpResponse::Created().json(IdResponse { id }))
}

pub async fn top_level_comments(data: web::Data<AppState>, path: web::Path<Uuid>) -> ApiResult {
    let entries: Vec<CommentEntry> = data
        .platform
        .top_level_comments(path.into_inner())
        .await?
        .into_iter()
        .map(CommentEntry::from)
        .collect();
    Ok(HttpResponse::Ok().json(entries))
}

pub async fn replies(data: web::Data<AppState>, path: web::Path<Uuid>) -> ApiResult {
    let entries: Vec<CommentEntry> = data
        .platform
        .replies(path.into_inner())
        .await?
        .into_iter()
        .map(CommentEntry::from)
        .collect();
    Ok(HttpResponse::Ok().json(entries))
}

pub async fn delete_comment(
    data: web::Data<AppState>,
    http_session: Session,
    path: web::Path<Uuid>,
) -> ApiResult {
    let ctx = session::current(&http_session);
    data.platform.delete_comment(&ctx, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ── Likes ───────────────────────────────────────────────────────────────

pub async fn add_like(
    data: web::Data<AppState>,
    http_session: Session,
    path: web::Path<Uuid>,
) -> ApiResult {
    let ctx = session::current(&http_session);
    data.platform.add_like(&ctx, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn like_count(data: web::Data<AppState>, path: web::Path<Uuid>) -> ApiResult {
    let count = data.platform.like_count(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(LikeCountResponse { count }))
}

// ── Moderation ──────────────────────────────────────────────────────────

pub async fn list_accounts(data: web::Data<AppState>, http_session: Session) -> ApiResult {
    let ctx = session::current(&http_session);
    let accounts = data.platform.list_accounts(&ctx).await?;
    Ok(HttpResponse::Ok().json(accounts))
}

pub async fn set_role(
    data: web::Data<AppState>,
    http_session: Session,
    path: web::Path<String>,
    body: web::Json<RoleRequest>,
) -> ApiResult {
    let ctx = session::current(&http_session);
    data.platform.set_admin(&ctx, &path.into_inner(), body.is_admin).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn delete_user(
    data: web::Data<AppState>,
    http_session: Session,
    path: web::Path<String>,
) -> ApiResult {
    let ctx = session::current(&http_session);
    data.platform.delete_user_by_username(&ctx, &path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
