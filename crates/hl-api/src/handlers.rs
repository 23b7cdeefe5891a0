//! # hl-api Handlers
//!
//! The synchronization layer: each handler translates one HTTP request
//! into a short sequence of concept calls and stitches together the
//! cross-concept invariants (a created post must land in its thread's
//! content list, a deleted thread must take its posts with it).
//!
//! There are no multi-document transactions underneath. Where one
//! logical operation spans two collections, the second step is paired
//! with an explicit compensation for the first, so a half-applied
//! request is rolled back instead of leaving an orphan.

use actix_web::{web, HttpRequest, HttpResponse};
use hl_core::error::AppError;
use hl_core::models::ProfileQuestion;
use hl_core::traits::{Authing, Posting, Profiling, Sessioning, Threading};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::session::{removal_cookie, session_cookie, session_token, session_user};

/// State shared across all actix-web workers. Concepts are held behind
/// their trait objects; handlers never see a concrete plugin.
pub struct AppState {
    pub threads: Arc<dyn Threading>,
    pub posts: Arc<dyn Posting>,
    pub profiles: Arc<dyn Profiling>,
    pub auth: Arc<dyn Authing>,
    pub sessions: Arc<dyn Sessioning>,
    pub question: ProfileQuestion,
}

type HandlerResult = Result<HttpResponse, ApiError>;

// ── Auth / session ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub async fn register(data: web::Data<AppState>, body: web::Json<Credentials>) -> HandlerResult {
    let user = data.auth.create(&body.username, &body.password).await?;
    Ok(HttpResponse::Created().json(json!({ "msg": "User created!", "user": user })))
}

pub async fn login(data: web::Data<AppState>, body: web::Json<Credentials>) -> HandlerResult {
    let user = data.auth.authenticate(&body.username, &body.password).await?;
    let token = data.sessions.start(user.id).await?;
    Ok(HttpResponse::Ok()
        .cookie(session_cookie(token))
        .json(json!({ "msg": "Logged in!", "user": user })))
}

pub async fn logout(data: web::Data<AppState>, req: HttpRequest) -> HandlerResult {
    if let Some(token) = session_token(&req) {
        data.sessions.end(token).await?;
    }
    Ok(HttpResponse::Ok()
        .cookie(removal_cookie())
        .json(json!({ "msg": "Logged out!" })))
}

pub async fn current_session(data: web::Data<AppState>, req: HttpRequest) -> HandlerResult {
    let user_id = session_user(&req, &data).await?;
    let user = data.auth.user_by_id(user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "user": user })))
}

pub async fn get_user(data: web::Data<AppState>, path: web::Path<String>) -> HandlerResult {
    let user = data.auth.user_by_username(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "user": user })))
}

// ── Threads ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateThreadBody {
    pub title: String,
    /// Comma-joined post id list (document-store contract).
    #[serde(rename = "threadContent", default)]
    pub thread_content: String,
    /// Comma-joined user id list.
    #[serde(default)]
    pub members: String,
}

#[derive(Deserialize)]
pub struct DeleteThreadBody {
    pub id: Uuid,
}

#[derive(Deserialize)]
pub struct EditTitleBody {
    pub title: String,
}

fn parse_id_list(raw: &str) -> Result<Vec<Uuid>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s).map_err(|_| {
                ApiError(AppError::ValidationError(format!("'{}' is not a valid id", s)))
            })
        })
        .collect()
}

pub async fn create_thread(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateThreadBody>,
) -> HandlerResult {
    let user = session_user(&req, &data).await?;
    let content = parse_id_list(&body.thread_content)?;
    let members = parse_id_list(&body.members)?;

    let thread = data
        .threads
        .create_thread(user, &body.title, &content, &members)
        .await?;
    Ok(HttpResponse::Created().json(json!({ "msg": "Thread created!", "thread": thread })))
}

/// Returns the posts referenced by the thread's content list, in
/// timeline order.
pub async fn get_thread_posts(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> HandlerResult {
    session_user(&req, &data).await?;
    let thread = data.threads.get_thread(path.into_inner()).await?;
    let posts = data.posts.posts_by_id(&thread.content).await?;
    Ok(HttpResponse::Ok().json(json!({ "thread": thread, "posts": posts })))
}

pub async fn edit_thread_title(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<EditTitleBody>,
) -> HandlerResult {
    let user = session_user(&req, &data).await?;
    let id = path.into_inner();

    data.threads.assert_creator(id, user).await?;
    data.threads.edit_title(id, &body.title).await?;
    Ok(HttpResponse::Ok().json(json!({ "msg": "Title updated!" })))
}

/// Cascading delete: every post referenced by the thread goes first,
/// then the thread document itself. Author checks are bypassed here —
/// the creator check covers the whole cascade. Posts already gone are
/// tolerated so a half-finished cascade can be re-run.
pub async fn delete_thread(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<DeleteThreadBody>,
) -> HandlerResult {
    let user = session_user(&req, &data).await?;
    data.threads.assert_creator(body.id, user).await?;

    let thread = data.threads.get_thread(body.id).await?;
    for post_id in &thread.content {
        match data.posts.delete_post(*post_id).await {
            Ok(()) | Err(AppError::NotFound(_, _)) => {}
            Err(e) => return Err(e.into()),
        }
    }
    data.threads.delete_thread(body.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "msg": "Thread deleted!" })))
}

pub async fn join_thread(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> HandlerResult {
    let user = session_user(&req, &data).await?;
    data.threads.join(path.into_inner(), user).await?;
    Ok(HttpResponse::Ok().json(json!({ "msg": "Joined thread!" })))
}

pub async fn leave_thread(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> HandlerResult {
    let user = session_user(&req, &data).await?;
    data.threads.leave(path.into_inner(), user).await?;
    Ok(HttpResponse::Ok().json(json!({ "msg": "Left thread!" })))
}

// ── Posts ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreatePostBody {
    pub content: String,
    /// The target thread id.
    pub id: Uuid,
    #[serde(default)]
    pub options: Option<serde_json::Value>,
}

#[derive(Deserialize)]
pub struct UpdatePostBody {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub options: Option<serde_json::Value>,
}

/// Create-then-append, with compensation: if the append to the
/// thread's content list fails after the post document was written,
/// the post is deleted again so no orphan survives the request.
///
/// Posting deliberately does not require thread membership; anyone
/// with a session may post to any thread.
pub async fn create_post(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreatePostBody>,
) -> HandlerResult {
    let user = session_user(&req, &data).await?;

    // Fail before mutating anything if the thread is already gone.
    data.threads.get_thread(body.id).await?;

    let post = data
        .posts
        .create_post(user, &body.content, body.id, body.options.clone())
        .await?;

    if let Err(append_err) = data.threads.append_post(post.thread, post.id).await {
        log::warn!(
            "appending post {} to thread {} failed, rolling back: {}",
            post.id,
            post.thread,
            append_err
        );
        if let Err(comp_err) = data.posts.delete_post(post.id).await {
            log::error!("compensation failed, post {} is orphaned: {}", post.id, comp_err);
            return Err(AppError::Internal(format!(
                "post {} created but not linked to its thread",
                post.id
            ))
            .into());
        }
        return Err(append_err.into());
    }

    Ok(HttpResponse::Created().json(json!({ "msg": "Post created!", "post": post })))
}

pub async fn update_post(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostBody>,
) -> HandlerResult {
    let user = session_user(&req, &data).await?;
    let id = path.into_inner();

    data.posts.assert_author(id, user).await?;
    data.posts
        .update_post(id, body.content.as_deref(), body.options.clone())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "msg": "Post updated!" })))
}

/// Remove-then-delete, mirror image of `create_post`: the post id
/// leaves the thread's content list first, and if the document delete
/// then fails the id is re-appended.
pub async fn delete_post(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> HandlerResult {
    let user = session_user(&req, &data).await?;
    let id = path.into_inner();

    data.posts.assert_author(id, user).await?;
    let post = data.posts.get_post(id).await?;

    // A missing thread just means there is no content list to fix.
    let removed = match data.threads.remove_post(post.thread, post.id).await {
        Ok(()) => true,
        Err(AppError::NotFound(_, _)) => false,
        Err(e) => return Err(e.into()),
    };

    if let Err(del_err) = data.posts.delete_post(post.id).await {
        if removed {
            if let Err(comp_err) = data.threads.append_post(post.thread, post.id).await {
                log::error!(
                    "compensation failed, post {} unlinked from thread {}: {}",
                    post.id,
                    post.thread,
                    comp_err
                );
            }
        }
        return Err(del_err.into());
    }

    Ok(HttpResponse::Ok().json(json!({ "msg": "Post deleted!" })))
}

pub async fn get_posts_by_author(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> HandlerResult {
    session_user(&req, &data).await?;
    let posts = data.posts.posts_by_author(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "posts": posts })))
}

// ── Profiling ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ProfileAnswerBody {
    #[serde(rename = "selectedChoices")]
    pub selected_choices: Vec<String>,
}

pub async fn get_profile_question(data: web::Data<AppState>) -> HandlerResult {
    Ok(HttpResponse::Ok().json(json!({ "question": data.question })))
}

/// Serves both `ask` (first answer) and `updateProfile` (replacement);
/// the store upserts on (user, question) either way.
pub async fn answer_profile(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ProfileAnswerBody>,
) -> HandlerResult {
    let user = session_user(&req, &data).await?;
    let record = data
        .profiles
        .upsert_answer(user, &body.selected_choices)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "msg": "Profile saved!", "profile": record })))
}

pub async fn get_profile(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> HandlerResult {
    session_user(&req, &data).await?;
    let records = data.profiles.answers_for(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "profile": records })))
}
