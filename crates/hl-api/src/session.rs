//! Session-cookie plumbing shared by every authenticated handler.

use actix_web::cookie::{time::Duration, Cookie};
use actix_web::HttpRequest;
use hl_core::error::AppError;
use uuid::Uuid;

use crate::error::ApiError;
use crate::handlers::AppState;

pub const SESSION_COOKIE: &str = "session";

/// Pulls the session token out of the request cookie, if present.
pub fn session_token(req: &HttpRequest) -> Option<Uuid> {
    req.cookie(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
}

/// Resolves the calling user or fails with 401.
pub async fn session_user(req: &HttpRequest, state: &AppState) -> Result<Uuid, ApiError> {
    let token = session_token(req)
        .ok_or_else(|| ApiError(AppError::Unauthorized("not logged in".into())))?;
    Ok(state.sessions.user_for(token).await?)
}

pub fn session_cookie(token: Uuid) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .finish()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .max_age(Duration::ZERO)
        .finish()
}
