use actix_web::cookie::time::OffsetDateTime;
use actix_web::cookie::Cookie;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::{error, info};

use crate::auth::session::LoginRequest;
use crate::db::models::Session;
use crate::error::{AppError, StoreError};
use crate::AppState;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const USER_ULID_COOKIE: &str = "user_ulid";

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub user_name: String,
    pub password: String,
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

pub async fn sign_up(
    req: web::Json<SignUpRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("received signup request for user: {}", req.user_name);

    // Fast path: refuse a taken name before paying for a password hash.
    if state
        .registry
        .get_user_by_user_name(&req.user_name)
        .await?
        .is_some()
    {
        info!("signup rejected, user name taken: {}", req.user_name);
        return Ok(HttpResponse::NotAcceptable().body("NG"));
    }

    let user = match state.registry.new_user(&req.user_name, &req.password) {
        Ok(user) => user,
        Err(e) => {
            error!("signup validation failed for user {}: {}", req.user_name, e);
            return Err(e);
        }
    };

    match state.registry.create(user).await {
        Ok(_) => {
            info!("signup successful for user: {}", req.user_name);
            Ok(HttpResponse::Created().body("OK"))
        }
        Err(AppError::Store(StoreError::Duplicate)) => {
            // Two signups can both pass the fast path; the store's
            // uniqueness constraint picks the winner.
            info!("signup lost duplicate race for user: {}", req.user_name);
            Ok(HttpResponse::NotAcceptable().body("NG"))
        }
        Err(e) => {
            error!("signup failed for user {}: {}", req.user_name, e);
            Err(e)
        }
    }
}

pub async fn login(
    req: web::Json<LoginPayload>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("received login request for user: {}", req.user_name);

    let payload = req.into_inner();
    let user_name = payload.user_name.clone();
    match state
        .sessions
        .login(LoginRequest::new(payload.user_name, payload.password))
        .await
    {
        Ok(session) => {
            info!("login successful for user: {}", user_name);
            let (access, identity) = session_cookies(&session)?;
            Ok(HttpResponse::Ok()
                .cookie(access)
                .cookie(identity)
                .body("OK"))
        }
        Err(e) => {
            error!("login failed for user {}: {}", user_name, e);
            Err(e)
        }
    }
}

pub async fn secret(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user_ulid = req
        .cookie(USER_ULID_COOKIE)
        .ok_or_else(|| AppError::Validation("missing user_ulid cookie".to_string()))?;
    let access_token = req
        .cookie(ACCESS_TOKEN_COOKIE)
        .ok_or_else(|| AppError::Validation("missing access_token cookie".to_string()))?;

    match state
        .sessions
        .check_session(user_ulid.value(), access_token.value())
        .await
    {
        Ok(session) => {
            info!("session check passed for user: {}", session.user_ulid);
            let (access, identity) = session_cookies(&session)?;
            Ok(HttpResponse::Ok()
                .cookie(access)
                .cookie(identity)
                .body("Secret OK"))
        }
        Err(e) => {
            error!("session check failed for user {}: {}", user_ulid.value(), e);
            Err(e)
        }
    }
}

/// Both session cookies, expiring together with the session itself.
fn session_cookies(session: &Session) -> Result<(Cookie<'static>, Cookie<'static>), AppError> {
    let expires = OffsetDateTime::from_unix_timestamp(session.expired.timestamp())
        .map_err(|e| AppError::Internal(format!("session expiry out of range: {e}")))?;

    let access = Cookie::build(ACCESS_TOKEN_COOKIE, session.access_token.clone())
        .path("/")
        .http_only(true)
        .expires(expires)
        .finish();
    let identity = Cookie::build(USER_ULID_COOKIE, session.user_ulid.clone())
        .path("/")
        .expires(expires)
        .finish();

    Ok((access, identity))
}
