//! Magic link landing endpoint.
//!
//! Email deep links point here. The token authenticates the recipient and
//! carries the page they were invited to; on success the browser is
//! redirected there with a fresh short session token in the fragment, so
//! the front end can pick it up without it ever hitting server logs.

use actix_web::{HttpResponse, get, web};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::SessionService;
use crate::config::Config;
use crate::db::{DbPool, users};
use crate::error::{AppError, AppResult};
use crate::services::magic_link::MagicLinkService;

/// Query parameters for the magic link landing.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MagicQuery {
    pub token: String,
}

/// Verify a magic token and redirect to its embedded path.
#[utoipa::path(
    get,
    path = "/api/v1/auth/magic",
    tag = "Auth",
    params(("token" = String, Query, description = "Magic link token")),
    responses(
        (status = 302, description = "Redirect to the linked page"),
        (status = 401, description = "Invalid or expired link", body = crate::error::ErrorResponse),
    )
)]
#[get("/auth/magic")]
pub async fn consume_magic_link(
    pool: web::Data<DbPool>,
    sessions: web::Data<SessionService>,
    magic_links: web::Data<MagicLinkService>,
    config: web::Data<Config>,
    query: web::Query<MagicQuery>,
) -> AppResult<HttpResponse> {
    let claims = magic_links.verify(&query.token)?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid or expired magic link".to_string()))?;

    // The account must still exist; links minted for a since-deleted user
    // are dead.
    let user = users::find_by_id(pool.connection(), user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired magic link".to_string()))?;

    let session = sessions.issue(user.id, user.role, config.magic_link_ttl_secs)?;

    // Only server-relative paths are honored; anything else falls back to
    // the root so the link cannot be used as an open redirect.
    let path = if claims.path.starts_with('/') && !claims.path.starts_with("//") {
        claims.path
    } else {
        "/".to_string()
    };

    let target = format!(
        "{}{}#token={}",
        config.base_url.trim_end_matches('/'),
        path,
        urlencoding::encode(&session)
    );

    Ok(HttpResponse::Found()
        .insert_header(("Location", target))
        .finish())
}

/// Who am I. Resolves the caller's session to their account record.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = crate::models::UserResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ErrorResponse),
    ),
    security(("session" = []))
)]
#[get("/auth/me")]
pub async fn me(auth: crate::auth::AuthContext, pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let user = users::find_by_id(pool.connection(), auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown account".to_string()))?;

    Ok(HttpResponse::Ok().json(crate::models::UserResponse::from(user)))
}

/// Configure magic link and session routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(consume_magic_link).service(me);
}
