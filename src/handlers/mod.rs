//! HTTP handlers, grouped by the component they serve.
//!
//! Every protected handler takes the resolved `AuthUser` and evaluates its route's
//! `Permission` before touching the repository.

pub mod artworks;
pub mod contacts;
pub mod forms;
pub mod identity;
pub mod users;

use crate::{
    auth::{self, Role},
    config::AppConfig,
    error::{ApiError, ApiResult},
    models::MessageResponse,
};
use axum::Json;

/// home
///
/// [Public Route] Landing message for the API root.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Welcome", body = MessageResponse))
)]
pub async fn home() -> Json<MessageResponse> {
    Json(MessageResponse::new("Welcome to the Gallery API"))
}

/// Signs a session token with the configured secret and lifetime.
pub(crate) fn token_for(config: &AppConfig, id: i64, role: Role) -> ApiResult<String> {
    auth::issue_token(id, role, &config.jwt_secret, config.token_ttl_secs)
        .map_err(ApiError::internal)
}
