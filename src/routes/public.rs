use crate::{
    AppState,
    handlers::{self, identity},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Landing, health check and the account entry points that hand out tokens.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::home))
        // GET /health
        // Liveness check for load balancers; touches no collaborator.
        .route("/health", get(|| async { "ok" }))
        // POST /api/register (multipart, optional profile_image)
        .route("/api/register", post(identity::register_user))
        // POST /api/signin
        // Members first, then admins. Returns the bearer token.
        .route("/api/signin", post(identity::sign_in))
        // POST /api/admin-register
        // Closed with 403 unless ADMIN_SIGNUP_ENABLED.
        .route("/api/admin-register", post(identity::admin_register))
        .route("/api/admin-login", post(identity::admin_login))
}
