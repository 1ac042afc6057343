use crate::{
    AppState,
    handlers::{contacts, users},
};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Read-only oversight endpoints whose every method is admin-only. The whole table is
/// wrapped in `admin_middleware`, which runs after `auth_middleware` has resolved the token.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /api/users
        .route("/api/users", get(users::list_users))
        // GET /api/contacts
        .route("/api/contacts", get(contacts::list_contacts))
        // GET /api/contacts/email/{email}
        // Exact match on the sender address.
        .route(
            "/api/contacts/email/{email}",
            get(contacts::list_contacts_by_email),
        )
}
