use crate::{
    AppState,
    handlers::{artworks, contacts, identity, users},
};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Every route here sits behind `auth_middleware`, so handlers always receive a resolved
/// `AuthUser`. Routes needing more than a valid token (member-only, self-only, admin-only
/// methods on a shared path) check their `Permission` inside the handler.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /api/logout
        // Revokes the presented token's jti until its expiry.
        .route("/api/logout", post(identity::logout))
        // --- Accounts ---
        // Static segments take priority over `{id}`.
        .route("/api/users/me", get(users::get_me))
        .route("/api/users/change-password", put(users::change_password))
        .route("/api/users/me/liked-artworks", get(users::liked_artworks))
        .route("/api/users/me/contacts", get(users::my_contacts))
        // GET/DELETE are admin-only; PUT is self-only.
        .route(
            "/api/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/api/users/{id}/artworks", get(users::user_artworks))
        // --- Artwork catalog & like ledger ---
        .route("/api/artworks/submit", post(artworks::submit_artwork))
        // GET dispatches on the key: numeric id (admin) or style name. DELETE is admin-only.
        .route(
            "/api/artworks/{id}",
            get(artworks::get_artworks).delete(artworks::delete_artwork),
        )
        .route(
            "/api/artworks/{id}/like",
            post(artworks::like_artwork).delete(artworks::unlike_artwork),
        )
        // --- Contact inbox ---
        .route("/api/contact", post(contacts::create_contact))
        // GET is open to any token; DELETE is admin-only.
        .route(
            "/api/contacts/{id}",
            get(contacts::get_contact).delete(contacts::delete_contact),
        )
}
