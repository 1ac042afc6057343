use axum::{
    Json,
    extract::{Multipart, Path, State, rejection::JsonRejection},
};

use crate::{
    AppState,
    auth::{self, AuthUser},
    error::{ApiError, ApiResult},
    handlers::forms::{FormData, upload_image},
    ledger,
    models::{ArtworkWithLikes, ChangePasswordRequest, Contact, MessageResponse, User, UserChanges},
    policy::{Permission, authorize},
};

async fn require_user(state: &AppState, id: i64) -> ApiResult<User> {
    state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// list_users
///
/// [Admin Route] Every registered member account.
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users", body = [User]),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_users(user: AuthUser, State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    authorize(&user, Permission::Admin)?;
    Ok(Json(state.repo.list_users().await?))
}

/// get_user
///
/// [Admin Route]
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<User>> {
    authorize(&user, Permission::Admin)?;
    Ok(Json(require_user(&state, id).await?))
}

/// delete_user
///
/// [Admin Route] Removes the account and its likes. Artworks the user submitted stay in the
/// catalog without an owner.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    authorize(&user, Permission::Admin)?;
    if !state.repo.delete_user(id).await? {
        return Err(ApiError::not_found("User not found"));
    }
    tracing::info!(user_id = id, admin_id = user.id, "user deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// update_user
///
/// [Self-Only Route] Multipart update of `username`, `email`, `password` and
/// `profile_image`. Each field sent replaces the stored one; absent fields are kept.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 403, description = "Not the profile owner"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username or email already exists")
    )
)]
pub async fn update_user(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> ApiResult<Json<User>> {
    authorize(&user, Permission::SelfOnly(id))?;
    require_user(&state, id).await?;

    let mut form = FormData::read(multipart).await?;
    let profile_image = match form.take_file("profile_image") {
        Some(file) => Some(upload_image(state.storage.as_ref(), "profiles", file).await?),
        None => None,
    };
    let password_hash = match form.raw("password") {
        Some(password) => Some(auth::hash_password(&password)?),
        None => None,
    };

    let changes = UserChanges {
        username: form.optional("username"),
        email: form.optional("email"),
        password_hash,
        profile_image,
    };

    let updated = state
        .repo
        .update_user(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    tracing::info!(user_id = id, "user profile updated");
    Ok(Json(updated))
}

/// get_me
///
/// [Member Route] The account behind the presented token.
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_me(user: AuthUser, State(state): State<AppState>) -> ApiResult<Json<User>> {
    authorize(&user, Permission::Member)?;
    Ok(Json(require_user(&state, user.id).await?))
}

/// change_password
///
/// [Member Route] Requires the current password. Existing tokens stay valid.
#[utoipa::path(
    put,
    path = "/api/users/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Old and new password are required"),
        (status = 403, description = "Incorrect old password")
    )
)]
pub async fn change_password(
    user: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    authorize(&user, Permission::Member)?;
    let Json(req) = payload?;

    let (Some(old_password), Some(new_password)) = (
        req.old_password.filter(|p| !p.is_empty()),
        req.new_password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request(
            "Old password and new password are required",
        ));
    };

    let account = require_user(&state, user.id).await?;
    if !auth::verify_password(&old_password, &account.password_hash) {
        return Err(ApiError::forbidden("Incorrect old password"));
    }

    state
        .repo
        .update_user(
            user.id,
            UserChanges {
                password_hash: Some(auth::hash_password(&new_password)?),
                ..UserChanges::default()
            },
        )
        .await?;
    tracing::info!(user_id = user.id, "password changed");
    Ok(Json(MessageResponse::new("Password updated successfully")))
}

/// liked_artworks
///
/// [Member Route] Artworks the caller has liked.
#[utoipa::path(
    get,
    path = "/api/users/me/liked-artworks",
    responses(
        (status = 200, description = "Liked artworks", body = [ArtworkWithLikes]),
        (status = 404, description = "No liked artworks found")
    )
)]
pub async fn liked_artworks(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ArtworkWithLikes>>> {
    authorize(&user, Permission::Member)?;
    let liked = ledger::liked_artworks(state.repo.as_ref(), user.id).await?;
    if liked.is_empty() {
        return Err(ApiError::not_found("No liked artworks found"));
    }
    Ok(Json(liked))
}

/// my_contacts
///
/// [Member Route] Contact messages whose email equals the caller's registered email.
#[utoipa::path(
    get,
    path = "/api/users/me/contacts",
    responses(
        (status = 200, description = "Contacts", body = [Contact]),
        (status = 404, description = "User not found or no contacts found")
    )
)]
pub async fn my_contacts(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Contact>>> {
    authorize(&user, Permission::Member)?;
    let account = require_user(&state, user.id).await?;

    let contacts = state.repo.list_contacts_by_email(&account.email).await?;
    if contacts.is_empty() {
        return Err(ApiError::not_found("No contacts found"));
    }
    Ok(Json(contacts))
}

/// user_artworks
///
/// [Authenticated Route] Artworks submitted by the given user, with like data from the
/// caller's point of view.
#[utoipa::path(
    get,
    path = "/api/users/{id}/artworks",
    params(("id" = i64, Path, description = "Owner user ID")),
    responses(
        (status = 200, description = "Artworks", body = [ArtworkWithLikes]),
        (status = 404, description = "User not found")
    )
)]
pub async fn user_artworks(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<ArtworkWithLikes>>> {
    authorize(&user, Permission::Authenticated)?;
    require_user(&state, id).await?;

    let artworks = state.repo.list_artworks_by_owner(id).await?;
    let enriched =
        ledger::with_likes_all(state.repo.as_ref(), artworks, user.member_id()).await?;
    Ok(Json(enriched))
}
