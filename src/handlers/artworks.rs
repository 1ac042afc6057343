use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult},
    handlers::forms::{FormData, upload_image},
    ledger,
    models::{ArtworkWithLikes, LikeResponse, MessageResponse, NewArtwork, SubmitArtworkResponse},
    policy::{Permission, authorize},
};

/// submit_artwork
///
/// [Member Route] Multipart form with `name`, `email`, `style`, `description` and a
/// required `image` file. The caller becomes the owner.
#[utoipa::path(
    post,
    path = "/api/artworks/submit",
    responses(
        (status = 201, description = "Submitted", body = SubmitArtworkResponse),
        (status = 400, description = "Missing field, missing image or upload failure")
    )
)]
pub async fn submit_artwork(
    user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<SubmitArtworkResponse>)> {
    authorize(&user, Permission::Member)?;

    let mut form = FormData::read(multipart).await?;
    let name = form.required("name")?;
    let email = form.required("email")?;
    let style = form.required("style")?;
    let description = form.optional("description").unwrap_or_default();
    let image = form
        .take_file("image")
        .ok_or_else(|| ApiError::bad_request("No image file provided"))?;

    let image_url = upload_image(state.storage.as_ref(), "artworks", image).await?;

    let artwork = state
        .repo
        .create_artwork(NewArtwork {
            name,
            email,
            style,
            image_url: image_url.clone(),
            description,
            user_id: Some(user.id),
        })
        .await?;
    tracing::info!(artwork_id = artwork.id, user_id = user.id, "artwork submitted");

    Ok((
        StatusCode::CREATED,
        Json(SubmitArtworkResponse {
            message: "Artwork submitted successfully".to_string(),
            image_url,
        }),
    ))
}

/// get_artworks
///
/// [Authenticated Route] A numeric key fetches one artwork by id (admin only); any other
/// key lists the artworks of that style.
#[utoipa::path(
    get,
    path = "/api/artworks/{id}",
    params(("id" = String, Path, description = "Artwork ID or style name")),
    responses(
        (status = 200, description = "One artwork (numeric key) or a list (style)", body = [ArtworkWithLikes]),
        (status = 403, description = "Admin access required for lookups by id"),
        (status = 404, description = "Artwork not found")
    )
)]
pub async fn get_artworks(
    user: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Response> {
    let repo = state.repo.as_ref();

    if let Ok(id) = key.parse::<i64>() {
        authorize(&user, Permission::Admin)?;
        let artwork = repo
            .get_artwork(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Artwork not found"))?;
        let enriched: ArtworkWithLikes =
            ledger::with_likes(repo, artwork, user.member_id()).await?;
        return Ok(Json(enriched).into_response());
    }

    authorize(&user, Permission::Authenticated)?;
    let artworks = repo.list_artworks_by_style(&key).await?;
    let enriched = ledger::with_likes_all(repo, artworks, user.member_id()).await?;
    Ok(Json(enriched).into_response())
}

/// delete_artwork
///
/// [Admin Route] Deletes the artwork and every like recorded against it.
#[utoipa::path(
    delete,
    path = "/api/artworks/{id}",
    params(("id" = i64, Path, description = "Artwork ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Artwork not found")
    )
)]
pub async fn delete_artwork(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    authorize(&user, Permission::Admin)?;
    if !state.repo.delete_artwork(id).await? {
        return Err(ApiError::not_found("Artwork not found"));
    }
    tracing::info!(artwork_id = id, admin_id = user.id, "artwork deleted");
    Ok(Json(MessageResponse::new("Artwork deleted successfully")))
}

/// like_artwork
///
/// [Member Route] Idempotent; repeating the call reports "Artwork already liked".
#[utoipa::path(
    post,
    path = "/api/artworks/{id}/like",
    params(("id" = i64, Path, description = "Artwork ID")),
    responses(
        (status = 200, description = "Liked or already liked", body = LikeResponse),
        (status = 404, description = "Artwork not found")
    )
)]
pub async fn like_artwork(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<LikeResponse>> {
    authorize(&user, Permission::Member)?;
    let outcome = ledger::like(state.repo.as_ref(), id, user.id).await?;
    Ok(Json(LikeResponse {
        message: outcome.message().to_string(),
        likes: outcome.likes(),
    }))
}

/// unlike_artwork
///
/// [Member Route]
#[utoipa::path(
    delete,
    path = "/api/artworks/{id}/like",
    params(("id" = i64, Path, description = "Artwork ID")),
    responses(
        (status = 200, description = "Unliked", body = LikeResponse),
        (status = 400, description = "You have not liked this artwork"),
        (status = 404, description = "Artwork not found")
    )
)]
pub async fn unlike_artwork(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<LikeResponse>> {
    authorize(&user, Permission::Member)?;
    let outcome = ledger::unlike(state.repo.as_ref(), id, user.id).await?;
    Ok(Json(LikeResponse {
        message: outcome.message().to_string(),
        likes: outcome.likes(),
    }))
}
