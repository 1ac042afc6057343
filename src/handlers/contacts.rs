use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult},
    models::{Contact, CreateContactRequest, MessageResponse},
    policy::{Permission, authorize},
};

/// create_contact
///
/// [Authenticated Route] Stores a message in the contact inbox. `posted_at` is set by the
/// database.
#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = CreateContactRequest,
    responses(
        (status = 201, description = "Stored", body = MessageResponse),
        (status = 400, description = "Missing field")
    )
)]
pub async fn create_contact(
    user: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateContactRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    authorize(&user, Permission::Authenticated)?;
    let Json(req) = payload?;

    if [&req.name, &req.email, &req.message]
        .iter()
        .any(|value| value.trim().is_empty())
    {
        return Err(ApiError::bad_request("Name, email and message are required"));
    }

    let contact = state.repo.create_contact(req).await?;
    tracing::info!(contact_id = contact.id, "contact message stored");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Contact message submitted successfully")),
    ))
}

/// list_contacts
///
/// [Admin Route]
#[utoipa::path(
    get,
    path = "/api/contacts",
    responses(
        (status = 200, description = "All contact messages", body = [Contact]),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_contacts(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Contact>>> {
    authorize(&user, Permission::Admin)?;
    Ok(Json(state.repo.list_contacts().await?))
}

/// list_contacts_by_email
///
/// [Admin Route] Exact, case-sensitive match on the sender email.
#[utoipa::path(
    get,
    path = "/api/contacts/email/{email}",
    params(("email" = String, Path, description = "Sender email")),
    responses((status = 200, description = "Matching contact messages", body = [Contact]))
)]
pub async fn list_contacts_by_email(
    user: AuthUser,
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<Vec<Contact>>> {
    authorize(&user, Permission::Admin)?;
    Ok(Json(state.repo.list_contacts_by_email(&email).await?))
}

/// get_contact
///
/// [Authenticated Route]
#[utoipa::path(
    get,
    path = "/api/contacts/{id}",
    params(("id" = i64, Path, description = "Contact ID")),
    responses(
        (status = 200, description = "Contact message", body = Contact),
        (status = 404, description = "Contact not found")
    )
)]
pub async fn get_contact(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Contact>> {
    authorize(&user, Permission::Authenticated)?;
    state
        .repo
        .get_contact(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Contact not found"))
}

/// delete_contact
///
/// [Admin Route]
#[utoipa::path(
    delete,
    path = "/api/contacts/{id}",
    params(("id" = i64, Path, description = "Contact ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Contact not found")
    )
)]
pub async fn delete_contact(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    authorize(&user, Permission::Admin)?;
    if !state.repo.delete_contact(id).await? {
        return Err(ApiError::not_found("Contact not found"));
    }
    tracing::info!(contact_id = id, "contact deleted");
    Ok(Json(MessageResponse::new("Contact deleted successfully")))
}
