use axum::{
    Json,
    extract::{Multipart, State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::{self, AuthUser, Role},
    error::{ApiError, ApiResult},
    handlers::{
        forms::{FormData, upload_image},
        token_for,
    },
    mailer::{self, welcome_mail},
    models::{
        AdminLoginRequest, AdminLoginResponse, AdminRegisterRequest, MessageResponse, NewAdmin,
        NewUser, SignInRequest, SignInResponse,
    },
    policy::{Permission, authorize},
};

/// register_user
///
/// [Public Route] Creates a member account from a multipart form
/// (`username`, `email`, `password`, optional `profile_image` file).
///
/// The welcome email is best-effort: a delivery failure is logged and the registration
/// still succeeds.
#[utoipa::path(
    post,
    path = "/api/register",
    responses(
        (status = 201, description = "Registered", body = MessageResponse),
        (status = 400, description = "Missing field or image upload failed"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let mut form = FormData::read(multipart).await?;
    let username = form.required("username")?;
    let email = form.required("email")?;
    let password = form.required_raw("password")?;

    if state.repo.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::conflict("Email already registered"));
    }

    let profile_image = match form.take_file("profile_image") {
        Some(file) => Some(upload_image(state.storage.as_ref(), "profiles", file).await?),
        None => None,
    };

    let user = state
        .repo
        .create_user(NewUser {
            username,
            email,
            password_hash: auth::hash_password(&password)?,
            profile_image,
        })
        .await?;
    tracing::info!(user_id = user.id, "user registered");

    mailer::send_best_effort(
        state.mailer.as_ref(),
        welcome_mail(&user.email, &user.username),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// sign_in
///
/// [Public Route] Exchanges email and password for a session token. Member accounts are
/// checked first, then admin accounts; admin tokens carry `role = "admin"`.
#[utoipa::path(
    post,
    path = "/api/signin",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> ApiResult<Json<SignInResponse>> {
    let Json(req) = payload?;

    if let Some(user) = state.repo.find_user_by_email(&req.email).await? {
        if auth::verify_password(&req.password, &user.password_hash) {
            let access_token = token_for(&state.config, user.id, Role::User)?;
            tracing::info!(user_id = user.id, "user signed in");
            return Ok(Json(SignInResponse {
                message: "Sign-in successful".to_string(),
                user: serde_json::to_value(&user).map_err(ApiError::internal)?,
                access_token,
            }));
        }
    }

    if let Some(admin) = state.repo.find_admin_by_email(&req.email).await? {
        if auth::verify_password(&req.password, &admin.password_hash) {
            let access_token = token_for(&state.config, admin.id, Role::Admin)?;
            tracing::info!(admin_id = admin.id, "admin signed in");
            return Ok(Json(SignInResponse {
                message: "Sign-in successful (Admin)".to_string(),
                user: serde_json::to_value(&admin).map_err(ApiError::internal)?,
                access_token,
            }));
        }
    }

    Err(ApiError::Unauthorized("Invalid email or password".to_string()))
}

/// logout
///
/// [Authenticated Route] Revokes the presented token until it would have expired anyway.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses((status = 200, description = "Logged out", body = MessageResponse))
)]
pub async fn logout(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<MessageResponse>> {
    authorize(&user, Permission::Authenticated)?;
    state.revocations.revoke(&user.jti, user.expires_at).await?;
    tracing::info!(jti = %user.jti, "token revoked");
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// admin_register
///
/// [Public Route] Creates an admin account. Only open while `ADMIN_SIGNUP_ENABLED` is set;
/// `role` defaults to "admin".
#[utoipa::path(
    post,
    path = "/api/admin-register",
    request_body = AdminRegisterRequest,
    responses(
        (status = 201, description = "Admin created", body = MessageResponse),
        (status = 403, description = "Admin registration disabled"),
        (status = 409, description = "Username or email already exists")
    )
)]
pub async fn admin_register(
    State(state): State<AppState>,
    payload: Result<Json<AdminRegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    if !state.config.admin_signup_enabled {
        return Err(ApiError::forbidden("Admin registration is disabled"));
    }
    let Json(req) = payload?;

    if [&req.username, &req.email, &req.password]
        .iter()
        .any(|value| value.trim().is_empty())
    {
        return Err(ApiError::bad_request(
            "Username, email and password are required",
        ));
    }
    if state.repo.find_admin_by_email(&req.email).await?.is_some() {
        return Err(ApiError::conflict("Email already registered"));
    }

    let admin = state
        .repo
        .create_admin(NewAdmin {
            username: req.username,
            email: req.email,
            password_hash: auth::hash_password(&req.password)?,
            role: req
                .role
                .filter(|role| !role.trim().is_empty())
                .unwrap_or_else(|| auth::ADMIN_ROLE.to_string()),
        })
        .await?;
    tracing::info!(admin_id = admin.id, role = %admin.role, "admin registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Admin registered successfully!")),
    ))
}

/// admin_login
///
/// [Public Route] Username-based admin sign-in. Returns an admin-role token.
#[utoipa::path(
    post,
    path = "/api/admin-login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AdminLoginResponse),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn admin_login(
    State(state): State<AppState>,
    payload: Result<Json<AdminLoginRequest>, JsonRejection>,
) -> ApiResult<Json<AdminLoginResponse>> {
    let Json(req) = payload?;

    let admin = state
        .repo
        .find_admin_by_username(&req.username)
        .await?
        .filter(|admin| auth::verify_password(&req.password, &admin.password_hash))
        .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".to_string()))?;

    Ok(Json(AdminLoginResponse {
        message: "Login successful!".to_string(),
        access_token: token_for(&state.config, admin.id, Role::Admin)?,
    }))
}
