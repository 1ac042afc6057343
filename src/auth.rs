use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::{ApiError, ApiResult},
    repository::RepositoryState,
    revocation::RevocationState,
};

pub const ADMIN_ROLE: &str = "admin";

/// Claims
///
/// The signed payload of a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the `users.id` or `admins.id` of the holder.
    pub sub: i64,
    /// Present (and equal to "admin") only on tokens issued to admin accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Token id (jti): the key under which logout records the revocation.
    pub jti: String,
    pub iat: usize,
    pub exp: usize,
}

/// Role
///
/// Which table the token holder came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request. Handlers receive it as an argument and
/// pass it to `policy::authorize` together with the route's permission.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The `users.id` of the holder, or `None` for admin tokens.
    pub fn member_id(&self) -> Option<i64> {
        match self.role {
            Role::User => Some(self.id),
            Role::Admin => None,
        }
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        let role = match claims.role.as_deref() {
            Some(ADMIN_ROLE) => Role::Admin,
            _ => Role::User,
        };
        let expires_at = Utc
            .timestamp_opt(claims.exp as i64, 0)
            .single()
            .unwrap_or_else(Utc::now);
        AuthUser {
            id: claims.sub,
            role,
            jti: claims.jti,
            expires_at,
        }
    }
}

/// issue_token
///
/// Signs an HS256 token for `id` that expires after `ttl_secs`. Each token gets a fresh
/// `jti` so it can be revoked on its own.
pub fn issue_token(
    id: i64,
    role: Role,
    secret: &str,
    ttl_secs: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: id,
        role: match role {
            Role::Admin => Some(ADMIN_ROLE.to_string()),
            Role::User => None,
        },
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::seconds(ttl_secs)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// decode_token
///
/// Verifies signature and expiry. Revocation is checked separately by the extractor.
pub fn decode_token(token: &str, secret: &str) -> ApiResult<Claims> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        match e.kind() {
            ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
            kind => tracing::debug!(?kind, "rejected invalid token"),
        }
        ApiError::unauthorized()
    })
}

/// AuthUser Extractor Implementation
///
/// 1. Reuses the identity already resolved by the auth middleware, if any.
/// 2. Local bypass: in `Env::Local`, an `x-user-id` header naming an existing user.
/// 3. Bearer token: signature and expiry via `decode_token`.
/// 4. Revocation: the token's `jti` must not be in the revocation store.
///
/// Rejection: 401 with `{"message": ...}` on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
    RevocationState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            let bypass_id = parts
                .headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<i64>().ok());
            if let Some(user_id) = bypass_id {
                let repo = RepositoryState::from_ref(state);
                if let Some(user) = repo.get_user(user_id).await? {
                    return Ok(AuthUser {
                        id: user.id,
                        role: Role::User,
                        jti: format!("local-bypass-{}", user.id),
                        expires_at: Utc::now() + Duration::seconds(config.token_ttl_secs),
                    });
                }
            }
        }

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(ApiError::unauthorized)?;

        let claims = decode_token(token, &config.jwt_secret)?;

        let revocations = RevocationState::from_ref(state);
        if revocations.is_revoked(&claims.jti).await? {
            tracing::debug!(jti = %claims.jti, "rejected revoked token");
            return Err(ApiError::unauthorized());
        }

        Ok(AuthUser::from(claims))
    }
}

// --- Password hashing (Argon2id, default parameters) ---

pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e).into()))
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
