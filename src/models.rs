use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// A registered member, stored in the `users` table. The password hash is loaded for
/// sign-in checks but never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    /// Rendered as `YYYY-MM-DD HH:MM:SS` (UTC).
    #[serde(with = "timestamp::user")]
    #[ts(type = "string")]
    #[schema(value_type = String, example = "2025-01-02 20:07:51")]
    pub created_at: DateTime<Utc>,
    pub profile_image: Option<String>,
}

/// Admin
///
/// An operator account from the `admins` table. Tokens issued to admins carry `role = "admin"`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    // Free-form; 'admin' unless set at registration.
    pub role: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Artwork
///
/// A submitted piece, stored in the `art` table. `user_id` is null for seeded pieces and
/// for pieces whose owner account was deleted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Artwork {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub style: String,
    pub image_url: String,
    pub description: String,
    pub user_id: Option<i64>,
}

/// ArtworkWithLikes
///
/// An artwork as seen by a particular viewer: the stored fields plus the derived like count
/// and whether the viewer is one of the likers.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ArtworkWithLikes {
    #[serde(flatten)]
    pub artwork: Artwork,
    pub likes: i64,
    pub user_has_liked: bool,
}

/// ArtworkLike
///
/// One row of the like ledger in `artwork_likes`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct ArtworkLike {
    pub id: i64,
    pub artwork_id: i64,
    pub user_id: i64,
}

/// Contact
///
/// A free-form message left through the contact form (`contact` table).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    /// Rendered as `DD-MM-YYYY HH:MM:SS` (UTC).
    #[serde(with = "timestamp::contact")]
    #[ts(type = "string")]
    #[schema(value_type = String, example = "02-01-2025 20:07:51")]
    pub posted_at: DateTime<Utc>,
}

// --- Insert Payloads (Repository Inputs) ---

/// NewUser
///
/// Everything the repository needs to insert a `users` row. The hash is computed by the
/// handler before it reaches the repository.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewAdmin {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewArtwork {
    pub name: String,
    pub email: String,
    pub style: String,
    pub image_url: String,
    pub description: String,
    pub user_id: Option<i64>,
}

/// UserChanges
///
/// Whole-field replacements for a profile update. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub profile_image: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// SignInRequest
///
/// JSON body of `POST /api/signin`. The email is looked up in users first, then admins.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AdminRegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

/// ChangePasswordRequest
///
/// Both fields are optional at the wire level so that a missing one yields a 400 with a
/// message instead of a deserialization rejection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

// --- Response Schemas (Output) ---

/// MessageResponse
///
/// The plain `{"message": "..."}` acknowledgement most write endpoints return.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// SignInResponse
///
/// `user` is either a `User` or an `Admin` record, depending on which table matched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SignInResponse {
    pub message: String,
    #[ts(type = "User | Admin")]
    #[schema(value_type = Object)]
    pub user: serde_json::Value,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AdminLoginResponse {
    pub message: String,
    pub access_token: String,
}

/// LikeResponse
///
/// Result of a like or unlike: the post-operation count, always re-queried from the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LikeResponse {
    pub message: String,
    pub likes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SubmitArtworkResponse {
    pub message: String,
    pub image_url: String,
}

/// Timestamp layouts used by the user and contact records.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    fn serialize_with<S: Serializer>(
        value: &DateTime<Utc>,
        layout: &str,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(layout).to_string())
    }

    fn deserialize_with<'de, D: Deserializer<'de>>(
        deserializer: D,
        layout: &str,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, layout)
            .map(|naive| naive.and_utc())
            .map_err(D::Error::custom)
    }

    pub mod user {
        use super::*;

        pub const LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

        pub fn serialize<S: Serializer>(v: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
            serialize_with(v, LAYOUT, s)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
            deserialize_with(d, LAYOUT)
        }
    }

    pub mod contact {
        use super::*;

        pub const LAYOUT: &str = "%d-%m-%Y %H:%M:%S";

        pub fn serialize<S: Serializer>(v: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
            serialize_with(v, LAYOUT, s)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
            deserialize_with(d, LAYOUT)
        }
    }
}
