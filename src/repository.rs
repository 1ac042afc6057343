use crate::models::{
    Admin, Artwork, ArtworkLike, Contact, CreateContactRequest, NewAdmin, NewArtwork, NewUser,
    User, UserChanges,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

pub type RepoResult<T> = Result<T, sqlx::Error>;

/// Repository Trait
///
/// The persistence contract used by handlers, the like ledger and the auth extractor.
/// Every method maps onto one filtered select, insert, update or delete, except the two
/// cascading deletes which run as a single transaction.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across Axum tasks.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>>;
    // Exact (case-sensitive) match on the stored email.
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn list_users(&self) -> RepoResult<Vec<User>>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    // Replaces only the fields set in `changes`. `None` when the user does not exist.
    async fn update_user(&self, id: i64, changes: UserChanges) -> RepoResult<Option<User>>;
    // Removes the user's likes, detaches their artworks, then removes the user.
    async fn delete_user(&self, id: i64) -> RepoResult<bool>;

    // --- Admins ---
    async fn find_admin_by_email(&self, email: &str) -> RepoResult<Option<Admin>>;
    async fn find_admin_by_username(&self, username: &str) -> RepoResult<Option<Admin>>;
    async fn create_admin(&self, admin: NewAdmin) -> RepoResult<Admin>;

    // --- Artworks ---
    async fn create_artwork(&self, artwork: NewArtwork) -> RepoResult<Artwork>;
    async fn get_artwork(&self, id: i64) -> RepoResult<Option<Artwork>>;
    async fn list_artworks_by_style(&self, style: &str) -> RepoResult<Vec<Artwork>>;
    async fn list_artworks_by_owner(&self, user_id: i64) -> RepoResult<Vec<Artwork>>;
    // Removes the artwork's likes, then the artwork, in one transaction.
    async fn delete_artwork(&self, id: i64) -> RepoResult<bool>;

    // --- Like Ledger ---
    async fn find_like(&self, artwork_id: i64, user_id: i64) -> RepoResult<Option<ArtworkLike>>;
    // Returns true only if a row was inserted.
    async fn insert_like(&self, artwork_id: i64, user_id: i64) -> RepoResult<bool>;
    async fn delete_like(&self, artwork_id: i64, user_id: i64) -> RepoResult<bool>;
    async fn count_likes(&self, artwork_id: i64) -> RepoResult<i64>;
    async fn list_likes_by_user(&self, user_id: i64) -> RepoResult<Vec<ArtworkLike>>;

    // --- Contact Inbox ---
    async fn create_contact(&self, contact: CreateContactRequest) -> RepoResult<Contact>;
    async fn list_contacts(&self) -> RepoResult<Vec<Contact>>;
    async fn list_contacts_by_email(&self, email: &str) -> RepoResult<Vec<Contact>>;
    async fn get_contact(&self, id: i64) -> RepoResult<Option<Contact>>;
    async fn delete_contact(&self, id: i64) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, profile_image";
const ADMIN_COLUMNS: &str = "id, username, email, password_hash, role, created_at";
const ARTWORK_COLUMNS: &str = "id, name, email, style, image_url, description, user_id";
const CONTACT_COLUMNS: &str = "id, name, email, message, posted_at";

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations under `./migrations`.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&self.pool)
            .await
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, password_hash, profile_image, created_at)
             VALUES ($1, $2, $3, $4, NOW())
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.profile_image)
        .fetch_one(&self.pool)
        .await
    }

    /// update_user
    ///
    /// Uses `COALESCE` so each column is only replaced when the matching change is `Some`.
    async fn update_user(&self, id: i64, changes: UserChanges) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET username = COALESCE($2, username),
                 email = COALESCE($3, email),
                 password_hash = COALESCE($4, password_hash),
                 profile_image = COALESCE($5, profile_image)
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.profile_image)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_user(&self, id: i64) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM artwork_likes WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE art SET user_id = NULL WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn find_admin_by_email(&self, email: &str) -> RepoResult<Option<Admin>> {
        sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_admin_by_username(&self, username: &str) -> RepoResult<Option<Admin>> {
        sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_admin(&self, admin: NewAdmin) -> RepoResult<Admin> {
        sqlx::query_as::<_, Admin>(&format!(
            "INSERT INTO admins (username, email, password_hash, role, created_at)
             VALUES ($1, $2, $3, $4, NOW())
             RETURNING {ADMIN_COLUMNS}"
        ))
        .bind(admin.username)
        .bind(admin.email)
        .bind(admin.password_hash)
        .bind(admin.role)
        .fetch_one(&self.pool)
        .await
    }

    async fn create_artwork(&self, artwork: NewArtwork) -> RepoResult<Artwork> {
        sqlx::query_as::<_, Artwork>(&format!(
            "INSERT INTO art (name, email, style, image_url, description, user_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {ARTWORK_COLUMNS}"
        ))
        .bind(artwork.name)
        .bind(artwork.email)
        .bind(artwork.style)
        .bind(artwork.image_url)
        .bind(artwork.description)
        .bind(artwork.user_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_artwork(&self, id: i64) -> RepoResult<Option<Artwork>> {
        sqlx::query_as::<_, Artwork>(&format!("SELECT {ARTWORK_COLUMNS} FROM art WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_artworks_by_style(&self, style: &str) -> RepoResult<Vec<Artwork>> {
        sqlx::query_as::<_, Artwork>(&format!(
            "SELECT {ARTWORK_COLUMNS} FROM art WHERE style = $1 ORDER BY id"
        ))
        .bind(style)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_artworks_by_owner(&self, user_id: i64) -> RepoResult<Vec<Artwork>> {
        sqlx::query_as::<_, Artwork>(&format!(
            "SELECT {ARTWORK_COLUMNS} FROM art WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn delete_artwork(&self, id: i64) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM artwork_likes WHERE artwork_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM art WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn find_like(&self, artwork_id: i64, user_id: i64) -> RepoResult<Option<ArtworkLike>> {
        sqlx::query_as::<_, ArtworkLike>(
            "SELECT id, artwork_id, user_id FROM artwork_likes WHERE artwork_id = $1 AND user_id = $2",
        )
        .bind(artwork_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// insert_like
    ///
    /// `ON CONFLICT DO NOTHING` against the (artwork_id, user_id) unique constraint, so a
    /// concurrent duplicate is a no-op rather than a second row.
    async fn insert_like(&self, artwork_id: i64, user_id: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            "INSERT INTO artwork_likes (artwork_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(artwork_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_like(&self, artwork_id: i64, user_id: i64) -> RepoResult<bool> {
        let result =
            sqlx::query("DELETE FROM artwork_likes WHERE artwork_id = $1 AND user_id = $2")
                .bind(artwork_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_likes(&self, artwork_id: i64) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM artwork_likes WHERE artwork_id = $1")
            .bind(artwork_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn list_likes_by_user(&self, user_id: i64) -> RepoResult<Vec<ArtworkLike>> {
        sqlx::query_as::<_, ArtworkLike>(
            "SELECT id, artwork_id, user_id FROM artwork_likes WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_contact(&self, contact: CreateContactRequest) -> RepoResult<Contact> {
        sqlx::query_as::<_, Contact>(&format!(
            "INSERT INTO contact (name, email, message, posted_at)
             VALUES ($1, $2, $3, NOW())
             RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(contact.name)
        .bind(contact.email)
        .bind(contact.message)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_contacts(&self) -> RepoResult<Vec<Contact>> {
        sqlx::query_as::<_, Contact>(&format!("SELECT {CONTACT_COLUMNS} FROM contact ORDER BY id"))
            .fetch_all(&self.pool)
            .await
    }

    async fn list_contacts_by_email(&self, email: &str) -> RepoResult<Vec<Contact>> {
        sqlx::query_as::<_, Contact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contact WHERE email = $1 ORDER BY id"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_contact(&self, id: i64) -> RepoResult<Option<Contact>> {
        sqlx::query_as::<_, Contact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contact WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_contact(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM contact WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
