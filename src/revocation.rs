use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// RevocationStore
///
/// The set of logged-out token ids (`jti`). Each entry only needs to outlive the token it
/// revokes, so every insert carries that token's expiry.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), sqlx::Error>;
    async fn is_revoked(&self, jti: &str) -> Result<bool, sqlx::Error>;
}

/// InMemoryRevocationStore
///
/// Process-local set. Revocations are lost on restart and are not visible to other
/// instances; use `PostgresRevocationStore` for multi-instance deployments.
#[derive(Default)]
pub struct InMemoryRevocationStore {
    revoked: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.revoked.read().await.len()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        let now = Utc::now();
        let mut revoked = self.revoked.write().await;
        revoked.retain(|_, exp| *exp > now);
        revoked.insert(jti.to_string(), expires_at);
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, sqlx::Error> {
        Ok(self.revoked.read().await.contains_key(jti))
    }
}

/// PostgresRevocationStore
///
/// Persists revocations in `revoked_tokens`, shared by every instance on the same database.
pub struct PostgresRevocationStore {
    pool: PgPool,
}

impl PostgresRevocationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevocationStore for PostgresRevocationStore {
    async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "INSERT INTO revoked_tokens (jti, expires_at) VALUES ($1, $2) ON CONFLICT (jti) DO NOTHING",
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE jti = $1)")
            .bind(jti)
            .fetch_one(&self.pool)
            .await
    }
}

pub type RevocationState = Arc<dyn RevocationStore>;
