//! Like ledger: one (artwork, user) fact per like. Counts and membership are derived by
//! re-querying the ledger after each write, never by keeping a counter.

use crate::{
    error::{ApiError, ApiResult},
    models::{Artwork, ArtworkWithLikes},
    repository::Repository,
};

/// LikeOutcome
///
/// What a like or unlike did and the ledger's count afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    Liked { likes: i64 },
    AlreadyLiked { likes: i64 },
    Unliked { likes: i64 },
}

impl LikeOutcome {
    pub fn likes(&self) -> i64 {
        match *self {
            LikeOutcome::Liked { likes }
            | LikeOutcome::AlreadyLiked { likes }
            | LikeOutcome::Unliked { likes } => likes,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            LikeOutcome::Liked { .. } => "Artwork liked successfully",
            LikeOutcome::AlreadyLiked { .. } => "Artwork already liked",
            LikeOutcome::Unliked { .. } => "Artwork unliked successfully",
        }
    }
}

async fn require_artwork(repo: &dyn Repository, artwork_id: i64) -> ApiResult<Artwork> {
    repo.get_artwork(artwork_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Artwork not found"))
}

/// like
///
/// Idempotent: a repeat like by the same user leaves the ledger untouched and reports the
/// current count.
pub async fn like(repo: &dyn Repository, artwork_id: i64, user_id: i64) -> ApiResult<LikeOutcome> {
    require_artwork(repo, artwork_id).await?;

    let inserted = match repo.find_like(artwork_id, user_id).await? {
        Some(_) => false,
        None => repo.insert_like(artwork_id, user_id).await?,
    };

    let likes = repo.count_likes(artwork_id).await?;
    if inserted {
        tracing::info!(artwork_id, user_id, likes, "artwork liked");
        Ok(LikeOutcome::Liked { likes })
    } else {
        Ok(LikeOutcome::AlreadyLiked { likes })
    }
}

/// unlike
///
/// Fails with `BadRequest` when the user has no like on the artwork.
pub async fn unlike(
    repo: &dyn Repository,
    artwork_id: i64,
    user_id: i64,
) -> ApiResult<LikeOutcome> {
    require_artwork(repo, artwork_id).await?;

    if repo.find_like(artwork_id, user_id).await?.is_none() {
        tracing::debug!(artwork_id, user_id, "unlike without a like");
        return Err(ApiError::bad_request("You have not liked this artwork"));
    }
    repo.delete_like(artwork_id, user_id).await?;

    let likes = repo.count_likes(artwork_id).await?;
    tracing::info!(artwork_id, user_id, likes, "artwork unliked");
    Ok(LikeOutcome::Unliked { likes })
}

/// with_likes
///
/// Attaches the like count and the viewer's membership to an artwork. A viewer without a
/// member id (an admin) never counts as a liker.
pub async fn with_likes(
    repo: &dyn Repository,
    artwork: Artwork,
    viewer_id: Option<i64>,
) -> ApiResult<ArtworkWithLikes> {
    let likes = repo.count_likes(artwork.id).await?;
    let user_has_liked = match viewer_id {
        Some(viewer_id) => repo.find_like(artwork.id, viewer_id).await?.is_some(),
        None => false,
    };
    Ok(ArtworkWithLikes {
        artwork,
        likes,
        user_has_liked,
    })
}

pub async fn with_likes_all(
    repo: &dyn Repository,
    artworks: Vec<Artwork>,
    viewer_id: Option<i64>,
) -> ApiResult<Vec<ArtworkWithLikes>> {
    let mut enriched = Vec::with_capacity(artworks.len());
    for artwork in artworks {
        enriched.push(with_likes(repo, artwork, viewer_id).await?);
    }
    Ok(enriched)
}

/// liked_artworks
///
/// Every artwork the user has liked, each enriched from that user's point of view. Ledger
/// rows whose artwork has since vanished are skipped.
pub async fn liked_artworks(
    repo: &dyn Repository,
    user_id: i64,
) -> ApiResult<Vec<ArtworkWithLikes>> {
    let mut liked = Vec::new();
    for like in repo.list_likes_by_user(user_id).await? {
        if let Some(artwork) = repo.get_artwork(like.artwork_id).await? {
            liked.push(with_likes(repo, artwork, Some(user_id)).await?);
        }
    }
    Ok(liked)
}
