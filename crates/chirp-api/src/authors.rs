use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use chirp_types::api::{AuthorExport, AuthorProfile, Claims, FollowResponse};

use crate::auth::current_author;
use crate::error::ApiError;
use crate::views;
use crate::{AppState, with_db};

/// GET /{author}
pub async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<AuthorProfile>, ApiError> {
    let profile = with_db(&state, move |db| {
        let Some(author) = db.get_author_by_username(&username)? else {
            return Ok(None);
        };
        let stats = db.author_stats(&author.id)?;
        Ok(Some(views::profile(author, stats, false)))
    })
    .await?
    .ok_or(ApiError::NotFound("author"))?;

    Ok(Json(profile))
}

/// GET /{author}/follows
pub async fn follows(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    follow_list(state, username, Direction::Following).await
}

/// GET /{author}/followers
pub async fn followers(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    follow_list(state, username, Direction::Followers).await
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Following,
    Followers,
}

async fn follow_list(
    state: AppState,
    username: String,
    direction: Direction,
) -> Result<Json<Vec<String>>, ApiError> {
    let names = with_db(&state, move |db| {
        let Some(author) = db.get_author_by_username(&username)? else {
            return Ok(None);
        };
        let names = match direction {
            Direction::Following => db.following(&author.id)?,
            Direction::Followers => db.followers(&author.id)?,
        };
        Ok(Some(names))
    })
    .await?
    .ok_or(ApiError::NotFound("author"))?;

    Ok(Json(names))
}

/// POST /{author}/follow (idempotent)
pub async fn follow(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    set_following(state, claims, username, true).await
}

/// DELETE /{author}/follow (idempotent)
pub async fn unfollow(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(username): Path<String>,
) -> Result<Json<FollowResponse>, ApiError> {
    set_following(state, claims, username, false).await
}

async fn set_following(
    state: AppState,
    claims: Claims,
    username: String,
    follow: bool,
) -> Result<Json<FollowResponse>, ApiError> {
    let me = current_author(&state, &claims).await?;

    let target = with_db(&state, move |db| db.get_author_by_username(&username))
        .await?
        .ok_or(ApiError::NotFound("author"))?;
    if target.id == me.id {
        return Err(ApiError::BadRequest("authors cannot follow themselves".into()));
    }

    let changed = {
        let (me, target) = (me.id.clone(), target.id.clone());
        with_db(&state, move |db| {
            if follow {
                db.follow(&me, &target)
            } else {
                db.unfollow(&me, &target)
            }
        })
        .await?
    };
    if changed {
        info!(
            author = %me.username,
            target = %target.username,
            "{}",
            if follow { "Followed" } else { "Unfollowed" }
        );
    }

    Ok(Json(FollowResponse { following: follow }))
}

/// GET /me: the caller's own profile, including private fields.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<AuthorProfile>, ApiError> {
    let author = current_author(&state, &claims).await?;
    let id = author.id.clone();
    let stats = with_db(&state, move |db| db.author_stats(&id)).await?;

    Ok(Json(views::profile(author, stats, true)))
}

/// GET /me/export: everything stored about the caller.
pub async fn export_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<AuthorExport>, ApiError> {
    let id = claims.sub.to_string();
    let rows = with_db(&state, move |db| db.export_author(&id))
        .await?
        .ok_or(ApiError::Unauthorized("author no longer exists"))?;

    Ok(Json(views::export(rows)))
}

/// DELETE /me ("forget me"). Removes the author along with their cheeps,
/// comments, votes, reactions and follow edges. Outstanding tokens stop
/// working for anything that touches the author row.
pub async fn forget_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, ApiError> {
    let id = claims.sub.to_string();
    let removed = with_db(&state, move |db| db.delete_author(&id)).await?;
    if !removed {
        return Err(ApiError::Unauthorized("author no longer exists"));
    }

    info!(author = %claims.username, "Author forgotten");
    Ok(StatusCode::NO_CONTENT)
}
