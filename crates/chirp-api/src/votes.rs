use axum::{
    Extension, Json,
    extract::{Path, State},
};
use tracing::debug;
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use chirp_types::api::{Claims, ReactRequest, ReactionResponse, VoteResponse};
use chirp_types::limits;

use crate::auth::current_author;
use crate::error::ApiError;
use crate::{AppState, with_db};

#[derive(Debug, Clone, Copy)]
enum VoteKind {
    Like,
    Dislike,
}

/// POST /cheeps/{id}/like
pub async fn like(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(cheep_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<VoteResponse>, ApiError> {
    vote(state, claims, cheep_id, VoteKind::Like).await
}

/// POST /cheeps/{id}/dislike
pub async fn dislike(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(cheep_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<VoteResponse>, ApiError> {
    vote(state, claims, cheep_id, VoteKind::Dislike).await
}

/// Toggle a vote. Voting the same way twice withdraws the vote; voting the
/// other way moves it.
async fn vote(
    state: AppState,
    claims: Claims,
    cheep_id: Uuid,
    kind: VoteKind,
) -> Result<Json<VoteResponse>, ApiError> {
    let me = current_author(&state, &claims).await?.id;
    let cid = cheep_id.to_string();

    let response = with_db(&state, move |db| {
        if db.get_cheep(&cid)?.is_none() {
            return Ok(None);
        }
        let vote = match kind {
            VoteKind::Like => db.toggle_like(&cid, &me)?,
            VoteKind::Dislike => db.toggle_dislike(&cid, &me)?,
        };
        let (likes, dislikes) = db.vote_counts(&cid)?;
        Ok(Some(VoteResponse { vote, likes, dislikes }))
    })
    .await?
    .ok_or(ApiError::NotFound("cheep"))?;

    debug!(author = %claims.username, cheep = %cheep_id, vote = response.vote.as_str(), "Vote toggled");
    Ok(Json(response))
}

/// POST /cheeps/{id}/reactions
///
/// One reaction per author per cheep.
/// Sending the current emoji again removes it.
pub async fn react(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(cheep_id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<ReactRequest>, ApiError>,
) -> Result<Json<ReactionResponse>, ApiError> {
    let emoji = limits::emoji(&req.emoji)?;
    let me = current_author(&state, &claims).await?.id;
    let cid = cheep_id.to_string();

    let response = with_db(&state, move |db| {
        if db.get_cheep(&cid)?.is_none() {
            return Ok(None);
        }
        let reaction = db.set_reaction(&Uuid::new_v4().to_string(), &cid, &me, &emoji)?;
        let top_reactions = db.top_reactions(&cid)?;
        Ok(Some(ReactionResponse { reaction, top_reactions }))
    })
    .await?
    .ok_or(ApiError::NotFound("cheep"))?;

    debug!(author = %claims.username, cheep = %cheep_id, reaction = ?response.reaction, "Reaction set");
    Ok(Json(response))
}
