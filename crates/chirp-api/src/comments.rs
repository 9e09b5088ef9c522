use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::info;
use uuid::Uuid;

use chirp_types::api::{Claims, CommentView, PostCommentRequest};
use chirp_types::limits;

use crate::auth::current_author;
use crate::error::ApiError;
use crate::views;
use crate::{AppState, with_db};

/// GET /cheeps/{id}/comments, oldest first.
pub async fn list_comments(
    State(state): State<AppState>,
    WithRejection(Path(cheep_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<Vec<CommentView>>, ApiError> {
    let cid = cheep_id.to_string();

    let comments = with_db(&state, move |db| {
        if db.get_cheep(&cid)?.is_none() {
            return Ok(None);
        }
        Ok(Some(db.comments_for(&cid)?))
    })
    .await?
    .ok_or(ApiError::NotFound("cheep"))?;

    Ok(Json(comments.into_iter().map(views::comment_view).collect()))
}

/// POST /cheeps/{id}/comments
pub async fn post_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(cheep_id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Json(req), _): WithRejection<Json<PostCommentRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let text = limits::comment_text(&req.text)?;
    let author = current_author(&state, &claims).await?;
    let cid = cheep_id.to_string();

    let row = with_db(&state, move |db| {
        if db.get_cheep(&cid)?.is_none() {
            return Ok(None);
        }
        let id = Uuid::new_v4().to_string();
        db.insert_comment(&id, &cid, &author.id, &text).map(Some)
    })
    .await?
    .ok_or(ApiError::NotFound("cheep"))?;
    info!(author = %row.author_username, cheep = %row.cheep_id, "Comment posted");

    Ok((StatusCode::CREATED, Json(views::comment_view(row))))
}

/// DELETE /comments/{id}
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(comment_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<StatusCode, ApiError> {
    let id = comment_id.to_string();

    let comment = {
        let id = id.clone();
        with_db(&state, move |db| db.get_comment(&id))
            .await?
            .ok_or(ApiError::NotFound("comment"))?
    };
    if comment.author_id != claims.sub.to_string() {
        return Err(ApiError::Forbidden("only the author may delete a comment"));
    }

    with_db(&state, move |db| db.delete_comment(&id)).await?;
    info!(author = %claims.username, comment = %comment_id, "Comment deleted");

    Ok(StatusCode::NO_CONTENT)
}
