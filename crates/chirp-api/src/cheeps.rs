use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use chirp_types::api::{CheepDetail, Claims, PostCheepRequest, TimelinePage};
use chirp_types::limits::{self, Page};

use crate::auth::current_author;
use crate::error::ApiError;
use crate::images::decode_upload;
use crate::middleware::Viewer;
use crate::views;
use crate::{AppState, with_db};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// 1-based; missing, zero or unparsable pages fall back to the first.
    pub page: Option<String>,
}

impl PageQuery {
    fn page(&self) -> Page {
        Page::new(self.page.as_deref().and_then(|p| p.trim().parse().ok()))
    }
}

/// GET /cheeps?page=N
pub async fn public_timeline(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(query): Query<PageQuery>,
) -> Result<Json<TimelinePage>, ApiError> {
    let page = query.page();
    let viewer = viewer.author_id();

    let timeline = with_db(&state, move |db| {
        let rows = db.public_timeline(page)?;
        views::timeline_page(db, rows, page, viewer.as_deref())
    })
    .await?;

    Ok(Json(timeline))
}

/// GET /{author}/cheeps?page=N
pub async fn author_timeline(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(author): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<TimelinePage>, ApiError> {
    let page = query.page();
    let viewer = viewer.author_id();

    let timeline = with_db(&state, move |db| {
        let Some(author) = db.get_author_by_username(&author)? else {
            return Ok(None);
        };
        let rows = db.author_timeline(&author.id, page)?;
        views::timeline_page(db, rows, page, viewer.as_deref()).map(Some)
    })
    .await?
    .ok_or(ApiError::NotFound("author"))?;

    Ok(Json(timeline))
}

/// GET /timeline?page=N: the caller's cheeps plus those of everyone they follow.
pub async fn private_timeline(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> Result<Json<TimelinePage>, ApiError> {
    let page = query.page();
    let me = current_author(&state, &claims).await?.id;

    let timeline = with_db(&state, move |db| {
        let rows = db.private_timeline(&me, page)?;
        views::timeline_page(db, rows, page, Some(&me))
    })
    .await?;

    Ok(Json(timeline))
}

/// GET /cheeps/{id}
pub async fn get_cheep(
    State(state): State<AppState>,
    viewer: Viewer,
    WithRejection(Path(cheep_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<CheepDetail>, ApiError> {
    let id = cheep_id.to_string();
    let viewer = viewer.author_id();

    let detail = with_db(&state, move |db| {
        let Some(row) = db.get_cheep(&id)? else {
            return Ok(None);
        };
        let cheep = views::cheep_views(db, vec![row], viewer.as_deref())?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Cheep {} lost while attaching engagement", id))?;
        let comments = db
            .comments_for(&id)?
            .into_iter()
            .map(views::comment_view)
            .collect();
        Ok(Some(CheepDetail { cheep, comments }))
    })
    .await?
    .ok_or(ApiError::NotFound("cheep"))?;

    Ok(Json(detail))
}

/// POST /cheeps
pub async fn post_cheep(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<PostCheepRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let text = limits::cheep_text(&req.text)?;
    let upload = req.image.as_deref().map(decode_upload).transpose()?;
    let author = current_author(&state, &claims).await?;

    let image = match upload {
        Some((bytes, format)) => Some(state.images.save(&bytes, format).await?),
        None => None,
    };

    let cheep_id = Uuid::new_v4().to_string();
    let row = with_db(&state, move |db| {
        db.insert_cheep(&cheep_id, &author.id, &text, image.as_deref())
    })
    .await?;
    info!(author = %row.author_username, cheep = %row.id, image = row.image.is_some(), "Cheep posted");

    let view = views::cheep_view(row, Default::default(), true);
    Ok((StatusCode::CREATED, Json(view)))
}

/// DELETE /cheeps/{id}
///
/// Authors may only delete their own cheeps.
/// Votes, reactions and comments go with it.
pub async fn delete_cheep(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Path(cheep_id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<StatusCode, ApiError> {
    let id = cheep_id.to_string();
    let me = claims.sub.to_string();

    let cheep = {
        let id = id.clone();
        with_db(&state, move |db| db.get_cheep(&id))
            .await?
            .ok_or(ApiError::NotFound("cheep"))?
    };
    if cheep.author_id != me {
        return Err(ApiError::Forbidden("only the author may delete a cheep"));
    }

    with_db(&state, move |db| db.delete_cheep(&id)).await?;
    info!(author = %claims.username, cheep = %cheep_id, "Cheep deleted");

    Ok(StatusCode::NO_CONTENT)
}
