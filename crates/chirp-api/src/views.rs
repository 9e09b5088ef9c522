//! Row → response conversion.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use chirp_db::Database;
use chirp_db::models::{
    AuthorExportRows, AuthorRow, AuthorStats, CheepRow, CommentRow, Engagement, TimelineRows,
};
use chirp_types::api::{
    AuthorExport, AuthorProfile, CheepView, CommentView, ExportedCheep, ExportedComment,
    TimelinePage, ViewerState,
};
use chirp_types::limits::{Page, page_count};

pub fn parse_id(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, raw, e);
        Uuid::default()
    })
}

pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // Rows written by hand through sqlite3 use datetime('now'):
            // "YYYY-MM-DD HH:MM:SS" without timezone. Parse as naive UTC.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

pub fn image_url(name: &str) -> String {
    format!("/images/{}", name)
}

/// `viewer` is set when the request came from an identified author, in
/// which case their own vote and reaction are included.
pub fn cheep_view(row: CheepRow, engagement: Engagement, viewer: bool) -> CheepView {
    CheepView {
        id: parse_id(&row.id, "cheep"),
        author: row.author_username,
        text: row.text,
        image_url: row.image.as_deref().map(image_url),
        created_at: parse_timestamp(&row.created_at),
        likes: engagement.likes,
        dislikes: engagement.dislikes,
        comments: engagement.comments,
        top_reactions: engagement.top_reactions,
        viewer: viewer.then_some(ViewerState {
            vote: engagement.viewer_vote,
            reaction: engagement.viewer_reaction,
        }),
    }
}

/// Attach engagement to a batch of cheeps, preserving their order.
pub fn cheep_views(
    db: &Database,
    rows: Vec<CheepRow>,
    viewer: Option<&str>,
) -> anyhow::Result<Vec<CheepView>> {
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
    let mut engagement = db.engagement_for(&ids, viewer)?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let e = engagement.remove(&row.id).unwrap_or_default();
            cheep_view(row, e, viewer.is_some())
        })
        .collect())
}

pub fn timeline_page(
    db: &Database,
    timeline: TimelineRows,
    page: Page,
    viewer: Option<&str>,
) -> anyhow::Result<TimelinePage> {
    Ok(TimelinePage {
        cheeps: cheep_views(db, timeline.rows, viewer)?,
        page: page.number(),
        page_count: page_count(timeline.total),
        total: timeline.total,
    })
}

pub fn comment_view(row: CommentRow) -> CommentView {
    CommentView {
        id: parse_id(&row.id, "comment"),
        cheep_id: parse_id(&row.cheep_id, "cheep"),
        author: row.author_username,
        text: row.text,
        created_at: parse_timestamp(&row.created_at),
    }
}

/// Public profiles leave out the email and account links.
pub fn profile(author: AuthorRow, stats: AuthorStats, private: bool) -> AuthorProfile {
    AuthorProfile {
        created_at: parse_timestamp(&author.created_at),
        cheeps: stats.cheeps,
        followers: stats.followers,
        following: stats.following,
        email: if private { author.email } else { None },
        github_linked: private.then_some(author.github_id.is_some()),
        username: author.username,
    }
}

pub fn export(rows: AuthorExportRows) -> AuthorExport {
    AuthorExport {
        username: rows.author.username,
        email: rows.author.email,
        created_at: parse_timestamp(&rows.author.created_at),
        cheeps: rows
            .cheeps
            .into_iter()
            .map(|c| ExportedCheep {
                id: parse_id(&c.id, "cheep"),
                image_url: c.image.as_deref().map(image_url),
                created_at: parse_timestamp(&c.created_at),
                text: c.text,
            })
            .collect(),
        comments: rows
            .comments
            .into_iter()
            .map(|c| ExportedComment {
                id: parse_id(&c.id, "comment"),
                cheep_id: parse_id(&c.cheep_id, "cheep"),
                created_at: parse_timestamp(&c.created_at),
                text: c.text,
            })
            .collect(),
        following: rows.following,
        followers: rows.followers,
    }
}
