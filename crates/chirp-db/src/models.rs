//! Database row types. These map directly to SQLite rows.
//! Distinct from chirp-types API models to keep the DB layer independent.

use chirp_types::models::{ReactionCount, Vote};

#[derive(Debug, Clone)]
pub struct AuthorRow {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub password: Option<String>,
    pub github_id: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorStats {
    pub cheeps: u64,
    pub followers: u64,
    pub following: u64,
}

#[derive(Debug, Clone)]
pub struct CheepRow {
    pub id: String,
    pub author_id: String,
    pub author_username: String,
    pub text: String,
    pub image: Option<String>,
    pub created_at: String,
}

/// One page of a timeline plus the size of the whole timeline.
#[derive(Debug, Default)]
pub struct TimelineRows {
    pub rows: Vec<CheepRow>,
    pub total: u64,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: String,
    pub cheep_id: String,
    pub author_id: String,
    pub author_username: String,
    pub text: String,
    pub created_at: String,
}

/// Aggregated likes, dislikes, comments and reactions for one cheep.
/// The viewer fields stay at their defaults for anonymous reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Engagement {
    pub likes: u32,
    pub dislikes: u32,
    pub comments: u32,
    pub top_reactions: Vec<ReactionCount>,
    pub viewer_vote: Vote,
    pub viewer_reaction: Option<String>,
}

pub struct AuthorExportRows {
    pub author: AuthorRow,
    pub cheeps: Vec<CheepRow>,
    pub comments: Vec<CommentRow>,
    pub following: Vec<String>,
    pub followers: Vec<String>,
}
