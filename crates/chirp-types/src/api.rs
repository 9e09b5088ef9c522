use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ReactionCount, Vote};

// -- JWT Claims --

/// Bearer token claims. `sub` is the author id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// `username` accepts either the username or the email address.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub author_id: Uuid,
    pub username: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallback {
    pub code: String,
    pub state: String,
}

// -- Cheeps --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostCheepRequest {
    pub text: String,
    /// Base64-encoded PNG, JPEG, GIF or WebP.
    #[serde(default)]
    pub image: Option<String>,
}

/// What the requesting author has done to a cheep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerState {
    pub vote: Vote,
    pub reaction: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheepView {
    pub id: Uuid,
    pub author: String,
    pub text: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub likes: u32,
    pub dislikes: u32,
    pub comments: u32,
    pub top_reactions: Vec<ReactionCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer: Option<ViewerState>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimelinePage {
    pub cheeps: Vec<CheepView>,
    pub page: u32,
    pub page_count: u32,
    pub total: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheepDetail {
    pub cheep: CheepView,
    pub comments: Vec<CommentView>,
}

// -- Votes & reactions --

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteResponse {
    pub vote: Vote,
    pub likes: u32,
    pub dislikes: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReactRequest {
    pub emoji: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReactionResponse {
    pub reaction: Option<String>,
    pub top_reactions: Vec<ReactionCount>,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostCommentRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: Uuid,
    pub cheep_id: Uuid,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

// -- Authors --

#[derive(Debug, Serialize, Deserialize)]
pub struct FollowResponse {
    pub following: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorProfile {
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub cheeps: u64,
    pub followers: u64,
    pub following: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_linked: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportedCheep {
    pub id: Uuid,
    pub text: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportedComment {
    pub id: Uuid,
    pub cheep_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Everything stored about one author, for "download my data".
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorExport {
    pub username: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub cheeps: Vec<ExportedCheep>,
    pub comments: Vec<ExportedComment>,
    pub following: Vec<String>,
    pub followers: Vec<String>,
}
