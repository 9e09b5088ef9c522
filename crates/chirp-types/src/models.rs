use serde::{Deserialize, Serialize};

/// An author's standing vote on a cheep. Likes and dislikes are mutually
/// exclusive, so a single value describes both tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    #[default]
    #[serde(rename = "none")]
    Neutral,
    Like,
    Dislike,
}

impl Vote {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "none",
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }
}

/// One emoji and how many authors picked it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCount {
    pub emoji: String,
    pub count: u32,
}
