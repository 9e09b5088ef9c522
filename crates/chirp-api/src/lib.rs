pub mod auth;
pub mod authors;
pub mod cheeps;
pub mod comments;
pub mod error;
pub mod github;
pub mod images;
pub mod middleware;
pub mod router;
pub mod views;
pub mod votes;

use std::sync::Arc;

use tracing::error;

use chirp_db::Database;

use crate::error::ApiError;
use crate::github::GithubOAuth;
use crate::images::ImageStore;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub images: ImageStore,
    /// `None` when no GitHub OAuth app is configured.
    pub github: Option<GithubOAuth>,
}

/// Run a blocking store call off the async runtime.
pub async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("database task failed"))
        })?
        .map_err(ApiError::from)
}
