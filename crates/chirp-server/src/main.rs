mod config;

use std::sync::Arc;

use tracing::info;

use chirp_api::github::{GithubConfig, GithubOAuth};
use chirp_api::images::ImageStore;
use chirp_api::router::build_router;
use chirp_api::{AppState, AppStateInner};
use chirp_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chirp=debug,chirp_api=debug,chirp_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    let db = Database::open(&config.db_path)?;
    let images = ImageStore::new(config.image_dir.clone()).await?;

    let github = match config.github {
        Some(creds) => {
            let oauth = GithubOAuth::new(GithubConfig::new(
                creds.client_id,
                creds.client_secret,
                &config.public_url,
            ))?;
            info!("GitHub login enabled");
            Some(oauth)
        }
        None => {
            info!("GitHub login disabled (GITHUB_CLIENT_ID not set)");
            None
        }
    };

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret,
        images,
        github,
    });

    let app = build_router(state);

    info!("Chirp listening on {} (public URL {})", config.addr, config.public_url);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Chirp stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
