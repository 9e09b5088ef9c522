use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub image_dir: PathBuf,
    pub jwt_secret: String,
    pub public_url: String,
    pub github: Option<GithubCredentials>,
}

#[derive(Debug, Clone)]
pub struct GithubCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = var("CHIRP_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("CHIRP_JWT_SECRET is unset or still a placeholder");
        }

        let host = var("CHIRP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("CHIRP_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("CHIRP_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        let github = match (var("GITHUB_CLIENT_ID"), var("GITHUB_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(GithubCredentials {
                client_id,
                client_secret,
            }),
            (None, None) => None,
            _ => bail!("GITHUB_CLIENT_ID and GITHUB_CLIENT_SECRET must be set together"),
        };

        Ok(Self {
            addr,
            db_path: var("CHIRP_DB_PATH").unwrap_or_else(|| "chirp.db".into()).into(),
            image_dir: var("CHIRP_IMAGE_DIR").unwrap_or_else(|| "./images".into()).into(),
            jwt_secret,
            public_url: var("CHIRP_PUBLIC_URL").unwrap_or_else(|| "http://localhost:3000".into()),
            github,
        })
    }
}
