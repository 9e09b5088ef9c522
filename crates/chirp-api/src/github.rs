//! GitHub OAuth (authorization-code flow).
//!
//! `GET /auth/github` redirects to GitHub with a single-use `state`.
//! GitHub sends the browser back to `/auth/github/callback`, where the code
//! is exchanged for an access token, the GitHub user is fetched, and the
//! matching author is found or created.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use axum::{
    Json,
    extract::{Query, State},
    response::Redirect,
};
use axum_extra::extract::WithRejection;
use rand::Rng;
use rand::distr::Alphanumeric;
use reqwest::Url;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use chirp_types::api::{AuthResponse, OAuthCallback};

use crate::auth::auth_response;
use crate::error::ApiError;
use crate::{AppState, with_db};

const STATE_TTL: Duration = Duration::from_secs(10 * 60);
const STATE_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Where GitHub sends the browser back to, i.e. `{public_url}/auth/github/callback`.
    pub redirect_url: String,
    /// `https://github.com`; overridable for tests.
    pub web_base: String,
    /// `https://api.github.com`; overridable for tests.
    pub api_base: String,
}

impl GithubConfig {
    pub fn new(client_id: String, client_secret: String, public_url: &str) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_url: format!("{}/auth/github/callback", public_url.trim_end_matches('/')),
            web_base: "https://github.com".into(),
            api_base: "https://api.github.com".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GithubUser {
    pub id: i64,
    pub login: String,
    pub email: Option<String>,
}

pub struct GithubOAuth {
    config: GithubConfig,
    http: reqwest::Client,
    pending: Mutex<HashMap<String, Instant>>,
}

impl GithubOAuth {
    pub fn new(config: GithubConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("chirp/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            config,
            http,
            pending: Mutex::new(HashMap::new()),
        })
    }

    /// Build the authorize URL and remember its `state`.
    pub fn authorize_url(&self) -> Result<Url> {
        let state: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(STATE_LEN)
            .map(char::from)
            .collect();

        {
            let mut pending = self.pending.lock().map_err(|e| anyhow!("OAuth state lock poisoned: {}", e))?;
            pending.retain(|_, issued| issued.elapsed() < STATE_TTL);
            pending.insert(state.clone(), Instant::now());
        }

        let url = Url::parse_with_params(
            &format!("{}/login/oauth/authorize", self.config.web_base),
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("scope", "read:user user:email"),
                ("state", state.as_str()),
            ],
        )?;
        Ok(url)
    }

    /// Consume a `state`. False if it was never issued, already used, or
    /// older than `STATE_TTL`.
    pub fn take_state(&self, state: &str) -> Result<bool> {
        let mut pending = self.pending.lock().map_err(|e| anyhow!("OAuth state lock poisoned: {}", e))?;
        Ok(pending
            .remove(state)
            .is_some_and(|issued| issued.elapsed() < STATE_TTL))
    }

    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let resp: TokenResponse = self
            .http
            .post(format!("{}/login/oauth/access_token", self.config.web_base))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&serde_json::json!({
                "client_id": self.config.client_id,
                "client_secret": self.config.client_secret,
                "code": code,
                "redirect_uri": self.config.redirect_url,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("decoding GitHub token response")?;

        match resp.access_token {
            Some(token) => Ok(token),
            None => bail!(
                "GitHub refused the code: {} {}",
                resp.error.unwrap_or_default(),
                resp.error_description.unwrap_or_default()
            ),
        }
    }

    pub async fn fetch_user(&self, access_token: &str) -> Result<GithubUser> {
        let user = self
            .http
            .get(format!("{}/user", self.config.api_base))
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?
            .error_for_status()?
            .json::<GithubUser>()
            .await
            .context("decoding GitHub user")?;
        Ok(user)
    }
}

/// GET /auth/github
pub async fn start(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    let github = state.github.as_ref().ok_or(ApiError::NotFound("GitHub login"))?;
    let url = github.authorize_url()?;
    Ok(Redirect::to(url.as_str()))
}

/// GET /auth/github/callback?code&state
pub async fn callback(
    State(state): State<AppState>,
    WithRejection(Query(params), _): WithRejection<Query<OAuthCallback>, ApiError>,
) -> Result<Json<AuthResponse>, ApiError> {
    let github = state.github.as_ref().ok_or(ApiError::NotFound("GitHub login"))?;

    if !github.take_state(&params.state)? {
        warn!("OAuth callback with unknown or expired state");
        return Err(ApiError::BadRequest("unknown or expired OAuth state".into()));
    }

    let access_token = github.exchange_code(&params.code).await.map_err(|e| {
        warn!("GitHub code exchange failed: {:#}", e);
        ApiError::BadGateway("GitHub code exchange failed".into())
    })?;
    let user = github.fetch_user(&access_token).await.map_err(|e| {
        warn!("GitHub user lookup failed: {:#}", e);
        ApiError::BadGateway("GitHub user lookup failed".into())
    })?;

    let author = with_db(&state, move |db| {
        db.find_or_create_github_author(
            &Uuid::new_v4().to_string(),
            user.id,
            &user.login,
            user.email.as_deref(),
        )
    })
    .await?;

    info!(author = %author.username, "Author signed in with GitHub");
    auth_response(&state, &author).map(Json)
}
