use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use chirp_types::api::Claims;

use crate::AppState;
use crate::error::ApiError;

/// Decode the bearer token, if any, and attach its claims to the request.
/// A missing or invalid token leaves the request anonymous.
pub async fn identify(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if let Some(claims) = bearer_claims(req.headers(), &state.jwt_secret) {
        req.extensions_mut().insert(claims);
    }
    next.run(req).await
}

/// Reject requests that `identify` could not attach claims to.
pub async fn require_auth(req: Request, next: Next) -> Result<Response, ApiError> {
    if req.extensions().get::<Claims>().is_none() {
        return Err(ApiError::Unauthorized("authentication required"));
    }
    Ok(next.run(req).await)
}

pub fn bearer_claims(headers: &HeaderMap, secret: &str) -> Option<Claims> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

/// Claims of the caller on public routes, if they sent a valid token.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<Claims>);

impl Viewer {
    pub fn author_id(&self) -> Option<String> {
        self.0.as_ref().map(|c| c.sub.to_string())
    }
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Claims>().cloned()))
    }
}
