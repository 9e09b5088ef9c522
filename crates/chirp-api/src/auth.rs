use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use chirp_db::models::AuthorRow;
use chirp_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};
use chirp_types::limits;

use crate::error::ApiError;
use crate::{AppState, with_db};

const TOKEN_LIFETIME_DAYS: i64 = 30;

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let username = limits::username(&req.username)?;
    let email = limits::email(&req.email)?;
    limits::password(&req.password)?;

    let (name_taken, email_taken) = {
        let (u, e) = (username.clone(), email.clone());
        with_db(&state, move |db| {
            Ok((
                db.get_author_by_username(&u)?.is_some(),
                db.get_author_by_email(&e)?.is_some(),
            ))
        })
        .await?
    };
    if name_taken {
        return Err(ApiError::Conflict(format!("username '{}' is taken", username)));
    }
    if email_taken {
        return Err(ApiError::Conflict("email is already registered".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let author_id = Uuid::new_v4();

    {
        let (id, u, e) = (author_id.to_string(), username.clone(), email.clone());
        with_db(&state, move |db| db.create_author(&id, &u, Some(&e), Some(&password_hash)))
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration.
                ApiError::Internal(e) if chirp_db::is_unique_violation(&e) => {
                    ApiError::Conflict("username or email is already registered".into())
                }
                other => other,
            })?;
    }
    info!(author = %username, "Registered author");

    let token = create_token(&state.jwt_secret, author_id, &username)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            author_id,
            username,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<Json<AuthResponse>, ApiError> {
    let ident = req.username.trim().to_string();
    let author = with_db(&state, move |db| db.get_author_by_login(&ident))
        .await?
        .ok_or(ApiError::Unauthorized("invalid username or password"))?;

    // GitHub-only authors have no password to check against.
    let stored = author
        .password
        .as_deref()
        .ok_or(ApiError::Unauthorized("invalid username or password"))?;

    let parsed_hash = PasswordHash::new(stored)
        .map_err(|e| anyhow::anyhow!("Corrupt password hash for {}: {}", author.username, e))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized("invalid username or password"))?;

    info!(author = %author.username, "Author logged in");
    auth_response(&state, &author).map(Json)
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

pub fn create_token(secret: &str, author_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: author_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_LIFETIME_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn auth_response(state: &AppState, author: &AuthorRow) -> Result<AuthResponse, ApiError> {
    let author_id: Uuid = author
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("Corrupt author id '{}': {}", author.id, e))?;
    let token = create_token(&state.jwt_secret, author_id, &author.username)?;
    Ok(AuthResponse {
        author_id,
        username: author.username.clone(),
        token,
    })
}

/// The caller's author row. A token outlives its author after "forget me",
/// so writes check that the author still exists.
pub async fn current_author(state: &AppState, claims: &Claims) -> Result<AuthorRow, ApiError> {
    let id = claims.sub.to_string();
    with_db(state, move |db| db.get_author_by_id(&id))
        .await?
        .ok_or(ApiError::Unauthorized("author no longer exists"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::bearer_claims;
    use axum::http::{HeaderMap, HeaderValue, header};

    #[test]
    fn token_round_trips_through_bearer_header() {
        let id = Uuid::new_v4();
        let token = create_token("test-secret", id, "helge").unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        let claims = bearer_claims(&headers, "test-secret").unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.username, "helge");

        assert!(bearer_claims(&headers, "other-secret").is_none());
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default().verify_password(b"correct horse", &parsed).is_ok());
        assert!(Argon2::default().verify_password(b"wrong horse", &parsed).is_err());
    }
}
