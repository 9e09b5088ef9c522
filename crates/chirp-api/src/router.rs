use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::{identify, require_auth};
use crate::{AppState, auth, authors, cheeps, comments, github, images, votes};

/// Room for a base64-encoded image at the size limit plus the cheep text.
pub(crate) const BODY_LIMIT: usize = 8 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    // Static segments (`/cheeps`, `/me`, ...) take priority over `/{author}`;
    // the reserved usernames keep them from being shadowed.
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/github", get(github::start))
        .route("/auth/github/callback", get(github::callback))
        .route("/cheeps", get(cheeps::public_timeline))
        .route("/cheeps/{id}", get(cheeps::get_cheep))
        .route("/cheeps/{id}/comments", get(comments::list_comments))
        .route("/images/{name}", get(images::serve_image))
        .route("/{author}", get(authors::profile))
        .route("/{author}/cheeps", get(cheeps::author_timeline))
        .route("/{author}/follows", get(authors::follows))
        .route("/{author}/followers", get(authors::followers));

    let protected_routes = Router::new()
        .route("/timeline", get(cheeps::private_timeline))
        .route("/cheeps", post(cheeps::post_cheep))
        .route("/cheeps/{id}", delete(cheeps::delete_cheep))
        .route("/cheeps/{id}/like", post(votes::like))
        .route("/cheeps/{id}/dislike", post(votes::dislike))
        .route("/cheeps/{id}/reactions", post(votes::react))
        .route("/cheeps/{id}/comments", post(comments::post_comment))
        .route("/comments/{id}", delete(comments::delete_comment))
        .route("/{author}/follow", post(authors::follow).delete(authors::unfollow))
        .route("/me", get(authors::me).delete(authors::forget_me))
        .route("/me/export", get(authors::export_me))
        .route_layer(middleware::from_fn(require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(state.clone(), identify))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
