//! End-to-end tests through the router, against an in-memory database.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::{Json, Router, routing::get, routing::post};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use chirp_api::github::{GithubConfig, GithubOAuth};
use chirp_api::images::ImageStore;
use chirp_api::router::build_router;
use chirp_api::{AppState, AppStateInner};
use chirp_db::Database;
use chirp_types::limits::PAGE_SIZE;

const SECRET: &str = "test-secret";
const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01";

static TEST_ID: AtomicUsize = AtomicUsize::new(0);

struct TestApp {
    router: Router,
    state: AppState,
    image_dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.image_dir);
    }
}

async fn setup_with(github: Option<GithubOAuth>) -> TestApp {
    let image_dir = std::env::temp_dir().join(format!(
        "chirp_api_test_{}_{}",
        std::process::id(),
        TEST_ID.fetch_add(1, Ordering::Relaxed)
    ));
    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        jwt_secret: SECRET.into(),
        images: ImageStore::new(image_dir.clone()).await.unwrap(),
        github,
    });
    TestApp {
        router: build_router(state.clone()),
        state,
        image_dir,
    }
}

async fn setup() -> TestApp {
    setup_with(None).await
}

impl TestApp {
    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
        }
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&v).unwrap())
            }
            None => Body::empty(),
        };
        let resp = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call("GET", uri, token, None).await
    }

    async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call("POST", uri, Some(token), Some(body)).await
    }

    /// Register and return the token.
    async fn register(&self, username: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/auth/register",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{}@itu.dk", username),
                    "password": "hunter2hunter2",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }

    async fn cheep(&self, token: &str, text: &str) -> String {
        let (status, body) = self.post("/cheeps", token, json!({ "text": text })).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }
}

fn usernames(page: &Value) -> Vec<&str> {
    page["cheeps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["author"].as_str().unwrap())
        .collect()
}

// -- Auth --

#[tokio::test]
async fn health_is_public() {
    let app = setup().await;
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_then_login_by_username_or_email() {
    let app = setup().await;
    app.register("helge").await;

    for ident in ["helge", "HELGE", "helge@itu.dk"] {
        let (status, body) = app
            .call(
                "POST",
                "/auth/login",
                None,
                Some(json!({ "username": ident, "password": "hunter2hunter2" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login as {}", ident);
        assert_eq!(body["username"], "helge");
    }

    let (status, body) = app
        .call(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": "helge", "password": "wrong-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn register_rejects_bad_and_duplicate_input() {
    let app = setup().await;
    app.register("helge").await;

    let attempts = [
        (json!({"username": "Helge", "email": "other@itu.dk", "password": "hunter2hunter2"}), StatusCode::CONFLICT),
        (json!({"username": "other", "email": "HELGE@itu.dk", "password": "hunter2hunter2"}), StatusCode::CONFLICT),
        (json!({"username": "timeline", "email": "t@itu.dk", "password": "hunter2hunter2"}), StatusCode::BAD_REQUEST),
        (json!({"username": "ab", "email": "ab@itu.dk", "password": "hunter2hunter2"}), StatusCode::BAD_REQUEST),
        (json!({"username": "adrian", "email": "not-an-email", "password": "hunter2hunter2"}), StatusCode::BAD_REQUEST),
        (json!({"username": "adrian", "email": "adrian@itu.dk", "password": "short"}), StatusCode::BAD_REQUEST),
    ];
    for (body, expected) in attempts {
        let (status, resp) = app.call("POST", "/auth/register", None, Some(body.clone())).await;
        assert_eq!(status, expected, "{} -> {}", body, resp);
    }
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = setup().await;

    let (status, _) = app.get("/timeline", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.post("/cheeps", "garbage", json!({ "text": "hi" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // An invalid token on a public route is just anonymous.
    let (status, _) = app.get("/cheeps", Some("garbage")).await;
    assert_eq!(status, StatusCode::OK);
}

// -- Cheeps & timelines --

#[tokio::test]
async fn posted_cheeps_show_up_newest_first() {
    let app = setup().await;
    let helge = app.register("helge").await;
    let adrian = app.register("adrian").await;

    app.cheep(&helge, "Hello, BDSA students!").await;
    app.cheep(&adrian, "Hej, velkommen til kurset.").await;

    let (status, page) = app.get("/cheeps", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(usernames(&page), ["adrian", "helge"]);
    assert_eq!(page["total"], 2);
    assert_eq!(page["page_count"], 1);
    assert!(page["cheeps"][0].get("viewer").is_none());

    let (_, page) = app.get("/helge/cheeps", None).await;
    assert_eq!(usernames(&page), ["helge"]);
    assert_eq!(page["cheeps"][0]["text"], "Hello, BDSA students!");

    let (status, _) = app.get("/nobody/cheeps", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cheep_text_is_validated() {
    let app = setup().await;
    let token = app.register("helge").await;

    let (status, _) = app.post("/cheeps", &token, json!({ "text": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post("/cheeps", &token, json!({ "text": "x".repeat(161) })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Length is counted in characters, not bytes.
    let (status, _) = app.post("/cheeps", &token, json!({ "text": "ø".repeat(160) })).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn public_timeline_pages() {
    let app = setup().await;
    let token = app.register("helge").await;
    let (_, me) = app.get("/me", Some(&token)).await;
    assert_eq!(me["username"], "helge");

    let author = app.state.db.get_author_by_username("helge").unwrap().unwrap();
    for i in 0..PAGE_SIZE + 1 {
        let id = uuid::Uuid::new_v4().to_string();
        app.state.db.insert_cheep(&id, &author.id, &format!("cheep {}", i), None).unwrap();
    }

    let (_, first) = app.get("/cheeps", None).await;
    assert_eq!(first["cheeps"].as_array().unwrap().len(), PAGE_SIZE as usize);
    assert_eq!(first["cheeps"][0]["text"], format!("cheep {}", PAGE_SIZE));
    assert_eq!(first["page_count"], 2);

    let (_, second) = app.get("/cheeps?page=2", None).await;
    assert_eq!(second["page"], 2);
    assert_eq!(second["cheeps"].as_array().unwrap().len(), 1);
    assert_eq!(second["cheeps"][0]["text"], "cheep 0");

    let (_, beyond) = app.get("/cheeps?page=9", None).await;
    assert!(beyond["cheeps"].as_array().unwrap().is_empty());

    let (_, zero) = app.get("/cheeps?page=0", None).await;
    assert_eq!(zero["page"], 1);
}

#[tokio::test]
async fn private_timeline_follows_follows() {
    let app = setup().await;
    let helge = app.register("helge").await;
    let adrian = app.register("adrian").await;
    let rasmus = app.register("rasmus").await;

    app.cheep(&helge, "own").await;
    app.cheep(&adrian, "followed").await;
    app.cheep(&rasmus, "stranger").await;

    let (status, body) = app.post("/adrian/follow", &helge, json!(null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["following"], true);

    let (_, page) = app.get("/timeline", Some(&helge)).await;
    assert_eq!(usernames(&page), ["adrian", "helge"]);

    let (_, follows) = app.get("/helge/follows", None).await;
    assert_eq!(follows, json!(["adrian"]));
    let (_, followers) = app.get("/adrian/followers", None).await;
    assert_eq!(followers, json!(["helge"]));

    let (status, body) = app.call("DELETE", "/adrian/follow", Some(&helge), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["following"], false);
    let (_, page) = app.get("/timeline", Some(&helge)).await;
    assert_eq!(usernames(&page), ["helge"]);
}

#[tokio::test]
async fn following_is_idempotent_and_never_reflexive() {
    let app = setup().await;
    let helge = app.register("helge").await;
    app.register("adrian").await;

    app.post("/adrian/follow", &helge, json!(null)).await;
    app.post("/adrian/follow", &helge, json!(null)).await;
    let (_, profile) = app.get("/adrian", None).await;
    assert_eq!(profile["followers"], 1);
    assert!(profile.get("email").is_none());

    let (status, _) = app.post("/helge/follow", &helge, json!(null)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post("/nobody/follow", &helge, json!(null)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_the_author_deletes_a_cheep() {
    let app = setup().await;
    let helge = app.register("helge").await;
    let adrian = app.register("adrian").await;
    let id = app.cheep(&helge, "mine").await;

    let uri = format!("/cheeps/{}", id);
    let (status, _) = app.call("DELETE", &uri, Some(&adrian), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call("DELETE", &uri, Some(&helge), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// -- Engagement --

#[tokio::test]
async fn likes_and_dislikes_toggle() {
    let app = setup().await;
    let helge = app.register("helge").await;
    let adrian = app.register("adrian").await;
    let id = app.cheep(&helge, "vote on me").await;

    let like = format!("/cheeps/{}/like", id);
    let dislike = format!("/cheeps/{}/dislike", id);

    let (status, body) = app.post(&like, &adrian, json!(null)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "vote": "like", "likes": 1, "dislikes": 0 }));

    let (_, body) = app.post(&dislike, &adrian, json!(null)).await;
    assert_eq!(body, json!({ "vote": "dislike", "likes": 0, "dislikes": 1 }));

    let (_, body) = app.post(&dislike, &adrian, json!(null)).await;
    assert_eq!(body, json!({ "vote": "none", "likes": 0, "dislikes": 0 }));

    app.post(&like, &adrian, json!(null)).await;
    let (_, page) = app.get("/cheeps", Some(&adrian)).await;
    assert_eq!(page["cheeps"][0]["likes"], 1);
    assert_eq!(page["cheeps"][0]["viewer"]["vote"], "like");

    let missing = format!("/cheeps/{}/like", uuid::Uuid::new_v4());
    let (status, _) = app.post(&missing, &adrian, json!(null)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reactions_rank_and_replace() {
    let app = setup().await;
    let author = app.register("helge").await;
    let id = app.cheep(&author, "react to me").await;
    let uri = format!("/cheeps/{}/reactions", id);

    let mut tokens = Vec::new();
    for name in ["anna", "bent", "carl", "dora", "emil"] {
        tokens.push(app.register(name).await);
    }
    for (token, emoji) in tokens.iter().zip(["🎉", "🎉", "🔥", "👍", "😂"]) {
        let (status, _) = app.post(&uri, token, json!({ "emoji": emoji })).await;
        assert_eq!(status, StatusCode::OK);
    }

    // Ties on count fall back to emoji order.
    let (_, body) = app.post(&uri, &tokens[4], json!({ "emoji": "🔥" })).await;
    assert_eq!(body["reaction"], "🔥");
    assert_eq!(
        body["top_reactions"],
        json!([
            { "emoji": "🎉", "count": 2 },
            { "emoji": "🔥", "count": 2 },
            { "emoji": "👍", "count": 1 },
        ])
    );

    let (_, body) = app.post(&uri, &tokens[4], json!({ "emoji": "🔥" })).await;
    assert_eq!(body["reaction"], Value::Null);

    let (status, _) = app.post(&uri, &tokens[0], json!({ "emoji": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn comments_thread_under_a_cheep() {
    let app = setup().await;
    let helge = app.register("helge").await;
    let adrian = app.register("adrian").await;
    let id = app.cheep(&helge, "discuss").await;
    let uri = format!("/cheeps/{}/comments", id);

    let (status, first) = app.post(&uri, &adrian, json!({ "text": "first" })).await;
    assert_eq!(status, StatusCode::CREATED);
    app.post(&uri, &helge, json!({ "text": "second" })).await;

    let (_, comments) = app.get(&uri, None).await;
    let texts: Vec<_> = comments.as_array().unwrap().iter().map(|c| c["text"].clone()).collect();
    assert_eq!(texts, [json!("first"), json!("second")]);

    let (_, detail) = app.get(&format!("/cheeps/{}", id), None).await;
    assert_eq!(detail["cheep"]["comments"], 2);
    assert_eq!(detail["comments"][0]["author"], "adrian");

    let comment = format!("/comments/{}", first["id"].as_str().unwrap());
    let (status, _) = app.call("DELETE", &comment, Some(&helge), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.call("DELETE", &comment, Some(&adrian), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.post(&uri, &adrian, json!({ "text": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// -- Images --

#[tokio::test]
async fn cheep_images_are_stored_and_served() {
    let app = setup().await;
    let token = app.register("helge").await;

    let (status, cheep) = app
        .post("/cheeps", &token, json!({ "text": "look", "image": B64.encode(PNG) }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", cheep);
    let url = cheep["image_url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/images/") && url.ends_with(".png"));

    let resp = app
        .router
        .clone()
        .oneshot(Request::get(url.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], PNG);

    let (status, _) = app
        .post("/cheeps", &token, json!({ "text": "svg", "image": B64.encode(b"<svg/>") }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/images/..%2F..%2Fetc%2Fpasswd", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// -- Me --

#[tokio::test]
async fn export_contains_everything_about_me() {
    let app = setup().await;
    let helge = app.register("helge").await;
    let adrian = app.register("adrian").await;
    let id = app.cheep(&helge, "mine").await;
    app.post(&format!("/cheeps/{}/comments", id), &helge, json!({ "text": "note" })).await;
    app.post("/helge/follow", &adrian, json!(null)).await;

    let (status, export) = app.get("/me/export", Some(&helge)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(export["username"], "helge");
    assert_eq!(export["email"], "helge@itu.dk");
    assert_eq!(export["cheeps"][0]["text"], "mine");
    assert_eq!(export["comments"][0]["text"], "note");
    assert_eq!(export["followers"], json!(["adrian"]));
    assert_eq!(export["following"], json!([]));

    let (_, me) = app.get("/me", Some(&helge)).await;
    assert_eq!(me["email"], "helge@itu.dk");
    assert_eq!(me["github_linked"], false);
    assert_eq!(me["cheeps"], 1);
}

#[tokio::test]
async fn forget_me_removes_author_and_content() {
    let app = setup().await;
    let helge = app.register("helge").await;
    let adrian = app.register("adrian").await;
    let id = app.cheep(&helge, "soon gone").await;
    let survivor = app.cheep(&adrian, "still here").await;
    app.post(&format!("/cheeps/{}/like", id), &adrian, json!(null)).await;
    app.post("/adrian/follow", &helge, json!(null)).await;

    let (status, _) = app.call("DELETE", "/me", Some(&helge), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get("/helge", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, page) = app.get("/cheeps", None).await;
    assert_eq!(usernames(&page), ["adrian"]);
    let (_, followers) = app.get("/adrian/followers", None).await;
    assert_eq!(followers, json!([]));

    // The old token still decodes but the author is gone.
    let (status, _) = app.post("/cheeps", &helge, json!({ "text": "ghost" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.call("DELETE", "/me", Some(&helge), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.get("/timeline", Some(&helge)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Engagement on a cheep that still exists is refused too.
    for action in ["like", "dislike"] {
        let uri = format!("/cheeps/{}/{}", survivor, action);
        let (status, body) = app.post(&uri, &helge, json!(null)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} -> {}", action, body);
    }
    let uri = format!("/cheeps/{}/reactions", survivor);
    let (status, _) = app.post(&uri, &helge, json!({ "emoji": "👍" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, page) = app.get("/cheeps", None).await;
    assert_eq!(page["cheeps"][0]["likes"], 0);
    assert_eq!(page["cheeps"][0]["top_reactions"], json!([]));
}

// -- Malformed requests --

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let app = setup().await;
    let token = app.register("helge").await;

    let (status, body) = app
        .call(
            "POST",
            "/auth/register",
            None,
            Some(json!({ "username": "adrian", "password": "hunter2hunter2" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("email"), "{}", body);

    let (status, body) = app
        .post("/cheeps", &token, json!({ "text": "hi", "mood": "great" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app.get("/cheeps/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, body) = app.post("/cheeps/not-a-uuid/like", &token, json!(null)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, body) = app.call("DELETE", "/comments/42", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

// -- GitHub OAuth --

/// Minimal stand-in for github.com and api.github.com.
async fn fake_github() -> String {
    let app = Router::new()
        .route(
            "/login/oauth/access_token",
            post(|Json(body): Json<Value>| async move {
                if body["code"] == "good-code" {
                    Json(json!({ "access_token": "gho_test", "token_type": "bearer" }))
                } else {
                    Json(json!({ "error": "bad_verification_code" }))
                }
            }),
        )
        .route(
            "/user",
            get(|| async { Json(json!({ "id": 4242, "login": "octocat", "email": "octo@github.test" })) }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn github_app() -> TestApp {
    let base = fake_github().await;
    let mut config = GithubConfig::new("cid".into(), "csecret".into(), "http://chirp.test");
    config.web_base = base.clone();
    config.api_base = base;
    setup_with(Some(GithubOAuth::new(config).unwrap())).await
}

async fn issued_state(app: &TestApp) -> String {
    let resp = app
        .router
        .clone()
        .oneshot(Request::get("/auth/github").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp.headers()[header::LOCATION].to_str().unwrap();
    let url = reqwest::Url::parse(location).unwrap();
    url.query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

#[tokio::test]
async fn github_login_creates_then_reuses_author() {
    let app = github_app().await;

    let state = issued_state(&app).await;
    let uri = format!("/auth/github/callback?code=good-code&state={}", state);
    let (status, first) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK, "{}", first);
    assert_eq!(first["username"], "octocat");

    // The state was consumed.
    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let state = issued_state(&app).await;
    let (_, second) = app
        .get(&format!("/auth/github/callback?code=good-code&state={}", state), None)
        .await;
    assert_eq!(second["author_id"], first["author_id"]);

    let token = second["token"].as_str().unwrap();
    let (_, me) = app.get("/me", Some(token)).await;
    assert_eq!(me["github_linked"], true);

    // No password to log in with.
    let (status, _) = app
        .call(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "username": "octocat", "password": "anything-at-all" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn github_failures_are_reported() {
    let app = github_app().await;

    let (status, _) = app.get("/auth/github/callback?code=good-code&state=forged", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let state = issued_state(&app).await;
    let (status, _) = app
        .get(&format!("/auth/github/callback?code=bad-code&state={}", state), None)
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn github_routes_404_when_unconfigured() {
    let app = setup().await;
    let (status, _) = app.get("/auth/github", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
