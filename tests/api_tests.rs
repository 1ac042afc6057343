mod common;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use common::{MultipartBody, TestContext};
use gallery_api::{
    AppState, auth::Role, create_router, repository::Repository,
    revocation::InMemoryRevocationStore,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

// --- Helpers ---

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn multipart_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: MultipartBody,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, MultipartBody::content_type());
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.finish())).unwrap()
}

fn register_body(email: &str) -> MultipartBody {
    MultipartBody::new()
        .text("username", email)
        .text("email", email)
        .text("password", "pw")
}

// --- Public Surface ---

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();
    let app = create_router(ctx.state.clone());

    let response = app
        .oneshot(request(Method::GET, "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_home_returns_welcome() {
    let ctx = TestContext::new();
    let app = create_router(ctx.state.clone());

    let (status, body) = send(&app, request(Method::GET, "/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("Welcome"));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let ctx = TestContext::new();
    let app = create_router(ctx.state.clone());

    let (status, body) = send(&app, request(Method::GET, "/api-docs/openapi.json", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/api/signin").is_some());
}

// --- Registration & Sign-in ---

#[tokio::test]
async fn test_register_twice_conflicts_but_case_differs() {
    let ctx = TestContext::new();
    let app = create_router(ctx.state.clone());

    let (first, _) = send(
        &app,
        multipart_request(Method::POST, "/api/register", None, register_body("A@x.com")),
    )
    .await;
    let (again, body) = send(
        &app,
        multipart_request(Method::POST, "/api/register", None, register_body("A@x.com")),
    )
    .await;
    let (lower, _) = send(
        &app,
        multipart_request(Method::POST, "/api/register", None, register_body("a@x.com")),
    )
    .await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(again, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email already registered");
    assert_eq!(lower, StatusCode::CREATED);
}

#[tokio::test]
async fn test_sign_in_then_me() {
    let ctx = TestContext::new();
    let app = create_router(ctx.state.clone());
    ctx.seed_user("frida", "frida@example.com", "casa-azul").await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/api/signin",
            None,
            json!({ "email": "frida@example.com", "password": "casa-azul" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, me) = send(&app, request(Method::GET, "/api/users/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "frida@example.com");
    assert!(me.get("password_hash").is_none());
}

#[tokio::test]
async fn test_registered_password_keeps_surrounding_whitespace() {
    let ctx = TestContext::new();
    let app = create_router(ctx.state.clone());

    let (status, _) = send(
        &app,
        multipart_request(
            Method::POST,
            "/api/register",
            None,
            MultipartBody::new()
                .text("username", " frida ")
                .text("email", "f@x.com")
                .text("password", " casa azul "),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let stored = ctx.repo.find_user_by_email("f@x.com").await.unwrap().unwrap();
    assert_eq!(stored.username, "frida");

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/signin",
            None,
            json!({ "email": "f@x.com", "password": " casa azul " }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/signin",
            None,
            json!({ "email": "f@x.com", "password": "casa azul" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_updated_password_keeps_surrounding_whitespace() {
    let ctx = TestContext::new();
    let app = create_router(ctx.state.clone());
    let user = ctx.seed_user("frida", "frida@example.com", "pw").await;
    let token = ctx.token(user.id, Role::User);

    let (status, _) = send(
        &app,
        multipart_request(
            Method::PUT,
            &format!("/api/users/{}", user.id),
            Some(&token),
            MultipartBody::new().text("password", "  new pw\t"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/signin",
            None,
            json!({ "email": "frida@example.com", "password": "  new pw\t" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let ctx = TestContext::new();
    let app = create_router(ctx.state.clone());

    let (status, body) = send(
        &app,
        json_request(Method::POST, "/api/signin", None, json!({ "email": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

// --- Authorization Gate ---

#[tokio::test]
async fn test_protected_route_without_token_is_unauthorized() {
    let ctx = TestContext::new();
    let app = create_router(ctx.state.clone());

    let (status, body) = send(&app, request(Method::GET, "/api/users/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or missing token");
}

#[tokio::test]
async fn test_admin_router_rejects_member_tokens() {
    let ctx = TestContext::new();
    let app = create_router(ctx.state.clone());
    let user = ctx.seed_user("frida", "frida@example.com", "pw").await;

    let member_token = ctx.token(user.id, Role::User);
    let (status, body) = send(&app, request(Method::GET, "/api/users", Some(&member_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin access required");

    let admin_token = ctx.token(1, Role::Admin);
    let (status, body) = send(&app, request(Method::GET, "/api/users", Some(&admin_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_non_owner_profile_update_is_forbidden() {
    let ctx = TestContext::new();
    let app = create_router(ctx.state.clone());
    let owner = ctx.seed_user("frida", "frida@example.com", "pw").await;
    let other = ctx.seed_user("diego", "diego@example.com", "pw").await;
    let token = ctx.token(other.id, Role::User);

    let (status, body) = send(
        &app,
        multipart_request(
            Method::PUT,
            &format!("/api/users/{}", owner.id),
            Some(&token),
            MultipartBody::new().text("username", "hacked"),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can only update your own profile");
}

// Admin ids index the admins table, so an admin whose id equals a user's id
// passes the id-only owner check on that user's profile.
#[tokio::test]
async fn test_profile_update_owner_check_compares_ids_only() {
    let ctx = TestContext::new();
    let app = create_router(ctx.state.clone());
    let user = ctx.seed_user("frida", "frida@example.com", "pw").await;

    let colliding_admin = ctx.token(user.id, Role::Admin);
    let (status, body) = send(
        &app,
        multipart_request(
            Method::PUT,
            &format!("/api/users/{}", user.id),
            Some(&colliding_admin),
            MultipartBody::new().text("username", "renamed"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "renamed");

    let other_admin = ctx.token(user.id + 100, Role::Admin);
    let (status, _) = send(
        &app,
        multipart_request(
            Method::PUT,
            &format!("/api/users/{}", user.id),
            Some(&other_admin),
            MultipartBody::new().text("username", "again"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_logout_revokes_token_until_restart() {
    let ctx = TestContext::new();
    let app = create_router(ctx.state.clone());
    let user = ctx.seed_user("frida", "frida@example.com", "pw").await;
    let token = ctx.token(user.id, Role::User);

    let (status, _) = send(&app, request(Method::POST, "/api/logout", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctx.revocations.len().await, 1);

    let (status, _) = send(&app, request(Method::GET, "/api/users/me", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A fresh in-memory store stands in for a process restart.
    let restarted = create_router(AppState {
        revocations: Arc::new(InMemoryRevocationStore::new()),
        ..ctx.state.clone()
    });
    let (status, _) = send(&restarted, request(Method::GET, "/api/users/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
}

// --- Likes ---

#[tokio::test]
async fn test_like_twice_then_unlike() {
    let ctx = TestContext::new();
    let app = create_router(ctx.state.clone());
    let user = ctx.seed_user("frida", "frida@example.com", "pw").await;
    let artwork = ctx.seed_artwork("lilies", "impressionism", None).await;
    let token = ctx.token(user.id, Role::User);
    let uri = format!("/api/artworks/{}/like", artwork.id);

    let (s1, b1) = send(&app, request(Method::POST, &uri, Some(&token))).await;
    let (s2, b2) = send(&app, request(Method::POST, &uri, Some(&token))).await;
    assert_eq!((s1, s2), (StatusCode::OK, StatusCode::OK));
    assert_eq!(b1["likes"], 1);
    assert_eq!(b2["likes"], 1);
    assert_eq!(b2["message"], "Artwork already liked");

    let (status, body) = send(&app, request(Method::DELETE, &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["likes"], 0);

    let (status, body) = send(&app, request(Method::DELETE, &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You have not liked this artwork");
    assert_eq!(ctx.repo.count_likes(artwork.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_liked_artworks_lists_enriched_records() {
    let ctx = TestContext::new();
    let app = create_router(ctx.state.clone());
    let user = ctx.seed_user("frida", "frida@example.com", "pw").await;
    let artwork = ctx.seed_artwork("lilies", "impressionism", None).await;
    let token = ctx.token(user.id, Role::User);

    send(
        &app,
        request(Method::POST, &format!("/api/artworks/{}/like", artwork.id), Some(&token)),
    )
    .await;

    let (status, body) = send(
        &app,
        request(Method::GET, "/api/users/me/liked-artworks", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], artwork.id);
    assert_eq!(body[0]["user_has_liked"], true);
}

// --- Artworks ---

#[tokio::test]
async fn test_submit_then_browse_by_style() {
    let ctx = TestContext::new();
    let app = create_router(ctx.state.clone());
    let user = ctx.seed_user("frida", "frida@example.com", "pw").await;
    let token = ctx.token(user.id, Role::User);

    let (status, body) = send(
        &app,
        multipart_request(
            Method::POST,
            "/api/artworks/submit",
            Some(&token),
            MultipartBody::new()
                .text("name", "The Two Fridas")
                .text("email", "frida@example.com")
                .text("style", "surrealism")
                .text("description", "Oil on canvas")
                .file("image", "fridas.png", "image/png", b"png-bytes"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Artwork submitted successfully");

    let (status, listed) = send(
        &app,
        request(Method::GET, "/api/artworks/surrealism", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed[0]["name"], "The Two Fridas");
    assert_eq!(listed[0]["user_id"], user.id);
    assert_eq!(listed[0]["likes"], 0);

    let (status, owned) = send(
        &app,
        request(Method::GET, &format!("/api/users/{}/artworks", user.id), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(owned.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_delete_artwork_cascades_likes() {
    let ctx = TestContext::new();
    let app = create_router(ctx.state.clone());
    let user = ctx.seed_user("frida", "frida@example.com", "pw").await;
    let artwork = ctx.seed_artwork("lilies", "impressionism", None).await;
    ctx.repo.insert_like(artwork.id, user.id).await.unwrap();
    let admin_token = ctx.token(1, Role::Admin);

    let (status, _) = send(
        &app,
        request(Method::DELETE, &format!("/api/artworks/{}", artwork.id), Some(&admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ctx.repo.count_likes(artwork.id).await.unwrap(), 0);

    let (status, _) = send(
        &app,
        request(Method::GET, &format!("/api/artworks/{}", artwork.id), Some(&admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// --- Contact Inbox ---

#[tokio::test]
async fn test_contact_inbox_routes() {
    let ctx = TestContext::new();
    let app = create_router(ctx.state.clone());
    let user = ctx.seed_user("frida", "frida@example.com", "pw").await;
    let token = ctx.token(user.id, Role::User);
    let admin_token = ctx.token(1, Role::Admin);

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/api/contact",
            Some(&token),
            json!({ "name": "Frida", "email": "frida@example.com", "message": "Hola" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, mine) = send(&app, request(Method::GET, "/api/users/me/contacts", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine[0]["message"], "Hola");

    let (status, _) = send(
        &app,
        request(Method::GET, "/api/contacts/email/frida@example.com", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, by_email) = send(
        &app,
        request(Method::GET, "/api/contacts/email/frida@example.com", Some(&admin_token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_email.as_array().unwrap().len(), 1);
}
