//! Router tests that need no running database

use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use neighborhood_library::{
    config::AppConfig,
    create_router,
    models::user::{Role, UserClaims},
    repository::Repository,
    services::Services,
    AppState,
};

fn app() -> Router {
    let config = AppConfig::default();
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy(&config.database.url)
        .expect("lazy pool");

    let services = Services::new(Repository::new(pool), &config);
    create_router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

fn token(secret: &str, exp_offset_hours: i64) -> String {
    let now = Utc::now();
    UserClaims {
        sub: "1".to_string(),
        user_id: 1,
        role: Role::Admin,
        member_id: None,
        exp: (now + chrono::Duration::hours(exp_offset_hours)).timestamp(),
        iat: now.timestamp(),
    }
    .create_token(secret)
    .unwrap()
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_auth(uri: &str, auth: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, auth)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (status, body) = send(get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let (status, body) = send(get("/api/borrowings")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 2);
    assert_eq!(body["error"], "NotAuthenticated");
}

#[tokio::test]
async fn test_non_bearer_header_is_unauthorized() {
    let (status, _) = send(get_with_auth("/api/auth/me", "Basic YWRtaW46YWRtaW4=")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_unauthorized() {
    let auth = format!("Bearer {}", token("not-the-server-secret", 1));
    let (status, _) = send(get_with_auth("/api/user/dashboard", &auth)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let secret = AppConfig::default().auth.jwt_secret;
    let auth = format!("Bearer {}", token(&secret, -2));

    let request = Request::builder()
        .method("POST")
        .uri("/api/borrowings")
        .header(AUTHORIZATION, auth)
        .header("content-type", "application/json")
        .body(Body::from(r#"{"book_id":1}"#))
        .unwrap();

    let (status, _) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_public_endpoint_still_rejects_bad_token() {
    let (status, _) = send(get_with_auth("/api/testimonials", "Bearer garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let (status, body) = send(get("/api-docs/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/borrowings/{id}/return"].is_object());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (status, _) = send(get("/api/loans")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
