#![allow(dead_code)]

use std::collections::HashMap;

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use bearions_back::{
    AppConfig, AppState, app,
    models::{ProductRequest, RegisterRequest, UserRole},
    utils::jwt,
};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tower::ServiceExt;
use uuid::Uuid;

pub fn test_config() -> AppConfig {
    let vars = HashMap::from([
        ("DB_URL", "postgres://localhost/bearions_test"),
        ("FRONTEND_URL", "http://localhost:5173"),
        ("JWT_SECRET", "integration-secret"),
        ("AWS_ACCESS_KEY_ID", "test-key"),
        ("AWS_SECRET_ACCESS_KEY", "test-secret"),
        ("S3_BUCKET", "bearions-test"),
        ("ASSETS_URL", "https://assets.example.com"),
    ]);

    AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

fn offline_s3_client() -> aws_sdk_s3::Client {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(Credentials::new("test-key", "test-secret", None, None, "tests"))
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

pub fn state_with_pool(pool: PgPool, config: &AppConfig) -> AppState {
    AppState::new(pool, offline_s3_client(), config)
}

/// Router over a pool that never connects; only usable for requests that
/// are answered before touching the database.
pub fn offline_router() -> Router {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .unwrap();

    app::build_router(state_with_pool(pool, &config), &config).unwrap()
}

/// Router backed by a real database, for `#[sqlx::test]` flows.
pub fn router_with_pool(pool: PgPool) -> Router {
    let config = test_config();
    app::build_router(state_with_pool(pool, &config), &config).unwrap()
}

pub fn token_for(role: UserRole) -> String {
    token_for_user(Uuid::new_v4(), "tester@bearions.id", role)
}

pub fn token_for_user(user_id: Uuid, email: &str, role: UserRole) -> String {
    let config = test_config();
    jwt::generate_token(&config.jwt, user_id, email, role).unwrap()
}

pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, body)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn register_request(email: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: "$2b$04$placeholderhashplaceholderhashplace".to_string(),
        full_name: "Budi Santoso".to_string(),
        phone: Some("081234567890".to_string()),
        address: None,
    }
}

pub fn product_request(name: &str, price: Decimal, stock: i32) -> ProductRequest {
    ProductRequest {
        name: Some(name.to_string()),
        name_id: Some(format!("{} (ID)", name)),
        description: None,
        price: Some(price),
        stock: Some(stock),
        category: Some("Tops".to_string()),
        image_url: None,
    }
}
