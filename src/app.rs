use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
};
use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::{AppConfig, JwtConfig, load_s3_client},
    database,
    error::{AppError, Result},
    routes,
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3_client: S3Client,
    pub s3_bucket: String,
    pub assets_url: String,
    pub jwt: JwtConfig,
}

impl AppState {
    pub fn new(db: PgPool, s3_client: S3Client, config: &AppConfig) -> Self {
        Self {
            db,
            s3_client,
            s3_bucket: config.s3.bucket.clone(),
            assets_url: config.s3.assets_url.clone(),
            jwt: config.jwt.clone(),
        }
    }
}

pub async fn build(config: &AppConfig) -> Result<Router> {
    let pool = database::create_pool(&config.database).await?;
    let s3_client = load_s3_client(&config.s3).await;

    let state = AppState::new(pool, s3_client, config);

    build_router(state, config)
}

pub fn build_router(state: AppState, config: &AppConfig) -> Result<Router> {
    let allowed_origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| AppError::ConfigError(format!("Invalid CORS origin: {}", origin)))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            http::header::CONTENT_TYPE,
            http::header::AUTHORIZATION,
            http::header::ACCEPT_LANGUAGE,
        ])
        .allow_origin(allowed_origins);

    let app = routes::create_router(&state)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}
