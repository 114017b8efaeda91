use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::storage_service::resolve_image_url;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub name_id: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub category: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub image_url: String,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    /// Loadable URL for the main image, or the category placeholder.
    pub display_image_url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ProductImage>,
}

impl ProductResponse {
    pub fn new(product: Product, images: Vec<ProductImage>, assets_url: &str) -> Self {
        let display_image_url =
            resolve_image_url(product.image_url.as_deref(), &product.category, assets_url);

        Self {
            product,
            display_image_url,
            images,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub query: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub name: Option<String>,
    pub name_id: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StockUpdateRequest {
    pub stock: i32,
}

#[derive(Debug, Deserialize)]
pub struct SaveImagesRequest {
    pub image_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImageUploadRequest {
    pub content_type: String,
    pub size: u64,
}

#[derive(Debug, Deserialize)]
pub struct ProductImageUrlRequest {
    pub images: Vec<ImageUploadRequest>,
}

#[derive(Debug, Serialize)]
pub struct ImageUploadUrl {
    pub image_uuid: Uuid,
    pub upload_url: String,
    pub public_url: String,
}

#[derive(Debug, Serialize)]
pub struct ProductImageUrlResponse {
    pub images: Vec<ImageUploadUrl>,
}
