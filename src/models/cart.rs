use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart item joined with the live product row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub product_name: String,
    pub product_price: Decimal,
    pub product_stock: i32,
    pub product_image_url: Option<String>,
    pub product_category: String,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.product_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: Option<i32>,
    pub size: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct CartSummary {
    pub total: Decimal,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub cart_id: Uuid,
    pub items: Vec<CartLine>,
    pub total: Decimal,
    pub count: i64,
}

impl CartResponse {
    pub fn new(cart_id: Uuid, items: Vec<CartLine>) -> Self {
        let summary = summarize(&items);
        Self {
            cart_id,
            items,
            total: summary.total,
            count: summary.count,
        }
    }
}

pub fn summarize(lines: &[CartLine]) -> CartSummary {
    CartSummary {
        total: lines.iter().map(CartLine::line_total).sum(),
        count: lines.iter().map(|l| i64::from(l.quantity)).sum(),
    }
}

/// Blank size/color selections are stored as NULL so they merge with "no variant".
pub fn normalize_variant(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
