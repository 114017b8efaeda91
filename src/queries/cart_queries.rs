use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::{
    error::Result,
    models::{Cart, CartItem, CartLine},
};

const CART_LINE_SELECT: &str = "
    SELECT ci.id, ci.product_id, ci.quantity, ci.size, ci.color, ci.created_at,
           p.name AS product_name, p.price AS product_price, p.stock AS product_stock,
           p.image_url AS product_image_url, p.category AS product_category
    FROM cart_items ci
    JOIN products p ON p.id = ci.product_id";

pub async fn get_or_create_cart(pool: &PgPool, user_id: Uuid) -> Result<Cart> {
    let cart = sqlx::query_as::<_, Cart>(
        "INSERT INTO carts (user_id) VALUES ($1)
         ON CONFLICT (user_id) DO UPDATE SET updated_at = carts.updated_at
         RETURNING *",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(cart)
}

/// Newest first. Accepts a transaction so placement can re-read under lock.
pub async fn get_cart_lines<'e, E>(executor: E, cart_id: Uuid) -> Result<Vec<CartLine>>
where
    E: PgExecutor<'e>,
{
    let lines = sqlx::query_as::<_, CartLine>(&format!(
        "{} WHERE ci.cart_id = $1 ORDER BY ci.created_at DESC",
        CART_LINE_SELECT
    ))
    .bind(cart_id)
    .fetch_all(executor)
    .await?;

    Ok(lines)
}

pub async fn find_line(pool: &PgPool, item_id: Uuid) -> Result<Option<CartLine>> {
    let line = sqlx::query_as::<_, CartLine>(&format!("{} WHERE ci.id = $1", CART_LINE_SELECT))
        .bind(item_id)
        .fetch_optional(pool)
        .await?;

    Ok(line)
}

/// Inserts the item, or adds `quantity` to the row already holding the same
/// product, size and color.
pub async fn add_item(
    pool: &PgPool,
    cart_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    size: Option<&str>,
    color: Option<&str>,
) -> Result<CartItem> {
    let item = sqlx::query_as::<_, CartItem>(
        "INSERT INTO cart_items (cart_id, product_id, quantity, size, color)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT ON CONSTRAINT cart_items_variant_key
         DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity, updated_at = NOW()
         RETURNING *",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .bind(size)
    .bind(color)
    .fetch_one(pool)
    .await?;

    Ok(item)
}

pub async fn update_item_quantity(
    pool: &PgPool,
    user_id: Uuid,
    item_id: Uuid,
    quantity: i32,
) -> Result<Option<CartItem>> {
    let item = sqlx::query_as::<_, CartItem>(
        "UPDATE cart_items ci
         SET quantity = $1, updated_at = NOW()
         FROM carts c
         WHERE ci.id = $2 AND ci.cart_id = c.id AND c.user_id = $3
         RETURNING ci.*",
    )
    .bind(quantity)
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(item)
}

pub async fn remove_item(pool: &PgPool, user_id: Uuid, item_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        "DELETE FROM cart_items ci
         USING carts c
         WHERE ci.id = $1 AND ci.cart_id = c.id AND c.user_id = $2",
    )
    .bind(item_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn clear_cart(pool: &PgPool, user_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        "DELETE FROM cart_items WHERE cart_id IN (SELECT id FROM carts WHERE user_id = $1)",
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
