use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    error::Result,
    models::{Product, ProductImage, ProductQuery, ProductRequest},
};

const DEFAULT_PAGE_SIZE: i64 = 24;
const MAX_PAGE_SIZE: i64 = 100;

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(product)
}

/// Escapes LIKE wildcards so user text matches literally under `ESCAPE '\\'`.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Newest first, optionally narrowed by a name search and a category.
pub async fn search_products(pool: &PgPool, params: &ProductQuery) -> Result<Vec<Product>> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM products WHERE 1=1");

    if let Some(q) = params.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", escape_like(q));
        query.push(" AND (name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" ESCAPE '\\' OR name_id ILIKE ");
        query.push_bind(pattern);
        query.push(" ESCAPE '\\')");
    }

    if let Some(ref category) = params.category {
        query.push(" AND category = ");
        query.push_bind(category);
    }

    query.push(" ORDER BY created_at DESC LIMIT ");
    query.push_bind(limit);
    query.push(" OFFSET ");
    query.push_bind(offset);

    let products = query.build_query_as::<Product>().fetch_all(pool).await?;

    Ok(products)
}

pub async fn find_images_by_product_id(pool: &PgPool, product_id: Uuid) -> Result<Vec<ProductImage>> {
    let images = sqlx::query_as::<_, ProductImage>(
        "SELECT * FROM product_images WHERE product_id = $1 ORDER BY display_order ASC",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(images)
}

pub async fn create_product(pool: &PgPool, req: &ProductRequest) -> Result<Product> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (name, name_id, description, price, stock, category, image_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(&req.name)
    .bind(&req.name_id)
    .bind(&req.description)
    .bind(req.price)
    .bind(req.stock.unwrap_or(0))
    .bind(&req.category)
    .bind(&req.image_url)
    .fetch_one(pool)
    .await?;

    Ok(product)
}

pub async fn update_product(pool: &PgPool, id: Uuid, req: &ProductRequest) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET
            name = COALESCE($1, name),
            name_id = COALESCE($2, name_id),
            description = COALESCE($3, description),
            price = COALESCE($4, price),
            stock = COALESCE($5, stock),
            category = COALESCE($6, category),
            image_url = COALESCE($7, image_url),
            updated_at = NOW()
        WHERE id = $8
        RETURNING *
        "#,
    )
    .bind(&req.name)
    .bind(&req.name_id)
    .bind(&req.description)
    .bind(req.price)
    .bind(req.stock)
    .bind(&req.category)
    .bind(&req.image_url)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

pub async fn update_stock(pool: &PgPool, id: Uuid, stock: i32) -> Result<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET stock = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(stock)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

/// Order items keep their snapshot fields; only the product reference is nulled.
pub async fn delete_product(pool: &PgPool, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Replaces the ordered image list and points `image_url` at the first entry.
pub async fn save_product_images(
    pool: &PgPool,
    product_id: Uuid,
    image_urls: &[String],
) -> Result<Vec<ProductImage>> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM product_images WHERE product_id = $1")
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

    let orders: Vec<i32> = (0..image_urls.len() as i32).collect();

    let images = sqlx::query_as::<_, ProductImage>(
        "INSERT INTO product_images (product_id, image_url, display_order)
         SELECT $1, url, ord FROM unnest($2::text[], $3::int[]) AS t(url, ord)
         RETURNING *",
    )
    .bind(product_id)
    .bind(image_urls)
    .bind(&orders)
    .fetch_all(&mut *tx)
    .await?;

    sqlx::query("UPDATE products SET image_url = $1, updated_at = NOW() WHERE id = $2")
        .bind(image_urls.first())
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let mut images = images;
    images.sort_by_key(|img| img.display_order);

    Ok(images)
}
