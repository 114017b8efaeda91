use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    checkout::OrderPlacement,
    error::Result,
    models::{
        CartLine, MANUAL_GATEWAY, Order, OrderItem, OrderItemSnapshot, OrderPaymentStatus, OrderQuery,
        OrderResponse, OrderSearchResponse, OrderStatus, Payment,
    },
    queries::{cart_queries, payment_queries},
    services::pricing,
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug)]
pub enum Placement {
    Placed(Box<OrderResponse>),
    OutOfStock { product_name: String },
    /// Another checkout already consumed the cart.
    CartEmpty,
    /// The cart no longer holds what was reviewed.
    CartChanged,
}

/// Same lines with the same quantities and prices, in any order.
fn same_lines(reviewed: &[CartLine], current: &[CartLine]) -> bool {
    line_keys(reviewed) == line_keys(current)
}

fn line_keys(lines: &[CartLine]) -> Vec<(Uuid, i32, Decimal)> {
    let mut keys: Vec<(Uuid, i32, Decimal)> = lines
        .iter()
        .map(|l| (l.id, l.quantity, l.product_price))
        .collect();
    keys.sort();
    keys
}

/// Asks the database for the next order number, falling back to a timestamp.
pub async fn next_order_number(pool: &PgPool) -> String {
    match sqlx::query_scalar::<_, String>("SELECT generate_order_number()")
        .fetch_one(pool)
        .await
    {
        Ok(number) => number,
        Err(e) => {
            let fallback = pricing::fallback_order_number(Utc::now());
            tracing::warn!(
                "generate_order_number failed ({}), using fallback {}",
                e,
                fallback
            );
            fallback
        }
    }
}

/// Writes the order, its item snapshots and the pending payment, takes the
/// stock and empties the cart. Nothing is kept if any step fails.
pub async fn place_order(
    pool: &PgPool,
    placement: &OrderPlacement,
    customer_email: &str,
    order_number: &str,
) -> Result<Placement> {
    let mut tx = pool.begin().await?;

    // Serializes checkouts of the same cart; a second one waits here and then
    // finds the cart cleared.
    let cart_id = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM carts WHERE user_id = $1 FOR UPDATE",
    )
    .bind(placement.user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(cart_id) = cart_id else {
        tx.rollback().await?;
        return Ok(Placement::CartEmpty);
    };

    let current = cart_queries::get_cart_lines(&mut *tx, cart_id).await?;
    if current.is_empty() {
        tx.rollback().await?;
        return Ok(Placement::CartEmpty);
    }

    if !same_lines(&placement.lines, &current) {
        tx.rollback().await?;
        return Ok(Placement::CartChanged);
    }

    // Ordered by product id so concurrent checkouts lock rows in the same order.
    let mut demand: BTreeMap<Uuid, (i32, &str)> = BTreeMap::new();
    for line in &placement.lines {
        let entry = demand
            .entry(line.product_id)
            .or_insert((0, line.product_name.as_str()));
        entry.0 += line.quantity;
    }

    for (product_id, (quantity, product_name)) in &demand {
        let result = sqlx::query(
            "UPDATE products SET stock = stock - $1, updated_at = NOW()
             WHERE id = $2 AND stock >= $1",
        )
        .bind(quantity)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(Placement::OutOfStock {
                product_name: product_name.to_string(),
            });
        }
    }

    let totals = &placement.totals;
    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (
            order_number, user_id, customer_name, customer_email, customer_phone,
            subtotal, shipping_cost, tax, discount, total,
            payment_method, shipping_address_id, customer_notes
         )
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         RETURNING *",
    )
    .bind(order_number)
    .bind(placement.user_id)
    .bind(&placement.address.recipient_name)
    .bind(customer_email)
    .bind(&placement.address.phone)
    .bind(totals.subtotal)
    .bind(totals.shipping_cost)
    .bind(totals.tax)
    .bind(totals.discount)
    .bind(totals.total)
    .bind(placement.payment_method.as_str())
    .bind(placement.address.id)
    .bind(&placement.customer_notes)
    .fetch_one(&mut *tx)
    .await?;

    let snapshots: Vec<OrderItemSnapshot> = placement
        .lines
        .iter()
        .map(|line| OrderItemSnapshot {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            product_image_url: line.product_image_url.clone(),
            quantity: line.quantity,
            size: line.size.clone(),
            color: line.color.clone(),
            price: line.product_price,
        })
        .collect();

    let product_ids: Vec<Uuid> = snapshots.iter().map(|s| s.product_id).collect();
    let names: Vec<&str> = snapshots.iter().map(|s| s.product_name.as_str()).collect();
    let images: Vec<Option<&str>> = snapshots.iter().map(|s| s.product_image_url.as_deref()).collect();
    let quantities: Vec<i32> = snapshots.iter().map(|s| s.quantity).collect();
    let sizes: Vec<Option<&str>> = snapshots.iter().map(|s| s.size.as_deref()).collect();
    let colors: Vec<Option<&str>> = snapshots.iter().map(|s| s.color.as_deref()).collect();
    let prices: Vec<Decimal> = snapshots.iter().map(|s| s.price).collect();
    let subtotals: Vec<Decimal> = snapshots.iter().map(OrderItemSnapshot::subtotal).collect();

    let items = sqlx::query_as::<_, OrderItem>(
        "INSERT INTO order_items (
            order_id, product_id, product_name, product_image_url,
            quantity, size, color, price, subtotal
         )
         SELECT $1, unnest($2::uuid[]), unnest($3::varchar[]), unnest($4::text[]),
                unnest($5::int[]), unnest($6::varchar[]), unnest($7::varchar[]),
                unnest($8::numeric[]), unnest($9::numeric[])
         RETURNING *",
    )
    .bind(order.id)
    .bind(&product_ids)
    .bind(&names)
    .bind(&images)
    .bind(&quantities)
    .bind(&sizes)
    .bind(&colors)
    .bind(&prices)
    .bind(&subtotals)
    .fetch_all(&mut *tx)
    .await?;

    let payment = sqlx::query_as::<_, Payment>(
        "INSERT INTO payments (order_id, payment_method, amount, payment_gateway)
         VALUES ($1, $2, $3, $4)
         RETURNING *",
    )
    .bind(order.id)
    .bind(placement.payment_method.as_str())
    .bind(order.total)
    .bind(MANUAL_GATEWAY)
    .fetch_one(&mut *tx)
    .await?;

    let reviewed_ids: Vec<Uuid> = current.iter().map(|l| l.id).collect();
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND id = ANY($2)")
        .bind(cart_id)
        .bind(&reviewed_ids)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        "Order {} placed by {} with {} items, total {}",
        order.order_number,
        placement.user_id,
        items.len(),
        order.total
    );

    Ok(Placement::Placed(Box::new(OrderResponse {
        order,
        items,
        payment: Some(payment),
    })))
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(order)
}

pub async fn find_by_number_for_user(
    pool: &PgPool,
    user_id: Uuid,
    order_number: &str,
) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE order_number = $1 AND user_id = $2",
    )
    .bind(order_number)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(order)
}

pub async fn get_user_orders(pool: &PgPool, user_id: Uuid) -> Result<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(orders)
}

pub async fn get_order_items(pool: &PgPool, order_id: Uuid) -> Result<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_at ASC",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

pub async fn load_response(pool: &PgPool, order: Order) -> Result<OrderResponse> {
    let items = get_order_items(pool, order.id).await?;
    let payment = payment_queries::find_latest_for_order(pool, order.id).await?;

    Ok(OrderResponse {
        order,
        items,
        payment,
    })
}

pub async fn get_orders(pool: &PgPool, params: &OrderQuery) -> Result<OrderSearchResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut query_builder = sqlx::QueryBuilder::<sqlx::Postgres>::new(
        "SELECT *, COUNT(*) OVER() AS total_count FROM orders WHERE 1=1",
    );

    if let Some(status) = params.status {
        query_builder.push(" AND status = ");
        query_builder.push_bind(status);
    }

    if let Some(payment_status) = params.payment_status {
        query_builder.push(" AND payment_status = ");
        query_builder.push_bind(payment_status);
    }

    query_builder.push(" ORDER BY created_at DESC LIMIT ");
    query_builder.push_bind(limit);
    query_builder.push(" OFFSET ");
    query_builder.push_bind(offset);

    #[derive(sqlx::FromRow)]
    struct SearchResult {
        #[sqlx(flatten)]
        order: Order,
        total_count: i64,
    }

    let results = query_builder
        .build_query_as::<SearchResult>()
        .fetch_all(pool)
        .await?;

    let total = results.first().map(|r| r.total_count).unwrap_or(0);
    let orders = results.into_iter().map(|r| r.order).collect();

    Ok(OrderSearchResponse {
        orders,
        total,
        limit,
        offset,
    })
}

/// Sets the status and stamps the matching transition column, if it has one.
pub async fn update_status(pool: &PgPool, id: Uuid, status: OrderStatus) -> Result<Option<Order>> {
    let stamp = status
        .timestamp_column()
        .map(|column| format!(", {} = NOW()", column))
        .unwrap_or_default();

    let order = sqlx::query_as::<_, Order>(&format!(
        "UPDATE orders SET status = $1, updated_at = NOW(){} WHERE id = $2 RETURNING *",
        stamp
    ))
    .bind(status)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(order)
}

pub async fn update_payment_status(
    pool: &PgPool,
    id: Uuid,
    payment_status: OrderPaymentStatus,
) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders SET payment_status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(payment_status)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(order)
}

pub async fn update_tracking(
    pool: &PgPool,
    id: Uuid,
    tracking_number: &str,
    courier: &str,
    estimated_delivery: Option<NaiveDate>,
) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders
         SET tracking_number = $1, courier = $2, estimated_delivery = $3, updated_at = NOW()
         WHERE id = $4
         RETURNING *",
    )
    .bind(tracking_number)
    .bind(courier)
    .bind(estimated_delivery)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(order)
}

pub async fn update_admin_notes(pool: &PgPool, id: Uuid, notes: Option<&str>) -> Result<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders SET admin_notes = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(notes)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(order)
}
