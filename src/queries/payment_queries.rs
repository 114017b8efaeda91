use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{OrderPaymentStatus, Payment, PaymentStatus, UpdatePaymentRequest},
};

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(payment)
}

pub async fn find_latest_for_order(pool: &PgPool, order_id: Uuid) -> Result<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE order_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(order_id)
    .fetch_optional(pool)
    .await?;

    Ok(payment)
}

/// Applies an admin status change. A successful payment without an explicit
/// `paid_at` is stamped with the current time.
pub async fn update_status(
    pool: &PgPool,
    id: Uuid,
    req: &UpdatePaymentRequest,
) -> Result<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(
        r#"
        UPDATE payments
        SET
            status = $1,
            transaction_id = COALESCE($2, transaction_id),
            gateway_response = COALESCE($3, gateway_response),
            paid_at = CASE
                WHEN $4::timestamptz IS NOT NULL THEN $4
                WHEN $1 = 'success' THEN COALESCE(paid_at, NOW())
                ELSE paid_at
            END,
            updated_at = NOW()
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(req.status)
    .bind(&req.transaction_id)
    .bind(&req.gateway_response)
    .bind(req.paid_at)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(payment)
}

/// Records the customer's transfer details and moves the payment to processing.
pub async fn record_manual_transfer(
    pool: &PgPool,
    id: Uuid,
    bank_name: &str,
    account_number: &str,
) -> Result<Option<Payment>> {
    let details = serde_json::json!({
        "bank_name": bank_name,
        "account_number": account_number,
        "submitted_at": chrono::Utc::now(),
    });

    let payment = sqlx::query_as::<_, Payment>(
        "UPDATE payments
         SET status = 'processing', gateway_response = $1, updated_at = NOW()
         WHERE id = $2
         RETURNING *",
    )
    .bind(details)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(payment)
}

pub async fn set_proof_url(pool: &PgPool, id: Uuid, proof_url: &str) -> Result<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(
        "UPDATE payments SET payment_proof_url = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
    )
    .bind(proof_url)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(payment)
}

/// Accepts or rejects a manual payment and mirrors the outcome on its order.
pub async fn verify_payment(pool: &PgPool, id: Uuid, verified: bool) -> Result<Option<Payment>> {
    let (status, order_status) = if verified {
        (PaymentStatus::Success, OrderPaymentStatus::Paid)
    } else {
        (PaymentStatus::Failed, OrderPaymentStatus::Failed)
    };

    let mut tx = pool.begin().await?;

    let payment = sqlx::query_as::<_, Payment>(
        r#"
        UPDATE payments
        SET
            status = $1,
            paid_at = CASE WHEN $1 = 'success' THEN COALESCE(paid_at, NOW()) ELSE paid_at END,
            updated_at = NOW()
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(status)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(payment) = payment else {
        tx.rollback().await?;
        return Ok(None);
    };

    sqlx::query("UPDATE orders SET payment_status = $1, updated_at = NOW() WHERE id = $2")
        .bind(order_status)
        .bind(payment.order_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        "Payment {} for order {} marked {:?}",
        payment.id,
        payment.order_id,
        payment.status
    );

    Ok(Some(payment))
}
