use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    error::Result,
    models::{AddressRequest, AddressUpdate, ShippingAddress},
};

const DEFAULT_COUNTRY: &str = "Indonesia";

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<ShippingAddress>> {
    let addresses = sqlx::query_as::<_, ShippingAddress>(
        "SELECT * FROM shipping_addresses
         WHERE user_id = $1
         ORDER BY is_default DESC, created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(addresses)
}

pub async fn find_default(pool: &PgPool, user_id: Uuid) -> Result<Option<ShippingAddress>> {
    let address = sqlx::query_as::<_, ShippingAddress>(
        "SELECT * FROM shipping_addresses WHERE user_id = $1 AND is_default",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(address)
}

pub async fn find_owned(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<ShippingAddress>> {
    let address = sqlx::query_as::<_, ShippingAddress>(
        "SELECT * FROM shipping_addresses WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(address)
}

async fn unset_defaults(conn: &mut PgConnection, user_id: Uuid, except: Option<Uuid>) -> Result<()> {
    sqlx::query(
        "UPDATE shipping_addresses
         SET is_default = FALSE, updated_at = NOW()
         WHERE user_id = $1 AND is_default AND ($2::uuid IS NULL OR id <> $2)",
    )
    .bind(user_id)
    .bind(except)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn create(pool: &PgPool, user_id: Uuid, req: &AddressRequest) -> Result<ShippingAddress> {
    let mut tx = pool.begin().await?;

    if req.is_default {
        unset_defaults(&mut tx, user_id, None).await?;
    }

    let address = sqlx::query_as::<_, ShippingAddress>(
        "INSERT INTO shipping_addresses (
            user_id, recipient_name, phone, address_line1, address_line2,
            city, province, postal_code, country, is_default, label
         )
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         RETURNING *",
    )
    .bind(user_id)
    .bind(req.recipient_name.trim())
    .bind(req.phone.trim())
    .bind(req.address_line1.trim())
    .bind(&req.address_line2)
    .bind(req.city.trim())
    .bind(req.province.trim())
    .bind(req.postal_code.trim())
    .bind(req.country.as_deref().unwrap_or(DEFAULT_COUNTRY))
    .bind(req.is_default)
    .bind(&req.label)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(address)
}

pub async fn update(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    req: &AddressUpdate,
) -> Result<Option<ShippingAddress>> {
    let mut tx = pool.begin().await?;

    if req.is_default == Some(true) {
        unset_defaults(&mut tx, user_id, Some(id)).await?;
    }

    let address = sqlx::query_as::<_, ShippingAddress>(
        "UPDATE shipping_addresses
         SET
            recipient_name = COALESCE($1, recipient_name),
            phone = COALESCE($2, phone),
            address_line1 = COALESCE($3, address_line1),
            address_line2 = COALESCE($4, address_line2),
            city = COALESCE($5, city),
            province = COALESCE($6, province),
            postal_code = COALESCE($7, postal_code),
            country = COALESCE($8, country),
            is_default = COALESCE($9, is_default),
            label = COALESCE($10, label),
            updated_at = NOW()
         WHERE id = $11 AND user_id = $12
         RETURNING *",
    )
    .bind(&req.recipient_name)
    .bind(&req.phone)
    .bind(&req.address_line1)
    .bind(&req.address_line2)
    .bind(&req.city)
    .bind(&req.province)
    .bind(&req.postal_code)
    .bind(&req.country)
    .bind(req.is_default)
    .bind(&req.label)
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    // Nothing matched: leave the previous default untouched.
    if address.is_none() {
        tx.rollback().await?;
        return Ok(None);
    }

    tx.commit().await?;
    Ok(address)
}

pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM shipping_addresses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn set_default(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Option<ShippingAddress>> {
    let mut tx = pool.begin().await?;

    let exists = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM shipping_addresses WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    if exists.is_none() {
        tx.rollback().await?;
        return Ok(None);
    }

    unset_defaults(&mut tx, user_id, Some(id)).await?;

    let address = sqlx::query_as::<_, ShippingAddress>(
        "UPDATE shipping_addresses SET is_default = TRUE, updated_at = NOW()
         WHERE id = $1 AND user_id = $2
         RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(address))
}
