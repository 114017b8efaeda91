use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{RegisterRequest, User},
};

pub async fn create_user(pool: &PgPool, req: &RegisterRequest, password_hash: &str) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password, full_name, phone, address)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING *",
    )
    .bind(req.email.trim().to_lowercase())
    .bind(password_hash)
    .bind(req.full_name.trim())
    .bind(&req.phone)
    .bind(&req.address)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}
