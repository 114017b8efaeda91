use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::JwtConfig,
    error::{AppError, Result},
    models::UserRole,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub exp: usize,
}

pub fn generate_token(config: &JwtConfig, user_id: Uuid, email: &str, role: UserRole) -> Result<String> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::days(config.ttl_days))
        .ok_or_else(|| AppError::InternalError("Failed to calculate expiration".to_string()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalError(format!("Token generation failed: {}", e)))
}

pub fn verify_token(config: &JwtConfig, token: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            ttl_days: 7,
        }
    }

    #[test]
    fn token_carries_subject_and_role() {
        let cfg = config("bearions-secret");
        let user_id = Uuid::new_v4();
        let token = generate_token(&cfg, user_id, "admin@bearions.id", UserRole::Admin).unwrap();

        let claims = verify_token(&cfg, &token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "admin@bearions.id");
        assert_eq!(claims.role, UserRole::Admin);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token =
            generate_token(&config("one"), Uuid::new_v4(), "a@b.c", UserRole::Customer).unwrap();

        assert!(matches!(
            verify_token(&config("two"), &token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let cfg = JwtConfig {
            secret: "s".to_string(),
            ttl_days: -2,
        };
        let token = generate_token(&cfg, Uuid::new_v4(), "a@b.c", UserRole::Customer).unwrap();

        assert!(verify_token(&cfg, &token).is_err());
    }
}
