use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    i18n::Lang,
    utils::jwt::Claims,
};

pub fn extract_user_id(claims: &Claims) -> Result<Uuid> {
    claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| AppError::Unauthorized("Unauthorized".to_string()))
}

impl<S> FromRequestParts<S> for Lang
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        Ok(parts
            .headers
            .get(http::header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .map(Lang::from_accept_language)
            .unwrap_or_default())
    }
}
