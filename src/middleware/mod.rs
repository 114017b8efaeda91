use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    AppState,
    error::AppError,
    i18n::{Lang, t},
    models::UserRole,
    utils::jwt::{self, Claims},
};

fn request_lang(req: &Request) -> Lang {
    req.headers()
        .get(http::header::ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok())
        .map(Lang::from_accept_language)
        .unwrap_or_default()
}

fn authenticate(state: &AppState, req: &Request) -> Result<Claims, AppError> {
    let lang = request_lang(req);

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(t(lang, "auth.required").to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized(t(lang, "auth.invalid_token").to_string()))?;

    jwt::verify_token(&state.jwt, token).map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        AppError::Unauthorized(t(lang, "auth.invalid_token").to_string())
    })
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&state, &req)?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

pub async fn admin_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&state, &req)?;

    if claims.role != UserRole::Admin {
        tracing::warn!("Non-admin {} attempted admin access", claims.email);
        return Err(AppError::Forbidden(
            t(request_lang(&req), "auth.not_admin").to_string(),
        ));
    }

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
