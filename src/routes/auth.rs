use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    error::{AppError, Result, is_unique_violation},
    i18n::{Lang, t},
    models::{AuthResponse, LoginRequest, RegisterRequest, SessionResponse, User, UserRole},
    queries::user_queries,
    utils::{
        extractors::extract_user_id,
        jwt::{self, Claims},
    },
};

const MIN_PASSWORD_LEN: usize = 6;

pub async fn register_user(
    State(state): State<AppState>,
    lang: Lang,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    validate_registration(&payload, lang)?;

    let password_hash = bcrypt::hash(&payload.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))?;

    let user = match user_queries::create_user(&state.db, &payload, &password_hash).await {
        Ok(user) => user,
        Err(AppError::DatabaseError(ref e)) if is_unique_violation(e) => {
            return Err(AppError::Conflict(t(lang, "auth.email_taken").to_string()));
        }
        Err(e) => return Err(e),
    };

    tracing::info!("Registered user {}", user.id);

    let response = issue_token(&state, &user)?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login_user(
    State(state): State<AppState>,
    lang: Lang,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = authenticate(&state, &payload, lang).await?;

    Ok(Json(issue_token(&state, &user)?))
}

/// Same as login, but only admin accounts receive a token.
pub async fn admin_login(
    State(state): State<AppState>,
    lang: Lang,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = authenticate(&state, &payload, lang).await?;

    if user.role != UserRole::Admin {
        tracing::warn!("Admin login refused for {}", user.id);
        return Err(AppError::Forbidden(t(lang, "auth.not_admin").to_string()));
    }

    Ok(Json(issue_token(&state, &user)?))
}

pub async fn session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    lang: Lang,
) -> Result<Json<SessionResponse>> {
    let user_id = extract_user_id(&claims)?;

    let user = user_queries::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(t(lang, "auth.user_not_found").to_string()))?;

    Ok(Json(user.into()))
}

// Tokens are stateless; the client drops its copy.
pub async fn logout(Extension(claims): Extension<Claims>) -> StatusCode {
    tracing::info!("User {} logged out", claims.sub);
    StatusCode::NO_CONTENT
}

async fn authenticate(state: &AppState, payload: &LoginRequest, lang: Lang) -> Result<User> {
    let invalid = || AppError::Unauthorized(t(lang, "auth.invalid_credentials").to_string());

    let user = user_queries::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(invalid)?;

    let is_valid = bcrypt::verify(&payload.password, &user.password)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {}", e)))?;

    if !is_valid {
        return Err(invalid());
    }

    Ok(user)
}

fn issue_token(state: &AppState, user: &User) -> Result<AuthResponse> {
    let token = jwt::generate_token(&state.jwt, user.id, &user.email, user.role)?;

    Ok(AuthResponse {
        token,
        role: user.role,
    })
}

fn validate_registration(payload: &RegisterRequest, lang: Lang) -> Result<()> {
    let email = payload.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest(t(lang, "auth.invalid_email").to_string()));
    }

    if payload.full_name.trim().is_empty() {
        return Err(AppError::BadRequest(t(lang, "auth.name_required").to_string()));
    }

    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(t(lang, "auth.password_length").to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str, full_name: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
            phone: None,
            address: None,
        }
    }

    #[test]
    fn accepts_valid_registration() {
        assert!(validate_registration(&request("ayu@contoh.com", "rahasia", "Ayu"), Lang::En).is_ok());
    }

    #[test]
    fn rejects_short_password_in_indonesian() {
        let err = validate_registration(&request("ayu@contoh.com", "12345", "Ayu"), Lang::Id)
            .unwrap_err();

        match err {
            AppError::BadRequest(msg) => assert_eq!(msg, "Kata sandi minimal 6 karakter"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn rejects_missing_name_and_bad_email() {
        assert!(matches!(
            validate_registration(&request("not-an-email", "rahasia", "Ayu"), Lang::En),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_registration(&request("ayu@contoh.com", "rahasia", "  "), Lang::En),
            Err(AppError::BadRequest(_))
        ));
    }
}
