use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    AppState,
    error::{AppError, Result},
    i18n::{Lang, t},
    models::{AddressRequest, AddressUpdate, ShippingAddress},
    queries::address_queries,
    utils::{extractors::extract_user_id, jwt::Claims},
};

fn not_found(lang: Lang) -> AppError {
    AppError::NotFound(t(lang, "address.not_found").to_string())
}

pub async fn list_addresses(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ShippingAddress>>> {
    let user_id = extract_user_id(&claims)?;

    let addresses = address_queries::list_for_user(&state.db, user_id).await?;

    Ok(Json(addresses))
}

pub async fn get_default_address(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    lang: Lang,
) -> Result<Json<ShippingAddress>> {
    let user_id = extract_user_id(&claims)?;

    let address = address_queries::find_default(&state.db, user_id)
        .await?
        .ok_or_else(|| not_found(lang))?;

    Ok(Json(address))
}

pub async fn add_address(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    lang: Lang,
    Json(payload): Json<AddressRequest>,
) -> Result<(StatusCode, Json<ShippingAddress>)> {
    let user_id = extract_user_id(&claims)?;

    if let Some(field) = payload.missing_field() {
        return Err(AppError::BadRequest(format!(
            "{}: {}",
            t(lang, "address.missing_field"),
            field
        )));
    }

    let address = address_queries::create(&state.db, user_id, &payload).await?;

    Ok((StatusCode::CREATED, Json(address)))
}

pub async fn update_address(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    lang: Lang,
    Json(payload): Json<AddressUpdate>,
) -> Result<Json<ShippingAddress>> {
    let user_id = extract_user_id(&claims)?;

    let address = address_queries::update(&state.db, user_id, id, &payload)
        .await?
        .ok_or_else(|| not_found(lang))?;

    Ok(Json(address))
}

pub async fn delete_address(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    lang: Lang,
) -> Result<StatusCode> {
    let user_id = extract_user_id(&claims)?;

    if address_queries::delete(&state.db, user_id, id).await? == 0 {
        return Err(not_found(lang));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_default_address(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    lang: Lang,
) -> Result<Json<ShippingAddress>> {
    let user_id = extract_user_id(&claims)?;

    let address = address_queries::set_default(&state.db, user_id, id)
        .await?
        .ok_or_else(|| not_found(lang))?;

    Ok(Json(address))
}
