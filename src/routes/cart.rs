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
    models::{
        AddToCartRequest, CartLine, CartResponse, CartSummary, UpdateCartItemRequest,
        normalize_variant, summarize,
    },
    queries::{cart_queries, product_queries},
    utils::{extractors::extract_user_id, jwt::Claims},
};

pub async fn get_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CartResponse>> {
    let user_id = extract_user_id(&claims)?;

    let cart = cart_queries::get_or_create_cart(&state.db, user_id).await?;
    let lines = cart_queries::get_cart_lines(&state.db, cart.id).await?;

    Ok(Json(CartResponse::new(cart.id, lines)))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<CartSummary>> {
    let user_id = extract_user_id(&claims)?;

    let cart = cart_queries::get_or_create_cart(&state.db, user_id).await?;
    let lines = cart_queries::get_cart_lines(&state.db, cart.id).await?;

    Ok(Json(summarize(&lines)))
}

pub async fn add_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    lang: Lang,
    Json(payload): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartLine>)> {
    let user_id = extract_user_id(&claims)?;

    let quantity = payload.quantity.unwrap_or(1);
    if quantity < 1 {
        return Err(AppError::BadRequest(t(lang, "cart.invalid_quantity").to_string()));
    }

    if product_queries::find_by_id(&state.db, payload.product_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(t(lang, "product.not_found").to_string()));
    }

    let size = normalize_variant(payload.size);
    let color = normalize_variant(payload.color);

    let cart = cart_queries::get_or_create_cart(&state.db, user_id).await?;
    let item = cart_queries::add_item(
        &state.db,
        cart.id,
        payload.product_id,
        quantity,
        size.as_deref(),
        color.as_deref(),
    )
    .await?;

    let line = cart_queries::find_line(&state.db, item.id)
        .await?
        .ok_or_else(|| AppError::NotFound(t(lang, "cart.item_not_found").to_string()))?;

    Ok((StatusCode::CREATED, Json(line)))
}

/// A quantity of zero removes the item.
pub async fn update_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(item_id): Path<Uuid>,
    lang: Lang,
    Json(payload): Json<UpdateCartItemRequest>,
) -> Result<StatusCode> {
    let user_id = extract_user_id(&claims)?;
    let not_found = || AppError::NotFound(t(lang, "cart.item_not_found").to_string());

    if payload.quantity < 0 {
        return Err(AppError::BadRequest(t(lang, "cart.invalid_quantity").to_string()));
    }

    if payload.quantity == 0 {
        if cart_queries::remove_item(&state.db, user_id, item_id).await? == 0 {
            return Err(not_found());
        }
        return Ok(StatusCode::NO_CONTENT);
    }

    cart_queries::update_item_quantity(&state.db, user_id, item_id, payload.quantity)
        .await?
        .ok_or_else(not_found)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(item_id): Path<Uuid>,
    lang: Lang,
) -> Result<StatusCode> {
    let user_id = extract_user_id(&claims)?;

    if cart_queries::remove_item(&state.db, user_id, item_id).await? == 0 {
        return Err(AppError::NotFound(t(lang, "cart.item_not_found").to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_cart(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode> {
    let user_id = extract_user_id(&claims)?;

    let removed = cart_queries::clear_cart(&state.db, user_id).await?;
    tracing::info!("Cleared {} items from cart of {}", removed, user_id);

    Ok(StatusCode::NO_CONTENT)
}
