use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    AppState,
    error::{AppError, Result},
    i18n::{Lang, t},
    models::{
        ManualTransferRequest, Order, OrderResponse, Payment, ProofConfirmRequest,
        ProofUploadRequest, ProofUploadResponse, TimelineEntry,
    },
    queries::{order_queries, payment_queries},
    services::storage_service::{self, payment_proof_key, put_object_url, validate_image},
    utils::{extractors::extract_user_id, jwt::Claims},
};

async fn find_own_order(
    state: &AppState,
    user_id: Uuid,
    order_number: &str,
    lang: Lang,
) -> Result<Order> {
    order_queries::find_by_number_for_user(&state.db, user_id, order_number)
        .await?
        .ok_or_else(|| AppError::NotFound(t(lang, "order.not_found").to_string()))
}

async fn find_order_payment(state: &AppState, order: &Order, lang: Lang) -> Result<Payment> {
    payment_queries::find_latest_for_order(&state.db, order.id)
        .await?
        .ok_or_else(|| AppError::NotFound(t(lang, "payment.not_found").to_string()))
}

pub async fn list_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Order>>> {
    let user_id = extract_user_id(&claims)?;

    let orders = order_queries::get_user_orders(&state.db, user_id).await?;

    Ok(Json(orders))
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_number): Path<String>,
    lang: Lang,
) -> Result<Json<OrderResponse>> {
    let user_id = extract_user_id(&claims)?;

    let order = find_own_order(&state, user_id, &order_number, lang).await?;
    let response = order_queries::load_response(&state.db, order).await?;

    Ok(Json(response))
}

pub async fn get_timeline(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_number): Path<String>,
    lang: Lang,
) -> Result<Json<Vec<TimelineEntry>>> {
    let user_id = extract_user_id(&claims)?;

    let order = find_own_order(&state, user_id, &order_number, lang).await?;

    Ok(Json(order.timeline()))
}

pub async fn submit_transfer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_number): Path<String>,
    lang: Lang,
    Json(payload): Json<ManualTransferRequest>,
) -> Result<Json<Payment>> {
    let user_id = extract_user_id(&claims)?;

    let bank_name = payload.bank_name.trim();
    let account_number = payload.account_number.trim();
    if bank_name.is_empty() || account_number.is_empty() {
        return Err(AppError::BadRequest(t(lang, "payment.invalid_transfer").to_string()));
    }

    let order = find_own_order(&state, user_id, &order_number, lang).await?;
    let payment = find_order_payment(&state, &order, lang).await?;

    let payment =
        payment_queries::record_manual_transfer(&state.db, payment.id, bank_name, account_number)
            .await?
            .ok_or_else(|| AppError::NotFound(t(lang, "payment.not_found").to_string()))?;

    tracing::info!("Manual transfer submitted for order {}", order.order_number);

    Ok(Json(payment))
}

/// Issues a presigned upload for a transfer receipt. Nothing is stored until
/// the client confirms the upload.
pub async fn proof_upload_url(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_number): Path<String>,
    lang: Lang,
    Json(payload): Json<ProofUploadRequest>,
) -> Result<Json<ProofUploadResponse>> {
    let user_id = extract_user_id(&claims)?;

    let extension = validate_image(&payload.content_type, payload.size)
        .map_err(|rejection| rejection.into_app_error(lang))?;

    let order = find_own_order(&state, user_id, &order_number, lang).await?;
    let payment = find_order_payment(&state, &order, lang).await?;

    let key = payment_proof_key(payment.id, Utc::now(), extension);
    let upload_url =
        put_object_url(&state.s3_client, &state.s3_bucket, &key, &payload.content_type).await?;
    let public_url = storage_service::public_url(&state.assets_url, &key);

    Ok(Json(ProofUploadResponse {
        upload_url,
        public_url,
    }))
}

pub async fn confirm_proof(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(order_number): Path<String>,
    lang: Lang,
    Json(payload): Json<ProofConfirmRequest>,
) -> Result<Json<Payment>> {
    let user_id = extract_user_id(&claims)?;

    let order = find_own_order(&state, user_id, &order_number, lang).await?;
    let payment = find_order_payment(&state, &order, lang).await?;

    let public_url = payload.public_url.trim();
    if !storage_service::is_payment_proof_url(&state.assets_url, payment.id, public_url) {
        return Err(AppError::BadRequest(t(lang, "payment.invalid_proof").to_string()));
    }

    let payment = payment_queries::set_proof_url(&state.db, payment.id, public_url)
        .await?
        .ok_or_else(|| AppError::NotFound(t(lang, "payment.not_found").to_string()))?;

    tracing::info!("Payment proof attached to order {}", order.order_number);

    Ok(Json(payment))
}
