use axum::{
    Json,
    extract::{Path, Query, State},
};
use http::StatusCode;
use uuid::Uuid;

use crate::{
    AppState,
    error::{AppError, Result},
    i18n::{Lang, t},
    models::{
        AdminNotesRequest, ImageUploadUrl, Order, OrderQuery, OrderResponse, OrderSearchResponse,
        Payment, ProductImage, ProductImageUrlRequest, ProductImageUrlResponse, ProductRequest,
        ProductResponse, SaveImagesRequest, StockUpdateRequest, TrackingRequest,
        UpdateOrderPaymentStatusRequest, UpdateOrderStatusRequest, UpdatePaymentRequest,
        VerifyPaymentRequest,
    },
    queries::{order_queries, payment_queries, product_queries},
    services::storage_service::{
        self, delete_objects_by_prefix, product_image_key, product_image_prefix, put_object_url,
        validate_image,
    },
};

fn product_not_found(lang: Lang) -> AppError {
    AppError::NotFound(t(lang, "product.not_found").to_string())
}

fn order_not_found(lang: Lang) -> AppError {
    AppError::NotFound(t(lang, "order.not_found").to_string())
}

fn payment_not_found(lang: Lang) -> AppError {
    AppError::NotFound(t(lang, "payment.not_found").to_string())
}

/// Creation needs name, category and price; a patch may omit any of them but
/// may not blank them out or send a negative price.
fn validate_product(payload: &ProductRequest, require_all: bool, lang: Lang) -> Result<()> {
    let blank = |field: Option<&str>| match field {
        Some(value) => value.trim().is_empty(),
        None => require_all,
    };
    let price_invalid = match payload.price {
        Some(price) => price.is_sign_negative(),
        None => require_all,
    };

    if blank(payload.name.as_deref()) || blank(payload.category.as_deref()) || price_invalid {
        return Err(AppError::BadRequest(t(lang, "product.invalid").to_string()));
    }

    if payload.stock.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest(t(lang, "product.invalid_stock").to_string()));
    }

    Ok(())
}

//PRODUCT ROUTES
pub async fn create_product(
    State(state): State<AppState>,
    lang: Lang,
    Json(payload): Json<ProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>)> {
    validate_product(&payload, true, lang)?;

    let product = product_queries::create_product(&state.db, &payload).await?;
    tracing::info!("Created product {} ({})", product.id, product.name);

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse::new(product, Vec::new(), &state.assets_url)),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    lang: Lang,
    Json(payload): Json<ProductRequest>,
) -> Result<Json<ProductResponse>> {
    validate_product(&payload, false, lang)?;

    let product = product_queries::update_product(&state.db, id, &payload)
        .await?
        .ok_or_else(|| product_not_found(lang))?;
    let images = product_queries::find_images_by_product_id(&state.db, id).await?;

    Ok(Json(ProductResponse::new(product, images, &state.assets_url)))
}

/// Removes the product and every object stored under its image prefix.
/// Order items keep their snapshots.
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    lang: Lang,
) -> Result<StatusCode> {
    if product_queries::find_by_id(&state.db, id).await?.is_none() {
        return Err(product_not_found(lang));
    }

    let removed = delete_objects_by_prefix(
        &state.s3_client,
        &state.s3_bucket,
        &product_image_prefix(id),
    )
    .await?;

    product_queries::delete_product(&state.db, id).await?;
    tracing::info!("Deleted product {} and {} stored images", id, removed);

    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    lang: Lang,
    Json(payload): Json<StockUpdateRequest>,
) -> Result<Json<ProductResponse>> {
    if payload.stock < 0 {
        return Err(AppError::BadRequest(t(lang, "product.invalid_stock").to_string()));
    }

    let product = product_queries::update_stock(&state.db, id, payload.stock)
        .await?
        .ok_or_else(|| product_not_found(lang))?;

    Ok(Json(ProductResponse::new(product, Vec::new(), &state.assets_url)))
}

pub async fn save_images(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    lang: Lang,
    Json(payload): Json<SaveImagesRequest>,
) -> Result<Json<Vec<ProductImage>>> {
    if product_queries::find_by_id(&state.db, id).await?.is_none() {
        return Err(product_not_found(lang));
    }

    let images = product_queries::save_product_images(&state.db, id, &payload.image_urls).await?;

    Ok(Json(images))
}

pub async fn generate_product_urls(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    lang: Lang,
    Json(payload): Json<ProductImageUrlRequest>,
) -> Result<Json<ProductImageUrlResponse>> {
    if product_queries::find_by_id(&state.db, id).await?.is_none() {
        return Err(product_not_found(lang));
    }

    let mut responses = Vec::with_capacity(payload.images.len());

    for req in payload.images {
        let extension = validate_image(&req.content_type, req.size)
            .map_err(|rejection| rejection.into_app_error(lang))?;

        let image_uuid = Uuid::new_v4();
        let key = product_image_key(id, image_uuid, extension);

        let upload_url =
            put_object_url(&state.s3_client, &state.s3_bucket, &key, &req.content_type).await?;
        let public_url = storage_service::public_url(&state.assets_url, &key);

        responses.push(ImageUploadUrl {
            image_uuid,
            upload_url,
            public_url,
        });
    }

    Ok(Json(ProductImageUrlResponse { images: responses }))
}

//ORDER ROUTES
pub async fn get_orders(
    State(state): State<AppState>,
    Query(params): Query<OrderQuery>,
) -> Result<Json<OrderSearchResponse>> {
    let response = order_queries::get_orders(&state.db, &params).await?;

    Ok(Json(response))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    lang: Lang,
) -> Result<Json<OrderResponse>> {
    let order = order_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| order_not_found(lang))?;

    Ok(Json(order_queries::load_response(&state.db, order).await?))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    lang: Lang,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> Result<Json<Order>> {
    let order = order_queries::update_status(&state.db, id, payload.status)
        .await?
        .ok_or_else(|| order_not_found(lang))?;

    tracing::info!("Order {} moved to {:?}", order.order_number, order.status);

    Ok(Json(order))
}

pub async fn update_order_payment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    lang: Lang,
    Json(payload): Json<UpdateOrderPaymentStatusRequest>,
) -> Result<Json<Order>> {
    let order = order_queries::update_payment_status(&state.db, id, payload.payment_status)
        .await?
        .ok_or_else(|| order_not_found(lang))?;

    Ok(Json(order))
}

pub async fn update_tracking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    lang: Lang,
    Json(payload): Json<TrackingRequest>,
) -> Result<Json<Order>> {
    let tracking_number = payload.tracking_number.trim();
    let courier = payload.courier.trim();

    if tracking_number.is_empty() || courier.is_empty() {
        return Err(AppError::BadRequest(t(lang, "order.tracking_required").to_string()));
    }

    let order = order_queries::update_tracking(
        &state.db,
        id,
        tracking_number,
        courier,
        payload.estimated_delivery,
    )
    .await?
    .ok_or_else(|| order_not_found(lang))?;

    Ok(Json(order))
}

pub async fn update_admin_notes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    lang: Lang,
    Json(payload): Json<AdminNotesRequest>,
) -> Result<Json<Order>> {
    let notes = payload
        .admin_notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let order = order_queries::update_admin_notes(&state.db, id, notes)
        .await?
        .ok_or_else(|| order_not_found(lang))?;

    Ok(Json(order))
}

//PAYMENT ROUTES
pub async fn update_payment_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    lang: Lang,
    Json(payload): Json<UpdatePaymentRequest>,
) -> Result<Json<Payment>> {
    let payment = payment_queries::update_status(&state.db, id, &payload)
        .await?
        .ok_or_else(|| payment_not_found(lang))?;

    Ok(Json(payment))
}

pub async fn verify_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    lang: Lang,
    Json(payload): Json<VerifyPaymentRequest>,
) -> Result<Json<Payment>> {
    let payment = payment_queries::verify_payment(&state.db, id, payload.verified)
        .await?
        .ok_or_else(|| payment_not_found(lang))?;

    Ok(Json(payment))
}
