use axum::{Extension, Json, extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{
    AppState,
    checkout::{CheckoutError, CheckoutWizard, ReviewStep},
    error::{AppError, Result},
    i18n::{Lang, t},
    models::{CheckoutPreview, CheckoutRequest, OrderResponse},
    queries::{
        address_queries, cart_queries,
        order_queries::{self, Placement},
    },
    utils::{extractors::extract_user_id, jwt::Claims},
};

/// Walks the wizard up to review using the caller's live cart.
async fn walk_to_review(
    state: &AppState,
    user_id: Uuid,
    payload: CheckoutRequest,
    lang: Lang,
) -> Result<CheckoutWizard<ReviewStep>> {
    let cart = cart_queries::get_or_create_cart(&state.db, user_id).await?;
    let lines = cart_queries::get_cart_lines(&state.db, cart.id).await?;

    let wizard = CheckoutWizard::new(user_id, lines).map_err(|e| e.into_app_error(lang))?;

    let address = address_queries::find_owned(&state.db, user_id, payload.shipping_address_id)
        .await?
        .ok_or_else(|| CheckoutError::AddressNotOwned.into_app_error(lang))?;

    let review = wizard
        .select_address(address)
        .map_err(|e| e.into_app_error(lang))?
        .choose_payment(payload.payment_method, payload.customer_notes);

    Ok(review)
}

pub async fn preview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    lang: Lang,
    Json(payload): Json<CheckoutRequest>,
) -> Result<Json<CheckoutPreview>> {
    let user_id = extract_user_id(&claims)?;

    let review = walk_to_review(&state, user_id, payload, lang).await?;

    Ok(Json(review.preview()))
}

pub async fn place_order(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    lang: Lang,
    Json(payload): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let user_id = extract_user_id(&claims)?;

    let placement = walk_to_review(&state, user_id, payload, lang).await?.into_placement();
    let order_number = order_queries::next_order_number(&state.db).await;

    let outcome = order_queries::place_order(&state.db, &placement, &claims.email, &order_number)
        .await
        .map_err(|e| {
            tracing::error!("Placing order {} failed: {}", order_number, e);
            AppError::Unavailable(t(lang, "checkout.failed").to_string())
        })?;

    match outcome {
        Placement::Placed(order) => Ok((StatusCode::CREATED, Json(*order))),
        Placement::OutOfStock { product_name } => {
            tracing::info!(
                "Order {} rejected, {} sold out during checkout",
                order_number,
                product_name
            );
            Err(CheckoutError::InsufficientStock { product_name }.into_app_error(lang))
        }
        Placement::CartEmpty => Err(CheckoutError::EmptyCart.into_app_error(lang)),
        Placement::CartChanged => Err(CheckoutError::CartChanged.into_app_error(lang)),
    }
}
