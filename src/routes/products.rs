use axum::{
    Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use crate::{
    AppState,
    error::{AppError, Result},
    i18n::{Lang, t},
    models::{ProductImage, ProductQuery, ProductResponse},
    queries::product_queries,
};

pub async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<ProductQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    let products = product_queries::search_products(&state.db, &params).await?;

    Ok(Json(
        products
            .into_iter()
            .map(|product| ProductResponse::new(product, Vec::new(), &state.assets_url))
            .collect(),
    ))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    lang: Lang,
) -> Result<Json<ProductResponse>> {
    let product = product_queries::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(t(lang, "product.not_found").to_string()))?;

    let images = product_queries::find_images_by_product_id(&state.db, id).await?;

    Ok(Json(ProductResponse::new(product, images, &state.assets_url)))
}

pub async fn get_product_images(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ProductImage>>> {
    let images = product_queries::find_images_by_product_id(&state.db, id).await?;

    Ok(Json(images))
}
