mod addresses;
mod admin;
mod auth;
mod cart;
mod checkout;
mod health;
mod orders;
mod products;

use axum::{
    Router, middleware,
    routing::{get, patch, post, put},
};

use crate::{
    AppState,
    middleware::{admin_middleware, auth_middleware},
};

pub fn create_router(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/products", get(products::search_products))
        .route("/products/{id}", get(products::get_product))
        .route("/products/{id}/images", get(products::get_product_images))
        .route("/auth/register", post(auth::register_user))
        .route("/auth/login", post(auth::login_user))
        .route("/auth/admin/login", post(auth::admin_login));

    let authenticated = Router::new()
        .route("/auth/session", get(auth::session))
        .route("/auth/logout", post(auth::logout))
        .route("/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/cart/summary", get(cart::get_summary))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/{id}",
            patch(cart::update_item).delete(cart::remove_item),
        )
        .route("/checkout/preview", post(checkout::preview))
        .route("/checkout", post(checkout::place_order))
        .route("/orders", get(orders::list_orders))
        .route("/orders/{order_number}", get(orders::get_order))
        .route("/orders/{order_number}/timeline", get(orders::get_timeline))
        .route(
            "/orders/{order_number}/payment/transfer",
            post(orders::submit_transfer),
        )
        .route(
            "/orders/{order_number}/payment/proof-url",
            post(orders::proof_upload_url),
        )
        .route(
            "/orders/{order_number}/payment/proof",
            put(orders::confirm_proof),
        )
        .route(
            "/addresses",
            get(addresses::list_addresses).post(addresses::add_address),
        )
        .route("/addresses/default", get(addresses::get_default_address))
        .route(
            "/addresses/{id}",
            patch(addresses::update_address).delete(addresses::delete_address),
        )
        .route("/addresses/{id}/default", post(addresses::set_default_address))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin = Router::new()
        .route("/admin/products", post(admin::create_product))
        .route(
            "/admin/products/{id}",
            patch(admin::update_product).delete(admin::delete_product),
        )
        .route("/admin/products/{id}/stock", put(admin::update_stock))
        .route("/admin/products/{id}/images", put(admin::save_images))
        .route(
            "/admin/products/{id}/upload-urls",
            post(admin::generate_product_urls),
        )
        .route("/admin/orders", get(admin::get_orders))
        .route("/admin/orders/{id}", get(admin::get_order))
        .route("/admin/orders/{id}/status", put(admin::update_order_status))
        .route(
            "/admin/orders/{id}/payment-status",
            put(admin::update_order_payment_status),
        )
        .route("/admin/orders/{id}/tracking", put(admin::update_tracking))
        .route("/admin/orders/{id}/notes", put(admin::update_admin_notes))
        .route("/admin/payments/{id}/status", put(admin::update_payment_status))
        .route("/admin/payments/{id}/verify", post(admin::verify_payment))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_middleware));

    public.merge(authenticated).merge(admin)
}
