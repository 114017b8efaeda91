//! Database-backed flows. Run with a Postgres `DATABASE_URL` and
//! `cargo test -- --ignored`.

mod common;

use axum::http::StatusCode;
use bearions_back::{
    checkout::CheckoutWizard,
    models::{
        AddressRequest, AddressUpdate, OrderPaymentStatus, OrderStatus, PaymentMethod,
        PaymentStatus, UserRole,
    },
    queries::{
        address_queries, cart_queries,
        order_queries::{self, Placement},
        payment_queries, product_queries, user_queries,
    },
    services::pricing::{FLAT_SHIPPING_COST, TAX_RATE},
};
use common::json_request;
use rust_decimal::{Decimal, dec};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

fn address_request(label: &str, is_default: bool) -> AddressRequest {
    AddressRequest {
        recipient_name: "Budi Santoso".to_string(),
        phone: "081234567890".to_string(),
        address_line1: format!("Jl. Sudirman No. {}", label.len()),
        address_line2: None,
        city: "Jakarta".to_string(),
        province: "DKI Jakarta".to_string(),
        postal_code: "10220".to_string(),
        country: None,
        is_default,
        label: Some(label.to_string()),
    }
}

async fn seed_user(pool: &PgPool, email: &str) -> Uuid {
    user_queries::create_user(pool, &common::register_request(email), "hash")
        .await
        .unwrap()
        .id
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires Postgres DATABASE_URL"]
async fn repeated_adds_merge_into_one_line(pool: PgPool) {
    let user_id = seed_user(&pool, "merge@bearions.id").await;
    let product = product_queries::create_product(
        &pool,
        &common::product_request("Oversized Tee", dec!(150000), 10),
    )
    .await
    .unwrap();

    let cart = cart_queries::get_or_create_cart(&pool, user_id).await.unwrap();
    let again = cart_queries::get_or_create_cart(&pool, user_id).await.unwrap();
    assert_eq!(cart.id, again.id);

    cart_queries::add_item(&pool, cart.id, product.id, 1, Some("M"), None)
        .await
        .unwrap();
    cart_queries::add_item(&pool, cart.id, product.id, 2, Some("M"), None)
        .await
        .unwrap();
    cart_queries::add_item(&pool, cart.id, product.id, 1, Some("L"), None)
        .await
        .unwrap();

    let lines = cart_queries::get_cart_lines(&pool, cart.id).await.unwrap();
    assert_eq!(lines.len(), 2);

    let medium = lines.iter().find(|l| l.size.as_deref() == Some("M")).unwrap();
    assert_eq!(medium.quantity, 3);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires Postgres DATABASE_URL"]
async fn only_one_default_address_remains(pool: PgPool) {
    let user_id = seed_user(&pool, "default@bearions.id").await;

    let home = address_queries::create(&pool, user_id, &address_request("Home", true))
        .await
        .unwrap();
    let office = address_queries::create(&pool, user_id, &address_request("Office", true))
        .await
        .unwrap();

    assert!(office.is_default);

    address_queries::set_default(&pool, user_id, home.id)
        .await
        .unwrap()
        .unwrap();

    let addresses = address_queries::list_for_user(&pool, user_id).await.unwrap();
    let defaults: Vec<_> = addresses.iter().filter(|a| a.is_default).collect();

    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].id, home.id);
    assert_eq!(addresses[0].id, home.id);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires Postgres DATABASE_URL"]
async fn placing_an_order_snapshots_items_and_empties_the_cart(pool: PgPool) {
    let user_id = seed_user(&pool, "order@bearions.id").await;
    let tee = product_queries::create_product(
        &pool,
        &common::product_request("Oversized Tee", dec!(150000), 5),
    )
    .await
    .unwrap();
    let cap = product_queries::create_product(
        &pool,
        &common::product_request("Bear Cap", dec!(85000), 3),
    )
    .await
    .unwrap();

    let cart = cart_queries::get_or_create_cart(&pool, user_id).await.unwrap();
    cart_queries::add_item(&pool, cart.id, tee.id, 2, Some("M"), Some("Black"))
        .await
        .unwrap();
    cart_queries::add_item(&pool, cart.id, cap.id, 1, None, None)
        .await
        .unwrap();

    let address = address_queries::create(&pool, user_id, &address_request("Home", true))
        .await
        .unwrap();

    let lines = cart_queries::get_cart_lines(&pool, cart.id).await.unwrap();
    let placement = CheckoutWizard::new(user_id, lines)
        .unwrap()
        .select_address(address)
        .unwrap()
        .choose_payment(PaymentMethod::BankTransfer, None)
        .into_placement();

    let order_number = order_queries::next_order_number(&pool).await;
    assert!(order_number.starts_with("BRN"));
    assert_eq!(order_number.len(), 16);

    let placed = match order_queries::place_order(&pool, &placement, "order@bearions.id", &order_number)
        .await
        .unwrap()
    {
        Placement::Placed(order) => order,
        other => panic!("order was not placed: {:?}", other),
    };

    let order = &placed.order;
    assert_eq!(order.subtotal, dec!(385000));
    assert_eq!(order.shipping_cost, FLAT_SHIPPING_COST);
    assert_eq!(order.tax, (order.subtotal * TAX_RATE).round_dp(2));
    assert_eq!(
        order.subtotal + order.shipping_cost + order.tax - order.discount,
        order.total
    );

    let payment = placed.payment.as_ref().unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.amount, order.total);
    assert_eq!(payment.payment_gateway.as_deref(), Some("manual"));

    let fetched = order_queries::find_by_number_for_user(&pool, user_id, &order_number)
        .await
        .unwrap()
        .unwrap();
    let items = order_queries::get_order_items(&pool, fetched.id).await.unwrap();
    let items_total: Decimal = items.iter().map(|i| i.subtotal).sum();
    assert_eq!(items_total, fetched.subtotal);

    let remaining = cart_queries::get_cart_lines(&pool, cart.id).await.unwrap();
    assert!(remaining.is_empty());

    let tee_after = product_queries::find_by_id(&pool, tee.id).await.unwrap().unwrap();
    assert_eq!(tee_after.stock, 3);

    product_queries::delete_product(&pool, tee.id).await.unwrap();
    let items_after_delete = order_queries::get_order_items(&pool, fetched.id).await.unwrap();
    assert_eq!(items_after_delete.len(), 2);
    assert!(
        items_after_delete
            .iter()
            .any(|i| i.product_name == "Oversized Tee" && i.product_id.is_none())
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires Postgres DATABASE_URL"]
async fn stock_sold_out_during_checkout_rolls_everything_back(pool: PgPool) {
    let user_id = seed_user(&pool, "race@bearions.id").await;
    let tee = product_queries::create_product(
        &pool,
        &common::product_request("Oversized Tee", dec!(150000), 2),
    )
    .await
    .unwrap();

    let cart = cart_queries::get_or_create_cart(&pool, user_id).await.unwrap();
    cart_queries::add_item(&pool, cart.id, tee.id, 2, None, None)
        .await
        .unwrap();
    let address = address_queries::create(&pool, user_id, &address_request("Home", true))
        .await
        .unwrap();

    let lines = cart_queries::get_cart_lines(&pool, cart.id).await.unwrap();
    let placement = CheckoutWizard::new(user_id, lines)
        .unwrap()
        .select_address(address)
        .unwrap()
        .choose_payment(PaymentMethod::CashOnDelivery, None)
        .into_placement();

    product_queries::update_stock(&pool, tee.id, 1).await.unwrap();

    let outcome = order_queries::place_order(&pool, &placement, "race@bearions.id", "BRN1700000000000")
        .await
        .unwrap();
    assert!(matches!(outcome, Placement::OutOfStock { .. }));

    assert!(order_queries::get_user_orders(&pool, user_id).await.unwrap().is_empty());
    assert_eq!(cart_queries::get_cart_lines(&pool, cart.id).await.unwrap().len(), 1);
    assert_eq!(
        product_queries::find_by_id(&pool, tee.id).await.unwrap().unwrap().stock,
        1
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires Postgres DATABASE_URL"]
async fn admin_status_changes_stamp_and_verify_payment(pool: PgPool) {
    let user_id = seed_user(&pool, "admin-flow@bearions.id").await;
    let tee = product_queries::create_product(
        &pool,
        &common::product_request("Oversized Tee", dec!(100000), 5),
    )
    .await
    .unwrap();

    let cart = cart_queries::get_or_create_cart(&pool, user_id).await.unwrap();
    cart_queries::add_item(&pool, cart.id, tee.id, 1, None, None)
        .await
        .unwrap();
    let address = address_queries::create(&pool, user_id, &address_request("Home", true))
        .await
        .unwrap();

    let lines = cart_queries::get_cart_lines(&pool, cart.id).await.unwrap();
    let placement = CheckoutWizard::new(user_id, lines)
        .unwrap()
        .select_address(address)
        .unwrap()
        .choose_payment(PaymentMethod::BankTransfer, None)
        .into_placement();

    let Placement::Placed(placed) =
        order_queries::place_order(&pool, &placement, "admin-flow@bearions.id", "BRN1700000000001")
            .await
            .unwrap()
    else {
        panic!("order was not placed");
    };

    let shipped = order_queries::update_status(&pool, placed.order.id, OrderStatus::Shipped)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(shipped.status, OrderStatus::Shipped);
    assert!(shipped.shipped_at.is_some());
    assert!(shipped.delivered_at.is_none());

    let payment_id = placed.payment.as_ref().unwrap().id;
    payment_queries::record_manual_transfer(&pool, payment_id, "BCA", "1234567890")
        .await
        .unwrap()
        .unwrap();

    let verified = payment_queries::verify_payment(&pool, payment_id, true)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(verified.status, PaymentStatus::Success);
    assert!(verified.paid_at.is_some());

    let order = order_queries::find_by_id(&pool, placed.order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.payment_status, OrderPaymentStatus::Paid);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires Postgres DATABASE_URL"]
async fn order_numbers_keep_growing_past_five_digits(pool: PgPool) {
    sqlx::query("SELECT setval('order_number_seq', 99999)")
        .execute(&pool)
        .await
        .unwrap();

    let first = order_queries::next_order_number(&pool).await;
    let second = order_queries::next_order_number(&pool).await;

    assert_ne!(first, second);
    assert!(first.ends_with("100000"));
    assert_eq!(second.len(), 17);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires Postgres DATABASE_URL"]
async fn promoting_an_address_by_update_clears_the_old_default(pool: PgPool) {
    let user_id = seed_user(&pool, "flip@bearions.id").await;

    let home = address_queries::create(&pool, user_id, &address_request("Home", true))
        .await
        .unwrap();
    let office = address_queries::create(&pool, user_id, &address_request("Office", false))
        .await
        .unwrap();
    assert!(!office.is_default);

    let update = AddressUpdate {
        is_default: Some(true),
        ..Default::default()
    };
    let promoted = address_queries::update(&pool, user_id, office.id, &update)
        .await
        .unwrap()
        .unwrap();
    assert!(promoted.is_default);

    let default = address_queries::find_default(&pool, user_id).await.unwrap().unwrap();
    assert_eq!(default.id, office.id);

    let home_after = address_queries::find_owned(&pool, user_id, home.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!home_after.is_default);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires Postgres DATABASE_URL"]
async fn concurrent_checkouts_of_one_cart_place_a_single_order(pool: PgPool) {
    let user_id = seed_user(&pool, "twice@bearions.id").await;
    let tee = product_queries::create_product(
        &pool,
        &common::product_request("Oversized Tee", dec!(150000), 5),
    )
    .await
    .unwrap();

    let cart = cart_queries::get_or_create_cart(&pool, user_id).await.unwrap();
    cart_queries::add_item(&pool, cart.id, tee.id, 2, None, None)
        .await
        .unwrap();
    let address = address_queries::create(&pool, user_id, &address_request("Home", true))
        .await
        .unwrap();

    let lines = cart_queries::get_cart_lines(&pool, cart.id).await.unwrap();
    let placement = CheckoutWizard::new(user_id, lines)
        .unwrap()
        .select_address(address)
        .unwrap()
        .choose_payment(PaymentMethod::BankTransfer, None)
        .into_placement();

    let (first, second) = tokio::join!(
        order_queries::place_order(&pool, &placement, "twice@bearions.id", "BRN1700000000010"),
        order_queries::place_order(&pool, &placement, "twice@bearions.id", "BRN1700000000011"),
    );
    let outcomes = [first.unwrap(), second.unwrap()];

    let placed = outcomes
        .iter()
        .filter(|o| matches!(o, Placement::Placed(_)))
        .count();
    assert_eq!(placed, 1);
    assert!(outcomes.iter().any(|o| matches!(o, Placement::CartEmpty)));

    assert_eq!(order_queries::get_user_orders(&pool, user_id).await.unwrap().len(), 1);
    assert_eq!(
        product_queries::find_by_id(&pool, tee.id).await.unwrap().unwrap().stock,
        3
    );

    let replay = order_queries::place_order(&pool, &placement, "twice@bearions.id", "BRN1700000000012")
        .await
        .unwrap();
    assert!(matches!(replay, Placement::CartEmpty));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires Postgres DATABASE_URL"]
async fn cart_edited_after_review_is_not_placed(pool: PgPool) {
    let user_id = seed_user(&pool, "edited@bearions.id").await;
    let tee = product_queries::create_product(
        &pool,
        &common::product_request("Oversized Tee", dec!(150000), 5),
    )
    .await
    .unwrap();

    let cart = cart_queries::get_or_create_cart(&pool, user_id).await.unwrap();
    cart_queries::add_item(&pool, cart.id, tee.id, 1, None, None)
        .await
        .unwrap();
    let address = address_queries::create(&pool, user_id, &address_request("Home", true))
        .await
        .unwrap();

    let lines = cart_queries::get_cart_lines(&pool, cart.id).await.unwrap();
    let placement = CheckoutWizard::new(user_id, lines)
        .unwrap()
        .select_address(address)
        .unwrap()
        .choose_payment(PaymentMethod::BankTransfer, None)
        .into_placement();

    cart_queries::add_item(&pool, cart.id, tee.id, 2, None, None)
        .await
        .unwrap();

    let outcome = order_queries::place_order(&pool, &placement, "edited@bearions.id", "BRN1700000000020")
        .await
        .unwrap();
    assert!(matches!(outcome, Placement::CartChanged));
    assert!(order_queries::get_user_orders(&pool, user_id).await.unwrap().is_empty());
    assert_eq!(
        product_queries::find_by_id(&pool, tee.id).await.unwrap().unwrap().stock,
        5
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires Postgres DATABASE_URL"]
async fn checkout_route_places_once_then_reports_empty_and_sold_out(pool: PgPool) {
    let buyer = seed_user(&pool, "buyer@bearions.id").await;
    let rival = seed_user(&pool, "rival@bearions.id").await;
    let tee = product_queries::create_product(
        &pool,
        &common::product_request("Last Tee", dec!(150000), 1),
    )
    .await
    .unwrap();

    for user_id in [buyer, rival] {
        let cart = cart_queries::get_or_create_cart(&pool, user_id).await.unwrap();
        cart_queries::add_item(&pool, cart.id, tee.id, 1, None, None)
            .await
            .unwrap();
    }
    let buyer_address = address_queries::create(&pool, buyer, &address_request("Home", true))
        .await
        .unwrap();
    let rival_address = address_queries::create(&pool, rival, &address_request("Home", true))
        .await
        .unwrap();

    let buyer_token = common::token_for_user(buyer, "buyer@bearions.id", UserRole::Customer);
    let rival_token = common::token_for_user(rival, "rival@bearions.id", UserRole::Customer);
    let checkout = |address_id: Uuid| {
        json!({
            "shipping_address_id": address_id,
            "payment_method": "bank_transfer",
            "customer_notes": "Tolong dibungkus rapi"
        })
    };

    let (status, body) = common::send(
        common::router_with_pool(pool.clone()),
        json_request("POST", "/checkout", Some(&buyer_token), checkout(buyer_address.id)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["order_number"].as_str().unwrap().starts_with("BRN"));
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["customer_notes"], "Tolong dibungkus rapi");

    let (status, body) = common::send(
        common::router_with_pool(pool.clone()),
        json_request("POST", "/checkout", Some(&buyer_token), checkout(buyer_address.id)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Your cart is empty");

    let (status, body) = common::send(
        common::router_with_pool(pool.clone()),
        json_request("POST", "/checkout", Some(&rival_token), checkout(rival_address.id)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Insufficient stock for Last Tee");
    assert!(order_queries::get_user_orders(&pool, rival).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires Postgres DATABASE_URL"]
async fn payment_proof_is_stored_only_after_confirmation(pool: PgPool) {
    let user_id = seed_user(&pool, "proof@bearions.id").await;
    let tee = product_queries::create_product(
        &pool,
        &common::product_request("Oversized Tee", dec!(100000), 5),
    )
    .await
    .unwrap();

    let cart = cart_queries::get_or_create_cart(&pool, user_id).await.unwrap();
    cart_queries::add_item(&pool, cart.id, tee.id, 1, None, None)
        .await
        .unwrap();
    let address = address_queries::create(&pool, user_id, &address_request("Home", true))
        .await
        .unwrap();

    let lines = cart_queries::get_cart_lines(&pool, cart.id).await.unwrap();
    let placement = CheckoutWizard::new(user_id, lines)
        .unwrap()
        .select_address(address)
        .unwrap()
        .choose_payment(PaymentMethod::BankTransfer, None)
        .into_placement();
    let Placement::Placed(placed) =
        order_queries::place_order(&pool, &placement, "proof@bearions.id", "BRN1700000000030")
            .await
            .unwrap()
    else {
        panic!("order was not placed");
    };
    let order_id = placed.order.id;

    let token = common::token_for_user(user_id, "proof@bearions.id", UserRole::Customer);

    let (status, body) = common::send(
        common::router_with_pool(pool.clone()),
        json_request(
            "POST",
            "/orders/BRN1700000000030/payment/proof-url",
            Some(&token),
            json!({ "content_type": "image/png", "size": 2048 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let public_url = body["public_url"].as_str().unwrap().to_string();

    let pending = payment_queries::find_latest_for_order(&pool, order_id)
        .await
        .unwrap()
        .unwrap();
    assert!(pending.payment_proof_url.is_none());

    let (status, body) = common::send(
        common::router_with_pool(pool.clone()),
        json_request(
            "PUT",
            "/orders/BRN1700000000030/payment/proof",
            Some(&token),
            json!({ "public_url": "https://evil.example/receipt.png" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Payment proof does not match this order");

    let (status, body) = common::send(
        common::router_with_pool(pool.clone()),
        json_request(
            "PUT",
            "/orders/BRN1700000000030/payment/proof",
            Some(&token),
            json!({ "public_url": public_url }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["payment_proof_url"], public_url.as_str());
}
