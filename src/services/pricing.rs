use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, dec};
use uuid::Uuid;

use crate::models::{CartLine, OrderTotals};

pub const FLAT_SHIPPING_COST: Decimal = dec!(15000);
pub const TAX_RATE: Decimal = dec!(0.11);
pub const ORDER_NUMBER_PREFIX: &str = "BRN";

pub fn compute_totals(lines: &[CartLine], discount: Decimal) -> OrderTotals {
    let subtotal: Decimal = lines.iter().map(CartLine::line_total).sum();
    let shipping_cost = FLAT_SHIPPING_COST;
    let tax = (subtotal * TAX_RATE).round_dp(2);
    let total = subtotal + shipping_cost + tax - discount;

    OrderTotals {
        subtotal,
        shipping_cost,
        tax,
        discount,
        total,
    }
}

/// Used when the database order-number function is unavailable.
pub fn fallback_order_number(now: DateTime<Utc>) -> String {
    format!("{}{}", ORDER_NUMBER_PREFIX, now.timestamp_millis())
}

/// First line whose product cannot cover the demand summed over all its variants.
pub fn find_stock_shortage(lines: &[CartLine]) -> Option<&CartLine> {
    let mut demand: HashMap<Uuid, i32> = HashMap::new();
    for line in lines {
        *demand.entry(line.product_id).or_insert(0) += line.quantity;
    }

    lines
        .iter()
        .find(|line| line.product_stock < demand[&line.product_id])
}
