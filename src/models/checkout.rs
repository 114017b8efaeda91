use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{CartLine, PaymentMethod, ShippingAddress};

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address_id: Uuid,
    pub payment_method: PaymentMethod,
    pub customer_notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CheckoutPreview {
    pub items: Vec<CartLine>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub customer_notes: Option<String>,
    pub totals: OrderTotals,
}
