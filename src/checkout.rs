//! Three-step checkout: shipping, payment, review.
//!
//! Each step is its own type, so an order can only be placed from a
//! [`CheckoutWizard<ReviewStep>`]. Moving between steps never touches the
//! database; the only write is `order_queries::place_order` on the
//! [`OrderPlacement`] produced by the review step.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    error::AppError,
    i18n::{Lang, t},
    models::{CartLine, CheckoutPreview, OrderTotals, PaymentMethod, ShippingAddress},
    services::pricing,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    EmptyCart,
    AddressNotOwned,
    InsufficientStock { product_name: String },
    CartChanged,
}

impl CheckoutError {
    pub fn into_app_error(self, lang: Lang) -> AppError {
        match self {
            CheckoutError::EmptyCart => AppError::BadRequest(t(lang, "cart.empty").to_string()),
            CheckoutError::AddressNotOwned => {
                AppError::NotFound(t(lang, "checkout.address_not_found").to_string())
            }
            CheckoutError::InsufficientStock { product_name } => AppError::Conflict(format!(
                "{} {}",
                t(lang, "checkout.insufficient_stock"),
                product_name
            )),
            CheckoutError::CartChanged => {
                AppError::Conflict(t(lang, "checkout.cart_changed").to_string())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShippingStep {
    previous: Option<ShippingAddress>,
}

#[derive(Debug, Clone)]
pub struct PaymentStep {
    address: ShippingAddress,
    previous: Option<(PaymentMethod, Option<String>)>,
}

#[derive(Debug, Clone)]
pub struct ReviewStep {
    address: ShippingAddress,
    payment_method: PaymentMethod,
    customer_notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CheckoutWizard<S> {
    user_id: Uuid,
    lines: Vec<CartLine>,
    step: S,
}

/// Everything `place_order` needs, only obtainable from the review step.
#[derive(Debug, Clone)]
pub struct OrderPlacement {
    pub user_id: Uuid,
    pub lines: Vec<CartLine>,
    pub address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub customer_notes: Option<String>,
    pub totals: OrderTotals,
}

impl<S> CheckoutWizard<S> {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }
}

impl CheckoutWizard<ShippingStep> {
    pub fn new(user_id: Uuid, lines: Vec<CartLine>) -> Result<Self, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        if let Some(line) = pricing::find_stock_shortage(&lines) {
            return Err(CheckoutError::InsufficientStock {
                product_name: line.product_name.clone(),
            });
        }

        Ok(Self {
            user_id,
            lines,
            step: ShippingStep { previous: None },
        })
    }

    /// Address picked before navigating back, if any.
    pub fn selected_address(&self) -> Option<&ShippingAddress> {
        self.step.previous.as_ref()
    }

    pub fn select_address(
        self,
        address: ShippingAddress,
    ) -> Result<CheckoutWizard<PaymentStep>, CheckoutError> {
        if address.user_id != self.user_id {
            return Err(CheckoutError::AddressNotOwned);
        }

        Ok(CheckoutWizard {
            user_id: self.user_id,
            lines: self.lines,
            step: PaymentStep {
                address,
                previous: None,
            },
        })
    }
}

impl CheckoutWizard<PaymentStep> {
    pub fn address(&self) -> &ShippingAddress {
        &self.step.address
    }

    pub fn selected_payment(&self) -> Option<PaymentMethod> {
        self.step.previous.as_ref().map(|(method, _)| *method)
    }

    pub fn choose_payment(
        self,
        payment_method: PaymentMethod,
        customer_notes: Option<String>,
    ) -> CheckoutWizard<ReviewStep> {
        let customer_notes = customer_notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        CheckoutWizard {
            user_id: self.user_id,
            lines: self.lines,
            step: ReviewStep {
                address: self.step.address,
                payment_method,
                customer_notes,
            },
        }
    }

    pub fn back(self) -> CheckoutWizard<ShippingStep> {
        CheckoutWizard {
            user_id: self.user_id,
            lines: self.lines,
            step: ShippingStep {
                previous: Some(self.step.address),
            },
        }
    }
}

impl CheckoutWizard<ReviewStep> {
    pub fn totals(&self) -> OrderTotals {
        pricing::compute_totals(&self.lines, Decimal::ZERO)
    }

    pub fn back(self) -> CheckoutWizard<PaymentStep> {
        CheckoutWizard {
            user_id: self.user_id,
            lines: self.lines,
            step: PaymentStep {
                address: self.step.address,
                previous: Some((self.step.payment_method, self.step.customer_notes)),
            },
        }
    }

    pub fn preview(self) -> CheckoutPreview {
        let totals = self.totals();
        CheckoutPreview {
            items: self.lines,
            shipping_address: self.step.address,
            payment_method: self.step.payment_method,
            customer_notes: self.step.customer_notes,
            totals,
        }
    }

    pub fn into_placement(self) -> OrderPlacement {
        let totals = self.totals();
        OrderPlacement {
            user_id: self.user_id,
            lines: self.lines,
            address: self.step.address,
            payment_method: self.step.payment_method,
            customer_notes: self.step.customer_notes,
            totals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::dec;

    fn line(price: Decimal, quantity: i32, stock: i32) -> CartLine {
        CartLine {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity,
            size: Some("M".to_string()),
            color: Some("Black".to_string()),
            created_at: Utc::now(),
            product_name: "Bearions Oversized Tee".to_string(),
            product_price: price,
            product_stock: stock,
            product_image_url: None,
            product_category: "Tops".to_string(),
        }
    }

    fn address(user_id: Uuid) -> ShippingAddress {
        ShippingAddress {
            id: Uuid::new_v4(),
            user_id,
            recipient_name: "Budi Santoso".to_string(),
            phone: "081234567890".to_string(),
            address_line1: "Jl. Sudirman No. 1".to_string(),
            address_line2: None,
            city: "Jakarta".to_string(),
            province: "DKI Jakarta".to_string(),
            postal_code: "10220".to_string(),
            country: "Indonesia".to_string(),
            is_default: true,
            label: Some("Home".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn empty_cart_cannot_start_checkout() {
        let result = CheckoutWizard::new(Uuid::new_v4(), Vec::new());
        assert_eq!(result.err(), Some(CheckoutError::EmptyCart));
    }

    #[test]
    fn insufficient_stock_blocks_checkout() {
        let result = CheckoutWizard::new(Uuid::new_v4(), vec![line(dec!(100), 5, 2)]);
        assert!(matches!(
            result.err(),
            Some(CheckoutError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn foreign_address_is_rejected() {
        let wizard = CheckoutWizard::new(Uuid::new_v4(), vec![line(dec!(100), 1, 5)]).unwrap();
        let result = wizard.select_address(address(Uuid::new_v4()));

        assert_eq!(result.err(), Some(CheckoutError::AddressNotOwned));
    }

    #[test]
    fn full_walk_produces_priced_placement() {
        let user_id = Uuid::new_v4();
        let placement = CheckoutWizard::new(user_id, vec![line(dec!(200000), 2, 10)])
            .unwrap()
            .select_address(address(user_id))
            .unwrap()
            .choose_payment(PaymentMethod::BankTransfer, Some("  leave at gate ".to_string()))
            .into_placement();

        assert_eq!(placement.totals.subtotal, dec!(400000));
        assert_eq!(placement.totals.tax, dec!(44000));
        assert_eq!(placement.totals.total, dec!(459000));
        assert_eq!(placement.customer_notes.as_deref(), Some("leave at gate"));
        assert_eq!(placement.payment_method, PaymentMethod::BankTransfer);
    }

    #[test]
    fn back_navigation_keeps_previous_choices() {
        let user_id = Uuid::new_v4();
        let addr = address(user_id);
        let addr_id = addr.id;

        let review = CheckoutWizard::new(user_id, vec![line(dec!(100), 1, 5)])
            .unwrap()
            .select_address(addr)
            .unwrap()
            .choose_payment(PaymentMethod::EWallet, None);

        let payment = review.back();
        assert_eq!(payment.selected_payment(), Some(PaymentMethod::EWallet));
        assert_eq!(payment.address().id, addr_id);

        let shipping = payment.back();
        assert_eq!(shipping.selected_address().map(|a| a.id), Some(addr_id));
        assert_eq!(shipping.lines().len(), 1);
    }

    #[test]
    fn blank_notes_are_dropped() {
        let user_id = Uuid::new_v4();
        let preview = CheckoutWizard::new(user_id, vec![line(dec!(100), 1, 5)])
            .unwrap()
            .select_address(address(user_id))
            .unwrap()
            .choose_payment(PaymentMethod::CashOnDelivery, Some("   ".to_string()))
            .preview();

        assert_eq!(preview.customer_notes, None);
        assert_eq!(preview.totals.shipping_cost, dec!(15000));
    }

    #[test]
    fn changed_cart_is_a_localized_conflict() {
        match CheckoutError::CartChanged.into_app_error(Lang::Id) {
            AppError::Conflict(msg) => assert!(msg.starts_with("Keranjang Anda berubah")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
