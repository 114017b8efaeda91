use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Payment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

/// Happy-path order of statuses shown on the order timeline.
const PROGRESSION: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Processing,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
];

impl OrderStatus {
    /// Column stamped with the transition time when an order enters this status.
    pub fn timestamp_column(self) -> Option<&'static str> {
        match self {
            OrderStatus::Confirmed => Some("confirmed_at"),
            OrderStatus::Shipped => Some("shipped_at"),
            OrderStatus::Delivered => Some("delivered_at"),
            OrderStatus::Cancelled => Some("cancelled_at"),
            OrderStatus::Pending | OrderStatus::Processing | OrderStatus::Refunded => None,
        }
    }

    fn progression_rank(self) -> Option<usize> {
        PROGRESSION.iter().position(|s| *s == self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderPaymentStatus {
    Unpaid,
    Pending,
    Paid,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_status: OrderPaymentStatus,
    pub payment_method: Option<String>,
    pub shipping_address_id: Option<Uuid>,
    pub tracking_number: Option<String>,
    pub courier: Option<String>,
    pub estimated_delivery: Option<NaiveDate>,
    pub customer_notes: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub product_image_url: Option<String>,
    pub product_sku: Option<String>,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub price: Decimal,
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Product fields copied onto an order item at purchase time.
#[derive(Debug, Clone)]
pub struct OrderItemSnapshot {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_image_url: Option<String>,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub price: Decimal,
}

impl OrderItemSnapshot {
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Option<Payment>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TimelineEntry {
    pub status: OrderStatus,
    pub reached: bool,
    pub current: bool,
    pub at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn status_timestamp(&self, status: OrderStatus) -> Option<DateTime<Utc>> {
        match status {
            OrderStatus::Pending => Some(self.created_at),
            OrderStatus::Confirmed => self.confirmed_at,
            OrderStatus::Shipped => self.shipped_at,
            OrderStatus::Delivered => self.delivered_at,
            OrderStatus::Cancelled => self.cancelled_at,
            OrderStatus::Processing | OrderStatus::Refunded => None,
        }
    }

    /// Status steps for display. Cancelled and refunded orders end the timeline
    /// after the last step they actually reached.
    pub fn timeline(&self) -> Vec<TimelineEntry> {
        match self.status.progression_rank() {
            Some(rank) => PROGRESSION
                .iter()
                .enumerate()
                .map(|(i, status)| TimelineEntry {
                    status: *status,
                    reached: i <= rank,
                    current: i == rank,
                    at: if i <= rank {
                        self.status_timestamp(*status)
                    } else {
                        None
                    },
                })
                .collect(),
            None => {
                let mut entries: Vec<TimelineEntry> = PROGRESSION
                    .iter()
                    .filter_map(|status| {
                        self.status_timestamp(*status).map(|at| TimelineEntry {
                            status: *status,
                            reached: true,
                            current: false,
                            at: Some(at),
                        })
                    })
                    .collect();

                entries.push(TimelineEntry {
                    status: self.status,
                    reached: true,
                    current: true,
                    at: self
                        .status_timestamp(self.status)
                        .or(Some(self.updated_at)),
                });

                entries
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<OrderPaymentStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct OrderSearchResponse {
    pub orders: Vec<Order>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderPaymentStatusRequest {
    pub payment_status: OrderPaymentStatus,
}

#[derive(Debug, Deserialize)]
pub struct TrackingRequest {
    pub tracking_number: String,
    pub courier: String,
    pub estimated_delivery: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct AdminNotesRequest {
    pub admin_notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::dec;

    fn order(status: OrderStatus) -> Order {
        let created_at = Utc::now() - Duration::days(3);
        Order {
            id: Uuid::new_v4(),
            order_number: "BRN2025010100001".to_string(),
            user_id: Some(Uuid::new_v4()),
            customer_name: "Budi Santoso".to_string(),
            customer_email: "budi@contoh.com".to_string(),
            customer_phone: "081234567890".to_string(),
            subtotal: dec!(100000),
            shipping_cost: dec!(15000),
            tax: dec!(11000),
            discount: Decimal::ZERO,
            total: dec!(126000),
            status,
            payment_status: OrderPaymentStatus::Pending,
            payment_method: Some("bank_transfer".to_string()),
            shipping_address_id: None,
            tracking_number: None,
            courier: None,
            estimated_delivery: None,
            customer_notes: None,
            admin_notes: None,
            created_at,
            updated_at: created_at,
            confirmed_at: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
        }
    }

    #[test]
    fn pending_order_timeline_marks_only_first_step() {
        let timeline = order(OrderStatus::Pending).timeline();

        assert_eq!(timeline.len(), 5);
        assert!(timeline[0].reached && timeline[0].current);
        assert!(timeline[0].at.is_some());
        assert!(timeline[1..].iter().all(|e| !e.reached && e.at.is_none()));
    }

    #[test]
    fn shipped_order_timeline_carries_timestamps() {
        let mut o = order(OrderStatus::Shipped);
        o.confirmed_at = Some(o.created_at + Duration::hours(2));
        o.shipped_at = Some(o.created_at + Duration::days(1));

        let timeline = o.timeline();
        let shipped = &timeline[3];

        assert_eq!(shipped.status, OrderStatus::Shipped);
        assert!(shipped.current);
        assert_eq!(shipped.at, o.shipped_at);
        assert_eq!(timeline[1].at, o.confirmed_at);
        assert!(timeline[2].reached);
        assert!(!timeline[4].reached);
    }

    #[test]
    fn cancelled_order_timeline_ends_with_cancellation() {
        let mut o = order(OrderStatus::Cancelled);
        o.confirmed_at = Some(o.created_at + Duration::hours(1));
        o.cancelled_at = Some(o.created_at + Duration::hours(5));

        let timeline = o.timeline();
        let statuses: Vec<OrderStatus> = timeline.iter().map(|e| e.status).collect();

        assert_eq!(
            statuses,
            vec![
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Cancelled
            ]
        );
        let last = timeline.last().unwrap();
        assert!(last.current);
        assert_eq!(last.at, o.cancelled_at);
    }

    #[test]
    fn refunded_order_falls_back_to_updated_at() {
        let o = order(OrderStatus::Refunded);
        let last = o.timeline().pop().unwrap();

        assert_eq!(last.status, OrderStatus::Refunded);
        assert_eq!(last.at, Some(o.updated_at));
    }

    #[test]
    fn only_milestone_statuses_have_timestamp_columns() {
        assert_eq!(OrderStatus::Confirmed.timestamp_column(), Some("confirmed_at"));
        assert_eq!(OrderStatus::Cancelled.timestamp_column(), Some("cancelled_at"));
        assert_eq!(OrderStatus::Processing.timestamp_column(), None);
        assert_eq!(OrderStatus::Refunded.timestamp_column(), None);
    }

    #[test]
    fn snapshot_subtotal_multiplies_price_by_quantity() {
        let snapshot = OrderItemSnapshot {
            product_id: Uuid::new_v4(),
            product_name: "Hoodie".to_string(),
            product_image_url: None,
            quantity: 3,
            size: Some("L".to_string()),
            color: None,
            price: dec!(250000),
        };

        assert_eq!(snapshot.subtotal(), dec!(750000));
    }
}
