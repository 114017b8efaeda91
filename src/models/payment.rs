use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Success,
    Failed,
    Expired,
    Cancelled,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    EWallet,
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::EWallet => "e_wallet",
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
        }
    }
}

pub const MANUAL_GATEWAY: &str = "manual";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub payment_method: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_gateway: Option<String>,
    pub transaction_id: Option<String>,
    pub payment_proof_url: Option<String>,
    pub gateway_response: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub expired_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentRequest {
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub gateway_response: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ManualTransferRequest {
    pub bank_name: String,
    pub account_number: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    pub verified: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProofUploadRequest {
    pub content_type: String,
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub struct ProofUploadResponse {
    pub upload_url: String,
    pub public_url: String,
}

/// Sent once the receipt has been uploaded to the presigned URL.
#[derive(Debug, Deserialize)]
pub struct ProofConfirmRequest {
    pub public_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_method_wire_names_match_stored_values() {
        for method in [
            PaymentMethod::BankTransfer,
            PaymentMethod::EWallet,
            PaymentMethod::CashOnDelivery,
        ] {
            let wire = serde_json::to_value(method).unwrap();
            assert_eq!(wire, serde_json::Value::String(method.as_str().to_string()));
        }
    }
}
