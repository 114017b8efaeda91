use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShippingAddress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipient_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AddressRequest {
    pub recipient_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    pub label: Option<String>,
}

impl AddressRequest {
    /// Names the first required field left blank, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("recipient_name", &self.recipient_name),
            ("phone", &self.phone),
            ("address_line1", &self.address_line1),
            ("city", &self.city),
            ("province", &self.province),
            ("postal_code", &self.postal_code),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AddressUpdate {
    pub recipient_name: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub is_default: Option<bool>,
    pub label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AddressRequest {
        AddressRequest {
            recipient_name: "Siti".to_string(),
            phone: "081298765432".to_string(),
            address_line1: "Jl. Merdeka No. 10".to_string(),
            address_line2: None,
            city: "Bandung".to_string(),
            province: "Jawa Barat".to_string(),
            postal_code: "40111".to_string(),
            country: None,
            is_default: false,
            label: Some("Home".to_string()),
        }
    }

    #[test]
    fn complete_request_has_no_missing_field() {
        assert_eq!(request().missing_field(), None);
    }

    #[test]
    fn reports_first_blank_field() {
        let mut req = request();
        req.city = "   ".to_string();
        req.postal_code = String::new();

        assert_eq!(req.missing_field(), Some("city"));
    }

    #[test]
    fn is_default_defaults_to_false() {
        let req: AddressRequest = serde_json::from_value(serde_json::json!({
            "recipient_name": "Siti",
            "phone": "0812",
            "address_line1": "Jl. Merdeka",
            "city": "Bandung",
            "province": "Jawa Barat",
            "postal_code": "40111"
        }))
        .unwrap();

        assert!(!req.is_default);
    }
}
