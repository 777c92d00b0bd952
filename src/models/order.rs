// Canonical order shape shared by every ERP backend.
// Raw Odoo / ERPNext records are reconciled into this one contract before
// anything downstream (presentation, emissions aggregation) sees them.

use serde::{Deserialize, Serialize};

/// Display sentinel for text fields the backend did not provide.
pub const MISSING_TEXT: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Draft,
    Confirmed,
    Cancelled,
    Unknown,
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Unknown => "unknown",
        }
    }
}

/// One sales/purchase order regardless of source ERP.
///
/// All fields are defensively coerced: a defective raw record produces
/// sentinel values (`0`, `—`, null date), never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalOrder {
    pub id: String,
    pub name: String,
    pub counterparty_name: String,
    /// Normalized `YYYY-MM-DD`; `None` when the source date was absent or
    /// unparseable.
    pub date: Option<String>,
    pub total_amount: f64,
    pub currency: String,
    pub status: OrderStatus,
    pub line_item_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Confirmed).unwrap(),
            "\"confirmed\""
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
    }

    #[test]
    fn order_uses_camel_case_keys() {
        let order = CanonicalOrder {
            id: "42".to_string(),
            name: "SO042".to_string(),
            counterparty_name: "Acme".to_string(),
            date: Some("2024-03-01".to_string()),
            total_amount: 1200.5,
            currency: "INR".to_string(),
            status: OrderStatus::Draft,
            line_item_count: 3,
        };

        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["counterpartyName"], "Acme");
        assert_eq!(value["totalAmount"], 1200.5);
        assert_eq!(value["lineItemCount"], 3);
    }
}
