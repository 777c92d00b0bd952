// ERP Integration Module
// One client per backend (Odoo JSON-RPC, ERPNext REST) behind a shared
// connector service that validates credentials, dispatches by declared ERP
// type, and reconciles the responses into the canonical contract.

pub mod connector_service;
pub mod erpnext_client;
pub mod odoo_client;

pub use connector_service::{
    ConnectOutcome, ConnectRequest, ErpConnectorService, ErpServiceError, RecordsPage,
};
pub use erpnext_client::{ErpNextAuth, ErpNextClient, ErpNextError, ErpNextSession};
pub use odoo_client::{OdooClient, OdooCredentials, OdooError, OdooSession};

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Backend Selection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErpType {
    Odoo,
    #[serde(rename = "erpnext")]
    ErpNext,
}

impl ErpType {
    pub fn as_str(&self) -> &str {
        match self {
            ErpType::Odoo => "odoo",
            ErpType::ErpNext => "erpnext",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "odoo" => Some(ErpType::Odoo),
            "erpnext" => Some(ErpType::ErpNext),
            _ => None,
        }
    }
}

// ============================================================================
// Resources
// ============================================================================

/// The transactional record sets this service knows how to read.
///
/// Each resource knows its model/doctype and field list per backend; the
/// clients themselves stay generic over arbitrary model names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    SalesOrders,
    PurchaseLines,
}

impl ResourceType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sales" | "sales-orders" => Some(ResourceType::SalesOrders),
            "purchases" | "purchase-lines" => Some(ResourceType::PurchaseLines),
            _ => None,
        }
    }

    pub fn odoo_model(&self) -> &'static str {
        match self {
            ResourceType::SalesOrders => "sale.order",
            ResourceType::PurchaseLines => "purchase.order.line",
        }
    }

    pub fn odoo_fields(&self) -> &'static [&'static str] {
        match self {
            ResourceType::SalesOrders => &[
                "name",
                "partner_id",
                "date_order",
                "amount_total",
                "currency_id",
                "state",
                "order_line",
            ],
            ResourceType::PurchaseLines => &["product_id", "product_uom_qty", "date_order"],
        }
    }

    pub fn erpnext_doctype(&self) -> &'static str {
        match self {
            ResourceType::SalesOrders => "Sales Order",
            ResourceType::PurchaseLines => "Purchase Order Item",
        }
    }

    pub fn erpnext_fields(&self) -> &'static [&'static str] {
        match self {
            ResourceType::SalesOrders => &[
                "name",
                "customer",
                "transaction_date",
                "grand_total",
                "currency",
                "status",
            ],
            ResourceType::PurchaseLines => &["name", "parent", "item_name", "qty", "amount"],
        }
    }
}

// ============================================================================
// Raw Records
// ============================================================================

/// Which adapter produced a raw record.
///
/// Carried explicitly wherever the calling context knows it; the normalizer
/// only falls back to field-presence sniffing for `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    Odoo,
    ErpNext,
    Unknown,
}

/// One backend record exactly as the adapter received it, tagged with its
/// origin. Adapters never reinterpret business fields; that is the
/// normalizer's job.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub source: RecordSource,
    pub payload: Value,
}

impl RawRecord {
    pub fn new(source: RecordSource, payload: Value) -> Self {
        Self { source, payload }
    }
}
