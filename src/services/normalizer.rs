// Normalization Layer
// Converts one raw backend record (Odoo tuple/dict shape or ERPNext REST
// JSON) into the canonical order contract. Never fails: defective fields
// are absorbed into sentinel values instead of raised.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::models::{CanonicalOrder, OrderStatus, MISSING_TEXT};
use crate::services::erp::{RawRecord, RecordSource};

/// Normalize one tagged record. The source tag decides the shape; sniffing
/// only runs for `Unknown` records where the calling context could not say
/// which adapter produced them.
pub fn normalize(record: &RawRecord) -> CanonicalOrder {
    normalize_value(record.source, &record.payload)
}

pub fn normalize_value(source: RecordSource, raw: &Value) -> CanonicalOrder {
    match source {
        RecordSource::Odoo => normalize_odoo(raw),
        RecordSource::ErpNext => normalize_erpnext(raw),
        RecordSource::Unknown => {
            // Already-canonical input passes through untouched, which makes
            // normalization idempotent.
            if let Ok(order) = serde_json::from_value::<CanonicalOrder>(raw.clone()) {
                return order;
            }
            match sniff(raw) {
                RecordSource::Odoo => normalize_odoo(raw),
                _ => normalize_erpnext(raw),
            }
        }
    }
}

/// Field-presence probing for untagged records. Inherently fragile; kept
/// only as the boundary fallback. An order-name/item-name pair marks the
/// ERPNext flattened shape, an amount/currency pair (or a partner tuple)
/// marks Odoo.
fn sniff(raw: &Value) -> RecordSource {
    if raw.get("name").is_some() && raw.get("item_name").is_some() {
        return RecordSource::ErpNext;
    }
    if raw.get("customer").is_some() || raw.get("grand_total").is_some() {
        return RecordSource::ErpNext;
    }
    if (raw.get("amount_total").is_some() && raw.get("currency_id").is_some())
        || raw.get("partner_id").is_some()
    {
        return RecordSource::Odoo;
    }
    RecordSource::ErpNext
}

// ============================================================================
// Odoo Shape
// ============================================================================

/// Odoo `search_read` rows: many-to-one fields arrive as `[id, label]`
/// pairs and absent values arrive as `false`, not null.
fn normalize_odoo(raw: &Value) -> CanonicalOrder {
    let id = raw
        .get("id")
        .and_then(|v| v.as_i64())
        .map(|n| n.to_string())
        .unwrap_or_else(|| MISSING_TEXT.to_string());

    let name = coerce_text(raw.get("name"))
        .or_else(|| pair_label(raw.get("product_id")))
        .unwrap_or_else(|| MISSING_TEXT.to_string());

    let line_item_count = raw
        .get("order_line")
        .and_then(|v| v.as_array())
        .map(|lines| lines.len() as u32)
        .unwrap_or(0);

    CanonicalOrder {
        id,
        name,
        counterparty_name: pair_label(raw.get("partner_id"))
            .unwrap_or_else(|| MISSING_TEXT.to_string()),
        date: coerce_date(raw.get("date_order")),
        total_amount: coerce_number(raw.get("amount_total")),
        currency: pair_label(raw.get("currency_id")).unwrap_or_else(|| MISSING_TEXT.to_string()),
        status: odoo_status(raw.get("state")),
        line_item_count,
    }
}

fn odoo_status(state: Option<&Value>) -> OrderStatus {
    match state.and_then(|v| v.as_str()) {
        Some("sale") => OrderStatus::Confirmed,
        Some("draft") => OrderStatus::Draft,
        Some("cancel") => OrderStatus::Cancelled,
        _ => OrderStatus::Unknown,
    }
}

// ============================================================================
// ERPNext Shapes
// ============================================================================

/// ERPNext records come in two shapes: full documents (Sales Order) and
/// flattened child-table rows (order name + item name), which carry no
/// status or currency of their own.
fn normalize_erpnext(raw: &Value) -> CanonicalOrder {
    let flattened_item = raw.get("item_name").is_some();

    let id = coerce_text(raw.get("name")).unwrap_or_else(|| MISSING_TEXT.to_string());

    let name = if flattened_item {
        coerce_text(raw.get("parent"))
            .or_else(|| coerce_text(raw.get("name")))
            .unwrap_or_else(|| MISSING_TEXT.to_string())
    } else {
        id.clone()
    };

    let total_amount = if flattened_item {
        coerce_number(raw.get("amount"))
    } else {
        coerce_number(raw.get("grand_total"))
    };

    let status = if flattened_item {
        OrderStatus::Unknown
    } else {
        erpnext_status(raw.get("status"))
    };

    CanonicalOrder {
        id,
        name,
        counterparty_name: coerce_text(raw.get("customer"))
            .unwrap_or_else(|| MISSING_TEXT.to_string()),
        date: coerce_date(raw.get("transaction_date")),
        total_amount,
        currency: coerce_text(raw.get("currency")).unwrap_or_else(|| MISSING_TEXT.to_string()),
        status,
        line_item_count: if flattened_item { 1 } else { 0 },
    }
}

fn erpnext_status(status: Option<&Value>) -> OrderStatus {
    match status.and_then(|v| v.as_str()) {
        Some("Draft") => OrderStatus::Draft,
        Some("Cancelled") => OrderStatus::Cancelled,
        Some("Submitted") | Some("To Deliver and Bill") | Some("To Bill") | Some("To Deliver")
        | Some("Completed") => OrderStatus::Confirmed,
        _ => OrderStatus::Unknown,
    }
}

// ============================================================================
// Defensive Coercion
// ============================================================================

fn coerce_number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn coerce_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Odoo many-to-one `[id, label]` pair.
fn pair_label(value: Option<&Value>) -> Option<String> {
    value
        .and_then(|v| v.as_array())
        .and_then(|pair| pair.get(1))
        .and_then(|label| label.as_str())
        .filter(|label| !label.is_empty())
        .map(|label| label.to_string())
}

/// Accepts ISO dates, Odoo datetimes, and RFC 3339 timestamps; anything
/// else is an unknown date, never an error.
fn coerce_date(value: Option<&Value>) -> Option<String> {
    let text = coerce_text(value)?;

    if let Ok(date) = NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S") {
        return Some(datetime.date().format("%Y-%m-%d").to_string());
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(&text) {
        return Some(datetime.date_naive().format("%Y-%m-%d").to_string());
    }
    None
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_odoo_sale_order() {
        let raw = json!({
            "id": 17,
            "name": "S00017",
            "partner_id": [5, "Deco Addict"],
            "date_order": "2024-02-12 09:30:00",
            "amount_total": 3240.5,
            "currency_id": [2, "INR"],
            "state": "sale",
            "order_line": [31, 32, 33],
        });

        let order = normalize_value(RecordSource::Odoo, &raw);
        assert_eq!(order.id, "17");
        assert_eq!(order.name, "S00017");
        assert_eq!(order.counterparty_name, "Deco Addict");
        assert_eq!(order.date.as_deref(), Some("2024-02-12"));
        assert_eq!(order.total_amount, 3240.5);
        assert_eq!(order.currency, "INR");
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.line_item_count, 3);
    }

    #[test]
    fn odoo_false_fields_become_sentinels() {
        // Odoo reports absent many-to-one and date fields as `false`.
        let raw = json!({
            "id": 9,
            "name": "S00009",
            "partner_id": false,
            "date_order": false,
            "amount_total": false,
            "currency_id": false,
            "state": "weird_custom_state",
        });

        let order = normalize_value(RecordSource::Odoo, &raw);
        assert_eq!(order.counterparty_name, MISSING_TEXT);
        assert_eq!(order.date, None);
        assert_eq!(order.total_amount, 0.0);
        assert_eq!(order.currency, MISSING_TEXT);
        assert_eq!(order.status, OrderStatus::Unknown);
        assert_eq!(order.line_item_count, 0);
    }

    #[test]
    fn odoo_status_mapping_table() {
        assert_eq!(odoo_status(Some(&json!("sale"))), OrderStatus::Confirmed);
        assert_eq!(odoo_status(Some(&json!("draft"))), OrderStatus::Draft);
        assert_eq!(odoo_status(Some(&json!("cancel"))), OrderStatus::Cancelled);
        assert_eq!(odoo_status(Some(&json!("anything"))), OrderStatus::Unknown);
        assert_eq!(odoo_status(None), OrderStatus::Unknown);
    }

    #[test]
    fn normalizes_erpnext_sales_order_document() {
        let raw = json!({
            "name": "SAL-ORD-2024-00004",
            "customer": "Maharashtra Infra",
            "transaction_date": "2024-03-05",
            "grand_total": "18700.00",
            "currency": "INR",
            "status": "To Deliver and Bill",
        });

        let order = normalize_value(RecordSource::ErpNext, &raw);
        assert_eq!(order.id, "SAL-ORD-2024-00004");
        assert_eq!(order.name, "SAL-ORD-2024-00004");
        assert_eq!(order.counterparty_name, "Maharashtra Infra");
        assert_eq!(order.date.as_deref(), Some("2024-03-05"));
        assert_eq!(order.total_amount, 18700.0);
        assert_eq!(order.status, OrderStatus::Confirmed);
    }

    #[test]
    fn normalizes_erpnext_flattened_item_row() {
        let raw = json!({
            "name": "a1b2c3",
            "parent": "PUR-ORD-2024-00002",
            "item_name": "Diesel Fuel",
            "qty": 300.0,
            "amount": 27000.0,
        });

        let order = normalize_value(RecordSource::ErpNext, &raw);
        assert_eq!(order.id, "a1b2c3");
        assert_eq!(order.name, "PUR-ORD-2024-00002");
        assert_eq!(order.counterparty_name, MISSING_TEXT);
        assert_eq!(order.total_amount, 27000.0);
        assert_eq!(order.status, OrderStatus::Unknown);
        assert_eq!(order.line_item_count, 1);
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw = json!({
            "id": 17,
            "name": "S00017",
            "partner_id": [5, "Deco Addict"],
            "date_order": "2024-02-12 09:30:00",
            "amount_total": 3240.5,
            "currency_id": [2, "INR"],
            "state": "sale",
            "order_line": [31],
        });

        let once = normalize_value(RecordSource::Odoo, &raw);
        let reserialized = serde_json::to_value(&once).unwrap();
        let twice = normalize_value(RecordSource::Unknown, &reserialized);
        assert_eq!(once, twice);
    }

    #[test]
    fn sniffing_resolves_untagged_shapes() {
        let odoo_shape = json!({
            "id": 3,
            "name": "S00003",
            "amount_total": 10.0,
            "currency_id": [2, "EUR"],
            "state": "draft",
        });
        let order = normalize_value(RecordSource::Unknown, &odoo_shape);
        assert_eq!(order.currency, "EUR");
        assert_eq!(order.status, OrderStatus::Draft);

        let erpnext_shape = json!({
            "name": "row9",
            "item_name": "Coal Grade A",
            "qty": 4.0,
        });
        let order = normalize_value(RecordSource::Unknown, &erpnext_shape);
        assert_eq!(order.line_item_count, 1);
        assert_eq!(order.status, OrderStatus::Unknown);
    }

    #[test]
    fn garbage_amounts_and_dates_never_panic() {
        let raw = json!({
            "name": "SAL-ORD-2024-00009",
            "grand_total": "eighteen thousand",
            "transaction_date": "next tuesday",
            "status": 42,
        });

        let order = normalize_value(RecordSource::ErpNext, &raw);
        assert_eq!(order.total_amount, 0.0);
        assert_eq!(order.date, None);
        assert_eq!(order.status, OrderStatus::Unknown);
    }
}
