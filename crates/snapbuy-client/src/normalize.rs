//! # Payload Normalization
//!
//! The backend is not consistent about field names: an order id may be
//! `_id`, `id` or `orderId`; a customer's name may be `fullName`,
//! `customerName` or `name`; numbers sometimes arrive as strings and
//! statuses in any case. Every response passes through exactly one of the
//! functions here and comes out as a canonical `snapbuy-core` type.
//!
//! ## Envelope Handling
//! ```text
//! { "data": { ... } }        ──► { ... }
//! { "data": [ ... ] }        ──► [ ... ]
//! { "orders": [ ... ] }      ──► [ ... ]      (list endpoints)
//! [ ... ]                    ──► [ ... ]
//! ```

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

use snapbuy_core::money::parse_amount;
use snapbuy_core::{
    CashCount, Customer, Money, Order, OrderLine, OrderPayment, OrderStatus, PaymentMethod,
    PaymentStatus, Percent, PosSettings, Product, Shift, ShiftStatus, GUEST_CUSTOMER_ID,
};

use crate::error::{ClientError, ClientResult};

const ID_KEYS: &[&str] = &["_id", "id"];
const NAME_KEYS: &[&str] = &["fullName", "customerName", "name"];

// =============================================================================
// Field Helpers
// =============================================================================

/// Strips a `{ "data": ... }` envelope, repeatedly.
pub fn unwrap_envelope(value: &Value) -> &Value {
    let mut current = value;
    while let Some(inner) = current.get("data") {
        if inner.is_object() || inner.is_array() {
            current = inner;
        } else {
            break;
        }
    }
    current
}

/// Finds the array in a list response.
fn unwrap_list<'a>(value: &'a Value, keys: &[&str]) -> ClientResult<&'a Vec<Value>> {
    let value = unwrap_envelope(value);
    if let Some(items) = value.as_array() {
        return Ok(items);
    }
    keys.iter()
        .chain(["items", "results"].iter())
        .find_map(|k| value.get(*k).and_then(Value::as_array))
        .ok_or_else(|| ClientError::Decode("expected a list".into()))
}

/// First present, non-null field as a string. Numbers are stringified.
fn str_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match value.get(*k)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Id of a field that may hold a bare id or a populated object.
fn ref_id(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match value.get(*k)? {
        obj @ Value::Object(_) => str_field(obj, ID_KEYS),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Interprets a JSON number or numeric string as an integer.
///
/// Fractional amounts round to the nearest dong.
fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
                .or_else(|| parse_amount(s).map(|m| m.vnd()))
        }
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
}

fn int_field(value: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|k| value.get(*k).and_then(as_i64))
}

fn money_field(value: &Value, keys: &[&str]) -> Option<Money> {
    int_field(value, keys).map(Money::from_vnd)
}

fn bool_field(value: &Value, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|k| match value.get(*k)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        _ => None,
    })
}

fn time_field(value: &Value, keys: &[&str]) -> Option<DateTime<Utc>> {
    keys.iter().find_map(|k| match value.get(*k)? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    })
}

fn require(field: Option<String>, what: &str) -> ClientResult<String> {
    field.ok_or_else(|| ClientError::Decode(format!("{} payload has no id", what)))
}

// =============================================================================
// Orders
// =============================================================================

pub fn order_from_value(value: &Value) -> ClientResult<Order> {
    let v = unwrap_envelope(value);
    let v = v.get("order").filter(|o| o.is_object()).unwrap_or(v);

    let id = require(str_field(v, &["_id", "id", "orderId"]), "order")?;
    let order_number =
        str_field(v, &["orderNumber", "orderCode", "code"]).unwrap_or_else(|| id.clone());

    let customer = v.get("customer").filter(|c| c.is_object());
    let customer_id = customer
        .and_then(|c| str_field(c, ID_KEYS))
        .or_else(|| ref_id(v, &["customerId", "customer"]))
        .unwrap_or_else(|| GUEST_CUSTOMER_ID.to_string());
    let customer_name = customer
        .and_then(|c| str_field(c, NAME_KEYS))
        .or_else(|| str_field(v, &["customerName"]));

    let lines = ["items", "lines", "orderItems", "products"]
        .iter()
        .find_map(|k| v.get(*k).and_then(Value::as_array))
        .map(|items| items.iter().filter_map(order_line_from_value).collect())
        .unwrap_or_default();

    let payment_status = str_field(v, &["paymentStatus", "payment_status"])
        .or_else(|| v.get("payment").and_then(|p| str_field(p, &["status"])))
        .and_then(|s| s.parse::<PaymentStatus>().ok())
        .unwrap_or_default();
    let order_status = str_field(v, &["orderStatus", "status"])
        .and_then(|s| s.parse::<OrderStatus>().ok())
        .unwrap_or_default();

    let payment = payment_from_value(v);
    let total_amount = money_field(v, &["totalAmount", "total", "finalAmount", "amount"])
        .unwrap_or_default();

    Ok(Order {
        id,
        order_number,
        customer_id,
        customer_name,
        lines,
        total_amount,
        payment_status,
        order_status,
        payment,
        points_used: int_field(v, &["pointsUsed", "usedPoints"]).unwrap_or(0),
        created_by: ref_id(v, &["createdBy", "cashierId", "cashier", "userId"]),
        created_at: time_field(v, &["createdAt", "created_at", "orderDate"]),
    })
}

fn order_line_from_value(v: &Value) -> Option<OrderLine> {
    let product = v.get("product").filter(|p| p.is_object());
    let product_id = ref_id(v, &["productId", "product"])?;
    let name = str_field(v, &["name", "productName"])
        .or_else(|| product.and_then(|p| str_field(p, &["name"])))
        .unwrap_or_default();
    Some(OrderLine {
        product_id,
        name,
        quantity: int_field(v, &["quantity", "qty"]).unwrap_or(0),
        unit_price: money_field(v, &["unitPrice", "price"])
            .or_else(|| product.and_then(|p| money_field(p, &["price"])))
            .unwrap_or_default(),
    })
}

fn payment_from_value(order: &Value) -> OrderPayment {
    let p = order.get("payment").filter(|p| p.is_object());
    let field = |keys: &[&str]| p.and_then(|p| str_field(p, keys)).or_else(|| str_field(order, keys));
    let money = |keys: &[&str]| {
        p.and_then(|p| money_field(p, keys))
            .or_else(|| money_field(order, keys))
    };

    OrderPayment {
        method: field(&["method", "paymentMethod"])
            .and_then(|m| m.parse::<PaymentMethod>().ok())
            .unwrap_or(PaymentMethod::Cash),
        pay_url: field(&["payUrl", "paymentUrl", "qrCodeUrl", "deeplink"]),
        amount_received: money(&["amountReceived", "cashReceived", "customerPaid"]),
        change_amount: money(&["changeAmount", "change"]),
    }
}

pub fn orders_from_value(value: &Value) -> ClientResult<Vec<Order>> {
    unwrap_list(value, &["orders"])?
        .iter()
        .map(order_from_value)
        .collect()
}

// =============================================================================
// Products
// =============================================================================

pub fn product_from_value(value: &Value) -> ClientResult<Product> {
    let v = unwrap_envelope(value);
    let v = v.get("product").filter(|p| p.is_object()).unwrap_or(v);

    let id = require(str_field(v, &["_id", "id", "productId"]), "product")?;
    let category = match v.get("category") {
        Some(obj @ Value::Object(_)) => str_field(obj, &["name", "_id", "id"]),
        _ => str_field(v, &["category", "categoryName", "categoryId"]),
    };

    Ok(Product {
        name: str_field(v, &["name", "productName"]).unwrap_or_else(|| id.clone()),
        barcode: str_field(v, &["barcode", "barCode", "sku"]),
        price: money_field(v, &["price", "sellingPrice", "salePrice"]).unwrap_or_default(),
        stock: int_field(v, &["stock", "stockQuantity", "quantity", "inStock"])
            .unwrap_or(0)
            .max(0),
        category,
        id,
    })
}

pub fn products_from_value(value: &Value) -> ClientResult<Vec<Product>> {
    unwrap_list(value, &["products"])?
        .iter()
        .map(product_from_value)
        .collect()
}

// =============================================================================
// Customers
// =============================================================================

pub fn customer_from_value(value: &Value) -> ClientResult<Customer> {
    let v = unwrap_envelope(value);
    let v = v.get("customer").filter(|c| c.is_object()).unwrap_or(v);

    let id = require(str_field(v, &["_id", "id", "customerId"]), "customer")?;
    Ok(Customer {
        name: str_field(v, NAME_KEYS).unwrap_or_default(),
        phone: str_field(v, &["phone", "phoneNumber"]),
        points: int_field(v, &["points", "loyaltyPoints", "rewardPoints"])
            .unwrap_or(0)
            .max(0),
        id,
    })
}

/// First customer of a search response, if any.
pub fn first_customer_from_value(value: &Value) -> ClientResult<Option<Customer>> {
    let inner = unwrap_envelope(value);
    if inner.is_null() {
        return Ok(None);
    }
    if inner.is_object() && inner.get("customers").is_none() && inner.get("items").is_none() {
        return customer_from_value(inner).map(Some);
    }
    unwrap_list(value, &["customers"])?
        .first()
        .map(customer_from_value)
        .transpose()
}

// =============================================================================
// Shifts
// =============================================================================

pub fn shift_from_value(value: &Value) -> ClientResult<Shift> {
    let v = unwrap_envelope(value);
    let v = v.get("shift").filter(|s| s.is_object()).unwrap_or(v);

    let id = require(str_field(v, &["_id", "id", "shiftId"]), "shift")?;
    let status = match str_field(v, &["status"]).map(|s| s.to_lowercase()).as_deref() {
        Some("closed") | Some("close") | Some("ended") => ShiftStatus::Closed,
        _ => ShiftStatus::Open,
    };
    let opened_at = time_field(v, &["openedAt", "openTime", "startTime", "createdAt"])
        .ok_or_else(|| ClientError::Decode("shift payload has no open time".into()))?;

    Ok(Shift {
        id,
        status,
        opened_at,
        initial_cash: money_field(v, &["initialCash", "openingCash", "startingCash"])
            .unwrap_or_default(),
        cashier_id: ref_id(v, &["cashierId", "cashier", "userId", "user", "openedBy"]),
        closing_note: str_field(v, &["closingNote", "note"]),
        cash_count: ["cashCount", "denominations", "cashDenominations"]
            .iter()
            .find_map(|k| v.get(*k))
            .and_then(cash_count_from_value),
    })
}

/// `{ "500000": 1, "200000": "2" }` or `[{ "value": 500000, "quantity": 1 }]`.
fn cash_count_from_value(value: &Value) -> Option<CashCount> {
    let mut entries = BTreeMap::new();
    match value {
        Value::Object(map) => {
            for (k, q) in map {
                if let (Ok(d), Some(q)) = (k.parse::<i64>(), as_i64(q)) {
                    entries.insert(d, q);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                if let (Some(d), Some(q)) = (
                    int_field(item, &["value", "denomination"]),
                    int_field(item, &["quantity", "count"]),
                ) {
                    entries.insert(d, q);
                }
            }
        }
        _ => return None,
    }

    let mut count = CashCount::new();
    for (d, q) in entries {
        // Unknown notes and negative quantities are dropped
        if let Ok(q) = u32::try_from(q) {
            let _ = count.set(d, q);
        }
    }
    Some(count)
}

/// `None` for an empty body or a `{ "data": null }` envelope.
pub fn optional_shift_from_value(value: &Value) -> ClientResult<Option<Shift>> {
    let inner = match value.get("data") {
        Some(Value::Null) => return Ok(None),
        _ => unwrap_envelope(value),
    };
    if inner.is_null() || inner.as_object().is_some_and(|o| o.is_empty()) {
        return Ok(None);
    }
    match inner.get("shift") {
        Some(Value::Null) => return Ok(None),
        Some(_) => {}
        // e.g. { "message": "No open shift" }
        None if str_field(inner, &["_id", "id", "shiftId"]).is_none() => return Ok(None),
        None => {}
    }
    shift_from_value(inner).map(Some)
}

// =============================================================================
// Settings
// =============================================================================

pub fn settings_from_value(value: &Value) -> ClientResult<PosSettings> {
    let v = unwrap_envelope(value);
    let v = v.get("settings").filter(|s| s.is_object()).unwrap_or(v);
    if !v.is_object() {
        return Err(ClientError::Decode("settings payload is not an object".into()));
    }

    let percent = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| v.get(*k).and_then(as_f64))
            .map(|p| Percent::from_percentage(p.clamp(0.0, 100.0)))
            .unwrap_or_default()
    };

    let defaults = PosSettings::default();
    Ok(PosSettings {
        tax: percent(&["taxPercent", "tax", "taxRate", "vat"]),
        default_discount: percent(&["defaultDiscount", "discountPercent", "discount"]),
        loyalty_enabled: bool_field(v, &["loyaltyEnabled", "enableLoyalty", "usePoints"])
            .unwrap_or(defaults.loyalty_enabled),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_with_populated_customer() {
        let payload = json!({
            "data": {
                "_id": "665f",
                "orderNumber": "DH0007",
                "customer": { "_id": "c-1", "fullName": "Nguyen Van A" },
                "items": [
                    { "product": { "_id": "p-1", "name": "Milk" }, "quantity": "2", "price": 10000 }
                ],
                "totalAmount": "18900",
                "paymentStatus": "PAID",
                "status": "Completed",
                "paymentMethod": "cash",
                "changeAmount": 1100,
                "createdBy": { "_id": "u-1" },
                "createdAt": "2024-05-01T09:30:00Z"
            }
        });

        let order = order_from_value(&payload).unwrap();
        assert_eq!(order.id, "665f");
        assert_eq!(order.customer_id, "c-1");
        assert_eq!(order.customer_name.as_deref(), Some("Nguyen Van A"));
        assert_eq!(order.total_amount.vnd(), 18_900);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.order_status, OrderStatus::Completed);
        assert_eq!(order.payment.change_amount, Some(Money::from_vnd(1_100)));
        assert_eq!(order.lines[0].name, "Milk");
        assert_eq!(order.lines[0].quantity, 2);
        assert_eq!(order.created_by.as_deref(), Some("u-1"));
        assert!(order.created_at.is_some());
    }

    #[test]
    fn test_order_name_fallbacks() {
        let by_customer_name = json!({
            "orderId": "o-2",
            "customer": { "id": "c-2", "customerName": "Tran B" },
            "total": 5000
        });
        let order = order_from_value(&by_customer_name).unwrap();
        assert_eq!(order.id, "o-2");
        assert_eq!(order.order_number, "o-2");
        assert_eq!(order.customer_name.as_deref(), Some("Tran B"));

        let by_name = json!({ "id": 42, "customer": { "_id": "c-3", "name": "Le C" } });
        let order = order_from_value(&by_name).unwrap();
        assert_eq!(order.id, "42");
        assert_eq!(order.customer_name.as_deref(), Some("Le C"));
    }

    #[test]
    fn test_order_without_customer_is_guest() {
        let order = order_from_value(&json!({ "_id": "o-3", "totalAmount": 100 })).unwrap();
        assert_eq!(order.customer_id, GUEST_CUSTOMER_ID);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(order.order_status, OrderStatus::Pending);
    }

    #[test]
    fn test_wallet_order_payment_block() {
        let payload = json!({
            "_id": "o-4",
            "totalAmount": 18900,
            "payment": { "method": "momo", "payUrl": "https://pay.example/qr" }
        });
        let order = order_from_value(&payload).unwrap();
        assert_eq!(order.payment.method, PaymentMethod::Wallet);
        assert_eq!(order.payment.pay_url.as_deref(), Some("https://pay.example/qr"));
    }

    #[test]
    fn test_order_missing_id_is_decode_error() {
        assert!(matches!(
            order_from_value(&json!({ "total": 1 })),
            Err(ClientError::Decode(_))
        ));
    }

    #[test]
    fn test_product_list_envelopes() {
        let bare = json!([{ "_id": "p-1", "name": "Milk", "price": "10000", "stock": 5 }]);
        let wrapped = json!({ "data": { "products": [
            { "id": "p-2", "productName": "Tea", "sellingPrice": 8000, "stockQuantity": "3",
              "category": { "name": "Drinks" } }
        ] } });

        let a = products_from_value(&bare).unwrap();
        assert_eq!(a[0].price.vnd(), 10_000);
        assert_eq!(a[0].stock, 5);

        let b = products_from_value(&wrapped).unwrap();
        assert_eq!(b[0].name, "Tea");
        assert_eq!(b[0].stock, 3);
        assert_eq!(b[0].category.as_deref(), Some("Drinks"));
    }

    #[test]
    fn test_customer_search_results() {
        let found = json!({ "data": [{ "_id": "c-1", "fullName": "A", "phone": "0901234567", "points": "5000" }] });
        let customer = first_customer_from_value(&found).unwrap().unwrap();
        assert_eq!(customer.points, 5_000);

        let empty = json!({ "data": [] });
        assert!(first_customer_from_value(&empty).unwrap().is_none());

        let single = json!({ "customer": { "_id": "c-9", "name": "Z" } });
        assert_eq!(first_customer_from_value(&single).unwrap().unwrap().id, "c-9");
    }

    #[test]
    fn test_shift_with_denominations() {
        let payload = json!({
            "data": {
                "_id": "s-1",
                "status": "OPEN",
                "openedAt": "2024-05-01T08:00:00Z",
                "initialCash": "500000",
                "cashier": { "_id": "u-1" },
                "cashCount": { "200000": 2, "50000": "1", "3000": 4 }
            }
        });

        let shift = shift_from_value(&payload).unwrap();
        assert!(shift.is_open());
        assert_eq!(shift.initial_cash.vnd(), 500_000);
        assert_eq!(shift.cashier_id.as_deref(), Some("u-1"));
        let count = shift.cash_count.unwrap();
        assert_eq!(count.total().vnd(), 450_000);
    }

    #[test]
    fn test_no_current_shift() {
        assert!(optional_shift_from_value(&json!({ "data": null })).unwrap().is_none());
        assert!(optional_shift_from_value(&Value::Null).unwrap().is_none());
        assert!(optional_shift_from_value(&json!({ "shift": null })).unwrap().is_none());
        assert!(optional_shift_from_value(&json!({ "message": "No open shift" }))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_settings() {
        let settings =
            settings_from_value(&json!({ "data": { "taxPercent": "8", "discountPercent": 10 } }))
                .unwrap();
        assert_eq!(settings.tax.bps(), 800);
        assert_eq!(settings.default_discount.bps(), 1_000);
        assert!(settings.loyalty_enabled);
    }
}
