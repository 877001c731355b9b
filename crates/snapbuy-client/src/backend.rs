//! # Backend Trait
//!
//! The seam between the POS flows and the REST backend. `ApiClient`
//! implements it over HTTP; tests implement it in memory.
//!
//! ## Endpoint Map
//! ```text
//! create_order           POST /api/orders                (Idempotency-Key)
//! get_order              GET  /api/orders/{id}
//! list_orders            GET  /api/orders?status=&paymentStatus=&...
//! complete_order         POST /api/orders/{id}/complete
//! cancel_order           POST /api/orders/{id}/cancel
//! list_products          GET  /api/products
//! product_by_barcode     GET  /api/products/barcode/{code}
//! current_shift          GET  /api/pos-shifts/current
//! open_shift             POST /api/pos-shifts/open
//! close_shift            POST /api/pos-shifts/{id}/close
//! find_customer_by_phone GET  /api/customers?phone=
//! create_customer        POST /api/customers
//! pos_settings           GET  /api/pos-settings
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use snapbuy_core::{
    CartLine, CashCount, Customer, Money, Order, OrderStatus, PaymentMethod, PaymentStatus,
    PosSettings, Product, Shift,
};

use crate::error::ClientResult;

// =============================================================================
// Request Bodies
// =============================================================================

/// One line of a create-order request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    /// Per-line discount. The POS always sends zero and discounts the order.
    pub discount: Money,
}

impl From<&CartLine> for CreateOrderLine {
    fn from(line: &CartLine) -> Self {
        CreateOrderLine {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            discount: Money::zero(),
        }
    }
}

/// Body of `POST /api/orders`.
///
/// Discount and tax go over as percentages; the backend recomputes the
/// amounts itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: String,
    pub items: Vec<CreateOrderLine>,
    pub discount_percent: f64,
    pub tax_percent: f64,
    pub shipping_fee: Money,
    pub payment_method: PaymentMethod,
    pub points_used: i64,
}

/// Body of `POST /api/orders/{id}/complete`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteOrderRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_received: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_amount: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenShiftRequest {
    pub initial_cash: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseShiftRequest {
    pub closing_note: String,
    pub counted_cash: Money,
    pub cash_count: CashCount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub full_name: String,
    pub phone: String,
}

// =============================================================================
// Order Query
// =============================================================================

/// Filters for `GET /api/orders`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub created_by: Option<String>,
    pub from: Option<DateTime<Utc>>,
}

impl OrderQuery {
    /// Completed, paid orders by `cashier` since `from`: the drawer query.
    pub fn drawer(cashier: Option<String>, from: DateTime<Utc>) -> Self {
        OrderQuery {
            status: Some(OrderStatus::Completed),
            payment_status: Some(PaymentStatus::Paid),
            payment_method: None,
            created_by: cashier,
            from: Some(from),
        }
    }

    /// Query-string pairs in the backend's parameter names.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            let s = match status {
                OrderStatus::Pending => "pending",
                OrderStatus::Completed => "completed",
                OrderStatus::Cancelled => "cancelled",
            };
            pairs.push(("status", s.to_string()));
        }
        if let Some(status) = self.payment_status {
            let s = match status {
                PaymentStatus::Unpaid => "unpaid",
                PaymentStatus::Paid => "paid",
                PaymentStatus::Failed => "failed",
            };
            pairs.push(("paymentStatus", s.to_string()));
        }
        if let Some(method) = self.payment_method {
            pairs.push(("paymentMethod", method.as_str().to_string()));
        }
        if let Some(ref by) = self.created_by {
            pairs.push(("createdBy", by.clone()));
        }
        if let Some(from) = self.from {
            pairs.push(("from", from.to_rfc3339()));
        }
        pairs
    }

    /// Client-side re-check, for backends that ignore some filters.
    pub fn matches(&self, order: &Order) -> bool {
        if self.status.is_some_and(|s| s != order.order_status) {
            return false;
        }
        if self.payment_status.is_some_and(|s| s != order.payment_status) {
            return false;
        }
        if self.payment_method.is_some_and(|m| m != order.payment.method) {
            return false;
        }
        if let Some(ref by) = self.created_by {
            if order.created_by.as_ref().is_some_and(|c| c != by) {
                return false;
            }
        }
        if let (Some(from), Some(at)) = (self.from, order.created_at) {
            if at < from {
                return false;
            }
        }
        true
    }
}

// =============================================================================
// Backend Trait
// =============================================================================

/// Every backend call the POS makes. All calls are single-shot.
#[async_trait]
pub trait PosBackend: Send + Sync {
    // Orders
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
        idempotency_key: &str,
    ) -> ClientResult<Order>;
    async fn get_order(&self, order_id: &str) -> ClientResult<Order>;
    async fn list_orders(&self, query: &OrderQuery) -> ClientResult<Vec<Order>>;
    async fn complete_order(
        &self,
        order_id: &str,
        request: &CompleteOrderRequest,
    ) -> ClientResult<Order>;
    async fn cancel_order(&self, order_id: &str) -> ClientResult<Order>;

    // Catalog
    async fn list_products(&self) -> ClientResult<Vec<Product>>;
    /// `None` when no product carries this barcode.
    async fn product_by_barcode(&self, code: &str) -> ClientResult<Option<Product>>;

    // Shifts
    /// `None` when the cashier has no open shift.
    async fn current_shift(&self) -> ClientResult<Option<Shift>>;
    async fn open_shift(&self, request: &OpenShiftRequest) -> ClientResult<Shift>;
    async fn close_shift(&self, shift_id: &str, request: &CloseShiftRequest)
        -> ClientResult<Shift>;

    // Customers
    async fn find_customer_by_phone(&self, phone: &str) -> ClientResult<Option<Customer>>;
    async fn create_customer(&self, customer: &NewCustomer) -> ClientResult<Customer>;

    // Settings
    async fn pos_settings(&self) -> ClientResult<PosSettings>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_create_order_body_shape() {
        let request = CreateOrderRequest {
            customer_id: "guest".into(),
            items: vec![CreateOrderLine {
                product_id: "p-1".into(),
                quantity: 2,
                unit_price: Money::from_vnd(10_000),
                discount: Money::zero(),
            }],
            discount_percent: 10.0,
            tax_percent: 5.0,
            shipping_fee: Money::zero(),
            payment_method: PaymentMethod::Wallet,
            points_used: 0,
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["paymentMethod"], "momo");
        assert_eq!(body["discountPercent"], 10.0);
        assert_eq!(body["items"][0]["unitPrice"], 10_000);
        assert_eq!(body["items"][0]["discount"], 0);
    }

    #[test]
    fn test_drawer_query_pairs() {
        let from = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let pairs = OrderQuery::drawer(Some("u-1".into()), from).to_pairs();

        assert!(pairs.contains(&("status", "completed".to_string())));
        assert!(pairs.contains(&("paymentStatus", "paid".to_string())));
        assert!(pairs.contains(&("createdBy", "u-1".to_string())));
        assert!(pairs.iter().any(|(k, _)| *k == "from"));
    }

    #[test]
    fn test_complete_request_skips_empty_fields() {
        let body = serde_json::to_value(CompleteOrderRequest::default()).unwrap();
        assert_eq!(body, serde_json::json!({}));
    }
}
