//! # Domain Types
//!
//! Canonical client-side shapes of everything the backend returns.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │     Shift       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id / number    │   │  id             │       │
//! │  │  barcode        │   │  total_amount   │   │  status         │       │
//! │  │  price (VND)    │   │  payment_status │   │  opened_at      │       │
//! │  │  stock          │   │  order_status   │   │  initial_cash   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │ PaymentMethod   │   │      Role       │       │
//! │  │  id (or guest)  │   │  Cash           │   │  Admin          │       │
//! │  │  phone, points  │   │  Wallet (MoMo)  │   │  Manager        │       │
//! │  └─────────────────┘   └─────────────────┘   │  Salesman       │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Orders and shifts are server-owned: the client only ever holds read-only
//! copies produced by `snapbuy-client`'s normalization layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::cash::CashCount;
use crate::error::ValidationError;
use crate::money::{Money, Percent};
use crate::GUEST_CUSTOMER_ID;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale in the current tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub barcode: Option<String>,
    /// Selling price in whole dong.
    pub price: Money,
    /// Units on hand; the cart never holds more than this.
    pub stock: i64,
    pub category: Option<String>,
}

impl Product {
    pub fn in_category(&self, category: &str) -> bool {
        self.category.as_deref() == Some(category)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A buyer. Walk-in buyers use the guest sentinel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    /// Loyalty points; one point redeems one dong.
    pub points: i64,
}

impl Customer {
    /// The walk-in buyer.
    pub fn guest() -> Self {
        Customer {
            id: GUEST_CUSTOMER_ID.to_string(),
            name: "Guest".to_string(),
            phone: None,
            points: 0,
        }
    }

    pub fn is_guest(&self) -> bool {
        self.id == GUEST_CUSTOMER_ID
    }
}

impl Default for Customer {
    fn default() -> Self {
        Customer::guest()
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    /// Physical cash handed to the cashier.
    Cash,
    /// Mobile wallet (MoMo): redirect/QR plus asynchronous confirmation.
    #[serde(rename = "momo", alias = "wallet")]
    Wallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Wallet => "momo",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" | "tien_mat" => Ok(PaymentMethod::Cash),
            "momo" | "wallet" | "e-wallet" | "ewallet" => Ok(PaymentMethod::Wallet),
            other => Err(ValidationError::invalid(
                "payment method",
                &format!("unknown method '{}'", other),
            )),
        }
    }
}

// =============================================================================
// Order Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    Failed,
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unpaid" | "pending" => Ok(PaymentStatus::Unpaid),
            "paid" | "success" | "completed" => Ok(PaymentStatus::Paid),
            "failed" | "fail" | "error" => Ok(PaymentStatus::Failed),
            other => Err(ValidationError::invalid(
                "payment status",
                &format!("unknown status '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "processing" => Ok(OrderStatus::Pending),
            "completed" | "complete" | "done" => Ok(OrderStatus::Completed),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            other => Err(ValidationError::invalid(
                "order status",
                &format!("unknown status '{}'", other),
            )),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A line of a persisted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderLine {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

/// Payment details attached to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderPayment {
    pub method: PaymentMethod,
    /// Wallet checkout URL (rendered as a QR code).
    pub pay_url: Option<String>,
    /// Cash handed over by the buyer.
    pub amount_received: Option<Money>,
    /// Change returned to the buyer.
    pub change_amount: Option<Money>,
}

/// A server-owned order. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub lines: Vec<OrderLine>,
    pub total_amount: Money,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub payment: OrderPayment,
    pub points_used: i64,
    pub created_by: Option<String>,
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    pub fn is_completed(&self) -> bool {
        self.order_status == OrderStatus::Completed
    }

    /// Net cash this order left in the drawer.
    ///
    /// The buyer's hand-over minus the change given back; when the backend
    /// did not record the hand-over the order total stands in for it.
    pub fn cash_in_drawer(&self) -> Money {
        if self.payment.method != PaymentMethod::Cash {
            return Money::zero();
        }
        let received = self.payment.amount_received.unwrap_or(self.total_amount);
        received - self.payment.change_amount.unwrap_or_default()
    }
}

// =============================================================================
// Shift
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ShiftStatus {
    #[default]
    Open,
    Closed,
}

/// A cashier's working session with drawer accountability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Shift {
    pub id: String,
    pub status: ShiftStatus,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    pub initial_cash: Money,
    pub cashier_id: Option<String>,
    pub closing_note: Option<String>,
    pub cash_count: Option<CashCount>,
}

impl Shift {
    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }
}

// =============================================================================
// Settings & Roles
// =============================================================================

/// Tenant-wide POS settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PosSettings {
    pub tax: Percent,
    pub default_discount: Percent,
    pub loyalty_enabled: bool,
}

impl Default for PosSettings {
    fn default() -> Self {
        PosSettings {
            tax: Percent::zero(),
            default_discount: Percent::zero(),
            loyalty_enabled: true,
        }
    }
}

/// Role of the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Role {
    Admin,
    Manager,
    /// Sales clerk: needs an open shift before using the POS.
    Salesman,
}

impl Role {
    pub fn requires_open_shift(&self) -> bool {
        matches!(self, Role::Salesman)
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" | "owner" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "salesman" | "sales" | "cashier" => Ok(Role::Salesman),
            other => Err(ValidationError::invalid(
                "role",
                &format!("unknown role '{}'", other),
            )),
        }
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// Everything printed once a checkout completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Receipt {
    pub order_id: String,
    pub order_number: String,
    pub customer_name: String,
    pub lines: Vec<OrderLine>,
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub points_used: i64,
    pub total: Money,
    pub method: PaymentMethod,
    pub cash_received: Option<Money>,
    pub change: Option<Money>,
    #[ts(as = "String")]
    pub completed_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cash_order(total: i64, received: Option<i64>, change: Option<i64>) -> Order {
        Order {
            id: "o-1".into(),
            order_number: "DH0001".into(),
            customer_id: GUEST_CUSTOMER_ID.into(),
            customer_name: None,
            lines: vec![],
            total_amount: Money::from_vnd(total),
            payment_status: PaymentStatus::Paid,
            order_status: OrderStatus::Completed,
            payment: OrderPayment {
                method: PaymentMethod::Cash,
                pay_url: None,
                amount_received: received.map(Money::from_vnd),
                change_amount: change.map(Money::from_vnd),
            },
            points_used: 0,
            created_by: None,
            created_at: None,
        }
    }

    #[test]
    fn test_guest_customer() {
        let guest = Customer::default();
        assert!(guest.is_guest());
        assert_eq!(guest.points, 0);
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!("MoMo".parse::<PaymentMethod>().unwrap(), PaymentMethod::Wallet);
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert!("card".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_payment_method_serde_alias() {
        let m: PaymentMethod = serde_json::from_str("\"momo\"").unwrap();
        assert_eq!(m, PaymentMethod::Wallet);
    }

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!("PAID".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
        assert_eq!("Canceled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_role_gate() {
        assert!("salesman".parse::<Role>().unwrap().requires_open_shift());
        assert!(!Role::Manager.requires_open_shift());
    }

    #[test]
    fn test_cash_in_drawer() {
        assert_eq!(cash_order(18_900, Some(20_000), Some(1_100)).cash_in_drawer().vnd(), 18_900);
        assert_eq!(cash_order(18_900, None, None).cash_in_drawer().vnd(), 18_900);

        let mut wallet = cash_order(18_900, None, None);
        wallet.payment.method = PaymentMethod::Wallet;
        assert!(wallet.cash_in_drawer().is_zero());
    }
}
