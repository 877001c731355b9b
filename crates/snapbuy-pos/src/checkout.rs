//! # Checkout Session
//!
//! One checkout at a time, from the first scanned item to the printed
//! receipt.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌──────┐  create_order   ┌────────────────────────┐                   │
//! │   │ Idle │ ──────────────► │ PaymentMethodSelection │                   │
//! │   └──────┘ ◄────────────── └───────────┬────────────┘                   │
//! │      ▲     abandon_checkout            │ select_method                  │
//! │      │                      ┌──────────┴──────────┐                     │
//! │      │                      ▼                     ▼                     │
//! │      │               ┌─────────────┐       ┌───────────────┐            │
//! │      │ cancel_order  │ CashPending │       │ WalletPending │            │
//! │      ├───────────────┤             │       │  (3s poll)    │            │
//! │      │               └──────┬──────┘       └───────┬───────┘            │
//! │      │                      │ confirm_cash         │ paid   failed /    │
//! │      │                      ▼                      ▼        timeout /   │
//! │      │               ┌─────────────┐ ◄─────────────┘        401         │
//! │      │   reset       │  Completed  │                  ┌───────────┐     │
//! │      ├───────────────┤  (receipt)  │                  │ Cancelled │     │
//! │      │               └─────────────┘                  └─────┬─────┘     │
//! │      └──────────────────────────────────────────────────────┘ reset    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Backend calls are single-shot. A failed call leaves the state where it
//! was so the cashier can retry or cancel. Every user-visible event goes
//! through the session's [`Notifier`], which the UI drains.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use snapbuy_client::{
    ClientConfig, ClientError, CompleteOrderRequest, CreateOrderLine, CreateOrderRequest,
    NewCustomer, PosBackend,
};
use snapbuy_core::notify::DEFAULT_DEDUP_WINDOW;
use snapbuy_core::validation::{validate_customer_name, validate_percent, validate_phone};
use snapbuy_core::{
    compute_totals, Cart, CartChange, Customer, Money, NotificationKind, Notification, Notifier,
    Order, PaymentMethod, Percent, PosSettings, PricingInput, Product, Receipt, Totals,
    ValidationError,
};

use crate::error::{PosError, PosResult};
use crate::payment::{prepare_cash_tender, CashTender, PollSchedule, WalletOutcome, WalletPollHandle};

// =============================================================================
// State
// =============================================================================

/// Why a checkout ended without payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CancelReason {
    PaymentFailed,
    TimedOut,
    SessionExpired,
}

impl CancelReason {
    pub fn message(&self) -> &'static str {
        match self {
            CancelReason::PaymentFailed => WalletOutcome::Failed.message(),
            CancelReason::TimedOut => WalletOutcome::TimedOut.message(),
            CancelReason::SessionExpired => WalletOutcome::SessionExpired.message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(tag = "state", rename_all = "snake_case")]
#[ts(export)]
pub enum CheckoutState {
    /// Building the cart.
    Idle,
    /// Draft validated; waiting for the cashier to pick cash or wallet.
    PaymentMethodSelection,
    CashPending { order: Order },
    WalletPending { order: Order },
    Completed { receipt: Receipt },
    Cancelled { order_id: String, reason: CancelReason },
}

impl CheckoutState {
    /// Human-readable state, used in "Cannot X while Y" messages.
    pub fn describe(&self) -> &'static str {
        match self {
            CheckoutState::Idle => "idle",
            CheckoutState::PaymentMethodSelection => "choosing a payment method",
            CheckoutState::CashPending { .. } => "waiting for cash",
            CheckoutState::WalletPending { .. } => "waiting for wallet payment",
            CheckoutState::Completed { .. } => "the sale is completed",
            CheckoutState::Cancelled { .. } => "the sale is cancelled",
        }
    }

    /// The backend order this checkout is paying for, if one exists.
    pub fn active_order(&self) -> Option<&Order> {
        match self {
            CheckoutState::CashPending { order } | CheckoutState::WalletPending { order } => {
                Some(order)
            }
            _ => None,
        }
    }

    fn allows_cart_edits(&self) -> bool {
        matches!(self, CheckoutState::Idle | CheckoutState::Cancelled { .. })
    }
}

// =============================================================================
// Options
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutOptions {
    pub wallet_poll: PollSchedule,
    pub dedup_window: Duration,
}

impl CheckoutOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        CheckoutOptions {
            wallet_poll: PollSchedule::from_config(config),
            dedup_window: config.dedup_window(),
        }
    }
}

impl Default for CheckoutOptions {
    fn default() -> Self {
        CheckoutOptions {
            wallet_poll: PollSchedule::default(),
            dedup_window: DEFAULT_DEDUP_WINDOW,
        }
    }
}

// =============================================================================
// Session
// =============================================================================

pub struct CheckoutSession {
    backend: Arc<dyn PosBackend>,
    options: CheckoutOptions,
    state: CheckoutState,
    cart: Cart,
    customer: Customer,
    settings: PosSettings,
    discount: Percent,
    shipping: Money,
    requested_points: i64,
    products: Vec<Product>,
    category: Option<String>,
    notifier: Notifier,
    wallet_poll: Option<WalletPollHandle>,
    /// Idempotency key of the current create-order attempt.
    attempt_key: Option<String>,
}

impl CheckoutSession {
    pub fn new(backend: Arc<dyn PosBackend>, options: CheckoutOptions) -> Self {
        CheckoutSession {
            backend,
            options,
            state: CheckoutState::Idle,
            cart: Cart::new(),
            customer: Customer::guest(),
            settings: PosSettings::default(),
            discount: Percent::zero(),
            shipping: Money::zero(),
            requested_points: 0,
            products: Vec::new(),
            category: None,
            notifier: Notifier::with_window(options.dedup_window),
            wallet_poll: None,
            attempt_key: None,
        }
    }

    /// Loads tenant settings and the catalog.
    pub async fn load(&mut self) -> PosResult<()> {
        debug!("Loading POS settings");
        let settings = self.backend.pos_settings().await?;
        self.discount = settings.default_discount;
        self.settings = settings;
        info!(
            tax = self.settings.tax.percentage(),
            discount = self.discount.percentage(),
            loyalty = self.settings.loyalty_enabled,
            "POS settings loaded"
        );
        self.refresh_products().await
    }

    /// Re-fetches the catalog and re-applies stock ceilings to the cart.
    pub async fn refresh_products(&mut self) -> PosResult<()> {
        let products = self.backend.list_products().await?;
        for change in self.cart.refresh_stock(&products) {
            self.raise_change(&change);
        }
        debug!(count = products.len(), "Catalog refreshed");
        self.products = products;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn settings(&self) -> &PosSettings {
        &self.settings
    }

    pub fn discount(&self) -> Percent {
        self.discount
    }

    pub fn shipping(&self) -> Money {
        self.shipping
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// `None` shows every category.
    pub fn set_category(&mut self, category: Option<String>) {
        self.category = category;
    }

    /// Products in the selected category tab.
    pub fn visible_products(&self) -> impl Iterator<Item = &Product> + '_ {
        self.products.iter().filter(move |p| match self.category {
            Some(ref c) => p.in_category(c),
            None => true,
        })
    }

    /// Wallet checkout URL to render as a QR code.
    pub fn pay_url(&self) -> Option<&str> {
        match &self.state {
            CheckoutState::WalletPending { order } => order.payment.pay_url.as_deref(),
            _ => None,
        }
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifier.drain()
    }

    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------

    /// Adds one unit of `product`. A rejection is raised as a warning and
    /// returned.
    pub fn add_product(&mut self, product: &Product) -> PosResult<CartChange> {
        self.ensure_editable("add to the cart")?;
        match self.cart.add_product(product) {
            Ok(change) => {
                self.raise_change(&change);
                Ok(change)
            }
            Err(e) => {
                warn!(product_id = %product.id, error = %e, "Add to cart rejected");
                self.notify(NotificationKind::Warning, e.to_string());
                Err(e.into())
            }
        }
    }

    /// Adds a catalog product by id (a click on the product grid).
    pub fn add_product_by_id(&mut self, product_id: &str) -> PosResult<CartChange> {
        let product = self
            .products
            .iter()
            .find(|p| p.id == product_id)
            .cloned()
            .ok_or_else(|| PosError::ProductNotFound(product_id.to_string()))?;
        self.add_product(&product)
    }

    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> PosResult<CartChange> {
        self.ensure_editable("change quantities")?;
        let change = self.cart.set_quantity(product_id, quantity)?;
        self.raise_change(&change);
        Ok(change)
    }

    pub fn remove_line(&mut self, product_id: &str) -> PosResult<CartChange> {
        self.ensure_editable("remove items")?;
        let change = self.cart.remove_line(product_id)?;
        self.raise_change(&change);
        Ok(change)
    }

    // -------------------------------------------------------------------------
    // Customer
    // -------------------------------------------------------------------------

    pub fn select_customer(&mut self, customer: Customer) -> PosResult<()> {
        self.ensure_editable("change the customer")?;
        info!(customer_id = %customer.id, points = customer.points, "Customer selected");
        self.customer = customer;
        Ok(())
    }

    pub fn use_guest(&mut self) -> PosResult<()> {
        self.ensure_editable("change the customer")?;
        self.customer = Customer::guest();
        self.requested_points = 0;
        Ok(())
    }

    /// Looks a customer up by phone and selects them when found.
    pub async fn lookup_customer(&mut self, phone: &str) -> PosResult<Option<Customer>> {
        self.ensure_editable("change the customer")?;
        let phone = phone.trim();
        validate_phone(phone)?;

        let found = self.backend.find_customer_by_phone(phone).await?;
        match found {
            Some(ref customer) => {
                self.select_customer(customer.clone())?;
                self.notify(
                    NotificationKind::Success,
                    format!("Customer: {}", customer.name),
                );
            }
            None => {
                self.notify(
                    NotificationKind::Info,
                    format!("No customer with phone {}", phone),
                );
            }
        }
        Ok(found)
    }

    /// Registers a new customer and selects them.
    pub async fn create_customer(&mut self, name: &str, phone: &str) -> PosResult<Customer> {
        self.ensure_editable("change the customer")?;
        let full_name = validate_customer_name(name)?;
        let phone = phone.trim().to_string();
        validate_phone(&phone)?;

        let customer = self
            .backend
            .create_customer(&NewCustomer { full_name, phone })
            .await?;
        self.notify(
            NotificationKind::Success,
            format!("Customer {} created", customer.name),
        );
        self.select_customer(customer.clone())?;
        Ok(customer)
    }

    // -------------------------------------------------------------------------
    // Pricing
    // -------------------------------------------------------------------------

    /// Sets the points the buyer wants to redeem. Returns the amount that
    /// will actually be used after capping.
    pub fn set_points_to_use(&mut self, points: i64) -> PosResult<i64> {
        self.ensure_editable("change points")?;
        self.requested_points = points.max(0);
        Ok(self.totals().points_used)
    }

    pub fn set_discount_percent(&mut self, percent: f64) -> PosResult<()> {
        self.ensure_editable("change the discount")?;
        self.discount = validate_percent("discount", percent)?;
        Ok(())
    }

    pub fn set_shipping(&mut self, shipping: Money) -> PosResult<()> {
        self.ensure_editable("change shipping")?;
        if shipping.is_negative() {
            return Err(ValidationError::Negative {
                field: "shipping".to_string(),
            }
            .into());
        }
        self.shipping = shipping;
        Ok(())
    }

    /// Totals for the current cart, recomputed on every call.
    pub fn totals(&self) -> Totals {
        let lines = self.cart.pricing_lines();
        let customer_points = if self.settings.loyalty_enabled && !self.customer.is_guest() {
            self.customer.points
        } else {
            0
        };
        compute_totals(&PricingInput {
            lines: &lines,
            discount: self.discount,
            tax: self.settings.tax,
            shipping: self.shipping,
            customer_points,
            requested_points: self.requested_points,
        })
    }

    // -------------------------------------------------------------------------
    // Checkout flow
    // -------------------------------------------------------------------------

    /// Validates the draft and moves to payment method selection. No request
    /// is sent.
    pub fn create_order(&mut self) -> PosResult<()> {
        if !self.state.allows_cart_edits() {
            return Err(PosError::invalid_state("create an order", self.state.describe()));
        }
        if self.cart.is_empty() {
            return Err(PosError::EmptyCart);
        }
        if !self.customer.is_guest() {
            validate_phone(self.customer.phone.as_deref().unwrap_or_default())?;
        }

        let key = Uuid::new_v4().to_string();
        info!(
            lines = self.cart.len(),
            total = self.totals().total.vnd(),
            attempt = %key,
            "Checkout started"
        );
        self.attempt_key = Some(key);
        self.state = CheckoutState::PaymentMethodSelection;
        Ok(())
    }

    /// Back from payment method selection to the cart.
    pub fn abandon_checkout(&mut self) -> PosResult<()> {
        if self.state != CheckoutState::PaymentMethodSelection {
            return Err(PosError::invalid_state("go back to the cart", self.state.describe()));
        }
        self.attempt_key = None;
        self.state = CheckoutState::Idle;
        Ok(())
    }

    /// Creates the backend order for the chosen method.
    ///
    /// A failure keeps the session in `PaymentMethodSelection`; a retry
    /// reuses the same idempotency key.
    pub async fn select_method(&mut self, method: PaymentMethod) -> PosResult<()> {
        if self.state != CheckoutState::PaymentMethodSelection {
            return Err(PosError::invalid_state("choose a payment method", self.state.describe()));
        }
        if self.cart.is_empty() {
            return Err(PosError::EmptyCart);
        }

        let key = self
            .attempt_key
            .get_or_insert_with(|| Uuid::new_v4().to_string())
            .clone();
        let request = self.order_request(method);
        debug!(method = %method, attempt = %key, "Creating order");

        let order = match self.backend.create_order(&request, &key).await {
            Ok(order) => order,
            Err(e) => return Err(self.report_failure("Create order", e)),
        };

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = order.total_amount.vnd(),
            method = %method,
            "Order created"
        );

        self.state = match method {
            PaymentMethod::Cash => CheckoutState::CashPending { order },
            PaymentMethod::Wallet => {
                self.start_wallet_poll(&order.id);
                CheckoutState::WalletPending { order }
            }
        };
        Ok(())
    }

    /// Completes a cash order with the amount the buyer handed over.
    ///
    /// A hand-over below the total is rejected before any request.
    pub async fn confirm_cash(&mut self, cash_received: &str) -> PosResult<Receipt> {
        let order = match &self.state {
            CheckoutState::CashPending { order } => order.clone(),
            other => return Err(PosError::invalid_state("confirm cash", other.describe())),
        };

        let tender = match prepare_cash_tender(cash_received, order.total_amount) {
            Ok(tender) => tender,
            Err(e) => {
                self.notify(NotificationKind::Error, e.to_string());
                return Err(e);
            }
        };

        let request = CompleteOrderRequest {
            amount_received: Some(tender.received),
            change_amount: Some(tender.change),
        };
        let completed = match self.backend.complete_order(&order.id, &request).await {
            Ok(completed) => completed,
            Err(e) => return Err(self.report_failure("Complete order", e)),
        };

        info!(
            order_id = %completed.id,
            received = tender.received.vnd(),
            change = tender.change.vnd(),
            "Cash payment completed"
        );
        Ok(self.finish(completed, Some(tender)))
    }

    /// Waits for the wallet poll to end and applies its outcome.
    ///
    /// If the poll is no longer running (an earlier completion call failed),
    /// a paid order is completed directly and an unpaid one is polled again.
    pub async fn await_wallet_outcome(&mut self) -> PosResult<()> {
        let order = match &self.state {
            CheckoutState::WalletPending { order } => order.clone(),
            other => return Err(PosError::invalid_state("wait for payment", other.describe())),
        };

        let outcome = if let Some(handle) = self.wallet_poll.as_mut() {
            handle.outcome().await
        } else if order.is_paid() {
            WalletOutcome::Paid(order)
        } else {
            self.start_wallet_poll(&order.id);
            return Ok(());
        };
        self.wallet_poll = None;
        self.apply_wallet_outcome(outcome).await
    }

    /// Applies the wallet outcome if the poll has ended. Returns whether it
    /// had.
    ///
    /// A paid order whose completion failed earlier is completed again here.
    pub async fn check_wallet(&mut self) -> PosResult<bool> {
        let order = match &self.state {
            CheckoutState::WalletPending { order } => order.clone(),
            _ => return Ok(false),
        };
        let outcome = if let Some(handle) = self.wallet_poll.as_mut() {
            match handle.try_outcome() {
                Some(outcome) => outcome,
                None => return Ok(false),
            }
        } else if order.is_paid() {
            WalletOutcome::Paid(order)
        } else {
            self.start_wallet_poll(&order.id);
            return Ok(false);
        };
        self.wallet_poll = None;
        self.apply_wallet_outcome(outcome).await?;
        Ok(true)
    }

    /// Cancels any order by id.
    ///
    /// Cancelling the session's active order also stops the wallet poll,
    /// clears the cart and returns to `Idle`. Other orders leave the session
    /// untouched.
    pub async fn cancel_order(&mut self, order_id: &str) -> PosResult<()> {
        debug!(order_id = %order_id, "Cancelling order");
        let cancelled = match self.backend.cancel_order(order_id).await {
            Ok(order) => order,
            Err(e) => return Err(self.report_failure("Cancel order", e)),
        };

        let is_active = self
            .state
            .active_order()
            .is_some_and(|o| o.id == order_id);
        if is_active {
            if let Some(handle) = self.wallet_poll.take() {
                handle.cancel();
            }
            self.cart.clear();
            self.attempt_key = None;
            self.state = CheckoutState::Idle;
        }

        info!(order_id = %order_id, active = is_active, "Order cancelled");
        self.notify(
            NotificationKind::Info,
            format!("Order {} cancelled", cancelled.order_number),
        );
        Ok(())
    }

    /// Cancels whatever checkout is in progress.
    pub async fn cancel_checkout(&mut self) -> PosResult<()> {
        match self.state.active_order().map(|o| o.id.clone()) {
            Some(order_id) => self.cancel_order(&order_id).await,
            None => self.abandon_checkout(),
        }
    }

    /// Starts a fresh sale: empty cart, guest customer, default discount,
    /// no points, then a catalog refresh for server-side stock changes.
    ///
    /// Safe to call repeatedly.
    pub async fn reset(&mut self) -> PosResult<()> {
        if self.state.active_order().is_some() {
            return Err(PosError::invalid_state("start a new sale", self.state.describe()));
        }

        if let Some(handle) = self.wallet_poll.take() {
            handle.cancel();
        }
        self.cart.clear();
        self.customer = Customer::guest();
        self.requested_points = 0;
        self.discount = self.settings.default_discount;
        self.shipping = Money::zero();
        self.category = None;
        self.attempt_key = None;
        self.state = CheckoutState::Idle;
        debug!("Checkout reset");

        self.refresh_products().await
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn ensure_editable(&self, action: &'static str) -> PosResult<()> {
        if self.state.allows_cart_edits() {
            Ok(())
        } else {
            Err(PosError::invalid_state(action, self.state.describe()))
        }
    }

    fn order_request(&self, method: PaymentMethod) -> CreateOrderRequest {
        let totals = self.totals();
        CreateOrderRequest {
            customer_id: self.customer.id.clone(),
            items: self.cart.lines().iter().map(CreateOrderLine::from).collect(),
            discount_percent: self.discount.percentage(),
            tax_percent: self.settings.tax.percentage(),
            shipping_fee: self.shipping,
            payment_method: method,
            points_used: totals.points_used,
        }
    }

    fn start_wallet_poll(&mut self, order_id: &str) {
        self.wallet_poll = Some(WalletPollHandle::start(
            Arc::clone(&self.backend),
            order_id.to_string(),
            self.options.wallet_poll,
        ));
    }

    async fn apply_wallet_outcome(&mut self, outcome: WalletOutcome) -> PosResult<()> {
        let order_id = match self.state.active_order() {
            Some(order) => order.id.clone(),
            None => return Ok(()),
        };

        let reason = match outcome {
            WalletOutcome::Paid(order) => {
                let result = self
                    .backend
                    .complete_order(&order.id, &CompleteOrderRequest::default())
                    .await;
                let completed = match result {
                    Ok(completed) => completed,
                    Err(e) => {
                        // Keep the paid order so a retry completes it
                        self.state = CheckoutState::WalletPending { order };
                        return Err(self.report_failure("Complete order", e));
                    }
                };
                info!(order_id = %completed.id, "Wallet payment completed");
                self.finish(completed, None);
                return Ok(());
            }
            WalletOutcome::Cancelled => return Ok(()),
            WalletOutcome::Failed => CancelReason::PaymentFailed,
            WalletOutcome::TimedOut => CancelReason::TimedOut,
            WalletOutcome::SessionExpired => CancelReason::SessionExpired,
        };

        warn!(order_id = %order_id, reason = ?reason, "Wallet payment ended without payment");
        self.notify(NotificationKind::Error, reason.message());

        if reason == CancelReason::SessionExpired {
            self.state = CheckoutState::Cancelled { order_id, reason };
            return Err(ClientError::SessionExpired.into());
        }

        if let Err(e) = self.backend.cancel_order(&order_id).await {
            warn!(order_id = %order_id, error = %e, "Backend cancel after wallet failure failed");
        }
        self.attempt_key = None;
        self.state = CheckoutState::Cancelled { order_id, reason };
        Ok(())
    }

    fn finish(&mut self, order: Order, cash: Option<CashTender>) -> Receipt {
        let receipt = self.receipt_for(&order, cash);
        self.notify(
            NotificationKind::Success,
            format!("Order {} paid", order.order_number),
        );
        self.attempt_key = None;
        self.state = CheckoutState::Completed {
            receipt: receipt.clone(),
        };
        receipt
    }

    fn receipt_for(&self, order: &Order, cash: Option<CashTender>) -> Receipt {
        let totals = self.totals();
        let lines = if order.lines.is_empty() {
            self.cart.lines().iter().map(|l| l.to_order_line()).collect()
        } else {
            order.lines.clone()
        };
        Receipt {
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            customer_name: order
                .customer_name
                .clone()
                .unwrap_or_else(|| self.customer.name.clone()),
            lines,
            subtotal: totals.subtotal,
            discount: totals.discount,
            tax: totals.tax,
            points_used: order.points_used,
            total: order.total_amount,
            method: order.payment.method,
            cash_received: cash.map(|c| c.received),
            change: cash.map(|c| c.change),
            completed_at: Utc::now(),
        }
    }

    /// Logs a failed backend call and raises it as an error notification.
    fn report_failure(&mut self, action: &str, err: ClientError) -> PosError {
        let err = PosError::from(err);
        if err.is_session_expired() {
            warn!(action, "Session expired");
        } else {
            error!(action, error = %err, "Backend call failed");
        }
        let message = crate::error::UserFacingError::from(&err).message;
        self.notify(NotificationKind::Error, message);
        err
    }

    fn raise_change(&mut self, change: &CartChange) {
        if let Some((kind, message)) = change.notice() {
            self.notify(kind, message);
        }
    }

    pub(crate) fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) {
        let now = tokio::time::Instant::now().into_std();
        self.notifier.push(kind, message, now);
    }
}
