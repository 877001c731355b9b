//! In-memory [`PosBackend`] for flow tests.
//!
//! Behaves like the REST backend closely enough for the state machines:
//! orders get ids and numbers, completion decrements stock, one shift can be
//! open at a time. Wallet payment status is scripted per poll.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use snapbuy_client::{
    ClientError, ClientResult, CloseShiftRequest, CompleteOrderRequest, CreateOrderRequest,
    NewCustomer, OpenShiftRequest, OrderQuery, PosBackend,
};
use snapbuy_core::{
    compute_totals, Customer, Money, Order, OrderLine, OrderPayment, OrderStatus, PaymentMethod,
    PaymentStatus, Percent, PosSettings, PricingInput, Product, Shift, ShiftStatus,
    GUEST_CUSTOMER_ID,
};

/// Cashier id stamped on orders and shifts created by the fake.
pub const FAKE_CASHIER: &str = "cashier-1";

/// What the next wallet status poll returns.
#[derive(Debug, Clone)]
pub enum ScriptedPoll {
    Status(PaymentStatus),
    Error(ClientError),
}

/// Number of calls per endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallLog {
    pub create_order: u32,
    pub get_order: u32,
    pub list_orders: u32,
    pub complete_order: u32,
    pub cancel_order: u32,
    pub list_products: u32,
    pub product_by_barcode: u32,
    pub current_shift: u32,
    pub open_shift: u32,
    pub close_shift: u32,
    pub find_customer: u32,
    pub create_customer: u32,
    pub pos_settings: u32,
}

#[derive(Debug, Default)]
struct FakeState {
    products: Vec<Product>,
    customers: Vec<Customer>,
    settings: PosSettings,
    orders: BTreeMap<String, Order>,
    shift: Option<Shift>,
    wallet_script: VecDeque<ScriptedPoll>,
    next_id: u32,
    calls: CallLog,
    idempotency_keys: Vec<String>,
    last_close: Option<CloseShiftRequest>,
    fail_create: Option<ClientError>,
    fail_complete: Option<ClientError>,
    fail_list_orders: Option<ClientError>,
}

impl FakeState {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        FakeBackend::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_products(self, products: Vec<Product>) -> Self {
        self.lock().products = products;
        self
    }

    pub fn with_customers(self, customers: Vec<Customer>) -> Self {
        self.lock().customers = customers;
        self
    }

    pub fn with_settings(self, settings: PosSettings) -> Self {
        self.lock().settings = settings;
        self
    }

    pub fn with_open_shift(self, shift: Shift) -> Self {
        self.lock().shift = Some(shift);
        self
    }

    /// Stores an order as if the backend had created it.
    pub fn insert_order(&self, order: Order) -> Order {
        self.lock().orders.insert(order.id.clone(), order.clone());
        order
    }

    /// Queues wallet poll responses; once exhausted, polls return the order
    /// as stored.
    pub fn script_wallet(&self, polls: Vec<ScriptedPoll>) {
        self.lock().wallet_script.extend(polls);
    }

    pub fn set_stock(&self, product_id: &str, stock: i64) {
        if let Some(p) = self.lock().products.iter_mut().find(|p| p.id == product_id) {
            p.stock = stock;
        }
    }

    pub fn fail_next_create(&self, err: ClientError) {
        self.lock().fail_create = Some(err);
    }

    pub fn fail_next_complete(&self, err: ClientError) {
        self.lock().fail_complete = Some(err);
    }

    pub fn fail_next_list_orders(&self, err: ClientError) {
        self.lock().fail_list_orders = Some(err);
    }

    pub fn calls(&self) -> CallLog {
        self.lock().calls.clone()
    }

    pub fn idempotency_keys(&self) -> Vec<String> {
        self.lock().idempotency_keys.clone()
    }

    pub fn order(&self, order_id: &str) -> Option<Order> {
        self.lock().orders.get(order_id).cloned()
    }

    pub fn product(&self, product_id: &str) -> Option<Product> {
        self.lock().products.iter().find(|p| p.id == product_id).cloned()
    }

    pub fn last_close_request(&self) -> Option<CloseShiftRequest> {
        self.lock().last_close.clone()
    }

    pub fn shift(&self) -> Option<Shift> {
        self.lock().shift.clone()
    }
}

#[async_trait]
impl PosBackend for FakeBackend {
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
        idempotency_key: &str,
    ) -> ClientResult<Order> {
        let mut state = self.lock();
        state.calls.create_order += 1;
        state.idempotency_keys.push(idempotency_key.to_string());
        if let Some(err) = state.fail_create.take() {
            return Err(err);
        }

        let pricing_lines: Vec<(Money, i64)> = request
            .items
            .iter()
            .map(|i| (i.unit_price, i.quantity))
            .collect();
        let totals = compute_totals(&PricingInput {
            lines: &pricing_lines,
            discount: Percent::from_percentage(request.discount_percent),
            tax: Percent::from_percentage(request.tax_percent),
            shipping: request.shipping_fee,
            customer_points: request.points_used,
            requested_points: request.points_used,
        });

        let lines = request
            .items
            .iter()
            .map(|item| OrderLine {
                product_id: item.product_id.clone(),
                name: state
                    .products
                    .iter()
                    .find(|p| p.id == item.product_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| item.product_id.clone()),
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect();
        let customer_name = state
            .customers
            .iter()
            .find(|c| c.id == request.customer_id)
            .map(|c| c.name.clone());

        let n = state.next_id();
        let id = format!("order-{}", n);
        let pay_url = (request.payment_method == PaymentMethod::Wallet)
            .then(|| format!("https://test-payment.momo.vn/pay/{}", id));
        let order = Order {
            id: id.clone(),
            order_number: format!("DH{:04}", n),
            customer_id: request.customer_id.clone(),
            customer_name,
            lines,
            total_amount: totals.total,
            payment_status: PaymentStatus::Unpaid,
            order_status: OrderStatus::Pending,
            payment: OrderPayment {
                method: request.payment_method,
                pay_url,
                amount_received: None,
                change_amount: None,
            },
            points_used: totals.points_used,
            created_by: Some(FAKE_CASHIER.to_string()),
            created_at: Some(Utc::now()),
        };
        state.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, order_id: &str) -> ClientResult<Order> {
        let mut state = self.lock();
        state.calls.get_order += 1;
        let scripted = state.wallet_script.pop_front();
        let order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| ClientError::NotFound(format!("order {}", order_id)))?;
        match scripted {
            Some(ScriptedPoll::Status(status)) => order.payment_status = status,
            Some(ScriptedPoll::Error(err)) => return Err(err),
            None => {}
        }
        Ok(order.clone())
    }

    async fn list_orders(&self, query: &OrderQuery) -> ClientResult<Vec<Order>> {
        let mut state = self.lock();
        state.calls.list_orders += 1;
        if let Some(err) = state.fail_list_orders.take() {
            return Err(err);
        }
        Ok(state
            .orders
            .values()
            .filter(|o| query.matches(o))
            .cloned()
            .collect())
    }

    async fn complete_order(
        &self,
        order_id: &str,
        request: &CompleteOrderRequest,
    ) -> ClientResult<Order> {
        let mut state = self.lock();
        state.calls.complete_order += 1;
        if let Some(err) = state.fail_complete.take() {
            return Err(err);
        }
        let order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| ClientError::NotFound(format!("order {}", order_id)))?;
        if order.order_status != OrderStatus::Pending {
            return Err(ClientError::backend(409, Some("Order is not pending".into())));
        }
        order.payment_status = PaymentStatus::Paid;
        order.order_status = OrderStatus::Completed;
        order.payment.amount_received = request.amount_received;
        order.payment.change_amount = request.change_amount;
        let order = order.clone();

        for line in &order.lines {
            if let Some(p) = state.products.iter_mut().find(|p| p.id == line.product_id) {
                p.stock -= line.quantity;
            }
        }
        Ok(order)
    }

    async fn cancel_order(&self, order_id: &str) -> ClientResult<Order> {
        let mut state = self.lock();
        state.calls.cancel_order += 1;
        let order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| ClientError::NotFound(format!("order {}", order_id)))?;
        if order.order_status == OrderStatus::Completed {
            return Err(ClientError::backend(409, Some("Completed orders cannot be cancelled".into())));
        }
        order.order_status = OrderStatus::Cancelled;
        Ok(order.clone())
    }

    async fn list_products(&self) -> ClientResult<Vec<Product>> {
        let mut state = self.lock();
        state.calls.list_products += 1;
        Ok(state.products.clone())
    }

    async fn product_by_barcode(&self, code: &str) -> ClientResult<Option<Product>> {
        let mut state = self.lock();
        state.calls.product_by_barcode += 1;
        Ok(state
            .products
            .iter()
            .find(|p| p.barcode.as_deref() == Some(code))
            .cloned())
    }

    async fn current_shift(&self) -> ClientResult<Option<Shift>> {
        let mut state = self.lock();
        state.calls.current_shift += 1;
        Ok(state.shift.clone().filter(Shift::is_open))
    }

    async fn open_shift(&self, request: &OpenShiftRequest) -> ClientResult<Shift> {
        let mut state = self.lock();
        state.calls.open_shift += 1;
        if state.shift.as_ref().is_some_and(Shift::is_open) {
            return Err(ClientError::backend(409, Some("You already have an open shift".into())));
        }
        let n = state.next_id();
        let shift = Shift {
            id: format!("shift-{}", n),
            status: ShiftStatus::Open,
            opened_at: Utc::now(),
            initial_cash: request.initial_cash,
            cashier_id: Some(FAKE_CASHIER.to_string()),
            closing_note: None,
            cash_count: None,
        };
        state.shift = Some(shift.clone());
        Ok(shift)
    }

    async fn close_shift(
        &self,
        shift_id: &str,
        request: &CloseShiftRequest,
    ) -> ClientResult<Shift> {
        let mut state = self.lock();
        state.calls.close_shift += 1;
        state.last_close = Some(request.clone());
        let shift = state
            .shift
            .as_mut()
            .filter(|s| s.id == shift_id && s.is_open())
            .ok_or_else(|| ClientError::NotFound(format!("shift {}", shift_id)))?;
        shift.status = ShiftStatus::Closed;
        shift.closing_note = Some(request.closing_note.clone());
        shift.cash_count = Some(request.cash_count.clone());
        Ok(shift.clone())
    }

    async fn find_customer_by_phone(&self, phone: &str) -> ClientResult<Option<Customer>> {
        let mut state = self.lock();
        state.calls.find_customer += 1;
        Ok(state
            .customers
            .iter()
            .find(|c| c.phone.as_deref() == Some(phone))
            .cloned())
    }

    async fn create_customer(&self, customer: &NewCustomer) -> ClientResult<Customer> {
        let mut state = self.lock();
        state.calls.create_customer += 1;
        if state
            .customers
            .iter()
            .any(|c| c.phone.as_deref() == Some(customer.phone.as_str()))
        {
            return Err(ClientError::backend(409, Some("Phone number already registered".into())));
        }
        let n = state.next_id();
        let created = Customer {
            id: format!("cust-{}", n),
            name: customer.full_name.clone(),
            phone: Some(customer.phone.clone()),
            points: 0,
        };
        state.customers.push(created.clone());
        Ok(created)
    }

    async fn pos_settings(&self) -> ClientResult<PosSettings> {
        let mut state = self.lock();
        state.calls.pos_settings += 1;
        Ok(state.settings.clone())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn sample_product(id: &str, price: i64, stock: i64) -> Product {
    Product {
        id: id.to_string(),
        name: format!("Product {}", id),
        barcode: Some(format!("893{}", id)),
        price: Money::from_vnd(price),
        stock,
        category: Some("drinks".to_string()),
    }
}

pub fn sample_customer(id: &str, phone: &str, points: i64) -> Customer {
    Customer {
        id: id.to_string(),
        name: format!("Customer {}", id),
        phone: Some(phone.to_string()),
        points,
    }
}

/// A pending, unpaid guest order.
pub fn sample_order(id: &str, total: i64, method: PaymentMethod) -> Order {
    Order {
        id: id.to_string(),
        order_number: format!("DH-{}", id),
        customer_id: GUEST_CUSTOMER_ID.to_string(),
        customer_name: None,
        lines: vec![],
        total_amount: Money::from_vnd(total),
        payment_status: PaymentStatus::Unpaid,
        order_status: OrderStatus::Pending,
        payment: OrderPayment {
            method,
            pay_url: None,
            amount_received: None,
            change_amount: None,
        },
        points_used: 0,
        created_by: Some(FAKE_CASHIER.to_string()),
        created_at: Some(Utc::now()),
    }
}
