//! # REST API Client
//!
//! reqwest implementation of [`PosBackend`].
//!
//! ## Response Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  send()                                                                 │
//! │    │                                                                    │
//! │    ├── transport failure ──► Network / Timeout                          │
//! │    ├── 401 ───────────────► Session::expire(), SessionExpired           │
//! │    ├── 404 ───────────────► NotFound(message)                           │
//! │    ├── other non-2xx ─────► Backend { status, message | fallback }      │
//! │    └── 2xx ───────────────► JSON (empty body = null) ──► normalize      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No call is retried here. The wallet poll is the only loop, and it lives
//! in `snapbuy-pos`.

use async_trait::async_trait;
use reqwest::header::HeaderName;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use snapbuy_core::{Customer, Order, PosSettings, Product, Shift};

use crate::backend::{
    CloseShiftRequest, CompleteOrderRequest, CreateOrderRequest, NewCustomer, OpenShiftRequest,
    OrderQuery, PosBackend,
};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::normalize;
use crate::session::Session;

/// Header carrying the per-attempt order creation key.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    tenant_header: HeaderName,
    /// Used when the session holds no tenant.
    default_tenant: Option<String>,
    session: Arc<Session>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("tenant_header", &self.tenant_header)
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Arc<Session>) -> ClientResult<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClientError::Config(format!("HTTP client: {}", e)))?;
        let base_url = Url::parse(&config.api.base_url)?;
        let tenant_header = HeaderName::from_bytes(config.api.tenant_header.as_bytes())
            .map_err(|e| ClientError::Config(format!("tenant_header: {}", e)))?;

        info!(base_url = %base_url, "API client ready");
        Ok(ApiClient {
            http,
            base_url,
            tenant_header,
            default_tenant: config.tenant.slug.clone(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    // =========================================================================
    // Request Plumbing
    // =========================================================================

    /// `base_url` + `/api/<segments...>`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self.http.request(method, url);
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        if let Some(tenant) = self.session.tenant().or_else(|| self.default_tenant.clone()) {
            builder = builder.header(self.tenant_header.clone(), tenant);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> ClientResult<Value> {
        let response = builder.send().await?;
        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.text().await?;

        debug!(status = %status, path = %url, "Backend response");

        if status == StatusCode::UNAUTHORIZED {
            self.session.expire();
            return Err(ClientError::SessionExpired);
        }

        if status.is_success() {
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&body)?);
        }

        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| error_message(&v));
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(
                message.unwrap_or_else(|| url.clone()),
            ));
        }

        warn!(status = %status, path = %url, message = ?message, "Backend rejected request");
        Err(ClientError::backend(status.as_u16(), message))
    }

    async fn get(&self, segments: &[&str]) -> ClientResult<Value> {
        let url = self.endpoint(segments)?;
        self.send(self.request(Method::GET, url)).await
    }

    async fn post<B: serde::Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> ClientResult<Value> {
        let url = self.endpoint(segments)?;
        self.send(self.request(Method::POST, url).json(body)).await
    }
}

/// The backend's explanation of a failure: `message`, `error` or
/// `error.message`.
fn error_message(body: &Value) -> Option<String> {
    let direct = ["message", "error", "msg"]
        .iter()
        .find_map(|k| body.get(*k).and_then(Value::as_str));
    direct
        .or_else(|| body.get("error").and_then(|e| e.get("message")).and_then(Value::as_str))
        .map(str::to_string)
}

/// `Ok(None)` for a 404, everything else unchanged.
fn none_if_missing<T>(result: ClientResult<T>) -> ClientResult<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(ClientError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

// =============================================================================
// PosBackend Implementation
// =============================================================================

#[async_trait]
impl PosBackend for ApiClient {
    async fn create_order(
        &self,
        request: &CreateOrderRequest,
        idempotency_key: &str,
    ) -> ClientResult<Order> {
        debug!(
            lines = request.items.len(),
            method = %request.payment_method,
            "Creating order"
        );
        let url = self.endpoint(&["orders"])?;
        let builder = self
            .request(Method::POST, url)
            .header(IDEMPOTENCY_HEADER, idempotency_key)
            .json(request);
        let order = normalize::order_from_value(&self.send(builder).await?)?;
        info!(order_id = %order.id, total = order.total_amount.vnd(), "Order created");
        Ok(order)
    }

    async fn get_order(&self, order_id: &str) -> ClientResult<Order> {
        normalize::order_from_value(&self.get(&["orders", order_id]).await?)
    }

    async fn list_orders(&self, query: &OrderQuery) -> ClientResult<Vec<Order>> {
        let url = self.endpoint(&["orders"])?;
        let builder = self.request(Method::GET, url).query(&query.to_pairs());
        let orders = normalize::orders_from_value(&self.send(builder).await?)?;
        Ok(orders.into_iter().filter(|o| query.matches(o)).collect())
    }

    async fn complete_order(
        &self,
        order_id: &str,
        request: &CompleteOrderRequest,
    ) -> ClientResult<Order> {
        let value = self.post(&["orders", order_id, "complete"], request).await?;
        let order = normalize::order_from_value(&value)?;
        info!(order_id = %order.id, "Order completed");
        Ok(order)
    }

    async fn cancel_order(&self, order_id: &str) -> ClientResult<Order> {
        let value = self
            .post(&["orders", order_id, "cancel"], &serde_json::json!({}))
            .await?;
        let order = normalize::order_from_value(&value)?;
        info!(order_id = %order.id, "Order cancelled");
        Ok(order)
    }

    async fn list_products(&self) -> ClientResult<Vec<Product>> {
        normalize::products_from_value(&self.get(&["products"]).await?)
    }

    async fn product_by_barcode(&self, code: &str) -> ClientResult<Option<Product>> {
        match none_if_missing(self.get(&["products", "barcode", code]).await)? {
            Some(value) if !value.is_null() => normalize::product_from_value(&value).map(Some),
            _ => Ok(None),
        }
    }

    async fn current_shift(&self) -> ClientResult<Option<Shift>> {
        match none_if_missing(self.get(&["pos-shifts", "current"]).await)? {
            Some(value) => normalize::optional_shift_from_value(&value),
            None => Ok(None),
        }
    }

    async fn open_shift(&self, request: &OpenShiftRequest) -> ClientResult<Shift> {
        let value = self.post(&["pos-shifts", "open"], request).await?;
        let shift = normalize::shift_from_value(&value)?;
        info!(shift_id = %shift.id, initial_cash = shift.initial_cash.vnd(), "Shift opened");
        Ok(shift)
    }

    async fn close_shift(
        &self,
        shift_id: &str,
        request: &CloseShiftRequest,
    ) -> ClientResult<Shift> {
        let value = self.post(&["pos-shifts", shift_id, "close"], request).await?;
        let shift = normalize::shift_from_value(&value)?;
        info!(shift_id = %shift.id, counted = request.counted_cash.vnd(), "Shift closed");
        Ok(shift)
    }

    async fn find_customer_by_phone(&self, phone: &str) -> ClientResult<Option<Customer>> {
        let url = self.endpoint(&["customers"])?;
        let builder = self.request(Method::GET, url).query(&[("phone", phone)]);
        match none_if_missing(self.send(builder).await)? {
            Some(value) => normalize::first_customer_from_value(&value),
            None => Ok(None),
        }
    }

    async fn create_customer(&self, customer: &NewCustomer) -> ClientResult<Customer> {
        let value = self.post(&["customers"], customer).await?;
        normalize::customer_from_value(&value)
    }

    async fn pos_settings(&self) -> ClientResult<PosSettings> {
        normalize::settings_from_value(&self.get(&["pos-settings"]).await?)
    }
}
