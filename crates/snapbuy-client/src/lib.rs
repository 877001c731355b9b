//! # snapbuy-client: REST Backend Client
//!
//! The only crate in the workspace that performs I/O. It loads the client
//! configuration, keeps the auth token and tenant slug, talks to the SnapBuy
//! REST backend and turns every response into a `snapbuy-core` type.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  snapbuy-pos                                                            │
//! │      │  PosBackend::create_order(req, key)                              │
//! │      ▼                                                                  │
//! │  ApiClient ──► Authorization: Bearer <token>                            │
//! │      │         X-Tenant-ID: <slug>                                      │
//! │      │         Idempotency-Key: <uuid>  (create order only)             │
//! │      ▼                                                                  │
//! │  HTTP status                                                            │
//! │   ├── 2xx ──► normalize::order_from_value ──► Order                     │
//! │   ├── 401 ──► Session::expire() ──► ClientError::SessionExpired         │
//! │   ├── 404 ──► ClientError::NotFound (barcode/current shift ──► None)    │
//! │   └── else ─► ClientError::Backend { status, message }                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`] - reqwest implementation of [`PosBackend`]
//! - [`backend`] - The backend trait and request bodies
//! - [`config`] - `pos.toml` + environment configuration
//! - [`error`] - Client error types
//! - [`normalize`] - Heterogeneous payloads to canonical types
//! - [`session`] - Token/tenant stores and session expiry

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod normalize;
pub mod session;

pub use api::ApiClient;
pub use backend::{
    CloseShiftRequest, CompleteOrderRequest, CreateOrderLine, CreateOrderRequest, NewCustomer,
    OpenShiftRequest, OrderQuery, PosBackend,
};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use session::{
    tenant_from_host, FileStore, MemoryTenantStore, MemoryTokenStore, Session, TenantStore,
    TokenStore, UserIdentity,
};
