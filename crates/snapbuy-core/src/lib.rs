//! # snapbuy-core: Pure Business Logic for the SnapBuy POS client
//!
//! Everything the checkout screen computes locally lives here: the cart,
//! the totals shown next to it, the cash drawer count and the checks run
//! before anything is sent to the backend.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      SnapBuy POS Client                                 │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 snapbuy-pos (flows)                             │   │
//! │  │    Checkout ──► Cash / Wallet ──► Receipt      Shift open/close │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ snapbuy-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ │   │
//! │  │   │  money  │ │  cart   │ │ pricing │ │  cash   │ │validation│ │   │
//! │  │   │  VND    │ │CartLine │ │ Totals  │ │ Denoms  │ │  phone   │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO TIMERS • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                snapbuy-client (REST backend)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Order, Shift, ...)
//! - [`money`] - VND money, percentages, display formatting and parsing
//! - [`cart`] - Cart lines bounded by stock
//! - [`pricing`] - Discount, tax and loyalty-point totals
//! - [`cash`] - Banknote denominations and drawer counts
//! - [`notify`] - De-duplicated user notifications
//! - [`validation`] - Input rules checked before any backend call
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use snapbuy_core::money::{Money, Percent};
//! use snapbuy_core::pricing::{compute_totals, PricingInput};
//!
//! let lines = [(Money::from_vnd(10_000), 2)];
//! let totals = compute_totals(&PricingInput {
//!     lines: &lines,
//!     discount: Percent::from_percentage(10.0),
//!     tax: Percent::from_percentage(5.0),
//!     shipping: Money::zero(),
//!     customer_points: 0,
//!     requested_points: 0,
//! });
//! assert_eq!(totals.total.vnd(), 18_900);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod cash;
pub mod error;
pub mod money;
pub mod notify;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartChange, CartLine};
pub use cash::{CashCount, DENOMINATIONS};
pub use error::{CoreError, ValidationError};
pub use money::{Money, Percent};
pub use notify::{Notification, NotificationKind, Notifier};
pub use pricing::{compute_totals, PricingInput, Totals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Customer id the backend reserves for walk-in buyers.
pub const GUEST_CUSTOMER_ID: &str = "guest";

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;
