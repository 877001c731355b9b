//! # snapbuy-pos: Checkout, Payment and Shift Flows
//!
//! The state machines behind the POS screens. A UI layer calls methods on
//! these types in response to clicks and key presses, renders their state,
//! and drains their notifications as toasts.
//!
//! ## Flow Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  sign in ──► check_pos_access(role) ──► RedirectToOpenShift             │
//! │                     │                        │                          │
//! │                     │ Allow                  ▼                          │
//! │                     │                ShiftManager::open_shift           │
//! │                     ▼                                                   │
//! │  BarcodeScanner ──► CheckoutSession ──► cash ────► Completed (receipt)  │
//! │  product grid  ──►   cart + totals  ──► wallet ──► poll ──► Completed   │
//! │                                                       └──► Cancelled    │
//! │                                                                         │
//! │  end of day: ShiftManager::watch_drawer ──► close_shift (reconcile)     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`checkout`] - Cart, customer, totals and the checkout state machine
//! - [`payment`] - Cash tender and the wallet status poll
//! - [`shift`] - Shift open/close, expected drawer, drawer watcher
//! - [`scanner`] - Barcode field handling
//! - [`gate`] - Shift requirement for sales clerks
//! - [`error`] - `PosError` and the UI-facing error shape

pub mod checkout;
pub mod error;
pub mod gate;
pub mod payment;
pub mod scanner;
pub mod shift;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use checkout::{CancelReason, CheckoutOptions, CheckoutSession, CheckoutState};
pub use error::{ErrorCode, PosError, PosResult, UserFacingError};
pub use gate::{check_pos_access, AccessDecision};
pub use payment::{CashTender, PollSchedule, WalletOutcome, WalletPollHandle};
pub use scanner::{BarcodeScanner, ScanPhase};
pub use shift::{expected_drawer, DrawerWatcher, ShiftCloseSummary, ShiftManager};
