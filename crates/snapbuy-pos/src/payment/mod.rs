//! # Payment Handlers
//!
//! The two ways an order gets paid.
//!
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────────────────┐
//! │  Cash                        │  Wallet (MoMo)                           │
//! │  ────                        │  ─────────────                           │
//! │  cashier types the hand-over │  buyer scans the QR from pay_url         │
//! │  change computed locally     │  status polled every 3s, ≤ 100 times     │
//! │  short hand-over rejected    │  paid ──► complete                       │
//! │  before any request          │  failed / timeout / 401 ──► cancelled    │
//! │  synchronous                 │  background task with a cancel handle    │
//! └──────────────────────────────┴──────────────────────────────────────────┘
//! ```

pub mod cash;
pub mod wallet;

pub use cash::{prepare_cash_tender, CashTender};
pub use wallet::{PollSchedule, PollStep, WalletOutcome, WalletPollHandle, WalletPollTracker};
