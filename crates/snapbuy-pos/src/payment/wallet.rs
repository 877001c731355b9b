//! # Wallet Payment Poll
//!
//! After a wallet order is created the buyer pays on their phone; the POS
//! only learns about it by asking the backend for the order's payment
//! status on a fixed cadence.
//!
//! ## Poll Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  start() ──► spawn ──► tick every 3s ──► GET /api/orders/{id}           │
//! │                              │                                          │
//! │             ┌────────────────┼────────────────┬──────────────┐          │
//! │             ▼                ▼                ▼              ▼          │
//! │           unpaid           paid            failed           401         │
//! │        (or network       ──► Paid        ──► Failed   ──► SessionExpired│
//! │          error)                                                         │
//! │             │                                                           │
//! │     attempt 100? ──► TimedOut                                           │
//! │                                                                         │
//! │  cancel() / drop(handle) ──► Cancelled                                  │
//! │                                                                         │
//! │  Exactly one outcome is produced; the task ends with it.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The decision logic is the synchronous [`WalletPollTracker`], so it can be
//! tested without timers; [`WalletPollHandle`] wraps it in a tokio task.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use snapbuy_client::{ClientConfig, ClientError, ClientResult, PosBackend};
use snapbuy_core::{Order, PaymentStatus};

// =============================================================================
// Schedule
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollSchedule {
    pub fn from_config(config: &ClientConfig) -> Self {
        PollSchedule {
            interval: config.wallet_poll_interval(),
            max_attempts: config.polling.wallet_max_attempts,
        }
    }
}

impl Default for PollSchedule {
    /// 3 seconds × 100 attempts = 5 minutes.
    fn default() -> Self {
        PollSchedule {
            interval: Duration::from_secs(3),
            max_attempts: 100,
        }
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// How a wallet payment attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum WalletOutcome {
    /// Backend reports the order paid; it still has to be completed.
    Paid(Order),
    Failed,
    TimedOut,
    SessionExpired,
    /// Poll stopped by the POS before any of the above.
    Cancelled,
}

impl WalletOutcome {
    /// The message shown to the cashier.
    pub fn message(&self) -> &'static str {
        match self {
            WalletOutcome::Paid(_) => "Wallet payment received",
            WalletOutcome::Failed => "Wallet payment failed. Please choose another payment method.",
            WalletOutcome::TimedOut => "Wallet payment timed out. The order was not paid.",
            WalletOutcome::SessionExpired => "Your session has expired. Please sign in again.",
            WalletOutcome::Cancelled => "Wallet payment cancelled",
        }
    }
}

// =============================================================================
// Tracker
// =============================================================================

/// Result of feeding one poll response to the tracker.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStep {
    /// Keep polling.
    Continue,
    Paid(Order),
    Failed,
    TimedOut,
    SessionExpired,
    /// A terminal step was already reported; ignore this response.
    Finished,
}

impl PollStep {
    fn into_outcome(self) -> Option<WalletOutcome> {
        match self {
            PollStep::Continue => None,
            PollStep::Paid(order) => Some(WalletOutcome::Paid(order)),
            PollStep::Failed => Some(WalletOutcome::Failed),
            PollStep::TimedOut => Some(WalletOutcome::TimedOut),
            PollStep::SessionExpired => Some(WalletOutcome::SessionExpired),
            PollStep::Finished => Some(WalletOutcome::Cancelled),
        }
    }
}

/// Counts attempts and decides when polling stops.
///
/// ## Invariants
/// - At most one terminal step is ever returned
/// - `attempts() <= max_attempts`
#[derive(Debug, Clone)]
pub struct WalletPollTracker {
    max_attempts: u32,
    attempts: u32,
    finished: bool,
}

impl WalletPollTracker {
    pub fn new(max_attempts: u32) -> Self {
        WalletPollTracker {
            max_attempts: max_attempts.max(1),
            attempts: 0,
            finished: false,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feeds one poll response.
    ///
    /// Transport and backend errors other than 401 count as an attempt and
    /// keep the poll going.
    pub fn observe(&mut self, response: ClientResult<Order>) -> PollStep {
        if self.finished {
            return PollStep::Finished;
        }
        self.attempts += 1;

        let step = match response {
            Ok(order) => match order.payment_status {
                PaymentStatus::Paid => PollStep::Paid(order),
                PaymentStatus::Failed => PollStep::Failed,
                PaymentStatus::Unpaid => PollStep::Continue,
            },
            Err(ClientError::SessionExpired) => PollStep::SessionExpired,
            Err(e) => {
                warn!(attempt = self.attempts, error = %e, "Wallet status poll failed");
                PollStep::Continue
            }
        };

        let step = if step == PollStep::Continue && self.attempts >= self.max_attempts {
            PollStep::TimedOut
        } else {
            step
        };

        if step != PollStep::Continue {
            self.finished = true;
        }
        step
    }
}

// =============================================================================
// Poll Task
// =============================================================================

/// Handle to a running wallet poll.
///
/// Dropping the handle cancels the poll.
#[derive(Debug)]
pub struct WalletPollHandle {
    order_id: String,
    shutdown_tx: mpsc::Sender<()>,
    outcome_rx: Option<oneshot::Receiver<WalletOutcome>>,
    task: JoinHandle<()>,
}

impl WalletPollHandle {
    /// Spawns the poll for `order_id`. The first request goes out one
    /// interval after the call.
    pub fn start(backend: Arc<dyn PosBackend>, order_id: String, schedule: PollSchedule) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (outcome_tx, outcome_rx) = oneshot::channel();

        info!(order_id = %order_id, interval = ?schedule.interval, max_attempts = schedule.max_attempts, "Starting wallet poll");
        let task = tokio::spawn(run_poll(
            backend,
            order_id.clone(),
            schedule,
            shutdown_rx,
            outcome_tx,
        ));

        WalletPollHandle {
            order_id,
            shutdown_tx,
            outcome_rx: Some(outcome_rx),
            task,
        }
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    /// Stops the poll. A request already in flight finishes and is ignored.
    pub fn cancel(&self) {
        let _ = self.shutdown_tx.try_send(());
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the poll to end. Returns `Cancelled` if called twice.
    pub async fn outcome(&mut self) -> WalletOutcome {
        match self.outcome_rx.take() {
            Some(rx) => rx.await.unwrap_or(WalletOutcome::Cancelled),
            None => WalletOutcome::Cancelled,
        }
    }

    /// The outcome if the poll has already ended, without waiting.
    pub fn try_outcome(&mut self) -> Option<WalletOutcome> {
        let rx = self.outcome_rx.as_mut()?;
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => WalletOutcome::Cancelled,
        };
        self.outcome_rx = None;
        Some(outcome)
    }
}

impl Drop for WalletPollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_poll(
    backend: Arc<dyn PosBackend>,
    order_id: String,
    schedule: PollSchedule,
    mut shutdown_rx: mpsc::Receiver<()>,
    outcome_tx: oneshot::Sender<WalletOutcome>,
) {
    let mut tracker = WalletPollTracker::new(schedule.max_attempts);
    let mut interval = tokio::time::interval_at(Instant::now() + schedule.interval, schedule.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let outcome = loop {
        tokio::select! {
            _ = interval.tick() => {
                let response = backend.get_order(&order_id).await;
                debug!(order_id = %order_id, attempt = tracker.attempts() + 1, "Polled wallet status");
                if let Some(outcome) = tracker.observe(response).into_outcome() {
                    break outcome;
                }
            }

            _ = shutdown_rx.recv() => {
                break WalletOutcome::Cancelled;
            }
        }
    };

    info!(
        order_id = %order_id,
        attempts = tracker.attempts(),
        outcome = outcome.message(),
        "Wallet poll finished"
    );
    let _ = outcome_tx.send(outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_order, FakeBackend, ScriptedPoll};
    use snapbuy_core::PaymentMethod;

    fn with_status(status: PaymentStatus) -> ClientResult<Order> {
        let mut order = sample_order("o-1", 18_900, PaymentMethod::Wallet);
        order.payment_status = status;
        Ok(order)
    }

    #[test]
    fn test_failed_on_fourth_tick_reported_once() {
        let mut tracker = WalletPollTracker::new(100);

        for _ in 0..3 {
            assert_eq!(tracker.observe(with_status(PaymentStatus::Unpaid)), PollStep::Continue);
        }
        assert_eq!(tracker.observe(with_status(PaymentStatus::Failed)), PollStep::Failed);
        assert_eq!(tracker.attempts(), 4);

        // Later responses never produce a second failure
        assert_eq!(tracker.observe(with_status(PaymentStatus::Failed)), PollStep::Finished);
        assert_eq!(tracker.attempts(), 4);
    }

    #[test]
    fn test_times_out_after_max_attempts() {
        let mut tracker = WalletPollTracker::new(3);
        assert_eq!(tracker.observe(with_status(PaymentStatus::Unpaid)), PollStep::Continue);
        assert_eq!(tracker.observe(with_status(PaymentStatus::Unpaid)), PollStep::Continue);
        assert_eq!(tracker.observe(with_status(PaymentStatus::Unpaid)), PollStep::TimedOut);
        assert!(tracker.is_finished());
    }

    #[test]
    fn test_paid_on_last_attempt_wins_over_timeout() {
        let mut tracker = WalletPollTracker::new(1);
        assert!(matches!(
            tracker.observe(with_status(PaymentStatus::Paid)),
            PollStep::Paid(_)
        ));
    }

    #[test]
    fn test_errors_keep_polling_except_401() {
        let mut tracker = WalletPollTracker::new(100);
        assert_eq!(
            tracker.observe(Err(ClientError::Network("reset".into()))),
            PollStep::Continue
        );
        assert_eq!(
            tracker.observe(Err(ClientError::SessionExpired)),
            PollStep::SessionExpired
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_task_stops_after_failure() {
        let backend = Arc::new(FakeBackend::new());
        let order = backend.insert_order(sample_order("o-1", 18_900, PaymentMethod::Wallet));
        backend.script_wallet(vec![
            ScriptedPoll::Status(PaymentStatus::Unpaid),
            ScriptedPoll::Status(PaymentStatus::Unpaid),
            ScriptedPoll::Status(PaymentStatus::Unpaid),
            ScriptedPoll::Status(PaymentStatus::Failed),
        ]);

        let started = Instant::now();
        let mut handle = WalletPollHandle::start(backend.clone(), order.id, PollSchedule::default());

        assert_eq!(handle.outcome().await, WalletOutcome::Failed);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(12) && elapsed < Duration::from_secs(13));

        // No ticks after the terminal outcome
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.calls().get_order, 4);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_task_times_out() {
        let backend = Arc::new(FakeBackend::new());
        let order = backend.insert_order(sample_order("o-1", 18_900, PaymentMethod::Wallet));
        let schedule = PollSchedule {
            interval: Duration::from_secs(3),
            max_attempts: 5,
        };

        let mut handle = WalletPollHandle::start(backend.clone(), order.id, schedule);
        assert_eq!(handle.outcome().await, WalletOutcome::TimedOut);
        assert_eq!(backend.calls().get_order, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_poll() {
        let backend = Arc::new(FakeBackend::new());
        let order = backend.insert_order(sample_order("o-1", 18_900, PaymentMethod::Wallet));

        let mut handle = WalletPollHandle::start(backend.clone(), order.id, PollSchedule::default());
        tokio::time::sleep(Duration::from_millis(6_500)).await;
        handle.cancel();

        assert_eq!(handle.outcome().await, WalletOutcome::Cancelled);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.calls().get_order, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_outcome_before_and_after_finish() {
        let backend = Arc::new(FakeBackend::new());
        let order = backend.insert_order(sample_order("o-1", 18_900, PaymentMethod::Wallet));
        backend.script_wallet(vec![ScriptedPoll::Status(PaymentStatus::Paid)]);

        let mut handle = WalletPollHandle::start(backend.clone(), order.id, PollSchedule::default());
        assert_eq!(handle.try_outcome(), None);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(matches!(handle.try_outcome(), Some(WalletOutcome::Paid(_))));
        assert_eq!(handle.try_outcome(), None);
    }
}
