//! # Shift Manager
//!
//! Opens and closes cashier shifts and keeps the expected drawer total
//! current while the close dialog is up.
//!
//! ## Drawer Reconciliation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  expected = initial_cash                                                │
//! │           + Σ (received − change)   over completed, paid cash orders    │
//! │                                     by this cashier since opened_at     │
//! │                                                                         │
//! │  counted  = Σ (denomination × quantity)                                 │
//! │                                                                         │
//! │  difference = counted − expected        ≥ 0 ──► Success                 │
//! │                                         < 0 ──► Danger                  │
//! │                                                                         │
//! │  A mismatch is shown, never enforced: the shift closes either way.      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Close Validation Order
//! 1. Closing note present (checked first)
//! 2. Every denomination quantity a non-negative whole number

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use ts_rs::TS;

use snapbuy_client::{
    ClientConfig, ClientError, CloseShiftRequest, OpenShiftRequest, OrderQuery, PosBackend,
};
use snapbuy_core::cash::DrawerReconciliation;
use snapbuy_core::validation::{validate_closing_note, validate_initial_cash};
use snapbuy_core::{CashCount, Money, Order, Shift};

use crate::error::{PosError, PosResult};

/// Default cadence of the expected-drawer refresh.
pub const DRAWER_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Expected drawer total for `shift` given the cashier's order history.
///
/// Orders that are not completed and paid, or that predate the shift, are
/// ignored. Non-cash orders contribute nothing.
pub fn expected_drawer(shift: &Shift, orders: &[Order]) -> Money {
    let sales: Money = orders
        .iter()
        .filter(|o| o.is_completed() && o.is_paid())
        .filter(|o| o.created_at.map_or(true, |at| at >= shift.opened_at))
        .map(Order::cash_in_drawer)
        .sum();
    shift.initial_cash + sales
}

async fn fetch_expected(
    backend: &dyn PosBackend,
    shift: &Shift,
    cashier_id: Option<String>,
) -> PosResult<Money> {
    let query = OrderQuery::drawer(cashier_id, shift.opened_at);
    let orders: Vec<Order> = backend
        .list_orders(&query)
        .await?
        .into_iter()
        .filter(|o| query.matches(o))
        .collect();
    Ok(expected_drawer(shift, &orders))
}

// =============================================================================
// Close Summary
// =============================================================================

/// Result of closing a shift.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ShiftCloseSummary {
    pub shift: Shift,
    pub counted: Money,
    /// `None` when the order history could not be loaded; the close still
    /// went through.
    pub reconciliation: Option<DrawerReconciliation>,
}

// =============================================================================
// Shift Manager
// =============================================================================

pub struct ShiftManager {
    backend: Arc<dyn PosBackend>,
    cashier_id: Option<String>,
    /// Last known open shift.
    current: Option<Shift>,
    drawer_interval: Duration,
}

impl ShiftManager {
    pub fn new(backend: Arc<dyn PosBackend>, cashier_id: Option<String>) -> Self {
        ShiftManager {
            backend,
            cashier_id,
            current: None,
            drawer_interval: DRAWER_POLL_INTERVAL,
        }
    }

    pub fn with_config(mut self, config: &ClientConfig) -> Self {
        self.drawer_interval = config.drawer_poll_interval();
        self
    }

    /// The cached open shift, without asking the backend.
    pub fn cached_shift(&self) -> Option<&Shift> {
        self.current.as_ref()
    }

    /// Opens a shift with `initial_cash` in the drawer.
    ///
    /// The backend rejects a second open shift for the same cashier.
    pub async fn open_shift(&mut self, initial_cash: Money) -> PosResult<Shift> {
        validate_initial_cash(initial_cash)?;
        debug!(initial_cash = initial_cash.vnd(), "Opening shift");

        let shift = self
            .backend
            .open_shift(&OpenShiftRequest { initial_cash })
            .await?;
        info!(shift_id = %shift.id, initial_cash = initial_cash.vnd(), "Shift opened");

        self.current = Some(shift.clone());
        Ok(shift)
    }

    /// The open shift: local cache first, then the backend.
    pub async fn current_shift(&mut self) -> PosResult<Option<Shift>> {
        if let Some(shift) = self.current.as_ref().filter(|s| s.is_open()) {
            return Ok(Some(shift.clone()));
        }
        self.refresh().await
    }

    /// Asks the backend for the open shift, replacing the cache.
    pub async fn refresh(&mut self) -> PosResult<Option<Shift>> {
        let shift = self.backend.current_shift().await?.filter(Shift::is_open);
        debug!(shift_id = ?shift.as_ref().map(|s| s.id.as_str()), "Current shift loaded");
        self.current = shift.clone();
        Ok(shift)
    }

    /// Expected drawer total for `shift`, from the backend's order history.
    pub async fn compute_expected_drawer(&self, shift: &Shift) -> PosResult<Money> {
        fetch_expected(self.backend.as_ref(), shift, self.cashier_for(shift)).await
    }

    /// Starts refreshing the expected drawer every 2 seconds, for the close
    /// dialog.
    pub fn watch_drawer(&self, shift: &Shift) -> DrawerWatcher {
        DrawerWatcher::start(
            Arc::clone(&self.backend),
            shift.clone(),
            self.cashier_for(shift),
            self.drawer_interval,
        )
    }

    /// Closes the open shift with a typed denomination count.
    pub async fn close_shift(&mut self, note: &str, count: &CashCount) -> PosResult<ShiftCloseSummary> {
        let note = validate_closing_note(note)?;
        let mut count = count.clone();
        count.retain_known();
        self.close_validated(note, count).await
    }

    /// Closes the open shift from raw count fields as typed in the dialog.
    ///
    /// The note is validated before any of the count fields.
    pub async fn close_shift_from_inputs(
        &mut self,
        note: &str,
        inputs: &[(i64, &str)],
    ) -> PosResult<ShiftCloseSummary> {
        let note = validate_closing_note(note)?;
        let mut count = CashCount::new();
        for (denomination, input) in inputs {
            count.set_from_input(*denomination, input)?;
        }
        self.close_validated(note, count).await
    }

    async fn close_validated(&mut self, note: String, count: CashCount) -> PosResult<ShiftCloseSummary> {
        let shift = self.current_shift().await?.ok_or(PosError::NoOpenShift)?;
        let counted = count.total();

        let reconciliation = match self.compute_expected_drawer(&shift).await {
            Ok(expected) => Some(DrawerReconciliation::new(expected, counted)),
            Err(e) if e.is_session_expired() => return Err(e),
            Err(e) => {
                warn!(shift_id = %shift.id, error = %e, "Expected drawer unavailable at close");
                None
            }
        };

        let request = CloseShiftRequest {
            closing_note: note,
            counted_cash: counted,
            cash_count: count,
        };
        let closed = self.backend.close_shift(&shift.id, &request).await?;
        self.current = None;

        info!(
            shift_id = %closed.id,
            counted = counted.vnd(),
            difference = ?reconciliation.map(|r| r.difference.vnd()),
            "Shift closed"
        );
        Ok(ShiftCloseSummary {
            shift: closed,
            counted,
            reconciliation,
        })
    }

    fn cashier_for(&self, shift: &Shift) -> Option<String> {
        shift.cashier_id.clone().or_else(|| self.cashier_id.clone())
    }
}

// =============================================================================
// Drawer Watcher
// =============================================================================

/// Background refresh of the expected drawer total.
///
/// Dropping the watcher stops it.
#[derive(Debug)]
pub struct DrawerWatcher {
    expected_rx: watch::Receiver<Option<Money>>,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl DrawerWatcher {
    /// Spawns the refresh loop. The first fetch happens immediately.
    pub fn start(
        backend: Arc<dyn PosBackend>,
        shift: Shift,
        cashier_id: Option<String>,
        interval: Duration,
    ) -> Self {
        let (expected_tx, expected_rx) = watch::channel(None);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match fetch_expected(backend.as_ref(), &shift, cashier_id.clone()).await {
                            Ok(expected) => {
                                expected_tx.send_if_modified(|current| {
                                    let modified = *current != Some(expected);
                                    *current = Some(expected);
                                    modified
                                });
                            }
                            Err(PosError::Client(ClientError::SessionExpired)) => {
                                warn!(shift_id = %shift.id, "Session expired, drawer watch stopped");
                                break;
                            }
                            Err(e) => {
                                warn!(shift_id = %shift.id, error = %e, "Drawer refresh failed");
                            }
                        }
                    }

                    _ = shutdown_rx.recv() => {
                        debug!(shift_id = %shift.id, "Drawer watch stopped");
                        break;
                    }
                }
            }
        });

        DrawerWatcher {
            expected_rx,
            shutdown_tx,
            task,
        }
    }

    /// Latest expected total; `None` until the first fetch succeeds.
    pub fn expected(&self) -> Option<Money> {
        *self.expected_rx.borrow()
    }

    /// Waits for the expected total to change. `None` once the watcher has
    /// stopped.
    pub async fn changed(&mut self) -> Option<Money> {
        self.expected_rx.changed().await.ok()?;
        *self.expected_rx.borrow_and_update()
    }

    pub fn stop(&self) {
        let _ = self.shutdown_tx.try_send(());
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for DrawerWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_order, FakeBackend, FAKE_CASHIER};
    use chrono::{Duration as ChronoDuration, Utc};
    use snapbuy_core::cash::ReconcileCue;
    use snapbuy_core::money::format_signed;
    use snapbuy_core::{
        CoreError, OrderStatus, PaymentMethod, PaymentStatus, ShiftStatus, ValidationError,
    };

    fn paid_cash_order(id: &str, total: i64, received: i64) -> Order {
        let mut order = sample_order(id, total, PaymentMethod::Cash);
        order.payment_status = PaymentStatus::Paid;
        order.order_status = OrderStatus::Completed;
        order.payment.amount_received = Some(Money::from_vnd(received));
        order.payment.change_amount = Some(Money::from_vnd(received - total));
        order
    }

    fn manager(backend: &Arc<FakeBackend>) -> ShiftManager {
        ShiftManager::new(backend.clone(), Some(FAKE_CASHIER.to_string()))
    }

    #[test]
    fn test_expected_drawer_formula() {
        let shift = Shift {
            id: "s-1".into(),
            status: Default::default(),
            opened_at: Utc::now() - ChronoDuration::hours(1),
            initial_cash: Money::from_vnd(200_000),
            cashier_id: None,
            closing_note: None,
            cash_count: None,
        };

        let mut wallet = paid_cash_order("w", 50_000, 50_000);
        wallet.payment.method = PaymentMethod::Wallet;
        let mut before_shift = paid_cash_order("old", 70_000, 70_000);
        before_shift.created_at = Some(shift.opened_at - ChronoDuration::minutes(5));
        let mut pending = paid_cash_order("p", 30_000, 30_000);
        pending.order_status = OrderStatus::Pending;

        let orders = vec![
            paid_cash_order("a", 18_900, 20_000),
            paid_cash_order("b", 100_000, 100_000),
            wallet,
            before_shift,
            pending,
        ];
        assert_eq!(expected_drawer(&shift, &orders).vnd(), 318_900);
    }

    #[tokio::test]
    async fn test_open_shift_rejects_negative_cash() {
        let backend = Arc::new(FakeBackend::new());
        let mut shifts = manager(&backend);

        let err = shifts.open_shift(Money::from_vnd(-1)).await.unwrap_err();
        assert!(matches!(
            err,
            PosError::Core(CoreError::Validation(ValidationError::Negative { .. }))
        ));
        assert_eq!(backend.calls().open_shift, 0);
    }

    #[tokio::test]
    async fn test_current_shift_uses_cache() {
        let backend = Arc::new(FakeBackend::new());
        let mut shifts = manager(&backend);
        assert!(shifts.current_shift().await.unwrap().is_none());

        shifts.open_shift(Money::from_vnd(100_000)).await.unwrap();
        let calls_before = backend.calls().current_shift;
        assert!(shifts.current_shift().await.unwrap().is_some());
        assert_eq!(backend.calls().current_shift, calls_before);
    }

    #[tokio::test]
    async fn test_close_with_short_drawer_still_succeeds() {
        let backend = Arc::new(FakeBackend::new());
        let mut shifts = manager(&backend);
        shifts.open_shift(Money::from_vnd(400_000)).await.unwrap();
        backend.insert_order(paid_cash_order("o-1", 100_000, 100_000));

        let mut count = CashCount::new();
        count.set(200_000, 2).unwrap();
        count.set(50_000, 1).unwrap();
        count.set(20_000, 2).unwrap();
        count.set(5_000, 1).unwrap();

        let summary = shifts.close_shift("end of day", &count).await.unwrap();
        let rec = summary.reconciliation.unwrap();
        assert_eq!(rec.expected.vnd(), 500_000);
        assert_eq!(summary.counted.vnd(), 495_000);
        assert_eq!(rec.difference.vnd(), -5_000);
        assert_eq!(format_signed(rec.difference), "-5.000 ₫");
        assert_eq!(rec.cue, ReconcileCue::Danger);

        assert!(!summary.shift.is_open());
        assert!(shifts.cached_shift().is_none());
        assert_eq!(backend.last_close_request().unwrap().counted_cash.vnd(), 495_000);
    }

    #[tokio::test]
    async fn test_note_checked_before_count() {
        let backend = Arc::new(FakeBackend::new());
        let mut shifts = manager(&backend);
        shifts.open_shift(Money::from_vnd(0)).await.unwrap();

        let err = shifts
            .close_shift_from_inputs("   ", &[(10_000, "-3")])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "closing note is required");

        let err = shifts
            .close_shift_from_inputs("done", &[(10_000, "1.5")])
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("quantity has invalid format"));
        assert_eq!(backend.calls().close_shift, 0);
    }

    #[tokio::test]
    async fn test_close_survives_history_failure() {
        let backend = Arc::new(FakeBackend::new());
        let mut shifts = manager(&backend);
        shifts.open_shift(Money::from_vnd(100_000)).await.unwrap();
        backend.fail_next_list_orders(ClientError::Network("reset".into()));

        let summary = shifts
            .close_shift_from_inputs("ok", &[(100_000, "1")])
            .await
            .unwrap();
        assert!(summary.reconciliation.is_none());
        assert_eq!(summary.counted.vnd(), 100_000);
    }

    #[tokio::test]
    async fn test_shift_opened_elsewhere_is_picked_up() {
        let open = Shift {
            id: "s-remote".into(),
            status: ShiftStatus::Open,
            opened_at: Utc::now() - ChronoDuration::hours(2),
            initial_cash: Money::from_vnd(300_000),
            cashier_id: Some(FAKE_CASHIER.into()),
            closing_note: None,
            cash_count: None,
        };
        let backend = Arc::new(FakeBackend::new().with_open_shift(open));
        let mut shifts = manager(&backend);

        let current = shifts.current_shift().await.unwrap().unwrap();
        assert_eq!(current.id, "s-remote");

        let summary = shifts
            .close_shift_from_inputs("handover", &[(100_000, "3")])
            .await
            .unwrap();
        assert_eq!(summary.reconciliation.unwrap().difference.vnd(), 0);

        let stored = backend.shift().unwrap();
        assert_eq!(stored.status, ShiftStatus::Closed);
        assert_eq!(stored.closing_note.as_deref(), Some("handover"));
        assert!(shifts.current_shift().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_close_without_open_shift() {
        let backend = Arc::new(FakeBackend::new());
        let mut shifts = manager(&backend);
        let err = shifts.close_shift("note", &CashCount::new()).await.unwrap_err();
        assert_eq!(err, PosError::NoOpenShift);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drawer_watcher_tracks_new_sales() {
        let backend = Arc::new(FakeBackend::new());
        let mut shifts = manager(&backend);
        let shift = shifts.open_shift(Money::from_vnd(100_000)).await.unwrap();

        let mut watcher = shifts.watch_drawer(&shift);
        assert_eq!(watcher.changed().await, Some(Money::from_vnd(100_000)));

        backend.insert_order(paid_cash_order("o-1", 18_900, 20_000));
        assert_eq!(watcher.changed().await, Some(Money::from_vnd(118_900)));

        watcher.stop();
        tokio::time::sleep(Duration::from_secs(1)).await;
        let calls = backend.calls().list_orders;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(backend.calls().list_orders, calls);
        assert!(watcher.is_stopped());
    }
}
