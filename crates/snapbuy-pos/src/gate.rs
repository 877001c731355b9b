//! POS access gate.
//!
//! Sales clerks may only sell inside an open shift; admins and managers are
//! let through without a check.

use serde::Serialize;
use tracing::info;
use ts_rs::TS;

use snapbuy_core::Role;

use crate::error::PosResult;
use crate::shift::ShiftManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AccessDecision {
    Allow,
    /// Show the open-shift screen instead of the POS.
    RedirectToOpenShift,
}

/// Decides whether `role` may enter the POS screens right now.
pub async fn check_pos_access(role: Role, shifts: &mut ShiftManager) -> PosResult<AccessDecision> {
    if !role.requires_open_shift() {
        return Ok(AccessDecision::Allow);
    }

    match shifts.current_shift().await? {
        Some(_) => Ok(AccessDecision::Allow),
        None => {
            info!(role = ?role, "No open shift, redirecting to shift opening");
            Ok(AccessDecision::RedirectToOpenShift)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBackend, FAKE_CASHIER};
    use snapbuy_client::ClientError;
    use snapbuy_core::Money;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_manager_skips_shift_check() {
        let backend = Arc::new(FakeBackend::new());
        let mut shifts = ShiftManager::new(backend.clone(), None);

        let decision = check_pos_access(Role::Manager, &mut shifts).await.unwrap();
        assert_eq!(decision, AccessDecision::Allow);
        assert_eq!(backend.calls().current_shift, 0);
    }

    #[tokio::test]
    async fn test_salesman_needs_open_shift() {
        let backend = Arc::new(FakeBackend::new());
        let mut shifts = ShiftManager::new(backend.clone(), Some(FAKE_CASHIER.into()));

        assert_eq!(
            check_pos_access(Role::Salesman, &mut shifts).await.unwrap(),
            AccessDecision::RedirectToOpenShift
        );

        shifts.open_shift(Money::from_vnd(500_000)).await.unwrap();
        assert_eq!(
            check_pos_access(Role::Salesman, &mut shifts).await.unwrap(),
            AccessDecision::Allow
        );
    }

    #[tokio::test]
    async fn test_duplicate_open_reported_by_backend() {
        let backend = Arc::new(FakeBackend::new());
        let mut shifts = ShiftManager::new(backend.clone(), None);
        shifts.open_shift(Money::zero()).await.unwrap();

        let err = shifts.open_shift(Money::zero()).await.unwrap_err();
        assert!(matches!(err, crate::error::PosError::Client(ClientError::Backend { status: 409, .. })));
    }
}
