//! # Barcode Scanner
//!
//! A barcode gun is a keyboard: it types the code into the focused field
//! and presses Enter.
//!
//! ```text
//! Idle ──input──► Scanning ──submit──► lookup ─┬─► Resolved  (cart += 1, field cleared)
//!                                              └─► NotFound  (field kept for correction)
//!
//! Either way: category filter reset to "all", field refocused.
//! ```

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use ts_rs::TS;

use snapbuy_client::PosBackend;
use snapbuy_core::validation::validate_barcode;
use snapbuy_core::{CartChange, NotificationKind};

use crate::checkout::CheckoutSession;
use crate::error::{PosError, PosResult};

const FOCUS_HINT: &str = "Click the barcode field before scanning";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "phase", rename_all = "snake_case")]
#[ts(export)]
pub enum ScanPhase {
    Idle,
    Scanning,
    Resolved { product_id: String },
    NotFound { code: String },
}

pub struct BarcodeScanner {
    backend: Arc<dyn PosBackend>,
    buffer: String,
    focused: bool,
    phase: ScanPhase,
}

impl BarcodeScanner {
    pub fn new(backend: Arc<dyn PosBackend>) -> Self {
        BarcodeScanner {
            backend,
            buffer: String::new(),
            focused: false,
            phase: ScanPhase::Idle,
        }
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn phase(&self) -> &ScanPhase {
        &self.phase
    }

    /// Appends typed characters. Rejected with a warning unless the field
    /// has focus.
    pub fn input(&mut self, session: &mut CheckoutSession, text: &str) -> PosResult<()> {
        self.ensure_focused(session)?;
        self.buffer.push_str(text);
        self.phase = ScanPhase::Scanning;
        Ok(())
    }

    /// Looks the buffered code up and adds the product to the cart.
    pub async fn submit(&mut self, session: &mut CheckoutSession) -> PosResult<CartChange> {
        self.ensure_focused(session)?;
        session.set_category(None);

        let code = match validate_barcode(&self.buffer) {
            Ok(code) => code,
            Err(e) => {
                session.notify(NotificationKind::Warning, e.to_string());
                return Err(e.into());
            }
        };
        debug!(code = %code, "Looking up barcode");

        let product = match self.backend.product_by_barcode(&code).await {
            Ok(Some(product)) => product,
            Ok(None) => {
                warn!(code = %code, "Barcode not found");
                session.notify(
                    NotificationKind::Error,
                    format!("No product with barcode {}", code),
                );
                self.phase = ScanPhase::NotFound { code: code.clone() };
                self.focused = true;
                return Err(PosError::ProductNotFound(code));
            }
            Err(e) => {
                let err = PosError::from(e);
                warn!(code = %code, error = %err, "Barcode lookup failed");
                session.notify(
                    NotificationKind::Error,
                    crate::error::UserFacingError::from(&err).message,
                );
                self.phase = ScanPhase::NotFound { code };
                self.focused = true;
                return Err(err);
            }
        };

        info!(code = %code, product_id = %product.id, "Barcode resolved");
        self.buffer.clear();
        self.focused = true;
        self.phase = ScanPhase::Resolved {
            product_id: product.id.clone(),
        };
        session.add_product(&product)
    }

    fn ensure_focused(&self, session: &mut CheckoutSession) -> PosResult<()> {
        if self.focused {
            return Ok(());
        }
        session.notify(NotificationKind::Warning, FOCUS_HINT);
        Err(PosError::invalid_state("scan", "the barcode field is not focused"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::CheckoutOptions;
    use crate::testing::{sample_product, FakeBackend};

    async fn setup() -> (Arc<FakeBackend>, CheckoutSession, BarcodeScanner) {
        let backend = Arc::new(FakeBackend::new().with_products(vec![sample_product("p-1", 10_000, 5)]));
        let mut session = CheckoutSession::new(backend.clone(), CheckoutOptions::default());
        session.load().await.unwrap();
        let scanner = BarcodeScanner::new(backend.clone());
        (backend, session, scanner)
    }

    #[tokio::test]
    async fn test_unfocused_input_rejected() {
        let (_, mut session, mut scanner) = setup().await;

        assert!(scanner.input(&mut session, "893p-1").is_err());
        assert_eq!(scanner.buffer(), "");
        let notes = session.drain_notifications();
        assert_eq!(notes[0].message, FOCUS_HINT);
        assert_eq!(notes[0].kind, NotificationKind::Warning);
    }

    #[tokio::test]
    async fn test_resolved_scan_adds_and_clears() {
        let (_, mut session, mut scanner) = setup().await;
        session.set_category(Some("snacks".into()));
        scanner.focus();

        scanner.input(&mut session, "893p-1").unwrap();
        let change = scanner.submit(&mut session).await.unwrap();

        assert!(matches!(change, CartChange::Added { .. }));
        assert_eq!(session.cart().line("p-1").unwrap().quantity, 1);
        assert_eq!(scanner.buffer(), "");
        assert!(scanner.is_focused());
        assert_eq!(session.category(), None);
    }

    #[tokio::test]
    async fn test_unknown_code_keeps_buffer() {
        let (backend, mut session, mut scanner) = setup().await;
        session.set_category(Some("drinks".into()));
        scanner.focus();

        scanner.input(&mut session, "000000").unwrap();
        let err = scanner.submit(&mut session).await.unwrap_err();

        assert_eq!(err, PosError::ProductNotFound("000000".into()));
        assert_eq!(scanner.buffer(), "000000");
        assert_eq!(
            scanner.phase(),
            &ScanPhase::NotFound {
                code: "000000".into()
            }
        );
        assert!(scanner.is_focused());
        assert_eq!(session.category(), None);
        assert!(session.cart().is_empty());
        assert_eq!(backend.calls().product_by_barcode, 1);
    }

    #[tokio::test]
    async fn test_empty_submit_makes_no_request() {
        let (backend, mut session, mut scanner) = setup().await;
        scanner.focus();

        assert!(scanner.submit(&mut session).await.is_err());
        assert_eq!(backend.calls().product_by_barcode, 0);
    }
}
