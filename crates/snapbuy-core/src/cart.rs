//! # Cart Model
//!
//! The in-memory list of lines being rung up.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  UI Action                Operation               Result                │
//! │  ─────────                ─────────               ──────                │
//! │                                                                         │
//! │  Click / scan product ──► add_product() ───────► Added / Updated        │
//! │                                                  OutOfStock (stock 0)   │
//! │                                                  StockExceeded          │
//! │                                                                         │
//! │  Quantity stepper ──────► set_quantity() ──────► Updated / Clamped      │
//! │                                                  Removed (qty 0)        │
//! │                                                  Unchanged (silent)     │
//! │                                                                         │
//! │  Click remove ──────────► remove_line() ───────► Removed                │
//! │                                                                         │
//! │  Order done/cancelled ──► clear() ─────────────► Cleared                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id`
//! - `1 <= quantity <= stock_ceiling` for every line held
//!
//! Every operation returns a [`CartChange`] the caller turns into a
//! notification for the UI.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::notify::NotificationKind;
use crate::types::{OrderLine, Product};
use crate::MAX_CART_LINES;

// =============================================================================
// Cart Line
// =============================================================================

/// One product in the cart.
///
/// Name and price are frozen when the line is created so the cart does not
/// shift under the cashier if the catalog is refreshed mid-sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub stock_ceiling: i64,
}

impl CartLine {
    fn from_product(product: &Product) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity: 1,
            stock_ceiling: product.stock.max(0),
        }
    }

    /// unit price × quantity
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    pub fn to_order_line(&self) -> OrderLine {
        OrderLine {
            product_id: self.product_id.clone(),
            name: self.name.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price,
        }
    }
}

// =============================================================================
// Cart Change
// =============================================================================

/// What a cart operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartChange {
    Added { name: String },
    Updated { name: String, quantity: i64 },
    /// Requested quantity was above stock; the line now holds `quantity`.
    Clamped { name: String, quantity: i64 },
    Removed { name: String },
    Cleared,
    /// Requested quantity equals the current one.
    Unchanged,
}

impl CartChange {
    /// The notification the UI should raise for this change, if any.
    pub fn notice(&self) -> Option<(NotificationKind, String)> {
        match self {
            CartChange::Added { name } => {
                Some((NotificationKind::Success, format!("Added {} to cart", name)))
            }
            CartChange::Updated { name, quantity } => Some((
                NotificationKind::Info,
                format!("{} quantity set to {}", name, quantity),
            )),
            CartChange::Clamped { name, quantity } => Some((
                NotificationKind::Warning,
                format!("Only {} {} left in stock", quantity, name),
            )),
            CartChange::Removed { name } => {
                Some((NotificationKind::Info, format!("Removed {} from cart", name)))
            }
            CartChange::Cleared | CartChange::Unchanged => None,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds one unit of a product.
    ///
    /// ## Behavior
    /// - Product already in cart: quantity + 1, unless that passes stock
    /// - Stock now below the line's quantity: line clamped to stock, `Clamped`
    /// - Product not in cart: new line with quantity 1
    /// - Stock 0: rejected, cart untouched
    pub fn add_product(&mut self, product: &Product) -> CoreResult<CartChange> {
        if product.stock <= 0 {
            return Err(CoreError::OutOfStock {
                name: product.name.clone(),
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            // Stock may have moved since the line was created
            line.stock_ceiling = product.stock;
            if line.quantity > line.stock_ceiling {
                line.quantity = line.stock_ceiling;
                return Ok(CartChange::Clamped {
                    name: line.name.clone(),
                    quantity: line.quantity,
                });
            }
            if line.quantity + 1 > line.stock_ceiling {
                return Err(CoreError::StockExceeded {
                    name: line.name.clone(),
                    available: line.stock_ceiling,
                });
            }
            line.quantity += 1;
            return Ok(CartChange::Updated {
                name: line.name.clone(),
                quantity: line.quantity,
            });
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        let line = CartLine::from_product(product);
        let name = line.name.clone();
        self.lines.push(line);
        Ok(CartChange::Added { name })
    }

    /// Sets the quantity of a line, clamped to `[0, stock_ceiling]`.
    ///
    /// ## Behavior
    /// - Clamped value 0: line removed
    /// - Same as current: `Unchanged`, so the UI stays quiet
    /// - Above stock: line set to stock, `Clamped` so the UI warns
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<CartChange> {
        let index = self
            .lines
            .iter()
            .position(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::LineNotFound(product_id.to_string()))?;

        let line = &mut self.lines[index];
        if quantity == line.quantity {
            return Ok(CartChange::Unchanged);
        }

        let clamped = quantity.clamp(0, line.stock_ceiling);
        if clamped == 0 {
            let removed = self.lines.remove(index);
            return Ok(CartChange::Removed { name: removed.name });
        }

        line.quantity = clamped;
        if clamped < quantity {
            return Ok(CartChange::Clamped {
                name: line.name.clone(),
                quantity: clamped,
            });
        }
        Ok(CartChange::Updated {
            name: line.name.clone(),
            quantity: clamped,
        })
    }

    pub fn remove_line(&mut self, product_id: &str) -> CoreResult<CartChange> {
        let index = self
            .lines
            .iter()
            .position(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::LineNotFound(product_id.to_string()))?;
        let removed = self.lines.remove(index);
        Ok(CartChange::Removed { name: removed.name })
    }

    pub fn clear(&mut self) -> CartChange {
        self.lines.clear();
        CartChange::Cleared
    }

    /// Re-applies stock from a refreshed catalog.
    ///
    /// Lines whose product sold out elsewhere are clamped (or dropped at 0).
    /// Products missing from the catalog keep their current ceiling.
    pub fn refresh_stock(&mut self, products: &[Product]) -> Vec<CartChange> {
        let mut changes = Vec::new();
        self.lines.retain_mut(|line| {
            let Some(product) = products.iter().find(|p| p.id == line.product_id) else {
                return true;
            };
            line.stock_ceiling = product.stock.max(0);
            if line.stock_ceiling == 0 {
                changes.push(CartChange::Removed {
                    name: line.name.clone(),
                });
                return false;
            }
            if line.quantity > line.stock_ceiling {
                line.quantity = line.stock_ceiling;
                changes.push(CartChange::Clamped {
                    name: line.name.clone(),
                    quantity: line.quantity,
                });
            }
            true
        });
        changes
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// `(unit price, quantity)` pairs for the pricing calculator.
    pub fn pricing_lines(&self) -> Vec<(Money, i64)> {
        self.lines.iter().map(|l| (l.unit_price, l.quantity)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            barcode: None,
            price: Money::from_vnd(price),
            stock,
            category: None,
        }
    }

    fn assert_within_stock(cart: &Cart) {
        for line in cart.lines() {
            assert!(line.quantity >= 1 && line.quantity <= line.stock_ceiling);
        }
    }

    #[test]
    fn test_add_new_and_existing() {
        let mut cart = Cart::new();
        let p = product("1", 10_000, 5);

        assert!(matches!(cart.add_product(&p).unwrap(), CartChange::Added { .. }));
        assert!(matches!(
            cart.add_product(&p).unwrap(),
            CartChange::Updated { quantity: 2, .. }
        ));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.subtotal().vnd(), 20_000);
    }

    #[test]
    fn test_add_out_of_stock_is_rejected() {
        let mut cart = Cart::new();
        let err = cart.add_product(&product("1", 10_000, 0)).unwrap_err();
        assert!(matches!(err, CoreError::OutOfStock { .. }));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_beyond_stock_is_rejected() {
        let mut cart = Cart::new();
        let p = product("1", 10_000, 2);
        cart.add_product(&p).unwrap();
        cart.add_product(&p).unwrap();

        let err = cart.add_product(&p).unwrap_err();
        assert!(matches!(err, CoreError::StockExceeded { available: 2, .. }));
        assert_eq!(cart.line("1").unwrap().quantity, 2);
        assert_within_stock(&cart);
    }

    #[test]
    fn test_add_with_lower_stock_clamps_line() {
        let mut cart = Cart::new();
        let p = product("1", 10_000, 5);
        for _ in 0..4 {
            cart.add_product(&p).unwrap();
        }

        let change = cart.add_product(&product("1", 10_000, 2)).unwrap();
        assert_eq!(
            change,
            CartChange::Clamped {
                name: "Product 1".into(),
                quantity: 2
            }
        );
        assert_eq!(cart.line("1").unwrap().stock_ceiling, 2);
        assert_within_stock(&cart);
    }

    #[test]
    fn test_shrinking_stock_never_breaks_ceiling() {
        let mut cart = Cart::new();
        for stock in (1..=6).rev() {
            let p = product("1", 1_000, stock);
            for _ in 0..3 {
                let _ = cart.add_product(&p);
                assert_within_stock(&cart);
            }
            let _ = cart.set_quantity("1", stock + 2);
            assert_within_stock(&cart);
            let _ = cart.add_product(&product("1", 1_000, stock - 1));
            assert_within_stock(&cart);
        }
        assert!(cart.line("1").map_or(true, |l| l.quantity <= 1));
    }

    #[test]
    fn test_set_quantity_clamps_to_stock() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", 10_000, 3)).unwrap();

        let change = cart.set_quantity("1", 10).unwrap();
        assert_eq!(
            change,
            CartChange::Clamped {
                name: "Product 1".into(),
                quantity: 3
            }
        );
        assert_eq!(change.notice().unwrap().0, NotificationKind::Warning);
        assert_within_stock(&cart);
    }

    #[test]
    fn test_set_quantity_zero_or_negative_removes() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", 10_000, 3)).unwrap();
        cart.add_product(&product("2", 5_000, 3)).unwrap();

        assert!(matches!(cart.set_quantity("1", 0).unwrap(), CartChange::Removed { .. }));
        assert!(matches!(cart.set_quantity("2", -4).unwrap(), CartChange::Removed { .. }));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_same_quantity_is_silent() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", 10_000, 3)).unwrap();

        let change = cart.set_quantity("1", 1).unwrap();
        assert_eq!(change, CartChange::Unchanged);
        assert!(change.notice().is_none());
    }

    #[test]
    fn test_unknown_line() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.set_quantity("nope", 2),
            Err(CoreError::LineNotFound(_))
        ));
        assert!(cart.remove_line("nope").is_err());
    }

    #[test]
    fn test_refresh_stock_clamps_and_drops() {
        let mut cart = Cart::new();
        let a = product("a", 1_000, 5);
        let b = product("b", 1_000, 5);
        for _ in 0..4 {
            cart.add_product(&a).unwrap();
        }
        cart.add_product(&b).unwrap();

        let changes = cart.refresh_stock(&[product("a", 1_000, 2), product("b", 1_000, 0)]);
        assert_eq!(changes.len(), 2);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.line("a").unwrap().quantity, 2);
        assert_within_stock(&cart);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", 10_000, 3)).unwrap();
        assert_eq!(cart.clear(), CartChange::Cleared);
        assert!(cart.is_empty());
    }
}
