use serde::{Deserialize, Serialize};

use crate::domain::order::{Money, OrderError};

// ============================================================================
// Cart Snapshot - read-only view of a user's cart at checkout time
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub color: String,
    pub size: String,
    pub quantity: i64,
    /// Current catalog price, joined at read time.
    pub unit_price: Money,
}

impl CartLine {
    /// `None` on overflow.
    pub fn subtotal(&self) -> Option<Money> {
        self.unit_price.checked_times(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub cart_id: i64,
    pub owner_email: String,
    /// Total cached on the cart row by the storefront.
    pub cached_total: Money,
    pub lines: Vec<CartLine>,
}

impl CartSnapshot {
    /// Total derived from current prices. A cart whose total does not fit
    /// in cents is rejected rather than wrapped.
    pub fn total(&self) -> Result<Money, OrderError> {
        self.lines
            .iter()
            .try_fold(Money::ZERO, |total, line| {
                line.subtotal().and_then(|subtotal| total.checked_add(subtotal))
            })
            .ok_or_else(|| {
                OrderError::Validation(format!("cart {} total overflows", self.cart_id))
            })
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: i64, quantity: i64) -> CartLine {
        CartLine {
            product_id: 1,
            color: "black".to_string(),
            size: "42".to_string(),
            quantity,
            unit_price: Money::from_cents(price),
        }
    }

    #[test]
    fn test_total_uses_current_prices() {
        let cart = CartSnapshot {
            cart_id: 1,
            owner_email: "mario@example.com".to_string(),
            cached_total: Money::from_cents(1),
            lines: vec![line(8999, 2), line(4500, 1)],
        };

        assert_eq!(cart.total().unwrap(), Money::from_cents(22498));
        assert!(!cart.is_empty());
    }

    #[test]
    fn test_empty_cart_total() {
        let cart = CartSnapshot {
            cart_id: 1,
            owner_email: "mario@example.com".to_string(),
            cached_total: Money::ZERO,
            lines: vec![],
        };

        assert_eq!(cart.total().unwrap(), Money::ZERO);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_overflowing_total_is_rejected() {
        let single_line = CartSnapshot {
            cart_id: 3,
            owner_email: "mario@example.com".to_string(),
            cached_total: Money::ZERO,
            lines: vec![line(12000, i64::MAX / 100)],
        };
        assert!(matches!(single_line.total(), Err(OrderError::Validation(_))));

        let many_lines = CartSnapshot {
            lines: vec![line(i64::MAX / 2, 1), line(i64::MAX / 2, 1), line(2, 1)],
            ..single_line
        };
        assert!(matches!(many_lines.total(), Err(OrderError::Validation(_))));
    }
}
