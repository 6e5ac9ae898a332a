// ============================================================================
// Catalog Domain - price and stock changes that trigger notifications
// ============================================================================

pub mod command_handler;
pub mod errors;

pub use command_handler::*;
pub use errors::*;

use serde::{Deserialize, Serialize};

use crate::domain::order::Money;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Current catalog price; order lines keep their own copy.
    pub price: Money,
}
