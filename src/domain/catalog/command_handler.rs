use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::domain::notification::{Notifier, Template};
use crate::domain::order::Money;
use crate::persistence::catalog;

use super::errors::CatalogError;
use super::Product;

// ============================================================================
// Catalog Command Handler
// ============================================================================
//
// Price drops notify everyone who wishlisted the product (Flash Sale).
// A variant going from zero to positive stock notifies the same audience
// (Stock Product). Notifications go out after commit.
//
// ============================================================================

pub struct CatalogCommandHandler {
    pool: SqlitePool,
    notifier: Notifier,
}

impl CatalogCommandHandler {
    pub fn new(pool: SqlitePool, notifier: Notifier) -> Self {
        Self { pool, notifier }
    }

    /// Change a product's list price. Returns the number of flash-sale
    /// notifications sent.
    pub async fn update_price(&self, product_id: i64, new_price: Money) -> Result<usize, CatalogError> {
        if !new_price.is_positive() {
            return Err(CatalogError::Validation(format!("price must be positive: {new_price}")));
        }

        let mut tx = self.pool.begin().await?;
        let (product, audience) = match reprice(&mut tx, product_id, new_price).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback after failed price update also failed");
                }
                return Err(e);
            }
        };
        tx.commit().await?;

        tracing::info!(
            product_id,
            old_price = %product.price,
            new_price = %new_price,
            "Price updated"
        );

        if audience.is_empty() {
            return Ok(0);
        }

        let template = Template::FlashSale {
            product: &product.name,
            old_price: product.price,
            new_price,
        };
        Ok(self.notifier.fan_out(&audience, template, Utc::now()).await)
    }

    /// Set the units on hand for one variant. Returns the number of
    /// back-in-stock notifications sent.
    pub async fn update_stock(
        &self,
        product_id: i64,
        color: &str,
        size: &str,
        quantity: i64,
    ) -> Result<usize, CatalogError> {
        if quantity < 0 {
            return Err(CatalogError::Validation(format!("negative stock: {quantity}")));
        }

        let mut tx = self.pool.begin().await?;
        let (product, audience) = match restock(&mut tx, product_id, color, size, quantity).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "Rollback after failed stock update also failed");
                }
                return Err(e);
            }
        };
        tx.commit().await?;

        tracing::info!(product_id, color, size, quantity, "Stock updated");

        if audience.is_empty() {
            return Ok(0);
        }

        let template = Template::BackInStock {
            product: &product.name,
            color,
            size,
        };
        Ok(self.notifier.fan_out(&audience, template, Utc::now()).await)
    }
}

/// Returns the product as it was before the change and who to notify.
async fn reprice(
    conn: &mut SqliteConnection,
    product_id: i64,
    new_price: Money,
) -> Result<(Product, Vec<String>), CatalogError> {
    let product = catalog::find_product(conn, product_id)
        .await?
        .ok_or(CatalogError::NotFound(product_id))?;

    catalog::set_price(conn, product_id, new_price).await?;

    let audience = if new_price < product.price {
        catalog::wishlisters(conn, product_id).await?
    } else {
        Vec::new()
    };
    Ok((product, audience))
}

async fn restock(
    conn: &mut SqliteConnection,
    product_id: i64,
    color: &str,
    size: &str,
    quantity: i64,
) -> Result<(Product, Vec<String>), CatalogError> {
    let product = catalog::find_product(conn, product_id)
        .await?
        .ok_or(CatalogError::NotFound(product_id))?;

    let previous = catalog::stock_quantity(conn, product_id, color, size)
        .await?
        .unwrap_or(0);
    catalog::set_stock(conn, product_id, color, size, quantity).await?;

    let audience = if previous == 0 && quantity > 0 {
        catalog::wishlisters(conn, product_id).await?
    } else {
        Vec::new()
    };
    Ok((product, audience))
}
