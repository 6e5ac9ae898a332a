use sqlx::{Row, SqliteConnection};

use crate::domain::cart::{CartLine, CartSnapshot};
use crate::domain::order::Money;

/// Read the owner's cart, pricing each line at the current catalog price.
/// `None` when the owner has no cart row.
pub async fn read_cart(
    conn: &mut SqliteConnection,
    owner_email: &str,
) -> Result<Option<CartSnapshot>, sqlx::Error> {
    let Some(cart) = sqlx::query("SELECT cart_id, total_cents FROM carts WHERE owner_email = ?")
        .bind(owner_email)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let cart_id: i64 = cart.try_get("cart_id")?;
    let cached_total: i64 = cart.try_get("total_cents")?;

    let rows = sqlx::query(
        "SELECT ci.product_id, ci.color, ci.size, ci.quantity, p.price_cents
         FROM cart_items ci
         JOIN products p ON p.product_id = ci.product_id
         WHERE ci.cart_id = ?
         ORDER BY ci.product_id, ci.color, ci.size",
    )
    .bind(cart_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut lines = Vec::with_capacity(rows.len());
    for row in rows {
        lines.push(CartLine {
            product_id: row.try_get("product_id")?,
            color: row.try_get("color")?,
            size: row.try_get("size")?,
            quantity: row.try_get("quantity")?,
            unit_price: Money::from_cents(row.try_get("price_cents")?),
        });
    }

    tracing::debug!(owner = %owner_email, cart_id, line_count = lines.len(), "Read cart snapshot");

    Ok(Some(CartSnapshot {
        cart_id,
        owner_email: owner_email.to_string(),
        cached_total: Money::from_cents(cached_total),
        lines,
    }))
}

/// Remove every line of the cart and zero its cached total. The cart row
/// itself is kept.
pub async fn clear_cart(conn: &mut SqliteConnection, cart_id: i64) -> Result<(), sqlx::Error> {
    let removed = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?")
        .bind(cart_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    sqlx::query("UPDATE carts SET total_cents = 0 WHERE cart_id = ?")
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;

    tracing::debug!(cart_id, removed, "Cleared cart");
    Ok(())
}
