use sqlx::SqlitePool;

use crate::domain::order::Money;

// ============================================================================
// Storefront Writes
// ============================================================================
//
// Minimal versions of the storefront-side writes (catalog, cart, wishlist,
// reviews) this service reads from. Used to seed the demo and tests.
//
// ============================================================================

pub async fn upsert_product(
    pool: &SqlitePool,
    product_id: i64,
    name: &str,
    price: Money,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO products (product_id, name, price_cents) VALUES (?, ?, ?)
         ON CONFLICT (product_id) DO UPDATE SET name = excluded.name, price_cents = excluded.price_cents",
    )
    .bind(product_id)
    .bind(name)
    .bind(price.cents())
    .execute(pool)
    .await?;
    Ok(())
}

/// Return the owner's cart id, creating the cart if needed.
pub async fn create_cart(pool: &SqlitePool, owner_email: &str) -> Result<i64, sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO carts (owner_email, total_cents) VALUES (?, 0)")
        .bind(owner_email)
        .execute(pool)
        .await?;

    sqlx::query_scalar("SELECT cart_id FROM carts WHERE owner_email = ?")
        .bind(owner_email)
        .fetch_one(pool)
        .await
}

/// Add a line (or bump its quantity) and refresh the cached total.
pub async fn add_to_cart(
    pool: &SqlitePool,
    cart_id: i64,
    product_id: i64,
    color: &str,
    size: &str,
    quantity: i64,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO cart_items (cart_id, product_id, color, size, quantity) VALUES (?, ?, ?, ?, ?)
         ON CONFLICT (cart_id, product_id, color, size) DO UPDATE SET quantity = quantity + excluded.quantity",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(color)
    .bind(size)
    .bind(quantity)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE carts SET total_cents = (
            SELECT COALESCE(SUM(ci.quantity * p.price_cents), 0)
            FROM cart_items ci JOIN products p ON p.product_id = ci.product_id
            WHERE ci.cart_id = ?
         ) WHERE cart_id = ?",
    )
    .bind(cart_id)
    .bind(cart_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

pub async fn add_to_wishlist(pool: &SqlitePool, email: &str, product_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO wishlist (email, product_id) VALUES (?, ?)")
        .bind(email)
        .bind(product_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn add_review(
    pool: &SqlitePool,
    email: &str,
    product_id: i64,
    rating: i64,
    comment: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO reviews (email, product_id, rating, comment) VALUES (?, ?, ?, ?)")
        .bind(email)
        .bind(product_id)
        .bind(rating)
        .bind(comment)
        .execute(pool)
        .await?;
    Ok(())
}
