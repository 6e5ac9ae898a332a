use sqlx::{Row, SqliteConnection};

use crate::domain::catalog::Product;
use crate::domain::order::Money;

pub async fn find_product(
    conn: &mut SqliteConnection,
    product_id: i64,
) -> Result<Option<Product>, sqlx::Error> {
    let row = sqlx::query("SELECT product_id, name, price_cents FROM products WHERE product_id = ?")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(|row| {
        Ok(Product {
            id: row.try_get("product_id")?,
            name: row.try_get("name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
        })
    })
    .transpose()
}

pub async fn set_price(
    conn: &mut SqliteConnection,
    product_id: i64,
    price: Money,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET price_cents = ? WHERE product_id = ?")
        .bind(price.cents())
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Units on hand for a variant; `None` if the variant was never stocked.
pub async fn stock_quantity(
    conn: &mut SqliteConnection,
    product_id: i64,
    color: &str,
    size: &str,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT quantity FROM product_stock WHERE product_id = ? AND color = ? AND size = ?",
    )
    .bind(product_id)
    .bind(color)
    .bind(size)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn set_stock(
    conn: &mut SqliteConnection,
    product_id: i64,
    color: &str,
    size: &str,
    quantity: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO product_stock (product_id, color, size, quantity) VALUES (?, ?, ?, ?)
         ON CONFLICT (product_id, color, size) DO UPDATE SET quantity = excluded.quantity",
    )
    .bind(product_id)
    .bind(color)
    .bind(size)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Emails of everyone who wishlisted the product.
pub async fn wishlisters(
    conn: &mut SqliteConnection,
    product_id: i64,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT email FROM wishlist WHERE product_id = ? ORDER BY email")
        .bind(product_id)
        .fetch_all(&mut *conn)
        .await
}

pub async fn has_reviewed(
    conn: &mut SqliteConnection,
    email: &str,
    product_id: i64,
) -> Result<bool, sqlx::Error> {
    let reviewed: i64 =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM reviews WHERE email = ? AND product_id = ?)")
            .bind(email)
            .bind(product_id)
            .fetch_one(&mut *conn)
            .await?;
    Ok(reviewed != 0)
}
