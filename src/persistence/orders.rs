use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use crate::domain::cart::CartLine;
use crate::domain::order::{
    Checkout, GiftRecipient, Money, Order, OrderId, OrderLine, OrderSummary, ShippingAddress,
    ShippingSpeed,
};
use super::decode_error;

pub async fn find_by_idempotency_key(
    conn: &mut SqliteConnection,
    owner_email: &str,
    key: &str,
) -> Result<Option<OrderId>, sqlx::Error> {
    let id: Option<i64> = sqlx::query_scalar(
        "SELECT order_id FROM orders WHERE owner_email = ? AND idempotency_key = ?",
    )
    .bind(owner_email)
    .bind(key)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(id.map(OrderId))
}

/// Insert the order header and return its generated id.
pub async fn insert_order(
    conn: &mut SqliteConnection,
    checkout: &Checkout,
    created_at: DateTime<Utc>,
    total_cost: Money,
) -> Result<OrderId, sqlx::Error> {
    let gift = checkout.gift_recipient.as_ref();
    let address = &checkout.shipping_address;

    let result = sqlx::query(
        "INSERT INTO orders (
            owner_email, created_at, total_cents, payment_method, shipping_speed,
            is_gift, gift_first_name, gift_last_name,
            street, civic_number, postal_code, city, idempotency_key
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&checkout.owner_email)
    .bind(created_at)
    .bind(total_cost.cents())
    .bind(&checkout.payment_method)
    .bind(checkout.shipping_speed.as_str())
    .bind(gift.is_some())
    .bind(gift.map(|g| g.first_name.as_str()))
    .bind(gift.map(|g| g.last_name.as_str()))
    .bind(&address.street)
    .bind(&address.civic_number)
    .bind(&address.postal_code)
    .bind(&address.city)
    .bind(checkout.idempotency_key.as_deref())
    .execute(&mut *conn)
    .await?;

    Ok(OrderId(result.last_insert_rowid()))
}

/// Copy cart lines into the order, freezing the price each line was read at.
pub async fn insert_order_lines(
    conn: &mut SqliteConnection,
    order_id: OrderId,
    lines: &[CartLine],
) -> Result<(), sqlx::Error> {
    for line in lines {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, color, size, quantity, purchase_price_cents)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(order_id.0)
        .bind(line.product_id)
        .bind(&line.color)
        .bind(&line.size)
        .bind(line.quantity)
        .bind(line.unit_price.cents())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn load_order_lines(
    conn: &mut SqliteConnection,
    order_id: OrderId,
) -> Result<Vec<OrderLine>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT product_id, color, size, quantity, purchase_price_cents
         FROM order_items WHERE order_id = ?
         ORDER BY product_id, color, size",
    )
    .bind(order_id.0)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(OrderLine {
                product_id: row.try_get("product_id")?,
                color: row.try_get("color")?,
                size: row.try_get("size")?,
                quantity: row.try_get("quantity")?,
                purchase_price: Money::from_cents(row.try_get("purchase_price_cents")?),
            })
        })
        .collect()
}

pub async fn load_order(
    conn: &mut SqliteConnection,
    order_id: OrderId,
) -> Result<Option<Order>, sqlx::Error> {
    let Some(row) = sqlx::query("SELECT * FROM orders WHERE order_id = ?")
        .bind(order_id.0)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let mut order = order_from_row(&row)?;
    order.lines = load_order_lines(conn, order_id).await?;
    Ok(Some(order))
}

pub async fn owner_of(
    conn: &mut SqliteConnection,
    order_id: OrderId,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT owner_email FROM orders WHERE order_id = ?")
        .bind(order_id.0)
        .fetch_optional(&mut *conn)
        .await
}

/// Order history, newest first.
pub async fn list_orders(
    conn: &mut SqliteConnection,
    owner_email: &str,
) -> Result<Vec<OrderSummary>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT order_id, created_at, total_cents, shipping_speed, is_gift
         FROM orders WHERE owner_email = ?
         ORDER BY created_at DESC, order_id DESC",
    )
    .bind(owner_email)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(OrderSummary {
                id: OrderId(row.try_get("order_id")?),
                created_at: row.try_get("created_at")?,
                total_cost: Money::from_cents(row.try_get("total_cents")?),
                shipping_speed: speed_from_row(row)?,
                is_gift: row.try_get::<i64, _>("is_gift")? != 0,
            })
        })
        .collect()
}

fn speed_from_row(row: &SqliteRow) -> Result<ShippingSpeed, sqlx::Error> {
    row.try_get::<String, _>("shipping_speed")?
        .parse()
        .map_err(decode_error)
}

fn order_from_row(row: &SqliteRow) -> Result<Order, sqlx::Error> {
    let is_gift = row.try_get::<i64, _>("is_gift")? != 0;
    let gift_recipient = if is_gift {
        Some(GiftRecipient {
            first_name: row.try_get::<Option<String>, _>("gift_first_name")?.unwrap_or_default(),
            last_name: row.try_get::<Option<String>, _>("gift_last_name")?.unwrap_or_default(),
        })
    } else {
        None
    };

    Ok(Order {
        id: OrderId(row.try_get("order_id")?),
        owner_email: row.try_get("owner_email")?,
        created_at: row.try_get("created_at")?,
        total_cost: Money::from_cents(row.try_get("total_cents")?),
        payment_method: row.try_get("payment_method")?,
        shipping_speed: speed_from_row(row)?,
        gift_recipient,
        shipping_address: ShippingAddress {
            street: row.try_get("street")?,
            civic_number: row.try_get("civic_number")?,
            postal_code: row.try_get("postal_code")?,
            city: row.try_get("city")?,
        },
        lines: Vec::new(),
    })
}
