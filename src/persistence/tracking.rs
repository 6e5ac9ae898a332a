use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection};

use crate::domain::order::{GeoPoint, OrderId, Stage, TrackingRecord};
use super::decode_error;

pub async fn insert_tracking(
    conn: &mut SqliteConnection,
    records: &[TrackingRecord],
) -> Result<(), sqlx::Error> {
    for record in records {
        sqlx::query(
            "INSERT INTO order_tracking (
                order_id, stage, latitude, longitude,
                actual_arrival, estimated_arrival, last_updated
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.order_id.0)
        .bind(record.stage.as_str())
        .bind(record.location.map(|point| point.latitude))
        .bind(record.location.map(|point| point.longitude))
        .bind(record.actual_arrival)
        .bind(record.estimated_arrival)
        .bind(record.last_updated)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// All tracking rows of an order, in stage order.
pub async fn load_tracking(
    conn: &mut SqliteConnection,
    order_id: OrderId,
) -> Result<Vec<TrackingRecord>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT stage, latitude, longitude, actual_arrival, estimated_arrival, last_updated
         FROM order_tracking WHERE order_id = ?",
    )
    .bind(order_id.0)
    .fetch_all(&mut *conn)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let stage: Stage = row.try_get::<String, _>("stage")?.parse().map_err(decode_error)?;
        let latitude: Option<f64> = row.try_get("latitude")?;
        let longitude: Option<f64> = row.try_get("longitude")?;

        records.push(TrackingRecord {
            order_id,
            stage,
            location: latitude.zip(longitude).map(|(lat, lng)| GeoPoint::new(lat, lng)),
            actual_arrival: row.try_get("actual_arrival")?,
            estimated_arrival: row.try_get("estimated_arrival")?,
            last_updated: row.try_get("last_updated")?,
        });
    }

    records.sort_by_key(|record| record.stage);
    Ok(records)
}

/// Complete `stage` only if it is still pending and its predecessor is
/// completed. Returns false when another writer got there first. Placed has
/// no predecessor and is only ever written at checkout.
pub async fn complete_stage(
    conn: &mut SqliteConnection,
    order_id: OrderId,
    stage: Stage,
    at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let Some(predecessor) = stage.predecessor() else {
        return Ok(false);
    };

    let result = sqlx::query(
        "UPDATE order_tracking
         SET actual_arrival = ?, last_updated = ?
         WHERE order_id = ? AND stage = ? AND actual_arrival IS NULL
           AND EXISTS (
               SELECT 1 FROM order_tracking
               WHERE order_id = ? AND stage = ? AND actual_arrival IS NOT NULL
           )",
    )
    .bind(at)
    .bind(at)
    .bind(order_id.0)
    .bind(stage.as_str())
    .bind(order_id.0)
    .bind(predecessor.as_str())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShippingConfig;
    use crate::domain::order::{plan_tracking, ShippingSpeed};
    use crate::persistence::testing::memory_pool;
    use chrono::TimeZone;

    // order_tracking references orders, so tests need a parent row.
    async fn insert_parent(conn: &mut SqliteConnection) -> OrderId {
        let id = sqlx::query(
            "INSERT INTO orders (owner_email, created_at, total_cents, payment_method, shipping_speed,
                is_gift, street, civic_number, postal_code, city)
             VALUES ('mario@example.com', '2026-10-16T10:00:00Z', 100, 'card', 'standard', 0,
                'Via Roma', '10', '20121', 'Milano')",
        )
        .execute(&mut *conn)
        .await
        .unwrap()
        .last_insert_rowid();
        OrderId(id)
    }

    #[tokio::test]
    async fn test_conditional_completion() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let order_id = insert_parent(&mut conn).await;
        let created = Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap();
        let records = plan_tracking(order_id, created, ShippingSpeed::Standard, &ShippingConfig::default());
        insert_tracking(&mut conn, &records).await.unwrap();

        let now = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();

        // Predecessor not completed yet
        assert!(!complete_stage(&mut conn, order_id, Stage::Shipped, now).await.unwrap());
        assert!(complete_stage(&mut conn, order_id, Stage::InProgress, now).await.unwrap());
        // Second writer loses
        assert!(!complete_stage(&mut conn, order_id, Stage::InProgress, now).await.unwrap());
        assert!(!complete_stage(&mut conn, order_id, Stage::Placed, now).await.unwrap());

        let loaded = load_tracking(&mut conn, order_id).await.unwrap();
        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded[1].actual_arrival, Some(now));
        assert_eq!(loaded[1].last_updated, now);
        assert_eq!(loaded[2].actual_arrival, None);
        assert_eq!(loaded[0].location, Some(ShippingConfig::default().warehouse));
        assert_eq!(loaded[2].location, None);
        assert_eq!(loaded[3].estimated_arrival, records[3].estimated_arrival);
    }

    #[tokio::test]
    async fn test_one_record_per_stage() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let order_id = insert_parent(&mut conn).await;
        let created = Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap();
        let records = plan_tracking(order_id, created, ShippingSpeed::Express, &ShippingConfig::default());

        insert_tracking(&mut conn, &records).await.unwrap();
        assert!(insert_tracking(&mut conn, &records[..1]).await.is_err());
    }
}
