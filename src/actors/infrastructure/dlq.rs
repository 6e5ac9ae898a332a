use actix::prelude::*;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::persistence::decode_error;

// ============================================================================
// Dead Letter Queue Actor
// ============================================================================
//
// Holds notifications that could not be appended after all retry attempts.
// Provides:
// - Persistent storage of failed notifications
// - Queryable for manual intervention
// - Counts per category
//
// ============================================================================

pub struct DlqActor {
    pool: SqlitePool,
}

impl DlqActor {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl Actor for DlqActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("DlqActor started - Dead Letter Queue ready");
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Message, Debug, Clone)]
#[rtype(result = "Result<(), String>")]
pub struct AddToDlq {
    pub id: Uuid,
    pub recipient_email: String,
    pub category: String,
    pub payload: String,
    pub error_message: String,
    pub failure_count: i32,
    pub first_failed_at: DateTime<Utc>,
}

#[derive(Message)]
#[rtype(result = "Result<Vec<DlqMessage>, String>")]
pub struct GetDlqMessages {
    pub limit: i64,
}

#[derive(Message)]
#[rtype(result = "Result<DlqStats, String>")]
pub struct GetDlqStats;

#[derive(Debug, Clone)]
pub struct DlqMessage {
    pub id: Uuid,
    pub recipient_email: String,
    pub category: String,
    pub payload: String,
    pub error_message: String,
    pub failure_count: i32,
    pub first_failed_at: DateTime<Utc>,
    pub last_failed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DlqStats {
    pub total_messages: i64,
    pub by_category: HashMap<String, i64>,
}

// ============================================================================
// Handlers
// ============================================================================

impl Handler<AddToDlq> for DlqActor {
    type Result = ResponseFuture<Result<(), String>>;

    fn handle(&mut self, msg: AddToDlq, _: &mut Self::Context) -> Self::Result {
        let pool = self.pool.clone();
        let now = Utc::now();

        tracing::error!(
            message_id = %msg.id,
            category = %msg.category,
            recipient = %msg.recipient_email,
            error = %msg.error_message,
            failure_count = msg.failure_count,
            "💀 Adding notification to Dead Letter Queue"
        );

        Box::pin(async move {
            sqlx::query(
                "INSERT INTO dead_letter_queue (
                    id, recipient_email, category, payload,
                    error_message, failure_count, first_failed_at,
                    last_failed_at, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(msg.id.to_string())
            .bind(&msg.recipient_email)
            .bind(&msg.category)
            .bind(&msg.payload)
            .bind(&msg.error_message)
            .bind(msg.failure_count)
            .bind(msg.first_failed_at)
            .bind(now)
            .bind(now)
            .execute(&pool)
            .await
            .map_err(|e| format!("Failed to insert into DLQ: {}", e))?;

            tracing::info!(message_id = %msg.id, "Notification stored in DLQ");

            Ok(())
        })
    }
}

impl Handler<GetDlqMessages> for DlqActor {
    type Result = ResponseFuture<Result<Vec<DlqMessage>, String>>;

    fn handle(&mut self, msg: GetDlqMessages, _: &mut Self::Context) -> Self::Result {
        let pool = self.pool.clone();

        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT id, recipient_email, category, payload, error_message,
                        failure_count, first_failed_at, last_failed_at
                 FROM dead_letter_queue
                 ORDER BY created_at
                 LIMIT ?",
            )
            .bind(msg.limit)
            .fetch_all(&pool)
            .await
            .map_err(|e| format!("Failed to query DLQ: {}", e))?;

            let messages = rows
                .iter()
                .map(dlq_message_from_row)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| format!("Failed to parse row: {}", e))?;

            Ok(messages)
        })
    }
}

fn dlq_message_from_row(row: &SqliteRow) -> Result<DlqMessage, sqlx::Error> {
    let id: String = row.try_get("id")?;

    Ok(DlqMessage {
        id: Uuid::parse_str(&id).map_err(decode_error)?,
        recipient_email: row.try_get("recipient_email")?,
        category: row.try_get("category")?,
        payload: row.try_get("payload")?,
        error_message: row.try_get("error_message")?,
        failure_count: row.try_get("failure_count")?,
        first_failed_at: row.try_get("first_failed_at")?,
        last_failed_at: row.try_get("last_failed_at")?,
    })
}

impl Handler<GetDlqStats> for DlqActor {
    type Result = ResponseFuture<Result<DlqStats, String>>;

    fn handle(&mut self, _msg: GetDlqStats, _: &mut Self::Context) -> Self::Result {
        let pool = self.pool.clone();

        Box::pin(async move {
            let rows: Vec<(String, i64)> = sqlx::query_as(
                "SELECT category, COUNT(*) FROM dead_letter_queue GROUP BY category",
            )
            .fetch_all(&pool)
            .await
            .map_err(|e| format!("Failed to count DLQ messages: {}", e))?;

            let by_category: HashMap<String, i64> = rows.into_iter().collect();
            let total_messages = by_category.values().sum();

            Ok(DlqStats {
                total_messages,
                by_category,
            })
        })
    }
}
