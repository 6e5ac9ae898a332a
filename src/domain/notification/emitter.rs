use actix::Addr;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::actors::infrastructure::dlq::{AddToDlq, DlqActor};
use crate::metrics::Metrics;
use crate::persistence::notifications;
use crate::utils::{retry_on_transient, IsTransient, RetryConfig, RetryResult};
use super::templates::Template;
use super::value_objects::{NewNotification, Notification};

// ============================================================================
// Notification Emitter
// ============================================================================
//
// Appends notifications outside the transaction that produced them. A failed
// append is retried while the error looks transient, then handed to the
// dead letter queue. Callers only learn whether the append landed; the
// change that triggered it stands either way.
//
// ============================================================================

const OPERATION: &str = "notification_insert";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl IsTransient for NotifyError {
    fn is_transient(&self) -> bool {
        match self {
            NotifyError::Store(e) => e.is_transient(),
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    pool: SqlitePool,
    retry: RetryConfig,
    dlq: Option<Addr<DlqActor>>,
    metrics: Option<Arc<Metrics>>,
}

impl Notifier {
    pub fn new(pool: SqlitePool, retry: RetryConfig) -> Self {
        Self {
            pool,
            retry,
            dlq: None,
            metrics: None,
        }
    }

    pub fn with_dlq(mut self, dlq: Addr<DlqActor>) -> Self {
        self.dlq = Some(dlq);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Append one notification. Returns whether it was stored.
    pub async fn notify(&self, recipient: &str, template: Template<'_>, at: DateTime<Utc>) -> bool {
        let category = template.category();
        let notification = NewNotification {
            recipient_email: recipient.to_string(),
            category,
            message: template.render(),
            created_at: at,
        };

        let pool = &self.pool;
        let metrics = self.metrics.as_deref();
        let pending = &notification;
        let result = retry_on_transient(&self.retry, |attempt| async move {
            if attempt > 1 {
                if let Some(metrics) = metrics {
                    metrics.record_retry_attempt(OPERATION, attempt);
                }
            }
            let mut conn = pool.acquire().await?;
            let id = notifications::insert_notification(&mut conn, pending).await?;
            Ok::<_, NotifyError>(id)
        })
        .await;

        let (error, failure_count, exhausted) = match result {
            RetryResult::Success { value: id, attempts } => {
                tracing::debug!(
                    notification_id = id,
                    recipient = %recipient,
                    category = %category,
                    attempts,
                    "Notification appended"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_notification(category.label(), true);
                    if attempts > 1 {
                        metrics.record_retry_outcome(OPERATION, true);
                    }
                }
                return true;
            }
            RetryResult::Exhausted { error, attempts } => (error, attempts, true),
            RetryResult::Permanent { error, attempts } => (error, attempts, false),
        };

        tracing::error!(
            recipient = %recipient,
            category = %category,
            error = %error,
            failure_count,
            "Failed to append notification"
        );

        if let Some(metrics) = &self.metrics {
            metrics.record_notification(category.label(), false);
            if exhausted {
                metrics.record_retry_outcome(OPERATION, false);
            }
        }

        if let Some(dlq) = &self.dlq {
            dlq.do_send(AddToDlq {
                id: Uuid::new_v4(),
                recipient_email: notification.recipient_email,
                category: category.label().to_string(),
                payload: notification.message,
                error_message: error.to_string(),
                failure_count: failure_count as i32,
                first_failed_at: at,
            });
            if let Some(metrics) = &self.metrics {
                metrics.record_dlq_message(category.label());
            }
        }

        false
    }

    /// Send the same message to each recipient. Returns how many landed.
    pub async fn fan_out(&self, recipients: &[String], template: Template<'_>, at: DateTime<Utc>) -> usize {
        let mut sent = 0;
        for recipient in recipients {
            if self.notify(recipient, template, at).await {
                sent += 1;
            }
        }

        tracing::info!(
            category = %template.category(),
            recipients = recipients.len(),
            sent,
            "Fanned out notification"
        );
        sent
    }

    pub async fn notifications_for(&self, recipient: &str) -> Result<Vec<Notification>, NotifyError> {
        let mut conn = self.pool.acquire().await?;
        Ok(notifications::list_for_recipient(&mut conn, recipient).await?)
    }

    pub async fn mark_read(&self, notification_id: i64) -> Result<bool, NotifyError> {
        let mut conn = self.pool.acquire().await?;
        Ok(notifications::mark_read(&mut conn, notification_id).await?)
    }
}
