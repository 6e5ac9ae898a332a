use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

// ============================================================================
// Store Write Backoff
// ============================================================================
//
// SQLite reports lock contention as SQLITE_BUSY (5) or SQLITE_LOCKED (6),
// with extended result codes in the upper bits. Those, pool timeouts and I/O
// errors are worth another attempt. Constraint violations and trigger aborts
// fail the same way every time and are handed back on the first attempt.
//
// ============================================================================

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Opening the database at startup: one retry after a longer pause.
    pub fn startup() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }

    /// Pause after the given failed attempt (1-based), capped at `max_delay`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let millis = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// How a retried operation ended, with the number of attempts it took.
#[derive(Debug)]
pub enum RetryResult<T, E> {
    Success { value: T, attempts: u32 },
    /// Every attempt failed with a retryable error.
    Exhausted { error: E, attempts: u32 },
    /// Gave up on an error that retrying cannot fix.
    Permanent { error: E, attempts: u32 },
}

impl<T, E> RetryResult<T, E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryResult::Success { attempts, .. }
            | RetryResult::Exhausted { attempts, .. }
            | RetryResult::Permanent { attempts, .. } => *attempts,
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            RetryResult::Success { value, .. } => Ok(value),
            RetryResult::Exhausted { error, .. } | RetryResult::Permanent { error, .. } => Err(error),
        }
    }
}

pub trait IsTransient {
    fn is_transient(&self) -> bool;
}

impl IsTransient for sqlx::Error {
    fn is_transient(&self) -> bool {
        match self {
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
            sqlx::Error::Database(db) => db
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED)),
            _ => false,
        }
    }
}

/// Retry every failure until `max_attempts` is reached.
pub async fn retry_with_backoff<F, Fut, T, E>(config: &RetryConfig, operation: F) -> RetryResult<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    retry_while(config, operation, |_| true).await
}

/// Retry only failures that report themselves as transient.
pub async fn retry_on_transient<F, Fut, T, E>(config: &RetryConfig, operation: F) -> RetryResult<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display + IsTransient,
{
    retry_while(config, operation, |error: &E| error.is_transient()).await
}

async fn retry_while<F, Fut, T, E, P>(config: &RetryConfig, mut operation: F, retryable: P) -> RetryResult<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let error = match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, "Store write succeeded after retry");
                }
                return RetryResult::Success { value, attempts: attempt };
            }
            Err(error) => error,
        };

        if !retryable(&error) {
            tracing::warn!(attempt, error = %error, "Store write failed, not retrying");
            return RetryResult::Permanent { error, attempts: attempt };
        }

        if attempt >= max_attempts {
            tracing::warn!(attempt, error = %error, "Store write failed on every attempt");
            return RetryResult::Exhausted { error, attempts: attempt };
        }

        let delay = config.delay_after(attempt);
        tracing::debug!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Store busy, backing off"
        );
        sleep(delay).await;
    }
}
