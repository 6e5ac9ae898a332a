use super::stage::Stage;
use super::value_objects::OrderId;

// ============================================================================
// Order Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Transaction failed: {0}")]
    Transaction(#[from] sqlx::Error),

    #[error("Order {order_id} cannot move from {current} to {target}")]
    InvalidTransition {
        order_id: OrderId,
        current: Stage,
        target: Stage,
    },

    #[error("Stage {stage} of order {order_id} is already completed")]
    AlreadyCompleted { order_id: OrderId, stage: Stage },
}

impl OrderError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        OrderError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::Validation(_) => "validation",
            OrderError::NotFound { .. } => "not_found",
            OrderError::Transaction(_) => "transaction",
            OrderError::InvalidTransition { .. } => "invalid_transition",
            OrderError::AlreadyCompleted { .. } => "already_completed",
        }
    }
}
