// ============================================================================
// Infrastructure Actors
// ============================================================================
//
// Reusable infrastructure actors for system concerns:
// - Dead letter queue for notifications
// - Health monitoring
// - Coordination and supervision
//
// ============================================================================

pub mod dlq;
mod health_monitor;
mod coordinator;

// Re-export for public API
pub use dlq::{AddToDlq, DlqActor, DlqStats, GetDlqMessages, GetDlqStats};
pub use health_monitor::{GetSystemHealth, HealthMonitorActor, SystemHealth, UpdateHealth};
pub use coordinator::{CoordinatorActor, GetCatalogHandler, GetDlqActor, GetOrderActor, Shutdown};
