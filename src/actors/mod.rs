// ============================================================================
// Actors Module
// ============================================================================
//
// Actor-based infrastructure for asynchronous, concurrent operations.
//
// Structure:
// - core/           - Shared health types
// - infrastructure/ - Infrastructure actors (DLQ, Health, Coordinator)
// - order_actor     - Mailbox in front of the order command handler
//
// Business rules live in the domain command handlers; actors only own
// lifecycles and message routing.
//
// ============================================================================

// Private module declarations
mod core;
mod order_actor;
pub(crate) mod infrastructure;

// Re-export only what's needed in the public API
pub use infrastructure::{CoordinatorActor, GetCatalogHandler, GetOrderActor, Shutdown};
pub use order_actor::{
    AdvanceOrder, GetInbox, GetOrderTracking, ListOrders, MarkNotificationRead, OrderActor,
    SubmitCheckout,
};
pub(crate) use infrastructure::{GetDlqActor, GetDlqMessages, GetDlqStats};
