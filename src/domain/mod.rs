// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each area has its own subdirectory:
// - order: checkout, stage advancement, tracking views
// - cart: read-only cart snapshot consumed at checkout
// - catalog: price and stock changes that trigger notifications
// - notification: templates and the best-effort emitter
//
// Persistence lives in crate::persistence; this layer decides what to write.
//
// ============================================================================

pub mod cart;
pub mod catalog;
pub mod notification;
pub mod order;
