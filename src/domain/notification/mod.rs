// ============================================================================
// Notification Domain
// ============================================================================
//
// - Value objects (NotificationCategory, ReadState, Notification)
// - Templates (closed set of messages this service emits)
// - Emitter (best-effort append with retry and dead-lettering)
//
// ============================================================================

pub mod emitter;
pub mod templates;
pub mod value_objects;

pub use emitter::*;
pub use templates::*;
pub use value_objects::*;
