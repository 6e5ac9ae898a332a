// ============================================================================
// Order Domain - Checkout and Shipment Tracking
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (Money, ShippingSpeed, Order, OrderLine, GeoPoint)
// - Commands (PlaceOrder, AdvanceStatus)
// - Errors (OrderError enum)
// - Stage state machine and shipment timeline
// - Tracking records and the four-step read projection
// - Command Handler (OrderCommandHandler)
//
// ============================================================================

pub mod value_objects;
pub mod commands;
pub mod errors;
pub mod stage;
pub mod timeline;
pub mod tracking;
pub mod command_handler;

// Re-export for convenience
pub use value_objects::*;
pub use commands::*;
pub use errors::*;
pub use stage::*;
pub use timeline::*;
pub use tracking::*;
pub use command_handler::*;
