// ============================================================================
// Event Infrastructure
// ============================================================================
//
// Generic, reusable event envelope and outbox.
// Domain-specific events are in src/domain/
//
// ============================================================================

// Core abstractions (GENERIC - works with any event type)
mod core;
mod store;

// Re-export core infrastructure
pub use self::core::*;
pub use self::store::*;
