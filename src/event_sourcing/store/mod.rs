// ============================================================================
// Event Publication - Generic Outbox
// ============================================================================
//
// Components here work with ANY event type.
//
// ============================================================================

pub mod outbox;

pub use outbox::{EventPublisher, InMemoryOutbox};
