// ============================================================================
// Event Sourcing Core - Generic Event Abstractions
// ============================================================================
//
// No domain-specific code lives here; everything is generic over the event
// type.
//
// ============================================================================

pub mod event;

// Re-export core types for convenience
pub use event::{DomainEvent, EventEnvelope, serialize_event, deserialize_event};
