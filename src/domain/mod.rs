// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Shared value types (Money, Clock) plus one subdirectory per aggregate.
// Nothing here knows about storage, metrics or publication.
//
// ============================================================================

pub mod money;
pub mod clock;
pub mod account;

pub use money::{Money, MoneyError};
pub use clock::{Clock, FixedClock, SystemClock};
