// ============================================================================
// Account Domain - Business Logic for the Account Aggregate
// ============================================================================
//
// Everything account-specific lives here:
// - Value objects (AccountId, AccountType, OperationKind)
// - Operations and their ordered history
// - Ceiling and overdraft policies
// - Errors (DomainError with its category)
// - Events and commands
// - Aggregate (Account) and its command handler
//
// ============================================================================

pub mod value_objects;
pub mod errors;
pub mod operation;
pub mod history;
pub mod policies;
pub mod aggregate;
pub mod events;
pub mod commands;
pub mod command_handler;

// Re-export for convenience
pub use value_objects::*;
pub use errors::*;
pub use operation::*;
pub use history::*;
pub use policies::*;
pub use aggregate::*;
pub use events::*;
pub use commands::*;
pub use command_handler::*;
