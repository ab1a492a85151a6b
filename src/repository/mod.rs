// ============================================================================
// Repositories - Persistence ports and in-memory adapters
// ============================================================================
//
// Accounts are always reconstructed through `Account::rehydrate`; the stored
// balance is authoritative and operations are kept in their own repository.
//
// ============================================================================

pub mod errors;
pub mod records;
pub mod traits;
pub mod in_memory;

pub use errors::RepositoryError;
pub use records::AccountRecord;
pub use traits::{AccountRepository, OperationRepository};
pub use in_memory::{InMemoryAccountRepository, InMemoryOperationRepository};
