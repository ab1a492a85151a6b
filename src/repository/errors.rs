use crate::domain::account::{AccountId, DomainError};
use crate::utils::IsTransient;

// ============================================================================
// Repository Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepositoryError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Stored data is corrupted: {0}")]
    Corrupted(#[from] DomainError),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl IsTransient for RepositoryError {
    fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_is_transient() {
        assert!(RepositoryError::Unavailable("timeout".into()).is_transient());
        assert!(!RepositoryError::AccountNotFound(AccountId::new()).is_transient());
        assert!(!RepositoryError::Corrupted(DomainError::MissingField("type")).is_transient());
    }
}
