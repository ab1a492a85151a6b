use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::account::{Account, AccountId, Operation, OperationId};
use super::errors::RepositoryError;

// ============================================================================
// Repository Ports
// ============================================================================

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Load an account with its history; fails with `AccountNotFound`
    async fn find_by_id(&self, id: AccountId) -> Result<Account, RepositoryError>;

    /// Upsert the account state and return the stored version.
    ///
    /// Saving the same state twice stores the same record; only the version
    /// counter moves.
    async fn save(&self, account: &Account) -> Result<u64, RepositoryError>;

    /// Forget an account; deleting an unknown id is not an error
    async fn delete(&self, id: AccountId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait OperationRepository: Send + Sync {
    /// Store an operation; saving the same operation id again replaces it
    async fn save(&self, operation: &Operation) -> Result<(), RepositoryError>;

    /// Remove one operation; removing an unknown id is not an error
    async fn delete(&self, account_id: AccountId, operation_id: OperationId) -> Result<(), RepositoryError>;

    /// Every operation of the account, most recent first
    async fn find_by_account_id(&self, account_id: AccountId) -> Result<Vec<Operation>, RepositoryError>;

    /// Operations with `from <= at <= to`, most recent first
    async fn find_by_account_id_between(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Operation>, RepositoryError>;
}
