use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::account::{Account, AccountId, Operation, OperationId};
use crate::domain::clock::Clock;
use super::errors::RepositoryError;
use super::records::AccountRecord;
use super::traits::{AccountRepository, OperationRepository};

// ============================================================================
// In-Memory Account Repository
// ============================================================================
//
// Keeps one record and one version counter per account. History is read
// back from the operation repository on every load.
//
// ============================================================================

#[derive(Debug, Clone)]
struct StoredAccount {
    record: AccountRecord,
    version: u64,
}

pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<AccountId, StoredAccount>>,
    operations: Arc<dyn OperationRepository>,
    clock: Arc<dyn Clock>,
}

impl InMemoryAccountRepository {
    pub fn new(operations: Arc<dyn OperationRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            operations,
            clock,
        }
    }

    /// Stored version, `None` if the account was never saved
    pub async fn version(&self, id: AccountId) -> Option<u64> {
        self.accounts.read().await.get(&id).map(|stored| stored.version)
    }

    pub async fn record(&self, id: AccountId) -> Option<AccountRecord> {
        self.accounts.read().await.get(&id).map(|stored| stored.record.clone())
    }

    /// Overwrite a stored record without touching its version
    #[cfg(test)]
    pub(crate) async fn put_record(&self, record: AccountRecord) {
        let mut accounts = self.accounts.write().await;
        let version = accounts.get(&record.id).map(|stored| stored.version).unwrap_or(0);
        accounts.insert(record.id, StoredAccount { record, version });
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_id(&self, id: AccountId) -> Result<Account, RepositoryError> {
        let record = self
            .accounts
            .read()
            .await
            .get(&id)
            .map(|stored| stored.record.clone())
            .ok_or(RepositoryError::AccountNotFound(id))?;

        let operations = self.operations.find_by_account_id(id).await?;

        let account = record.into_account(operations, self.clock.clone()).map_err(|error| {
            tracing::error!(account_id = %id, error = %error, "Stored account failed rehydration");
            RepositoryError::Corrupted(error)
        })?;

        tracing::debug!(
            account_id = %id,
            operations = account.operations().len(),
            "Loaded account"
        );
        Ok(account)
    }

    async fn save(&self, account: &Account) -> Result<u64, RepositoryError> {
        let record = AccountRecord::from(account);
        let mut accounts = self.accounts.write().await;

        let version = accounts.get(&record.id).map(|stored| stored.version).unwrap_or(0) + 1;
        accounts.insert(record.id, StoredAccount { record, version });

        tracing::debug!(account_id = %account.id(), version = version, "Saved account");
        Ok(version)
    }

    async fn delete(&self, id: AccountId) -> Result<(), RepositoryError> {
        if self.accounts.write().await.remove(&id).is_some() {
            tracing::debug!(account_id = %id, "Deleted account");
        }
        Ok(())
    }
}

// ============================================================================
// In-Memory Operation Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryOperationRepository {
    operations: RwLock<HashMap<AccountId, Vec<Operation>>>,
}

impl InMemoryOperationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest first; for equal timestamps the later save wins the front slot
    fn most_recent_first<'a>(operations: impl DoubleEndedIterator<Item = &'a Operation>) -> Vec<Operation> {
        let mut sorted: Vec<Operation> = operations.rev().cloned().collect();
        sorted.sort_by(|a, b| b.at().cmp(&a.at()));
        sorted
    }
}

#[async_trait]
impl OperationRepository for InMemoryOperationRepository {
    async fn save(&self, operation: &Operation) -> Result<(), RepositoryError> {
        let mut operations = self.operations.write().await;
        let stored = operations.entry(operation.account_id()).or_default();

        match stored.iter_mut().find(|existing| existing.id() == operation.id()) {
            Some(existing) => *existing = operation.clone(),
            None => stored.push(operation.clone()),
        }

        tracing::debug!(
            account_id = %operation.account_id(),
            operation_id = %operation.id(),
            kind = %operation.kind(),
            "Saved operation"
        );
        Ok(())
    }

    async fn delete(&self, account_id: AccountId, operation_id: OperationId) -> Result<(), RepositoryError> {
        let mut operations = self.operations.write().await;
        if let Some(stored) = operations.get_mut(&account_id) {
            stored.retain(|operation| operation.id() != operation_id);
        }

        tracing::debug!(account_id = %account_id, operation_id = %operation_id, "Deleted operation");
        Ok(())
    }

    async fn find_by_account_id(&self, account_id: AccountId) -> Result<Vec<Operation>, RepositoryError> {
        let operations = self.operations.read().await;
        Ok(operations
            .get(&account_id)
            .map(|stored| Self::most_recent_first(stored.iter()))
            .unwrap_or_default())
    }

    async fn find_by_account_id_between(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Operation>, RepositoryError> {
        let operations = self.operations.read().await;
        Ok(operations
            .get(&account_id)
            .map(|stored| {
                Self::most_recent_first(
                    stored.iter().filter(|op| op.at() >= from && op.at() <= to),
                )
            })
            .unwrap_or_default())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{AccountType, OperationId, OperationKind};
    use crate::domain::clock::FixedClock;
    use crate::domain::money::Money;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()
    }

    fn setup() -> (Arc<InMemoryOperationRepository>, InMemoryAccountRepository, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(start()));
        let operations = Arc::new(InMemoryOperationRepository::new());
        let accounts = InMemoryAccountRepository::new(operations.clone(), clock.clone());
        (operations, accounts, clock)
    }

    fn operation(account_id: AccountId, minutes: i64, label: &str) -> Operation {
        Operation::restore(
            OperationId::new(),
            account_id,
            Money::from(1),
            OperationKind::Deposit,
            start() + Duration::minutes(minutes),
            Some(label.to_string()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_find_missing_account_fails() {
        let (_, accounts, _) = setup();
        let id = AccountId::new();

        let error = accounts.find_by_id(id).await.unwrap_err();
        assert_eq!(error, RepositoryError::AccountNotFound(id));
    }

    #[tokio::test]
    async fn test_save_and_load_account_with_history() {
        let (operations, accounts, clock) = setup();
        let mut account = Account::open_current(Money::from(-50), clock.clone()).unwrap();

        let deposit = account.deposit(Money::from(20)).unwrap();
        clock.advance(Duration::seconds(1));
        let withdrawal = account.withdraw(Money::from(60)).unwrap();

        assert_eq!(accounts.save(&account).await.unwrap(), 1);
        operations.save(&deposit).await.unwrap();
        operations.save(&withdrawal).await.unwrap();

        let loaded = accounts.find_by_id(account.id()).await.unwrap();
        assert_eq!(loaded.account_type(), AccountType::Current);
        assert_eq!(loaded.balance(), Money::from(-40));
        assert_eq!(loaded.overdraft(), Some(Money::from(-50)));
        assert_eq!(loaded.operations().to_vec(), vec![withdrawal, deposit]);
    }

    #[tokio::test]
    async fn test_save_is_an_upsert_that_bumps_version() {
        let (_, accounts, clock) = setup();
        let mut account = Account::open_savings(Money::from(100), clock).unwrap();

        assert_eq!(accounts.save(&account).await.unwrap(), 1);
        assert_eq!(accounts.save(&account).await.unwrap(), 2);
        account.deposit(Money::from(10)).unwrap();
        assert_eq!(accounts.save(&account).await.unwrap(), 3);

        assert_eq!(accounts.len().await, 1);
        assert_eq!(accounts.version(account.id()).await, Some(3));
        assert_eq!(accounts.record(account.id()).await.unwrap().balance, Money::from(10));
    }

    #[tokio::test]
    async fn test_corrupted_record_surfaces_as_error() {
        let (_, accounts, clock) = setup();
        let account = Account::open_current(Money::zero(), clock).unwrap();
        accounts.save(&account).await.unwrap();

        let mut record = accounts.record(account.id()).await.unwrap();
        record.overdraft = Some(Money::from(10));
        accounts.put_record(record).await;

        let error = accounts.find_by_id(account.id()).await.unwrap_err();
        assert!(matches!(error, RepositoryError::Corrupted(_)));
        assert_eq!(accounts.version(account.id()).await, Some(1));
    }

    #[tokio::test]
    async fn test_operations_between_uses_inclusive_bounds() {
        let (operations, _, _) = setup();
        let id = AccountId::new();

        for (minutes, label) in [(0, "a"), (10, "b"), (20, "c"), (30, "d")] {
            operations.save(&operation(id, minutes, label)).await.unwrap();
        }
        operations.save(&operation(AccountId::new(), 10, "other")).await.unwrap();

        let found = operations
            .find_by_account_id_between(id, start() + Duration::minutes(10), start() + Duration::minutes(20))
            .await
            .unwrap();
        let labels: Vec<&str> = found.iter().map(|op| op.label()).collect();
        assert_eq!(labels, vec!["c", "b"]);

        let none = operations
            .find_by_account_id_between(AccountId::new(), start(), start() + Duration::days(1))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_saving_same_operation_twice_is_idempotent() {
        let (operations, _, _) = setup();
        let id = AccountId::new();
        let op = operation(id, 0, "once");

        operations.save(&op).await.unwrap();
        operations.save(&op).await.unwrap();

        assert_eq!(operations.find_by_account_id(id).await.unwrap(), vec![op]);
    }

    #[tokio::test]
    async fn test_delete_removes_only_the_target() {
        let (operations, accounts, clock) = setup();
        let id = AccountId::new();
        let kept = operation(id, 0, "kept");
        let dropped = operation(id, 5, "dropped");
        operations.save(&kept).await.unwrap();
        operations.save(&dropped).await.unwrap();

        operations.delete(id, dropped.id()).await.unwrap();
        operations.delete(AccountId::new(), kept.id()).await.unwrap();
        assert_eq!(operations.find_by_account_id(id).await.unwrap(), vec![kept]);

        let account = Account::open_savings(Money::from(10), clock).unwrap();
        accounts.save(&account).await.unwrap();
        accounts.delete(account.id()).await.unwrap();
        accounts.delete(account.id()).await.unwrap();
        assert!(accounts.is_empty().await);
        assert_eq!(accounts.version(account.id()).await, None);
    }

    #[tokio::test]
    async fn test_equal_timestamps_return_latest_save_first() {
        let (operations, _, _) = setup();
        let id = AccountId::new();

        operations.save(&operation(id, 0, "first")).await.unwrap();
        operations.save(&operation(id, 0, "second")).await.unwrap();

        let labels: Vec<String> = operations
            .find_by_account_id(id)
            .await
            .unwrap()
            .iter()
            .map(|op| op.label().to_string())
            .collect();
        assert_eq!(labels, vec!["second", "first"]);
    }
}
