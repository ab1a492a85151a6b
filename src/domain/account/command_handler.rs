use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use crate::domain::clock::Clock;
use crate::domain::money::Money;
use crate::event_sourcing::{EventEnvelope, EventPublisher};
use crate::metrics::Metrics;
use crate::repository::{AccountRepository, OperationRepository, RepositoryError};
use crate::utils::{retry_on_transient, RetryConfig};

use super::aggregate::Account;
use super::commands::AccountCommand;
use super::errors::DomainError;
use super::events::{
    AccountEvent, AccountOpened, AccountOperationPerformed, CeilingAdjusted, OverdraftAdjusted,
};
use super::operation::Operation;
use super::value_objects::AccountId;

// ============================================================================
// Account Command Handler
// ============================================================================
//
// Orchestrates: Command → Aggregate → Repositories → Outbox
//
// Nothing is saved when the aggregate rejects a command, and a failed write
// or publish is undone. The stored account version doubles as the envelope
// sequence number.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Publish(anyhow::Error),
}

impl ServiceError {
    /// HTTP status a boundary should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Domain(error) => domain_status(error),
            ServiceError::Repository(RepositoryError::AccountNotFound(_)) => 404,
            ServiceError::Repository(RepositoryError::Unavailable(_)) => 503,
            ServiceError::Repository(RepositoryError::Corrupted(_)) => 500,
            ServiceError::Publish(_) => 500,
        }
    }
}

fn domain_status(error: &DomainError) -> u16 {
    match error {
        DomainError::CeilingExceeded { .. } | DomainError::InsufficientFunds { .. } => 422,
        DomainError::BusinessRuleViolation(_) => 400,
        DomainError::InvalidAmount(_)
        | DomainError::MissingField(_)
        | DomainError::InvariantViolation(_) => 500,
    }
}

/// Label for `bank_operation_rejections_total`
fn rejection_reason(error: &DomainError) -> &'static str {
    match error {
        DomainError::CeilingExceeded { .. } => "ceiling_exceeded",
        DomainError::InsufficientFunds { .. } => "insufficient_funds",
        DomainError::BusinessRuleViolation(_) => "business_rule",
        DomainError::InvalidAmount(_)
        | DomainError::MissingField(_)
        | DomainError::InvariantViolation(_) => "invariant",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub account_id: AccountId,
    pub balance: Money,
    /// Set for deposits and withdrawals
    pub operation: Option<Operation>,
}

pub struct AccountCommandHandler {
    accounts: Arc<dyn AccountRepository>,
    operations: Arc<dyn OperationRepository>,
    publisher: Arc<dyn EventPublisher<AccountEvent>>,
    metrics: Arc<Metrics>,
    clock: Arc<dyn Clock>,
    retry: RetryConfig,
}

impl AccountCommandHandler {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        operations: Arc<dyn OperationRepository>,
        publisher: Arc<dyn EventPublisher<AccountEvent>>,
        metrics: Arc<Metrics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            operations,
            publisher,
            metrics,
            clock,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Handle a command with a fresh correlation id
    pub async fn handle(&self, command: AccountCommand) -> Result<CommandOutcome, ServiceError> {
        self.handle_correlated(command, Uuid::new_v4()).await
    }

    /// Handle a command and persist its effects
    pub async fn handle_correlated(
        &self,
        command: AccountCommand,
        correlation_id: Uuid,
    ) -> Result<CommandOutcome, ServiceError> {
        let name = command.name();
        let started = Instant::now();

        let result = self.execute(command, correlation_id).await;
        self.metrics.observe_command(name, started.elapsed().as_secs_f64());

        match &result {
            Ok(outcome) => {
                tracing::info!(
                    command = name,
                    account_id = %outcome.account_id,
                    balance = %outcome.balance,
                    %correlation_id,
                    "Command handled"
                );
            }
            Err(ServiceError::Domain(error)) => {
                self.metrics.record_rejection(rejection_reason(error));
                if error.is_business_specific() {
                    tracing::info!(command = name, error = %error, %correlation_id, "Balance limit reached");
                } else if error.is_recoverable() {
                    tracing::info!(command = name, error = %error, %correlation_id, "Command rejected");
                } else {
                    tracing::error!(command = name, error = %error, %correlation_id, "Command broke an invariant");
                }
            }
            Err(error) => {
                tracing::error!(command = name, error = %error, %correlation_id, "Command failed");
            }
        }

        result
    }

    async fn execute(
        &self,
        command: AccountCommand,
        correlation_id: Uuid,
    ) -> Result<CommandOutcome, ServiceError> {
        match command {
            AccountCommand::OpenCurrent { overdraft } => {
                let account = Account::open_current(overdraft, self.clock.clone())?;
                self.open(account, correlation_id).await
            }
            AccountCommand::OpenSavings { ceiling } => {
                let account = Account::open_savings(ceiling, self.clock.clone())?;
                self.open(account, correlation_id).await
            }
            AccountCommand::Deposit { account_id, amount } => {
                let mut account = self.load(account_id).await?;
                let previous = account.clone();
                let operation = account.deposit(amount)?;
                self.record_operation(&previous, account, operation, correlation_id).await
            }
            AccountCommand::Withdraw { account_id, amount } => {
                let mut account = self.load(account_id).await?;
                let previous = account.clone();
                let operation = account.withdraw(amount)?;
                self.record_operation(&previous, account, operation, correlation_id).await
            }
            AccountCommand::AdjustOverdraft { account_id, limit } => {
                let mut account = self.load(account_id).await?;
                let previous = account.clone();
                account.adjust_overdraft_limit(limit)?;

                let event = AccountEvent::OverdraftAdjusted(OverdraftAdjusted {
                    account_id,
                    previous: previous.overdraft(),
                    current: limit,
                });
                self.commit(Some(&previous), &account, None, event, correlation_id).await?;
                Ok(outcome(&account, None))
            }
            AccountCommand::AdjustCeiling { account_id, ceiling } => {
                let mut account = self.load(account_id).await?;
                let previous = account.clone();
                account.adjust_ceiling(ceiling)?;

                let event = AccountEvent::CeilingAdjusted(CeilingAdjusted {
                    account_id,
                    previous: previous.ceiling(),
                    current: ceiling,
                });
                self.commit(Some(&previous), &account, None, event, correlation_id).await?;
                Ok(outcome(&account, None))
            }
        }
    }

    async fn open(&self, account: Account, correlation_id: Uuid) -> Result<CommandOutcome, ServiceError> {
        let event = AccountEvent::Opened(AccountOpened {
            account_id: account.id(),
            account_type: account.account_type(),
            overdraft: account.overdraft(),
            ceiling: account.ceiling(),
        });
        self.commit(None, &account, None, event, correlation_id).await?;
        self.metrics.record_account_opened(account.account_type().as_str());

        Ok(outcome(&account, None))
    }

    async fn record_operation(
        &self,
        previous: &Account,
        account: Account,
        operation: Operation,
        correlation_id: Uuid,
    ) -> Result<CommandOutcome, ServiceError> {
        let event = AccountEvent::OperationPerformed(AccountOperationPerformed::from(&operation));
        self.commit(Some(previous), &account, Some(&operation), event, correlation_id)
            .await?;
        self.metrics.record_operation(operation.kind().as_str());

        Ok(outcome(&account, Some(operation)))
    }

    // ========================================================================
    // All-or-nothing write
    // ========================================================================
    //
    // operation -> account -> outbox. When a step fails, the steps already
    // done are undone, so the caller's error always means "nothing changed".
    // `previous` is the state loaded before the command, `None` when opening.
    //
    // ========================================================================

    async fn commit(
        &self,
        previous: Option<&Account>,
        account: &Account,
        operation: Option<&Operation>,
        event: AccountEvent,
        correlation_id: Uuid,
    ) -> Result<(), ServiceError> {
        if let Some(operation) = operation {
            self.save_operation(operation).await?;
        }

        let version = match self.save_account(account).await {
            Ok(version) => version,
            Err(error) => {
                if let Some(operation) = operation {
                    self.discard_operation(operation).await;
                }
                return Err(error.into());
            }
        };

        if let Err(error) = self.publish(account, version, event, correlation_id).await {
            self.restore_account(account.id(), previous).await;
            if let Some(operation) = operation {
                self.discard_operation(operation).await;
            }
            return Err(error);
        }

        Ok(())
    }

    async fn discard_operation(&self, operation: &Operation) {
        let result = self.operations.delete(operation.account_id(), operation.id()).await;
        match result {
            Ok(()) => tracing::warn!(
                account_id = %operation.account_id(),
                operation_id = %operation.id(),
                "Rolled back operation"
            ),
            Err(error) => tracing::error!(
                account_id = %operation.account_id(),
                operation_id = %operation.id(),
                error = %error,
                "Failed to roll back operation"
            ),
        }
    }

    async fn restore_account(&self, account_id: AccountId, previous: Option<&Account>) {
        let result = match previous {
            Some(previous) => self.accounts.save(previous).await.map(|_| ()),
            None => self.accounts.delete(account_id).await,
        };
        match result {
            Ok(()) => tracing::warn!(account_id = %account_id, "Rolled back account"),
            Err(error) => tracing::error!(
                account_id = %account_id,
                error = %error,
                "Failed to roll back account"
            ),
        }
    }

    async fn publish(
        &self,
        account: &Account,
        version: u64,
        event: AccountEvent,
        correlation_id: Uuid,
    ) -> Result<(), ServiceError> {
        let envelope = EventEnvelope::new(
            account.id().as_uuid(),
            version as i64,
            event.name(),
            event,
            correlation_id,
            self.clock.now(),
        )
        .with_metadata("account_type", account.account_type().as_str());

        self.publisher.publish(envelope).await.map_err(ServiceError::Publish)
    }

    // ========================================================================
    // Storage access with retry
    // ========================================================================

    async fn load(&self, account_id: AccountId) -> Result<Account, RepositoryError> {
        let metrics = &self.metrics;
        retry_on_transient(&self.retry, |attempt| {
            if attempt > 1 {
                metrics.record_retry_attempt("find_account");
            }
            self.accounts.find_by_id(account_id)
        })
        .await
        .into_result()
    }

    async fn save_account(&self, account: &Account) -> Result<u64, RepositoryError> {
        let metrics = &self.metrics;
        retry_on_transient(&self.retry, |attempt| {
            if attempt > 1 {
                metrics.record_retry_attempt("save_account");
            }
            self.accounts.save(account)
        })
        .await
        .into_result()
    }

    async fn save_operation(&self, operation: &Operation) -> Result<(), RepositoryError> {
        let metrics = &self.metrics;
        retry_on_transient(&self.retry, |attempt| {
            if attempt > 1 {
                metrics.record_retry_attempt("save_operation");
            }
            self.operations.save(operation)
        })
        .await
        .into_result()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Operations with `from <= at <= to`, most recent first
    pub async fn operations_between(
        &self,
        account_id: AccountId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Operation>, ServiceError> {
        self.load(account_id).await?;

        let operations = self
            .operations
            .find_by_account_id_between(account_id, from, to)
            .await?;

        tracing::debug!(
            account_id = %account_id,
            %from,
            %to,
            count = operations.len(),
            "Listed operations"
        );
        Ok(operations)
    }

    /// Operations since the first instant of the current UTC month, up to now
    pub async fn monthly_operations(&self, account_id: AccountId) -> Result<Vec<Operation>, ServiceError> {
        let now = self.clock.now();
        let month_start = now
            .date_naive()
            .with_day(1)
            .and_then(|day| day.and_hms_opt(0, 0, 0))
            .map(|start| start.and_utc())
            .ok_or_else(|| DomainError::invariant(format!("no month start for {now}")))?;

        self.operations_between(account_id, month_start, now).await
    }
}

fn outcome(account: &Account, operation: Option<Operation>) -> CommandOutcome {
    CommandOutcome {
        account_id: account.id(),
        balance: account.balance(),
        operation,
    }
}

// ============================================================================
// Tests
// ============================================================================
