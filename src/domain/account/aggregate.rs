use std::sync::Arc;

use crate::domain::clock::Clock;
use crate::domain::money::Money;
use super::errors::DomainError;
use super::history::OperationHistory;
use super::operation::Operation;
use super::policies::{CeilingPolicy, OverdraftPolicy};
use super::value_objects::{AccountId, AccountType, OperationKind};

// ============================================================================
// Account Aggregate - Domain Logic
// ============================================================================
//
// Invariants:
// - CURRENT accounts carry NoCeiling + FixedOverdraft(limit <= 0)
// - SAVINGS accounts carry NoOverdraft + FixedCeiling(ceiling > 0)
// - the balance only changes through deposit/withdraw, each producing
//   exactly one operation
// - a rejected command leaves balance and history untouched
//
// ============================================================================

#[derive(Debug, Clone)]
pub struct Account {
    // Identity
    id: AccountId,
    account_type: AccountType,
    clock: Arc<dyn Clock>,

    // Current State
    balance: Money,
    overdraft_policy: OverdraftPolicy,
    ceiling_policy: CeilingPolicy,
    operations: OperationHistory,
}

impl Account {
    /// Open a current account with an overdraft limit of zero or below
    pub fn open_current(overdraft_limit: Money, clock: Arc<dyn Clock>) -> Result<Self, DomainError> {
        validate_overdraft_limit(overdraft_limit)?;

        Ok(Self {
            id: AccountId::new(),
            account_type: AccountType::Current,
            clock,
            balance: Money::zero(),
            overdraft_policy: OverdraftPolicy::FixedOverdraft(overdraft_limit),
            ceiling_policy: CeilingPolicy::NoCeiling,
            operations: OperationHistory::new(),
        })
    }

    /// Open a savings account with a strictly positive ceiling
    pub fn open_savings(ceiling: Money, clock: Arc<dyn Clock>) -> Result<Self, DomainError> {
        validate_ceiling(ceiling)?;

        Ok(Self {
            id: AccountId::new(),
            account_type: AccountType::Savings,
            clock,
            balance: Money::zero(),
            overdraft_policy: OverdraftPolicy::NoOverdraft,
            ceiling_policy: CeilingPolicy::FixedCeiling(ceiling),
            operations: OperationHistory::new(),
        })
    }

    /// Rebuild an account from persisted state.
    ///
    /// The stored balance is authoritative; past operations are not replayed.
    /// Policy parameters that do not fit the account type are an invariant
    /// violation, as is an operation that belongs to another account.
    pub fn rehydrate(
        id: AccountId,
        account_type: AccountType,
        balance: Money,
        past_operations: Vec<Operation>,
        overdraft: Option<Money>,
        ceiling: Option<Money>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DomainError> {
        let (overdraft_policy, ceiling_policy) = match account_type {
            AccountType::Current => {
                let limit = overdraft.ok_or_else(|| {
                    DomainError::invariant("persisted overdraft is required for CURRENT")
                })?;
                if limit.is_positive() {
                    return Err(DomainError::invariant(format!(
                        "persisted overdraft must be zero or negative for CURRENT, got {limit}"
                    )));
                }
                if ceiling.is_some() {
                    return Err(DomainError::invariant("CURRENT accounts cannot carry a ceiling"));
                }
                (OverdraftPolicy::FixedOverdraft(limit), CeilingPolicy::NoCeiling)
            }
            AccountType::Savings => {
                let ceiling = ceiling.ok_or_else(|| {
                    DomainError::invariant("persisted ceiling is required for SAVINGS")
                })?;
                if !ceiling.is_positive() {
                    return Err(DomainError::invariant(format!(
                        "persisted ceiling must be strictly positive for SAVINGS, got {ceiling}"
                    )));
                }
                if overdraft.is_some() {
                    return Err(DomainError::invariant("SAVINGS accounts cannot carry an overdraft"));
                }
                (OverdraftPolicy::NoOverdraft, CeilingPolicy::FixedCeiling(ceiling))
            }
        };

        if let Some(foreign) = past_operations.iter().find(|op| op.account_id() != id) {
            return Err(DomainError::invariant(format!(
                "operation {} belongs to account {}, not {}",
                foreign.id(),
                foreign.account_id(),
                id
            )));
        }

        Ok(Self {
            id,
            account_type,
            clock,
            balance,
            overdraft_policy,
            ceiling_policy,
            operations: OperationHistory::from_operations(past_operations),
        })
    }

    // ========================================================================
    // Commands
    // ========================================================================

    pub fn deposit(&mut self, amount: Money) -> Result<Operation, DomainError> {
        if !amount.is_positive() {
            return Err(DomainError::business_rule("deposit must be strictly positive"));
        }
        self.ceiling_policy.validate_deposit(self.balance, amount)?;

        self.record(amount, OperationKind::Deposit)
    }

    pub fn withdraw(&mut self, amount: Money) -> Result<Operation, DomainError> {
        if !amount.is_positive() {
            return Err(DomainError::business_rule("withdraw must be strictly positive"));
        }
        self.overdraft_policy.validate_withdraw(self.balance, amount)?;

        self.record(amount, OperationKind::Withdrawal)
    }

    /// Replace the overdraft limit; past operations are not re-validated
    pub fn adjust_overdraft_limit(&mut self, new_limit: Money) -> Result<(), DomainError> {
        if self.account_type != AccountType::Current {
            return Err(DomainError::business_rule("only current accounts can adjust overdraft"));
        }
        validate_overdraft_limit(new_limit)?;

        self.overdraft_policy = OverdraftPolicy::FixedOverdraft(new_limit);
        Ok(())
    }

    /// Replace the ceiling; the current balance may end up above it
    pub fn adjust_ceiling(&mut self, new_ceiling: Money) -> Result<(), DomainError> {
        if self.account_type != AccountType::Savings {
            return Err(DomainError::business_rule("only savings accounts can adjust ceiling"));
        }
        validate_ceiling(new_ceiling)?;

        self.ceiling_policy = CeilingPolicy::FixedCeiling(new_ceiling);
        Ok(())
    }

    fn record(&mut self, amount: Money, kind: OperationKind) -> Result<Operation, DomainError> {
        let operation = Operation::create(self.id, amount, kind, self.clock.as_ref())?;

        self.balance = operation.apply_to(self.balance)?;
        self.operations.insert(operation.clone());

        Ok(operation)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    /// Overdraft limit, `None` for savings accounts
    pub fn overdraft(&self) -> Option<Money> {
        self.overdraft_policy.limit()
    }

    /// Ceiling, `None` for current accounts
    pub fn ceiling(&self) -> Option<Money> {
        self.ceiling_policy.ceiling()
    }

    pub fn overdraft_policy(&self) -> OverdraftPolicy {
        self.overdraft_policy
    }

    pub fn ceiling_policy(&self) -> CeilingPolicy {
        self.ceiling_policy
    }

    /// Operations, most recent first
    pub fn operations(&self) -> &OperationHistory {
        &self.operations
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

fn validate_overdraft_limit(limit: Money) -> Result<(), DomainError> {
    if limit.is_positive() {
        return Err(DomainError::business_rule("overdraft must be zero or negative"));
    }
    Ok(())
}

fn validate_ceiling(ceiling: Money) -> Result<(), DomainError> {
    if !ceiling.is_positive() {
        return Err(DomainError::business_rule("ceiling must be strictly positive"));
    }
    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================
