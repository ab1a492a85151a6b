use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::clock::Clock;
use crate::domain::money::Money;
use super::errors::DomainError;
use super::value_objects::{AccountId, OperationId, OperationKind};

// ============================================================================
// Operation - Immutable record of one balance change
// ============================================================================

/// A deposit or withdrawal that has been applied to an account.
///
/// Built by the account through [`Operation::create`] or restored from
/// storage. Serialization goes through [`OperationRecord`] so decoded values
/// are validated like any other restored operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "OperationRecord", into = "OperationRecord")]
pub struct Operation {
    id: OperationId,
    account_id: AccountId,
    amount: Money,
    kind: OperationKind,
    at: DateTime<Utc>,
    label: String,
}

impl Operation {
    /// Stamp a new operation with a fresh id and the clock's current time
    pub fn create(
        account_id: AccountId,
        amount: Money,
        kind: OperationKind,
        clock: &dyn Clock,
    ) -> Result<Self, DomainError> {
        Self::restore(OperationId::new(), account_id, amount, kind, clock.now(), None)
    }

    /// Rebuild a stored operation; a missing label falls back to the default
    pub fn restore(
        id: OperationId,
        account_id: AccountId,
        amount: Money,
        kind: OperationKind,
        at: DateTime<Utc>,
        label: Option<String>,
    ) -> Result<Self, DomainError> {
        if !amount.is_positive() {
            return Err(DomainError::InvalidAmount(amount));
        }

        Ok(Self {
            id,
            account_id,
            amount,
            kind,
            at,
            label: label.unwrap_or_else(|| kind.default_label().to_string()),
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Balance after this operation; policies already ran upstream.
    ///
    /// Fails only when the result leaves the decimal range.
    pub fn apply_to(&self, balance: Money) -> Result<Money, DomainError> {
        let after = match self.kind {
            OperationKind::Deposit => balance.checked_add(&self.amount),
            OperationKind::Withdrawal => balance.checked_sub(&self.amount),
        };
        after.ok_or_else(|| DomainError::business_rule("amount out of range"))
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

// ============================================================================
// Operation Record - Storage/wire shape
// ============================================================================

/// Loosely-typed operation as read from storage; every field may be absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub id: Option<OperationId>,
    pub account_id: Option<AccountId>,
    pub amount: Option<Money>,
    #[serde(rename = "type")]
    pub kind: Option<OperationKind>,
    pub at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl TryFrom<OperationRecord> for Operation {
    type Error = DomainError;

    fn try_from(record: OperationRecord) -> Result<Self, Self::Error> {
        let id = record.id.ok_or(DomainError::MissingField("id"))?;
        let account_id = record.account_id.ok_or(DomainError::MissingField("account_id"))?;
        let amount = record.amount.ok_or(DomainError::MissingField("amount"))?;
        let kind = record.kind.ok_or(DomainError::MissingField("type"))?;
        let at = record.at.ok_or(DomainError::MissingField("at"))?;

        Operation::restore(id, account_id, amount, kind, at, record.label)
    }
}

impl From<Operation> for OperationRecord {
    fn from(operation: Operation) -> Self {
        Self {
            id: Some(operation.id),
            account_id: Some(operation.account_id),
            amount: Some(operation.amount),
            kind: Some(operation.kind),
            at: Some(operation.at),
            label: Some(operation.label),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
