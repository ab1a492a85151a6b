use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::money::Money;
use crate::event_sourcing::DomainEvent;
use super::operation::Operation;
use super::value_objects::{AccountId, AccountType, OperationId, OperationKind};

// ============================================================================
// Account Events - Facts published after a successful command
// ============================================================================

/// Account Event - Union type for all account events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AccountEvent {
    Opened(AccountOpened),
    OperationPerformed(AccountOperationPerformed),
    OverdraftAdjusted(OverdraftAdjusted),
    CeilingAdjusted(CeilingAdjusted),
}

impl AccountEvent {
    /// Name stored in the envelope's `event_type`
    pub fn name(&self) -> &'static str {
        match self {
            AccountEvent::Opened(_) => "AccountOpened",
            AccountEvent::OperationPerformed(_) => "AccountOperationPerformed",
            AccountEvent::OverdraftAdjusted(_) => "OverdraftAdjusted",
            AccountEvent::CeilingAdjusted(_) => "CeilingAdjusted",
        }
    }
}

impl DomainEvent for AccountEvent {
    fn event_type() -> &'static str {
        "AccountEvent"
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountOpened {
    pub account_id: AccountId,
    pub account_type: AccountType,
    pub overdraft: Option<Money>,
    pub ceiling: Option<Money>,
}

/// One deposit or withdrawal, as seen by downstream consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountOperationPerformed {
    pub account_id: AccountId,
    pub operation_id: OperationId,
    pub amount: Money,
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub at: DateTime<Utc>,
}

impl From<&Operation> for AccountOperationPerformed {
    fn from(operation: &Operation) -> Self {
        Self {
            account_id: operation.account_id(),
            operation_id: operation.id(),
            amount: operation.amount(),
            kind: operation.kind(),
            at: operation.at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverdraftAdjusted {
    pub account_id: AccountId,
    pub previous: Option<Money>,
    pub current: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CeilingAdjusted {
    pub account_id: AccountId,
    pub previous: Option<Money>,
    pub current: Money,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::FixedClock;
    use crate::event_sourcing::{deserialize_event, serialize_event};
    use chrono::TimeZone;

    #[test]
    fn test_operation_performed_copies_operation_fields() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap());
        let operation = Operation::create(
            AccountId::new(),
            Money::parse("99.99").unwrap(),
            OperationKind::Withdrawal,
            &clock,
        )
        .unwrap();

        let event = AccountOperationPerformed::from(&operation);

        assert_eq!(event.account_id, operation.account_id());
        assert_eq!(event.operation_id, operation.id());
        assert_eq!(event.amount, operation.amount());
        assert_eq!(event.kind, OperationKind::Withdrawal);
        assert_eq!(event.at, operation.at());
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = AccountEvent::Opened(AccountOpened {
            account_id: AccountId::new(),
            account_type: AccountType::Savings,
            overdraft: None,
            ceiling: Some(Money::from(300)),
        });

        let json = serialize_event(&event).unwrap();
        assert!(json.contains("\"type\":\"Opened\""));
        assert!(json.contains("\"ceiling\":\"300.00\""));

        let decoded: AccountEvent = deserialize_event(&json).unwrap();
        assert_eq!(decoded, event);
        assert_eq!(decoded.name(), "AccountOpened");
    }
}
