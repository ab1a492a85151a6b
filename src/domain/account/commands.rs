use crate::domain::money::Money;
use super::value_objects::AccountId;

// ============================================================================
// Account Commands - Represent user intent
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum AccountCommand {
    OpenCurrent {
        overdraft: Money,
    },
    OpenSavings {
        ceiling: Money,
    },
    Deposit {
        account_id: AccountId,
        amount: Money,
    },
    Withdraw {
        account_id: AccountId,
        amount: Money,
    },
    AdjustOverdraft {
        account_id: AccountId,
        limit: Money,
    },
    AdjustCeiling {
        account_id: AccountId,
        ceiling: Money,
    },
}

impl AccountCommand {
    /// Label used for metrics and logs
    pub fn name(&self) -> &'static str {
        match self {
            AccountCommand::OpenCurrent { .. } => "open_current",
            AccountCommand::OpenSavings { .. } => "open_savings",
            AccountCommand::Deposit { .. } => "deposit",
            AccountCommand::Withdraw { .. } => "withdraw",
            AccountCommand::AdjustOverdraft { .. } => "adjust_overdraft",
            AccountCommand::AdjustCeiling { .. } => "adjust_ceiling",
        }
    }
}
