use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::account::{Account, AccountId, AccountType, DomainError, Operation};
use crate::domain::clock::Clock;
use crate::domain::money::Money;

// ============================================================================
// Account Record - Persisted shape of an account
// ============================================================================
//
// Only the limit that matches the account type is written:
// CURRENT -> overdraft (<= 0), ceiling empty
// SAVINGS -> ceiling (> 0), overdraft empty
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: AccountId,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub balance: Money,
    pub overdraft: Option<Money>,
    pub ceiling: Option<Money>,
}

impl AccountRecord {
    /// Rebuild the aggregate through `Account::rehydrate`
    pub fn into_account(
        self,
        operations: Vec<Operation>,
        clock: Arc<dyn Clock>,
    ) -> Result<Account, DomainError> {
        Account::rehydrate(
            self.id,
            self.account_type,
            self.balance,
            operations,
            self.overdraft,
            self.ceiling,
            clock,
        )
    }
}

impl From<&Account> for AccountRecord {
    fn from(account: &Account) -> Self {
        let (overdraft, ceiling) = match account.account_type() {
            AccountType::Current => (account.overdraft(), None),
            AccountType::Savings => (None, account.ceiling()),
        };

        Self {
            id: account.id(),
            account_type: account.account_type(),
            balance: account.balance(),
            overdraft,
            ceiling,
        }
    }
}
