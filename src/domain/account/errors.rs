use crate::domain::money::Money;

// ============================================================================
// Account Domain Errors
// ============================================================================
//
// Invariant errors signal a defect in the caller or in stored data.
// Business rule errors are expected rejections of a user request.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Programmer or integration error, never recovered locally
    Invariant,
    /// Recoverable rejection of a business action
    BusinessRule,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("Operation amount must be greater than 0.00, got {0}")]
    InvalidAmount(Money),

    #[error("Required field is missing: {0}")]
    MissingField(&'static str),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Business rule violated: {0}")]
    BusinessRuleViolation(String),

    #[error("Deposit {deposit} would exceed ceiling {ceiling} (balance {balance})")]
    CeilingExceeded {
        balance: Money,
        deposit: Money,
        ceiling: Money,
    },

    #[error("Insufficient funds: amount {amount}, balance {balance}, overdraft {limit}")]
    InsufficientFunds {
        balance: Money,
        amount: Money,
        limit: Money,
    },
}

impl DomainError {
    pub fn invariant(message: impl Into<String>) -> Self {
        DomainError::InvariantViolation(message.into())
    }

    pub fn business_rule(message: impl Into<String>) -> Self {
        DomainError::BusinessRuleViolation(message.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            DomainError::InvalidAmount(_)
            | DomainError::MissingField(_)
            | DomainError::InvariantViolation(_) => ErrorCategory::Invariant,
            DomainError::BusinessRuleViolation(_)
            | DomainError::CeilingExceeded { .. }
            | DomainError::InsufficientFunds { .. } => ErrorCategory::BusinessRule,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.category() == ErrorCategory::BusinessRule
    }

    /// True for the balance-limit rejections (ceiling, overdraft)
    pub fn is_business_specific(&self) -> bool {
        matches!(
            self,
            DomainError::CeilingExceeded { .. } | DomainError::InsufficientFunds { .. }
        )
    }
}
