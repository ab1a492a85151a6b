use serde::{Deserialize, Serialize};

use crate::domain::money::Money;
use super::errors::DomainError;

// ============================================================================
// Balance Policies
// ============================================================================
//
// Two independent families, each with a null-object variant, so the account
// validates every deposit and withdrawal the same way whatever its type.
// Policies never mutate what they inspect; they are replaced wholesale when
// a limit changes.
//
// ============================================================================

/// Upper bound on the balance reachable through deposits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CeilingPolicy {
    NoCeiling,
    FixedCeiling(Money),
}

impl CeilingPolicy {
    /// Deposit positivity is checked by the account before this runs
    pub fn validate_deposit(&self, balance: Money, deposit: Money) -> Result<(), DomainError> {
        match self {
            CeilingPolicy::NoCeiling => Ok(()),
            CeilingPolicy::FixedCeiling(ceiling) => match balance.checked_add(&deposit) {
                Some(after) if after.less_than_or_equal(ceiling) => Ok(()),
                // an overflowing sum is above any ceiling
                _ => Err(DomainError::CeilingExceeded {
                    balance,
                    deposit,
                    ceiling: *ceiling,
                }),
            },
        }
    }

    pub fn ceiling(&self) -> Option<Money> {
        match self {
            CeilingPolicy::NoCeiling => None,
            CeilingPolicy::FixedCeiling(ceiling) => Some(*ceiling),
        }
    }
}

/// Lower bound on the balance reachable through withdrawals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverdraftPolicy {
    NoOverdraft,
    FixedOverdraft(Money),
}

impl OverdraftPolicy {
    pub fn validate_withdraw(&self, balance: Money, withdraw: Money) -> Result<(), DomainError> {
        let floor = self.floor();
        match balance.checked_sub(&withdraw) {
            Some(after) if after.greater_than_or_equal(&floor) => Ok(()),
            _ => Err(DomainError::InsufficientFunds {
                balance,
                amount: withdraw,
                limit: floor,
            }),
        }
    }

    /// The configured limit, `None` when no overdraft is allowed
    pub fn limit(&self) -> Option<Money> {
        match self {
            OverdraftPolicy::NoOverdraft => None,
            OverdraftPolicy::FixedOverdraft(limit) => Some(*limit),
        }
    }

    /// Lowest balance a withdrawal may leave behind
    pub fn floor(&self) -> Money {
        self.limit().unwrap_or_else(Money::zero)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;

    fn money(text: &str) -> Money {
        Money::parse(text).unwrap()
    }

    #[test]
    fn test_no_ceiling_accepts_everything() {
        let policy = CeilingPolicy::NoCeiling;
        assert!(policy.validate_deposit(money("1000000000"), money("999999999.99")).is_ok());
        assert_eq!(policy.ceiling(), None);
    }

    #[rstest]
    #[case("0", "300", true)]
    #[case("200", "100", true)]
    #[case("200", "100.01", false)]
    #[case("200", "150", false)]
    #[case("300", "0.01", false)]
    fn test_fixed_ceiling_boundary(#[case] balance: &str, #[case] deposit: &str, #[case] accepted: bool) {
        let policy = CeilingPolicy::FixedCeiling(money("300"));
        let result = policy.validate_deposit(money(balance), money(deposit));
        assert_eq!(result.is_ok(), accepted);
    }

    #[test]
    fn test_fixed_ceiling_error_carries_context() {
        let policy = CeilingPolicy::FixedCeiling(money("300"));
        let error = policy.validate_deposit(money("200"), money("150")).unwrap_err();
        assert_eq!(
            error,
            DomainError::CeilingExceeded {
                balance: money("200"),
                deposit: money("150"),
                ceiling: money("300"),
            }
        );
        assert_eq!(policy.ceiling(), Some(money("300")));
    }

    #[rstest]
    #[case("100", "100", true)]
    #[case("100", "100.01", false)]
    #[case("0", "0.01", false)]
    #[case("50.50", "20", true)]
    fn test_no_overdraft_boundary(#[case] balance: &str, #[case] withdraw: &str, #[case] accepted: bool) {
        let policy = OverdraftPolicy::NoOverdraft;
        let result = policy.validate_withdraw(money(balance), money(withdraw));
        assert_eq!(result.is_ok(), accepted);
    }

    #[test]
    fn test_no_overdraft_reports_zero_limit() {
        let error = OverdraftPolicy::NoOverdraft
            .validate_withdraw(money("10"), money("11"))
            .unwrap_err();
        assert_eq!(
            error,
            DomainError::InsufficientFunds {
                balance: money("10"),
                amount: money("11"),
                limit: Money::zero(),
            }
        );
        assert_eq!(OverdraftPolicy::NoOverdraft.limit(), None);
        assert_eq!(OverdraftPolicy::NoOverdraft.floor(), Money::zero());
    }

    #[rstest]
    #[case("0", "100", true)]
    #[case("0", "100.01", false)]
    #[case("-100", "0.01", false)]
    #[case("50", "150", true)]
    fn test_fixed_overdraft_boundary(#[case] balance: &str, #[case] withdraw: &str, #[case] accepted: bool) {
        let policy = OverdraftPolicy::FixedOverdraft(money("-100"));
        let result = policy.validate_withdraw(money(balance), money(withdraw));
        assert_eq!(result.is_ok(), accepted);
    }

    #[test]
    fn test_overflowing_balances_are_rejected_not_panicking() {
        let max = Money::from_decimal(Decimal::MAX.round_dp(0) - Decimal::ONE);

        let ceiling = CeilingPolicy::FixedCeiling(max);
        assert!(matches!(
            ceiling.validate_deposit(max, max),
            Err(DomainError::CeilingExceeded { .. })
        ));

        let overdraft = OverdraftPolicy::FixedOverdraft(-max);
        assert!(matches!(
            overdraft.validate_withdraw(-max, max),
            Err(DomainError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn test_fixed_overdraft_limits_are_per_instance() {
        let strict = OverdraftPolicy::FixedOverdraft(money("-10"));
        let loose = OverdraftPolicy::FixedOverdraft(money("-500"));

        assert!(strict.validate_withdraw(Money::zero(), money("50")).is_err());
        assert!(loose.validate_withdraw(Money::zero(), money("50")).is_ok());
        assert_eq!(strict.limit(), Some(money("-10")));
        assert_eq!(loose.limit(), Some(money("-500")));
    }
}
