//! Deposit entity and deposit request model.
//!
//! # Invariants
//! - Amounts are minor currency units (cents) and never negative.
//! - Every deposit belongs to exactly one membership.

use crate::model::membership::MembershipId;
use crate::model::ValidationError;
use serde::{Deserialize, Serialize};

/// Store-assigned deposit identity.
pub type DepositId = i64;

/// One recorded cash deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    /// Store-assigned identity, positive once persisted.
    pub deposit_id: DepositId,
    /// Owning membership; removal of the membership removes this row.
    pub membership_id: MembershipId,
    /// Amount in minor currency units, non-negative.
    pub amount_cents: i64,
}

/// Deposit request, validated before persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDeposit {
    pub membership_id: MembershipId,
    pub amount_cents: i64,
}

impl NewDeposit {
    pub fn new(membership_id: MembershipId, amount_cents: i64) -> Self {
        Self {
            membership_id,
            amount_cents,
        }
    }

    /// Rejects negative amounts at the data-entity level.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.amount_cents < 0 {
            return Err(ValidationError::NegativeAmount(self.amount_cents));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::NewDeposit;
    use crate::model::ValidationError;

    #[test]
    fn zero_and_positive_amounts_pass() {
        assert!(NewDeposit::new(1, 0).validate().is_ok());
        assert!(NewDeposit::new(1, 2_500).validate().is_ok());
    }

    #[test]
    fn negative_amount_is_rejected() {
        assert_eq!(
            NewDeposit::new(1, -1).validate(),
            Err(ValidationError::NegativeAmount(-1))
        );
    }
}
