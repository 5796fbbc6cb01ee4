//! Domain model for the cash desk.
//!
//! # Responsibility
//! - Define the Member/Membership/Deposit entities and their request models.
//! - Gate every write path through model-level `validate()` checks.
//!
//! # Invariants
//! - Entity identity is a store-assigned integer, never generated in core.
//! - Request models reject invalid field values before any SQL runs.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod deposit;
pub mod member;
pub mod membership;

/// Field-level validation failures shared by all request models.
///
/// Every variant maps to the invalid-argument outcome at the service
/// boundary; the variant names the offending field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// First name is empty or whitespace-only.
    BlankFirstName,
    /// Last name is empty or whitespace-only.
    BlankLastName,
    /// Birthday was not supplied.
    MissingBirthday,
    /// Deposit amount below zero (minor currency units).
    NegativeAmount(i64),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankFirstName => write!(f, "first name must not be blank"),
            Self::BlankLastName => write!(f, "last name must not be blank"),
            Self::MissingBirthday => write!(f, "birthday must be provided"),
            Self::NegativeAmount(amount) => {
                write!(f, "deposit amount must be non-negative, got {amount}")
            }
        }
    }
}

impl Error for ValidationError {}
