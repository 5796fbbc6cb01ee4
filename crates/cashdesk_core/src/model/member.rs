//! Member entity and registration request model.
//!
//! # Invariants
//! - `member_number` is assigned by the store on insert and never reused.
//! - `last_name` is unique across all members.

use crate::model::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Store-assigned member identity.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type MemberNumber = i64;

/// A registered club member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Store-assigned identity, positive once persisted.
    pub member_number: MemberNumber,
    pub first_name: String,
    pub last_name: String,
    /// Calendar date of birth.
    pub birthday: NaiveDate,
}

/// Registration request, validated before persistence.
///
/// `birthday` stays optional here so an absent value can be rejected as an
/// invalid argument instead of being unrepresentable at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    pub first_name: String,
    pub last_name: String,
    pub birthday: Option<NaiveDate>,
}

impl NewMember {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        birthday: NaiveDate,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            birthday: Some(birthday),
        }
    }

    /// Checks field-level preconditions for registration.
    ///
    /// # Contract
    /// - First and last name must contain non-whitespace characters.
    /// - Birthday must be present.
    /// - Last-name uniqueness is a store-level check, not validated here.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.first_name.trim().is_empty() {
            return Err(ValidationError::BlankFirstName);
        }
        if self.last_name.trim().is_empty() {
            return Err(ValidationError::BlankLastName);
        }
        if self.birthday.is_none() {
            return Err(ValidationError::MissingBirthday);
        }
        Ok(())
    }
}
