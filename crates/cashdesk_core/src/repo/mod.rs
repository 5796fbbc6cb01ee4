//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for members,
//!   memberships and deposits.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes enforce model `validate()` before persistence.
//! - Repository APIs return semantic errors (`MemberNotFound`, ...) in
//!   addition to DB transport errors.

pub mod member_repo;
pub mod membership_repo;
