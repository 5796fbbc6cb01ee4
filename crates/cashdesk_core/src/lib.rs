//! Core domain logic for the CashDesk membership register.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::deposit::{Deposit, DepositId, NewDeposit};
pub use model::member::{Member, MemberNumber, NewMember};
pub use model::membership::{Membership, MembershipId};
pub use model::ValidationError;
pub use repo::member_repo::{MemberRepository, RepoError, RepoResult, SqliteMemberRepository};
pub use repo::membership_repo::{
    DepositStatisticsRecord, MembershipRepository, SqliteMembershipRepository,
};
pub use service::cash_desk::{CashDesk, ServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
