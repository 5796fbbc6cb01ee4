//! Cash desk data service.
//!
//! # Responsibility
//! - Own the store session (initialize/shutdown lifecycle).
//! - Enforce member/membership/deposit invariants above the repositories.
//!
//! # Invariants
//! - Every entity operation requires an initialized session.
//! - Validation precedes the single persisting statement of each path, so
//!   a failed operation leaves the store untouched.
//! - One service instance per logical session; no process-wide state.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::deposit::NewDeposit;
use crate::model::member::{MemberNumber, NewMember};
use crate::model::membership::Membership;
use crate::model::ValidationError;
use crate::repo::member_repo::{MemberRepository, RepoError, SqliteMemberRepository};
use crate::repo::membership_repo::{
    DepositStatisticsRecord, MembershipRepository, SqliteMembershipRepository,
};
use chrono::Utc;
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Errors surfaced by cash desk operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Entity operation attempted before `initialize`.
    NotInitialized,
    /// `initialize` called while a session already exists.
    AlreadyInitialized,
    /// Malformed input (blank names, missing birthday, negative amount).
    InvalidArgument(ValidationError),
    /// Another member already uses the last name.
    DuplicateName(String),
    /// No member carries the given number.
    MemberNotFound(MemberNumber),
    /// Member already holds an open membership.
    AlreadyMember(MemberNumber),
    /// No membership of the member qualifies as active.
    NoActiveMembership(MemberNumber),
    /// Store bootstrap failure.
    Db(DbError),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "cash desk is not initialized"),
            Self::AlreadyInitialized => write!(f, "cash desk is already initialized"),
            Self::InvalidArgument(err) => write!(f, "{err}"),
            Self::DuplicateName(last_name) => {
                write!(f, "a member with last name `{last_name}` already exists")
            }
            Self::MemberNotFound(number) => write!(f, "member not found: {number}"),
            Self::AlreadyMember(number) => {
                write!(f, "member {number} already holds an open membership")
            }
            Self::NoActiveMembership(number) => {
                write!(f, "member {number} has no active membership")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidArgument(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidArgument(err),
            RepoError::MemberNotFound(number) => Self::MemberNotFound(number),
            other => Self::Repo(other),
        }
    }
}

/// Single gateway over the member/membership/deposit store.
///
/// Construct one instance per logical session. `initialize` opens the
/// session, `shutdown` releases it; dropping the service releases it as
/// well.
#[derive(Default)]
pub struct CashDesk {
    session: Option<Connection>,
}

impl CashDesk {
    /// Creates a service without an open session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a session against the database file at `path`.
    ///
    /// # Errors
    /// - `AlreadyInitialized` when a session is already open.
    /// - `Db` when the store cannot be opened or migrated.
    pub fn initialize(&mut self, path: impl AsRef<Path>) -> Result<(), ServiceError> {
        if self.session.is_some() {
            return Err(ServiceError::AlreadyInitialized);
        }
        self.session = Some(open_db(path)?);
        info!("event=initialize module=service status=ok mode=file");
        Ok(())
    }

    /// Opens a session against a fresh in-memory store.
    ///
    /// # Errors
    /// - `AlreadyInitialized` when a session is already open.
    pub fn initialize_in_memory(&mut self) -> Result<(), ServiceError> {
        if self.session.is_some() {
            return Err(ServiceError::AlreadyInitialized);
        }
        self.session = Some(open_db_in_memory()?);
        info!("event=initialize module=service status=ok mode=memory");
        Ok(())
    }

    /// Releases the session. Safe to call repeatedly or before
    /// initialization.
    pub fn shutdown(&mut self) {
        if self.session.take().is_some() {
            info!("event=shutdown module=service status=ok");
        }
    }

    /// Whether a session is currently open.
    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    fn session(&self) -> Result<&Connection, ServiceError> {
        self.session.as_ref().ok_or(ServiceError::NotInitialized)
    }

    /// Registers a new member and returns the store-assigned number.
    ///
    /// # Errors
    /// - `NotInitialized`, `InvalidArgument`, `DuplicateName`.
    pub fn add_member(&self, request: &NewMember) -> Result<MemberNumber, ServiceError> {
        let conn = self.session()?;
        request.validate().map_err(ServiceError::InvalidArgument)?;

        let repo = SqliteMemberRepository::try_new(conn)?;
        if repo.last_name_exists(&request.last_name)? {
            return Err(ServiceError::DuplicateName(request.last_name.clone()));
        }

        let member_number = repo.insert_member(request)?;
        info!("event=add_member module=service status=ok member_number={member_number}");
        Ok(member_number)
    }

    /// Removes a member together with its memberships and deposits.
    ///
    /// # Errors
    /// - `NotInitialized`, `MemberNotFound`.
    pub fn delete_member(&self, member_number: MemberNumber) -> Result<(), ServiceError> {
        let conn = self.session()?;
        let repo = SqliteMemberRepository::try_new(conn)?;
        repo.delete_member(member_number)?;
        info!("event=delete_member module=service status=ok member_number={member_number}");
        Ok(())
    }

    /// Opens a new membership for the member, beginning now.
    ///
    /// # Errors
    /// - `NotInitialized`, `MemberNotFound`, `AlreadyMember`.
    pub fn join_member(&self, member_number: MemberNumber) -> Result<Membership, ServiceError> {
        let conn = self.session()?;
        let members = SqliteMemberRepository::try_new(conn)?;
        if members.get_member(member_number)?.is_none() {
            return Err(ServiceError::MemberNotFound(member_number));
        }

        let memberships = SqliteMembershipRepository::try_new(conn)?;
        if memberships.find_open_membership(member_number)?.is_some() {
            return Err(ServiceError::AlreadyMember(member_number));
        }

        let membership =
            memberships.insert_membership(member_number, now_ms(), Membership::OPEN_END)?;
        info!(
            "event=join_member module=service status=ok member_number={member_number} membership_id={}",
            membership.membership_id
        );
        Ok(membership)
    }

    /// Closes the member's open membership, ending now.
    ///
    /// # Errors
    /// - `NotInitialized`, `NoActiveMembership` (also for unknown member
    ///   numbers).
    pub fn cancel_membership(
        &self,
        member_number: MemberNumber,
    ) -> Result<Membership, ServiceError> {
        let conn = self.session()?;
        let memberships = SqliteMembershipRepository::try_new(conn)?;
        let open = memberships
            .find_open_membership(member_number)?
            .ok_or(ServiceError::NoActiveMembership(member_number))?;

        let end_ms = now_ms();
        memberships.close_membership(open.membership_id, end_ms)?;
        info!(
            "event=cancel_membership module=service status=ok member_number={member_number} membership_id={}",
            open.membership_id
        );
        Ok(Membership { end_ms, ..open })
    }

    /// Records a deposit against the member's currently active membership.
    ///
    /// # Errors
    /// - `NotInitialized`, `InvalidArgument` for negative amounts,
    ///   `NoActiveMembership` (also for unknown member numbers).
    pub fn deposit(
        &self,
        member_number: MemberNumber,
        amount_cents: i64,
    ) -> Result<(), ServiceError> {
        let conn = self.session()?;
        if amount_cents < 0 {
            return Err(ServiceError::InvalidArgument(
                ValidationError::NegativeAmount(amount_cents),
            ));
        }

        let memberships = SqliteMembershipRepository::try_new(conn)?;
        let active = memberships
            .find_covering_membership(member_number, now_ms())?
            .ok_or(ServiceError::NoActiveMembership(member_number))?;

        let deposit_id =
            memberships.insert_deposit(&NewDeposit::new(active.membership_id, amount_cents))?;
        info!(
            "event=deposit module=service status=ok member_number={member_number} deposit_id={deposit_id} amount_cents={amount_cents}"
        );
        Ok(())
    }

    /// Returns the per-member yearly deposit summary.
    ///
    /// # Errors
    /// - `NotInitialized`.
    pub fn deposit_statistics(&self) -> Result<Vec<DepositStatisticsRecord>, ServiceError> {
        let conn = self.session()?;
        let memberships = SqliteMembershipRepository::try_new(conn)?;
        Ok(memberships.deposit_statistics()?)
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
