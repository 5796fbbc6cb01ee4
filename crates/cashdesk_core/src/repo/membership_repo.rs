//! Membership/deposit repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide membership interval and deposit persistence APIs.
//! - Own the per-member deposit statistics aggregate.
//!
//! # Invariants
//! - Open memberships are found by sentinel equality; the deposit path
//!   uses `Membership::covers` (`begin <= now <= end`) instead.
//! - Write paths call `NewDeposit::validate()` before SQL mutations.

use crate::model::deposit::{Deposit, DepositId, NewDeposit};
use crate::model::member::{Member, MemberNumber};
use crate::model::membership::{Membership, MembershipId};
use crate::repo::member_repo::{
    ensure_core_connection_ready, parse_member_row, table_has_column, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

const MEMBERSHIP_SELECT_SQL: &str = "SELECT
    membership_id,
    member_number,
    begin_ms,
    end_ms
FROM memberships";

/// Read model for the yearly deposit summary.
///
/// One record per member that owns at least one membership. `year` is the
/// begin-year of the member's first-created membership while
/// `total_amount_cents` sums deposits across all of that member's
/// memberships. The two deliberately do not line up; see the statistics
/// tests for the documented behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositStatisticsRecord {
    pub member: Member,
    pub year: i32,
    pub total_amount_cents: i64,
}

/// Repository interface for membership intervals and deposits.
pub trait MembershipRepository {
    /// Persists one membership interval and returns it with its
    /// store-assigned id.
    fn insert_membership(
        &self,
        member_number: MemberNumber,
        begin_ms: i64,
        end_ms: i64,
    ) -> RepoResult<Membership>;
    /// Finds the member's open membership (sentinel end), if any.
    fn find_open_membership(
        &self,
        member_number: MemberNumber,
    ) -> RepoResult<Option<Membership>>;
    /// Finds a membership whose interval covers the given instant, if any.
    fn find_covering_membership(
        &self,
        member_number: MemberNumber,
        now_ms: i64,
    ) -> RepoResult<Option<Membership>>;
    /// Sets the end timestamp of one membership.
    fn close_membership(&self, membership_id: MembershipId, end_ms: i64) -> RepoResult<()>;
    /// Persists one deposit and returns the store-assigned id.
    fn insert_deposit(&self, request: &NewDeposit) -> RepoResult<DepositId>;
    /// Lists the deposits recorded against one membership, in creation
    /// order.
    fn list_deposits(&self, membership_id: MembershipId) -> RepoResult<Vec<Deposit>>;
    /// Computes the per-member yearly deposit summary.
    fn deposit_statistics(&self) -> RepoResult<Vec<DepositStatisticsRecord>>;
}

/// SQLite-backed membership/deposit repository.
pub struct SqliteMembershipRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMembershipRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_core_connection_ready(conn)?;
        ensure_membership_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl MembershipRepository for SqliteMembershipRepository<'_> {
    fn insert_membership(
        &self,
        member_number: MemberNumber,
        begin_ms: i64,
        end_ms: i64,
    ) -> RepoResult<Membership> {
        self.conn.execute(
            "INSERT INTO memberships (member_number, begin_ms, end_ms)
             VALUES (?1, ?2, ?3);",
            params![member_number, begin_ms, end_ms],
        )?;

        Ok(Membership {
            membership_id: self.conn.last_insert_rowid(),
            member_number,
            begin_ms,
            end_ms,
        })
    }

    fn find_open_membership(
        &self,
        member_number: MemberNumber,
    ) -> RepoResult<Option<Membership>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEMBERSHIP_SELECT_SQL}
             WHERE member_number = ?1
               AND end_ms = ?2
             ORDER BY membership_id ASC
             LIMIT 1;"
        ))?;

        let mut rows = stmt.query(params![member_number, Membership::OPEN_END])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_membership_row(row)?));
        }

        Ok(None)
    }

    fn find_covering_membership(
        &self,
        member_number: MemberNumber,
        now_ms: i64,
    ) -> RepoResult<Option<Membership>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEMBERSHIP_SELECT_SQL}
             WHERE member_number = ?1
             ORDER BY membership_id ASC;"
        ))?;

        // The interval predicate lives on the model so the deposit path and
        // the membership helpers cannot drift apart.
        let mut rows = stmt.query([member_number])?;
        while let Some(row) = rows.next()? {
            let membership = parse_membership_row(row)?;
            if membership.covers(now_ms) {
                return Ok(Some(membership));
            }
        }

        Ok(None)
    }

    fn close_membership(&self, membership_id: MembershipId, end_ms: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE memberships SET end_ms = ?2 WHERE membership_id = ?1;",
            params![membership_id, end_ms],
        )?;

        if changed == 0 {
            return Err(RepoError::MembershipNotFound(membership_id));
        }

        Ok(())
    }

    fn insert_deposit(&self, request: &NewDeposit) -> RepoResult<DepositId> {
        request.validate()?;

        self.conn.execute(
            "INSERT INTO deposits (membership_id, amount_cents)
             VALUES (?1, ?2);",
            params![request.membership_id, request.amount_cents],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn list_deposits(&self, membership_id: MembershipId) -> RepoResult<Vec<Deposit>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                deposit_id,
                membership_id,
                amount_cents
             FROM deposits
             WHERE membership_id = ?1
             ORDER BY deposit_id ASC;",
        )?;

        let mut rows = stmt.query([membership_id])?;
        let mut deposits = Vec::new();
        while let Some(row) = rows.next()? {
            deposits.push(Deposit {
                deposit_id: row.get("deposit_id")?,
                membership_id: row.get("membership_id")?,
                amount_cents: row.get("amount_cents")?,
            });
        }

        Ok(deposits)
    }

    fn deposit_statistics(&self) -> RepoResult<Vec<DepositStatisticsRecord>> {
        // The join against the first-created membership also filters out
        // members without any membership.
        let mut stmt = self.conn.prepare(
            "SELECT
                m.member_number,
                m.first_name,
                m.last_name,
                m.birthday,
                first_ms.membership_id,
                first_ms.begin_ms,
                first_ms.end_ms,
                COALESCE(
                    (SELECT SUM(d.amount_cents)
                     FROM deposits d
                     INNER JOIN memberships ms ON ms.membership_id = d.membership_id
                     WHERE ms.member_number = m.member_number),
                    0) AS total_amount_cents
             FROM members m
             INNER JOIN memberships first_ms ON first_ms.membership_id = (
                SELECT ms.membership_id
                FROM memberships ms
                WHERE ms.member_number = m.member_number
                ORDER BY ms.membership_id ASC
                LIMIT 1
             )
             ORDER BY m.member_number ASC;",
        )?;

        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let member = parse_member_row(row)?;
            let first = parse_membership_row(row)?;
            let year = first.begin_year().ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "begin timestamp {} outside representable date range",
                    first.begin_ms
                ))
            })?;

            records.push(DepositStatisticsRecord {
                member,
                year,
                total_amount_cents: row.get("total_amount_cents")?,
            });
        }

        Ok(records)
    }
}

fn parse_membership_row(row: &Row<'_>) -> RepoResult<Membership> {
    Ok(Membership {
        membership_id: row.get("membership_id")?,
        member_number: row.get("member_number")?,
        begin_ms: row.get("begin_ms")?,
        end_ms: row.get("end_ms")?,
    })
}

fn ensure_membership_connection_ready(conn: &Connection) -> RepoResult<()> {
    for column in ["membership_id", "member_number", "begin_ms", "end_ms"] {
        if !table_has_column(conn, "memberships", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "memberships",
                column,
            });
        }
    }

    for column in ["deposit_id", "membership_id", "amount_cents"] {
        if !table_has_column(conn, "deposits", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "deposits",
                column,
            });
        }
    }

    Ok(())
}
