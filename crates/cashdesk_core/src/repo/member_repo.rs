//! Member repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide member CRUD on top of the `members` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `NewMember::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::member::{Member, MemberNumber, NewMember};
use crate::model::membership::MembershipId;
use crate::model::ValidationError;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const MEMBER_SELECT_SQL: &str = "SELECT
    member_number,
    first_name,
    last_name,
    birthday
FROM members";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for cash desk persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    MemberNotFound(MemberNumber),
    MembershipNotFound(MembershipId),
    InvalidData(String),
    /// Connection was not opened through `db::open` (migrations missing).
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::MemberNotFound(number) => write!(f, "member not found: {number}"),
            Self::MembershipNotFound(id) => write!(f, "membership not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for member records.
pub trait MemberRepository {
    /// Persists one member and returns the store-assigned number.
    fn insert_member(&self, request: &NewMember) -> RepoResult<MemberNumber>;
    /// Gets one member by number.
    fn get_member(&self, member_number: MemberNumber) -> RepoResult<Option<Member>>;
    /// Whether any member already uses the given last name.
    fn last_name_exists(&self, last_name: &str) -> RepoResult<bool>;
    /// Removes one member; memberships and deposits go with it via
    /// foreign-key cascade.
    fn delete_member(&self, member_number: MemberNumber) -> RepoResult<()>;
}

/// SQLite-backed member repository.
pub struct SqliteMemberRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMemberRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_core_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl MemberRepository for SqliteMemberRepository<'_> {
    fn insert_member(&self, request: &NewMember) -> RepoResult<MemberNumber> {
        request.validate()?;
        // validate() guarantees the birthday is present.
        let birthday = request.birthday.ok_or(ValidationError::MissingBirthday)?;

        self.conn.execute(
            "INSERT INTO members (first_name, last_name, birthday)
             VALUES (?1, ?2, ?3);",
            params![
                request.first_name.as_str(),
                request.last_name.as_str(),
                birthday.to_string(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_member(&self, member_number: MemberNumber) -> RepoResult<Option<Member>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEMBER_SELECT_SQL} WHERE member_number = ?1;"))?;

        let mut rows = stmt.query([member_number])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_member_row(row)?));
        }

        Ok(None)
    }

    fn last_name_exists(&self, last_name: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM members
                WHERE last_name = ?1
            );",
            [last_name],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn delete_member(&self, member_number: MemberNumber) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM members WHERE member_number = ?1;",
            [member_number],
        )?;

        if changed == 0 {
            return Err(RepoError::MemberNotFound(member_number));
        }

        Ok(())
    }
}

pub(crate) fn parse_member_row(row: &Row<'_>) -> RepoResult<Member> {
    let birthday_text: String = row.get("birthday")?;
    let birthday = NaiveDate::parse_from_str(&birthday_text, "%Y-%m-%d").map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid birthday value `{birthday_text}` in members.birthday"
        ))
    })?;

    Ok(Member {
        member_number: row.get("member_number")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        birthday,
    })
}

pub(crate) fn ensure_core_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["members", "memberships", "deposits"] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    for column in ["member_number", "first_name", "last_name", "birthday"] {
        if !table_has_column(conn, "members", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "members",
                column,
            });
        }
    }

    Ok(())
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn table_has_column(
    conn: &Connection,
    table: &str,
    column: &str,
) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
