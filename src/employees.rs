// 👥 Employee Contribution Ledger
//
// Who owes what for the event, and whether they've paid.
// Amounts are integer cents; status defaults to Pending.

use crate::db::timestamp_column;
use crate::error::{LedgerError, Result};
use crate::validation::{require_non_empty, require_positive_amount};
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

const RESOURCE: &str = "employee";

// ============================================================================
// CONTRIBUTION STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContributionStatus {
    /// Contribution received
    Paid,

    /// Not paid yet
    #[default]
    Pending,

    /// Waiting on a permit/authorization before paying
    AwaitingPermit,
}

impl ContributionStatus {
    pub const ALL: [ContributionStatus; 3] = [
        ContributionStatus::Paid,
        ContributionStatus::Pending,
        ContributionStatus::AwaitingPermit,
    ];

    /// Stored/wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionStatus::Paid => "Paid",
            ContributionStatus::Pending => "Pending",
            ContributionStatus::AwaitingPermit => "AwaitingPermit",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            ContributionStatus::Paid => "Paid",
            ContributionStatus::Pending => "Pending",
            ContributionStatus::AwaitingPermit => "Awaiting Permit",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ContributionStatus::Paid => ContributionStatus::Pending,
            ContributionStatus::Pending => ContributionStatus::AwaitingPermit,
            ContributionStatus::AwaitingPermit => ContributionStatus::Paid,
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, ContributionStatus::Paid)
    }
}

impl fmt::Display for ContributionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ContributionStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ContributionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown contribution status: {}", s))
    }
}

impl ToSql for ContributionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ContributionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

// ============================================================================
// RECORDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i64,
    pub name: String,
    /// Cents
    pub contribution_amount: i64,
    pub status: ContributionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for `create_employee`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmployee {
    pub name: String,
    pub contribution_amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContributionStatus>,
}

impl NewEmployee {
    pub fn new(name: impl Into<String>, contribution_amount: i64) -> Self {
        Self {
            name: name.into(),
            contribution_amount,
            status: None,
        }
    }

    pub fn with_status(mut self, status: ContributionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("name", &self.name)?;
        require_positive_amount("contributionAmount", self.contribution_amount)
    }
}

/// Partial update: only `Some` fields are touched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contribution_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContributionStatus>,
}

impl EmployeeUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.contribution_amount.is_none() && self.status.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
        }
        if let Some(amount) = self.contribution_amount {
            require_positive_amount("contributionAmount", amount)?;
        }
        Ok(())
    }

    fn apply_to(self, employee: &mut Employee) {
        if let Some(name) = self.name {
            employee.name = name;
        }
        if let Some(amount) = self.contribution_amount {
            employee.contribution_amount = amount;
        }
        if let Some(status) = self.status {
            employee.status = status;
        }
    }
}

// ============================================================================
// LEDGER OPERATIONS
// ============================================================================

const SELECT_COLUMNS: &str =
    "SELECT id, name, contribution_amount, status, created_at, updated_at FROM employees";

fn row_to_employee(row: &rusqlite::Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get(0)?,
        name: row.get(1)?,
        contribution_amount: row.get(2)?,
        status: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
        updated_at: timestamp_column(row, 5)?,
    })
}

/// All employees, ordered by id
pub fn list_employees(conn: &Connection) -> Result<Vec<Employee>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY id ASC", SELECT_COLUMNS))?;

    let employees = stmt
        .query_map([], row_to_employee)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(employees)
}

pub fn get_employee(conn: &Connection, id: i64) -> Result<Employee> {
    conn.query_row(
        &format!("{} WHERE id = ?1", SELECT_COLUMNS),
        params![id],
        row_to_employee,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found(RESOURCE, id))
}

pub fn create_employee(conn: &Connection, input: NewEmployee) -> Result<Employee> {
    input.validate()?;

    let status = input.status.unwrap_or_default();
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO employees (name, contribution_amount, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![input.name, input.contribution_amount, status, now],
    )?;

    let id = conn.last_insert_rowid();
    info!(id, status = status.as_str(), "employee created");

    get_employee(conn, id)
}

/// Apply a partial update. An empty update returns the record untouched.
pub fn update_employee(conn: &Connection, id: i64, changes: EmployeeUpdate) -> Result<Employee> {
    changes.validate()?;

    let mut employee = get_employee(conn, id)?;
    if changes.is_empty() {
        return Ok(employee);
    }

    changes.apply_to(&mut employee);
    employee.updated_at = Utc::now();

    let updated = conn.execute(
        "UPDATE employees
         SET name = ?1, contribution_amount = ?2, status = ?3, updated_at = ?4
         WHERE id = ?5",
        params![
            employee.name,
            employee.contribution_amount,
            employee.status,
            employee.updated_at.to_rfc3339(),
            id,
        ],
    )?;

    // Deleted between the read and the write
    if updated == 0 {
        return Err(LedgerError::not_found(RESOURCE, id));
    }

    info!(id, "employee updated");
    Ok(employee)
}

pub fn delete_employee(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn.execute("DELETE FROM employees WHERE id = ?1", params![id])?;

    if deleted == 0 {
        return Err(LedgerError::not_found(RESOURCE, id));
    }

    info!(id, "employee deleted");
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
