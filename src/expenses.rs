// 🧾 Expense Ledger
//
// What was bought for the event, how much, and when.

use crate::db::timestamp_column;
use crate::error::{LedgerError, Result};
use crate::validation::{require_non_empty, require_positive_amount, require_purchase_date};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::info;

const RESOURCE: &str = "expense";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: i64,
    /// Item label
    pub description: String,
    /// Cents
    pub amount: i64,
    /// `YYYY-MM-DD`, no timezone
    pub purchase_date: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub description: String,
    pub amount: i64,
    pub purchase_date: String,
}

impl NewExpense {
    pub fn new(description: impl Into<String>, amount: i64, purchase_date: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            amount,
            purchase_date: purchase_date.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("description", &self.description)?;
        require_positive_amount("amount", self.amount)?;
        require_purchase_date("purchaseDate", &self.purchase_date)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<String>,
}

impl ExpenseUpdate {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.amount.is_none() && self.purchase_date.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(description) = &self.description {
            require_non_empty("description", description)?;
        }
        if let Some(amount) = self.amount {
            require_positive_amount("amount", amount)?;
        }
        if let Some(date) = &self.purchase_date {
            require_purchase_date("purchaseDate", date)?;
        }
        Ok(())
    }

    fn apply_to(self, expense: &mut Expense) {
        if let Some(description) = self.description {
            expense.description = description;
        }
        if let Some(amount) = self.amount {
            expense.amount = amount;
        }
        if let Some(date) = self.purchase_date {
            expense.purchase_date = date;
        }
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, description, amount, purchase_date, created_at, updated_at FROM expenses";

fn row_to_expense(row: &rusqlite::Row<'_>) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        description: row.get(1)?,
        amount: row.get(2)?,
        purchase_date: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
        updated_at: timestamp_column(row, 5)?,
    })
}

/// All expenses, ordered by id
pub fn list_expenses(conn: &Connection) -> Result<Vec<Expense>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY id ASC", SELECT_COLUMNS))?;

    let expenses = stmt
        .query_map([], row_to_expense)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(expenses)
}

pub fn get_expense(conn: &Connection, id: i64) -> Result<Expense> {
    conn.query_row(
        &format!("{} WHERE id = ?1", SELECT_COLUMNS),
        params![id],
        row_to_expense,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found(RESOURCE, id))
}

pub fn create_expense(conn: &Connection, input: NewExpense) -> Result<Expense> {
    input.validate()?;

    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO expenses (description, amount, purchase_date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![input.description, input.amount, input.purchase_date, now],
    )?;

    let id = conn.last_insert_rowid();
    info!(id, amount = input.amount, "expense created");

    get_expense(conn, id)
}

/// Apply a partial update. An empty update returns the record untouched.
pub fn update_expense(conn: &Connection, id: i64, changes: ExpenseUpdate) -> Result<Expense> {
    changes.validate()?;

    let mut expense = get_expense(conn, id)?;
    if changes.is_empty() {
        return Ok(expense);
    }

    changes.apply_to(&mut expense);
    expense.updated_at = Utc::now();

    let updated = conn.execute(
        "UPDATE expenses
         SET description = ?1, amount = ?2, purchase_date = ?3, updated_at = ?4
         WHERE id = ?5",
        params![
            expense.description,
            expense.amount,
            expense.purchase_date,
            expense.updated_at.to_rfc3339(),
            id,
        ],
    )?;

    if updated == 0 {
        return Err(LedgerError::not_found(RESOURCE, id));
    }

    info!(id, "expense updated");
    Ok(expense)
}

pub fn delete_expense(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn.execute("DELETE FROM expenses WHERE id = ?1", params![id])?;

    if deleted == 0 {
        return Err(LedgerError::not_found(RESOURCE, id));
    }

    info!(id, "expense deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_create_returns_input_fields() {
        let conn = test_conn();

        let created = create_expense(&conn, NewExpense::new("Buffet", 50_000, "2024-12-20")).unwrap();

        assert!(created.id > 0);
        assert_eq!(created.description, "Buffet");
        assert_eq!(created.amount, 50_000);
        assert_eq!(created.purchase_date, "2024-12-20");
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let conn = test_conn();

        let cases = [
            (NewExpense::new("", 100, "2024-01-01"), "description"),
            (NewExpense::new("Teste", 0, "2024-01-01"), "amount"),
            (NewExpense::new("Teste", -100, "2024-01-01"), "amount"),
            (NewExpense::new("Teste", 10_000, "2024/01/01"), "purchaseDate"),
            (NewExpense::new("Teste", 10_000, "invalid-date"), "purchaseDate"),
        ];

        for (input, expected_field) in cases {
            match create_expense(&conn, input).unwrap_err() {
                LedgerError::Validation { field, .. } => assert_eq!(field, expected_field),
                other => panic!("expected validation error, got {other:?}"),
            }
        }

        assert!(list_expenses(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_calendar_invalid_date_is_accepted() {
        let conn = test_conn();
        let created = create_expense(&conn, NewExpense::new("Odd", 100, "2024-13-40")).unwrap();
        assert_eq!(created.purchase_date, "2024-13-40");
    }

    #[test]
    fn test_update_then_list_reflects_only_changes() {
        let conn = test_conn();
        let created = create_expense(&conn, NewExpense::new("Balloons", 1_500, "2024-12-01")).unwrap();

        let updated = update_expense(
            &conn,
            created.id,
            ExpenseUpdate {
                amount: Some(2_000),
                ..Default::default()
            },
        )
        .unwrap();

        let listed = list_expenses(&conn).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], updated);
        assert_eq!(listed[0].amount, 2_000);
        assert_eq!(listed[0].description, "Balloons");
        assert_eq!(listed[0].purchase_date, "2024-12-01");
    }

    #[test]
    fn test_update_rejects_bad_date() {
        let conn = test_conn();
        let created = create_expense(&conn, NewExpense::new("Cake", 100, "2024-12-01")).unwrap();

        let err = update_expense(
            &conn,
            created.id,
            ExpenseUpdate {
                purchase_date: Some("01-12-2024".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(get_expense(&conn, created.id).unwrap(), created);
    }

    #[test]
    fn test_update_and_delete_missing_id() {
        let conn = test_conn();

        let err = update_expense(
            &conn,
            7,
            ExpenseUpdate {
                amount: Some(1),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(err.is_not_found());

        assert!(delete_expense(&conn, 7).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_twice() {
        let conn = test_conn();
        let created = create_expense(&conn, NewExpense::new("Cups", 800, "2024-12-02")).unwrap();

        assert!(delete_expense(&conn, created.id).is_ok());
        assert!(delete_expense(&conn, created.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let conn = test_conn();
        let created = create_expense(&conn, NewExpense::new("Cups", 800, "2024-12-02")).unwrap();

        let json = serde_json::to_value(&created).unwrap();
        assert_eq!(json["purchaseDate"], "2024-12-02");
        assert_eq!(json["amount"], 800);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }
}
