// Event Fund - Core Library
// Exposes the ledgers for use in the TUI, the API server, and tests

pub mod app;
pub mod config;
pub mod db;
pub mod employees;
pub mod error;
pub mod expenses;
pub mod logging;
pub mod summary;
pub mod validation;

// Only compile the HTTP layer when the server feature is enabled
#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use app::{App, Editor, Notification, NotificationKind, StatusFilter, Tab};
pub use db::{open_database, setup_database};
pub use employees::{
    create_employee, delete_employee, get_employee, list_employees, update_employee,
    ContributionStatus, Employee, EmployeeUpdate, NewEmployee,
};
pub use error::LedgerError;
pub use expenses::{
    create_expense, delete_expense, get_expense, list_expenses, update_expense, Expense,
    ExpenseUpdate, NewExpense,
};
pub use summary::{share_report, CurrencyFormat, Totals};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
