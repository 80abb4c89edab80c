// 🖥️ Presentation state - everything the screen needs that isn't in the ledgers
//
// Holds the last fetched snapshot of each ledger plus UI transients (tab,
// search, open editor, notification). Ledger data only changes here after a
// confirmed round trip followed by a full re-fetch.

use crate::employees::{
    create_employee, delete_employee, list_employees, update_employee, ContributionStatus,
    Employee, EmployeeUpdate, NewEmployee,
};
use crate::error::{LedgerError, Result};
use crate::expenses::{
    create_expense, delete_expense, list_expenses, update_expense, Expense, ExpenseUpdate,
    NewExpense,
};
use crate::summary::{cents_to_input, parse_cents, CurrencyFormat, Totals};
use rusqlite::Connection;
use std::time::{Duration, Instant};
use tracing::warn;

/// How long a notification stays on screen
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Amount pre-filled in a fresh contribution form
pub const DEFAULT_CONTRIBUTION_INPUT: &str = "100";

// ============================================================================
// TABS & FILTERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Contributions,
    Expenses,
}

impl Tab {
    pub fn next(&self) -> Self {
        match self {
            Tab::Contributions => Tab::Expenses,
            Tab::Expenses => Tab::Contributions,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Tab::Contributions => "Contributions",
            Tab::Expenses => "Expenses",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ContributionStatus),
}

impl StatusFilter {
    pub fn next(&self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Only(ContributionStatus::Paid),
            StatusFilter::Only(ContributionStatus::AwaitingPermit) => StatusFilter::All,
            StatusFilter::Only(status) => StatusFilter::Only(status.next()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Only(status) => status.label(),
        }
    }

    pub fn matches(&self, status: ContributionStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

/// Case-insensitive name search combined with the status filter
pub fn filter_employees<'a>(
    employees: &'a [Employee],
    search: &str,
    filter: StatusFilter,
) -> Vec<&'a Employee> {
    let needle = search.to_lowercase();
    employees
        .iter()
        .filter(|e| e.name.to_lowercase().contains(&needle) && filter.matches(e.status))
        .collect()
}

// ============================================================================
// NOTIFICATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub expires_at: Instant,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>, now: Instant) -> Self {
        Self {
            message: message.into(),
            kind,
            expires_at: now + NOTIFICATION_TTL,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

// ============================================================================
// FORMS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeField {
    Name,
    Amount,
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeForm {
    pub name: String,
    pub amount: String,
    /// Only present when editing; new contributions start as Pending
    pub status: Option<ContributionStatus>,
    pub focus: EmployeeField,
}

impl EmployeeForm {
    pub fn blank() -> Self {
        Self {
            name: String::new(),
            amount: DEFAULT_CONTRIBUTION_INPUT.to_string(),
            status: None,
            focus: EmployeeField::Name,
        }
    }

    pub fn from_employee(employee: &Employee) -> Self {
        Self {
            name: employee.name.clone(),
            amount: cents_to_input(employee.contribution_amount),
            status: Some(employee.status),
            focus: EmployeeField::Name,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = match (self.focus, self.status.is_some()) {
            (EmployeeField::Name, _) => EmployeeField::Amount,
            (EmployeeField::Amount, true) => EmployeeField::Status,
            (EmployeeField::Amount, false) | (EmployeeField::Status, _) => EmployeeField::Name,
        };
    }

    pub fn push_char(&mut self, c: char) {
        match self.focus {
            EmployeeField::Name => self.name.push(c),
            EmployeeField::Amount => self.amount.push(c),
            EmployeeField::Status => self.cycle_status(),
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            EmployeeField::Name => {
                self.name.pop();
            }
            EmployeeField::Amount => {
                self.amount.pop();
            }
            EmployeeField::Status => {}
        }
    }

    pub fn cycle_status(&mut self) {
        if let Some(status) = self.status {
            self.status = Some(status.next());
        }
    }

    fn amount_cents(&self) -> Result<i64> {
        parse_cents(&self.amount).ok_or_else(|| {
            LedgerError::validation("contributionAmount", format!("not a valid amount: {:?}", self.amount))
        })
    }

    pub fn to_new(&self) -> Result<NewEmployee> {
        Ok(NewEmployee {
            name: self.name.trim().to_string(),
            contribution_amount: self.amount_cents()?,
            status: self.status,
        })
    }

    /// Only the fields that differ from `original`
    pub fn to_update(&self, original: &Employee) -> Result<EmployeeUpdate> {
        let name = self.name.trim();
        let amount = self.amount_cents()?;

        Ok(EmployeeUpdate {
            name: (name != original.name).then(|| name.to_string()),
            contribution_amount: (amount != original.contribution_amount).then_some(amount),
            status: self.status.filter(|s| *s != original.status),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseField {
    Description,
    Amount,
    PurchaseDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseForm {
    pub description: String,
    pub amount: String,
    pub purchase_date: String,
    pub focus: ExpenseField,
}

impl ExpenseForm {
    pub fn blank(today: &str) -> Self {
        Self {
            description: String::new(),
            amount: String::new(),
            purchase_date: today.to_string(),
            focus: ExpenseField::Description,
        }
    }

    pub fn from_expense(expense: &Expense) -> Self {
        Self {
            description: expense.description.clone(),
            amount: cents_to_input(expense.amount),
            purchase_date: expense.purchase_date.clone(),
            focus: ExpenseField::Description,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            ExpenseField::Description => ExpenseField::Amount,
            ExpenseField::Amount => ExpenseField::PurchaseDate,
            ExpenseField::PurchaseDate => ExpenseField::Description,
        };
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            ExpenseField::Description => &mut self.description,
            ExpenseField::Amount => &mut self.amount,
            ExpenseField::PurchaseDate => &mut self.purchase_date,
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.focused_mut().push(c);
    }

    pub fn backspace(&mut self) {
        self.focused_mut().pop();
    }

    fn amount_cents(&self) -> Result<i64> {
        parse_cents(&self.amount).ok_or_else(|| {
            LedgerError::validation("amount", format!("not a valid amount: {:?}", self.amount))
        })
    }

    pub fn to_new(&self) -> Result<NewExpense> {
        Ok(NewExpense {
            description: self.description.trim().to_string(),
            amount: self.amount_cents()?,
            purchase_date: self.purchase_date.trim().to_string(),
        })
    }

    pub fn to_update(&self, original: &Expense) -> Result<ExpenseUpdate> {
        let description = self.description.trim();
        let amount = self.amount_cents()?;
        let date = self.purchase_date.trim();

        Ok(ExpenseUpdate {
            description: (description != original.description).then(|| description.to_string()),
            amount: (amount != original.amount).then_some(amount),
            purchase_date: (date != original.purchase_date).then(|| date.to_string()),
        })
    }
}

// ============================================================================
// EDITOR & DELETE CONFIRMATION
// ============================================================================

/// Which form is open; at most one at a time
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Editor {
    #[default]
    None,
    NewEmployee(EmployeeForm),
    EditingEmployee(Employee, EmployeeForm),
    NewExpense(ExpenseForm),
    EditingExpense(Expense, ExpenseForm),
}

impl Editor {
    pub fn is_open(&self) -> bool {
        !matches!(self, Editor::None)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Editor::None => "",
            Editor::NewEmployee(_) => "Add Contribution",
            Editor::EditingEmployee(..) => "Edit Contribution",
            Editor::NewExpense(_) => "Add Expense",
            Editor::EditingExpense(..) => "Edit Expense",
        }
    }

    pub fn focus_next(&mut self) {
        match self {
            Editor::None => {}
            Editor::NewEmployee(form) | Editor::EditingEmployee(_, form) => form.focus_next(),
            Editor::NewExpense(form) | Editor::EditingExpense(_, form) => form.focus_next(),
        }
    }

    pub fn push_char(&mut self, c: char) {
        match self {
            Editor::None => {}
            Editor::NewEmployee(form) | Editor::EditingEmployee(_, form) => form.push_char(c),
            Editor::NewExpense(form) | Editor::EditingExpense(_, form) => form.push_char(c),
        }
    }

    pub fn backspace(&mut self) {
        match self {
            Editor::None => {}
            Editor::NewEmployee(form) | Editor::EditingEmployee(_, form) => form.backspace(),
            Editor::NewExpense(form) | Editor::EditingExpense(_, form) => form.backspace(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingDelete {
    Employee { id: i64, name: String },
    Expense { id: i64, description: String },
}

impl PendingDelete {
    pub fn prompt(&self) -> String {
        match self {
            PendingDelete::Employee { name, .. } => format!("Remove {}? (y/n)", name),
            PendingDelete::Expense { description, .. } => format!("Delete expense {}? (y/n)", description),
        }
    }
}

// ============================================================================
// APP
// ============================================================================

pub struct App {
    pub employees: Vec<Employee>,
    pub expenses: Vec<Expense>,
    pub tab: Tab,
    pub search: String,
    /// Keystrokes go to the search box
    pub searching: bool,
    pub status_filter: StatusFilter,
    pub editor: Editor,
    pub pending_delete: Option<PendingDelete>,
    pub show_summary: bool,
    pub notification: Option<Notification>,
    pub employee_selected: Option<usize>,
    pub expense_selected: Option<usize>,
    pub currency: CurrencyFormat,
}

impl App {
    pub fn new(employees: Vec<Employee>, expenses: Vec<Expense>, currency: CurrencyFormat) -> Self {
        let mut app = Self {
            employees,
            expenses,
            tab: Tab::Contributions,
            search: String::new(),
            searching: false,
            status_filter: StatusFilter::All,
            editor: Editor::None,
            pending_delete: None,
            show_summary: false,
            notification: None,
            employee_selected: None,
            expense_selected: None,
            currency,
        };
        app.clamp_selection();
        app
    }

    /// Initial snapshot of both ledgers
    pub fn load(conn: &Connection, currency: CurrencyFormat) -> Result<Self> {
        Ok(Self::new(list_employees(conn)?, list_expenses(conn)?, currency))
    }

    pub fn totals(&self) -> Totals {
        Totals::compute(&self.employees, &self.expenses)
    }

    pub fn visible_employees(&self) -> Vec<&Employee> {
        filter_employees(&self.employees, &self.search, self.status_filter)
    }

    pub fn selected_employee(&self) -> Option<&Employee> {
        self.employee_selected
            .and_then(|i| self.visible_employees().get(i).copied())
    }

    pub fn selected_expense(&self) -> Option<&Expense> {
        self.expense_selected.and_then(|i| self.expenses.get(i))
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn next_tab(&mut self) {
        self.tab = self.tab.next();
        self.show_summary = false;
    }

    fn current_len(&self) -> usize {
        match self.tab {
            Tab::Contributions => self.visible_employees().len(),
            Tab::Expenses => self.expenses.len(),
        }
    }

    fn current_selection(&mut self) -> &mut Option<usize> {
        match self.tab {
            Tab::Contributions => &mut self.employee_selected,
            Tab::Expenses => &mut self.expense_selected,
        }
    }

    pub fn next(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let selection = self.current_selection();
        *selection = Some(match *selection {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        });
    }

    pub fn previous(&mut self) {
        let len = self.current_len();
        if len == 0 {
            return;
        }
        let selection = self.current_selection();
        *selection = Some(match *selection {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        });
    }

    /// Keep selections inside the (possibly shrunk) lists
    fn clamp_selection(&mut self) {
        fn clamp(selection: Option<usize>, len: usize) -> Option<usize> {
            match (selection, len) {
                (_, 0) => None,
                (None, _) => Some(0),
                (Some(i), len) => Some(i.min(len - 1)),
            }
        }

        let visible = self.visible_employees().len();
        self.employee_selected = clamp(self.employee_selected, visible);
        self.expense_selected = clamp(self.expense_selected, self.expenses.len());
    }

    // ------------------------------------------------------------------------
    // Search & filter
    // ------------------------------------------------------------------------

    pub fn push_search(&mut self, c: char) {
        self.search.push(c);
        self.employee_selected = None;
        self.clamp_selection();
    }

    pub fn pop_search(&mut self) {
        self.search.pop();
        self.clamp_selection();
    }

    pub fn cycle_status_filter(&mut self) {
        self.status_filter = self.status_filter.next();
        self.employee_selected = None;
        self.clamp_selection();
    }

    pub fn toggle_summary(&mut self) {
        self.show_summary = !self.show_summary;
    }

    // ------------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------------

    pub fn notify(&mut self, kind: NotificationKind, message: impl Into<String>, now: Instant) {
        self.notification = Some(Notification::new(kind, message, now));
    }

    /// Drop the notification once it has expired; called every frame
    pub fn tick(&mut self, now: Instant) {
        if self
            .notification
            .as_ref()
            .is_some_and(|n| n.is_expired(now))
        {
            self.notification = None;
        }
    }

    pub fn active_notification(&self, now: Instant) -> Option<&Notification> {
        self.notification.as_ref().filter(|n| !n.is_expired(now))
    }

    fn report_error(&mut self, err: &LedgerError, now: Instant) {
        warn!(error = %err, "ledger operation failed");
        self.notify(NotificationKind::Error, format!("Error: {}", err), now);
    }

    // ------------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------------

    pub fn refresh_employees(&mut self, conn: &Connection) -> Result<()> {
        self.employees = list_employees(conn)?;
        self.clamp_selection();
        Ok(())
    }

    pub fn refresh_expenses(&mut self, conn: &Connection) -> Result<()> {
        self.expenses = list_expenses(conn)?;
        self.clamp_selection();
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------------

    /// Open a blank form for the active tab, or close it if one is open
    pub fn toggle_new_form(&mut self, today: &str) {
        if self.editor.is_open() {
            self.editor = Editor::None;
            return;
        }
        self.editor = match self.tab {
            Tab::Contributions => Editor::NewEmployee(EmployeeForm::blank()),
            Tab::Expenses => Editor::NewExpense(ExpenseForm::blank(today)),
        };
    }

    /// Open the edit form for the selected row
    pub fn edit_selected(&mut self) {
        let editor = match self.tab {
            Tab::Contributions => self
                .selected_employee()
                .map(|e| Editor::EditingEmployee(e.clone(), EmployeeForm::from_employee(e))),
            Tab::Expenses => self
                .selected_expense()
                .map(|e| Editor::EditingExpense(e.clone(), ExpenseForm::from_expense(e))),
        };
        if let Some(editor) = editor {
            self.editor = editor;
        }
    }

    pub fn close_editor(&mut self) {
        self.editor = Editor::None;
    }

    /// Send the open form to its ledger. A rejected write keeps the form open
    /// as typed. Once the write lands the form closes, even if the re-fetch
    /// afterwards fails, so a resubmit can't duplicate the record.
    pub fn submit(&mut self, conn: &Connection, now: Instant) {
        let editor = std::mem::take(&mut self.editor);

        let written = match &editor {
            Editor::None => return,
            Editor::NewEmployee(form) => form
                .to_new()
                .and_then(|input| create_employee(conn, input))
                .map(|_| (Tab::Contributions, "Contribution added!")),
            Editor::EditingEmployee(original, form) => form
                .to_update(original)
                .and_then(|changes| update_employee(conn, original.id, changes))
                .map(|_| (Tab::Contributions, "Contribution updated!")),
            Editor::NewExpense(form) => form
                .to_new()
                .and_then(|input| create_expense(conn, input))
                .map(|_| (Tab::Expenses, "Expense added!")),
            Editor::EditingExpense(original, form) => form
                .to_update(original)
                .and_then(|changes| update_expense(conn, original.id, changes))
                .map(|_| (Tab::Expenses, "Expense updated!")),
        };

        let (ledger, message) = match written {
            Ok(done) => done,
            Err(err) => {
                self.editor = editor;
                self.report_error(&err, now);
                return;
            }
        };

        let refreshed = match ledger {
            Tab::Contributions => self.refresh_employees(conn),
            Tab::Expenses => self.refresh_expenses(conn),
        };
        match refreshed {
            Ok(()) => self.notify(NotificationKind::Success, message, now),
            Err(err) => self.report_error(&err, now),
        }
    }

    pub fn request_delete(&mut self) {
        self.pending_delete = match self.tab {
            Tab::Contributions => self.selected_employee().map(|e| PendingDelete::Employee {
                id: e.id,
                name: e.name.clone(),
            }),
            Tab::Expenses => self.selected_expense().map(|e| PendingDelete::Expense {
                id: e.id,
                description: e.description.clone(),
            }),
        };
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    pub fn confirm_delete(&mut self, conn: &Connection, now: Instant) {
        let outcome = match self.pending_delete.take() {
            None => return,
            Some(PendingDelete::Employee { id, .. }) => delete_employee(conn, id)
                .and_then(|_| self.refresh_employees(conn))
                .map(|_| "Contribution removed!"),
            Some(PendingDelete::Expense { id, .. }) => delete_expense(conn, id)
                .and_then(|_| self.refresh_expenses(conn))
                .map(|_| "Expense removed!"),
        };

        match outcome {
            Ok(message) => self.notify(NotificationKind::Success, message, now),
            Err(err) => self.report_error(&err, now),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use crate::employees::get_employee;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn seeded_app(conn: &Connection) -> App {
        create_employee(conn, NewEmployee::new("Ana Souza", 500).with_status(ContributionStatus::Paid))
            .unwrap();
        create_employee(conn, NewEmployee::new("Bruno", 300)).unwrap();
        create_employee(
            conn,
            NewEmployee::new("Mariana", 300).with_status(ContributionStatus::AwaitingPermit),
        )
        .unwrap();
        create_expense(conn, NewExpense::new("Buffet", 200, "2024-12-20")).unwrap();
        App::load(conn, CurrencyFormat::brl()).unwrap()
    }

    #[test]
    fn test_filter_by_search_and_status() {
        let conn = test_conn();
        let app = seeded_app(&conn);

        let names = |list: Vec<&Employee>| list.iter().map(|e| e.name.clone()).collect::<Vec<_>>();

        assert_eq!(filter_employees(&app.employees, "", StatusFilter::All).len(), 3);
        assert_eq!(
            names(filter_employees(&app.employees, "ANA", StatusFilter::All)),
            vec!["Ana Souza", "Mariana"]
        );
        assert_eq!(
            names(filter_employees(
                &app.employees,
                "ana",
                StatusFilter::Only(ContributionStatus::Paid)
            )),
            vec!["Ana Souza"]
        );
        assert!(filter_employees(
            &app.employees,
            "bruno",
            StatusFilter::Only(ContributionStatus::Paid)
        )
        .is_empty());
    }

    #[test]
    fn test_status_filter_cycle() {
        let mut filter = StatusFilter::All;
        let mut seen = vec![filter];
        for _ in 0..4 {
            filter = filter.next();
            seen.push(filter);
        }
        assert_eq!(
            seen,
            vec![
                StatusFilter::All,
                StatusFilter::Only(ContributionStatus::Paid),
                StatusFilter::Only(ContributionStatus::Pending),
                StatusFilter::Only(ContributionStatus::AwaitingPermit),
                StatusFilter::All,
            ]
        );
    }

    #[test]
    fn test_notification_expires_after_ttl() {
        let conn = test_conn();
        let mut app = seeded_app(&conn);
        let start = Instant::now();

        app.notify(NotificationKind::Success, "saved", start);
        assert!(app.active_notification(start + Duration::from_secs(2)).is_some());

        app.tick(start + Duration::from_secs(2));
        assert!(app.notification.is_some());

        app.tick(start + NOTIFICATION_TTL);
        assert!(app.notification.is_none());
    }

    #[test]
    fn test_new_notification_replaces_current() {
        let conn = test_conn();
        let mut app = seeded_app(&conn);
        let start = Instant::now();

        app.notify(NotificationKind::Success, "first", start);
        app.notify(NotificationKind::Error, "second", start + Duration::from_secs(2));

        let shown = app.active_notification(start + Duration::from_secs(4)).unwrap();
        assert_eq!(shown.message, "second");
        assert_eq!(shown.kind, NotificationKind::Error);
    }

    #[test]
    fn test_submit_new_employee_refetches_and_closes() {
        let conn = test_conn();
        let mut app = seeded_app(&conn);
        let now = Instant::now();

        app.toggle_new_form("2024-12-01");
        assert!(matches!(app.editor, Editor::NewEmployee(_)));
        for c in "Carla".chars() {
            app.editor.push_char(c);
        }
        app.editor.focus_next();
        app.editor.backspace();
        app.editor.backspace();
        app.editor.backspace();
        for c in "25,50".chars() {
            app.editor.push_char(c);
        }

        app.submit(&conn, now);

        assert_eq!(app.editor, Editor::None);
        assert_eq!(app.employees.len(), 4);
        let carla = app.employees.iter().find(|e| e.name == "Carla").unwrap();
        assert_eq!(carla.contribution_amount, 2_550);
        assert_eq!(carla.status, ContributionStatus::Pending);
        assert_eq!(app.notification.as_ref().unwrap().kind, NotificationKind::Success);
    }

    #[test]
    fn test_failed_submit_keeps_form_and_state() {
        let conn = test_conn();
        let mut app = seeded_app(&conn);
        let before = app.employees.clone();

        app.toggle_new_form("2024-12-01");
        // name left empty
        app.submit(&conn, Instant::now());

        assert!(matches!(app.editor, Editor::NewEmployee(_)));
        assert_eq!(app.employees, before);
        let notification = app.notification.as_ref().unwrap();
        assert_eq!(notification.kind, NotificationKind::Error);
        assert!(notification.message.starts_with("Error: invalid name"));
    }

    #[test]
    fn test_storage_failure_keeps_form_and_snapshot() {
        let conn = test_conn();
        let mut app = seeded_app(&conn);
        app.next_tab();
        let before = app.expenses.clone();

        conn.execute_batch("DROP TABLE expenses").unwrap();

        app.toggle_new_form("2024-12-01");
        if let Editor::NewExpense(form) = &mut app.editor {
            form.description = "Cake".to_string();
            form.amount = "50".to_string();
        }
        app.submit(&conn, Instant::now());

        assert!(matches!(app.editor, Editor::NewExpense(ref form) if form.description == "Cake"));
        assert_eq!(app.expenses, before);
        let notification = app.notification.as_ref().unwrap();
        assert_eq!(notification.kind, NotificationKind::Error);
        assert!(notification.message.starts_with("Error: storage error"));
        assert!(notification.message.contains("no such table: expenses"));
    }

    #[test]
    fn test_failed_refetch_after_write_closes_form() {
        let conn = test_conn();
        let mut app = seeded_app(&conn);
        let before = app.employees.clone();

        // A row the list query can't decode
        conn.execute(
            "INSERT INTO employees (name, contribution_amount, status, created_at, updated_at)
             VALUES ('Broken', 100, 'Pending', 'yesterday', 'yesterday')",
            [],
        )
        .unwrap();

        app.toggle_new_form("2024-12-01");
        if let Editor::NewEmployee(form) = &mut app.editor {
            form.name = "Carla".to_string();
        }
        app.submit(&conn, Instant::now());

        assert_eq!(app.editor, Editor::None, "the write landed, so the form must not reopen");
        assert_eq!(app.employees, before);
        assert_eq!(app.notification.as_ref().unwrap().kind, NotificationKind::Error);

        let stored: i64 = conn
            .query_row("SELECT COUNT(*) FROM employees WHERE name = 'Carla'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, 1);

        // Submitting again has nothing to send
        app.submit(&conn, Instant::now());
        let stored: i64 = conn
            .query_row("SELECT COUNT(*) FROM employees WHERE name = 'Carla'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, 1);
    }

    #[test]
    fn test_unparseable_amount_is_a_validation_error() {
        let conn = test_conn();
        let mut app = seeded_app(&conn);
        app.tab = Tab::Expenses;

        app.toggle_new_form("2024-12-01");
        if let Editor::NewExpense(form) = &mut app.editor {
            form.description = "Cake".to_string();
            form.amount = "lots".to_string();
        }
        app.submit(&conn, Instant::now());

        assert!(app.editor.is_open());
        assert_eq!(app.expenses.len(), 1);
        assert!(app
            .notification
            .as_ref()
            .unwrap()
            .message
            .contains("invalid amount"));
    }

    #[test]
    fn test_edit_sends_only_changed_fields() {
        let conn = test_conn();
        let mut app = seeded_app(&conn);

        app.employee_selected = Some(1);
        app.edit_selected();
        let Editor::EditingEmployee(original, form) = &mut app.editor else {
            panic!("expected employee editor");
        };
        assert_eq!(original.name, "Bruno");
        assert_eq!(form.amount, "3.00");

        form.cycle_status();
        let changes = form.to_update(original).unwrap();
        assert_eq!(
            changes,
            EmployeeUpdate {
                status: Some(ContributionStatus::AwaitingPermit),
                ..Default::default()
            }
        );

        let id = original.id;
        app.submit(&conn, Instant::now());

        assert_eq!(app.editor, Editor::None);
        let stored = get_employee(&conn, id).unwrap();
        assert_eq!(stored.status, ContributionStatus::AwaitingPermit);
        assert_eq!(stored.contribution_amount, 300);
    }

    #[test]
    fn test_expense_edit_round_trip() {
        let conn = test_conn();
        let mut app = seeded_app(&conn);
        app.next_tab();
        app.edit_selected();

        if let Editor::EditingExpense(_, form) = &mut app.editor {
            form.purchase_date = "2024-12-21".to_string();
        } else {
            panic!("expected expense editor");
        }
        app.submit(&conn, Instant::now());

        assert_eq!(app.expenses[0].purchase_date, "2024-12-21");
        assert_eq!(app.expenses[0].amount, 200);
        assert_eq!(app.expenses[0].description, "Buffet");
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let conn = test_conn();
        let mut app = seeded_app(&conn);
        let now = Instant::now();

        app.request_delete();
        assert!(matches!(
            app.pending_delete,
            Some(PendingDelete::Employee { ref name, .. }) if name == "Ana Souza"
        ));
        app.cancel_delete();
        assert_eq!(app.employees.len(), 3);

        app.request_delete();
        app.confirm_delete(&conn, now);
        assert_eq!(app.employees.len(), 2);
        assert!(app.employees.iter().all(|e| e.name != "Ana Souza"));
        assert_eq!(app.employee_selected, Some(0));
    }

    #[test]
    fn test_delete_of_vanished_record_reports_error() {
        let conn = test_conn();
        let mut app = seeded_app(&conn);
        let before = app.employees.clone();

        app.request_delete();
        // Someone else removed it meanwhile
        delete_employee(&conn, before[0].id).unwrap();
        app.confirm_delete(&conn, Instant::now());

        assert_eq!(app.employees, before, "state only changes after a successful round trip");
        assert_eq!(app.notification.as_ref().unwrap().kind, NotificationKind::Error);
    }

    #[test]
    fn test_selection_wraps_and_follows_filter() {
        let conn = test_conn();
        let mut app = seeded_app(&conn);

        assert_eq!(app.employee_selected, Some(0));
        app.previous();
        assert_eq!(app.employee_selected, Some(2));
        app.next();
        assert_eq!(app.employee_selected, Some(0));

        for c in "mari".chars() {
            app.push_search(c);
        }
        assert_eq!(app.visible_employees().len(), 1);
        assert_eq!(app.selected_employee().unwrap().name, "Mariana");
    }

    #[test]
    fn test_totals_follow_snapshot() {
        let conn = test_conn();
        let app = seeded_app(&conn);

        let totals = app.totals();
        assert_eq!(totals.total_collected, 500);
        assert_eq!(totals.total_pending, 600);
        assert_eq!(totals.total_expenses, 200);
        assert_eq!(totals.balance, 300);
    }
}
