use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use event_fund::app::{
    App, Editor, EmployeeField, EmployeeForm, ExpenseField, ExpenseForm, NotificationKind, Tab,
};
use event_fund::employees::ContributionStatus;
use event_fund::summary::share_report;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use rusqlite::Connection;
use std::io;
use std::time::{Duration, Instant};

/// Redraw cadence; also how often expired notifications are noticed
const TICK: Duration = Duration::from_millis(250);

pub fn run_ui(app: &mut App, conn: &Connection) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app, conn);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    conn: &Connection,
) -> Result<()> {
    loop {
        let now = Instant::now();
        app.tick(now);
        terminal.draw(|f| ui(f, app, now))?;

        if !event::poll(TICK)? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if handle_key(app, conn, key, Instant::now()) == Flow::Quit {
                return Ok(());
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

fn handle_key(app: &mut App, conn: &Connection, key: KeyEvent, now: Instant) -> Flow {
    // Delete confirmation swallows the next key
    if app.pending_delete.is_some() {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(conn, now),
            _ => app.cancel_delete(),
        }
        return Flow::Continue;
    }

    if app.editor.is_open() {
        match key.code {
            KeyCode::Esc => app.close_editor(),
            KeyCode::Enter => app.submit(conn, now),
            KeyCode::Tab | KeyCode::Down => app.editor.focus_next(),
            KeyCode::Backspace => app.editor.backspace(),
            KeyCode::Char(c) => app.editor.push_char(c),
            _ => {}
        }
        return Flow::Continue;
    }

    if app.searching {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => app.searching = false,
            KeyCode::Backspace => app.pop_search(),
            KeyCode::Char(c) => app.push_search(c),
            _ => {}
        }
        return Flow::Continue;
    }

    match key.code {
        KeyCode::Char('q') => return Flow::Quit,
        KeyCode::Esc if app.show_summary => app.toggle_summary(),
        KeyCode::Esc => return Flow::Quit,
        KeyCode::Tab => app.next_tab(),
        KeyCode::Down | KeyCode::Char('j') => app.next(),
        KeyCode::Up | KeyCode::Char('k') => app.previous(),
        KeyCode::Char('n') => app.toggle_new_form(&today()),
        KeyCode::Char('e') | KeyCode::Enter => app.edit_selected(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
        KeyCode::Char('/') if app.tab == Tab::Contributions => app.searching = true,
        KeyCode::Char('f') if app.tab == Tab::Contributions => app.cycle_status_filter(),
        KeyCode::Char('s') if app.tab == Tab::Contributions => app.toggle_summary(),
        _ => {}
    }
    Flow::Continue
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

fn ui(f: &mut Frame, app: &App, now: Instant) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Length(3), // Totals
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_totals(f, chunks[1], app);

    match app.tab {
        Tab::Contributions if app.show_summary => render_summary(f, chunks[2], app),
        Tab::Contributions => render_employees(f, chunks[2], app),
        Tab::Expenses => render_expenses(f, chunks[2], app),
    }

    render_status_bar(f, chunks[3], app, now);

    if app.editor.is_open() {
        let area = centered_rect(60, 40, f.size());
        render_editor(f, area, &app.editor);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, tab) in [Tab::Contributions, Tab::Expenses].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *tab == app.tab {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(tab.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("{} people", app.employees.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("{} expenses", app.expenses.len()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Event Fund "),
    );

    f.render_widget(header, area);
}

fn render_totals(f: &mut Frame, area: Rect, app: &App) {
    let totals = app.totals();
    let fmt = &app.currency;
    let balance_color = if totals.balance < 0 { Color::Red } else { Color::Green };

    let line = Line::from(vec![
        Span::styled(" Collected: ", Style::default().fg(Color::Cyan)),
        Span::styled(fmt.format(totals.total_collected), Style::default().fg(Color::Green)),
        Span::raw("  |  "),
        Span::styled("Pending: ", Style::default().fg(Color::Cyan)),
        Span::styled(fmt.format(totals.total_pending), Style::default().fg(Color::Yellow)),
        Span::raw("  |  "),
        Span::styled("Spent: ", Style::default().fg(Color::Cyan)),
        Span::styled(fmt.format(totals.total_expenses), Style::default().fg(Color::Red)),
        Span::raw("  |  "),
        Span::styled("Balance: ", Style::default().fg(Color::Cyan)),
        Span::styled(
            fmt.format(totals.balance),
            Style::default().fg(balance_color).add_modifier(Modifier::BOLD),
        ),
    ]);

    let paragraph = Paragraph::new(vec![line]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );
    f.render_widget(paragraph, area);
}

fn status_color(status: ContributionStatus) -> Color {
    match status {
        ContributionStatus::Paid => Color::Green,
        ContributionStatus::Pending => Color::Yellow,
        ContributionStatus::AwaitingPermit => Color::Blue,
    }
}

fn header_row<'a>(titles: &[&'a str]) -> Row<'a> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn render_employees(f: &mut Frame, area: Rect, app: &App) {
    let visible = app.visible_employees();

    let rows = visible.iter().map(|e| {
        Row::new(vec![
            Cell::from(truncate(&e.name, 40)),
            Cell::from(app.currency.format(e.contribution_amount)),
            Cell::from(e.status.label()).style(Style::default().fg(status_color(e.status))),
        ])
        .height(1)
    });

    let mut title = format!(" Contributions ({}/{}) ", visible.len(), app.employees.len());
    if !app.search.is_empty() || app.searching {
        title.push_str(&format!("search: \"{}\" ", app.search));
    }
    title.push_str(&format!("filter: {} ", app.status_filter.label()));

    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(18),
            Constraint::Length(18),
        ],
    )
    .header(header_row(&["Name", "Contribution", "Status"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    let mut state = TableState::default();
    state.select(app.employee_selected);
    f.render_stateful_widget(table, area, &mut state);
}

fn render_expenses(f: &mut Frame, area: Rect, app: &App) {
    let rows = app.expenses.iter().map(|e| {
        Row::new(vec![
            Cell::from(e.purchase_date.clone()),
            Cell::from(truncate(&e.description, 40)),
            Cell::from(app.currency.format(e.amount)).style(Style::default().fg(Color::Red)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Min(20),
            Constraint::Length(18),
        ],
    )
    .header(header_row(&["Date", "Item", "Amount"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" Expenses ({}) ", app.expenses.len())),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    let mut state = TableState::default();
    state.select(app.expense_selected);
    f.render_stateful_widget(table, area, &mut state);
}

fn render_summary(f: &mut Frame, area: Rect, app: &App) {
    let report = share_report(&app.employees, &app.totals(), &app.currency);

    let mut content: Vec<Line> = report
        .lines()
        .map(|line| Line::from(format!("  {}", line)))
        .collect();
    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  Take a screenshot and share it! (Esc to close)",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .title(" Status Summary "),
    );
    f.render_widget(paragraph, area);
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let label_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let value_style = if focused {
        Style::default().fg(Color::Black).bg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };

    Line::from(vec![
        Span::styled(format!("  {:<14}", label), label_style),
        Span::styled(
            format!("{}{}", value, if focused { "▏" } else { "" }),
            value_style,
        ),
    ])
}

fn employee_form_lines(form: &EmployeeForm) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(""),
        field_line("Name", &form.name, form.focus == EmployeeField::Name),
        Line::from(""),
        field_line("Amount", &form.amount, form.focus == EmployeeField::Amount),
    ];
    if let Some(status) = form.status {
        lines.push(Line::from(""));
        lines.push(field_line(
            "Status",
            status.label(),
            form.focus == EmployeeField::Status,
        ));
    }
    lines
}

fn expense_form_lines(form: &ExpenseForm) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        field_line(
            "Item",
            &form.description,
            form.focus == ExpenseField::Description,
        ),
        Line::from(""),
        field_line("Amount", &form.amount, form.focus == ExpenseField::Amount),
        Line::from(""),
        field_line(
            "Date",
            &form.purchase_date,
            form.focus == ExpenseField::PurchaseDate,
        ),
    ]
}

fn render_editor(f: &mut Frame, area: Rect, editor: &Editor) {
    let mut content = match editor {
        Editor::None => return,
        Editor::NewEmployee(form) | Editor::EditingEmployee(_, form) => employee_form_lines(form),
        Editor::NewExpense(form) | Editor::EditingExpense(_, form) => expense_form_lines(form),
    };

    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  Tab next field | Enter save | Esc cancel",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));

    let form = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(format!(" {} ", editor.title())),
    );

    f.render_widget(Clear, area);
    f.render_widget(form, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App, now: Instant) {
    let spans = if let Some(pending) = &app.pending_delete {
        vec![Span::styled(
            format!(" {}", pending.prompt()),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )]
    } else if let Some(notification) = app.active_notification(now) {
        let color = match notification.kind {
            NotificationKind::Success => Color::Green,
            NotificationKind::Error => Color::Red,
        };
        vec![Span::styled(
            format!(" {}", notification.message),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )]
    } else {
        key_hints(app)
    };

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn key_hints(app: &App) -> Vec<Span<'static>> {
    let mut hints = vec![("Tab", " Page"), ("n", " New"), ("e", " Edit"), ("d", " Delete")];
    if app.tab == Tab::Contributions {
        hints.extend([("/", " Search"), ("f", " Filter"), ("s", " Summary")]);
    }

    let mut spans = vec![Span::raw(" ")];
    for (key, action) in hints {
        spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(action));
        spans.push(Span::raw(" | "));
    }
    spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    spans.push(Span::raw(" Quit"));
    spans
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
