// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use event_fund::config::CommonArgs;
use event_fund::logging::{init_file_logger, init_logger};
use event_fund::{list_employees, list_expenses, open_database, share_report, Totals};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "event-fund", version, about = "Track contributions and expenses for an event")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the shareable status report and exit
    Summary,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Summary) => {
            init_logger(cli.common.verbose);
            run_summary(&cli.common)
        }
        // UI mode (default)
        None => {
            if let Some(path) = &cli.common.log_file {
                init_file_logger(cli.common.verbose, path)?;
            }
            run_ui_mode(&cli.common)
        }
    }
}

fn run_summary(args: &CommonArgs) -> Result<()> {
    let conn = open_database(&args.database)?;

    let employees = list_employees(&conn).context("Failed to load contributions")?;
    let expenses = list_expenses(&conn).context("Failed to load expenses")?;
    let totals = Totals::compute(&employees, &expenses);
    let currency = args.currency.format();

    info!(employees = employees.len(), expenses = expenses.len(), "summary loaded");

    println!("{}", share_report(&employees, &totals, &currency));
    println!();
    println!("SPENT: {}", currency.format(totals.total_expenses));
    println!("BALANCE: {}", currency.format(totals.balance));

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(args: &CommonArgs) -> Result<()> {
    use event_fund::App;

    let conn = open_database(&args.database)?;
    let mut app = App::load(&conn, args.currency.format()).context("Failed to load ledgers")?;

    info!(db = %args.database.display(), "starting UI");
    ui::run_ui(&mut app, &conn)?;
    info!("UI closed");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_args: &CommonArgs) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or print the report: event-fund summary");
    std::process::exit(1);
}
