// Event Fund - Web Server
// JSON API over the contribution and expense ledgers

use anyhow::{Context, Result};
use clap::Parser;
use event_fund::api::{router, AppState};
use event_fund::config::{CommonArgs, DEFAULT_BIND_ADDR};
use event_fund::logging::{init_file_logger, init_logger};
use event_fund::open_database;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "event-fund-server", version, about = "HTTP API for the event fund ledgers")]
struct ServerArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Address to listen on
    #[arg(long, env = "EVENT_FUND_BIND", default_value = DEFAULT_BIND_ADDR)]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = ServerArgs::parse();

    match &args.common.log_file {
        Some(path) => init_file_logger(args.common.verbose, path)?,
        None => init_logger(args.common.verbose),
    }

    let conn = open_database(&args.common.database)?;
    info!(db = %args.common.database.display(), "database opened");

    let app = router(AppState::new(conn));

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", args.bind))?;

    info!(addr = %args.bind, version = event_fund::VERSION, "server running");
    info!("API: http://{}/api/employees", args.bind);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
