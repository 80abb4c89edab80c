// Command-line / environment configuration shared by both binaries

use crate::summary::CurrencyFormat;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "event-fund.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Currency {
    #[default]
    Brl,
    Usd,
}

impl Currency {
    pub fn format(&self) -> CurrencyFormat {
        match self {
            Currency::Brl => CurrencyFormat::brl(),
            Currency::Usd => CurrencyFormat::usd(),
        }
    }
}

/// Options every binary understands
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// SQLite database file (created if missing)
    #[arg(long = "db", env = "EVENT_FUND_DB", default_value = DEFAULT_DB_PATH)]
    pub database: PathBuf,

    /// Currency used when displaying amounts
    #[arg(long, env = "EVENT_FUND_CURRENCY", value_enum, default_value_t = Currency::Brl)]
    pub currency: Currency,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, env = "EVENT_FUND_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}
