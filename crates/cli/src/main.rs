//! `holdings` - look-through analysis of fund holdings from the terminal.
//!
//! ```bash
//! holdings --input holdings.xlsx summary
//! holdings top -n 20
//! holdings range --start 11 --end 25
//! holdings distribution --by sector --threshold 1
//! holdings --json export --out positions.csv
//! holdings --input export.csv inspect
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use models::{Dimension, WorksheetId};
use std::path::PathBuf;

mod commands;
mod output;

#[derive(Parser, Debug)]
#[command(name = "holdings", version, about = "Consolidate fund holdings into look-through positions.")]
struct Cli {
    /// Settings file (defaults to ./settings.json, then built-in defaults)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Read this workbook or CSV file instead of the configured source
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Worksheet tab, by 0-based position or name
    #[arg(short, long, global = true)]
    worksheet: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// KPIs, country and sector distributions, and the top positions
    Summary,

    /// Heaviest positions
    Top {
        /// Number of positions (defaults to top_positions from settings)
        #[arg(short)]
        n: Option<usize>,
    },

    /// Positions between two ranks, inclusive
    Range {
        #[arg(long)]
        start: Option<usize>,
        #[arg(long)]
        end: Option<usize>,
    },

    /// Share of exposure by country or sector
    Distribution {
        /// country or sector
        #[arg(long)]
        by: Dimension,

        /// Groups below this share (in percent) are folded into one bucket
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Write positions (or normalized rows) as CSV
    Export {
        #[arg(long)]
        out: PathBuf,

        /// Export normalized input rows instead of consolidated positions
        #[arg(long)]
        rows: bool,
    },

    /// Show the input header and how it maps onto the canonical columns
    Inspect,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ctx = commands::Context::load(
        cli.settings.as_ref(),
        cli.input.as_ref(),
        cli.worksheet.as_deref().map(WorksheetId::parse),
    )?;

    match cli.command {
        Command::Summary => commands::summary(&ctx, cli.json),
        Command::Top { n } => commands::top(&ctx, n, cli.json),
        Command::Range { start, end } => commands::range(&ctx, start, end, cli.json),
        Command::Distribution { by, threshold } => {
            commands::distribution(&ctx, by, threshold, cli.json)
        }
        Command::Export { out, rows } => commands::export(&ctx, &out, rows),
        Command::Inspect => commands::inspect(&ctx, cli.json),
    }
}
