//! Command-line surface.

mod demo;
mod report;
mod study;

use crate::config::StoreOptions;
use crate::db::SqliteStore;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use srs_core::Scheduler;
use std::io::Write;
use tracing::info;

/// srsdb - spaced repetition scheduling over SQLite
#[derive(Debug, Parser)]
#[command(name = "srsdb")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Schedule flashcard reviews with FSRS or Ebisu")]
pub struct Cli {
    #[command(flatten)]
    pub options: StoreOptions,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record an answer with a 0-100 correctness score
    Answer {
        key: String,
        correctness: f64,
        /// Review time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// List cards due for review, most urgent first
    Next {
        /// Evaluation time (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Print the earliest upcoming due time
    NextDue,

    /// Show one card's scheduling state
    Show {
        key: String,
        #[arg(long)]
        json: bool,
    },

    /// Show one card's review history
    History {
        key: String,
        #[arg(long)]
        json: bool,
    },

    /// Show collection statistics and a per-card listing
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Simulate a vocabulary learning journey into the database
    Demo {
        /// Only run sessions within this many days of the start
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
}

/// Open the configured store and run one command, writing to `out`.
pub fn execute(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let mut scheduler = open_scheduler(&cli.options)?;
    match cli.command {
        Command::Answer {
            key,
            correctness,
            at,
        } => study::answer(&mut scheduler, out, &key, correctness, at.unwrap_or_else(Utc::now)),
        Command::Next { at } => study::next(&scheduler, out, at.unwrap_or_else(Utc::now)),
        Command::NextDue => study::next_due(&scheduler, out),
        Command::Show { key, json } => study::show(&scheduler, out, &key, json, Utc::now()),
        Command::History { key, json } => study::history(&scheduler, out, &key, json),
        Command::Stats { json } => report::stats(&scheduler, out, json),
        Command::Demo { days } => demo::run(&mut scheduler, out, days),
    }
}

fn open_scheduler(options: &StoreOptions) -> Result<Scheduler<SqliteStore>> {
    let config = options.strategy_config()?;
    let path = options.database_path()?;
    let store = SqliteStore::open(&path, config.algorithm())
        .with_context(|| format!("opening {}", path.display()))?;
    info!(algorithm = %config.algorithm(), "scheduler ready");
    Ok(Scheduler::new(config, store)?)
}
