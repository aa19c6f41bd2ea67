//! Command-line and environment configuration.

use anyhow::{Context, Result};
use clap::Args;
use srs_core::{Algorithm, EbisuKnobs, FsrsKnobs, StrategyConfig};
use std::path::PathBuf;
use tracing::warn;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct StoreOptions {
    /// SQLite database file
    #[arg(long, global = true, env = "SRSDB_DATABASE")]
    pub db: Option<PathBuf>,

    /// Scheduling algorithm: fsrs or ebisu
    #[arg(long, global = true, env = "SRSDB_ALGORITHM", default_value = "fsrs")]
    pub algorithm: Algorithm,

    /// FSRS rating thresholds as three ascending percentages, e.g. 25,50,85
    #[arg(long, global = true, value_parser = parse_thresholds)]
    pub thresholds: Option<(f64, f64, f64)>,

    /// Ebisu half-life for new cards, in hours
    #[arg(long, global = true)]
    pub half_life: Option<f64>,

    /// Ebisu recall probability at which a card becomes due
    #[arg(long, global = true)]
    pub recall_threshold: Option<f64>,

    /// Ebisu recall probability the re-fitted model is anchored at
    #[arg(long, global = true)]
    pub target_recall: Option<f64>,
}

impl StoreOptions {
    /// Database path, falling back to the per-user data directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.db {
            Some(path) => Ok(path.clone()),
            None => {
                let dir = dirs::data_dir()
                    .context("no data directory for this platform; pass --db")?
                    .join("srsdb");
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("creating {}", dir.display()))?;
                Ok(dir.join("srsdb.db"))
            }
        }
    }

    /// Knobs for the selected algorithm with flag overrides applied.
    pub fn strategy_config(&self) -> Result<StrategyConfig> {
        let config = match self.algorithm {
            Algorithm::Fsrs => {
                if self.half_life.is_some()
                    || self.recall_threshold.is_some()
                    || self.target_recall.is_some()
                {
                    warn!("ebisu options are ignored by the fsrs algorithm");
                }
                let knobs = match self.thresholds {
                    Some((t1, t2, t3)) => FsrsKnobs::with_thresholds(t1, t2, t3),
                    None => FsrsKnobs::default(),
                };
                StrategyConfig::Fsrs(knobs)
            }
            Algorithm::Ebisu => {
                if self.thresholds.is_some() {
                    warn!("--thresholds is ignored by the ebisu algorithm");
                }
                let mut knobs = EbisuKnobs::default();
                if let Some(hours) = self.half_life {
                    knobs.default_half_life_hours = hours;
                }
                if let Some(recall) = self.recall_threshold {
                    knobs.recall_threshold = recall;
                }
                if let Some(recall) = self.target_recall {
                    knobs.target_recall = recall;
                }
                StrategyConfig::Ebisu(knobs)
            }
        };
        config.validate()?;
        Ok(config)
    }
}

fn parse_thresholds(value: &str) -> std::result::Result<(f64, f64, f64), String> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid threshold: {e}"))?;
    match parts.as_slice() {
        [a, b, c] => Ok((*a, *b, *c)),
        _ => Err(format!("expected three thresholds, got {}", parts.len())),
    }
}
