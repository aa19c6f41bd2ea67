//! Shared fixtures for integration tests.
//!
//! Every context owns a temporary directory holding one database file, so
//! tests can close and reopen the same store.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use clap::Parser;
use srs_core::{Algorithm, EbisuKnobs, FsrsKnobs, Scheduler};
use srsdb::commands::{execute, Cli};
use srsdb::db::SqliteStore;
use std::path::PathBuf;
use tempfile::TempDir;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
}

pub struct TestContext {
    _dir: TempDir,
    pub path: PathBuf,
}

impl TestContext {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("srsdb.db");
        Self { _dir: dir, path }
    }

    pub fn store(&self, algorithm: Algorithm) -> SqliteStore {
        SqliteStore::open(&self.path, algorithm).expect("Failed to open store")
    }

    pub fn fsrs(&self) -> Scheduler<SqliteStore> {
        Scheduler::fsrs(FsrsKnobs::default(), self.store(Algorithm::Fsrs)).unwrap()
    }

    pub fn ebisu(&self) -> Scheduler<SqliteStore> {
        Scheduler::ebisu(EbisuKnobs::default(), self.store(Algorithm::Ebisu)).unwrap()
    }

    /// Run the CLI against this context's database and capture stdout.
    pub fn cli(&self, algorithm: Algorithm, args: &[&str]) -> anyhow::Result<String> {
        let mut argv = vec![
            "srsdb".to_string(),
            "--db".to_string(),
            self.path.display().to_string(),
            "--algorithm".to_string(),
            algorithm.to_string(),
        ];
        argv.extend(args.iter().map(|arg| arg.to_string()));

        let cli = Cli::try_parse_from(argv)?;
        let mut out = Vec::new();
        execute(cli, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    pub fn count_rows(&self, table: &str) -> i64 {
        let conn = rusqlite::Connection::open(&self.path).unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }
}
