//! This program checks the generated `site_texts` localization migrations for
//! rows that insert the same `(key, language_code)` pair more than once.
//!
//! Such rows are silently collapsed by the migration's `ON CONFLICT` clause,
//! so only one of the inserted values survives and which one depends on row
//! order. Running this before applying a migration catches the problem early.

mod config;
mod migrations;
mod report;
mod scan;

use crate::{config::Config, report::Report};
use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use std::{
    io::{BufWriter, Write},
    num::NonZeroUsize,
    path::PathBuf,
};

/// Find duplicated (key, language_code) pairs in a site_texts migration
///
/// Pairs are counted across the whole file, then separately within each
/// `INSERT INTO <table> (...) VALUES ... ON CONFLICT` statement. Extraction is
/// pattern-based and does not attempt to parse SQL.
#[derive(Parser, Debug)]
#[command(version, author)]
struct Args {
    /// Migration file to be scanned
    ///
    /// Will interactively prompt for one of the files of the migrations
    /// directory if not specified.
    path: Option<PathBuf>,

    /// Directory where migrations are looked up when no path is specified
    #[arg(short = 'd', long, default_value = "supabase/migrations")]
    migrations_dir: PathBuf,

    /// Localization table whose INSERT statements are checked one by one
    ///
    /// May be schema-qualified (e.g. "public.site_texts"), in which case it
    /// must be spelled the same way in the migration.
    #[arg(short, long, default_value = scan::DEFAULT_TABLE)]
    table: Box<str>,

    /// Exit with an error status when duplicates are found
    ///
    /// The full report is still printed first. This is meant for CI checks,
    /// where a migration with duplicated pairs should not get merged.
    #[arg(long, default_value_t = false)]
    fail_on_duplicates: bool,
}
//
impl Args {
    /// Decode and validate CLI arguments
    pub fn parse_and_check() -> Result<Self> {
        // Decode CLI arguments
        let args = Args::parse();

        // Check CLI arguments for basic sanity
        let table_is_valid = match args.table.split_once('.') {
            Some((schema, table)) => is_sql_identifier(schema) && is_sql_identifier(table),
            None => is_sql_identifier(&args.table),
        };
        anyhow::ensure!(
            table_is_valid,
            "requested table name {:?} is not a valid SQL identifier",
            args.table
        );
        Ok(args)
    }
}
//
fn main() -> Result<()> {
    // Set up logging, the report itself does not depend on it
    if let Err(e) = setup_logging() {
        eprintln!("Failed to set up logging, continuing without it: {e}");
    }

    // Decode CLI arguments
    let args = Args::parse_and_check()?;

    // Pick a migration file
    let migration = migrations::pick(&args)?;
    let config = Config::new(args, migration);
    let blocks = config.block_pattern()?;

    // Load it
    let text = std::fs::read_to_string(&config.migration)
        .with_context(|| format!("reading migration file {}", config.migration.display()))?;
    log::info!(
        "Scanning {} ({} bytes)",
        config.migration.display(),
        text.len()
    );

    // Look for duplicates and display them
    let report = Report::new(&text, &blocks);
    log::info!(
        "Found {} distinct pairs, {} duplicated across the file, over {} INSERT blocks",
        report.total_distinct(),
        report.global_duplicates().len(),
        report.block_duplicates().len()
    );
    {
        let stdout = std::io::stdout();
        let mut stdout = BufWriter::new(stdout.lock());
        report.write_to(&mut stdout)?;
        stdout.flush()?;
    }

    // Fail if requested
    anyhow::ensure!(
        !(config.fail_on_duplicates && report.has_duplicates()),
        "duplicated (key, language_code) pairs found in {}",
        config.migration.display()
    );
    Ok(())
}

/// Use anyhow for Result type erasure
pub use anyhow::Result;

/// Addition operator for NonZeroUsize
pub fn add_nonzero_usize(x: NonZeroUsize, y: NonZeroUsize) -> NonZeroUsize {
    x.checked_add(y.get())
        .expect("overflow while adding NonZeroUsizes")
}

/// Truth that a name is a plain unquoted SQL identifier
fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Set up logging
fn setup_logging() -> syslog::Result<()> {
    syslog::init(
        syslog::Facility::LOG_USER,
        if cfg!(feature = "log-trace") {
            LevelFilter::Trace
        } else if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_identifiers() {
        assert!(is_sql_identifier("site_texts"));
        assert!(is_sql_identifier("_texts2"));
        assert!(!is_sql_identifier(""));
        assert!(!is_sql_identifier("2texts"));
        assert!(!is_sql_identifier("site texts"));
        assert!(!is_sql_identifier("site_texts;"));
    }

    #[test]
    fn nonzero_addition() {
        let two = NonZeroUsize::new(2).unwrap();
        assert_eq!(add_nonzero_usize(two, NonZeroUsize::MIN).get(), 3);
    }
}
