//! Scan configuration

use crate::{scan::BlockPattern, Args, Result};
use std::path::PathBuf;

/// Final process configuration
///
/// This is the result of combining digested [`Args`] with the migration file
/// that was picked. Please refer to [`Args`] to know more about common fields.
#[allow(missing_docs)]
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Config {
    /// Migration file to be scanned
    pub migration: PathBuf,

    // Other fields have the same meaning as in Args
    pub table: Box<str>,
    pub fail_on_duplicates: bool,
}
//
impl Config {
    /// Determine process configuration from initialization products
    pub(crate) fn new(args: Args, migration: PathBuf) -> Self {
        let Args {
            path: _,
            migrations_dir: _,
            table,
            fail_on_duplicates,
        } = args;
        Self {
            migration,
            table,
            fail_on_duplicates,
        }
    }

    /// Matcher for the INSERT blocks of the configured table
    pub fn block_pattern(&self) -> Result<BlockPattern> {
        BlockPattern::new(&self.table)
    }
}
