//! Selection of the migration file to be scanned

use crate::{Args, Result};
use anyhow::Context;
use dialoguer::FuzzySelect;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Determine which migration file should be scanned
///
/// An explicit path always wins, otherwise the user is asked to pick one of
/// the SQL files from the migrations directory.
pub fn pick(args: &Args) -> Result<PathBuf> {
    if let Some(path) = &args.path {
        return Ok(path.clone());
    }
    let migrations = list(&args.migrations_dir)?;
    prompt(&migrations).context("Failed to select a migration file")
}

/// List the SQL migrations from a directory, sorted by file name
pub fn list(dir: &Path) -> Result<Vec<PathBuf>> {
    let context = || format!("listing migrations in {}", dir.display());
    let mut migrations = Vec::new();
    for entry in fs::read_dir(dir).with_context(context)? {
        let path = entry.with_context(context)?.path();
        let is_sql = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"));
        if is_sql && path.is_file() {
            migrations.push(path);
        }
    }
    anyhow::ensure!(
        !migrations.is_empty(),
        "no SQL migration found in {}",
        dir.display()
    );
    migrations.sort_unstable();
    log::debug!("Found migrations {migrations:?}");
    Ok(migrations)
}

/// Ask the user to select a migration file
///
/// Migrations are named after their creation date, so the last one is the
/// most recent and is offered by default.
fn prompt(migrations: &[PathBuf]) -> dialoguer::Result<PathBuf> {
    let migration_names = migrations
        .iter()
        .map(|path| {
            path.file_name()
                .unwrap_or(path.as_os_str())
                .to_string_lossy()
                .into_owned()
        })
        .collect::<Vec<_>>();
    let migration_idx = FuzzySelect::new()
        .with_prompt("Which migration should I scan?")
        .items(&migration_names)
        .default(migration_names.len().saturating_sub(1))
        .max_length(usize::MAX)
        .interact()?;
    Ok(migrations[migration_idx].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn lists_sql_files_in_name_order() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("20250114_populate_all_site_texts.sql")
            .write_str("SELECT 1;")
            .unwrap();
        dir.child("20240101_init.SQL").write_str("SELECT 1;").unwrap();
        dir.child("README.md").write_str("# Migrations").unwrap();
        dir.child("nested.sql").create_dir_all().unwrap();

        let names = list(dir.path())
            .unwrap()
            .into_iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec!["20240101_init.SQL", "20250114_populate_all_site_texts.sql"]
        );
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("notes.txt").write_str("nothing here").unwrap();
        let err = list(dir.path()).unwrap_err();
        assert!(err.to_string().contains("no SQL migration found"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = assert_fs::TempDir::new().unwrap();
        assert!(list(&dir.path().join("missing")).is_err());
    }
}
