//! Duplicate report over a whole migration and each of its INSERT blocks

use crate::scan::{self, BlockPattern, Duplicate};
use std::io::{self, Write};

/// What was learned by scanning a migration file
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Report<'text> {
    /// Number of distinct tuples across the whole file
    total_distinct: usize,

    /// Tuples duplicated across the whole file
    global_duplicates: Vec<Duplicate<'text>>,

    /// Tuples duplicated within each INSERT block, in file order
    block_duplicates: Vec<Vec<Duplicate<'text>>>,
}
//
impl<'text> Report<'text> {
    /// Scan a migration file's text
    pub fn new(text: &'text str, blocks: &BlockPattern) -> Self {
        let global = scan::scan_global(text);
        let block_duplicates = (blocks.split(text).into_iter())
            .map(|block| scan::scan_block(block).duplicates())
            .collect::<Vec<_>>();
        Self {
            total_distinct: global.distinct(),
            global_duplicates: global.duplicates(),
            block_duplicates,
        }
    }

    /// Number of distinct tuples across the whole file
    pub fn total_distinct(&self) -> usize {
        self.total_distinct
    }

    /// Tuples duplicated across the whole file
    pub fn global_duplicates(&self) -> &[Duplicate<'text>] {
        &self.global_duplicates[..]
    }

    /// Tuples duplicated within each INSERT block
    pub fn block_duplicates(&self) -> &[Vec<Duplicate<'text>>] {
        &self.block_duplicates[..]
    }

    /// Truth that some tuple is duplicated, globally or within a block
    pub fn has_duplicates(&self) -> bool {
        // Block tuples are matched separately from the whole-file scan
        !self.global_duplicates.is_empty()
            || self.block_duplicates.iter().any(|block| !block.is_empty())
    }

    /// Display the report
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(
            out,
            "Total distinct (key,lang) pairs found: {}",
            self.total_distinct
        )?;
        if self.global_duplicates.is_empty() {
            writeln!(out, "No duplicates found across whole file.")?;
        } else {
            writeln!(out, "Duplicates across file:")?;
            for duplicate in &self.global_duplicates {
                writeln!(out, "  {duplicate}")?;
            }
        }
        for (idx, duplicates) in self.block_duplicates.iter().enumerate() {
            writeln!(out)?;
            writeln!(out, "Block {} duplicates:", idx + 1)?;
            if duplicates.is_empty() {
                writeln!(out, "  None")?;
            }
            for duplicate in duplicates {
                writeln!(out, "  {duplicate}")?;
            }
        }
        Ok(())
    }
}
