//! Extraction and counting of `(key, language_code)` tuples
//!
//! Matching is pattern-based, there is no SQL parser here: a tuple is
//! anything that looks like `('some.key', 'xx'` in the migration text, and an
//! INSERT block is whatever lies between a known INSERT header and the next
//! `ON CONFLICT`.

use crate::{add_nonzero_usize, Result};
use anyhow::Context;
use regex::Regex;
use std::{
    collections::{hash_map, HashMap},
    fmt,
    num::NonZeroUsize,
    sync::OnceLock,
};

/// Localization table that migrations insert site texts into
pub const DEFAULT_TABLE: &str = "site_texts";

/// Identity of a localized text, borrowed from the scanned migration
///
/// Tuples are ordered by key first, then by language code.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TupleKey<'text> {
    /// Site text identifier
    pub key: &'text str,

    /// Two-letter lowercase language code
    pub language_code: &'text str,
}

/// Tuple that was inserted more than once
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Duplicate<'text> {
    /// Duplicated tuple
    pub tuple: TupleKey<'text>,

    /// Number of times the tuple was seen
    pub count: NonZeroUsize,
}
//
impl fmt::Display for Duplicate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} occurrences",
            self.tuple.key, self.tuple.language_code, self.count
        )
    }
}

/// Occurence count of each tuple seen in some text
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PairCounts<'text>(HashMap<TupleKey<'text>, NonZeroUsize>);
//
impl<'text> PairCounts<'text> {
    /// Start with no tuple seen
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one more occurence of a tuple
    pub fn add(&mut self, tuple: TupleKey<'text>) {
        match self.0.entry(tuple) {
            hash_map::Entry::Occupied(o) => {
                let count = o.into_mut();
                *count = add_nonzero_usize(*count, NonZeroUsize::MIN);
            }
            hash_map::Entry::Vacant(v) => {
                v.insert(NonZeroUsize::MIN);
            }
        }
    }

    /// Number of distinct tuples
    pub fn distinct(&self) -> usize {
        self.0.len()
    }

    /// Truth that no tuple was seen
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tuples seen more than once, sorted by key then language code
    pub fn duplicates(&self) -> Vec<Duplicate<'text>> {
        let mut duplicates = (self.0.iter())
            .filter(|(_tuple, count)| count.get() > 1)
            .map(|(tuple, count)| Duplicate {
                tuple: *tuple,
                count: *count,
            })
            .collect::<Vec<_>>();
        duplicates.sort_unstable_by_key(|duplicate| duplicate.tuple);
        duplicates
    }
}

/// Count the tuples of a whole migration file
pub fn scan_global(text: &str) -> PairCounts<'_> {
    let counts = count_tuples(text);
    if counts.is_empty() {
        log::debug!("Found no tuple, is this a site_texts migration?");
    } else {
        log::debug!(
            "Found {} distinct tuples across the whole file",
            counts.distinct()
        );
    }
    counts
}

/// Count the tuples of a single INSERT block
pub fn scan_block(block: &str) -> PairCounts<'_> {
    count_tuples(block)
}

/// Matcher for the VALUES payload of INSERT statements targeting one table
#[derive(Clone, Debug)]
pub struct BlockPattern(Regex);
//
impl BlockPattern {
    /// Build the block matcher for a given table name
    ///
    /// The table name is matched literally, so a schema-qualified name like
    /// `public.site_texts` only matches INSERTs that spell it out the same way.
    pub fn new(table: &str) -> Result<Self> {
        let header = format!(
            "INSERT INTO {table} (key, language_code, value, type, namespace, context) VALUES"
        );
        let pattern = format!(r"(?s){}\s*(.*?)ON CONFLICT", regex::escape(&header));
        let regex = Regex::new(&pattern)
            .with_context(|| format!("building INSERT block pattern for table {table}"))?;
        Ok(Self(regex))
    }

    /// Extract the VALUES payload of every INSERT, in file order
    ///
    /// An INSERT header that is never followed by `ON CONFLICT` yields no
    /// block.
    pub fn split<'text>(&self, text: &'text str) -> Vec<&'text str> {
        let blocks = (self.0.captures_iter(text))
            .map(|captures| {
                let (_, [values]) = captures.extract();
                values
            })
            .collect::<Vec<_>>();
        log::debug!("Found {} INSERT blocks", blocks.len());
        blocks
    }
}
//
impl Default for BlockPattern {
    /// Block matcher for the `site_texts` table
    fn default() -> Self {
        Self::new(DEFAULT_TABLE).expect("default block pattern should be valid")
    }
}

/// Extract and count all tuples from some text
fn count_tuples(text: &str) -> PairCounts<'_> {
    let mut counts = PairCounts::new();
    for captures in tuple_pattern().captures_iter(text) {
        let (_, [key, language_code]) = captures.extract();
        let tuple = TupleKey { key, language_code };
        log::trace!("Found tuple {tuple:?}");
        counts.add(tuple);
    }
    counts
}

/// Pattern for the leading `('key', 'xx'` of an inserted row
fn tuple_pattern() -> &'static Regex {
    static LAZY: OnceLock<Regex> = OnceLock::new();
    LAZY.get_or_init(|| {
        Regex::new(r"\('([^']+)',\s*'([a-z]{2})'").expect("tuple pattern should be valid")
    })
}
