//! Boundary contract with the persistence collaborator.
//!
//! The extraction core emits plain values; registering namespaces, units
//! and attributes and upserting attribute values is the sink's job. The
//! natural key of a persisted value is (company, attribute, start_date,
//! end_date), and within one filing pass a rolling prior-keys set
//! suppresses re-yields of a key already seen: batch-scoped dedup that is
//! cleared at every flush boundary, not a global guarantee.

pub mod memory;

pub use memory::MemorySink;

use anyhow::Result;
use chrono::NaiveDate;
use std::collections::HashSet;

use crate::edgar::xbrl::{Fact, XbrlInstance};

/// Records are handed to the sink in batches of this size before a flush,
/// matching the original importer's commit frequency.
pub const FLUSH_EVERY: usize = 300;

/// Natural key of an attribute value within one company's filings.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FactKey {
    pub namespace: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl FactKey {
    pub fn of(fact: &Fact) -> Self {
        FactKey {
            namespace: fact.namespace.clone(),
            name: fact.name.clone(),
            start_date: fact.start_date,
            end_date: fact.end_date,
        }
    }
}

/// Rolling set of keys already upserted in the current batch.
#[derive(Debug, Default)]
pub struct PriorKeys(HashSet<FactKey>);

impl PriorKeys {
    /// Returns false when the key was already seen in this batch.
    pub fn insert(&mut self, key: FactKey) -> bool {
        self.0.insert(key)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What a persistence backend must provide. Upserts are expected to be
/// idempotent on [`FactKey`] plus the company, so re-running a filing is
/// safe.
pub trait FactSink {
    /// Upsert one attribute value for a company, registering the
    /// namespace, attribute and unit as needed and marking the
    /// attribute's cached total-count stale.
    fn upsert(&mut self, cik: u64, fact: &Fact, filing_date: NaiveDate) -> Result<()>;

    /// Record the company ticker discovered in the document fields.
    fn set_ticker(&mut self, cik: u64, ticker: &str) -> Result<()>;

    /// Commit everything accepted since the last flush.
    fn flush(&mut self) -> Result<()>;
}

/// Counts from one filing pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Facts handed to the sink.
    pub upserted: usize,
    /// Facts suppressed by the prior-keys set.
    pub suppressed: usize,
}

/// Drives one filing's fact stream into a sink: dedup, batched flushes,
/// and the ticker update from the document fields.
pub fn load_attributes<S: FactSink>(
    instance: &XbrlInstance<'_>,
    namespace: &str,
    cik: u64,
    filing_date: NaiveDate,
    sink: &mut S,
) -> Result<LoadStats> {
    let mut prior = PriorKeys::default();
    let mut stats = LoadStats::default();
    let mut pending = 0usize;

    for fact in instance.facts(namespace) {
        if !prior.insert(FactKey::of(&fact)) {
            stats.suppressed += 1;
            continue;
        }
        sink.upsert(cik, &fact, filing_date)?;
        stats.upserted += 1;
        pending += 1;
        if pending >= FLUSH_EVERY {
            sink.flush()?;
            prior.clear();
            pending = 0;
        }
    }
    sink.flush()?;

    if let Some(ticker) = instance.trading_symbol().map(str::trim) {
        if !ticker.is_empty() {
            sink.set_ticker(cik, ticker)?;
        }
    }

    log::info!(
        "loaded {} attribute values for CIK {} ({} duplicate-period facts suppressed)",
        stats.upserted,
        cik,
        stats.suppressed
    );
    Ok(stats)
}
