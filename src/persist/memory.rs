//! In-memory sink for tests and dry runs. Everything accepted is kept in
//! plain vectors; `flush` only counts commit boundaries.

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::FactSink;
use crate::edgar::xbrl::Fact;

/// One accepted attribute value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredValue {
    pub cik: u64,
    pub fact: Fact,
    pub filing_date: NaiveDate,
}

#[derive(Debug, Default)]
pub struct MemorySink {
    values: Vec<StoredValue>,
    tickers: HashMap<u64, String>,
    flushes: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &[StoredValue] {
        &self.values
    }

    pub fn ticker(&self, cik: u64) -> Option<&str> {
        self.tickers.get(&cik).map(String::as_str)
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Accepted values per concept name, ordered for stable reporting.
    pub fn concept_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for value in &self.values {
            *counts.entry(value.fact.name.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

impl FactSink for MemorySink {
    fn upsert(&mut self, cik: u64, fact: &Fact, filing_date: NaiveDate) -> Result<()> {
        log::debug!("upsert {}:{} = {}", fact.namespace, fact.name, fact.value);
        self.values.push(StoredValue {
            cik,
            fact: fact.clone(),
            filing_date,
        });
        Ok(())
    }

    fn set_ticker(&mut self, cik: u64, ticker: &str) -> Result<()> {
        self.tickers.insert(cik, ticker.to_string());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fact(name: &str) -> Fact {
        Fact {
            namespace: "http://fasb.org/us-gaap/2015-01-31".to_string(),
            name: name.to_string(),
            value: "1".to_string(),
            unit: "USD".to_string(),
            start_date: NaiveDate::from_ymd_opt(2015, 12, 31).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2015, 12, 31).unwrap(),
            decimals: 0,
        }
    }

    #[test]
    fn counts_values_per_concept() {
        let mut sink = MemorySink::new();
        let date = NaiveDate::from_ymd_opt(2016, 2, 26).unwrap();
        sink.upsert(1, &fact("Assets"), date).unwrap();
        sink.upsert(1, &fact("Assets"), date).unwrap();
        sink.upsert(1, &fact("Revenues"), date).unwrap();

        let counts = sink.concept_counts();
        assert_eq!(counts.get("Assets"), Some(&2));
        assert_eq!(counts.get("Revenues"), Some(&1));
    }
}
