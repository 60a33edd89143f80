use crate::metrics::MetricValue;
use serde::Deserialize;
use std::collections::HashMap;

/// One formula entry of the Homebrew install-on-request analytics feed.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BrewEntry {
    pub formula: String,
    /// Popularity rank, lower is better.
    pub number: i64,
    /// Install count, comma formatted (`"45,678"`).
    pub count: String,
    /// Percentage share (`"1.23"`).
    pub percent: String,
}

/// The feed is served wrapped in an object with an `items` array; a bare array
/// is accepted as well.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BrewFeed {
    Wrapped { items: Vec<BrewEntry> },
    Bare(Vec<BrewEntry>),
}

impl BrewFeed {
    pub fn into_entries(self) -> Vec<BrewEntry> {
        match self {
            BrewFeed::Wrapped { items } => items,
            BrewFeed::Bare(items) => items,
        }
    }
}

/// Parsed metrics of one formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrewStats {
    pub rank: MetricValue,
    pub installs: MetricValue,
    pub percent: MetricValue,
}

/// Formula lookup over one snapshot of the analytics feed.
#[derive(Debug, Clone, Default)]
pub struct BrewAnalytics {
    by_formula: HashMap<String, BrewEntry>,
}

impl BrewAnalytics {
    pub fn new(entries: Vec<BrewEntry>) -> Self {
        let mut by_formula = HashMap::with_capacity(entries.len());
        for entry in entries {
            // The feed is ordered by rank; keep the best-ranked entry on collision.
            by_formula.entry(entry.formula.clone()).or_insert(entry);
        }
        Self { by_formula }
    }

    pub fn len(&self) -> usize {
        self.by_formula.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_formula.is_empty()
    }

    /// `Ok(None)` when the formula is not part of the feed.
    pub fn stats(&self, formula: &str) -> eyre::Result<Option<BrewStats>> {
        let Some(entry) = self.by_formula.get(formula) else {
            return Ok(None);
        };
        Ok(Some(BrewStats {
            rank: MetricValue::Count(entry.number),
            installs: entry
                .count
                .parse()
                .map_err(|e| eyre::eyre!("Bad install count for formula '{formula}': {e}"))?,
            percent: entry
                .percent
                .parse()
                .map_err(|e| eyre::eyre!("Bad percentage for formula '{formula}': {e}"))?,
        }))
    }
}
