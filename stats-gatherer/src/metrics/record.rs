use super::MetricValue;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Identity of a row within a series: its date, plus the tracked entity for
/// multi-entity series such as the per-repository table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RecordKey {
    pub date: NaiveDate,
    pub entity: Option<String>,
}

/// One row of a series. Missing values stay `None` and are written as empty
/// cells, never as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    pub values: BTreeMap<String, Option<MetricValue>>,
}

impl Record {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            entity: None,
            values: BTreeMap::new(),
        }
    }

    pub fn for_entity(date: NaiveDate, entity: impl Into<String>) -> Self {
        Self {
            entity: Some(entity.into()),
            ..Self::new(date)
        }
    }

    pub fn with(mut self, column: impl Into<String>, value: Option<MetricValue>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: Option<MetricValue>) {
        self.values.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<MetricValue> {
        self.values.get(column).copied().flatten()
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            date: self.date,
            entity: self.entity.clone(),
        }
    }
}
