mod record;
mod value;

use chrono::{
    DateTime,
    NaiveDate,
    Utc,
};
pub use record::*;
use serde::{
    Deserialize,
    Serialize,
};
pub use value::*;

/// Bookkeeping for one collector run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedData {
    pub date: NaiveDate,
    pub collection_start: DateTime<Utc>,
    pub collection_end: DateTime<Utc>,
    pub rows_written: usize,
}

impl CollectedData {
    pub fn new(date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            date,
            collection_start: now,
            collection_end: now,
            rows_written: 0,
        }
    }

    pub fn finalize(&mut self) {
        self.collection_end = Utc::now();
    }

    pub fn elapsed_seconds(&self) -> f64 {
        (self.collection_end - self.collection_start).num_milliseconds() as f64 / 1000.0
    }
}
