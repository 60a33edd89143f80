//! Text derived from collected history: the daily commit message, the README
//! growth section and the README crossover forecast.

mod commit_message;
mod crossovers;
mod fastest_growing;
mod readme;

pub use commit_message::*;
pub use crossovers::*;
pub use fastest_growing::*;
pub use readme::splice_readme;

use crate::{
    collectors::{
        top_repos_collector::GITHUB_STARS,
        top_repos_schema,
    },
    metrics::with_thousands,
    series::SeriesTable,
};
use chrono::NaiveDate;
use eyre::Result;
use std::path::Path;

/// One repository's star count on one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarSample {
    pub date: NaiveDate,
    pub repo: String,
    pub stars: i64,
}

/// Star samples from a top repositories file. Rows without a star count are skipped.
pub fn load_star_samples(path: &Path) -> Result<Vec<StarSample>> {
    let table = SeriesTable::load(path, top_repos_schema())?;
    Ok(star_samples(&table))
}

pub fn star_samples(table: &SeriesTable) -> Vec<StarSample> {
    table
        .records()
        .iter()
        .filter_map(|record| {
            Some(StarSample {
                date: record.date,
                repo: record.entity.clone()?,
                stars: record.get(GITHUB_STARS)?.as_count()?,
            })
        })
        .collect()
}

/// `+5`, `0`, `-3`
fn signed(delta: i64) -> String {
    if delta > 0 {
        format!("+{delta}")
    } else {
        delta.to_string()
    }
}

/// `+1,234`, `+0`, `-3`
fn signed_thousands(delta: i64) -> String {
    if delta >= 0 {
        format!("+{}", with_thousands(delta))
    } else {
        with_thousands(delta)
    }
}
