//! # Collectors Module
//!
//! Each collector owns one group of CSV files. Collection is split into two
//! phases so a run either writes everything or nothing:
//!
//! - **`collect`** fetches values from the remote APIs into memory
//! - **`stage`** merges them into the series file and its diff in memory
//! - **`persist`** stages, then writes every staged file
//!
//! - **`SeriesCollector`**: one row per date for a configured series
//! - **`TopReposCollector`**: one row per date and repository, driven by discovery
//! - **`Orchestrator`**: runs a set of collectors as one unit

pub mod collector;
pub mod orchestrator;
pub mod series_collector;
pub mod top_repos_collector;

pub use collector::Collector;
pub use orchestrator::Orchestrator;
pub use series_collector::SeriesCollector;
pub use top_repos_collector::{
    top_repos_diff_columns,
    top_repos_files,
    top_repos_schema,
    TopReposCollector,
};
