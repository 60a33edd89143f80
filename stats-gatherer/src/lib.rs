//! # OSS Stats Gatherer
//!
//! Collects daily popularity metrics for open source projects and keeps them
//! as append-only CSV time series.
//!
//! ## Features
//!
//! - **Homebrew analytics**: rank, install count and share of a formula in the
//!   30-day install-on-request feed
//! - **GitHub stars**: stargazer counts for any `owner/name` repository
//! - **Repository discovery**: the owner's most starred active repositories
//! - **Diff files**: day-over-day changes, with rank inverted so positive is better
//! - **Reports**: commit message, README growth table and competitor crossover
//!   forecast from the collected history
//!
//! ## Architecture
//!
//! - **`sources`**: the [`StatsApi`] seam, its HTTP implementation and [`MetricFetcher`]
//! - **`series`**: CSV schema, parsing, write policies and diffs
//! - **`collectors`**: fetch, stage, then write units coordinated by the [`Orchestrator`]
//! - **`discovery`**: top repository selection and the list file
//! - **`reports`**: text derived from collected history

#[macro_use]
extern crate tracing;

pub mod collectors;
pub mod discovery;
pub mod metrics;
pub mod reports;
pub mod series;
pub mod sources;

pub use collectors::*;
pub use metrics::*;
pub use sources::{
    HttpStatsApi,
    MetricFetcher,
    StatsApi,
};
