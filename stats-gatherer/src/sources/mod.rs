mod api;
mod brew;
mod fetcher;
mod github;
mod http;
#[cfg(test)]
pub(crate) mod testing;

pub use api::{
    ApiFuture,
    StatsApi,
};
pub use brew::{
    BrewAnalytics,
    BrewEntry,
    BrewFeed,
    BrewStats,
};
pub use fetcher::MetricFetcher;
pub use github::Repository;
pub use http::HttpStatsApi;
