use super::{
    BrewEntry,
    Repository,
};
use eyre::Result;
use std::{
    future::Future,
    pin::Pin,
};

pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Remote data the collectors read. Calls are issued one at a time and a
/// failure aborts the run.
pub trait StatsApi: Send + Sync {
    /// Full Homebrew install-on-request feed.
    fn brew_analytics(&self) -> ApiFuture<'_, Vec<BrewEntry>>;

    /// Repository metadata for an `owner/name` identifier.
    fn repository<'a>(&'a self, full_name: &'a str) -> ApiFuture<'a, Repository>;

    /// Every repository owned by `owner`, across all pages.
    fn owner_repositories<'a>(&'a self, owner: &'a str) -> ApiFuture<'a, Vec<Repository>>;
}
