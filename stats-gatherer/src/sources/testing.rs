//! In-memory [`StatsApi`] for unit tests.

use super::{
    ApiFuture,
    BrewEntry,
    Repository,
    StatsApi,
};
use chrono::{
    DateTime,
    Utc,
};
use eyre::eyre;
use std::sync::{
    atomic::{
        AtomicUsize,
        Ordering,
    },
    Mutex,
};

#[derive(Default)]
pub struct FakeApi {
    brew: Vec<BrewEntry>,
    repositories: Vec<(String, Repository)>,
    brew_requests: AtomicUsize,
    repository_requests: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn with_brew(mut self, formula: &str, number: i64, count: &str, percent: &str) -> Self {
        self.brew.push(BrewEntry {
            formula: formula.to_string(),
            number,
            count: count.to_string(),
            percent: percent.to_string(),
        });
        self
    }

    pub fn with_repo(self, full_name: &str, stars: i64) -> Self {
        self.with_repository(full_name, stars, false, false, Some(Utc::now()))
    }

    pub fn with_repository(
        mut self,
        full_name: &str,
        stars: i64,
        archived: bool,
        fork: bool,
        pushed_at: Option<DateTime<Utc>>,
    ) -> Self {
        let (owner, name) = full_name.split_once('/').expect("owner/name");
        self.repositories.push((
            owner.to_string(),
            Repository {
                name: name.to_string(),
                full_name: full_name.to_string(),
                stargazers_count: stars,
                archived,
                fork,
                pushed_at,
            },
        ));
        self
    }

    pub fn brew_requests(&self) -> usize {
        self.brew_requests.load(Ordering::SeqCst)
    }

    pub fn repository_requests(&self) -> Vec<String> {
        self.repository_requests.lock().unwrap().clone()
    }
}

impl StatsApi for FakeApi {
    fn brew_analytics(&self) -> ApiFuture<'_, Vec<BrewEntry>> {
        self.brew_requests.fetch_add(1, Ordering::SeqCst);
        let entries = self.brew.clone();
        Box::pin(async move { Ok(entries) })
    }

    fn repository<'a>(&'a self, full_name: &'a str) -> ApiFuture<'a, Repository> {
        self.repository_requests.lock().unwrap().push(full_name.to_string());
        let found = self
            .repositories
            .iter()
            .find(|(_, repo)| repo.full_name == full_name)
            .map(|(_, repo)| repo.clone());
        Box::pin(async move { found.ok_or_else(|| eyre!("404 Not Found: {full_name}")) })
    }

    fn owner_repositories<'a>(&'a self, owner: &'a str) -> ApiFuture<'a, Vec<Repository>> {
        let repositories = self
            .repositories
            .iter()
            .filter(|(repo_owner, _)| repo_owner == owner)
            .map(|(_, repo)| repo.clone())
            .collect();
        Box::pin(async move { Ok(repositories) })
    }
}
