//! Ranking of an owner's repositories by star count, persisted as a plain list
//! file that drives the per-repository series.

use crate::{
    series::{
        write_atomic,
        SeriesError,
    },
    sources::{
        Repository,
        StatsApi,
    },
};
use chrono::{
    DateTime,
    Duration,
    Utc,
};
use eyre::Result;
use oss_stats_config::TopReposConfig;
use std::{
    fs,
    io,
    path::Path,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryCriteria {
    pub limit: usize,
    pub max_inactive_days: i64,
    pub denylist: Vec<String>,
}

impl From<&TopReposConfig> for DiscoveryCriteria {
    fn from(config: &TopReposConfig) -> Self {
        Self {
            limit: config.limit,
            max_inactive_days: config.max_inactive_days,
            denylist: config.denylist.clone(),
        }
    }
}

impl DiscoveryCriteria {
    /// Why `repo` is not eligible, if it is not.
    pub fn exclusion(&self, repo: &Repository, now: DateTime<Utc>) -> Option<&'static str> {
        if repo.archived {
            return Some("archived");
        }
        if repo.fork {
            return Some("fork");
        }
        let name = repo.name.to_lowercase();
        if self.denylist.iter().any(|word| name.contains(&word.to_lowercase())) {
            return Some("denylisted name");
        }
        let cutoff = now - Duration::days(self.max_inactive_days);
        match repo.pushed_at {
            Some(pushed_at) if pushed_at >= cutoff => None,
            _ => Some("inactive"),
        }
    }
}

/// Eligible repositories ordered by descending star count (then name), at
/// most `criteria.limit` of them.
pub fn select_top_repositories(
    repositories: Vec<Repository>,
    now: DateTime<Utc>,
    criteria: &DiscoveryCriteria,
) -> Vec<Repository> {
    let mut eligible: Vec<Repository> = repositories
        .into_iter()
        .filter(|repo| match criteria.exclusion(repo, now) {
            Some(reason) => {
                debug!(repo = %repo.name, reason, "Skipping repository");
                false
            }
            None => true,
        })
        .collect();
    eligible.sort_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count).then_with(|| a.name.cmp(&b.name)));
    eligible.truncate(criteria.limit);
    eligible
}

pub fn render_list(owner: &str, repositories: &[Repository], criteria: &DiscoveryCriteria, now: DateTime<Utc>) -> String {
    let mut out = format!(
        "# Top {} repositories owned by {owner} by star count\n\
         # Generated {}\n\
         # Excludes archived repositories, forks, names containing {} and repositories without a push in {} days\n",
        criteria.limit,
        now.format("%Y-%m-%dT%H:%M:%SZ"),
        criteria.denylist.join("/"),
        criteria.max_inactive_days,
    );
    for repo in repositories {
        out.push_str(&repo.name);
        out.push('\n');
    }
    out
}

/// Repository names from a list file, skipping blank and `#` comment lines.
pub fn read_list(path: &Path) -> Result<Vec<String>, SeriesError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(SeriesError::io(path)(e)),
    };
    Ok(parse_list(&text))
}

pub fn parse_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Fetches and ranks the owner's repositories without touching the list file.
pub async fn discover(
    api: &dyn StatsApi,
    config: &TopReposConfig,
    now: DateTime<Utc>,
) -> Result<Vec<Repository>> {
    let repositories = api.owner_repositories(&config.owner).await?;
    let total = repositories.len();
    let selected = select_top_repositories(repositories, now, &DiscoveryCriteria::from(config));
    info!(
        owner = %config.owner,
        total,
        selected = selected.len(),
        "Discovered top repositories"
    );
    Ok(selected)
}

/// Replaces the list file with `repositories`. Previous content is discarded.
pub fn write_list(
    path: &Path,
    config: &TopReposConfig,
    repositories: &[Repository],
    now: DateTime<Utc>,
) -> Result<(), SeriesError> {
    let contents = render_list(&config.owner, repositories, &DiscoveryCriteria::from(config), now);
    write_atomic(path, &contents)
}
