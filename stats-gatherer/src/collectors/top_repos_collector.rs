use crate::{
    collectors::{
        collector::records_table,
        Collector,
    },
    discovery::{
        self,
        DiscoveryCriteria,
    },
    metrics::Record,
    series::{
        Schema,
        SeriesFiles,
        WriteSet,
    },
    sources::{
        MetricFetcher,
        Repository,
    },
};
use chrono::{
    DateTime,
    NaiveDate,
    Utc,
};
use eyre::{
    bail,
    Context as _,
    Result,
};
use oss_stats_config::{
    Polarity,
    TopReposConfig,
    WritePolicy,
};
use std::{
    future::Future,
    path::{
        Path,
        PathBuf,
    },
    pin::Pin,
    sync::Arc,
};

pub const ENTITY_COLUMN: &str = "repo_name";
pub const GITHUB_STARS: &str = "github_stars";
pub const BREW_RANK: &str = "brew_rank";
pub const BREW_INSTALLS: &str = "brew_installs";
pub const BREW_PCT: &str = "brew_pct";

/// `date,repo_name,github_stars,brew_rank,brew_installs,brew_pct`
pub fn top_repos_schema() -> Schema {
    Schema::with_entity(ENTITY_COLUMN, [GITHUB_STARS, BREW_RANK, BREW_INSTALLS, BREW_PCT])
}

pub fn top_repos_diff_columns() -> Vec<(String, Polarity)> {
    vec![
        (GITHUB_STARS.to_string(), Polarity::HigherIsBetter),
        (BREW_RANK.to_string(), Polarity::LowerIsBetter),
        (BREW_INSTALLS.to_string(), Polarity::HigherIsBetter),
        (BREW_PCT.to_string(), Polarity::HigherIsBetter),
    ]
}

/// The top repositories series file and its diff under `data_dir`.
pub fn top_repos_files(config: &TopReposConfig, data_dir: &Path) -> SeriesFiles {
    SeriesFiles::new(
        top_repos_schema(),
        data_dir.join(&config.path),
        config.diff_path.as_ref().map(|diff| data_dir.join(diff)),
        top_repos_diff_columns(),
    )
}

/// Collects one row per tracked repository, joining its star count with the
/// Homebrew analytics of a formula of the same name when one exists.
pub struct TopReposCollector {
    config: TopReposConfig,
    files: SeriesFiles,
    list_path: PathBuf,
    fetcher: Arc<MetricFetcher>,
    run_discovery: bool,
    discovered: Option<(Vec<Repository>, DateTime<Utc>)>,
    missing_formulae: Vec<String>,
    records: Vec<Record>,
}

impl TopReposCollector {
    pub fn new(config: TopReposConfig, data_dir: &Path, fetcher: Arc<MetricFetcher>, run_discovery: bool) -> Self {
        let files = top_repos_files(&config, data_dir);
        let list_path = data_dir.join(&config.list_path);
        Self {
            config,
            files,
            list_path,
            fetcher,
            run_discovery,
            discovered: None,
            missing_formulae: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        self.files.path()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    async fn tracked_repositories(&mut self) -> Result<Vec<String>> {
        if self.run_discovery {
            let now = Utc::now();
            let discovered = discovery::discover(self.fetcher.api(), &self.config, now).await?;
            let names = discovered.iter().map(|repo| repo.name.clone()).collect();
            self.discovered = Some((discovered, now));
            return Ok(names);
        }
        let names = discovery::read_list(&self.list_path)?;
        if names.is_empty() {
            bail!(
                "{} lists no repositories; run discovery first",
                self.list_path.display()
            );
        }
        Ok(names)
    }

    /// Fetches stars and Homebrew analytics for one repository. The second
    /// value is false when no formula of the same name exists.
    async fn fetch_record(&self, date: NaiveDate, name: &str) -> Result<(Record, bool)> {
        let full_name = format!("{}/{}", self.config.owner, name);
        let stars = self
            .fetcher
            .github_stars(&full_name)
            .await
            .wrap_err_with(|| format!("Failed to fetch stars for {full_name}"))?;
        let brew = self.fetcher.brew_stats(name).await?;

        let record = Record::for_entity(date, name)
            .with(GITHUB_STARS, Some(stars))
            .with(BREW_RANK, brew.map(|stats| stats.rank))
            .with(BREW_INSTALLS, brew.map(|stats| stats.installs))
            .with(BREW_PCT, brew.map(|stats| stats.percent));
        Ok((record, brew.is_some()))
    }
}

impl Collector for TopReposCollector {
    fn collect(&mut self, date: NaiveDate) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let names = self.tracked_repositories().await?;
            let mut records = Vec::with_capacity(names.len());
            let mut missing_formulae = Vec::new();
            for name in &names {
                let (record, has_formula) = self.fetch_record(date, name).await?;
                if !has_formula {
                    missing_formulae.push(name.clone());
                }
                records.push(record);
            }
            if !missing_formulae.is_empty() {
                warn!(
                    owner = %self.config.owner,
                    missing = ?missing_formulae,
                    "No Homebrew formula for some repositories, recording empty brew columns"
                );
            }
            self.records = records;
            self.missing_formulae = missing_formulae;
            Ok(())
        })
    }

    fn stage(&self, policy: WritePolicy) -> Result<WriteSet> {
        let mut writes = WriteSet::new();
        let rows = self.files.stage(&self.records, policy, &mut writes)?;
        info!(collected = self.records.len(), rows, %policy, "Staged top repository rows");

        // staged after the series so a malformed series file keeps the previous list
        if let Some((discovered, now)) = &self.discovered {
            let contents = discovery::render_list(
                &self.config.owner,
                discovered,
                &DiscoveryCriteria::from(&self.config),
                *now,
            );
            writes.push(&self.list_path, contents);
            info!(path = %self.list_path.display(), count = discovered.len(), "Staged repository list");
        }
        Ok(writes)
    }

    fn rows(&self) -> usize {
        self.records.len()
    }

    fn format(&self) -> String {
        records_table(
            &format!("top repositories of {}", self.config.owner),
            &top_repos_schema(),
            &self.records,
        )
    }

    fn summary(&self) -> serde_json::Value {
        let discovered: Option<Vec<&str>> = self
            .discovered
            .as_ref()
            .map(|(repos, _)| repos.iter().map(|repo| repo.name.as_str()).collect());
        serde_json::json!({
            "owner": self.config.owner,
            "path": self.files.path(),
            "discovered": discovered,
            "missing_formulae": self.missing_formulae,
            "rows": self.records,
        })
    }

    fn name(&self) -> &str {
        "top-repos"
    }
}
