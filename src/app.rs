use crate::{
    Args,
    Command,
    Config,
};
use chrono::{
    NaiveDate,
    Utc,
};
use color_eyre::Result;
use eyre::{
    bail,
    Context as _,
};
use oss_stats_config::SeriesConfig;
use oss_stats_gatherer::{
    discovery,
    reports,
    series::{
        write_atomic,
        SeriesFiles,
        SeriesTable,
    },
    top_repos_files,
    Collector,
    HttpStatsApi,
    MetricFetcher,
    Orchestrator,
    SeriesCollector,
    TopReposCollector,
};
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
    sync::Arc,
};

pub struct App {
    config: Config,
    command: Option<Command>,
    date: NaiveDate,
    output_file: Option<PathBuf>,
}

impl App {
    pub fn new(args: Args) -> Result<Self> {
        let config = Config::new(&args)?;
        Ok(Self {
            config,
            command: args.command,
            date: args.date.unwrap_or_else(|| Utc::now().date_naive()),
            output_file: args.output_file,
        })
    }

    pub async fn run(self) -> Result<()> {
        let output = self.execute().await?;
        if !output.is_empty() {
            println!("{output}");
        }
        Ok(())
    }

    /// Runs the command and returns what it prints.
    pub async fn execute(&self) -> Result<String> {
        match &self.command {
            None => {
                let series = self.config.select_series(&[])?;
                self.collect(series, Some(true)).await
            }
            Some(Command::Collect { series }) => {
                let series = self.config.select_series(series)?;
                self.collect(series, None).await
            }
            Some(Command::TopRepos { skip_discovery }) => self.collect(Vec::new(), Some(!skip_discovery)).await,
            Some(Command::Discover) => self.discover().await,
            Some(Command::Diff { series }) => self.maintain(series, Maintenance::Diff),
            Some(Command::Dedupe { series }) => self.maintain(series, Maintenance::Dedupe),
            Some(Command::CommitMessage) => {
                let samples = reports::load_star_samples(&self.config.resolve(&self.config.top_repos.path))?;
                Ok(reports::commit_message(&samples))
            }
            Some(Command::FastestGrowing { readme }) => self.fastest_growing(readme.as_deref()),
        }
    }

    fn fetcher(&self) -> Result<Arc<MetricFetcher>> {
        let api = HttpStatsApi::new(self.config.endpoints.clone(), self.config.github_token.clone())?;
        Ok(Arc::new(MetricFetcher::new(Arc::new(api))))
    }

    fn top_repos_collector(&self, fetcher: Arc<MetricFetcher>, run_discovery: bool) -> TopReposCollector {
        TopReposCollector::new(
            self.config.top_repos.clone(),
            self.config.data_dir(),
            fetcher,
            run_discovery,
        )
    }

    /// `top_repos` is `Some(run_discovery)` when the top repositories series is included.
    async fn collect(&self, series: Vec<SeriesConfig>, top_repos: Option<bool>) -> Result<String> {
        let fetcher = self.fetcher()?;
        let mut collectors: Vec<Box<dyn Collector>> = series
            .into_iter()
            .map(|series| {
                Box::new(SeriesCollector::new(series, self.config.data_dir(), fetcher.clone())) as Box<dyn Collector>
            })
            .collect();
        if let Some(run_discovery) = top_repos {
            collectors.push(Box::new(self.top_repos_collector(fetcher.clone(), run_discovery)));
        }

        info!(date = %self.date, collectors = collectors.len(), policy = %self.config.write_policy, "Starting collection");
        let mut orchestrator = Orchestrator::new(collectors);
        orchestrator.collect(self.date).await?;
        orchestrator.persist(self.config.write_policy)?;

        if let Some(output_file) = &self.output_file {
            let json_string = serde_json::to_string_pretty(&orchestrator.summary())?;
            fs::write(output_file, json_string)
                .wrap_err_with(|| format!("Failed to write {}", output_file.display()))?;
            info!(path = %output_file.display(), "Exported collected rows");
        }

        info!("Data collection completed successfully");
        Ok(orchestrator.format())
    }

    async fn discover(&self) -> Result<String> {
        let fetcher = self.fetcher()?;
        let top_repos = &self.config.top_repos;
        let now = Utc::now();
        let repositories = discovery::discover(fetcher.api(), top_repos, now).await?;
        let list_path = self.config.resolve(&top_repos.list_path);
        discovery::write_list(&list_path, top_repos, &repositories, now)?;
        info!(path = %list_path.display(), count = repositories.len(), "Replaced repository list");

        Ok(repositories
            .iter()
            .map(|repo| format!("{} ({} stars)", repo.name, repo.stargazers_count))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Diff and dedupe work on files only, so no API client is built. With no
    /// names given they cover every series plus the top repositories file.
    fn maintain(&self, names: &[String], maintenance: Maintenance) -> Result<String> {
        let data_dir = self.config.data_dir();
        let mut targets: Vec<(String, SeriesFiles)> = self
            .config
            .select_series(names)?
            .into_iter()
            .map(|series| {
                let files = SeriesFiles::for_series(&series, data_dir);
                (series.name, files)
            })
            .collect();
        if names.is_empty() {
            targets.push(("top-repos".to_string(), top_repos_files(&self.config.top_repos, data_dir)));
        }

        let mut lines = Vec::with_capacity(targets.len());
        for (name, files) in &targets {
            lines.push(match maintenance {
                _ if !files.exists() => format!("{name}: no series file yet"),
                Maintenance::Diff => describe_diff(name, files.regenerate_diff()?),
                Maintenance::Dedupe => describe_dedupe(name, files.deduplicate()?),
            });
        }
        Ok(lines.join("\n"))
    }

    fn fastest_growing(&self, readme: Option<&Path>) -> Result<String> {
        let samples = reports::load_star_samples(&self.config.resolve(&self.config.top_repos.path))?;
        let window = reports::fastest_growing(&samples, reports::FASTEST_GROWING_REPOS)?;
        let fastest = window.render_section(&self.config.top_repos.owner);
        let forecast = self.crossover_forecast()?;
        let crossovers = forecast.render_section();

        let Some(readme) = readme else {
            return Ok(format!("{crossovers}\n\n{fastest}"));
        };
        let text = fs::read_to_string(readme).wrap_err_with(|| format!("Failed to read {}", readme.display()))?;
        write_atomic(readme, &reports::splice_readme(&text, &crossovers, &fastest))?;
        Ok(format!(
            "Updated {} with fastest growing repos: {}",
            readme.display(),
            window.headline()
        ))
    }

    /// Forecast over the configured competitors series, counted from the run date.
    fn crossover_forecast(&self) -> Result<reports::CrossoverForecast> {
        let crossovers = &self.config.crossovers;
        let Some(series) = self.config.series(&crossovers.series) else {
            bail!("Unknown crossover series '{}'", crossovers.series);
        };
        let files = SeriesFiles::for_series(series, self.config.data_dir());
        let table = SeriesTable::load(files.path(), files.schema().clone())?;
        Ok(reports::predict_crossovers(&table, crossovers, self.date))
    }
}

#[derive(Debug, Clone, Copy)]
enum Maintenance {
    Diff,
    Dedupe,
}

fn describe_dedupe(name: &str, removed: usize) -> String {
    format!("{name}: removed {removed} duplicate rows")
}

fn describe_diff(name: &str, rows: Option<usize>) -> String {
    match rows {
        Some(rows) => format!("{name}: wrote {rows} diff rows"),
        None => format!("{name}: no diff file configured"),
    }
}
