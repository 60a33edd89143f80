#[macro_use]
extern crate tracing;

mod app_config;
mod args;
mod series_config;

pub use app_config::get_config_dir;
pub use args::{
    version,
    Args,
    Command,
};
use color_eyre::Result;
use eyre::{
    bail,
    Context as _,
};
use serde::{
    Deserialize,
    Serialize,
};
pub use series_config::{
    ColumnConfig,
    CrossoverConfig,
    MetricSource,
    Polarity,
    SeriesConfig,
    TopReposConfig,
};
use std::{
    collections::HashSet,
    path::{
        Path,
        PathBuf,
    },
};
use strum::{
    Display,
    EnumString,
};
use url::Url;

/// How a freshly collected row is merged into a series file.
#[derive(
    Debug, Default, Clone, Copy, Display, EnumString, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum WritePolicy {
    /// Insert or replace the row for its key and keep the file sorted by key.
    #[default]
    Replace,
    /// Append the row, then drop later duplicates so the first physical row per key survives.
    FirstSeen,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Endpoints {
    pub github_api: Url,
    pub brew_analytics: Url,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub data_dir: PathBuf,
    #[serde(default, skip_serializing)]
    pub github_token: Option<String>,
    #[serde(default)]
    pub write_policy: WritePolicy,
    pub endpoints: Endpoints,
    #[serde(default)]
    pub series: Vec<SeriesConfig>,
    pub top_repos: TopReposConfig,
    pub crossovers: CrossoverConfig,
}

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl Config {
    /// Layers the embedded defaults, the user config file, an explicit `--config` file and the command line.
    pub fn new(args: &Args) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml));

        let user_config = get_config_dir().join("config.yaml");
        builder = builder.add_source(
            config::File::from(user_config)
                .format(config::FileFormat::Yaml)
                .required(false),
        );

        if let Some(path) = &args.config {
            debug!(path = %path.display(), "Layering explicit config file");
            builder = builder.add_source(
                config::File::from(path.as_path())
                    .format(config::FileFormat::Yaml)
                    .required(true),
            );
        }

        builder = builder.add_source(args.clone());

        let cfg: Self = builder
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects configurations that would produce ambiguous CSV headers.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for series in &self.series {
            if !names.insert(series.name.as_str()) {
                bail!("Series '{}' is configured more than once", series.name);
            }
            if series.columns.is_empty() {
                bail!("Series '{}' has no columns", series.name);
            }
            let mut columns = HashSet::new();
            for column in &series.columns {
                if column.name == "date" {
                    bail!("Series '{}' uses the reserved column name 'date'", series.name);
                }
                if !columns.insert(column.name.as_str()) {
                    bail!("Series '{}' declares column '{}' twice", series.name, column.name);
                }
            }
            for name in series.diff_columns.iter().flatten() {
                if !columns.contains(name.as_str()) {
                    bail!("Series '{}' diffs unknown column '{}'", series.name, name);
                }
            }
        }
        if self.top_repos.limit == 0 {
            bail!("top_repos.limit must be at least 1");
        }

        let crossovers = &self.crossovers;
        match self.series(&crossovers.series) {
            None => bail!("crossovers.series names unknown series '{}'", crossovers.series),
            Some(series) if series.column(&crossovers.leader).is_none() => bail!(
                "crossovers.leader '{}' is not a column of series '{}'",
                crossovers.leader,
                series.name
            ),
            Some(_) => {}
        }
        if crossovers.windows.is_empty() || crossovers.windows.iter().any(|days| *days < 1) {
            bail!("crossovers.windows must list at least one positive number of days");
        }
        if crossovers.limit == 0 {
            bail!("crossovers.limit must be at least 1");
        }
        Ok(())
    }

    pub fn series(&self, name: &str) -> Option<&SeriesConfig> {
        self.series.iter().find(|series| series.name == name)
    }

    /// Looks up the named series, or all of them when `names` is empty.
    pub fn select_series(&self, names: &[String]) -> Result<Vec<SeriesConfig>> {
        if names.is_empty() {
            return Ok(self.series.clone());
        }
        names
            .iter()
            .map(|name| match self.series(name) {
                Some(series) => Ok(series.clone()),
                None => bail!(
                    "Unknown series '{}', expected one of: {}",
                    name,
                    self.series
                        .iter()
                        .map(|series| series.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
            .collect()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Resolves a series-relative path against the data directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }
}
