use serde::{
    Deserialize,
    Serialize,
};
use std::path::PathBuf;
use strum::{
    Display,
    EnumString,
};

/// Which direction of change counts as an improvement for a column.
#[derive(Debug, Default, Clone, Copy, Display, EnumString, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Polarity {
    #[default]
    HigherIsBetter,
    LowerIsBetter,
}

/// Where the value of a single series column comes from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricSource {
    /// Popularity rank of a formula in the Homebrew install-on-request feed.
    BrewRank { formula: String },
    /// Install count of a formula in the Homebrew install-on-request feed.
    BrewInstalls { formula: String },
    /// Percentage share of a formula in the Homebrew install-on-request feed.
    BrewPercent { formula: String },
    /// Stargazer count of an `owner/name` repository.
    GithubStars { repo: String },
}

impl MetricSource {
    pub fn polarity(&self) -> Polarity {
        match self {
            MetricSource::BrewRank { .. } => Polarity::LowerIsBetter,
            MetricSource::BrewInstalls { .. } | MetricSource::BrewPercent { .. } | MetricSource::GithubStars { .. } => {
                Polarity::HigherIsBetter
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnConfig {
    pub name: String,
    pub source: MetricSource,
}

impl ColumnConfig {
    pub fn polarity(&self) -> Polarity {
        self.source.polarity()
    }
}

/// A single-entity series: one row per date, one column per metric.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeriesConfig {
    pub name: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_path: Option<PathBuf>,
    /// Columns included in the diff file. All columns when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_columns: Option<Vec<String>>,
    pub columns: Vec<ColumnConfig>,
}

impl SeriesConfig {
    pub fn column(&self, name: &str) -> Option<&ColumnConfig> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }

    /// Diff columns with their polarity, in configured order.
    pub fn diff_columns(&self) -> Vec<(String, Polarity)> {
        match &self.diff_columns {
            Some(names) => names
                .iter()
                .filter_map(|name| self.column(name).map(|column| (name.clone(), column.polarity())))
                .collect(),
            None => self
                .columns
                .iter()
                .map(|column| (column.name.clone(), column.polarity()))
                .collect(),
        }
    }
}

/// Repository discovery plus the per-repository series it drives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopReposConfig {
    pub owner: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_path: Option<PathBuf>,
    pub list_path: PathBuf,
    pub limit: usize,
    pub max_inactive_days: i64,
    #[serde(default)]
    pub denylist: Vec<String>,
}

/// Forecast of when the leader column of a series overtakes the other columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrossoverConfig {
    pub series: String,
    pub leader: String,
    /// Trailing windows, in days, each fitted with its own linear trend.
    pub windows: Vec<i64>,
    /// Forecasts further out than this are dropped.
    pub horizon_days: i64,
    pub limit: usize,
}
