use crate::WritePolicy;
use chrono::NaiveDate;
use clap::{
    Parser,
    Subcommand,
};
use std::path::PathBuf;

/// Collects Homebrew install analytics and GitHub star counts into CSV time series.
#[derive(Parser, Debug, Clone)]
#[command(author, version = version(), about, long_about = None)]
pub struct Args {
    /// Additional YAML configuration file, layered over the built-in defaults.
    #[clap(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the CSV series and list files.
    #[clap(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Date the collected rows are recorded under. Defaults to today (UTC).
    #[clap(long, global = true, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,

    /// Token sent as a bearer credential to the GitHub API.
    #[clap(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    pub github_token: Option<String>,

    /// How a new row is merged with an existing row for the same key.
    #[clap(long, global = true, value_enum, value_name = "POLICY")]
    pub write_policy: Option<WritePolicy>,

    /// Also export the collected rows as JSON to this file.
    #[clap(long, global = true, value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// Enables debug logging.
    #[clap(short, long, global = true, action)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Collect today's row for the named series (all series when none given).
    Collect {
        #[clap(value_name = "SERIES")]
        series: Vec<String>,
    },
    /// Discover the owner's top repositories and collect a row per repository.
    TopRepos {
        /// Reuse the existing list file instead of running discovery.
        #[clap(long, action)]
        skip_discovery: bool,
    },
    /// Rewrite the top repositories list file without collecting.
    Discover,
    /// Regenerate diff files from the current series history.
    Diff {
        #[clap(value_name = "SERIES")]
        series: Vec<String>,
    },
    /// Drop duplicate rows from series files, keeping the first occurrence of each key.
    Dedupe {
        #[clap(value_name = "SERIES")]
        series: Vec<String>,
    },
    /// Print a commit message summarising the latest top repository star counts.
    CommitMessage,
    /// Render the 30-day fastest growing repositories table.
    FastestGrowing {
        /// Splice the table into this markdown file instead of printing it.
        #[clap(long, value_name = "FILE")]
        readme: Option<PathBuf>,
    },
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for Args {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(data_dir) = &self.data_dir {
                cache.insert("data_dir".to_string(), data_dir.display().to_string().into());
            }
            if let Some(token) = &self.github_token {
                cache.insert("github_token".to_string(), token.clone().into());
            }
            if let Some(policy) = &self.write_policy {
                cache.insert("write_policy".to_string(), policy.to_string().into());
            }
            Ok(cache)
        }
    }
}

pub fn version() -> String {
    let author = clap::crate_authors!();
    let config_dir_path = crate::get_config_dir().display().to_string();

    format!(
        "\
{version}

Authors: {author}

Config directory: {config_dir_path}",
        version = env!("CARGO_PKG_VERSION"),
    )
}
