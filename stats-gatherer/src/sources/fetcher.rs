use super::{
    BrewAnalytics,
    BrewStats,
    StatsApi,
};
use crate::metrics::MetricValue;
use eyre::Result;
use oss_stats_config::MetricSource;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Resolves configured metric sources to values for one run.
///
/// The Homebrew feed is downloaded at most once per fetcher and shared by all
/// series collected in the same run.
pub struct MetricFetcher {
    api: Arc<dyn StatsApi>,
    brew: OnceCell<BrewAnalytics>,
}

impl MetricFetcher {
    pub fn new(api: Arc<dyn StatsApi>) -> Self {
        Self {
            api,
            brew: OnceCell::new(),
        }
    }

    pub fn api(&self) -> &dyn StatsApi {
        self.api.as_ref()
    }

    pub async fn brew_analytics(&self) -> Result<&BrewAnalytics> {
        self.brew
            .get_or_try_init(|| async {
                let analytics = BrewAnalytics::new(self.api.brew_analytics().await?);
                if analytics.is_empty() {
                    warn!("Homebrew analytics feed lists no formulae");
                } else {
                    info!(formulae = analytics.len(), "Loaded Homebrew analytics");
                }
                Ok::<_, eyre::Report>(analytics)
            })
            .await
    }

    pub async fn brew_stats(&self, formula: &str) -> Result<Option<BrewStats>> {
        let stats = self.brew_analytics().await?.stats(formula)?;
        if stats.is_none() {
            debug!(formula, "Formula not present in Homebrew analytics");
        }
        Ok(stats)
    }

    pub async fn github_stars(&self, repo: &str) -> Result<MetricValue> {
        let repository = self.api.repository(repo).await?;
        Ok(MetricValue::Count(repository.stargazers_count))
    }

    /// `Ok(None)` means the source has no entry for the requested entity; any
    /// transport or decoding failure is an error.
    pub async fn fetch_metric(&self, source: &MetricSource) -> Result<Option<MetricValue>> {
        match source {
            MetricSource::BrewRank { formula } => Ok(self.brew_stats(formula).await?.map(|stats| stats.rank)),
            MetricSource::BrewInstalls { formula } => Ok(self.brew_stats(formula).await?.map(|stats| stats.installs)),
            MetricSource::BrewPercent { formula } => Ok(self.brew_stats(formula).await?.map(|stats| stats.percent)),
            MetricSource::GithubStars { repo } => self.github_stars(repo).await.map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::testing::FakeApi;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn brew_feed_is_downloaded_once() {
        let api = Arc::new(FakeApi::default().with_brew("mise", 12, "45,678", "1.23"));
        let fetcher = MetricFetcher::new(api.clone());

        let rank = fetcher
            .fetch_metric(&MetricSource::BrewRank {
                formula: "mise".to_string(),
            })
            .await
            .unwrap();
        let installs = fetcher
            .fetch_metric(&MetricSource::BrewInstalls {
                formula: "mise".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(rank, Some(MetricValue::Count(12)));
        assert_eq!(installs, Some(MetricValue::Count(45678)));
        assert_eq!(api.brew_requests(), 1);
    }

    #[tokio::test]
    async fn missing_formula_is_none() {
        let fetcher = MetricFetcher::new(Arc::new(FakeApi::default()));
        let value = fetcher
            .fetch_metric(&MetricSource::BrewPercent {
                formula: "fnox".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn unknown_repository_is_an_error() {
        let fetcher = MetricFetcher::new(Arc::new(FakeApi::default()));
        let result = fetcher
            .fetch_metric(&MetricSource::GithubStars {
                repo: "jdx/nope".to_string(),
            })
            .await;
        assert!(result.is_err());
    }
}
