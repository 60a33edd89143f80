use crate::{
    collectors::Collector,
    metrics::CollectedData,
    series::WriteSet,
};
use chrono::NaiveDate;
use eyre::{
    Context as _,
    Result,
};
use oss_stats_config::WritePolicy;
use std::{
    future::Future,
    pin::Pin,
};

/// Runs a set of collectors as one unit. Every collector fetches, then every
/// collector stages its files, before any file is written; a failed fetch or a
/// malformed file leaves all files untouched.
pub struct Orchestrator {
    collectors: Vec<Box<dyn Collector>>,
    metrics: Option<CollectedData>,
}

impl Orchestrator {
    pub fn new(collectors: Vec<Box<dyn Collector>>) -> Self {
        Self {
            collectors,
            metrics: None,
        }
    }
}

impl Collector for Orchestrator {
    fn collect(&mut self, date: NaiveDate) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let mut collected_data = CollectedData::new(date);

            for collector in &mut self.collectors {
                let name = collector.name().to_string();
                debug!(collector = %name, %date, "Collecting");
                collector
                    .collect(date)
                    .await
                    .wrap_err_with(|| format!("Collector '{name}' failed"))?;
            }

            collected_data.finalize();
            self.metrics = Some(collected_data);
            Ok(())
        })
    }

    fn stage(&self, policy: WritePolicy) -> Result<WriteSet> {
        let mut writes = WriteSet::new();
        for collector in &self.collectors {
            let staged = collector
                .stage(policy)
                .wrap_err_with(|| format!("Failed to store '{}'", collector.name()))?;
            writes.extend(staged);
        }
        Ok(writes)
    }

    fn persist(&mut self, policy: WritePolicy) -> Result<()> {
        let files = self.stage(policy)?.commit()?;
        let rows = self.rows();
        if let Some(metrics) = &mut self.metrics {
            metrics.rows_written = rows;
        }
        info!(collectors = self.collectors.len(), files, rows, %policy, "Stored collected rows");
        Ok(())
    }

    fn rows(&self) -> usize {
        self.collectors.iter().map(|collector| collector.rows()).sum()
    }

    fn format(&self) -> String {
        let mut report = String::new();

        report.push_str(&format!("\n{}\n", "=".repeat(80)));
        report.push_str(&format!("{:^80}\n", "📊 OSS STATS"));
        report.push_str(&format!("{}\n", "=".repeat(80)));

        if let Some(metrics) = &self.metrics {
            report.push_str(&format!(
                "\n🗓  Collection Summary:\n\
                • Date: {}\n\
                • Started: {}\n\
                • Duration: {:.1} seconds\n",
                metrics.date,
                metrics.collection_start.format("%Y-%m-%d %H:%M:%S UTC"),
                metrics.elapsed_seconds()
            ));
        }

        for collector in &self.collectors {
            report.push_str(&collector.format());
        }

        report.push_str(&format!("\n{}\n", "=".repeat(80)));
        report.push_str(&format!("{:^80}\n", "✅ END OF REPORT"));
        report.push_str(&format!("{}\n", "=".repeat(80)));

        report
    }

    fn summary(&self) -> serde_json::Value {
        let mut json_data = serde_json::json!({
            "collection_info": self.metrics,
        });
        for collector in &self.collectors {
            json_data[collector.name()] = collector.summary();
        }
        json_data
    }

    fn name(&self) -> &str {
        "orchestrator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        collectors::SeriesCollector,
        sources::{
            testing::FakeApi,
            MetricFetcher,
        },
    };
    use oss_stats_config::Config;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use temp_dir::TempDir;

    fn orchestrator(dir: &TempDir, api: FakeApi) -> Orchestrator {
        let config = Config::default();
        let fetcher = Arc::new(MetricFetcher::new(Arc::new(api)));
        let collectors = ["mise", "competitors"]
            .into_iter()
            .map(|name| {
                let series = config.series(name).unwrap().clone();
                Box::new(SeriesCollector::new(series, dir.path(), fetcher.clone())) as Box<dyn Collector>
            })
            .collect();
        Orchestrator::new(collectors)
    }

    #[tokio::test]
    async fn one_failing_collector_prevents_all_writes() {
        let dir = TempDir::new().unwrap();
        // competitors needs asdf-vm/asdf and friends, which the fake does not know
        let api = FakeApi::default()
            .with_brew("mise", 12, "45,678", "1.23")
            .with_repo("jdx/mise", 9000);
        let mut orchestrator = orchestrator(&dir, api);

        assert!(orchestrator.collect("2025-01-15".parse().unwrap()).await.is_err());
        assert!(!dir.child("mise.csv").exists());
        assert!(!dir.child("competitors.csv").exists());
    }

    #[tokio::test]
    async fn all_collectors_are_persisted() {
        let dir = TempDir::new().unwrap();
        let api = FakeApi::default()
            .with_brew("mise", 12, "45,678", "1.23")
            .with_repo("jdx/mise", 9000)
            .with_repo("asdf-vm/asdf", 22000)
            .with_repo("jdx/hk", 500)
            .with_repo("casey/just", 24000)
            .with_repo("NixOS/nixpkgs", 19000);
        let mut orchestrator = orchestrator(&dir, api);

        orchestrator.collect("2025-01-15".parse().unwrap()).await.unwrap();
        orchestrator.persist(WritePolicy::Replace).unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.child("competitors.csv")).unwrap(),
            "date,mise_stars,asdf_stars,hk_stars,just_stars,nixpkgs_stars\n\
             2025-01-15,9000,22000,500,24000,19000\n"
        );
        assert!(dir.child("mise.csv").exists());
        assert!(orchestrator.format().contains("END OF REPORT"));
        assert_eq!(orchestrator.summary()["collection_info"]["rows_written"], 2);
    }

    #[tokio::test]
    async fn malformed_later_file_prevents_earlier_writes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.child("competitors.csv"), "date,mise_stars\n2025-01-14,8990\n").unwrap();
        let api = FakeApi::default()
            .with_brew("mise", 12, "45,678", "1.23")
            .with_repo("jdx/mise", 9000)
            .with_repo("asdf-vm/asdf", 22000)
            .with_repo("jdx/hk", 500)
            .with_repo("casey/just", 24000)
            .with_repo("NixOS/nixpkgs", 19000);
        let mut orchestrator = orchestrator(&dir, api);

        orchestrator.collect("2025-01-15".parse().unwrap()).await.unwrap();
        let err = orchestrator.persist(WritePolicy::Replace).unwrap_err();

        assert!(format!("{err:#}").contains("competitors"));
        assert!(!dir.child("mise.csv").exists());
        assert!(!dir.child("mise-diff.csv").exists());
        assert_eq!(
            std::fs::read_to_string(dir.child("competitors.csv")).unwrap(),
            "date,mise_stars\n2025-01-14,8990\n"
        );
    }
}
