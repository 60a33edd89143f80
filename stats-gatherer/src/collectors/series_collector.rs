use crate::{
    collectors::{
        collector::records_table,
        Collector,
    },
    metrics::Record,
    series::{
        Schema,
        SeriesFiles,
        WriteSet,
    },
    sources::MetricFetcher,
};
use chrono::NaiveDate;
use eyre::{
    Context as _,
    OptionExt as _,
    Result,
};
use oss_stats_config::{
    SeriesConfig,
    WritePolicy,
};
use std::{
    future::Future,
    path::Path,
    pin::Pin,
    sync::Arc,
};

/// Collects one row per date for a configured single-entity series.
pub struct SeriesCollector {
    series: SeriesConfig,
    files: SeriesFiles,
    fetcher: Arc<MetricFetcher>,
    record: Option<Record>,
}

impl SeriesCollector {
    pub fn new(series: SeriesConfig, data_dir: &Path, fetcher: Arc<MetricFetcher>) -> Self {
        let files = SeriesFiles::for_series(&series, data_dir);
        Self {
            series,
            files,
            fetcher,
            record: None,
        }
    }

    pub fn schema(&self) -> &Schema {
        self.files.schema()
    }

    pub fn path(&self) -> &Path {
        self.files.path()
    }

    /// Fetches every column of the series for `date`.
    pub async fn fetch_record(&self, date: NaiveDate) -> Result<Record> {
        let mut record = Record::new(date);
        let mut missing = Vec::new();
        for column in &self.series.columns {
            let value = self
                .fetcher
                .fetch_metric(&column.source)
                .await
                .wrap_err_with(|| format!("Failed to fetch '{}' for series '{}'", column.name, self.series.name))?;
            if value.is_none() {
                missing.push(column.name.as_str());
            }
            record.set(column.name.clone(), value);
        }
        if !missing.is_empty() {
            warn!(series = %self.series.name, ?missing, "No data for some columns, recording empty values");
        }
        Ok(record)
    }
}

impl Collector for SeriesCollector {
    fn collect(&mut self, date: NaiveDate) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let record = self.fetch_record(date).await?;
            self.record = Some(record);
            Ok(())
        })
    }

    fn stage(&self, policy: WritePolicy) -> Result<WriteSet> {
        let record = self.record.as_ref().ok_or_eyre("No row collected yet. Call collect() first.")?;
        let mut writes = WriteSet::new();
        let rows = self.files.stage(std::slice::from_ref(record), policy, &mut writes)?;
        info!(series = %self.series.name, date = %record.date, rows, %policy, "Staged row");
        Ok(writes)
    }

    fn rows(&self) -> usize {
        usize::from(self.record.is_some())
    }

    fn format(&self) -> String {
        match &self.record {
            Some(record) => records_table(&self.series.name, self.schema(), std::slice::from_ref(record)),
            None => format!("\n📈 {}: no row collected\n", self.series.name),
        }
    }

    fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "series": self.series.name,
            "path": self.files.path(),
            "row": self.record,
        })
    }

    fn name(&self) -> &str {
        &self.series.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metrics::MetricValue,
        series::SeriesTable,
        sources::testing::FakeApi,
    };
    use oss_stats_config::Config;
    use pretty_assertions::assert_eq;
    use std::fs;
    use temp_dir::TempDir;

    fn mise_series() -> SeriesConfig {
        Config::default().series("mise").unwrap().clone()
    }

    fn collector(dir: &TempDir, api: FakeApi) -> SeriesCollector {
        SeriesCollector::new(mise_series(), dir.path(), Arc::new(MetricFetcher::new(Arc::new(api))))
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn end_to_end_row_matches_source_values() {
        let dir = TempDir::new().unwrap();
        let api = FakeApi::default()
            .with_brew("mise", 12, "45,678", "1.23")
            .with_repo("jdx/mise", 9000);
        let mut collector = collector(&dir, api);

        collector.collect(date("2025-01-15")).await.unwrap();
        collector.persist(WritePolicy::FirstSeen).unwrap();

        assert_eq!(
            fs::read_to_string(dir.child("mise.csv")).unwrap(),
            "date,brew_rank,brew_installs,brew_pct,github_stars\n2025-01-15,12,45678,1.23,9000\n"
        );
    }

    #[tokio::test]
    async fn first_seen_policy_keeps_first_row_of_the_day() {
        let dir = TempDir::new().unwrap();

        let mut first = collector(
            &dir,
            FakeApi::default()
                .with_brew("mise", 12, "45,678", "1.23")
                .with_repo("jdx/mise", 9000),
        );
        first.collect(date("2025-01-15")).await.unwrap();
        first.persist(WritePolicy::FirstSeen).unwrap();

        let mut second = collector(
            &dir,
            FakeApi::default()
                .with_brew("mise", 11, "46,000", "1.25")
                .with_repo("jdx/mise", 9010),
        );
        second.collect(date("2025-01-15")).await.unwrap();
        second.persist(WritePolicy::FirstSeen).unwrap();

        let table = SeriesTable::load(&dir.child("mise.csv"), first.schema().clone()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].get("brew_rank"), Some(MetricValue::Count(12)));
    }

    #[tokio::test]
    async fn replace_policy_keeps_latest_row_of_the_day() {
        let dir = TempDir::new().unwrap();

        for (rank, stars) in [(12, 9000), (11, 9010)] {
            let mut collector = collector(
                &dir,
                FakeApi::default()
                    .with_brew("mise", rank, "45,678", "1.23")
                    .with_repo("jdx/mise", stars),
            );
            collector.collect(date("2025-01-15")).await.unwrap();
            collector.persist(WritePolicy::Replace).unwrap();
        }

        let table = SeriesTable::load(&dir.child("mise.csv"), collector(&dir, FakeApi::default()).schema().clone()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].get("brew_rank"), Some(MetricValue::Count(11)));
        assert_eq!(table.records()[0].get("github_stars"), Some(MetricValue::Count(9010)));
    }

    #[tokio::test]
    async fn persist_regenerates_diff_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.child("mise.csv"),
            "date,brew_rank,brew_installs,brew_pct,github_stars\n2025-01-14,14,45000,1.20,8990\n",
        )
        .unwrap();
        let mut collector = collector(
            &dir,
            FakeApi::default()
                .with_brew("mise", 12, "45,678", "1.23")
                .with_repo("jdx/mise", 9000),
        );

        collector.collect(date("2025-01-15")).await.unwrap();
        collector.persist(WritePolicy::Replace).unwrap();

        assert_eq!(
            fs::read_to_string(dir.child("mise-diff.csv")).unwrap(),
            "date,brew_rank,brew_installs,brew_pct,github_stars\n2025-01-14,2,678,0.03,10\n"
        );
    }

    #[tokio::test]
    async fn missing_formula_records_empty_brew_columns() {
        let dir = TempDir::new().unwrap();
        let mut collector = collector(&dir, FakeApi::default().with_repo("jdx/mise", 9000));

        collector.collect(date("2025-01-15")).await.unwrap();
        collector.persist(WritePolicy::Replace).unwrap();

        assert_eq!(
            fs::read_to_string(dir.child("mise.csv")).unwrap(),
            "date,brew_rank,brew_installs,brew_pct,github_stars\n2025-01-15,,,,9000\n"
        );
    }

    #[tokio::test]
    async fn failed_fetch_leaves_files_untouched() {
        let dir = TempDir::new().unwrap();
        let mut collector = collector(&dir, FakeApi::default().with_brew("mise", 12, "45,678", "1.23"));

        assert!(collector.collect(date("2025-01-15")).await.is_err());
        assert!(collector.persist(WritePolicy::Replace).is_err());
        assert!(!dir.child("mise.csv").exists());
    }
}
