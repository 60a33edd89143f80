use crate::{
    metrics::Record,
    series::{
        Schema,
        WriteSet,
    },
};
use chrono::NaiveDate;
use comfy_table::{
    presets,
    Attribute,
    Cell,
    Color,
    ContentArrangement,
    Table,
};
use eyre::Result;
use oss_stats_config::WritePolicy;
use std::{
    future::Future,
    pin::Pin,
};

/// Trait for collecting, persisting and formatting one metric group
pub trait Collector: Send {
    /// Fetch the rows for `date`. Nothing is written to disk.
    fn collect(&mut self, date: NaiveDate) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Merge the collected rows into their files in memory. Nothing is written to disk.
    fn stage(&self, policy: WritePolicy) -> Result<WriteSet>;

    /// Stage, then write every staged file.
    fn persist(&mut self, policy: WritePolicy) -> Result<()> {
        self.stage(policy)?.commit()?;
        Ok(())
    }

    /// Number of rows held from the last `collect`
    fn rows(&self) -> usize;

    /// Format collected rows for display
    fn format(&self) -> String;

    /// Get collected rows as JSON
    fn summary(&self) -> serde_json::Value;

    /// Get the name of this collector
    fn name(&self) -> &str;
}

/// Renders records as a terminal table, empty cells shown as `-`.
pub(crate) fn records_table(title: &str, schema: &Schema, records: &[Record]) -> String {
    let mut table = Table::new();
    let header: Vec<Cell> = schema
        .header()
        .into_iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold).fg(Color::Cyan))
        .collect();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for record in records {
        let mut row = vec![Cell::new(record.date)];
        if schema.entity_column().is_some() {
            row.push(Cell::new(record.entity.as_deref().unwrap_or_default()).add_attribute(Attribute::Bold));
        }
        for column in schema.columns() {
            row.push(match record.get(column) {
                Some(value) => Cell::new(value),
                None => Cell::new("-").fg(Color::DarkGrey),
            });
        }
        table.add_row(row);
    }

    format!("\n📈 {title}\n{table}\n")
}
