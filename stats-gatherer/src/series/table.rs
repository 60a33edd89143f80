use super::{
    Schema,
    SeriesError,
};
use crate::metrics::{
    Record,
    RecordKey,
};
use std::{
    collections::{
        BTreeMap,
        HashSet,
    },
    fs,
    io,
    path::Path,
};

/// In-memory view of a series file, rows kept in physical order.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTable {
    schema: Schema,
    records: Vec<Record>,
}

impl SeriesTable {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            records: Vec::new(),
        }
    }

    /// Reads a series file. A missing or empty file is an empty table.
    pub fn load(path: &Path, schema: Schema) -> Result<Self, SeriesError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(path, schema, &text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::new(schema)),
            Err(e) => Err(SeriesError::io(path)(e)),
        }
    }

    pub fn parse(path: &Path, schema: Schema, text: &str) -> Result<Self, SeriesError> {
        let mut table = Self::new(schema);
        let mut lines = text.lines().enumerate().filter(|(_, line)| !line.trim().is_empty());
        let Some((_, header)) = lines.next() else {
            return Ok(table);
        };
        table.schema.check_header(path, header)?;
        for (index, line) in lines {
            let record = table.schema.parse_record(path, index + 1, line)?;
            table.records.push(record);
        }
        Ok(table)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Inserts each record, replacing any row with the same key, and leaves the
    /// table sorted by key.
    pub fn upsert(&mut self, records: impl IntoIterator<Item = Record>) {
        let mut by_key: BTreeMap<RecordKey, Record> = BTreeMap::new();
        for record in self.records.drain(..).chain(records) {
            by_key.insert(record.key(), record);
        }
        self.records = by_key.into_values().collect();
    }

    /// Drops every row whose key already appeared earlier in physical order.
    /// Returns the number of rows removed.
    pub fn deduplicate(&mut self) -> usize {
        let before = self.records.len();
        let mut seen = HashSet::new();
        self.records.retain(|record| seen.insert(record.key()));
        before - self.records.len()
    }

    pub fn has_unique_keys(&self) -> bool {
        let mut seen = HashSet::new();
        self.records.iter().all(|record| seen.insert(record.key()))
    }

    pub fn render(&self) -> String {
        let mut out = self.schema.header_line();
        out.push('\n');
        for record in &self.records {
            out.push_str(&self.schema.format_record(record));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricValue;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn schema() -> Schema {
        Schema::new(["brew_rank", "github_stars"])
    }

    fn row(date: &str, rank: i64, stars: i64) -> Record {
        Record::new(date.parse::<NaiveDate>().unwrap())
            .with("brew_rank", Some(MetricValue::Count(rank)))
            .with("github_stars", Some(MetricValue::Count(stars)))
    }

    #[test]
    fn empty_text_is_empty_table() {
        let table = SeriesTable::parse(Path::new("x.csv"), schema(), "").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn header_mismatch_fails_loudly() {
        let err = SeriesTable::parse(
            Path::new("x.csv"),
            schema(),
            "date,brew_rank,brew_installs,github_stars\n2025-01-01,1,2,3\n",
        )
        .unwrap_err();
        assert!(matches!(err, SeriesError::HeaderMismatch { .. }));
    }

    #[test]
    fn deduplicate_keeps_first_physical_row() {
        let mut table = SeriesTable::new(schema());
        table.push(row("2025-01-15", 12, 9000));
        table.push(row("2025-01-14", 13, 8990));
        table.push(row("2025-01-15", 11, 9001));

        assert_eq!(table.deduplicate(), 1);
        assert!(table.has_unique_keys());
        assert_eq!(table.records(), &[row("2025-01-15", 12, 9000), row("2025-01-14", 13, 8990)]);
    }

    #[test]
    fn upsert_replaces_and_sorts() {
        let mut table = SeriesTable::new(schema());
        table.push(row("2025-01-15", 12, 9000));
        table.push(row("2025-01-13", 14, 8980));

        table.upsert([row("2025-01-15", 11, 9001), row("2025-01-14", 13, 8990)]);

        assert_eq!(
            table.records(),
            &[
                row("2025-01-13", 14, 8980),
                row("2025-01-14", 13, 8990),
                row("2025-01-15", 11, 9001),
            ]
        );
    }

    #[test]
    fn upsert_keys_on_entity_too() {
        let schema = Schema::with_entity("repo_name", ["github_stars"]);
        let mut table = SeriesTable::new(schema);
        let date = "2025-01-15".parse::<NaiveDate>().unwrap();
        table.upsert([
            Record::for_entity(date, "mise").with("github_stars", Some(MetricValue::Count(9000))),
            Record::for_entity(date, "hk").with("github_stars", Some(MetricValue::Count(500))),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.render(),
            "date,repo_name,github_stars\n2025-01-15,hk,500\n2025-01-15,mise,9000\n"
        );
    }
}
