use super::{
    compute_diff,
    store,
    write_diff,
    Schema,
    SeriesError,
    SeriesTable,
};
use crate::metrics::Record;
use oss_stats_config::{
    Polarity,
    SeriesConfig,
    WritePolicy,
};
use std::path::{
    Path,
    PathBuf,
};

/// File contents prepared in memory and written together by [`WriteSet::commit`].
///
/// Staging every target before touching the disk means a malformed file found
/// late in a run fails the run before anything earlier in it was written.
#[derive(Debug, Default)]
pub struct WriteSet {
    files: Vec<(PathBuf, String)>,
}

impl WriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `contents` for `path`, replacing anything staged for it before.
    pub fn push(&mut self, path: impl Into<PathBuf>, contents: String) {
        let path = path.into();
        match self.files.iter_mut().find(|(staged, _)| *staged == path) {
            Some((_, staged)) => *staged = contents,
            None => self.files.push((path, contents)),
        }
    }

    pub fn extend(&mut self, other: WriteSet) {
        for (path, contents) in other.files {
            self.push(path, contents);
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|(path, _)| path.as_path())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Writes every staged file atomically, in staging order.
    pub fn commit(self) -> Result<usize, SeriesError> {
        let count = self.files.len();
        for (path, contents) in self.files {
            store::write_atomic(&path, &contents)?;
            debug!(path = %path.display(), bytes = contents.len(), "Wrote file");
        }
        Ok(count)
    }
}

/// A series file together with its optional diff file.
#[derive(Debug, Clone)]
pub struct SeriesFiles {
    schema: Schema,
    path: PathBuf,
    diff_path: Option<PathBuf>,
    diff_columns: Vec<(String, Polarity)>,
}

impl SeriesFiles {
    pub fn new(
        schema: Schema,
        path: PathBuf,
        diff_path: Option<PathBuf>,
        diff_columns: Vec<(String, Polarity)>,
    ) -> Self {
        Self {
            schema,
            path,
            diff_path,
            diff_columns,
        }
    }

    pub fn for_series(series: &SeriesConfig, data_dir: &Path) -> Self {
        Self::new(
            Schema::new(series.column_names()),
            data_dir.join(&series.path),
            series.diff_path.as_ref().map(|diff| data_dir.join(diff)),
            series.diff_columns(),
        )
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn diff_path(&self) -> Option<&Path> {
        self.diff_path.as_deref()
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Merges `records` into the series under `policy` and stages the new
    /// series file and its diff. Returns the number of rows in the merged
    /// series.
    ///
    /// `Replace` upserts by key. `FirstSeen` appends, then drops later
    /// duplicates so the first row recorded for a key wins.
    pub fn stage(&self, records: &[Record], policy: WritePolicy, writes: &mut WriteSet) -> Result<usize, SeriesError> {
        let table = match policy {
            WritePolicy::Replace => {
                let mut table = SeriesTable::load(&self.path, self.schema.clone())?;
                table.upsert(records.iter().cloned());
                table
            }
            WritePolicy::FirstSeen => {
                let mut text = store::read_existing(&self.path)?.unwrap_or_default();
                for record in records {
                    let chunk = store::append_chunk(&self.path, &self.schema, Some(&text), record)?;
                    text.push_str(&chunk);
                }
                let mut table = SeriesTable::parse(&self.path, self.schema.clone(), &text)?;
                let removed = table.deduplicate();
                if removed > 0 {
                    info!(path = %self.path.display(), removed, "Dropped rows already recorded for their key");
                }
                table
            }
        };

        writes.push(&self.path, table.render());
        if let Some(diff_path) = &self.diff_path {
            writes.push(diff_path, compute_diff(&table, &self.diff_columns).render());
        }
        Ok(table.len())
    }

    /// Drops later duplicates of each key from the series file.
    pub fn deduplicate(&self) -> Result<usize, SeriesError> {
        store::deduplicate(&self.path, &self.schema)
    }

    /// Rewrites the diff file from the full series history, if one is configured.
    pub fn regenerate_diff(&self) -> Result<Option<usize>, SeriesError> {
        let Some(diff_path) = &self.diff_path else {
            return Ok(None);
        };
        write_diff(&self.path, diff_path, &self.schema, &self.diff_columns).map(Some)
    }
}
