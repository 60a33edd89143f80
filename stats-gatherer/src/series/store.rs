use super::{
    Schema,
    SeriesError,
    SeriesTable,
};
use crate::metrics::Record;
use std::{
    ffi::OsString,
    fs::{
        self,
        OpenOptions,
    },
    io::{
        self,
        Write as _,
    },
    path::{
        Path,
        PathBuf,
    },
};

/// Appends `record` as the last line of the series file, creating the file
/// with its header first when it does not exist yet.
pub fn append_row(path: &Path, schema: &Schema, record: &Record) -> Result<(), SeriesError> {
    let existing = read_existing(path)?;
    let chunk = append_chunk(path, schema, existing.as_deref(), record)?;
    if existing.is_none() {
        ensure_parent(path)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(SeriesError::io(path))?;
    file.write_all(chunk.as_bytes()).map_err(SeriesError::io(path))?;
    debug!(path = %path.display(), "Appended row");
    Ok(())
}

/// File contents, or `None` when the file does not exist.
pub(crate) fn read_existing(path: &Path) -> Result<Option<String>, SeriesError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SeriesError::io(path)(e)),
    }
}

/// The text that appending `record` to `existing` adds: a header for an empty
/// file, a newline when the last line is unterminated, then the row.
pub(crate) fn append_chunk(
    path: &Path,
    schema: &Schema,
    existing: Option<&str>,
    record: &Record,
) -> Result<String, SeriesError> {
    let mut chunk = String::new();
    match existing.filter(|text| !text.trim().is_empty()) {
        Some(text) => {
            if let Some(header) = text.lines().find(|line| !line.trim().is_empty()) {
                schema.check_header(path, header)?;
            }
            if !text.ends_with('\n') {
                chunk.push('\n');
            }
        }
        None => {
            chunk.push_str(&schema.header_line());
            chunk.push('\n');
        }
    }
    chunk.push_str(&schema.format_record(record));
    chunk.push('\n');
    Ok(chunk)
}

/// Rewrites the file keeping only the first physical occurrence of each key.
/// Returns the number of rows dropped; the file is untouched when nothing was.
pub fn deduplicate(path: &Path, schema: &Schema) -> Result<usize, SeriesError> {
    let mut table = SeriesTable::load(path, schema.clone())?;
    let removed = table.deduplicate();
    if removed > 0 {
        write_atomic(path, &table.render())?;
        info!(path = %path.display(), removed, "Removed duplicate rows");
    }
    Ok(removed)
}

/// Writes `contents` to a sibling temporary file and renames it over `path`,
/// so readers never observe a partially written file.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), SeriesError> {
    ensure_parent(path)?;
    let tmp = temporary_sibling(path);
    fs::write(&tmp, contents).map_err(SeriesError::io(&tmp))?;
    fs::rename(&tmp, path).map_err(SeriesError::io(path))
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn ensure_parent(path: &Path) -> Result<(), SeriesError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(SeriesError::io(parent))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricValue;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    fn mise_schema() -> Schema {
        Schema::new(["brew_rank", "brew_installs", "brew_pct", "github_stars"])
    }

    fn mise_row(date: &str, rank: i64) -> Record {
        Record::new(date.parse::<NaiveDate>().unwrap())
            .with("brew_rank", Some(MetricValue::Count(rank)))
            .with("brew_installs", Some(MetricValue::Count(45678)))
            .with("brew_pct", Some("1.23".parse().unwrap()))
            .with("github_stars", Some(MetricValue::Count(9000)))
    }

    #[test]
    fn append_creates_file_with_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("mise.csv");

        append_row(&path, &mise_schema(), &mise_row("2025-01-15", 12)).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "date,brew_rank,brew_installs,brew_pct,github_stars\n2025-01-15,12,45678,1.23,9000\n"
        );
    }

    #[test]
    fn append_repairs_missing_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("mise.csv");
        fs::write(
            &path,
            "date,brew_rank,brew_installs,brew_pct,github_stars\n2025-01-14,13,45000,1.20,8990",
        )
        .unwrap();

        append_row(&path, &mise_schema(), &mise_row("2025-01-15", 12)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("2025-01-14,13,45000,1.20,8990\n2025-01-15,12,45678,1.23,9000\n"));
    }

    #[test]
    fn append_refuses_foreign_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("mise.csv");
        fs::write(&path, "date,stars\n2025-01-14,1\n").unwrap();

        let err = append_row(&path, &mise_schema(), &mise_row("2025-01-15", 12)).unwrap_err();
        assert!(matches!(err, SeriesError::HeaderMismatch { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "date,stars\n2025-01-14,1\n");
    }

    #[test]
    fn same_day_rerun_keeps_first_row_after_deduplicate() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("mise.csv");
        let schema = mise_schema();

        append_row(&path, &schema, &mise_row("2025-01-14", 13)).unwrap();
        append_row(&path, &schema, &mise_row("2025-01-15", 12)).unwrap();
        assert_eq!(deduplicate(&path, &schema).unwrap(), 0);

        append_row(&path, &schema, &mise_row("2025-01-15", 11)).unwrap();
        assert_eq!(deduplicate(&path, &schema).unwrap(), 1);

        let table = SeriesTable::load(&path, schema).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.has_unique_keys());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "date,brew_rank,brew_installs,brew_pct,github_stars\n\
             2025-01-14,13,45678,1.23,9000\n\
             2025-01-15,12,45678,1.23,9000\n"
        );
    }

    #[test]
    fn atomic_write_leaves_no_temporary_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("nested").join("list.txt");

        write_atomic(&path, "mise\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "mise\n");
        assert!(!temporary_sibling(&path).exists());
    }
}
