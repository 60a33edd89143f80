use super::SeriesError;
use crate::metrics::Record;
use chrono::NaiveDate;
use std::path::Path;

pub const DATE_COLUMN: &str = "date";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fixed column layout of a series file: `date`, an optional entity column,
/// then the metric columns in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    entity_column: Option<String>,
    columns: Vec<String>,
}

impl Schema {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            entity_column: None,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_entity<S: Into<String>>(entity_column: impl Into<String>, columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            entity_column: Some(entity_column.into()),
            ..Self::new(columns)
        }
    }

    pub fn entity_column(&self) -> Option<&str> {
        self.entity_column.as_deref()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Same key layout, different metric columns. Used for diff files.
    pub fn with_columns<S: Into<String>>(&self, columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            entity_column: self.entity_column.clone(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn header(&self) -> Vec<&str> {
        let mut header = vec![DATE_COLUMN];
        header.extend(self.entity_column.as_deref());
        header.extend(self.columns.iter().map(String::as_str));
        header
    }

    pub fn header_line(&self) -> String {
        self.header().join(",")
    }

    pub(crate) fn check_header(&self, path: &Path, line: &str) -> Result<(), SeriesError> {
        let found = line.trim_end_matches('\r');
        let expected = self.header_line();
        if found != expected {
            return Err(SeriesError::HeaderMismatch {
                path: path.to_path_buf(),
                expected,
                found: found.to_string(),
            });
        }
        Ok(())
    }

    pub fn format_record(&self, record: &Record) -> String {
        let mut fields = vec![record.date.format(DATE_FORMAT).to_string()];
        if self.entity_column.is_some() {
            fields.push(record.entity.clone().unwrap_or_default());
        }
        for column in &self.columns {
            fields.push(record.get(column).map(|value| value.to_string()).unwrap_or_default());
        }
        fields.join(",")
    }

    pub(crate) fn parse_record(&self, path: &Path, line_number: usize, line: &str) -> Result<Record, SeriesError> {
        let fields: Vec<&str> = line.trim_end_matches('\r').split(',').collect();
        let expected = self.header().len();
        if fields.len() != expected {
            return Err(SeriesError::FieldCount {
                path: path.to_path_buf(),
                line: line_number,
                expected,
                found: fields.len(),
            });
        }

        let date = NaiveDate::parse_from_str(fields[0].trim(), DATE_FORMAT).map_err(|_| SeriesError::BadDate {
            path: path.to_path_buf(),
            line: line_number,
            value: fields[0].to_string(),
        })?;
        let mut record = Record::new(date);

        let mut rest = &fields[1..];
        if self.entity_column.is_some() {
            record.entity = Some(rest[0].trim().to_string());
            rest = &rest[1..];
        }

        for (column, raw) in self.columns.iter().zip(rest) {
            let value = if raw.trim().is_empty() {
                None
            } else {
                Some(raw.parse().map_err(|source| SeriesError::BadValue {
                    path: path.to_path_buf(),
                    line: line_number,
                    column: column.clone(),
                    source,
                })?)
            };
            record.set(column.clone(), value);
        }
        Ok(record)
    }
}
