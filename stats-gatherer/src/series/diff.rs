use super::{
    store,
    Schema,
    SeriesError,
    SeriesTable,
};
use crate::metrics::{
    MetricValue,
    Record,
};
use oss_stats_config::Polarity;
use std::{
    collections::HashMap,
    path::Path,
};

/// Derives day-over-day changes from consecutive rows of each entity.
///
/// Every pair of consecutive rows (in physical order) yields one diff row keyed
/// by the earlier row's date. A change is empty when either side is empty.
/// Columns with [`Polarity::LowerIsBetter`] are inverted so a positive value is
/// always an improvement.
pub fn compute_diff(table: &SeriesTable, columns: &[(String, Polarity)]) -> SeriesTable {
    let schema = table.schema().with_columns(columns.iter().map(|(name, _)| name.clone()));
    let mut diff = SeriesTable::new(schema);
    let mut previous: HashMap<Option<&str>, &Record> = HashMap::new();

    for current in table.records() {
        if let Some(prev) = previous.insert(current.entity.as_deref(), current) {
            let mut row = Record {
                entity: prev.entity.clone(),
                ..Record::new(prev.date)
            };
            for (name, polarity) in columns {
                let change = match (prev.get(name), current.get(name)) {
                    (Some(before), Some(after)) => Some(MetricValue::change(before, after, *polarity)),
                    _ => None,
                };
                row.set(name.clone(), change);
            }
            diff.push(row);
        }
    }
    diff
}

/// Regenerates `diff_path` from the full history in `series_path`.
/// Returns the number of diff rows written.
pub fn write_diff(
    series_path: &Path,
    diff_path: &Path,
    schema: &Schema,
    columns: &[(String, Polarity)],
) -> Result<usize, SeriesError> {
    let table = SeriesTable::load(series_path, schema.clone())?;
    let diff = compute_diff(&table, columns);
    store::write_atomic(diff_path, &diff.render())?;
    info!(path = %diff_path.display(), rows = diff.len(), "Regenerated diff file");
    Ok(diff.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn columns() -> Vec<(String, Polarity)> {
        vec![
            ("brew_rank".to_string(), Polarity::LowerIsBetter),
            ("brew_installs".to_string(), Polarity::HigherIsBetter),
            ("brew_pct".to_string(), Polarity::HigherIsBetter),
            ("github_stars".to_string(), Polarity::HigherIsBetter),
        ]
    }

    fn mise_table(text: &str) -> SeriesTable {
        let schema = Schema::new(["brew_rank", "brew_installs", "brew_pct", "github_stars"]);
        SeriesTable::parse(Path::new("mise.csv"), schema, text).unwrap()
    }

    #[test]
    fn n_rows_give_n_minus_one_diffs_keyed_by_earlier_date() {
        let table = mise_table(
            "date,brew_rank,brew_installs,brew_pct,github_stars\n\
             2025-01-13,5,40000,1.10,8980\n\
             2025-01-14,3,41000,1.15,8990\n\
             2025-01-15,4,41500,1.15,9000\n",
        );

        let diff = compute_diff(&table, &columns());

        assert_eq!(
            diff.render(),
            "date,brew_rank,brew_installs,brew_pct,github_stars\n\
             2025-01-13,2,1000,0.05,10\n\
             2025-01-14,-1,500,0.00,10\n"
        );
    }

    #[test]
    fn empty_cells_give_empty_changes() {
        let table = mise_table(
            "date,brew_rank,brew_installs,brew_pct,github_stars\n\
             2025-01-14,,,,8990\n\
             2025-01-15,12,45678,1.23,9000\n",
        );

        let diff = compute_diff(&table, &columns());

        assert_eq!(diff.records()[0].get("brew_rank"), None);
        assert_eq!(diff.records()[0].get("github_stars"), Some(MetricValue::Count(10)));
    }

    #[test]
    fn single_row_has_no_diff() {
        let table = mise_table("date,brew_rank,brew_installs,brew_pct,github_stars\n2025-01-15,12,45678,1.23,9000\n");
        assert!(compute_diff(&table, &columns()).is_empty());
    }

    #[test]
    fn entities_are_diffed_independently() {
        let schema = Schema::with_entity("repo_name", ["github_stars"]);
        let table = SeriesTable::parse(
            Path::new("top-repos.csv"),
            schema,
            "date,repo_name,github_stars\n\
             2025-01-14,hk,500\n\
             2025-01-14,mise,9000\n\
             2025-01-15,hk,510\n\
             2025-01-15,mise,9020\n\
             2025-01-15,usage,40\n",
        )
        .unwrap();

        let diff = compute_diff(&table, &[("github_stars".to_string(), Polarity::HigherIsBetter)]);

        assert_eq!(
            diff.render(),
            "date,repo_name,github_stars\n2025-01-14,hk,10\n2025-01-14,mise,20\n"
        );
        assert_eq!(diff.records()[0].date, NaiveDate::from_ymd_opt(2025, 1, 14).unwrap());
    }
}
