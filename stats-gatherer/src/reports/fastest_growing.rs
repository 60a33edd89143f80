use super::{
    signed_thousands,
    StarSample,
};
use crate::metrics::with_thousands;
use chrono::{
    Duration,
    NaiveDate,
};
use eyre::{
    bail,
    Result,
};
use std::collections::BTreeMap;

pub const WINDOW_DAYS: i64 = 30;
pub const FASTEST_GROWING_REPOS: usize = 3;
/// Prefix shared by every owner's growth section heading.
pub const SECTION_HEADING_PREFIX: &str = "## Fastest Growing";
pub const START_MARKER: &str = "<!-- START fastest-growing -->";
pub const END_MARKER: &str = "<!-- END fastest-growing -->";

/// Daily star counts of one repository across the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoGrowth {
    pub repo: String,
    pub stars: Vec<i64>,
    pub growth: i64,
}

impl RepoGrowth {
    /// Change from the previous day; zero on the first day.
    pub fn delta(&self, day: usize) -> i64 {
        match day {
            0 => 0,
            _ => self.stars[day] - self.stars[day - 1],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrowthWindow {
    pub dates: Vec<NaiveDate>,
    pub repos: Vec<RepoGrowth>,
}

/// Ranks repositories by star growth over the last 30 days of history.
///
/// The window ends at the latest sampled date and starts 29 days earlier, or
/// at the earliest sampled date if history is shorter. Days without a sample
/// take the previous day's count; leading gaps take the first count inside
/// the window. Repositories with no sample inside the window are left out.
pub fn fastest_growing(samples: &[StarSample], limit: usize) -> Result<GrowthWindow> {
    let (Some(earliest), Some(latest)) = (
        samples.iter().map(|sample| sample.date).min(),
        samples.iter().map(|sample| sample.date).max(),
    ) else {
        bail!("No star history available; collect top repositories first");
    };
    let start = (latest - Duration::days(WINDOW_DAYS - 1)).max(earliest);
    let dates: Vec<NaiveDate> = start.iter_days().take_while(|date| *date <= latest).collect();

    let mut by_repo: BTreeMap<&str, BTreeMap<NaiveDate, i64>> = BTreeMap::new();
    for sample in samples {
        by_repo
            .entry(sample.repo.as_str())
            .or_default()
            .insert(sample.date, sample.stars);
    }

    let mut repos: Vec<RepoGrowth> = by_repo
        .into_iter()
        .filter_map(|(repo, history)| {
            let stars = fill_window(&dates, &history)?;
            let growth = stars[stars.len() - 1] - stars[0];
            Some(RepoGrowth {
                repo: repo.to_string(),
                stars,
                growth,
            })
        })
        .collect();

    if repos.is_empty() {
        bail!("No repository has star history between {start} and {latest}");
    }

    repos.sort_by(|a, b| b.growth.cmp(&a.growth).then_with(|| a.repo.cmp(&b.repo)));
    repos.truncate(limit);
    Ok(GrowthWindow { dates, repos })
}

fn fill_window(dates: &[NaiveDate], history: &BTreeMap<NaiveDate, i64>) -> Option<Vec<i64>> {
    let sampled: Vec<Option<i64>> = dates.iter().map(|date| history.get(date).copied()).collect();
    let first = sampled.iter().flatten().next().copied()?;
    let mut last = first;
    Some(
        sampled
            .into_iter()
            .map(|value| {
                if let Some(value) = value {
                    last = value;
                }
                last
            })
            .collect(),
    )
}

impl GrowthWindow {
    pub fn render_table(&self) -> String {
        let mut header = vec!["Date"];
        header.extend(self.repos.iter().map(|repo| repo.repo.as_str()));

        let mut lines = vec![
            format!("| {} |", header.join(" | ")),
            format!("| {} |", vec!["---"; header.len()].join(" | ")),
        ];
        for (day, date) in self.dates.iter().enumerate() {
            let mut row = vec![date.format("%Y-%m-%d").to_string()];
            for repo in &self.repos {
                row.push(format!("{} ({:+})", with_thousands(repo.stars[day]), repo.delta(day)));
            }
            lines.push(format!("| {} |", row.join(" | ")));
        }
        lines.join("\n")
    }

    pub fn render_summary(&self) -> String {
        self.repos
            .iter()
            .map(|repo| format!("- `{}` grew by {} stars", repo.repo, signed_thousands(repo.growth)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The full README section, from the heading through the end marker.
    pub fn render_section(&self, owner: &str) -> String {
        let (Some(first), Some(last)) = (self.dates.first(), self.dates.last()) else {
            return String::new();
        };
        [
            format!("{SECTION_HEADING_PREFIX} {owner} Repos ({WINDOW_DAYS} Days)"),
            String::new(),
            START_MARKER.to_string(),
            String::new(),
            format!("Data window: {first} → {last} (UTC)"),
            String::new(),
            self.render_table(),
            String::new(),
            self.render_summary(),
            String::new(),
            END_MARKER.to_string(),
        ]
        .join("\n")
    }

    /// `mise (+1,234), hk (+56)`
    pub fn headline(&self) -> String {
        self.repos
            .iter()
            .map(|repo| format!("{} ({})", repo.repo, signed_thousands(repo.growth)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
