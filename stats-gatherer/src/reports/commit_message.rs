use super::{
    signed,
    StarSample,
};
use crate::metrics::with_thousands;
use std::collections::{
    BTreeSet,
    HashMap,
};

pub const COMMIT_MESSAGE_REPOS: usize = 5;

/// `update stats: mise: 9,000 (+10), hk: 500 (+0)` for the most starred
/// repositories on the latest date, or plain `update stats` until two dates exist.
pub fn commit_message(samples: &[StarSample]) -> String {
    let dates: BTreeSet<_> = samples.iter().map(|sample| sample.date).collect();
    let mut latest_dates = dates.iter().rev();
    let (Some(&latest), Some(&previous)) = (latest_dates.next(), latest_dates.next()) else {
        return "update stats".to_string();
    };

    let previous_stars: HashMap<&str, i64> = samples
        .iter()
        .filter(|sample| sample.date == previous)
        .map(|sample| (sample.repo.as_str(), sample.stars))
        .collect();

    let mut top: Vec<&StarSample> = samples.iter().filter(|sample| sample.date == latest).collect();
    top.sort_by(|a, b| b.stars.cmp(&a.stars).then_with(|| a.repo.cmp(&b.repo)));
    top.truncate(COMMIT_MESSAGE_REPOS);

    let parts: Vec<String> = top
        .into_iter()
        .map(|sample| {
            let delta = match previous_stars.get(sample.repo.as_str()) {
                Some(before) => signed(sample.stars - before),
                None => "+0".to_string(),
            };
            format!("{}: {} ({delta})", sample.repo, with_thousands(sample.stars))
        })
        .collect();

    format!("update stats: {}", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn sample(date: &str, repo: &str, stars: i64) -> StarSample {
        StarSample {
            date: date.parse::<NaiveDate>().unwrap(),
            repo: repo.to_string(),
            stars,
        }
    }

    #[test]
    fn single_date_gives_plain_message() {
        assert_eq!(commit_message(&[]), "update stats");
        assert_eq!(commit_message(&[sample("2025-01-15", "mise", 9000)]), "update stats");
    }

    #[test]
    fn top_five_by_stars_with_deltas() {
        let samples = vec![
            sample("2025-01-14", "mise", 12_290),
            sample("2025-01-14", "usage", 300),
            sample("2025-01-14", "hk", 510),
            sample("2025-01-15", "mise", 12_345),
            sample("2025-01-15", "usage", 300),
            sample("2025-01-15", "hk", 507),
            sample("2025-01-15", "fnox", 800),
            sample("2025-01-15", "pitchfork", 200),
            sample("2025-01-15", "rtx-tiny", 10),
        ];

        assert_eq!(
            commit_message(&samples),
            "update stats: mise: 12,345 (+55), fnox: 800 (+0), hk: 507 (-3), usage: 300 (0), pitchfork: 200 (+0)"
        );
    }

    #[test]
    fn only_two_latest_dates_are_compared() {
        let samples = vec![
            sample("2025-01-13", "mise", 1),
            sample("2025-01-14", "mise", 9000),
            sample("2025-01-15", "mise", 9001),
        ];
        assert_eq!(commit_message(&samples), "update stats: mise: 9,001 (+1)");
    }
}
