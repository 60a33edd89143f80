use crate::series::SeriesTable;
use chrono::{
    Duration,
    NaiveDate,
};
use oss_stats_config::CrossoverConfig;

pub const CROSSOVER_HEADING: &str = "## Upcoming Crossovers";
pub const CROSSOVER_START_MARKER: &str = "<!-- START upcoming-crossovers -->";
pub const CROSSOVER_END_MARKER: &str = "<!-- END upcoming-crossovers -->";

/// Predicted date on which the leader overtakes one competitor.
#[derive(Debug, Clone, PartialEq)]
pub struct Crossover {
    pub competitor: String,
    pub date: NaiveDate,
    pub days_until: i64,
    /// Stars per day the leader gains on the competitor, averaged over the windows.
    pub daily_gain: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossoverForecast {
    pub leader: String,
    /// `None` when the series holds no rows at all.
    pub crossovers: Option<Vec<Crossover>>,
}

/// Forecasts when the leader column overtakes each other column of `table`.
///
/// For every window a least squares line is fitted to both columns over the
/// trailing `days` of history. A window yields a prediction when the leader
/// grows faster and closes the current gap within the horizon. The offsets of
/// all predicting windows are averaged. Competitors the leader is already
/// ahead of are left out.
pub fn predict_crossovers(table: &SeriesTable, config: &CrossoverConfig, today: NaiveDate) -> CrossoverForecast {
    let leader = display_name(&config.leader).to_string();
    let Some(latest) = table.records().iter().map(|record| record.date).max() else {
        return CrossoverForecast {
            leader,
            crossovers: None,
        };
    };

    let mut crossovers: Vec<Crossover> = table
        .schema()
        .columns()
        .iter()
        .filter(|column| **column != config.leader)
        .filter_map(|column| {
            let points = paired_points(table, &config.leader, column);
            let &(_, leader_now, competitor_now) = points.iter().max_by_key(|(date, ..)| *date)?;
            if leader_now >= competitor_now {
                return None;
            }

            let predictions: Vec<(i64, f64)> = config
                .windows
                .iter()
                .filter_map(|days| {
                    let cutoff = latest - Duration::days(*days);
                    let window: Vec<_> = points.iter().filter(|(date, ..)| *date >= cutoff).copied().collect();
                    predict_window(&window, competitor_now - leader_now, config.horizon_days)
                })
                .collect();
            if predictions.is_empty() {
                return None;
            }

            let count = predictions.len() as i64;
            let days_until = predictions.iter().map(|(days, _)| days).sum::<i64>() / count;
            let daily_gain = predictions.iter().map(|(_, gain)| gain).sum::<f64>() / count as f64;
            Some(Crossover {
                competitor: display_name(column).to_string(),
                date: today + Duration::days(days_until),
                days_until,
                daily_gain,
            })
        })
        .collect();

    crossovers.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.competitor.cmp(&b.competitor)));
    crossovers.truncate(config.limit);
    debug!(leader = %leader, predicted = crossovers.len(), "Forecast crossovers");
    CrossoverForecast {
        leader,
        crossovers: Some(crossovers),
    }
}

/// Rows where both columns hold a value, as `(date, leader, competitor)`.
fn paired_points(table: &SeriesTable, leader: &str, competitor: &str) -> Vec<(NaiveDate, f64, f64)> {
    table
        .records()
        .iter()
        .filter_map(|record| {
            let leader = record.get(leader)?.as_f64();
            let competitor = record.get(competitor)?.as_f64();
            Some((record.date, leader, competitor))
        })
        .collect()
}

/// Whole days until the gap closes and the daily gain, or `None` when this
/// window shows no crossing inside the horizon.
fn predict_window(window: &[(NaiveDate, f64, f64)], gap: f64, horizon_days: i64) -> Option<(i64, f64)> {
    let start = window.iter().map(|(date, ..)| *date).min()?;
    let xs: Vec<f64> = window
        .iter()
        .map(|(date, ..)| (*date - start).num_days() as f64)
        .collect();
    let leader: Vec<f64> = window.iter().map(|(_, value, _)| *value).collect();
    let competitor: Vec<f64> = window.iter().map(|(.., value)| *value).collect();

    if distinct(&xs) < 2 || distinct(&leader) < 2 || distinct(&competitor) < 2 {
        return None;
    }

    let daily_gain = slope(&xs, &leader) - slope(&xs, &competitor);
    if daily_gain <= 0.0 {
        return None;
    }
    let days = (gap / daily_gain).trunc();
    if days < 0.0 || days > horizon_days as f64 {
        return None;
    }
    Some((days as i64, daily_gain))
}

/// Least squares slope of `ys` over `xs`.
fn slope(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let (covariance, variance) = xs
        .iter()
        .zip(ys)
        .fold((0.0, 0.0), |(cov, var), (x, y)| {
            (cov + (x - mean_x) * (y - mean_y), var + (x - mean_x).powi(2))
        });
    covariance / variance
}

fn distinct(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    sorted.len()
}

/// `mise_stars` is shown as `mise`.
fn display_name(column: &str) -> &str {
    column.strip_suffix("_stars").unwrap_or(column)
}

impl CrossoverForecast {
    pub fn render_table(&self) -> String {
        let crossovers = match &self.crossovers {
            None => return "No competitor data available.".to_string(),
            Some(crossovers) if crossovers.is_empty() => return "No upcoming crossovers predicted.".to_string(),
            Some(crossovers) => crossovers,
        };

        let mut lines = vec![
            format!(
                "| Competitor | Expected Crossover | Days Until | {} lead gain (stars/day) |",
                self.leader
            ),
            "| --- | --- | --- | --- |".to_string(),
        ];
        for crossover in crossovers {
            lines.push(format!(
                "| {} | {} | {} | {:.1} |",
                crossover.competitor,
                crossover.date.format("%Y-%m-%d"),
                crossover.days_until,
                crossover.daily_gain
            ));
        }
        lines.join("\n")
    }

    /// The full README section, from the heading through the end marker.
    pub fn render_section(&self) -> String {
        [
            CROSSOVER_HEADING.to_string(),
            String::new(),
            CROSSOVER_START_MARKER.to_string(),
            String::new(),
            self.render_table(),
            String::new(),
            CROSSOVER_END_MARKER.to_string(),
        ]
        .join("\n")
    }
}
