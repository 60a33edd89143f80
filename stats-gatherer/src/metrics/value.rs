use oss_stats_config::Polarity;
use serde::{
    Serialize,
    Serializer,
};
use std::{
    fmt,
    str::FromStr,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a number")]
pub struct ParseMetricError(pub String);

/// A single numeric cell of a series.
///
/// Decimals remember how many fraction digits they were written with so that
/// `1.20` is written back as `1.20` and not `1.2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Count(i64),
    Decimal { value: f64, scale: usize },
}

impl MetricValue {
    pub fn decimal(value: f64, scale: usize) -> Self {
        let factor = 10f64.powi(scale as i32);
        let mut value = (value * factor).round() / factor;
        if value == 0.0 {
            // avoid writing "-0.00"
            value = 0.0;
        }
        MetricValue::Decimal { value, scale }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Count(count) => *count as f64,
            MetricValue::Decimal { value, .. } => *value,
        }
    }

    pub fn as_count(&self) -> Option<i64> {
        match self {
            MetricValue::Count(count) => Some(*count),
            MetricValue::Decimal { .. } => None,
        }
    }

    fn scale(&self) -> usize {
        match self {
            MetricValue::Count(_) => 0,
            MetricValue::Decimal { scale, .. } => *scale,
        }
    }

    /// Signed change from `previous` to `current`, oriented so that a positive
    /// result is always an improvement for the given polarity.
    pub fn change(previous: MetricValue, current: MetricValue, polarity: Polarity) -> MetricValue {
        let (from, to) = match polarity {
            Polarity::HigherIsBetter => (previous, current),
            Polarity::LowerIsBetter => (current, previous),
        };
        match (from, to) {
            (MetricValue::Count(from), MetricValue::Count(to)) => MetricValue::Count(to - from),
            _ => MetricValue::decimal(to.as_f64() - from.as_f64(), from.scale().max(to.scale())),
        }
    }
}

impl FromStr for MetricValue {
    type Err = ParseMetricError;

    /// Accepts thousands separators, as used by the Homebrew feed (`"45,678"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
        if cleaned.is_empty() {
            return Err(ParseMetricError(s.to_string()));
        }
        match cleaned.split_once('.') {
            Some((_, fraction)) => {
                let value = cleaned.parse::<f64>().map_err(|_| ParseMetricError(s.to_string()))?;
                if !value.is_finite() {
                    return Err(ParseMetricError(s.to_string()));
                }
                Ok(MetricValue::Decimal {
                    value,
                    scale: fraction.len(),
                })
            }
            None => cleaned
                .parse::<i64>()
                .map(MetricValue::Count)
                .map_err(|_| ParseMetricError(s.to_string())),
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(count) => write!(f, "{count}"),
            MetricValue::Decimal { value, scale } => write!(f, "{value:.scale$}"),
        }
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Count(count) => serializer.serialize_i64(*count),
            MetricValue::Decimal { value, .. } => serializer.serialize_f64(*value),
        }
    }
}

/// Formats a count with `,` thousands separators.
pub fn with_thousands(count: i64) -> String {
    let digits = count.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if count < 0 {
        format!("-{out}")
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_brew_formatted_counts() {
        assert_eq!("45,678".parse::<MetricValue>().unwrap(), MetricValue::Count(45678));
        assert_eq!("9000".parse::<MetricValue>().unwrap(), MetricValue::Count(9000));
        assert_eq!(
            "1.23".parse::<MetricValue>().unwrap(),
            MetricValue::Decimal {
                value: 1.23,
                scale: 2
            }
        );
        assert!("".parse::<MetricValue>().is_err());
        assert!("n/a".parse::<MetricValue>().is_err());
    }

    #[test]
    fn decimals_keep_their_written_precision() {
        assert_eq!("1.20".parse::<MetricValue>().unwrap().to_string(), "1.20");
        assert_eq!("0.5".parse::<MetricValue>().unwrap().to_string(), "0.5");
    }

    #[test]
    fn rank_improvement_is_positive() {
        let change = MetricValue::change(MetricValue::Count(5), MetricValue::Count(3), Polarity::LowerIsBetter);
        assert_eq!(change, MetricValue::Count(2));
    }

    #[test]
    fn count_change_is_current_minus_previous() {
        let change = MetricValue::change(
            MetricValue::Count(9000),
            MetricValue::Count(8990),
            Polarity::HigherIsBetter,
        );
        assert_eq!(change, MetricValue::Count(-10));
    }

    #[test]
    fn decimal_change_is_rounded_to_input_scale() {
        let change = MetricValue::change(
            "1.1".parse().unwrap(),
            "1.30".parse().unwrap(),
            Polarity::HigherIsBetter,
        );
        assert_eq!(change.to_string(), "0.20");

        let unchanged = MetricValue::change(
            "1.23".parse().unwrap(),
            "1.23".parse().unwrap(),
            Polarity::HigherIsBetter,
        );
        assert_eq!(unchanged.to_string(), "0.00");
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(with_thousands(0), "0");
        assert_eq!(with_thousands(999), "999");
        assert_eq!(with_thousands(1000), "1,000");
        assert_eq!(with_thousands(1234567), "1,234,567");
        assert_eq!(with_thousands(-45678), "-45,678");
    }
}
