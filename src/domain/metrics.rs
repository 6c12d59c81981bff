//! Performance metrics over a price series.
//!
//! Metric names follow `type/period[/options]`, for example
//! `trailing/1-year`, `rolling/quarter` or `trailing/5-year/a` where the
//! `a` option annualizes the result.

use super::error::InvestingError;
use super::period::Period;
use super::price::PriceSeries;
use chrono::{Duration, NaiveDate};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Point-to-point return ending on the evaluation date.
    Trailing,
    /// Mean of every historical window of the same length.
    Rolling,
}

impl MetricKind {
    fn as_str(self) -> &'static str {
        match self {
            MetricKind::Trailing => "trailing",
            MetricKind::Rolling => "rolling",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSpec {
    pub kind: MetricKind,
    pub period: Period,
    pub annualized: bool,
    name: String,
}

impl MetricSpec {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for MetricSpec {
    type Err = InvestingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let mut parts = name.split('/');
        let (kind, period) = match (parts.next(), parts.next()) {
            (Some(k), Some(p)) if !k.is_empty() && !p.is_empty() => (k, p),
            _ => {
                return Err(InvestingError::InvalidMetric {
                    name: name.to_string(),
                })
            }
        };

        let kind = match kind {
            "trailing" => MetricKind::Trailing,
            "rolling" => MetricKind::Rolling,
            other => {
                return Err(InvestingError::UnknownMetric {
                    kind: other.to_string(),
                })
            }
        };
        let period: Period = period.parse()?;

        let mut annualized = false;
        for option in parts {
            if option == "a" {
                annualized = true;
            } else {
                tracing::warn!("Ignoring unknown metric option '{option}' in {name}");
            }
        }

        Ok(MetricSpec {
            kind,
            period,
            annualized,
            name: name.to_string(),
        })
    }
}

impl fmt::Display for MetricSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.as_str(), self.period)?;
        if self.annualized {
            write!(f, "/a")?;
        }
        Ok(())
    }
}

/// Parse a comma separated list of metric names.
pub fn parse_metrics(input: &str) -> Result<Vec<MetricSpec>, InvestingError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

/// Return between the nearest prices to `start` and `end`.
pub fn trailing_return(series: &PriceSeries, start: NaiveDate, end: NaiveDate) -> Option<f64> {
    let end_price = series.price(end, false)?;
    let start_price = series.price(start, false)?;
    Some((end_price - start_price) / start_price)
}

/// Every rolling return whose window spans `days` calendar days.
///
/// For each observation the window starts at the latest observation on or
/// before `date - days`. Observations without such a start are skipped.
pub fn rolling_returns(series: &PriceSeries, days: i64) -> Vec<f64> {
    let points = series.points();
    points
        .iter()
        .filter_map(|p| {
            let target = p.date.checked_sub_signed(Duration::try_days(days)?)?;
            let idx = points.partition_point(|q| q.date <= target);
            let start = points.get(idx.checked_sub(1)?)?;
            Some((p.price - start.price) / start.price)
        })
        .collect()
}

/// Arithmetic mean, `NaN` when empty.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation, `NaN` when empty.
pub fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    if m.is_nan() {
        return f64::NAN;
    }
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Human-readable percentage of a decimal return.
pub fn format_percent(p: f64, decimals: usize) -> String {
    if p.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.*}", decimals, p * 100.0)
    }
}
