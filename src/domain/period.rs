//! Financial period keywords and their conversion to days.
//!
//! A period is either a bare number of days (`"45"`) or a keyword with an
//! optional multiplier separated by a dash (`"year"`, `"6-month"`, `"ytd"`).

use crate::domain::error::InvestingError;
use chrono::{Datelike, Duration, Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

pub const DAYS_PER_YEAR: f64 = 365.0;

/// Longest accepted period, one hundred years of days.
pub const MAX_PERIOD_DAYS: i64 = 100 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodUnit {
    Day,
    Week,
    Month,
    Quarter,
    Year,
    YearToDate,
}

impl PeriodUnit {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "day" => Some(PeriodUnit::Day),
            "week" => Some(PeriodUnit::Week),
            "month" => Some(PeriodUnit::Month),
            "quarter" => Some(PeriodUnit::Quarter),
            "year" => Some(PeriodUnit::Year),
            "ytd" => Some(PeriodUnit::YearToDate),
            _ => None,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            PeriodUnit::Day => "day",
            PeriodUnit::Week => "week",
            PeriodUnit::Month => "month",
            PeriodUnit::Quarter => "quarter",
            PeriodUnit::Year => "year",
            PeriodUnit::YearToDate => "ytd",
        }
    }

    /// Length of one unit in days. `today` only matters for year-to-date.
    pub fn days(self, today: NaiveDate) -> i64 {
        match self {
            PeriodUnit::YearToDate => {
                let jan_first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                (today - jan_first).num_days()
            }
            unit => unit.longest_days(),
        }
    }

    fn longest_days(self) -> i64 {
        match self {
            PeriodUnit::Day => 1,
            PeriodUnit::Week => 7,
            PeriodUnit::Month => 30,
            PeriodUnit::Quarter => 91,
            PeriodUnit::Year => 365,
            PeriodUnit::YearToDate => 366,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Days(i64),
    Keyword { multiplier: u32, unit: PeriodUnit },
}

impl Period {
    pub fn days(&self, today: NaiveDate) -> i64 {
        match *self {
            Period::Days(days) => days,
            Period::Keyword { multiplier, unit } => i64::from(multiplier) * unit.days(today),
        }
    }

    /// Calendar start of a trailing window ending on `end`.
    ///
    /// Day, month and year keywords step back on the calendar (one month
    /// before Mar 31 is the last day of February); every other period
    /// subtracts its length in days.
    pub fn trailing_start(&self, end: NaiveDate) -> NaiveDate {
        match *self {
            Period::Keyword {
                multiplier,
                unit: PeriodUnit::Day,
            } => days_before(end, i64::from(multiplier)),
            Period::Keyword {
                multiplier,
                unit: PeriodUnit::Month,
            } => end
                .checked_sub_months(Months::new(multiplier))
                .unwrap_or(NaiveDate::MIN),
            Period::Keyword {
                multiplier,
                unit: PeriodUnit::Year,
            } => end
                .checked_sub_months(Months::new(multiplier.saturating_mul(12)))
                .unwrap_or(NaiveDate::MIN),
            _ => days_before(end, self.days(end)),
        }
    }
}

/// `days` calendar days before `date`, clamped to the earliest representable date.
pub fn days_before(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|delta| date.checked_sub_signed(delta))
        .unwrap_or(NaiveDate::MIN)
}

impl FromStr for Period {
    type Err = InvestingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = |reason: &str| InvestingError::InvalidPeriod {
            period: s.to_string(),
            reason: reason.to_string(),
        };

        if let Ok(days) = text.parse::<i64>() {
            if days <= 0 {
                return Err(invalid("number of days must be positive"));
            }
            if days > MAX_PERIOD_DAYS {
                return Err(invalid("period is longer than 100 years"));
            }
            return Ok(Period::Days(days));
        }

        let (multiplier, keyword) = match text.split_once('-') {
            Some((m, k)) => {
                let m: u32 = m
                    .trim()
                    .parse()
                    .map_err(|_| invalid("multiplier must be a positive integer"))?;
                if m == 0 {
                    return Err(invalid("multiplier must be a positive integer"));
                }
                (m, k.trim())
            }
            None => (1, text),
        };

        let unit = PeriodUnit::from_keyword(&keyword.to_lowercase())
            .ok_or_else(|| invalid("string does not match supported formats"))?;
        if i64::from(multiplier) * unit.longest_days() > MAX_PERIOD_DAYS {
            return Err(invalid("period is longer than 100 years"));
        }

        Ok(Period::Keyword { multiplier, unit })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Period::Days(days) => write!(f, "{days}"),
            Period::Keyword { multiplier: 1, unit } => write!(f, "{}", unit.keyword()),
            Period::Keyword { multiplier, unit } => write!(f, "{}-{}", multiplier, unit.keyword()),
        }
    }
}

/// Number of days in a period string, relative to `today`.
pub fn parse_period(text: &str, today: NaiveDate) -> Result<i64, InvestingError> {
    Ok(text.parse::<Period>()?.days(today))
}

/// Convert a raw return over `days` to a compounded annual rate.
pub fn annualize(total_return: f64, days: i64) -> f64 {
    if days <= 0 {
        return f64::NAN;
    }
    let years = days as f64 / DAYS_PER_YEAR;
    (1.0 + total_return).powf(1.0 / years) - 1.0
}
