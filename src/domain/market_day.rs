//! NYSE trading calendar.
//!
//! Trading days are weekdays that are not exchange holidays. Holidays are
//! derived from the exchange's rules rather than a downloaded calendar, so
//! one-off closures (national days of mourning, weather) are not known.

use crate::domain::error::InvestingError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Weekday};
use chrono_tz::America::New_York;

/// Symmetrical number of days searched around a reference date.
pub const SEARCH_DAYS: i64 = 7;

/// Regular session close in New York local time.
pub const MARKET_CLOSE_HOUR: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Latest,
    Next,
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Saturday holidays move to Friday, Sunday holidays to Monday.
fn observed(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    nth_weekday(year, month, weekday, 5).or_else(|| nth_weekday(year, month, weekday, 4))
}

/// Gregorian Easter Sunday (anonymous computus).
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    ymd(year, month as u32, day as u32)
}

/// Observed NYSE holidays falling in `year`.
pub fn holidays(year: i32) -> Vec<NaiveDate> {
    let mut days = Vec::with_capacity(10);

    // A Saturday New Year's Day is not observed on the preceding Friday
    if let Some(new_year) = ymd(year, 1, 1) {
        match new_year.weekday() {
            Weekday::Sat => {}
            _ => days.push(observed(new_year)),
        }
    }
    if year >= 1998 {
        days.extend(nth_weekday(year, 1, Weekday::Mon, 3));
    }
    days.extend(nth_weekday(year, 2, Weekday::Mon, 3));
    days.extend(easter_sunday(year).map(|d| d - Duration::days(2)));
    days.extend(last_weekday(year, 5, Weekday::Mon));
    if year >= 2022 {
        days.extend(ymd(year, 6, 19).map(observed));
    }
    days.extend(ymd(year, 7, 4).map(observed));
    days.extend(nth_weekday(year, 9, Weekday::Mon, 1));
    days.extend(nth_weekday(year, 11, Weekday::Thu, 4));
    days.extend(ymd(year, 12, 25).map(observed));

    days
}

pub fn is_holiday(date: NaiveDate) -> bool {
    holidays(date.year()).contains(&date)
}

pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !is_holiday(date)
}

/// Trading days in `[start, end]`, ascending.
pub fn trading_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_trading_day(*d))
        .collect()
}

/// Closest completed trading day relative to `reference`.
///
/// `Latest` is the most recent trading day on or before `reference`; when
/// that day is today in New York and the session has not closed yet, the
/// trading day before it is used. `Previous` and `Next` step one trading day
/// from there.
pub fn market_day<Tz: TimeZone>(
    direction: Direction,
    reference: NaiveDate,
    now: &DateTime<Tz>,
) -> Result<NaiveDate, InvestingError> {
    let window = Duration::days(SEARCH_DAYS);
    let recent = trading_days(reference - window, reference + window);
    let no_day = || InvestingError::NoMarketDay {
        reference,
        days: SEARCH_DAYS,
    };

    let mut idx = recent
        .iter()
        .rposition(|d| *d <= reference)
        .ok_or_else(no_day)?;

    let now_ny = now.with_timezone(&New_York);
    let close = NaiveTime::from_hms_opt(MARKET_CLOSE_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);
    if recent[idx] == now_ny.date_naive() && now_ny.time() < close {
        idx = idx.checked_sub(1).ok_or_else(no_day)?;
    }

    let idx = match direction {
        Direction::Latest => Some(idx),
        Direction::Previous => idx.checked_sub(1),
        Direction::Next => Some(idx + 1),
    };
    idx.and_then(|i| recent.get(i).copied()).ok_or_else(no_day)
}
