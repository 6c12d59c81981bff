//! Daily closing price series.

use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }
}

/// Prices ordered by ascending date with at most one point per date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Sort by date; for duplicate dates the point appearing last wins.
    pub fn new(points: Vec<PricePoint>) -> Self {
        let by_date: BTreeMap<NaiveDate, f64> =
            points.into_iter().map(|p| (p.date, p.price)).collect();
        Self::from_map(by_date)
    }

    fn from_map(by_date: BTreeMap<NaiveDate, f64>) -> Self {
        Self {
            points: by_date
                .into_iter()
                .map(|(date, price)| PricePoint { date, price })
                .collect(),
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Union of both series; `newer` overrides prices on shared dates.
    pub fn merge(&self, newer: &PriceSeries) -> PriceSeries {
        let mut by_date: BTreeMap<NaiveDate, f64> =
            self.points.iter().map(|p| (p.date, p.price)).collect();
        for p in &newer.points {
            by_date.insert(p.date, p.price);
        }
        Self::from_map(by_date)
    }

    /// Closest available date to `target`. Ties resolve to the earlier date.
    pub fn nearest(&self, target: NaiveDate) -> Option<NaiveDate> {
        let idx = self.points.partition_point(|p| p.date < target);
        let after = self.points.get(idx);
        if let Some(p) = after {
            if p.date == target {
                return Some(target);
            }
        }
        let before = idx.checked_sub(1).and_then(|i| self.points.get(i));
        match (before, after) {
            (Some(b), Some(a)) => {
                if (target - b.date) <= (a.date - target) {
                    Some(b.date)
                } else {
                    Some(a.date)
                }
            }
            (Some(b), None) => Some(b.date),
            (None, Some(a)) => Some(a.date),
            (None, None) => None,
        }
    }

    /// Price on `date`, or on the nearest available date unless `exact`.
    pub fn price(&self, date: NaiveDate, exact: bool) -> Option<f64> {
        let date = if exact { date } else { self.nearest(date)? };
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].price)
    }
}

/// Lenient price parsing: every character other than digits and `.` is dropped.
pub fn parse_price(raw: &str) -> Option<f64> {
    let clean: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if !clean.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    clean.parse().ok()
}
