//! Metals API `timeseries` client for precious metals.
//!
//! Rates are quoted per unit of the base currency, so the price of a metal
//! is `rates[base] / rates[metal]`.

use crate::adapters::http;
use crate::domain::error::InvestingError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::{OutputSize, PriceSource};
use chrono::{Duration, NaiveDate};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::BTreeMap;

const API: &str = "Metals API";

pub const DEFAULT_BASE: &str = "USD";

/// Days of history available on the free tier.
pub const LOOK_BACK_DAYS: i64 = 5;

#[derive(Deserialize)]
struct TimeseriesEnvelope {
    success: Option<bool>,
    rates: Option<BTreeMap<String, BTreeMap<String, f64>>>,
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    code: Option<i64>,
    info: Option<String>,
}

pub struct MetalsApiAdapter {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    base: String,
    today: NaiveDate,
}

impl MetalsApiAdapter {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        api_key: Option<String>,
        today: NaiveDate,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
            base: DEFAULT_BASE.to_string(),
            today,
        }
    }

    pub fn from_config(
        config: &dyn ConfigPort,
        client: Client,
        today: NaiveDate,
    ) -> Result<Self, InvestingError> {
        Ok(Self::new(
            client,
            http::endpoint(config, "metals")?,
            config.get_string("keys", "metals"),
            today,
        ))
    }

    /// `(start, end)` of the request window; the end is at most yesterday.
    pub fn window(&self) -> (NaiveDate, NaiveDate) {
        let end = self.today - Duration::days(1);
        (end - Duration::days(LOOK_BACK_DAYS), end)
    }
}

fn parse_timeseries(symbol: &str, base: &str, body: &str) -> Result<PriceSeries, InvestingError> {
    let envelope: TimeseriesEnvelope = http::parse_json(API, body)?;
    if envelope.success == Some(false) || envelope.error.is_some() {
        let (code, info) = envelope
            .error
            .map(|e| (e.code.unwrap_or_default(), e.info.unwrap_or_default()))
            .unwrap_or_default();
        return Err(InvestingError::api(API, format!("error {code}: {info}")));
    }
    let rates = envelope
        .rates
        .ok_or_else(|| InvestingError::api(API, "response has no rates"))?;

    rates
        .into_iter()
        .map(|(date, quotes)| {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|_| InvestingError::api(API, format!("invalid date '{date}'")))?;
            let metal = quotes
                .get(symbol)
                .copied()
                .filter(|r| *r > 0.0)
                .ok_or_else(|| InvestingError::api(API, format!("no {symbol} rate on {date}")))?;
            let base_rate = quotes.get(base).copied().unwrap_or(1.0);
            Ok(PricePoint::new(date, base_rate / metal))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(PriceSeries::new)
}

impl PriceSource for MetalsApiAdapter {
    fn name(&self) -> &str {
        API
    }

    fn daily_closes(&self, symbol: &str, size: OutputSize) -> Result<PriceSeries, InvestingError> {
        let key = http::require_key(&self.api_key, "metals")?;
        if size == OutputSize::Full {
            tracing::debug!("{API} only serves {LOOK_BACK_DAYS} days of history");
        }
        let symbol = symbol.to_uppercase();
        let (start, end) = self.window();
        let (start, end) = (start.to_string(), end.to_string());
        let body = http::get_text(
            &self.client,
            API,
            &self.endpoint,
            &[
                ("access_key", &key),
                ("base", &self.base),
                ("symbols", &symbol),
                ("start_date", &start),
                ("end_date", &end),
            ],
        )?;
        parse_timeseries(&symbol, &self.base, &body)
    }
}
