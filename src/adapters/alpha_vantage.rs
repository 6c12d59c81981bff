//! Alpha Vantage `TIME_SERIES_DAILY` client for stocks and ETFs.

use crate::adapters::http;
use crate::domain::error::InvestingError;
use crate::domain::price::{parse_price, PricePoint, PriceSeries};
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::{OutputSize, PriceSource};
use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::BTreeMap;

const API: &str = "Alpha Vantage";

#[derive(Deserialize)]
struct DailyEnvelope {
    #[serde(rename = "Time Series (Daily)")]
    series: Option<BTreeMap<String, DailyBar>>,
    #[serde(rename = "Error Message")]
    error: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Deserialize)]
struct DailyBar {
    #[serde(rename = "4. close")]
    close: String,
}

pub struct AlphaVantageAdapter {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl AlphaVantageAdapter {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }

    pub fn from_config(config: &dyn ConfigPort, client: Client) -> Result<Self, InvestingError> {
        Ok(Self::new(
            client,
            http::endpoint(config, "alpha_vantage")?,
            config.get_string("keys", "alpha_vantage"),
        ))
    }
}

fn parse_daily(symbol: &str, body: &str) -> Result<PriceSeries, InvestingError> {
    let envelope: DailyEnvelope = http::parse_json(API, body)?;
    let Some(series) = envelope.series else {
        let reason = envelope
            .error
            .or(envelope.note)
            .or(envelope.information)
            .unwrap_or_else(|| "missing daily time series".to_string());
        return Err(InvestingError::api(
            API,
            format!("data could not be loaded for {symbol}: {reason}"),
        ));
    };

    series
        .into_iter()
        .map(|(date, bar)| {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|_| InvestingError::api(API, format!("invalid date '{date}'")))?;
            let price = parse_price(&bar.close).ok_or_else(|| {
                InvestingError::api(API, format!("invalid close '{}' on {date}", bar.close))
            })?;
            Ok(PricePoint::new(date, price))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(PriceSeries::new)
}

impl PriceSource for AlphaVantageAdapter {
    fn name(&self) -> &str {
        API
    }

    fn daily_closes(&self, symbol: &str, size: OutputSize) -> Result<PriceSeries, InvestingError> {
        let key = http::require_key(&self.api_key, "alpha_vantage")?;
        let symbol = symbol.to_uppercase();
        let body = http::get_text(
            &self.client,
            API,
            &self.endpoint,
            &[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", &symbol),
                ("outputsize", size.as_str()),
                ("apikey", &key),
            ],
        )?;
        parse_daily(&symbol, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_closing_prices() {
        let body = r#"{
            "Meta Data": {"2. Symbol": "IBM"},
            "Time Series (Daily)": {
                "2024-01-03": {"1. open": "161.0", "4. close": "160.10"},
                "2024-01-02": {"1. open": "162.8", "4. close": "158.16"}
            }
        }"#;
        let series = parse_daily("IBM", body).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(
            series.points()[0].date,
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
        assert_eq!(series.points()[1].price, 160.10);
    }

    #[test]
    fn error_message_payload_is_api_error() {
        let body = r#"{"Error Message": "Invalid API call."}"#;
        let err = parse_daily("NOPE", body).unwrap_err();
        assert!(
            matches!(err, InvestingError::Api { reason, .. } if reason.contains("Invalid API call") && reason.contains("NOPE"))
        );
    }

    #[test]
    fn rate_limit_note_is_api_error() {
        let body = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute"}"#;
        assert!(matches!(
            parse_daily("IBM", body),
            Err(InvestingError::Api { .. })
        ));
    }

    #[test]
    fn missing_key_is_config_error() {
        let adapter = AlphaVantageAdapter::new(Client::new(), "http://localhost:1", None);
        let err = adapter.daily_closes("IBM", OutputSize::Compact).unwrap_err();
        assert!(matches!(err, InvestingError::ConfigMissing { key, .. } if key == "alpha_vantage"));
    }
}
