//! A single ticker's cached price history and the statistics derived from it.
//!
//! Data is only refreshed on explicit request (see [`crate::domain::refresh`]):
//! free-tier APIs limit calls per minute, so loading a `Ticker` never touches
//! the network.

use crate::domain::error::InvestingError;
use crate::domain::metrics::{self, MetricKind, MetricSpec};
use crate::domain::period::{annualize, Period};
use crate::domain::price::PriceSeries;
use crate::ports::config_port::ConfigPort;
use crate::ports::store_port::PriceStore;
use chrono::NaiveDate;

pub const UNKNOWN_NAME: &str = "Unknown";

/// One constituent of a fund.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub symbol: String,
    /// Fraction of the fund, 0..1.
    pub pct: f64,
}

#[derive(Debug, Clone)]
pub struct Ticker {
    pub symbol: String,
    pub name: String,
    pub series: PriceSeries,
    pub holdings: Option<Vec<Holding>>,
    /// Whether the series came from the local cache.
    pub has_csv: bool,
}

/// Display name from the `[names]` config section.
pub fn name_for(config: &dyn ConfigPort, symbol: &str) -> String {
    config
        .get_string("names", &symbol.to_lowercase())
        .unwrap_or_else(|| UNKNOWN_NAME.to_string())
}

impl Ticker {
    pub fn new(symbol: &str, name: impl Into<String>, series: PriceSeries) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            name: name.into(),
            series,
            holdings: None,
            has_csv: false,
        }
    }

    /// Load the cached series and holdings for `symbol`.
    pub fn load(
        store: &dyn PriceStore,
        config: &dyn ConfigPort,
        symbol: &str,
    ) -> Result<Self, InvestingError> {
        let symbol = symbol.trim().to_uppercase();
        let cached = store.load(&symbol)?;
        let has_csv = cached.is_some();
        let mut ticker = Ticker::new(&symbol, name_for(config, &symbol), cached.unwrap_or_default());
        ticker.has_csv = has_csv;
        ticker.holdings = store.load_holdings(&symbol)?;
        Ok(ticker)
    }

    /// Whether the latest cached date reaches the latest completed market day.
    pub fn is_current(&self, latest_close: NaiveDate) -> bool {
        self.series
            .latest_date()
            .is_some_and(|latest| latest_close <= latest)
    }

    /// Price on `date`, falling back to the nearest date unless `exact`.
    pub fn price(&self, date: NaiveDate, exact: bool) -> Result<f64, InvestingError> {
        if !exact {
            if let Some(latest) = self.series.latest_date() {
                if date > latest {
                    tracing::warn!(
                        "{}: target date {} exceeds latest downloaded {}",
                        self.symbol,
                        date,
                        latest
                    );
                }
            }
        }
        self.series.price(date, exact).ok_or_else(|| {
            InvestingError::ticker_data(&self.symbol, format!("requested date {date} not in data"))
        })
    }

    fn require_data(&self) -> Result<(), InvestingError> {
        if self.series.is_empty() {
            return Err(InvestingError::ticker_data(
                &self.symbol,
                "no data available, try downloading it first",
            ));
        }
        Ok(())
    }

    /// Evaluate a metric as of `as_of` (normally today).
    pub fn metric(&self, spec: &MetricSpec, as_of: NaiveDate) -> Result<f64, InvestingError> {
        self.require_data()?;
        let result = match spec.kind {
            MetricKind::Trailing => self.trailing(&spec.period, as_of)?,
            MetricKind::Rolling => metrics::mean(&self.rolling_samples(&spec.period, as_of)?),
        };
        if spec.annualized {
            Ok(annualize(result, spec.period.days(as_of)))
        } else {
            Ok(result)
        }
    }

    /// Parse `name` and evaluate it.
    pub fn metric_named(&self, name: &str, as_of: NaiveDate) -> Result<f64, InvestingError> {
        self.metric(&name.parse()?, as_of)
    }

    fn trailing(&self, period: &Period, end: NaiveDate) -> Result<f64, InvestingError> {
        let end_price = self.price(end, false)?;
        let trail_price = self.price(period.trailing_start(end), false)?;
        Ok((end_price - trail_price) / trail_price)
    }

    /// Every rolling return for `period`, oldest first.
    pub fn rolling_samples(
        &self,
        period: &Period,
        as_of: NaiveDate,
    ) -> Result<Vec<f64>, InvestingError> {
        self.require_data()?;
        Ok(metrics::rolling_returns(&self.series, period.days(as_of)))
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ticker({})", self.symbol)
    }
}
