//! Incremental refresh of cached ticker data from remote price sources.

use crate::domain::error::InvestingError;
use crate::domain::ticker::Ticker;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::{OutputSize, PriceSource};
use crate::ports::store_port::PriceStore;
use chrono::{Duration, NaiveDate};
use tracing::{error, info};

/// Cached data older than this is re-downloaded in full.
pub const COMPACT_WINDOW_DAYS: i64 = 100;

pub struct Refresher<'a> {
    pub store: &'a dyn PriceStore,
    pub config: &'a dyn ConfigPort,
    pub stocks: &'a dyn PriceSource,
    pub metals: &'a dyn PriceSource,
    /// Symbols priced through the metals source.
    pub metal_symbols: Vec<String>,
    pub today: NaiveDate,
    /// Latest completed market day.
    pub latest_close: NaiveDate,
    /// Pause after each download, for free-tier rate limits.
    pub pause: std::time::Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    AlreadyCurrent,
    Refreshed { rows: usize },
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RefreshSummary {
    pub refreshed: Vec<String>,
    pub current: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl<'a> Refresher<'a> {
    pub fn is_metal(&self, symbol: &str) -> bool {
        self.metal_symbols
            .iter()
            .any(|m| m.eq_ignore_ascii_case(symbol))
    }

    /// Amount of history needed to bring `ticker` up to date.
    pub fn output_size(&self, ticker: &Ticker) -> OutputSize {
        match ticker.series.latest_date() {
            Some(latest) if ticker.has_csv => {
                if latest < self.today - Duration::days(COMPACT_WINDOW_DAYS) {
                    OutputSize::Full
                } else {
                    OutputSize::Compact
                }
            }
            _ => OutputSize::Full,
        }
    }

    /// Download, merge and save newer data. Idempotent when already current.
    pub fn refresh(&self, ticker: &mut Ticker) -> Result<RefreshOutcome, InvestingError> {
        if ticker.is_current(self.latest_close) {
            return Ok(RefreshOutcome::AlreadyCurrent);
        }

        let size = self.output_size(ticker);
        let source = if self.is_metal(&ticker.symbol) {
            self.metals
        } else {
            self.stocks
        };
        tracing::debug!(
            "Requesting {} history for {} from {}",
            size.as_str(),
            ticker.symbol,
            source.name()
        );

        let downloaded = source.daily_closes(&ticker.symbol, size)?;
        if downloaded.is_empty() {
            return Err(InvestingError::api(
                source.name(),
                format!("no prices returned for {}", ticker.symbol),
            ));
        }
        let rows = downloaded.len();
        ticker.series = ticker.series.merge(&downloaded);
        self.store.save(&ticker.symbol, &ticker.series)?;
        ticker.has_csv = true;
        Ok(RefreshOutcome::Refreshed { rows })
    }

    /// Refresh each symbol in turn. API failures are logged and skipped;
    /// anything else aborts.
    pub fn refresh_all(&self, symbols: &[String]) -> Result<RefreshSummary, InvestingError> {
        let mut summary = RefreshSummary::default();
        let total = symbols.len();
        if !self.pause.is_zero() {
            info!(
                "Sleeping for {} seconds between API calls (free tier limitation)",
                self.pause.as_secs()
            );
        }

        for (i, symbol) in symbols.iter().enumerate() {
            let position = i + 1;
            let mut ticker = Ticker::load(self.store, self.config, symbol)?;
            match self.refresh(&mut ticker) {
                Ok(RefreshOutcome::AlreadyCurrent) => {
                    info!("{position}/{total}: {} already up-to-date", ticker.symbol);
                    summary.current.push(ticker.symbol);
                }
                Ok(RefreshOutcome::Refreshed { rows }) => {
                    info!("{position}/{total}: refreshed {} ({rows} rows)", ticker.symbol);
                    summary.refreshed.push(ticker.symbol);
                    if !self.pause.is_zero() && position < total {
                        std::thread::sleep(self.pause);
                    }
                }
                Err(e @ InvestingError::Api { .. }) => {
                    error!("Timeseries download error, skipping {}: {e}", ticker.symbol);
                    summary.failed.push((ticker.symbol, e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(summary)
    }
}
