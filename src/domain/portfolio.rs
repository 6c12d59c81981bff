//! Weighted combination of tickers.
//!
//! Supports Monte Carlo estimation of joint returns and look-through of fund
//! holdings into company-level exposure.

use super::error::InvestingError;
use super::metrics;
use super::period::Period;
use super::ticker::Ticker;
use chrono::NaiveDate;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Weights must sum to one within this tolerance.
pub const WEIGHT_TOLERANCE: f64 = 1e-9;

/// Default minimum source weight for a company to count as duplicated.
pub const DUPLICATE_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone)]
pub struct Portfolio {
    tickers: Vec<Ticker>,
    weights: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpectedReturn {
    pub mean: f64,
    pub std_dev: f64,
    /// Smallest number of samples available to any single holding.
    pub min_count: usize,
}

/// A company held by the portfolio, directly or through a fund.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    /// The portfolio holding the company was found in.
    pub source: String,
    /// Weight of the company within its source.
    pub source_weight: f64,
    /// Weight of the company within the whole portfolio.
    pub portfolio_weight: f64,
}

/// Parse comma separated weights.
pub fn parse_weights(input: &str) -> Result<Vec<f64>, InvestingError> {
    input
        .split(',')
        .map(str::trim)
        .map(|w| {
            w.parse::<f64>().map_err(|_| InvestingError::InvalidWeights {
                reason: format!("'{w}' is not a number"),
            })
        })
        .collect()
}

impl Portfolio {
    /// Weights default to an even split.
    pub fn new(tickers: Vec<Ticker>, weights: Option<Vec<f64>>) -> Result<Self, InvestingError> {
        if tickers.is_empty() {
            return Err(InvestingError::InvalidWeights {
                reason: "portfolio needs at least one ticker".into(),
            });
        }
        let weights = match weights {
            None => vec![1.0 / tickers.len() as f64; tickers.len()],
            Some(w) if w.len() != tickers.len() => {
                return Err(InvestingError::InvalidWeights {
                    reason: format!(
                        "mismatch between number of tickers ({}) and weights ({})",
                        tickers.len(),
                        w.len()
                    ),
                });
            }
            Some(w) => {
                let total: f64 = w.iter().sum();
                if (total - 1.0).abs() > WEIGHT_TOLERANCE {
                    return Err(InvestingError::InvalidWeights {
                        reason: format!("weights must sum to 1 (got {total} instead)"),
                    });
                }
                w
            }
        };
        Ok(Self { tickers, weights })
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Human readable naming for all holdings, e.g. `AAPL=0.50, MSFT=0.50`.
    pub fn name(&self) -> String {
        self.tickers
            .iter()
            .zip(&self.weights)
            .map(|(t, w)| format!("{}={:.2}", t.symbol, w))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Bootstrap the weighted return over `period` from historical rolling returns.
    pub fn expected_return<R: Rng>(
        &self,
        period: &Period,
        trials: usize,
        as_of: NaiveDate,
        rng: &mut R,
    ) -> Result<ExpectedReturn, InvestingError> {
        let pools = self
            .tickers
            .iter()
            .map(|t| t.rolling_samples(period, as_of))
            .collect::<Result<Vec<_>, _>>()?;

        let missing: Vec<&str> = pools
            .iter()
            .zip(&self.tickers)
            .filter(|(pool, _)| pool.is_empty())
            .map(|(_, t)| t.symbol.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(InvestingError::TickerData {
                symbol: missing.join(", "),
                reason: format!("insufficient data for {period} period"),
            });
        }

        let composite: Vec<f64> = (0..trials)
            .map(|_| {
                pools
                    .iter()
                    .zip(&self.weights)
                    .map(|(pool, w)| w * pool[rng.gen_range(0..pool.len())])
                    .sum()
            })
            .collect();

        Ok(ExpectedReturn {
            mean: metrics::mean(&composite),
            std_dev: metrics::std_dev(&composite),
            min_count: pools.iter().map(Vec::len).min().unwrap_or(0),
        })
    }

    /// Expand funds into their constituents, keyed by company symbol.
    pub fn company_positions(&self) -> BTreeMap<String, Vec<Position>> {
        let mut positions: BTreeMap<String, Vec<Position>> = BTreeMap::new();
        for (ticker, &weight) in self.tickers.iter().zip(&self.weights) {
            match &ticker.holdings {
                None => positions
                    .entry(ticker.symbol.clone())
                    .or_default()
                    .push(Position {
                        source: ticker.symbol.clone(),
                        source_weight: 1.0,
                        portfolio_weight: weight,
                    }),
                Some(holdings) => {
                    for h in holdings {
                        positions
                            .entry(h.symbol.to_uppercase())
                            .or_default()
                            .push(Position {
                                source: ticker.symbol.clone(),
                                source_weight: h.pct,
                                portfolio_weight: h.pct * weight,
                            });
                    }
                }
            }
        }
        positions
    }

    /// Total weight of one company across the portfolio.
    pub fn exposure(&self, symbol: &str) -> Result<f64, InvestingError> {
        let symbol = symbol.to_uppercase();
        self.company_positions()
            .get(&symbol)
            .map(|sources| sources.iter().map(|s| s.portfolio_weight).sum())
            .ok_or_else(|| InvestingError::ticker_data(&symbol, "not found in company positions"))
    }

    /// Top `limit` companies by exposure, largest first.
    pub fn max_exposure(&self, limit: usize) -> Vec<(String, f64)> {
        let mut exposures: Vec<(String, f64)> = self
            .company_positions()
            .into_iter()
            .map(|(symbol, sources)| {
                let total = sources.iter().map(|s| s.portfolio_weight).sum();
                (symbol, total)
            })
            .collect();
        exposures.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        exposures.truncate(limit);
        exposures
    }

    /// Companies held through more than one source where at least one
    /// source weight reaches `threshold`.
    pub fn duplicate_positions(&self, threshold: f64) -> BTreeMap<String, Vec<Position>> {
        self.company_positions()
            .into_iter()
            .filter(|(_, sources)| {
                let held_by: BTreeSet<&str> = sources.iter().map(|s| s.source.as_str()).collect();
                held_by.len() > 1 && sources.iter().any(|s| s.source_weight >= threshold)
            })
            .collect()
    }
}

impl fmt::Display for Portfolio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Portfolio[{}]", self.name())
    }
}
