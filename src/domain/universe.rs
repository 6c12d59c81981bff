//! Configured portfolios and resolution of the tickers they hold.
//!
//! A portfolio is an INI section named `portfolio.<name>`. Manual portfolios
//! list tickers directly; follow portfolios list manager codes whose current
//! holdings are fetched from a [`HoldingsSource`].

use crate::domain::error::InvestingError;
use crate::ports::config_port::ConfigPort;
use crate::ports::holdings_port::HoldingsSource;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::str::FromStr;

pub const PORTFOLIO_PREFIX: &str = "portfolio.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortfolioKind {
    Manual,
    Follow,
}

impl FromStr for PortfolioKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(PortfolioKind::Manual),
            "follow" => Ok(PortfolioKind::Follow),
            other => Err(format!("type must be follow or manual, got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioConfig {
    pub name: String,
    pub kind: PortfolioKind,
    /// Tickers for manual portfolios, manager codes for follow portfolios.
    pub symbols: Vec<String>,
    /// Follow only: keep just the tickers every manager holds.
    pub shared: bool,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

/// Split a comma separated ticker list, uppercasing each entry.
pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> InvestingError {
    InvestingError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Every `[portfolio.<name>]` section, sorted by name.
pub fn configured_portfolios(
    config: &dyn ConfigPort,
) -> Result<Vec<PortfolioConfig>, InvestingError> {
    let mut sections: Vec<String> = config
        .sections()
        .into_iter()
        .filter(|s| {
            s.get(..PORTFOLIO_PREFIX.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(PORTFOLIO_PREFIX))
        })
        .collect();
    sections.sort();

    sections
        .iter()
        .map(|section| {
            let name = section[PORTFOLIO_PREFIX.len()..].to_string();
            let kind = config
                .get_string(section, "type")
                .ok_or_else(|| InvestingError::ConfigMissing {
                    section: section.clone(),
                    key: "type".into(),
                })?
                .parse::<PortfolioKind>()
                .map_err(|reason| invalid(section, "type", reason))?;

            let raw = config.get_string(section, "symbols").unwrap_or_default();
            if raw.trim().is_empty() {
                return Err(invalid(section, "symbols", "symbols must be non-empty"));
            }
            let symbols = match kind {
                PortfolioKind::Manual => {
                    parse_codes(&raw).map_err(|e| invalid(section, "symbols", e.to_string()))?
                }
                // Manager codes are case sensitive
                PortfolioKind::Follow => raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            };

            Ok(PortfolioConfig {
                name,
                kind,
                symbols,
                shared: config.get_bool(section, "shared", false),
            })
        })
        .collect()
}

/// Unique, sorted tickers of the `selection` (every portfolio when empty).
pub fn load_portfolios(
    portfolios: &[PortfolioConfig],
    selection: &[String],
    holdings: &dyn HoldingsSource,
) -> Result<Vec<String>, InvestingError> {
    let selected: Vec<&PortfolioConfig> = if selection.is_empty() {
        portfolios.iter().collect()
    } else {
        selection
            .iter()
            .map(|name| {
                portfolios
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(name))
                    .ok_or_else(|| InvestingError::ConfigMissing {
                        section: format!("{PORTFOLIO_PREFIX}{}", name.to_lowercase()),
                        key: "type".into(),
                    })
            })
            .collect::<Result<_, _>>()?
    };

    let mut tickers = BTreeSet::new();
    for portfolio in selected {
        match portfolio.kind {
            PortfolioKind::Manual => tickers.extend(portfolio.symbols.iter().cloned()),
            PortfolioKind::Follow => tickers.extend(followed_tickers(portfolio, holdings)?),
        }
    }
    Ok(tickers.into_iter().collect())
}

fn followed_tickers(
    portfolio: &PortfolioConfig,
    holdings: &dyn HoldingsSource,
) -> Result<BTreeSet<String>, InvestingError> {
    let mut combined: Option<BTreeSet<String>> = None;
    for code in &portfolio.symbols {
        let held: BTreeSet<String> = holdings
            .holdings(code)?
            .into_iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        tracing::debug!("{}: manager {} holds {} tickers", portfolio.name, code, held.len());

        combined = Some(match combined {
            None => held,
            Some(acc) if portfolio.shared => acc.intersection(&held).cloned().collect(),
            Some(mut acc) => {
                acc.extend(held);
                acc
            }
        });
    }

    let tickers = combined.unwrap_or_default();
    if portfolio.shared && tickers.is_empty() {
        tracing::warn!("No shared holdings for portfolio {}", portfolio.name);
    }
    Ok(tickers)
}

/// Owning portfolio of each manual ticker; the first portfolio by name wins.
pub fn ticker_to_portfolio(portfolios: &[PortfolioConfig]) -> BTreeMap<String, String> {
    let mut owners = BTreeMap::new();
    for p in portfolios.iter().filter(|p| p.kind == PortfolioKind::Manual) {
        for symbol in &p.symbols {
            owners
                .entry(symbol.clone())
                .or_insert_with(|| p.name.clone());
        }
    }
    owners
}

/// Entries of a workflow request list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Request {
    pub portfolios: Vec<String>,
    pub tickers: Vec<String>,
}

/// Separate configured portfolio names from raw tickers in a comma list.
pub fn split_request(input: &str, portfolios: &[PortfolioConfig]) -> Request {
    let mut request = Request::default();
    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match portfolios.iter().find(|p| p.name.eq_ignore_ascii_case(token)) {
            Some(p) => request.portfolios.push(p.name.clone()),
            None => request.tickers.push(token.to_uppercase()),
        }
    }
    request
}
