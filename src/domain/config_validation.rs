//! Configuration validation.
//!
//! Runs before every workflow except `configure` and `show-config`. API keys
//! are checked later, when a client for that API is built.

use crate::domain::error::InvestingError;
use crate::domain::metrics::parse_metrics;
use crate::domain::universe::{configured_portfolios, PORTFOLIO_PREFIX};
use crate::ports::config_port::ConfigPort;
use std::path::{Path, PathBuf};

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), InvestingError> {
    save_dir(config)?;
    validate_locale(config)?;
    validate_numbers(config)?;
    validate_metrics(config)?;
    validate_portfolios(config)?;
    Ok(())
}

/// The existing directory holding cached data and the log file.
pub fn save_dir(config: &dyn ConfigPort) -> Result<PathBuf, InvestingError> {
    let raw = config
        .get_string("paths", "save")
        .ok_or_else(|| InvestingError::ConfigMissing {
            section: "paths".into(),
            key: "save".into(),
        })?;
    let path = PathBuf::from(raw.trim());
    if !Path::new(&path).is_dir() {
        return Err(InvestingError::ConfigInvalid {
            section: "paths".into(),
            key: "save".into(),
            reason: format!("{} is not an existing directory", path.display()),
        });
    }
    Ok(path)
}

fn validate_locale(config: &dyn ConfigPort) -> Result<(), InvestingError> {
    if let Some(locale) = config.get_string("general", "locale") {
        locale
            .trim()
            .parse::<chrono_tz::Tz>()
            .map_err(|_| InvestingError::ConfigInvalid {
                section: "general".into(),
                key: "locale".into(),
                reason: format!("unknown timezone {locale}"),
            })?;
    }
    Ok(())
}

fn validate_numbers(config: &dyn ConfigPort) -> Result<(), InvestingError> {
    if config.get_int("general", "pause_seconds", 0) < 0 {
        return Err(InvestingError::ConfigInvalid {
            section: "general".into(),
            key: "pause_seconds".into(),
            reason: "pause_seconds must be non-negative".into(),
        });
    }
    if config.get_int("general", "request_timeout_seconds", 1) < 1 {
        return Err(InvestingError::ConfigInvalid {
            section: "general".into(),
            key: "request_timeout_seconds".into(),
            reason: "request_timeout_seconds must be at least 1".into(),
        });
    }
    Ok(())
}

fn validate_metrics(config: &dyn ConfigPort) -> Result<(), InvestingError> {
    if let Some(metrics) = config.get_string("general", "metrics") {
        parse_metrics(&metrics)?;
    }
    Ok(())
}

fn validate_portfolios(config: &dyn ConfigPort) -> Result<(), InvestingError> {
    for portfolio in configured_portfolios(config)? {
        let section = format!("{PORTFOLIO_PREFIX}{}", portfolio.name);
        let valid_name = !portfolio.name.is_empty()
            && portfolio
                .name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid_name {
            return Err(InvestingError::ConfigInvalid {
                section,
                key: "name".into(),
                reason: "portfolio names may only contain a-z, 0-9 and _".into(),
            });
        }
        if config.get_string("names", &portfolio.name).is_some() {
            return Err(InvestingError::ConfigInvalid {
                section,
                key: "name".into(),
                reason: format!("portfolio name {} is also a ticker", portfolio.name),
            });
        }
    }
    Ok(())
}
