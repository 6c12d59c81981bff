//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for investing.
#[derive(Debug, thiserror::Error)]
pub enum InvestingError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("{api} API error: {reason}")]
    Api { api: String, reason: String },

    #[error("ticker data error for {symbol}: {reason}")]
    TickerData { symbol: String, reason: String },

    #[error("invalid period '{period}': {reason}")]
    InvalidPeriod { period: String, reason: String },

    #[error("metric {name} does not match type/period/options format")]
    InvalidMetric { name: String },

    #[error("no metric defined for {kind}")]
    UnknownMetric { kind: String },

    #[error("invalid weights: {reason}")]
    InvalidWeights { reason: String },

    #[error("no valid market days within {days} days of {reference}")]
    NoMarketDay { reference: NaiveDate, days: i64 },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl InvestingError {
    pub fn api(api: &str, reason: impl Into<String>) -> Self {
        InvestingError::Api {
            api: api.to_string(),
            reason: reason.into(),
        }
    }

    pub fn ticker_data(symbol: &str, reason: impl Into<String>) -> Self {
        InvestingError::TickerData {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&InvestingError> for std::process::ExitCode {
    fn from(err: &InvestingError) -> Self {
        let code: u8 = match err {
            InvestingError::Io(_) | InvestingError::Csv(_) => 1,
            InvestingError::ConfigParse { .. }
            | InvestingError::ConfigMissing { .. }
            | InvestingError::ConfigInvalid { .. } => 2,
            InvestingError::Api { .. } => 3,
            InvestingError::InvalidPeriod { .. }
            | InvestingError::InvalidMetric { .. }
            | InvestingError::UnknownMetric { .. }
            | InvestingError::InvalidWeights { .. } => 4,
            InvestingError::TickerData { .. } | InvestingError::NoMarketDay { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
