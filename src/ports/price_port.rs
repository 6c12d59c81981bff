//! Remote price source port trait.

use crate::domain::error::InvestingError;
use crate::domain::price::PriceSeries;

/// How much history to request from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSize {
    /// Roughly the last 100 trading days.
    Compact,
    /// The full available history.
    Full,
}

impl OutputSize {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

pub trait PriceSource {
    /// Display name used in logs and errors.
    fn name(&self) -> &str;

    fn daily_closes(&self, symbol: &str, size: OutputSize) -> Result<PriceSeries, InvestingError>;
}
