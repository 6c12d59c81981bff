//! Local price cache port trait.

use crate::domain::error::InvestingError;
use crate::domain::price::PriceSeries;
use crate::domain::ticker::Holding;

pub trait PriceStore {
    /// Cached series for `symbol`, `None` when nothing is cached.
    fn load(&self, symbol: &str) -> Result<Option<PriceSeries>, InvestingError>;

    /// Replace the cached series for `symbol`.
    fn save(&self, symbol: &str, series: &PriceSeries) -> Result<(), InvestingError>;

    /// Uppercase symbols with a cached series, sorted.
    fn symbols(&self) -> Result<Vec<String>, InvestingError>;

    /// Delete the cached series and holdings for `symbol`.
    fn remove(&self, symbol: &str) -> Result<(), InvestingError>;

    /// Fund constituents for `symbol`, `None` when no holdings are cached.
    fn load_holdings(&self, symbol: &str) -> Result<Option<Vec<Holding>>, InvestingError>;
}
