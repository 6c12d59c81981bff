//! Followed-portfolio holdings port trait.

use crate::domain::error::InvestingError;

pub trait HoldingsSource {
    /// Ticker symbols currently held by the manager identified by `code`.
    fn holdings(&self, code: &str) -> Result<Vec<String>, InvestingError>;
}
