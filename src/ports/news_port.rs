//! Market news port trait.

use crate::domain::error::InvestingError;
use crate::domain::news::Article;
use chrono::NaiveDate;

pub trait NewsSource {
    /// General market news when `symbol` is `None`, company news otherwise.
    fn news(
        &self,
        symbol: Option<&str>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Article>, InvestingError>;

    /// 0-1 bullishness of recent company news, `None` without coverage.
    fn sentiment(&self, symbol: &str) -> Result<Option<f64>, InvestingError>;
}
