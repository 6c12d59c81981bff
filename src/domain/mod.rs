//! Core domain types and logic.

pub mod config_validation;
pub mod error;
pub mod market_day;
pub mod metrics;
pub mod news;
pub mod period;
pub mod portfolio;
pub mod price;
pub mod refresh;
pub mod report;
pub mod ticker;
pub mod universe;
