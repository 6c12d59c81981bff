//! Concrete adapter implementations for ports.

pub mod alpha_vantage;
pub mod csv_adapter;
pub mod dataroma;
pub mod default_config;
pub mod file_config_adapter;
pub mod finnhub;
pub mod http;
pub mod metals_api;
pub mod table_report;
