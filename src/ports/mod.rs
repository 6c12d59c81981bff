//! Port traits at the boundary between domain logic and the outside world.

pub mod config_port;
pub mod holdings_port;
pub mod news_port;
pub mod price_port;
pub mod report_port;
pub mod store_port;
