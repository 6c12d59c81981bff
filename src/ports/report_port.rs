//! Report output port trait.

use crate::domain::error::InvestingError;
use crate::domain::report::Table;
use std::path::Path;

/// Port for persisting workflow result tables.
pub trait ReportPort {
    fn write(&self, table: &Table, output_path: &Path) -> Result<(), InvestingError>;
}
