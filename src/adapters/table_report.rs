//! Console rendering and CSV export of result tables.

use crate::domain::error::InvestingError;
use crate::domain::report::Table;
use crate::ports::report_port::ReportPort;
use std::path::Path;

/// Boxed plain-text table with the title above it.
pub fn render_table(table: &Table) -> String {
    let columns = table
        .rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(table.headers.len()))
        .max()
        .unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in std::iter::once(&table.headers).chain(&table.rows) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let border = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let border = format!("+{border}+\n");
    let line = |row: &[String]| {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                format!(" {cell:<w$} ")
            })
            .collect();
        format!("|{}|\n", cells.join("|"))
    };

    let mut out = String::new();
    if let Some(title) = &table.title {
        out.push_str(title);
        out.push('\n');
    }
    out.push_str(&border);
    out.push_str(&line(&table.headers));
    out.push_str(&border);
    for row in &table.rows {
        out.push_str(&line(row));
    }
    if !table.rows.is_empty() {
        out.push_str(&border);
    }
    out
}

/// Writes headers and rows as CSV; the title is not exported.
pub struct CsvReportAdapter;

impl ReportPort for CsvReportAdapter {
    fn write(&self, table: &Table, output_path: &Path) -> Result<(), InvestingError> {
        let mut wtr = csv::Writer::from_path(output_path)?;
        wtr.write_record(&table.headers)?;
        for row in &table.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        tracing::info!("Saved table to {}", output_path.display());
        Ok(())
    }
}
