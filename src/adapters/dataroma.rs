//! Dataroma superinvestor holdings scraper.
//!
//! Reads the first table of `holdings.php?m=<code>` and takes the ticker
//! from the `Stock` column, whose cells look like `AAPL - Apple Inc.`.

use crate::adapters::http;
use crate::domain::error::InvestingError;
use crate::ports::config_port::ConfigPort;
use crate::ports::holdings_port::HoldingsSource;
use reqwest::blocking::Client;

const API: &str = "Dataroma";
const STOCK_COLUMN: &str = "Stock";

pub struct DataromaAdapter {
    client: Client,
    endpoint: String,
}

impl DataromaAdapter {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(config: &dyn ConfigPort, client: Client) -> Result<Self, InvestingError> {
        Ok(Self::new(client, http::endpoint(config, "dataroma")?))
    }
}

/// Start offsets of `<name ...>` opening tags in lowercased `html`.
fn tag_starts(lower: &str, name: &str) -> Vec<usize> {
    let needle = format!("<{name}");
    let mut starts = Vec::new();
    let mut pos = 0;
    while let Some(i) = lower[pos..].find(&needle) {
        let at = pos + i;
        let next = lower[at + needle.len()..].chars().next();
        if matches!(next, Some(c) if c == '>' || c.is_ascii_whitespace()) {
            starts.push(at);
        }
        pos = at + needle.len();
    }
    starts
}

fn strip_tags(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of each `<td>`/`<th>` cell in a row.
fn cells(row: &str) -> Vec<String> {
    let lower = row.to_ascii_lowercase();
    let mut starts = tag_starts(&lower, "td");
    starts.extend(tag_starts(&lower, "th"));
    starts.sort_unstable();

    starts
        .iter()
        .enumerate()
        .filter_map(|(i, &start)| {
            let open_end = start + lower[start..].find('>')? + 1;
            let end = starts.get(i + 1).copied().unwrap_or(row.len());
            Some(strip_tags(&row[open_end..end.max(open_end)]))
        })
        .collect()
}

/// Rows of the first table in `html`, each as a list of cell texts.
fn first_table(html: &str) -> Option<Vec<Vec<String>>> {
    let lower = html.to_ascii_lowercase();
    let start = *tag_starts(&lower, "table").first()?;
    let end = lower[start..]
        .find("</table")
        .map_or(html.len(), |i| start + i);
    let table = &html[start..end];
    let table_lower = &lower[start..end];

    let row_starts = tag_starts(table_lower, "tr");
    let rows = row_starts
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let e = row_starts.get(i + 1).copied().unwrap_or(table.len());
            cells(&table[s..e])
        })
        .filter(|r| !r.is_empty())
        .collect();
    Some(rows)
}

pub(crate) fn parse_holdings(code: &str, html: &str) -> Result<Vec<String>, InvestingError> {
    let rows = first_table(html).ok_or_else(|| {
        InvestingError::api(
            API,
            format!("no tables found for {code}, the holdings scraper may need to be updated"),
        )
    })?;
    let mut rows = rows.into_iter();
    let header = rows.next().unwrap_or_default();
    let column = header
        .iter()
        .position(|h| h.eq_ignore_ascii_case(STOCK_COLUMN))
        .ok_or_else(|| InvestingError::api(API, format!("no {STOCK_COLUMN} column for {code}")))?;

    Ok(rows
        .filter_map(|row| row.get(column).cloned())
        .filter_map(|cell| {
            let ticker = cell.split('-').next()?.trim().to_string();
            (!ticker.is_empty()).then_some(ticker)
        })
        .collect())
}

impl HoldingsSource for DataromaAdapter {
    fn holdings(&self, code: &str) -> Result<Vec<String>, InvestingError> {
        let html = http::get_text(&self.client, API, &self.endpoint, &[("m", code)])?;
        let held = parse_holdings(code, &html)?;
        tracing::debug!("{API}: {code} holds {} stocks", held.len());
        Ok(held)
    }
}
