//! Launcher workflows.
//!
//! Each workflow combines domain operations over the ports held by a
//! [`Session`] and writes its console output to the supplied writer.

use crate::domain::error::InvestingError;
use crate::domain::metrics::{self, format_percent, MetricSpec};
use crate::domain::news::sort_newest_first;
use crate::domain::period::{days_before, Period, MAX_PERIOD_DAYS};
use crate::domain::portfolio::{parse_weights, Portfolio};
use crate::domain::refresh::{RefreshSummary, Refresher};
use crate::domain::report::Table;
use crate::domain::ticker::{Ticker, UNKNOWN_NAME};
use crate::domain::universe::{
    configured_portfolios, load_portfolios, split_request, ticker_to_portfolio, PortfolioConfig,
};
use crate::adapters::table_report::render_table;
use crate::ports::config_port::ConfigPort;
use crate::ports::holdings_port::HoldingsSource;
use crate::ports::news_port::NewsSource;
use crate::ports::price_port::PriceSource;
use crate::ports::report_port::ReportPort;
use crate::ports::store_port::PriceStore;
use chrono::NaiveDate;
use rand::Rng;
use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const COMPARISON_FILE: &str = "comparison.csv";
pub const RETURNS_FILE: &str = "returns.csv";

/// Sorting column of the performance comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortColumn {
    Ticker,
    Name,
    Metric,
}

#[derive(Debug, Clone)]
pub struct CompareOptions {
    pub tickers: String,
    pub local_only: bool,
    pub metrics: Option<String>,
    pub portfolios: bool,
    pub sort: SortColumn,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ExpectedReturnOptions {
    pub tickers: String,
    pub holding_periods: String,
    pub weights: Option<String>,
    pub local_only: bool,
    pub num_trials: usize,
    pub output: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ExposureOptions {
    pub tickers: String,
    pub weights: Option<String>,
    pub limit: usize,
    pub threshold: f64,
}

/// Everything a workflow needs, wired by the launcher.
pub struct Session<'a> {
    pub config: &'a dyn ConfigPort,
    pub store: &'a dyn PriceStore,
    pub stocks: &'a dyn PriceSource,
    pub metals: &'a dyn PriceSource,
    pub holdings: &'a dyn HoldingsSource,
    pub news: &'a dyn NewsSource,
    pub report: &'a dyn ReportPort,
    pub today: NaiveDate,
    /// Latest completed market day.
    pub latest_close: NaiveDate,
    pub pause: std::time::Duration,
}

fn split_symbols(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl<'a> Session<'a> {
    pub fn portfolios(&self) -> Result<Vec<PortfolioConfig>, InvestingError> {
        configured_portfolios(self.config)
    }

    pub fn refresher(&self) -> Refresher<'a> {
        Refresher {
            store: self.store,
            config: self.config,
            stocks: self.stocks,
            metals: self.metals,
            metal_symbols: self.config.get_list("general", "metals"),
            today: self.today,
            latest_close: self.latest_close,
            pause: self.pause,
        }
    }

    pub fn load_ticker(&self, symbol: &str) -> Result<Ticker, InvestingError> {
        Ticker::load(self.store, self.config, symbol)
    }

    pub fn refresh_tickers(&self, tickers: &[String]) -> Result<RefreshSummary, InvestingError> {
        let summary = self.refresher().refresh_all(tickers)?;
        if !summary.failed.is_empty() {
            warn!(
                "Failed to refresh {} of {} tickers",
                summary.failed.len(),
                tickers.len()
            );
        }
        Ok(summary)
    }

    /// Tickers named by a request list, expanding portfolio names.
    pub fn resolve_request(&self, input: &str) -> Result<Vec<String>, InvestingError> {
        let portfolios = self.portfolios()?;
        let request = split_request(input, &portfolios);
        let mut tickers = if request.portfolios.is_empty() {
            Vec::new()
        } else {
            load_portfolios(&portfolios, &request.portfolios, self.holdings)?
        };
        for t in request.tickers {
            if !tickers.contains(&t) {
                tickers.push(t);
            }
        }
        Ok(tickers)
    }

    /// Refresh every ticker of every configured portfolio.
    pub fn daily_tickers(&self, out: &mut dyn Write) -> Result<(), InvestingError> {
        let tickers = load_portfolios(&self.portfolios()?, &[], self.holdings)?;
        info!("Checking prices for {} configured tickers", tickers.len());
        let summary = self.refresh_tickers(&tickers)?;
        write_summary(&summary, out)
    }

    /// Refresh the requested portfolios or tickers, or everything configured.
    pub fn download(&self, symbols: Option<&str>, out: &mut dyn Write) -> Result<(), InvestingError> {
        let tickers = match symbols {
            None => load_portfolios(&self.portfolios()?, &[], self.holdings)?,
            Some(s) => self.resolve_request(s)?,
        };
        info!("Checking prices for {} tickers", tickers.len());
        let summary = self.refresh_tickers(&tickers)?;
        write_summary(&summary, out)
    }

    /// Tabulate metrics per ticker, print and save the table.
    pub fn compare_performance(
        &self,
        opts: &CompareOptions,
        out: &mut dyn Write,
    ) -> Result<Table, InvestingError> {
        let tickers = self.resolve_request(&opts.tickers)?;
        info!("Received {} symbols to compare performance of", tickers.len());
        if opts.local_only {
            info!("Using most recent local data");
        } else {
            self.refresh_tickers(&tickers)?;
        }

        let specs: Vec<MetricSpec> = match &opts.metrics {
            Some(m) => metrics::parse_metrics(m)?,
            None => metrics::parse_metrics(
                &self.config.get_string("general", "metrics").unwrap_or_default(),
            )?,
        };
        let owners = ticker_to_portfolio(&self.portfolios()?);

        let mut headers = vec!["Ticker".to_string(), "Name".to_string()];
        if opts.portfolios {
            headers.insert(1, "Portfolio".to_string());
        }
        headers.extend(specs.iter().map(|s| s.name().to_string()));

        let mut rows = Vec::with_capacity(tickers.len());
        for symbol in &tickers {
            let ticker = self.load_ticker(symbol)?;
            let mut row = vec![ticker.symbol.clone(), ticker.name.clone()];
            if opts.portfolios {
                let owner = owners.get(&ticker.symbol).cloned().unwrap_or_else(|| "-".into());
                row.insert(1, owner);
            }
            for spec in &specs {
                let value = ticker.metric(spec, self.today).unwrap_or_else(|e| {
                    warn!("{}: {} unavailable: {e}", ticker.symbol, spec.name());
                    f64::NAN
                });
                row.push(format_percent(value, 2));
            }
            rows.push(row);
        }
        sort_rows(&mut rows, opts.sort, opts.portfolios);

        let mut table = Table::new(headers);
        table.rows = rows;
        write!(out, "{}", render_table(&table))?;
        info!("Saving results to {}", opts.output.display());
        self.report.write(&table, &opts.output)?;
        Ok(table)
    }

    /// Monte Carlo composite returns over each holding period.
    pub fn expected_return<R: Rng>(
        &self,
        opts: &ExpectedReturnOptions,
        rng: &mut R,
        out: &mut dyn Write,
    ) -> Result<Table, InvestingError> {
        let symbols = split_symbols(&opts.tickers);
        if !opts.local_only {
            self.refresh_tickers(&symbols)?;
        }
        let tickers = symbols
            .iter()
            .map(|s| self.load_ticker(s))
            .collect::<Result<Vec<_>, _>>()?;
        let weights = opts.weights.as_deref().map(parse_weights).transpose()?;
        let portfolio = Portfolio::new(tickers, weights)?;
        info!("Initialized {portfolio}");

        let periods = opts
            .holding_periods
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| p.parse::<Period>())
            .collect::<Result<Vec<_>, _>>()?;
        info!("Simulating composite returns for {} periods", periods.len());

        let mut table = Table::new(["Period", "-σ", "Mean", "+σ", "Data Points"])
            .with_title(portfolio.name());
        for period in &periods {
            let r = portfolio.expected_return(period, opts.num_trials, self.today, rng)?;
            table.add_row([
                period.to_string(),
                format_percent(r.mean - r.std_dev, 2),
                format_percent(r.mean, 2),
                format_percent(r.mean + r.std_dev, 2),
                r.min_count.to_string(),
            ]);
        }

        write!(out, "{}", render_table(&table))?;
        info!("Saving results to {}", opts.output.display());
        self.report.write(&table, &opts.output)?;
        Ok(table)
    }

    /// Company exposure through funds and duplicated positions.
    pub fn exposure(&self, opts: &ExposureOptions, out: &mut dyn Write) -> Result<(), InvestingError> {
        let tickers = split_symbols(&opts.tickers)
            .iter()
            .map(|s| self.load_ticker(s))
            .collect::<Result<Vec<_>, _>>()?;
        let weights = opts.weights.as_deref().map(parse_weights).transpose()?;
        let portfolio = Portfolio::new(tickers, weights)?;

        let mut top = Table::new(["Company", "Exposure"]).with_title(portfolio.name());
        for (company, weight) in portfolio.max_exposure(opts.limit) {
            top.add_row([company, format_percent(weight, 2)]);
        }
        write!(out, "{}", render_table(&top))?;

        let duplicates = portfolio.duplicate_positions(opts.threshold);
        if duplicates.is_empty() {
            writeln!(out, "No duplicate positions")?;
            return Ok(());
        }
        let mut dup = Table::new(["Company", "Source", "Source Weight", "Portfolio Weight"])
            .with_title("Duplicate positions");
        for (company, positions) in duplicates {
            for p in positions {
                dup.add_row([
                    company.clone(),
                    p.source,
                    format_percent(p.source_weight, 2),
                    format_percent(p.portfolio_weight, 2),
                ]);
            }
        }
        write!(out, "{}", render_table(&dup))?;
        Ok(())
    }

    /// Recent headlines, plus the sentiment score for a single ticker.
    pub fn news(&self, ticker: Option<&str>, days: i64, out: &mut dyn Write) -> Result<(), InvestingError> {
        if days > MAX_PERIOD_DAYS {
            return Err(InvestingError::InvalidPeriod {
                period: days.to_string(),
                reason: "period is longer than 100 years".into(),
            });
        }
        let from = days_before(self.today, days.max(0));
        let mut articles = self.news.news(ticker, from, self.today)?;
        sort_newest_first(&mut articles);
        if articles.is_empty() {
            writeln!(out, "No news since {from}")?;
        }
        for article in &articles {
            writeln!(out, "{}", article.headline_line())?;
        }

        if let Some(symbol) = ticker {
            match self.news.sentiment(symbol)? {
                Some(score) => writeln!(
                    out,
                    "Sentiment for {}: {score:.2} (1 is bullish)",
                    symbol.to_uppercase()
                )?,
                None => writeln!(out, "No sentiment score for {}", symbol.to_uppercase())?,
            }
        }
        Ok(())
    }

    /// Delete cached CSVs not used by any configured portfolio.
    pub fn clean_csvs(&self, out: &mut dyn Write) -> Result<usize, InvestingError> {
        let keep: BTreeSet<String> = load_portfolios(&self.portfolios()?, &[], self.holdings)?
            .into_iter()
            .collect();
        let cached = self.store.symbols()?;
        let mut removed = 0;
        for symbol in &cached {
            if !keep.contains(symbol) {
                self.store.remove(symbol)?;
                removed += 1;
            }
        }
        info!("Removed {removed} of {} CSVs", cached.len());
        writeln!(out, "Removed {removed} of {} CSVs", cached.len())?;
        Ok(removed)
    }

    /// Locally cached symbols, alphabetically.
    pub fn list(&self, out: &mut dyn Write) -> Result<(), InvestingError> {
        for symbol in self.store.symbols()? {
            writeln!(out, "{symbol}")?;
        }
        Ok(())
    }

    /// Whether local data exists and is current for `symbol`.
    pub fn search(&self, symbol: &str, out: &mut dyn Write) -> Result<(), InvestingError> {
        let ticker = self.load_ticker(symbol)?;
        let status = match (ticker.has_csv, ticker.is_current(self.latest_close)) {
            (false, _) => "Missing",
            (true, true) => "Found",
            (true, false) => "Found stale",
        };
        let name = if ticker.name == UNKNOWN_NAME {
            " - name not configured in [names]".to_string()
        } else {
            format!(" ({})", ticker.name)
        };
        writeln!(out, "{status} local data for {}{name}", ticker.symbol)?;
        Ok(())
    }
}

fn write_summary(summary: &RefreshSummary, out: &mut dyn Write) -> Result<(), InvestingError> {
    writeln!(
        out,
        "Refreshed {}, already current {}, failed {}",
        summary.refreshed.len(),
        summary.current.len(),
        summary.failed.len()
    )?;
    for (symbol, reason) in &summary.failed {
        writeln!(out, "  {symbol}: {reason}")?;
    }
    Ok(())
}

/// Sort comparison rows; NaN metrics go last.
pub fn sort_rows(rows: &mut [Vec<String>], sort: SortColumn, has_portfolio: bool) {
    let name_col = if has_portfolio { 2 } else { 1 };
    match sort {
        SortColumn::Ticker => rows.sort_by(|a, b| a[0].cmp(&b[0])),
        SortColumn::Name => {
            rows.sort_by_key(|r| r[name_col].to_lowercase());
        }
        SortColumn::Metric => {
            let key = |r: &Vec<String>| {
                r.last()
                    .and_then(|v| v.parse::<f64>().ok())
                    .unwrap_or(f64::NAN)
            };
            rows.sort_by(|a, b| {
                let (x, y) = (key(a), key(b));
                match (x.is_nan(), y.is_nan()) {
                    (true, true) => std::cmp::Ordering::Equal,
                    (true, false) => std::cmp::Ordering::Greater,
                    (false, true) => std::cmp::Ordering::Less,
                    (false, false) => y.total_cmp(&x),
                }
            });
        }
    }
}

/// Print the merged configuration, or portfolio names with ticker counts.
pub fn show_config(
    config: &dyn ConfigPort,
    rendered: &str,
    portfolios_only: bool,
    out: &mut dyn Write,
) -> Result<(), InvestingError> {
    if portfolios_only {
        for p in configured_portfolios(config)? {
            writeln!(out, "{} ({} tickers)", p.name, p.symbols.len())?;
        }
    } else {
        write!(out, "{rendered}")?;
    }
    Ok(())
}

/// Values collected by [`configure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answers {
    pub save: String,
    pub locale: String,
    pub finnhub: String,
    pub alpha_vantage: String,
    pub metals: String,
}

fn prompt(input: &mut dyn BufRead, out: &mut dyn Write, message: &str) -> Result<String, InvestingError> {
    write!(out, "{message}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "input closed").into());
    }
    Ok(line.trim().to_string())
}

/// Interactive prompts for the values of a first install.
pub fn configure(input: &mut dyn BufRead, out: &mut dyn Write) -> Result<Answers, InvestingError> {
    writeln!(out, "Please enter the following values to configure your investing install")?;
    let mut save = prompt(input, out, "Directory to save local stock CSV data: ")?;
    while !Path::new(&save).is_dir() {
        save = prompt(input, out, "Please enter a valid directory path: ")?;
    }

    let mut locale = prompt(input, out, "Your timezone (i.e. US/Mountain, US/Eastern, etc): ")?;
    while locale.parse::<chrono_tz::Tz>().is_err() {
        if locale == "all" {
            for tz in chrono_tz::TZ_VARIANTS.iter() {
                writeln!(out, "{}", tz.name())?;
            }
        }
        locale = prompt(input, out, "Please enter a valid timezone or all to show list: ")?;
    }

    let finnhub = prompt(input, out, "Finnhub API key (see https://finnhub.io/register): ")?;
    let alpha_vantage = prompt(
        input,
        out,
        "AlphaVantage API key (see https://www.alphavantage.co/support/#api-key): ",
    )?;
    let metals = prompt(input, out, "Metals API key (see https://metals-api.com/pricing): ")?;

    Ok(Answers {
        save,
        locale,
        finnhub,
        alpha_vantage,
        metals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn metric_sort_is_descending_with_nan_last() {
        let mut rows = vec![
            row(&["A", "Alpha", "1.00"]),
            row(&["B", "Beta", "NaN"]),
            row(&["C", "Gamma", "5.00"]),
        ];
        sort_rows(&mut rows, SortColumn::Metric, false);
        let order: Vec<_> = rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
    }

    #[test]
    fn name_sort_uses_name_column_when_portfolio_present() {
        let mut rows = vec![
            row(&["A", "core", "zeta", "1"]),
            row(&["B", "core", "Alpha", "2"]),
        ];
        sort_rows(&mut rows, SortColumn::Name, true);
        assert_eq!(rows[0][0], "B");
    }

    #[test]
    fn configure_reprompts_until_valid() {
        let dir = tempfile::tempdir().unwrap();
        let script = format!(
            "/definitely/missing\n{}\nMars/Base\nUS/Mountain\nfh\nav\nmt\n",
            dir.path().display()
        );
        let mut input = Cursor::new(script.into_bytes());
        let mut out = Vec::new();
        let answers = configure(&mut input, &mut out).unwrap();
        assert_eq!(answers.save, dir.path().display().to_string());
        assert_eq!(answers.locale, "US/Mountain");
        assert_eq!(answers.alpha_vantage, "av");
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Please enter a valid directory path"));
        assert!(printed.contains("Please enter a valid timezone"));
    }

    #[test]
    fn configure_fails_on_closed_input() {
        let mut input = Cursor::new(Vec::new());
        let mut out = Vec::new();
        assert!(matches!(
            configure(&mut input, &mut out),
            Err(InvestingError::Io(_))
        ));
    }
}
