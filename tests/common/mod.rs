#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use investing::adapters::csv_adapter::CsvStore;
use investing::adapters::file_config_adapter::FileConfigAdapter;
use investing::adapters::table_report::CsvReportAdapter;
use investing::domain::error::InvestingError;
use investing::domain::news::Article;
pub use investing::domain::price::{PricePoint, PriceSeries};
use investing::ports::holdings_port::HoldingsSource;
use investing::ports::news_port::NewsSource;
use investing::ports::price_port::{OutputSize, PriceSource};
use investing::ports::store_port::PriceStore;
use investing::workflows::Session;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::TempDir;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Daily prices rising linearly from `low` to `high`, ending on `end`.
pub fn dummy_series(num_days: i64, low: f64, high: f64, end: NaiveDate) -> PriceSeries {
    let step = (high - low) / (num_days - 1) as f64;
    let start = end - Duration::days(num_days - 1);
    PriceSeries::new(
        (0..num_days)
            .map(|i| PricePoint::new(start + Duration::days(i), low + step * i as f64))
            .collect(),
    )
}

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

pub fn fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
}

/// Price source serving canned series and recording every request.
pub struct MockPriceSource {
    pub name: String,
    pub data: HashMap<String, PriceSeries>,
    pub errors: HashMap<String, String>,
    pub calls: RefCell<Vec<(String, OutputSize)>>,
}

impl MockPriceSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data: HashMap::new(),
            errors: HashMap::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_series(mut self, symbol: &str, series: PriceSeries) -> Self {
        self.data.insert(symbol.to_string(), series);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(s, _)| s.clone()).collect()
    }
}

impl PriceSource for MockPriceSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn daily_closes(&self, symbol: &str, size: OutputSize) -> Result<PriceSeries, InvestingError> {
        self.calls.borrow_mut().push((symbol.to_string(), size));
        if let Some(reason) = self.errors.get(symbol) {
            return Err(InvestingError::api(&self.name, reason.clone()));
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MockHoldings {
    pub managers: HashMap<String, Vec<String>>,
}

impl MockHoldings {
    pub fn with_manager(mut self, code: &str, symbols: &[&str]) -> Self {
        self.managers
            .insert(code.to_string(), symbols.iter().map(|s| s.to_string()).collect());
        self
    }
}

impl HoldingsSource for MockHoldings {
    fn holdings(&self, code: &str) -> Result<Vec<String>, InvestingError> {
        self.managers
            .get(code)
            .cloned()
            .ok_or_else(|| InvestingError::api("Dataroma", format!("unknown manager {code}")))
    }
}

#[derive(Default)]
pub struct MockNews {
    pub articles: Vec<Article>,
    pub sentiment: Option<f64>,
    pub requests: RefCell<Vec<(Option<String>, NaiveDate, NaiveDate)>>,
}

impl NewsSource for MockNews {
    fn news(
        &self,
        symbol: Option<&str>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Article>, InvestingError> {
        self.requests
            .borrow_mut()
            .push((symbol.map(str::to_string), from, to));
        Ok(self.articles.clone())
    }

    fn sentiment(&self, _symbol: &str) -> Result<Option<f64>, InvestingError> {
        Ok(self.sentiment)
    }
}

/// A save directory, a config pointing at it and mock remote sources.
pub struct Fixture {
    pub dir: TempDir,
    /// Report output, kept apart from the cached CSVs.
    pub out: TempDir,
    pub config: FileConfigAdapter,
    pub store: CsvStore,
    pub stocks: MockPriceSource,
    pub metals: MockPriceSource,
    pub holdings: MockHoldings,
    pub news: MockNews,
    pub report: CsvReportAdapter,
    pub today: NaiveDate,
    pub latest_close: NaiveDate,
}

/// Friday; the previous close is Thursday.
pub const TODAY: (i32, u32, u32) = (2024, 6, 14);

impl Fixture {
    /// `sections` is appended to a user config setting the save directory.
    pub fn new(sections: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let ini = format!(
            "[paths]\nsave = {}\n\n{sections}\n",
            dir.path().display()
        );
        let path = dir.path().join("investing.ini");
        std::fs::write(&path, ini).unwrap();
        let config = FileConfigAdapter::with_defaults(&path).unwrap();
        let store = CsvStore::new(dir.path().to_path_buf());
        let (y, m, d) = TODAY;
        Self {
            dir,
            out: TempDir::new().unwrap(),
            config,
            store,
            stocks: MockPriceSource::new("Alpha Vantage"),
            metals: MockPriceSource::new("Metals API"),
            holdings: MockHoldings::default(),
            news: MockNews::default(),
            report: CsvReportAdapter,
            today: date(y, m, d),
            latest_close: date(y, m, d - 1),
        }
    }

    pub fn session(&self) -> Session<'_> {
        Session {
            config: &self.config,
            store: &self.store,
            stocks: &self.stocks,
            metals: &self.metals,
            holdings: &self.holdings,
            news: &self.news,
            report: &self.report,
            today: self.today,
            latest_close: self.latest_close,
            pause: std::time::Duration::ZERO,
        }
    }

    /// Cache a series that ends on the latest close.
    pub fn cache_current(&self, symbol: &str, num_days: i64, low: f64, high: f64) {
        self.store
            .save(symbol, &dummy_series(num_days, low, high, self.latest_close))
            .unwrap();
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.out.path().join(name)
    }
}

pub fn output(buf: Vec<u8>) -> String {
    String::from_utf8(buf).unwrap()
}
