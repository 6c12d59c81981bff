//! CSV file price cache.
//!
//! One `<symbol>.csv` per ticker with `date,price` rows in ascending date
//! order, plus an optional `<symbol>.holdings.csv` of fund constituents.

use crate::domain::error::InvestingError;
use crate::domain::price::{parse_price, PricePoint, PriceSeries};
use crate::domain::ticker::Holding;
use crate::ports::store_port::PriceStore;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

const PRICE_SUFFIX: &str = ".csv";
const HOLDINGS_SUFFIX: &str = ".holdings.csv";

pub struct CsvStore {
    base_path: PathBuf,
}

impl CsvStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path
            .join(format!("{}{PRICE_SUFFIX}", symbol.trim().to_lowercase()))
    }

    pub fn holdings_path(&self, symbol: &str) -> PathBuf {
        self.base_path
            .join(format!("{}{HOLDINGS_SUFFIX}", symbol.trim().to_lowercase()))
    }
}

fn read_prices(path: &Path, symbol: &str) -> Result<PriceSeries, InvestingError> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut points = Vec::new();

    for result in rdr.records() {
        let record = result?;
        let date_str = record
            .get(0)
            .ok_or_else(|| InvestingError::ticker_data(symbol, "missing date column"))?;
        let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
            InvestingError::ticker_data(symbol, format!("invalid date '{date_str}': {e}"))
        })?;
        let raw = record
            .get(1)
            .ok_or_else(|| InvestingError::ticker_data(symbol, "missing price column"))?;
        let price = parse_price(raw).ok_or_else(|| {
            InvestingError::ticker_data(symbol, format!("invalid price '{raw}' on {date}"))
        })?;
        points.push(PricePoint::new(date, price));
    }

    Ok(PriceSeries::new(points))
}

impl PriceStore for CsvStore {
    fn load(&self, symbol: &str) -> Result<Option<PriceSeries>, InvestingError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Ok(None);
        }
        read_prices(&path, &symbol.to_uppercase()).map(Some)
    }

    fn save(&self, symbol: &str, series: &PriceSeries) -> Result<(), InvestingError> {
        let path = self.csv_path(symbol);
        let tmp = path.with_extension("csv.tmp");
        {
            let mut wtr = csv::Writer::from_path(&tmp)?;
            wtr.write_record(["date", "price"])?;
            for p in series.points() {
                wtr.write_record([p.date.format("%Y-%m-%d").to_string(), p.price.to_string()])?;
            }
            wtr.flush()?;
        }
        fs::rename(&tmp, &path)?;
        tracing::debug!("Saved {} rows to {}", series.len(), path.display());
        Ok(())
    }

    fn symbols(&self) -> Result<Vec<String>, InvestingError> {
        let mut symbols = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if name.ends_with(HOLDINGS_SUFFIX) {
                continue;
            }
            if let Some(stem) = name.strip_suffix(PRICE_SUFFIX) {
                symbols.push(stem.to_uppercase());
            }
        }
        symbols.sort();
        Ok(symbols)
    }

    fn remove(&self, symbol: &str) -> Result<(), InvestingError> {
        for path in [self.csv_path(symbol), self.holdings_path(symbol)] {
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn load_holdings(&self, symbol: &str) -> Result<Option<Vec<Holding>>, InvestingError> {
        let path = self.holdings_path(symbol);
        if !path.exists() {
            return Ok(None);
        }

        let mut rdr = csv::Reader::from_path(&path)?;
        let mut holdings = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let (Some(held), Some(pct)) = (record.get(0), record.get(1)) else {
                return Err(InvestingError::ticker_data(
                    symbol,
                    format!("{} needs symbol,pct columns", path.display()),
                ));
            };
            let pct = pct.trim().parse::<f64>().map_err(|_| {
                InvestingError::ticker_data(symbol, format!("invalid holding weight '{pct}'"))
            })?;
            holdings.push(Holding {
                symbol: held.trim().to_uppercase(),
                pct,
            });
        }
        Ok(Some(holdings))
    }
}
