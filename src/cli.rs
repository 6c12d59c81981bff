//! CLI definition and dispatch.

use chrono::Utc;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

use crate::adapters::alpha_vantage::AlphaVantageAdapter;
use crate::adapters::csv_adapter::CsvStore;
use crate::adapters::dataroma::DataromaAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::finnhub::FinnhubAdapter;
use crate::adapters::http;
use crate::adapters::metals_api::MetalsApiAdapter;
use crate::adapters::table_report::CsvReportAdapter;
use crate::domain::config_validation::{save_dir, validate_config};
use crate::domain::error::InvestingError;
use crate::domain::market_day::{market_day, Direction};
use crate::logging;
use crate::ports::config_port::ConfigPort;
use crate::workflows::{
    self, CompareOptions, ExpectedReturnOptions, ExposureOptions, Session, SortColumn,
    COMPARISON_FILE, RETURNS_FILE,
};

pub const DEFAULT_CONFIG: &str = "config/investing.ini";
pub const DEFAULT_PAUSE_SECS: i64 = 12;

#[derive(Parser, Debug)]
#[command(
    name = "investing",
    version,
    about = "Download ticker prices and compare long-term performance"
)]
pub struct Cli {
    /// Print logs to stdout in addition to the log file
    #[arg(short, long, global = true)]
    pub foreground: bool,
    /// User configuration file layered over the built-in defaults
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download new time series data for all configured tickers
    DailyTickers,
    /// Download ticker data for specific symbols or portfolios
    Download {
        /// Comma separated tickers (case insensitive) or portfolio names
        symbols: Option<String>,
    },
    /// Calculate historical performance for several tickers
    ComparePerformance {
        /// Comma separated ticker symbols or portfolio names
        tickers: String,
        /// Don't download more recent data
        #[arg(short, long)]
        local_only: bool,
        /// Comma separated metric names, e.g. trailing/1-year
        #[arg(short, long)]
        metrics: Option<String>,
        /// Add a column with the portfolio name
        #[arg(short, long)]
        portfolios: bool,
        /// Sorting column
        #[arg(short, long, value_enum, default_value_t = SortColumn::Metric)]
        sort: SortColumn,
        #[arg(short, long, default_value = COMPARISON_FILE)]
        output: PathBuf,
    },
    /// Calculate joint return probability across several holdings
    ExpectedReturn {
        /// Comma separated ticker symbols
        tickers: String,
        /// Comma separated financial period keywords
        holding_periods: String,
        /// Proportion of each ticker, equal if absent
        weights: Option<String>,
        /// Don't download more recent data
        #[arg(short, long)]
        local_only: bool,
        /// Number of Monte Carlo trials
        #[arg(short, long, default_value_t = 1000)]
        num_trials: usize,
        /// Seed for reproducible simulations
        #[arg(long)]
        seed: Option<u64>,
        #[arg(short, long, default_value = RETURNS_FILE)]
        output: PathBuf,
    },
    /// Show company exposure through fund holdings
    Exposure {
        /// Comma separated ticker symbols
        tickers: String,
        /// Proportion of each ticker, equal if absent
        weights: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Minimum source weight for a duplicated position
        #[arg(long, default_value_t = 0.01)]
        threshold: f64,
    },
    /// Print recent market or company news
    News {
        ticker: Option<String>,
        #[arg(long, default_value_t = 7)]
        days: i64,
    },
    /// Populate the configuration file on initial install
    Configure,
    /// Delete local CSVs that are not used in portfolios
    CleanCsvs,
    /// Print all locally available ticker symbols alphabetically sorted
    List,
    /// Check if ticker data exists locally
    Search {
        /// Symbol to search for (case insensitive)
        ticker: String,
    },
    /// Print active configuration values for confirmation
    ShowConfig {
        /// Only show portfolio names
        #[arg(short, long)]
        portfolios: bool,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::DailyTickers => "daily-tickers",
            Command::Download { .. } => "download",
            Command::ComparePerformance { .. } => "compare-performance",
            Command::ExpectedReturn { .. } => "expected-return",
            Command::Exposure { .. } => "exposure",
            Command::News { .. } => "news",
            Command::Configure => "configure",
            Command::CleanCsvs => "clean-csvs",
            Command::List => "list",
            Command::Search { .. } => "search",
            Command::ShowConfig { .. } => "show-config",
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match &cli.command {
        Command::Configure => run_configure(&cli.config, cli.foreground),
        Command::ShowConfig { portfolios } => run_show_config(&cli.config, *portfolios, cli.foreground),
        command => run_workflow(&cli.config, command, cli.foreground),
    };

    match result {
        Ok(()) => {
            info!("Completed the {} workflow", cli.command.name());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Uncaught error in {} workflow: {e}", cli.command.name());
            eprintln!("error: {e}");
            if !cli.foreground {
                eprintln!("rerun with -f to see details");
            }
            (&e).into()
        }
    }
}

fn run_configure(config_path: &Path, foreground: bool) -> Result<(), InvestingError> {
    logging::init(None, foreground)?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout().lock();
    let answers = workflows::configure(&mut input, &mut out)?;

    let mut config = FileConfigAdapter::user_only(config_path)?;
    config.set("paths", "save", &answers.save);
    config.set("general", "locale", &answers.locale);
    config.set("keys", "finnhub", &answers.finnhub);
    config.set("keys", "alpha_vantage", &answers.alpha_vantage);
    config.set("keys", "metals", &answers.metals);
    config.write_to(config_path)?;

    writeln!(out, "Configuration successfully written to {}", config_path.display())?;
    writeln!(out, "Please run 'investing show-config' to confirm")?;
    Ok(())
}

fn run_show_config(config_path: &Path, portfolios: bool, foreground: bool) -> Result<(), InvestingError> {
    logging::init(None, foreground)?;
    let config = FileConfigAdapter::with_defaults(config_path)?;
    let mut out = io::stdout().lock();
    workflows::show_config(&config, &config.to_ini_string(), portfolios, &mut out)
}

fn locale(config: &dyn ConfigPort) -> chrono_tz::Tz {
    config
        .get_string("general", "locale")
        .and_then(|l| l.trim().parse().ok())
        .unwrap_or(chrono_tz::America::New_York)
}

fn run_workflow(config_path: &Path, command: &Command, foreground: bool) -> Result<(), InvestingError> {
    let config = FileConfigAdapter::with_defaults(config_path)?;
    validate_config(&config)?;
    let save = save_dir(&config)?;
    logging::init(Some(&save), foreground)?;
    info!("Running the {} workflow", command.name());

    let now = Utc::now();
    let today = now.with_timezone(&locale(&config)).date_naive();
    let latest_close = market_day(Direction::Latest, today, &now)?;

    let client = http::client_from_config(&config)?;
    let store = CsvStore::new(save);
    let stocks = AlphaVantageAdapter::from_config(&config, client.clone())?;
    let metals = MetalsApiAdapter::from_config(&config, client.clone(), today)?;
    let holdings = DataromaAdapter::from_config(&config, client.clone())?;
    let news = FinnhubAdapter::from_config(&config, client)?;
    let pause = config
        .get_int("general", "pause_seconds", DEFAULT_PAUSE_SECS)
        .max(0) as u64;

    let session = Session {
        config: &config,
        store: &store,
        stocks: &stocks,
        metals: &metals,
        holdings: &holdings,
        news: &news,
        report: &CsvReportAdapter,
        today,
        latest_close,
        pause: Duration::from_secs(pause),
    };
    let mut out = io::stdout().lock();
    dispatch(&session, command, &mut out)
}

/// Run one workflow against a wired session.
pub fn dispatch(session: &Session, command: &Command, out: &mut dyn Write) -> Result<(), InvestingError> {
    match command {
        Command::DailyTickers => session.daily_tickers(out),
        Command::Download { symbols } => session.download(symbols.as_deref(), out),
        Command::ComparePerformance {
            tickers,
            local_only,
            metrics,
            portfolios,
            sort,
            output,
        } => {
            let opts = CompareOptions {
                tickers: tickers.clone(),
                local_only: *local_only,
                metrics: metrics.clone(),
                portfolios: *portfolios,
                sort: *sort,
                output: output.clone(),
            };
            session.compare_performance(&opts, out).map(|_| ())
        }
        Command::ExpectedReturn {
            tickers,
            holding_periods,
            weights,
            local_only,
            num_trials,
            seed,
            output,
        } => {
            let opts = ExpectedReturnOptions {
                tickers: tickers.clone(),
                holding_periods: holding_periods.clone(),
                weights: weights.clone(),
                local_only: *local_only,
                num_trials: *num_trials,
                output: output.clone(),
            };
            let mut rng = match seed {
                Some(s) => StdRng::seed_from_u64(*s),
                None => StdRng::from_entropy(),
            };
            session.expected_return(&opts, &mut rng, out).map(|_| ())
        }
        Command::Exposure {
            tickers,
            weights,
            limit,
            threshold,
        } => {
            let opts = ExposureOptions {
                tickers: tickers.clone(),
                weights: weights.clone(),
                limit: *limit,
                threshold: *threshold,
            };
            session.exposure(&opts, out)
        }
        Command::News { ticker, days } => session.news(ticker.as_deref(), *days, out),
        Command::CleanCsvs => session.clean_csvs(out).map(|_| ()),
        Command::List => session.list(out),
        Command::Search { ticker } => session.search(ticker, out),
        Command::Configure | Command::ShowConfig { .. } => {
            tracing::warn!("{} runs without a session", command.name());
            Ok(())
        }
    }
}
