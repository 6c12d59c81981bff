//! CLI integration tests for the launcher workflows.
//!
//! Tests cover:
//! - Argument parsing feeding `dispatch`
//! - compare-performance and expected-return tables and saved CSVs
//! - download and daily-tickers routing through portfolios
//! - Local data workflows (list, search, clean-csvs)
//! - news, exposure and show-config output
//! - Exit codes of `run` for invalid configuration

mod common;

use clap::Parser;
use common::*;
use investing::cli::{self, Cli};
use investing::domain::error::InvestingError;
use investing::workflows::{
    self, CompareOptions, ExpectedReturnOptions, ExposureOptions, SortColumn, COMPARISON_FILE,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;

const PORTFOLIOS: &str = r#"
[names]
spy = SPDR S&P 500 ETF
qqq = Invesco QQQ Trust

[portfolio.core]
type = manual
symbols = SPY, QQQ

[portfolio.metals]
type = manual
symbols = XAU

[portfolio.gurus]
type = follow
symbols = BRK, psc
"#;

fn compare_opts(fx: &Fixture, tickers: &str) -> CompareOptions {
    CompareOptions {
        tickers: tickers.to_string(),
        local_only: true,
        metrics: Some("trailing/month".into()),
        portfolios: false,
        sort: SortColumn::Metric,
        output: fx.output_path(COMPARISON_FILE),
    }
}

fn gurus() -> MockHoldings {
    MockHoldings::default()
        .with_manager("BRK", &["AAPL", "BAC"])
        .with_manager("psc", &["AAPL", "GOOG"])
}

mod compare_performance {
    use super::*;

    #[test]
    fn table_is_sorted_by_metric_and_saved() {
        let fx = Fixture::new(PORTFOLIOS);
        fx.cache_current("SPY", 61, 100.0, 160.0);
        fx.cache_current("QQQ", 61, 200.0, 260.0);
        let opts = compare_opts(&fx, "core");

        let mut out = Vec::new();
        let table = fx.session().compare_performance(&opts, &mut out).unwrap();

        assert_eq!(table.headers, vec!["Ticker", "Name", "trailing/month"]);
        assert_eq!(
            table.rows,
            vec![
                vec!["SPY", "SPDR S&P 500 ETF", "23.08"],
                vec!["QQQ", "Invesco QQQ Trust", "13.04"],
            ]
        );
        assert!(output(out).contains("| SPY    | SPDR S&P 500 ETF  | 23.08          |"));

        let saved = std::fs::read_to_string(&opts.output).unwrap();
        assert_eq!(
            saved,
            "Ticker,Name,trailing/month\nSPY,SPDR S&P 500 ETF,23.08\nQQQ,Invesco QQQ Trust,13.04\n"
        );
        assert!(fx.stocks.calls.borrow().is_empty());
    }

    #[test]
    fn missing_data_shows_nan_and_unowned_ticker_dash() {
        let fx = Fixture::new(PORTFOLIOS);
        fx.cache_current("SPY", 61, 100.0, 160.0);
        let mut opts = compare_opts(&fx, "spy,zzz");
        opts.portfolios = true;

        let table = fx.session().compare_performance(&opts, &mut Vec::new()).unwrap();

        assert_eq!(
            table.headers,
            vec!["Ticker", "Portfolio", "Name", "trailing/month"]
        );
        assert_eq!(table.rows[0], vec!["SPY", "core", "SPDR S&P 500 ETF", "23.08"]);
        assert_eq!(table.rows[1], vec!["ZZZ", "-", "Unknown", "NaN"]);
    }

    #[test]
    fn sort_by_ticker() {
        let fx = Fixture::new(PORTFOLIOS);
        fx.cache_current("SPY", 61, 100.0, 160.0);
        fx.cache_current("QQQ", 61, 200.0, 260.0);
        let mut opts = compare_opts(&fx, "SPY,QQQ");
        opts.sort = SortColumn::Ticker;

        let table = fx.session().compare_performance(&opts, &mut Vec::new()).unwrap();
        assert_eq!(table.column("Ticker").unwrap(), vec!["QQQ", "SPY"]);
    }

    #[test]
    fn downloads_before_comparing_unless_local_only() {
        let mut fx = Fixture::new(PORTFOLIOS);
        fx.stocks = MockPriceSource::new("Alpha Vantage")
            .with_series("SPY", dummy_series(61, 100.0, 160.0, fx.latest_close));
        let mut opts = compare_opts(&fx, "SPY");
        opts.local_only = false;

        let table = fx.session().compare_performance(&opts, &mut Vec::new()).unwrap();

        assert_eq!(fx.stocks.requested(), vec!["SPY"]);
        assert_eq!(table.rows[0][2], "23.08");
    }

    #[test]
    fn unknown_metric_is_rejected() {
        let fx = Fixture::new(PORTFOLIOS);
        let mut opts = compare_opts(&fx, "SPY");
        opts.metrics = Some("sideways/1-year".into());
        assert!(matches!(
            fx.session().compare_performance(&opts, &mut Vec::new()),
            Err(InvestingError::UnknownMetric { .. })
        ));
    }
}

mod expected_return {
    use super::*;

    fn opts(fx: &Fixture) -> ExpectedReturnOptions {
        ExpectedReturnOptions {
            tickers: "aaa,bbb".into(),
            holding_periods: "month, quarter".into(),
            weights: Some("0.6,0.4".into()),
            local_only: true,
            num_trials: 250,
            output: fx.output_path("returns.csv"),
        }
    }

    #[test]
    fn seeded_runs_produce_identical_tables() {
        let fx = Fixture::new("");
        fx.cache_current("AAA", 200, 10.0, 40.0);
        fx.cache_current("BBB", 200, 30.0, 20.0);
        let session = fx.session();

        let first = session
            .expected_return(&opts(&fx), &mut StdRng::seed_from_u64(42), &mut Vec::new())
            .unwrap();
        let second = session
            .expected_return(&opts(&fx), &mut StdRng::seed_from_u64(42), &mut Vec::new())
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.title.as_deref(), Some("AAA=0.60, BBB=0.40"));
        assert_eq!(first.headers, vec!["Period", "-σ", "Mean", "+σ", "Data Points"]);
        assert_eq!(first.column("Period").unwrap(), vec!["month", "quarter"]);
        assert!(opts(&fx).output.exists());
    }

    #[test]
    fn weights_must_sum_to_one() {
        let fx = Fixture::new("");
        fx.cache_current("AAA", 60, 10.0, 40.0);
        fx.cache_current("BBB", 60, 30.0, 20.0);
        let mut opts = opts(&fx);
        opts.weights = Some("0.5,0.2".into());

        let result = fx
            .session()
            .expected_return(&opts, &mut StdRng::seed_from_u64(1), &mut Vec::new());
        assert!(matches!(result, Err(InvestingError::InvalidWeights { .. })));
    }

    #[test]
    fn short_history_is_reported_per_ticker() {
        let fx = Fixture::new("");
        fx.cache_current("AAA", 200, 10.0, 40.0);
        fx.cache_current("BBB", 20, 30.0, 20.0);
        let mut opts = opts(&fx);
        opts.holding_periods = "month".into();

        let result = fx
            .session()
            .expected_return(&opts, &mut StdRng::seed_from_u64(1), &mut Vec::new());
        match result {
            Err(InvestingError::TickerData { symbol, .. }) => assert_eq!(symbol, "BBB"),
            other => panic!("expected ticker data error, got {other:?}"),
        }
    }
}

mod downloads {
    use super::*;

    #[test]
    fn download_mixes_portfolios_and_tickers() {
        let mut fx = Fixture::new(PORTFOLIOS);
        fx.metals = MockPriceSource::new("Metals API")
            .with_series("XAU", dummy_series(3, 2300.0, 2310.0, fx.latest_close));
        fx.stocks = MockPriceSource::new("Alpha Vantage")
            .with_series("IBM", dummy_series(3, 170.0, 172.0, fx.latest_close));

        let mut out = Vec::new();
        fx.session().download(Some("metals, ibm"), &mut out).unwrap();

        assert_eq!(fx.metals.requested(), vec!["XAU"]);
        assert_eq!(fx.stocks.requested(), vec!["IBM"]);
        assert_eq!(output(out), "Refreshed 2, already current 0, failed 0\n");
    }

    #[test]
    fn daily_tickers_covers_every_portfolio() {
        let mut fx = Fixture::new(PORTFOLIOS);
        fx.holdings = gurus();
        for symbol in ["AAPL", "BAC", "GOOG", "QQQ", "SPY"] {
            fx.cache_current(symbol, 3, 1.0, 3.0);
        }
        fx.metals = MockPriceSource::new("Metals API").with_error("XAU", "error 101: invalid key");

        let mut out = Vec::new();
        fx.session().daily_tickers(&mut out).unwrap();

        let printed = output(out);
        assert!(printed.starts_with("Refreshed 0, already current 5, failed 1\n"));
        assert!(printed.contains("  XAU: Metals API API error: error 101: invalid key"));
        assert!(fx.stocks.calls.borrow().is_empty());
    }

    #[test]
    fn unknown_manager_aborts_download() {
        let fx = Fixture::new(PORTFOLIOS);
        assert!(matches!(
            fx.session().download(None, &mut Vec::new()),
            Err(InvestingError::Api { .. })
        ));
    }
}

mod local_data {
    use super::*;
    use investing::ports::store_port::PriceStore;

    #[test]
    fn list_prints_cached_symbols_sorted() {
        let fx = Fixture::new("");
        fx.cache_current("vti", 2, 1.0, 2.0);
        fx.cache_current("AGG", 2, 1.0, 2.0);
        std::fs::write(fx.path("vti.holdings.csv"), "symbol,pct\nAAPL,0.06\n").unwrap();

        let mut out = Vec::new();
        fx.session().list(&mut out).unwrap();
        assert_eq!(output(out), "AGG\nVTI\n");
    }

    #[test]
    fn search_reports_found_stale_and_missing() {
        let fx = Fixture::new(PORTFOLIOS);
        fx.cache_current("SPY", 2, 1.0, 2.0);
        fx.store
            .save("QQQ", &dummy_series(2, 1.0, 2.0, fx.latest_close - chrono::Duration::days(3)))
            .unwrap();
        let session = fx.session();

        let mut out = Vec::new();
        session.search("spy", &mut out).unwrap();
        session.search("QQQ", &mut out).unwrap();
        session.search("zzz", &mut out).unwrap();

        assert_eq!(
            output(out),
            "Found local data for SPY (SPDR S&P 500 ETF)\n\
             Found stale local data for QQQ (Invesco QQQ Trust)\n\
             Missing local data for ZZZ - name not configured in [names]\n"
        );
    }

    #[test]
    fn clean_csvs_keeps_portfolio_tickers() {
        let mut fx = Fixture::new(PORTFOLIOS);
        fx.holdings = gurus();
        for symbol in ["SPY", "AAPL", "IBM", "TSLA"] {
            fx.cache_current(symbol, 2, 1.0, 2.0);
        }
        std::fs::write(fx.path("ibm.holdings.csv"), "symbol,pct\nNA,1.0\n").unwrap();

        let mut out = Vec::new();
        let removed = fx.session().clean_csvs(&mut out).unwrap();

        assert_eq!(removed, 2);
        assert_eq!(output(out), "Removed 2 of 4 CSVs\n");
        assert_eq!(fx.store.symbols().unwrap(), vec!["AAPL", "SPY"]);
        assert!(!fx.path("ibm.holdings.csv").exists());
    }
}

mod news_and_exposure {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use investing::domain::news::Article;

    fn article(ts: i64, headline: &str) -> Article {
        Article {
            published: Utc.timestamp_opt(ts, 0).single(),
            source: "Reuters".into(),
            headline: headline.into(),
            summary: String::new(),
            url: String::new(),
        }
    }

    #[test]
    fn news_prints_newest_first_with_sentiment() {
        let mut fx = Fixture::new("");
        fx.news.articles = vec![
            article(1_718_200_000, "Older story"),
            article(1_718_300_000, "Newer story"),
        ];
        fx.news.sentiment = Some(0.75);

        let mut out = Vec::new();
        fx.session().news(Some("aapl"), 3, &mut out).unwrap();

        let printed = output(out);
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("Newer story"));
        assert!(lines[1].ends_with("Older story"));
        assert_eq!(lines[2], "Sentiment for AAPL: 0.75 (1 is bullish)");

        let requests = fx.news.requests.borrow();
        assert_eq!(
            requests[0],
            (Some("aapl".to_string()), fx.today - Duration::days(3), fx.today)
        );
    }

    #[test]
    fn general_news_without_articles() {
        let fx = Fixture::new("");
        let mut out = Vec::new();
        fx.session().news(None, 7, &mut out).unwrap();
        assert_eq!(output(out), "No news since 2024-06-07\n");
    }

    #[test]
    fn news_window_longer_than_a_century_is_rejected() {
        let fx = Fixture::new("");
        let result = fx.session().news(None, 1_000_000_000, &mut Vec::new());
        assert!(matches!(result, Err(InvestingError::InvalidPeriod { .. })));
        assert!(fx.news.requests.borrow().is_empty());
    }

    #[test]
    fn exposure_lists_duplicates_through_funds() {
        let fx = Fixture::new("");
        fx.cache_current("VOO", 2, 1.0, 2.0);
        fx.cache_current("QQQ", 2, 1.0, 2.0);
        std::fs::write(fx.path("voo.holdings.csv"), "symbol,pct\nAAPL,0.07\nXOM,0.01\n").unwrap();
        std::fs::write(fx.path("qqq.holdings.csv"), "symbol,pct\nAAPL,0.09\n").unwrap();
        let opts = ExposureOptions {
            tickers: "voo,qqq".into(),
            weights: None,
            limit: 2,
            threshold: 0.05,
        };

        let mut out = Vec::new();
        fx.session().exposure(&opts, &mut out).unwrap();

        let printed = output(out);
        assert!(printed.starts_with("VOO=0.50, QQQ=0.50\n"));
        assert!(printed.contains("| AAPL    | 8.00     |"));
        assert!(printed.contains("Duplicate positions"));
        assert!(printed.contains("| AAPL    | QQQ    | 9.00          | 4.50             |"));
        assert!(!printed.contains("XOM     | VOO"));
    }
}

mod show_config {
    use super::*;

    #[test]
    fn portfolios_only_lists_names_and_counts() {
        let fx = Fixture::new(PORTFOLIOS);
        let mut out = Vec::new();
        workflows::show_config(&fx.config, "", true, &mut out).unwrap();
        assert_eq!(output(out), "core (2 tickers)\ngurus (2 tickers)\nmetals (1 tickers)\n");
    }

    #[test]
    fn full_config_prints_rendered_ini() {
        let fx = Fixture::new("");
        let rendered = fx.config.to_ini_string();
        let mut out = Vec::new();
        workflows::show_config(&fx.config, &rendered, false, &mut out).unwrap();
        let printed = output(out);
        assert!(printed.contains("[endpoints]"));
        assert!(printed.contains("Gold"));
    }
}

mod dispatch {
    use super::*;
    use std::process::ExitCode;

    fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn parsed_command_runs_against_session() {
        let fx = Fixture::new("");
        fx.cache_current("SPY", 2, 1.0, 2.0);
        let cli = Cli::try_parse_from(["investing", "search", "spy"]).unwrap();

        let mut out = Vec::new();
        cli::dispatch(&fx.session(), &cli.command, &mut out).unwrap();
        assert_eq!(
            output(out),
            "Found local data for SPY - name not configured in [names]\n"
        );
    }

    #[test]
    fn parsed_compare_writes_requested_output() {
        let fx = Fixture::new("");
        fx.cache_current("SPY", 61, 100.0, 160.0);
        let target = fx.output_path("cmp.csv");
        let cli = Cli::try_parse_from([
            "investing",
            "compare-performance",
            "spy",
            "-l",
            "-m",
            "trailing/month",
            "-o",
            target.to_str().unwrap(),
        ])
        .unwrap();

        cli::dispatch(&fx.session(), &cli.command, &mut Vec::new()).unwrap();
        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "Ticker,Name,trailing/month\nSPY,Unknown,23.08\n"
        );
    }

    #[test]
    fn invalid_save_dir_exits_with_config_code() {
        let ini = write_temp_ini("[paths]\nsave = /definitely/not/here\n");
        let cli = Cli::try_parse_from([
            "investing",
            "-c",
            ini.path().to_str().unwrap(),
            "list",
        ])
        .unwrap();

        let code = cli::run(cli);
        assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::from(2)));
    }

    #[test]
    fn bad_locale_exits_with_config_code() {
        let dir = tempfile::tempdir().unwrap();
        let ini = write_temp_ini(&format!(
            "[paths]\nsave = {}\n[general]\nlocale = Mars/Base\n",
            dir.path().display()
        ));
        let cli = Cli::try_parse_from([
            "investing",
            "--config",
            ini.path().to_str().unwrap(),
            "list",
        ])
        .unwrap();

        let code = cli::run(cli);
        assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::from(2)));
    }
}
