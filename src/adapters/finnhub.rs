//! Finnhub news and news sentiment client.

use crate::adapters::http;
use crate::domain::error::InvestingError;
use crate::domain::news::Article;
use crate::ports::config_port::ConfigPort;
use crate::ports::news_port::NewsSource;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;

const API: &str = "Finnhub";

#[derive(Deserialize)]
struct WireArticle {
    datetime: Option<i64>,
    #[serde(default)]
    headline: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    url: String,
}

#[derive(Deserialize)]
struct SentimentEnvelope {
    #[serde(rename = "companyNewsScore")]
    company_news_score: Option<f64>,
}

impl From<WireArticle> for Article {
    fn from(w: WireArticle) -> Self {
        Article {
            published: w
                .datetime
                .filter(|t| *t > 0)
                .and_then(|t| Utc.timestamp_opt(t, 0).single()),
            source: w.source,
            headline: w.headline,
            summary: w.summary,
            url: w.url,
        }
    }
}

pub struct FinnhubAdapter {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl FinnhubAdapter {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    pub fn from_config(config: &dyn ConfigPort, client: Client) -> Result<Self, InvestingError> {
        Ok(Self::new(
            client,
            http::endpoint(config, "finnhub")?,
            config.get_string("keys", "finnhub"),
        ))
    }

    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<String, InvestingError> {
        let key = http::require_key(&self.api_key, "finnhub")?;
        let mut params = query.to_vec();
        params.push(("token", &key));
        http::get_text(
            &self.client,
            API,
            &format!("{}/{path}", self.base_url),
            &params,
        )
    }
}

fn in_range(published: Option<DateTime<Utc>>, from: NaiveDate, to: NaiveDate) -> bool {
    published.is_none_or(|t| {
        let day = t.date_naive();
        from <= day && day <= to
    })
}

impl NewsSource for FinnhubAdapter {
    fn news(
        &self,
        symbol: Option<&str>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Article>, InvestingError> {
        let body = match symbol {
            None => self.get("news", &[("category", "general")])?,
            Some(symbol) => {
                let symbol = symbol.to_uppercase();
                let (from_s, to_s) = (from.to_string(), to.to_string());
                self.get(
                    "company-news",
                    &[("symbol", &symbol), ("from", &from_s), ("to", &to_s)],
                )?
            }
        };
        let articles: Vec<WireArticle> = http::parse_json(API, &body)?;
        Ok(articles
            .into_iter()
            .map(Article::from)
            .filter(|a| in_range(a.published, from, to))
            .collect())
    }

    fn sentiment(&self, symbol: &str) -> Result<Option<f64>, InvestingError> {
        let symbol = symbol.to_uppercase();
        let body = self.get("news-sentiment", &[("symbol", &symbol)])?;
        let envelope: SentimentEnvelope = http::parse_json(API, &body)?;
        Ok(envelope.company_news_score)
    }
}
