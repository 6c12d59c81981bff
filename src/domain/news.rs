//! News articles as returned by a news source.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub published: Option<DateTime<Utc>>,
    pub source: String,
    pub headline: String,
    pub summary: String,
    pub url: String,
}

impl Article {
    /// One console line: timestamp, source and headline.
    pub fn headline_line(&self) -> String {
        let when = self
            .published
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "----------------".to_string());
        format!("{when}  {:<12}  {}", self.source, self.headline.trim())
    }
}

/// Newest first, with articles lacking a timestamp at the end.
pub fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.published.cmp(&a.published));
}
