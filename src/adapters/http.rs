//! Shared blocking HTTP plumbing for the API adapters.

use crate::domain::error::InvestingError;
use crate::ports::config_port::ConfigPort;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: i64 = 30;

const AGENT: &str = concat!("investing/", env!("CARGO_PKG_VERSION"));

pub fn build_client(timeout: Duration) -> Result<Client, InvestingError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| InvestingError::api("HTTP", e.to_string()))
}

/// Client honouring `[general] request_timeout_seconds`.
pub fn client_from_config(config: &dyn ConfigPort) -> Result<Client, InvestingError> {
    let secs = config
        .get_int("general", "request_timeout_seconds", DEFAULT_TIMEOUT_SECS)
        .max(1);
    build_client(Duration::from_secs(secs as u64))
}

/// API key from `[keys]`, required only once a request is made.
pub fn require_key(key: &Option<String>, name: &str) -> Result<String, InvestingError> {
    key.clone().ok_or_else(|| InvestingError::ConfigMissing {
        section: "keys".into(),
        key: name.into(),
    })
}

/// Endpoint from `[endpoints]`.
pub fn endpoint(config: &dyn ConfigPort, name: &str) -> Result<String, InvestingError> {
    config
        .get_string("endpoints", name)
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .ok_or_else(|| InvestingError::ConfigMissing {
            section: "endpoints".into(),
            key: name.into(),
        })
}

/// GET `url` and return the body of a successful response.
///
/// Error messages never include the request URL since query strings carry
/// API keys.
pub fn get_text(
    client: &Client,
    api: &str,
    url: &str,
    query: &[(&str, &str)],
) -> Result<String, InvestingError> {
    let resp = client
        .get(url)
        .query(query)
        .header(USER_AGENT, AGENT)
        .send()
        .map_err(|e| InvestingError::api(api, e.without_url().to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(InvestingError::api(
            api,
            format!("bad status code {}", status.as_u16()),
        ));
    }
    resp.text()
        .map_err(|e| InvestingError::api(api, e.without_url().to_string()))
}

/// Deserialize a JSON body, mapping failures to an API error.
pub fn parse_json<T: serde::de::DeserializeOwned>(api: &str, body: &str) -> Result<T, InvestingError> {
    serde_json::from_str(body)
        .map_err(|e| InvestingError::api(api, format!("unexpected payload: {e}")))
}
