use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::error::FetchError;

const REQUEST_TIMEOUT_SECS: u64 = 15;

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

/// GETs `url` and returns the body, mapping transport and status failures
/// onto the fetch error taxonomy.
pub async fn fetch_text(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<String, FetchError> {
    debug!(%url, "GET");
    let resp = client
        .get(url)
        .query(query)
        .header(USER_AGENT, "jungle_pulse/0.1")
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(classify_transport)?;

    let status = resp.status();
    if let Some(err) = classify_status(status, url) {
        return Err(err);
    }
    resp.text()
        .await
        .map_err(|err| FetchError::Malformed(format!("failed reading body: {err}")))
}

pub fn classify_status(status: StatusCode, url: &str) -> Option<FetchError> {
    if status.is_success() {
        return None;
    }
    let err = match status {
        StatusCode::NOT_FOUND => FetchError::NotFound(url.to_string()),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            FetchError::Timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        }
        StatusCode::TOO_MANY_REQUESTS => FetchError::ServiceUnavailable(format!("http {status}")),
        s if s.is_server_error() => FetchError::ServiceUnavailable(format!("http {s}")),
        s => FetchError::Malformed(format!("http {s}")),
    };
    Some(err)
}

fn classify_transport(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
    } else {
        FetchError::ServiceUnavailable(format!("request failed: {err}"))
    }
}
