use crate::config::Config;
use crate::error::PipelineError;
use crate::{logi, logw};
use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

pub fn build_client() -> Result<Client> {
    Client::builder()
        .cookie_store(true)
        .build()
        .context("Failed to build HTTP client")
}

/// Accepts only absolute http(s) URLs.
pub fn parse_page_url(raw: &str) -> Result<Url, PipelineError> {
    let url = Url::parse(raw.trim()).map_err(|e| PipelineError::fetch(raw, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PipelineError::fetch(raw, format!("unsupported scheme {}", other))),
    }
}

/// One GET of the product page with browser-like headers. Not retried.
pub async fn fetch_page(client: &Client, cfg: &Config, raw_url: &str) -> Result<String, PipelineError> {
    let url = parse_page_url(raw_url)?;
    logi(format!("Scraping: {}", url));

    let resp = client
        .get(url.clone())
        .header("User-Agent", USER_AGENT)
        .header("Accept-Language", "en-US,en;q=0.9")
        .header("Accept-Encoding", "gzip, deflate, br")
        .header("Connection", "keep-alive")
        .timeout(Duration::from_secs(cfg.http_timeout_secs))
        .send()
        .await
        .map_err(|e| PipelineError::fetch(raw_url, e))?;

    let status = resp.status();
    if !status.is_success() {
        logw(format!("Failed to load page: HTTP {}", status.as_u16()));
        return Err(PipelineError::fetch(raw_url, format!("HTTP {}", status.as_u16())));
    }

    resp.text().await.map_err(|e| PipelineError::fetch(raw_url, e))
}

pub async fn http_get_bytes(client: &Client, url: &str, timeout: Duration) -> Result<Vec<u8>> {
    let resp = client
        .get(url)
        .header("User-Agent", USER_AGENT)
        .timeout(timeout)
        .send()
        .await
        .with_context(|| format!("GET {} failed", url))?;

    let status = resp.status();
    if !status.is_success() {
        anyhow::bail!("GET {} returned HTTP {}", url, status.as_u16());
    }

    let bytes = resp
        .bytes()
        .await
        .with_context(|| format!("Reading body of {} failed", url))?;
    Ok(bytes.to_vec())
}
