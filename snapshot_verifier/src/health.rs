use std::{fmt, time::Duration};

use anyhow::Context as _;
use async_trait::async_trait;
use olaos_health_check::AppHealthReport;

/// Source of node health reports.
#[async_trait]
pub trait HealthSource: fmt::Debug + Send + Sync {
    /// Fetches the current report. Returns `Ok(None)` if the node cannot be reached,
    /// e.g. because it's starting up or restarting.
    async fn fetch_health(&self) -> anyhow::Result<Option<AppHealthReport>>;
}

/// Fetches reports from the node's `/health` endpoint.
#[derive(Debug, Clone)]
pub struct HttpHealthSource {
    client: reqwest::Client,
    url: String,
}

impl HttpHealthSource {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .context("failed building HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl HealthSource for HttpHealthSource {
    async fn fetch_health(&self) -> anyhow::Result<Option<AppHealthReport>> {
        let response = match self.client.get(&self.url).send().await {
            Ok(response) => response,
            Err(err) if err.is_connect() || err.is_timeout() || err.is_request() => {
                olaos_logs::debug!("Health endpoint {} is unreachable: {err}", self.url);
                return Ok(None);
            }
            Err(err) => return Err(err).with_context(|| format!("GET {}", self.url)),
        };
        // Not-ready nodes answer with 503, but the body is still a full report.
        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => {
                olaos_logs::debug!("Failed reading health response from {}: {err}", self.url);
                return Ok(None);
            }
        };
        let report = serde_json::from_slice(&body).with_context(|| {
            format!(
                "malformed health report from {} (HTTP {status}): {}",
                self.url,
                String::from_utf8_lossy(&body)
            )
        })?;
        Ok(Some(report))
    }
}
