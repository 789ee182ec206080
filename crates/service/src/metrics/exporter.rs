//! Metrics push over HTTP.

use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use super::{MetricsError, MetricsSnapshot, otlp};
use crate::config::MetricsConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Destination for metrics snapshots.
pub trait MetricsSink: Send + Sync + 'static {
    /// Deliver one snapshot.
    fn push(
        &self,
        snapshot: &MetricsSnapshot,
    ) -> impl Future<Output = Result<(), MetricsError>> + Send;
}

/// Pushes snapshots as OTLP/JSON to an HTTP endpoint with bearer auth.
pub struct MetricsExporter {
    client: Client,
    url: String,
    api_key: SecretString,
    source: String,
}

impl MetricsExporter {
    /// Create a new exporter.
    ///
    /// # Errors
    ///
    /// Returns `MetricsError::Http` if the HTTP client cannot be built.
    pub fn new(config: &MetricsConfig) -> Result<Self, MetricsError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            source: config.source.clone(),
        })
    }
}

impl MetricsSink for MetricsExporter {
    async fn push(&self, snapshot: &MetricsSnapshot) -> Result<(), MetricsError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let payload = otlp::build_payload(
            snapshot,
            &self.source,
            u64::try_from(now).unwrap_or(u64::MAX),
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetricsError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}
