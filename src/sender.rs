// Ships formatted lines to the metrics backend. Fire-and-log: no retry, no re-queue.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::TransmissionError;

#[async_trait]
pub trait MetricSink: Send + Sync {
    async fn send(&self, line: &str) -> Result<(), TransmissionError>;
}

/// Endpoint and credentials for the line-protocol write API.
#[derive(Debug, Clone)]
pub struct InfluxEndpoint {
    pub url: String,
    pub username: String,
    pub api_key: String,
}

/// Influx line-protocol writer over HTTP with basic auth.
pub struct InfluxSender {
    client: reqwest::Client,
    endpoint: InfluxEndpoint,
}

impl InfluxSender {
    pub fn new(endpoint: InfluxEndpoint, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl MetricSink for InfluxSender {
    #[instrument(skip(self, line), fields(operation = "send_line"))]
    async fn send(&self, line: &str) -> Result<(), TransmissionError> {
        let resp = self
            .client
            .post(&self.endpoint.url)
            .header("Content-Type", "text/plain")
            .basic_auth(&self.endpoint.username, Some(&self.endpoint.api_key))
            .body(line.to_string())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransmissionError::Status {
                status: status.as_u16(),
                body,
            });
        }
        debug!(status = status.as_u16(), "line pushed");
        Ok(())
    }
}
