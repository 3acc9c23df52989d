//! HTTP coordinator client
//!
//! The worker-side `WorkSource` for remote coordinators. Every request is
//! bounded by the configured timeout; a timeout, a refused connection or a
//! body that does not decode all surface as `NetworkFailure`, and any non-2xx
//! answer as `CoordinatorRejected`. Nothing is retried here.

use super::protocol::{ErrorResponse, RangeReport, SubmitAck, WorkAssignment, WorkerId};
use crate::error::{SweepError, SweepResult};
use crate::stats::GlobalStatus;
use crate::worker::WorkSource;
use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HttpCoordinatorClient {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

impl HttpCoordinatorClient {
    /// Client for the coordinator at `base_url` (e.g. `http://10.0.0.5:5000`)
    pub fn new(base_url: &str, timeout: Duration) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn network_failure(&self, endpoint: &str, e: reqwest::Error) -> SweepError {
        let reason = if e.is_timeout() {
            format!("timed out after {}s", self.timeout.as_secs_f64())
        } else if e.is_connect() {
            format!("connection failed: {}", e)
        } else if e.is_decode() {
            format!("malformed response: {}", e)
        } else {
            e.to_string()
        };

        SweepError::NetworkFailure {
            endpoint: endpoint.to_string(),
            reason,
        }
    }

    /// Check the status code, then decode the body as `T`
    async fn decode<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> SweepResult<T> {
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorResponse>().await {
                Ok(body) => body.message,
                Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
            };
            return Err(SweepError::CoordinatorRejected {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| self.network_failure(endpoint, e))
    }
}

#[async_trait]
impl WorkSource for HttpCoordinatorClient {
    async fn request_work(&self, worker_id: &WorkerId) -> SweepResult<WorkAssignment> {
        let endpoint = self.endpoint("/get_work");
        debug!("GET {} as {}", endpoint, worker_id);

        let response = self
            .http
            .get(&endpoint)
            .query(&[("worker_id", worker_id.as_str())])
            .send()
            .await
            .map_err(|e| self.network_failure(&endpoint, e))?;

        self.decode(&endpoint, response).await
    }

    async fn submit_result(&self, report: &RangeReport) -> SweepResult<SubmitAck> {
        let endpoint = self.endpoint("/submit_result");
        debug!(
            "POST {} from {} ({} divisors)",
            endpoint,
            report.worker_id,
            report.divisors.len()
        );

        let response = self
            .http
            .post(&endpoint)
            .json(report)
            .send()
            .await
            .map_err(|e| self.network_failure(&endpoint, e))?;

        self.decode(&endpoint, response).await
    }

    async fn status(&self) -> SweepResult<GlobalStatus> {
        let endpoint = self.endpoint("/status");
        let response = self
            .http
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| self.network_failure(&endpoint, e))?;

        self.decode(&endpoint, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_cleanly() {
        let client = HttpCoordinatorClient::new("http://127.0.0.1:5000/", Duration::from_secs(30)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:5000");
        assert_eq!(client.endpoint("/get_work"), "http://127.0.0.1:5000/get_work");
    }

    #[tokio::test]
    async fn test_unreachable_coordinator_is_network_failure() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpCoordinatorClient::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        let err = client.request_work(&WorkerId::new("w1")).await.unwrap_err();
        assert!(matches!(err, SweepError::NetworkFailure { .. }));
        assert!(err.is_network());
    }
}
