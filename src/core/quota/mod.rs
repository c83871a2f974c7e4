//! Usage reporting to the external quota service.
//!
//! Each session reports its engaged seconds exactly once per stop. The
//! service answers with a validity flag; a zero flag means the customer's
//! quota is exhausted and the session must not be restarted until the caller
//! re-validates externally. A second, unconfirmed "beacon" path exists for
//! page teardown, where no response can be awaited.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One flushed interval of engaged session time.
#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    #[serde(rename = "faceId")]
    pub face_id: String,
    #[serde(rename = "addedSeconds")]
    pub added_seconds: u64,
}

/// Quota service response.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct QuotaReceipt {
    /// Non-zero while the customer still has quota left.
    #[serde(rename = "validityFlag")]
    pub validity_flag: u8,
}

impl QuotaReceipt {
    /// True while the customer still has quota left.
    pub fn is_valid(&self) -> bool {
        self.validity_flag != 0
    }
}

/// Error types for quota service operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum QuotaError {
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Base trait for quota services.
#[async_trait]
pub trait QuotaService: Send + Sync {
    /// Report an interval of engaged seconds and learn whether the customer
    /// still has quota left.
    async fn report(&self, usage: UsageReport) -> Result<QuotaReceipt, QuotaError>;

    /// Best-effort variant for page teardown: fire the report without
    /// waiting for, or confirming, a response.
    fn report_detached(&self, usage: UsageReport);
}

/// HTTP quota service client.
pub struct HttpQuotaService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpQuotaService {
    /// Create a client posting reports to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build quota HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl QuotaService for HttpQuotaService {
    async fn report(&self, usage: UsageReport) -> Result<QuotaReceipt, QuotaError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&usage)
            .send()
            .await
            .map_err(|e| QuotaError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuotaError::InvalidResponse(format!(
                "quota service answered {status}"
            )));
        }

        response
            .json::<QuotaReceipt>()
            .await
            .map_err(|e| QuotaError::InvalidResponse(e.to_string()))
    }

    fn report_detached(&self, usage: UsageReport) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        tokio::spawn(async move {
            debug!(
                session_id = %usage.session_id,
                added_seconds = usage.added_seconds,
                "sending detached usage report"
            );
            if let Err(e) = client.post(&endpoint).json(&usage).send().await {
                // Unload-time delivery is best-effort; the interval is lost.
                warn!("detached usage report failed: {e}");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_validity() {
        let valid: QuotaReceipt = serde_json::from_str(r#"{"validityFlag": 1}"#).unwrap();
        assert!(valid.is_valid());

        let exhausted: QuotaReceipt = serde_json::from_str(r#"{"validityFlag": 0}"#).unwrap();
        assert!(!exhausted.is_valid());
    }

    #[test]
    fn test_usage_report_wire_shape() {
        let usage = UsageReport {
            session_id: "s-1".into(),
            face_id: "f-1".into(),
            added_seconds: 7,
        };
        let json = serde_json::to_value(&usage).unwrap();
        assert_eq!(json["sessionId"], "s-1");
        assert_eq!(json["faceId"], "f-1");
        assert_eq!(json["addedSeconds"], 7);
    }
}
