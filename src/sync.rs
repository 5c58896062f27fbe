//! Daily-summary sync client for the hosted backend.
//!
//! Tracking totals are periodically upserted into the `daily_summaries`
//! table, keyed by `(user_id, summary_date)` so repeated writes for the same
//! day merge instead of accumulating. The engine never depends on this
//! succeeding; a failed upsert is logged and retried on the next tick.

use crate::engine::StepSnapshot;
use serde::{Deserialize, Serialize};

/// Sync client configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Backend base URL, e.g. `https://project.supabase.co`.
    pub base_url: String,
    /// API key sent as both `apikey` and Bearer token.
    pub api_key: String,
}

impl SyncConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Upsert endpoint for daily summaries; conflicts on the composite key
    /// merge into the existing row.
    pub fn summaries_url(&self) -> String {
        format!(
            "{}/rest/v1/daily_summaries?on_conflict=user_id,summary_date",
            self.base_url.trim_end_matches('/')
        )
    }
}

/// Sync error types.
#[derive(Debug)]
pub enum SyncError {
    /// Network/HTTP error
    Network(String),
    /// Server returned an error response
    Server { status: u16, message: String },
    /// Runtime or client construction error
    Runtime(String),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Network(msg) => write!(f, "sync network error: {msg}"),
            SyncError::Server { status, message } => {
                write!(f, "sync server error ({status}): {message}")
            }
            SyncError::Runtime(msg) => write!(f, "sync runtime error: {msg}"),
        }
    }
}

impl std::error::Error for SyncError {}

/// One row of the daily summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub user_id: String,
    /// Local calendar date, `YYYY-MM-DD`.
    pub summary_date: String,
    pub total_steps: u64,
    pub total_calories: f64,
}

impl DailySummary {
    /// Build a row from the current aggregate for the given user and date.
    pub fn from_snapshot(user_id: &str, summary_date: &str, snapshot: &StepSnapshot) -> Self {
        Self {
            user_id: user_id.to_string(),
            summary_date: summary_date.to_string(),
            total_steps: snapshot.steps,
            total_calories: snapshot.calories,
        }
    }
}

/// Resolve today's calendar date in the given IANA timezone.
///
/// Unknown timezone names fall back to UTC rather than failing the upsert.
pub fn local_date(timezone: &str) -> String {
    let tz: chrono_tz::Tz = timezone.parse().unwrap_or(chrono_tz::Tz::UTC);
    chrono::Utc::now()
        .with_timezone(&tz)
        .format("%Y-%m-%d")
        .to_string()
}

/// Async sync client.
#[cfg(feature = "sync")]
pub struct SummaryClient {
    config: SyncConfig,
    client: reqwest::Client,
    device_id: String,
}

#[cfg(feature = "sync")]
impl SummaryClient {
    pub fn new(config: SyncConfig) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| SyncError::Runtime(e.to_string()))?;

        // Device ID from hostname + instance, for request attribution.
        let host = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let device_id = format!("stride-{}-{}", host, &uuid::Uuid::new_v4().to_string()[..8]);

        Ok(Self {
            config,
            client,
            device_id,
        })
    }

    /// Idempotent upsert of one daily summary row.
    pub async fn upsert_summary(&self, summary: &DailySummary) -> Result<(), SyncError> {
        let response = self
            .client
            .post(self.config.summaries_url())
            .header("apikey", &self.config.api_key)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Prefer", "resolution=merge-duplicates")
            .header("X-Device-Id", &self.device_id)
            .json(summary)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SyncError::Server {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

/// Blocking sync client for use inside the tracking worker thread.
#[cfg(feature = "sync")]
pub struct BlockingSummaryClient {
    inner: SummaryClient,
    runtime: tokio::runtime::Runtime,
}

#[cfg(feature = "sync")]
impl BlockingSummaryClient {
    pub fn new(config: SyncConfig) -> Result<Self, SyncError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SyncError::Runtime(format!("failed to create runtime: {e}")))?;

        Ok(Self {
            inner: SummaryClient::new(config)?,
            runtime,
        })
    }

    pub fn upsert_summary(&self, summary: &DailySummary) -> Result<(), SyncError> {
        self.runtime.block_on(self.inner.upsert_summary(summary))
    }

    pub fn device_id(&self) -> &str {
        self.inner.device_id()
    }
}
