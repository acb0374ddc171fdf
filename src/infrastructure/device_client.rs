// HTTP client for the miner's system API
use crate::application::device_source::DeviceSource;
use crate::domain::reading::{LiveReading, StatisticsSnapshot};
use crate::infrastructure::config::device_endpoint;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("device returned status {status} for {url}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone)]
pub struct DeviceClient {
    client: reqwest::Client,
    base_url: String,
}

impl DeviceClient {
    pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, DeviceError> {
        let url = device_endpoint(&self.base_url, path);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| DeviceError::Request {
                url: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DeviceError::Status { url, status, body });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| DeviceError::Decode { url, source })
    }
}

#[async_trait]
impl DeviceSource for DeviceClient {
    async fn fetch_info(&self) -> anyhow::Result<LiveReading> {
        Ok(self.get_json("/api/system/info").await?)
    }

    async fn fetch_statistics(&self) -> anyhow::Result<StatisticsSnapshot> {
        let snapshot: StatisticsSnapshot = self.get_json("/api/system/statistics").await?;
        tracing::debug!(
            "Device reported {} recorded samples",
            snapshot.statistics.len()
        );
        Ok(snapshot)
    }
}
