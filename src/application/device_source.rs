// Device source trait for telemetry feeds
use crate::domain::reading::{LiveReading, StatisticsSnapshot};
use async_trait::async_trait;

#[async_trait]
pub trait DeviceSource: Send + Sync {
    /// Latest live reading. Timeouts are the implementation's business; each
    /// call resolves exactly once.
    async fn fetch_info(&self) -> anyhow::Result<LiveReading>;

    /// Statistics series recorded on the device before this session started
    async fn fetch_statistics(&self) -> anyhow::Result<StatisticsSnapshot>;
}
