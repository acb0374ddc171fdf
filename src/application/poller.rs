// Poller - Fixed-interval, non-overlapping device fetch loop
use crate::application::device_source::DeviceSource;
use crate::application::history_service::SharedHistory;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub struct Poller {
    source: Arc<dyn DeviceSource>,
    history: SharedHistory,
    interval: Duration,
}

impl Poller {
    pub fn new(source: Arc<dyn DeviceSource>, history: SharedHistory, interval: Duration) -> Self {
        Self {
            source,
            history,
            interval,
        }
    }

    /// Seed from the device's statistics, then poll until `shutdown` flips.
    ///
    /// The next fetch is scheduled only after the previous one resolved, so at
    /// most one request is ever outstanding. A result that lands after
    /// shutdown is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let snapshot = tokio::select! {
            biased;
            _ = shutdown.changed() => return,
            snapshot = self.source.fetch_statistics() => snapshot,
        };
        if *shutdown.borrow() {
            return;
        }
        match snapshot {
            Ok(snapshot) => {
                let now = now_ms();
                self.history.with(|h| h.seed(&snapshot, now));
            }
            Err(e) => tracing::warn!("Failed to load recorded statistics: {:#}", e),
        }

        loop {
            let result = tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                result = self.source.fetch_info() => result,
            };
            if *shutdown.borrow() {
                tracing::debug!("Session ended during fetch, discarding result");
                break;
            }

            match result {
                Ok(reading) => {
                    let now = now_ms();
                    self.history.with(|h| h.record_live(&reading, now));
                }
                Err(e) => tracing::warn!("Device poll failed: {:#}", e),
            }

            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!("Poller stopped");
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::history_service::{HistoryService, HistorySettings};
    use crate::domain::labels::LabelSettings;
    use crate::domain::reading::{LiveReading, StatisticsSnapshot};
    use crate::domain::viewport::ViewportSettings;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted device: fails on `fail_on`, ends the session on `stop_on`.
    struct ScriptedDevice {
        calls: AtomicUsize,
        fail_on: usize,
        stop_on: usize,
        fault_on: usize,
        shutdown: Mutex<Option<watch::Sender<bool>>>,
    }

    #[async_trait]
    impl DeviceSource for ScriptedDevice {
        async fn fetch_info(&self) -> anyhow::Result<LiveReading> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::task::yield_now().await;
            if call == self.stop_on {
                if let Some(tx) = self.shutdown.lock().unwrap().as_ref() {
                    let _ = tx.send(true);
                }
            }
            if call == self.fail_on {
                anyhow::bail!("connection refused");
            }
            Ok(LiveReading {
                hash_rate: call as f64,
                frequency: 500.0,
                core_voltage: 1200.0,
                power_fault: call == self.fault_on,
                ..Default::default()
            })
        }

        async fn fetch_statistics(&self) -> anyhow::Result<StatisticsSnapshot> {
            Ok(StatisticsSnapshot {
                current_timestamp: 0,
                statistics: vec![vec![0.1; 12], vec![0.2; 12]],
            })
        }
    }

    fn history() -> SharedHistory {
        SharedHistory::new(HistoryService::new(HistorySettings {
            capacity: 720,
            viewport: ViewportSettings::default(),
            labels: LabelSettings::default(),
        }))
    }

    #[tokio::test]
    async fn test_poll_until_shutdown_discards_late_result() {
        let (tx, rx) = watch::channel(false);
        let device = Arc::new(ScriptedDevice {
            calls: AtomicUsize::new(0),
            fail_on: 2,
            fault_on: 3,
            stop_on: 5,
            shutdown: Mutex::new(Some(tx)),
        });
        let history = history();
        let poller = Poller::new(device.clone(), history.clone(), Duration::from_millis(1));

        poller.run(rx).await;

        // 2 seeded, calls 1 and 4 recorded; 2 failed, 3 faulted, 5 discarded
        assert_eq!(device.calls.load(Ordering::SeqCst), 5);
        let hashrates: Vec<f64> = history.with(|h| {
            h.buffer()
                .channel(crate::domain::channel::Channel::Hashrate)
                .iter()
                .copied()
                .collect()
        });
        assert_eq!(hashrates, vec![0.1e9, 0.2e9, 1e9, 4e9]);
    }

    #[tokio::test]
    async fn test_shutdown_before_start_skips_everything() {
        let (tx, rx) = watch::channel(false);
        let device = Arc::new(ScriptedDevice {
            calls: AtomicUsize::new(0),
            fail_on: 0,
            fault_on: 0,
            stop_on: 0,
            shutdown: Mutex::new(None),
        });
        tx.send(true).unwrap();

        let history = history();
        Poller::new(device.clone(), history.clone(), Duration::from_millis(1))
            .run(rx)
            .await;

        assert_eq!(device.calls.load(Ordering::SeqCst), 0);
        assert!(history.with(|h| h.buffer().is_empty()));
    }
}
