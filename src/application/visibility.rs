// Channel visibility and its persistence contract
use crate::domain::channel::Channel;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Key the visibility array is stored under.
pub const VISIBILITY_KEY: &str = "datasetVisibility";

/// Minimal string key-value store (browser-local-storage shaped).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// Show/hide flag per channel, index-aligned with `Channel::ALL`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelVisibility {
    flags: Vec<bool>,
}

impl Default for ChannelVisibility {
    fn default() -> Self {
        Self {
            flags: vec![true; Channel::COUNT],
        }
    }
}

impl ChannelVisibility {
    /// Accepts only a full-length array.
    pub fn from_flags(flags: Vec<bool>) -> Option<Self> {
        (flags.len() == Channel::COUNT).then_some(Self { flags })
    }

    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    pub fn is_visible(&self, channel: Channel) -> bool {
        self.flags.get(channel.index()).copied().unwrap_or(true)
    }

    /// Flip one channel; `None` for an unknown index.
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let flag = self.flags.get_mut(index)?;
        *flag = !*flag;
        Some(*flag)
    }
}

#[derive(Clone)]
pub struct VisibilityStore {
    store: Arc<dyn KeyValueStore>,
}

impl VisibilityStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn save(&self, flags: &[bool]) -> anyhow::Result<()> {
        let json = serde_json::to_string(flags)?;
        self.store.set(VISIBILITY_KEY, &json)
    }

    /// Stored flags, or `None` if absent, unreadable or the wrong length.
    pub fn load(&self) -> Option<Vec<bool>> {
        let raw = match self.store.get(VISIBILITY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!("Could not read channel visibility: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<Vec<bool>>(&raw) {
            Ok(flags) if flags.len() == Channel::COUNT => Some(flags),
            Ok(flags) => {
                tracing::debug!(
                    "Discarding stored visibility with {} entries, expected {}",
                    flags.len(),
                    Channel::COUNT
                );
                None
            }
            Err(e) => {
                tracing::debug!("Discarding unparsable stored visibility: {}", e);
                None
            }
        }
    }

    /// Stored flags, or all-visible when nothing usable is stored.
    pub fn load_visibility(&self) -> ChannelVisibility {
        self.load()
            .and_then(ChannelVisibility::from_flags)
            .unwrap_or_default()
    }

    /// Write the flags on the blocking pool. Failures are logged, not returned.
    pub async fn persist(&self, flags: Vec<bool>) {
        let store = self.clone();
        match tokio::task::spawn_blocking(move || store.save(&flags)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Failed to persist channel visibility: {}", e),
            Err(e) => tracing::warn!("Visibility persist task failed: {}", e),
        }
    }
}

/// Wait for the renderer, then hand it the flags in effect at that moment.
pub async fn restore_after_ready<F, C>(ready: F, current: C) -> ChannelVisibility
where
    F: Future<Output = ()>,
    C: FnOnce() -> ChannelVisibility,
{
    ready.await;
    current()
}

/// Resolved once the renderer can accept visibility changes.
#[derive(Clone)]
pub struct RendererReadiness {
    tx: Arc<watch::Sender<bool>>,
}

impl RendererReadiness {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn mark_ready(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so this only returns once ready.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

impl Default for RendererReadiness {
    fn default() -> Self {
        Self::new()
    }
}
