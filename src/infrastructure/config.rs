use crate::application::history_service::HistorySettings;
use crate::domain::buffer::DEFAULT_CAPACITY;
use crate::domain::labels::LabelSettings;
use crate::domain::viewport::ViewportSettings;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MonitorConfig {
    #[serde(default)]
    pub device: DeviceSettings,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub labels: LabelsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeviceSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewportConfig {
    #[serde(default = "default_min_visible")]
    pub min_visible: usize,
    #[serde(default = "default_pan_hysteresis")]
    pub pan_hysteresis: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LabelsConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_char_width")]
    pub char_width: f64,
    #[serde(default = "default_margin")]
    pub margin: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_base_url() -> String {
    "http://192.168.4.1".to_string()
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_request_timeout_ms() -> u64 {
    4000
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_min_visible() -> usize {
    ViewportSettings::default().min_visible
}

fn default_pan_hysteresis() -> u32 {
    ViewportSettings::default().pan_hysteresis
}

fn default_max_attempts() -> u32 {
    LabelSettings::default().max_attempts
}

fn default_char_width() -> f64 {
    LabelSettings::default().char_width
}

fn default_margin() -> f64 {
    LabelSettings::default().margin
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("data/settings.json")
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_visible: default_min_visible(),
            pan_hysteresis: default_pan_hysteresis(),
        }
    }
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            char_width: default_char_width(),
            margin: default_margin(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl MonitorConfig {
    pub fn history_settings(&self) -> HistorySettings {
        HistorySettings {
            capacity: self.history.capacity,
            viewport: ViewportSettings {
                min_visible: self.viewport.min_visible,
                pan_hysteresis: self.viewport.pan_hysteresis,
            },
            labels: LabelSettings {
                max_attempts: self.labels.max_attempts,
                char_width: self.labels.char_width,
                margin: self.labels.margin,
                ..LabelSettings::default()
            },
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.device.poll_interval_ms)
    }
}

/// Load `config/monitor.toml` (optional) with `MONITOR__SECTION__KEY` overrides.
pub fn load_monitor_config() -> anyhow::Result<MonitorConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/monitor").required(false))
        .add_source(config::Environment::with_prefix("MONITOR").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Join a device base URL and an API path.
pub fn device_endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_endpoint() {
        assert_eq!(
            device_endpoint("http://10.0.0.7/", "/api/system/info"),
            "http://10.0.0.7/api/system/info"
        );
        assert_eq!(
            device_endpoint("http://miner.local", "api/system/statistics"),
            "http://miner.local/api/system/statistics"
        );
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                "[device]\nbase_url = \"http://10.0.0.7\"\n\n[labels]\nmax_attempts = 6\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: MonitorConfig = settings.try_deserialize().unwrap();

        assert_eq!(config.device.base_url, "http://10.0.0.7");
        assert_eq!(config.poll_interval(), Duration::from_millis(5000));
        let history = config.history_settings();
        assert_eq!(history.capacity, 720);
        assert_eq!(history.viewport.pan_hysteresis, 3);
        assert_eq!(history.labels.max_attempts, 6);
    }
}
