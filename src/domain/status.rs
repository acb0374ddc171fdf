// Device status derived from the latest poll
use super::reading::LiveReading;
use serde::Serialize;

const TEMP_FLOOR: f64 = 75.0;
const FREQUENCY_FLOOR: f64 = 800.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PoolRole {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivePool {
    pub role: PoolRole,
    pub url: String,
    pub port: u16,
    pub user: String,
}

/// Side-channel state refreshed on every poll, fault ticks included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStatus {
    pub max_power: f64,
    pub nominal_voltage: f64,
    pub max_temp: f64,
    pub max_frequency: f64,
    pub power_fault: bool,
    pub active_pool: Option<ActivePool>,
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self {
            max_power: 0.0,
            nominal_voltage: 0.0,
            max_temp: TEMP_FLOOR,
            max_frequency: FREQUENCY_FLOOR,
            power_fault: false,
            active_pool: None,
        }
    }
}

impl DeviceStatus {
    pub fn update(&mut self, reading: &LiveReading) {
        self.max_power = reading.max_power.max(reading.power);
        self.nominal_voltage = reading.nominal_voltage;
        self.max_temp = TEMP_FLOOR.max(reading.temp);
        self.max_frequency = FREQUENCY_FLOOR.max(reading.frequency);
        self.power_fault = reading.power_fault;

        self.active_pool = Some(if reading.is_using_fallback_stratum {
            ActivePool {
                role: PoolRole::Fallback,
                url: reading.fallback_stratum_url.clone(),
                port: reading.fallback_stratum_port,
                user: reading.fallback_stratum_user.clone(),
            }
        } else {
            ActivePool {
                role: PoolRole::Primary,
                url: reading.stratum_url.clone(),
                port: reading.stratum_port,
                user: reading.stratum_user.clone(),
            }
        });
    }
}
