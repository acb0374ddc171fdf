// Wire shapes reported by the device
use serde::{Deserialize, Deserializer};

/// One poll of `/api/system/info`. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LiveReading {
    #[serde(rename = "hashRate")]
    pub hash_rate: f64,
    #[serde(rename = "avgHashRate", alias = "avghashRate")]
    pub avg_hash_rate: f64,
    #[serde(rename = "hashRate_no_error")]
    pub hash_rate_no_error: f64,
    #[serde(rename = "hashRate_error")]
    pub hash_rate_error: f64,
    pub temp: f64,
    pub frequency: f64,
    #[serde(rename = "coreVoltage")]
    pub core_voltage: f64,
    #[serde(rename = "coreVoltageActual")]
    pub core_voltage_actual: f64,
    pub power: f64,
    pub fanspeed: f64,
    #[serde(rename = "freeHeap")]
    pub free_heap: f64,
    #[serde(deserialize_with = "flag")]
    pub power_fault: bool,

    #[serde(rename = "maxPower")]
    pub max_power: f64,
    #[serde(rename = "nominalVoltage")]
    pub nominal_voltage: f64,
    #[serde(rename = "isUsingFallbackStratum", deserialize_with = "flag")]
    pub is_using_fallback_stratum: bool,
    #[serde(rename = "stratumURL")]
    pub stratum_url: String,
    #[serde(rename = "stratumPort")]
    pub stratum_port: u16,
    #[serde(rename = "stratumUser")]
    pub stratum_user: String,
    #[serde(rename = "fallbackStratumURL")]
    pub fallback_stratum_url: String,
    #[serde(rename = "fallbackStratumPort")]
    pub fallback_stratum_port: u16,
    #[serde(rename = "fallbackStratumUser")]
    pub fallback_stratum_user: String,
}

/// The firmware reports some booleans as 0/1.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    })
}

/// Response of `/api/system/statistics`, fetched once per session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatisticsSnapshot {
    #[serde(rename = "currentTimestamp", default)]
    pub current_timestamp: i64,
    #[serde(default)]
    pub statistics: Vec<Vec<f64>>,
}

/// One fixed-position row of the statistics series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistoricalRecord {
    pub hashrate: f64,
    pub temperature: f64,
    pub power: f64,
    pub timestamp_offset: i64,
    pub voltage: f64,
    pub frequency: f64,
    pub fan_speed: f64,
    pub avg_hashrate: f64,
    pub voltage_current: f64,
    pub free_heap: f64,
    pub hashrate_no_error: f64,
    pub hashrate_error: f64,
}

impl HistoricalRecord {
    /// Read a row by position. Short rows are padded with zeroes.
    pub fn from_row(row: &[f64]) -> Self {
        let at = |i: usize| row.get(i).copied().unwrap_or(0.0);
        Self {
            hashrate: at(0),
            temperature: at(1),
            power: at(2),
            timestamp_offset: at(3) as i64,
            voltage: at(4),
            frequency: at(5),
            fan_speed: at(6),
            avg_hashrate: at(7),
            voltage_current: at(8),
            free_heap: at(9),
            hashrate_no_error: at(10),
            hashrate_error: at(11),
        }
    }
}

impl StatisticsSnapshot {
    pub fn records(&self) -> impl Iterator<Item = HistoricalRecord> + '_ {
        self.statistics.iter().map(|row| HistoricalRecord::from_row(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_reading_tolerates_missing_fields() {
        let reading: LiveReading =
            serde_json::from_str(r#"{"hashRate": 0.5, "temp": 55.5, "power_fault": 1}"#).unwrap();
        assert_eq!(reading.hash_rate, 0.5);
        assert_eq!(reading.temp, 55.5);
        assert_eq!(reading.frequency, 0.0);
        assert!(reading.power_fault);
        assert!(!reading.is_using_fallback_stratum);
    }

    #[test]
    fn test_statistics_rows_by_position() {
        let snapshot: StatisticsSnapshot = serde_json::from_str(
            r#"{"currentTimestamp": 1000,
                "statistics": [[0.5, 55, 12.3, 0, 1150, 490, 60, 0.48, 1140, 190000, 0.49, 0.01],
                               [0.6, 56]]}"#,
        )
        .unwrap();

        let records: Vec<_> = snapshot.records().collect();
        assert_eq!(snapshot.current_timestamp, 1000);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].voltage, 1150.0);
        assert_eq!(records[0].frequency, 490.0);
        assert_eq!(records[0].hashrate_error, 0.01);
        assert_eq!(records[1].temperature, 56.0);
        assert_eq!(records[1].power, 0.0);
    }
}
