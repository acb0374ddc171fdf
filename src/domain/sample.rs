// Sample domain model
use super::reading::{HistoricalRecord, LiveReading};

/// The device reports rates in GH/s; history keeps H/s.
pub const RATE_SCALE: f64 = 1e9;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    pub timestamp_ms: i64,
    pub hashrate: f64,
    pub avg_hashrate: f64,
    pub hashrate_no_error: f64,
    pub hashrate_error: f64,
    pub temperature: f64,
    pub frequency: f64,
    pub core_voltage_set: f64,
    pub core_voltage_actual: f64,
    pub power: f64,
    pub fan_speed_percent: f64,
    pub free_heap_bytes: f64,
}

impl Sample {
    pub fn from_live(reading: &LiveReading, now_ms: i64) -> Self {
        Self {
            timestamp_ms: now_ms,
            hashrate: reading.hash_rate * RATE_SCALE,
            avg_hashrate: reading.avg_hash_rate * RATE_SCALE,
            hashrate_no_error: reading.hash_rate_no_error * RATE_SCALE,
            hashrate_error: reading.hash_rate_error * RATE_SCALE,
            temperature: reading.temp,
            frequency: reading.frequency,
            core_voltage_set: round2(reading.core_voltage),
            core_voltage_actual: reading.core_voltage_actual,
            power: round2(reading.power),
            fan_speed_percent: reading.fanspeed,
            free_heap_bytes: reading.free_heap,
        }
    }

    /// Rebase a historical row onto the local clock.
    ///
    /// `reference_ms` is the device clock at snapshot time; the record offset is
    /// on the same clock, so the absolute time is fixed once here.
    pub fn from_historical(record: &HistoricalRecord, now_ms: i64, reference_ms: i64) -> Self {
        Self {
            timestamp_ms: now_ms - reference_ms + record.timestamp_offset,
            hashrate: record.hashrate * RATE_SCALE,
            avg_hashrate: record.avg_hashrate * RATE_SCALE,
            hashrate_no_error: record.hashrate_no_error * RATE_SCALE,
            hashrate_error: record.hashrate_error * RATE_SCALE,
            temperature: record.temperature,
            frequency: record.frequency,
            core_voltage_set: record.voltage,
            core_voltage_actual: record.voltage_current,
            power: round2(record.power),
            fan_speed_percent: record.fan_speed,
            free_heap_bytes: record.free_heap,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
