// JSON export of the recorded history
use crate::domain::buffer::SampleBuffer;
use crate::domain::channel::Channel;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Download document; field names match what existing tooling reads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub date: String,
    pub labels: Vec<i64>,
    pub hashrate_data: Vec<f64>,
    pub temperature_data: Vec<f64>,
    pub mhz_data: Vec<f64>,
    pub core_voltage_data: Vec<f64>,
    pub core_voltage_current_data: Vec<f64>,
    pub power_data: Vec<f64>,
    pub fanspeed: Vec<f64>,
    pub avghashrate_data: Vec<f64>,
    pub esp_ram: Vec<f64>,
    #[serde(rename = "hashrate_no_error")]
    pub hashrate_no_error: Vec<f64>,
    #[serde(rename = "hashrate_error")]
    pub hashrate_error: Vec<f64>,
}

impl ExportDocument {
    pub fn from_buffer(buffer: &SampleBuffer, at: DateTime<Utc>) -> Self {
        let column = |channel| buffer.channel(channel).iter().copied().collect::<Vec<f64>>();
        Self {
            date: iso_date(at),
            labels: buffer.timestamps().iter().copied().collect(),
            hashrate_data: column(Channel::Hashrate),
            temperature_data: column(Channel::Temperature),
            mhz_data: column(Channel::Frequency),
            core_voltage_data: column(Channel::CoreVoltageSet),
            core_voltage_current_data: column(Channel::CoreVoltageActual),
            power_data: column(Channel::Power),
            fanspeed: column(Channel::FanSpeed),
            avghashrate_data: column(Channel::AvgHashrate),
            esp_ram: column(Channel::FreeHeap),
            hashrate_no_error: column(Channel::HashrateNoError),
            hashrate_error: column(Channel::HashrateError),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn iso_date(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `esp32-miner-data-2024-05-01T12-30-00-000Z.json`
pub fn export_file_name(at: DateTime<Utc>) -> String {
    let stamp = iso_date(at).replace([':', '.'], "-");
    format!("esp32-miner-data-{}.json", stamp)
}
