// Telemetry channel catalogue
use serde::Serialize;

/// Displayable channels in declaration order.
///
/// The order is part of the persisted visibility contract: index `i` of a
/// saved visibility array refers to `Channel::ALL[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Channel {
    Hashrate,
    Temperature,
    Frequency,
    CoreVoltageSet,
    FanSpeed,
    AvgHashrate,
    CoreVoltageActual,
    FreeHeap,
    Power,
    VfRatio,
    HashrateNoError,
    HashrateError,
}

impl Channel {
    pub const COUNT: usize = 12;

    pub const ALL: [Channel; Self::COUNT] = [
        Channel::Hashrate,
        Channel::Temperature,
        Channel::Frequency,
        Channel::CoreVoltageSet,
        Channel::FanSpeed,
        Channel::AvgHashrate,
        Channel::CoreVoltageActual,
        Channel::FreeHeap,
        Channel::Power,
        Channel::VfRatio,
        Channel::HashrateNoError,
        Channel::HashrateError,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::Hashrate => "Hashrate",
            Channel::Temperature => "ASIC Temp",
            Channel::Frequency => "ASIC Freq",
            Channel::CoreVoltageSet => "VoltSet",
            Channel::FanSpeed => "Fan",
            Channel::AvgHashrate => "AvgHashrate",
            Channel::CoreVoltageActual => "VoltCurrent",
            Channel::FreeHeap => "EspRam",
            Channel::Power => "Power",
            Channel::VfRatio => "V/F Ratio",
            Channel::HashrateNoError => "Hashrate no error",
            Channel::HashrateError => "Hashrate error",
        }
    }

    pub fn is_rate(self) -> bool {
        matches!(
            self,
            Channel::Hashrate
                | Channel::AvgHashrate
                | Channel::HashrateNoError
                | Channel::HashrateError
        )
    }

    /// Upper bound the renderer should reach for even if the data stays lower.
    pub fn suggested_max(self) -> Option<f64> {
        match self {
            Channel::Temperature => Some(80.0),
            Channel::Frequency | Channel::CoreVoltageSet | Channel::CoreVoltageActual => {
                Some(1200.0)
            }
            Channel::FanSpeed => Some(100.0),
            Channel::Power => Some(40.0),
            Channel::VfRatio => Some(2.5),
            _ => None,
        }
    }

    /// Text shown in a value label for this channel.
    pub fn format_value(self, value: f64) -> String {
        match self {
            c if c.is_rate() => format_hashrate(value),
            Channel::VfRatio => format!("{:.4}", sanitize(value)),
            Channel::Temperature => format!("{}°C", value),
            Channel::Frequency => format!("{}mHz", value),
            Channel::CoreVoltageSet | Channel::CoreVoltageActual => format!("{}mv", value),
            Channel::FanSpeed => format!("{}%", value),
            Channel::FreeHeap => format!("{}B", value),
            Channel::Power => format!("{}W", value),
            _ => value.to_string(),
        }
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

const RATE_SUFFIXES: [&str; 7] = [" H/s", " KH/s", " MH/s", " GH/s", " TH/s", " PH/s", " EH/s"];

/// Format a hashrate in H/s with a decimal SI suffix, e.g. `1.20 TH/s`.
pub fn format_hashrate(value: f64) -> String {
    let value = sanitize(value);
    if value <= 0.0 {
        return format!("0{}", RATE_SUFFIXES[0]);
    }

    let power = (value.log10() / 3.0).floor().max(0.0) as usize;
    let power = power.min(RATE_SUFFIXES.len() - 1);
    let scaled = value / 1000f64.powi(power as i32);
    format!("{:.2}{}", scaled, RATE_SUFFIXES[power])
}
