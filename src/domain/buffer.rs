// Bounded multi-channel sample history
use super::channel::Channel;
use super::sample::Sample;
use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 720;

/// Result of a single append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Index of the new sample after any eviction.
    pub index: usize,
    pub evicted: bool,
}

/// Structure-of-arrays ring of samples.
///
/// Every column, the timestamp column included, always has the same length;
/// the only mutators push or pop a row across all columns at once.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    capacity: usize,
    timestamps: VecDeque<i64>,
    columns: [VecDeque<f64>; Channel::COUNT],
}

impl SampleBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            timestamps: VecDeque::with_capacity(capacity + 1),
            columns: std::array::from_fn(|_| VecDeque::with_capacity(capacity + 1)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Push one sample onto every column, then evict the oldest row if the
    /// buffer grew past capacity. Derived columns start at zero.
    pub fn append(&mut self, sample: &Sample) -> AppendOutcome {
        // Keep the time axis monotonic even if the clock stepped back.
        let timestamp = match self.timestamps.back() {
            Some(&last) if sample.timestamp_ms < last => {
                tracing::debug!(
                    "Clamping out-of-order timestamp {} to {}",
                    sample.timestamp_ms,
                    last
                );
                last
            }
            _ => sample.timestamp_ms,
        };

        self.timestamps.push_back(timestamp);
        for channel in Channel::ALL {
            self.columns[channel.index()].push_back(raw_value(sample, channel));
        }

        let evicted = if self.len() > self.capacity {
            self.evict_oldest();
            true
        } else {
            false
        };

        AppendOutcome {
            index: self.len() - 1,
            evicted,
        }
    }

    /// Drop row 0 from every column.
    pub fn evict_oldest(&mut self) -> bool {
        if self.timestamps.pop_front().is_none() {
            return false;
        }
        for column in &mut self.columns {
            column.pop_front();
        }
        true
    }

    pub fn timestamps(&self) -> &VecDeque<i64> {
        &self.timestamps
    }

    pub fn timestamp(&self, index: usize) -> Option<i64> {
        self.timestamps.get(index).copied()
    }

    pub fn channel(&self, channel: Channel) -> &VecDeque<f64> {
        &self.columns[channel.index()]
    }

    pub fn value(&self, channel: Channel, index: usize) -> Option<f64> {
        self.columns[channel.index()].get(index).copied()
    }

    /// Values of one channel over `[start, end)`, clamped to the stored range.
    pub fn slice(&self, channel: Channel, start: usize, end: usize) -> Vec<f64> {
        let end = end.min(self.len());
        let start = start.min(end);
        self.columns[channel.index()]
            .range(start..end)
            .copied()
            .collect()
    }

    /// Overwrite a derived column entry. Raw telemetry columns are immutable.
    pub(crate) fn set_derived(&mut self, channel: Channel, index: usize, value: f64) {
        debug_assert!(channel == Channel::VfRatio, "{:?} is not derived", channel);
        if let Some(slot) = self.columns[channel.index()].get_mut(index) {
            *slot = value;
        }
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

fn raw_value(sample: &Sample, channel: Channel) -> f64 {
    match channel {
        Channel::Hashrate => sample.hashrate,
        Channel::Temperature => sample.temperature,
        Channel::Frequency => sample.frequency,
        Channel::CoreVoltageSet => sample.core_voltage_set,
        Channel::FanSpeed => sample.fan_speed_percent,
        Channel::AvgHashrate => sample.avg_hashrate,
        Channel::CoreVoltageActual => sample.core_voltage_actual,
        Channel::FreeHeap => sample.free_heap_bytes,
        Channel::Power => sample.power,
        Channel::VfRatio => 0.0,
        Channel::HashrateNoError => sample.hashrate_no_error,
        Channel::HashrateError => sample.hashrate_error,
    }
}
