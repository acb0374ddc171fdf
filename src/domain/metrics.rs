// Derived metrics computed from the sample history
use super::buffer::SampleBuffer;
use super::channel::Channel;

/// Hashes per terahash.
const TERA: f64 = 1e12;

/// Fills derived columns for freshly appended rows.
#[derive(Debug, Default, Clone, Copy)]
pub struct DerivedMetricsComputer;

impl DerivedMetricsComputer {
    pub fn new() -> Self {
        Self
    }

    /// Compute the V/F ratio for `index` only. Runs once per append.
    pub fn on_append(&self, buffer: &mut SampleBuffer, index: usize) {
        let voltage = buffer.value(Channel::CoreVoltageSet, index).unwrap_or(0.0);
        let frequency = buffer.value(Channel::Frequency, index).unwrap_or(0.0);
        buffer.set_derived(Channel::VfRatio, index, vf_ratio(voltage, frequency));
    }
}

/// Core voltage setpoint over frequency; zero when the frequency is zero.
pub fn vf_ratio(voltage: f64, frequency: f64) -> f64 {
    if frequency == 0.0 {
        return 0.0;
    }
    let ratio = voltage / frequency;
    if ratio.is_finite() { ratio } else { 0.0 }
}

/// Arithmetic mean; zero for an empty input.
pub fn average<'a, I>(values: I) -> f64
where
    I: IntoIterator<Item = &'a f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Average efficiency in W/TH over paired samples.
///
/// A sample with no hashrate contributes its raw power instead of an
/// infinite ratio.
pub fn efficiency<'a, H, P>(hashrate: H, power: P) -> f64
where
    H: IntoIterator<Item = &'a f64>,
    P: IntoIterator<Item = &'a f64>,
{
    let mut power = power.into_iter();
    let points: Vec<f64> = hashrate
        .into_iter()
        .map(|&h| {
            let p = power.next().copied().unwrap_or(0.0);
            if h > 0.0 { p / (h / TERA) } else { p }
        })
        .collect();
    average(&points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::Sample;

    #[test]
    fn test_ratio_for_appended_index() {
        let mut buffer = SampleBuffer::new(4);
        let computer = DerivedMetricsComputer::new();

        let outcome = buffer.append(&Sample {
            core_voltage_set: 1150.0,
            frequency: 490.0,
            ..Default::default()
        });
        computer.on_append(&mut buffer, outcome.index);
        assert_eq!(buffer.value(Channel::VfRatio, 0), Some(1150.0 / 490.0));

        let outcome = buffer.append(&Sample {
            core_voltage_set: 1150.0,
            frequency: 0.0,
            ..Default::default()
        });
        computer.on_append(&mut buffer, outcome.index);
        assert_eq!(buffer.value(Channel::VfRatio, 1), Some(0.0));
    }

    #[test]
    fn test_efficiency() {
        // 1 TH/s at 15 W, 0 H/s at 10 W
        let hashrate = [1e12, 0.0];
        let power = [15.0, 10.0];
        assert_eq!(efficiency(&hashrate, &power), 12.5);
    }

    #[test]
    fn test_efficiency_empty_and_missing_power() {
        let empty: [f64; 0] = [];
        assert_eq!(efficiency(&empty, &empty), 0.0);
        assert_eq!(efficiency(&[2e12], &empty), 0.0);
    }

    #[test]
    fn test_average() {
        assert_eq!(average(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(average(&Vec::<f64>::new()), 0.0);
    }
}
