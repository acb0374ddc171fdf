// Axis bounds handed to the renderer on every redraw
use super::buffer::SampleBuffer;
use super::channel::Channel;
use super::viewport::{IndexWindow, TimeWindow};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelAxis {
    pub channel: Channel,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub suggested_max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisBounds {
    /// Time range of the visible window; `None` while the window is unresolved.
    pub x: Option<TimeWindow>,
    pub y: Vec<ChannelAxis>,
}

/// Build a fresh axis description from the buffer and the resolved window.
pub fn compute_axis_bounds(buffer: &SampleBuffer, window: Option<IndexWindow>) -> AxisBounds {
    let x = window.and_then(|w| w.to_time_window(buffer));
    let hashrate = finite_extent(buffer.channel(Channel::Hashrate).iter().copied());

    let y = Channel::ALL
        .iter()
        .map(|&channel| {
            // Both hashrate curves share one scale so they overlay.
            let pinned = match channel {
                Channel::Hashrate | Channel::AvgHashrate => hashrate,
                _ => None,
            };
            ChannelAxis {
                channel,
                min: pinned.map(|(lo, _)| lo),
                max: pinned.map(|(_, hi)| hi),
                suggested_max: channel.suggested_max(),
            }
        })
        .collect();

    AxisBounds { x, y }
}

impl AxisBounds {
    pub fn axis(&self, channel: Channel) -> Option<&ChannelAxis> {
        self.y.iter().find(|a| a.channel == channel)
    }

    /// Value range used to project `visible` values of `channel` onto the plot.
    pub fn value_range(&self, channel: Channel, visible: &[f64]) -> (f64, f64) {
        let axis = self.axis(channel);
        let extent = finite_extent(visible.iter().copied());

        let lo = axis
            .and_then(|a| a.min)
            .or(extent.map(|(lo, _)| lo))
            .unwrap_or(0.0);
        let mut hi = axis
            .and_then(|a| a.max)
            .or(extent.map(|(_, hi)| hi))
            .unwrap_or(lo);
        if let Some(suggested) = axis.and_then(|a| a.suggested_max) {
            if axis.and_then(|a| a.max).is_none() {
                hi = hi.max(suggested);
            }
        }

        if hi <= lo { (lo, lo + 1.0) } else { (lo, hi) }
    }
}

fn finite_extent(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
