// History service - Owns the session's sample history and chart state
use crate::application::visibility::ChannelVisibility;
use crate::domain::axis::{compute_axis_bounds, AxisBounds};
use crate::domain::buffer::{AppendOutcome, SampleBuffer};
use crate::domain::channel::Channel;
use crate::domain::labels::{LabelPlacer, LabelSettings, PlacedLabel, PlotArea, Projection};
use crate::domain::metrics::{average, efficiency, DerivedMetricsComputer};
use crate::domain::reading::{LiveReading, StatisticsSnapshot};
use crate::domain::sample::Sample;
use crate::domain::status::DeviceStatus;
use crate::domain::viewport::{DragPhase, IndexWindow, Viewport, ViewportSettings};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Copy)]
pub struct HistorySettings {
    pub capacity: usize,
    pub viewport: ViewportSettings,
    pub labels: LabelSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesView {
    pub channel: Channel,
    pub label: &'static str,
    pub visible: bool,
    pub values: Vec<f64>,
    pub labels: Vec<PlacedLabel>,
}

/// Everything the renderer needs for one redraw.
#[derive(Debug, Clone, Serialize)]
pub struct ChartView {
    pub window: Option<IndexWindow>,
    pub visible_count: usize,
    pub position_offset: i64,
    pub axis: AxisBounds,
    pub timestamps: Vec<i64>,
    pub series: Vec<SeriesView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub samples: usize,
    pub capacity: usize,
    pub average_hashrate: f64,
    /// W/TH averaged over the history.
    pub efficiency: f64,
    pub status: DeviceStatus,
}

pub struct HistoryService {
    buffer: SampleBuffer,
    derived: DerivedMetricsComputer,
    viewport: Viewport,
    window: Option<IndexWindow>,
    status: DeviceStatus,
    visibility: ChannelVisibility,
    label_settings: LabelSettings,
}

impl HistoryService {
    pub fn new(settings: HistorySettings) -> Self {
        Self {
            buffer: SampleBuffer::new(settings.capacity),
            derived: DerivedMetricsComputer::new(),
            viewport: Viewport::new(settings.viewport),
            window: None,
            status: DeviceStatus::default(),
            visibility: ChannelVisibility::default(),
            label_settings: settings.labels,
        }
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn status(&self) -> &DeviceStatus {
        &self.status
    }

    pub fn visibility(&self) -> &ChannelVisibility {
        &self.visibility
    }

    /// Append a sample and run the per-append bookkeeping.
    pub fn append(&mut self, sample: &Sample) -> AppendOutcome {
        let outcome = self.buffer.append(sample);
        self.derived.on_append(&mut self.buffer, outcome.index);
        let window = self.viewport.on_append(outcome.evicted, self.buffer.len());
        self.update_window(window);
        outcome
    }

    /// Replay the device's recorded statistics, then show all of them.
    pub fn seed(&mut self, snapshot: &StatisticsSnapshot, now_ms: i64) -> usize {
        let mut count = 0;
        for record in snapshot.records() {
            let sample = Sample::from_historical(&record, now_ms, snapshot.current_timestamp);
            self.append(&sample);
            count += 1;
        }

        let window = self.viewport.reset_to(self.buffer.len());
        self.update_window(window);
        tracing::info!("Seeded history with {} recorded samples", count);
        count
    }

    /// Apply one live poll. Fault ticks update status but are not recorded.
    pub fn record_live(&mut self, reading: &LiveReading, now_ms: i64) -> Option<AppendOutcome> {
        self.status.update(reading);
        if reading.power_fault {
            tracing::debug!("Power fault reported, skipping sample");
            return None;
        }
        Some(self.append(&Sample::from_live(reading, now_ms)))
    }

    pub fn zoom(&mut self, delta_y: f64) -> Option<IndexWindow> {
        let window = self.viewport.zoom(delta_y, self.buffer.len());
        self.update_window(window);
        self.window
    }

    pub fn drag(&mut self, phase: DragPhase, x: f64) -> Option<IndexWindow> {
        let window = self.viewport.apply_drag(phase, x, self.buffer.len());
        self.update_window(window);
        self.window
    }

    /// An unresolved call keeps the previous window on screen.
    fn update_window(&mut self, window: Option<IndexWindow>) {
        if window.is_some() {
            self.window = window;
        }
    }

    pub fn set_visibility(&mut self, visibility: ChannelVisibility) {
        self.visibility = visibility;
    }

    /// Flip one channel in memory. The caller persists the new flags.
    pub fn toggle_channel(&mut self, index: usize) -> Option<bool> {
        self.visibility.toggle(index)
    }

    pub fn summary(&self) -> Summary {
        Summary {
            samples: self.buffer.len(),
            capacity: self.buffer.capacity(),
            average_hashrate: average(self.buffer.channel(Channel::Hashrate)),
            efficiency: efficiency(
                self.buffer.channel(Channel::Hashrate),
                self.buffer.channel(Channel::Power),
            ),
            status: self.status.clone(),
        }
    }

    /// Build the redraw payload for a plot of `width` x `height` pixels.
    /// Labels are laid out from scratch on every call.
    pub fn chart_view(&self, width: f64, height: f64) -> ChartView {
        let axis = compute_axis_bounds(&self.buffer, self.window);
        let range = self
            .window
            .map(|w| w.stored_range(self.buffer.len()))
            .unwrap_or(0..0);
        let area = PlotArea::new(width, height);
        let mut placer = LabelPlacer::new(self.label_settings);

        let timestamps = self.buffer.timestamps().range(range.clone()).copied().collect();
        let series = Channel::ALL
            .iter()
            .map(|&channel| {
                let values = self.buffer.slice(channel, range.start, range.end);
                let visible = self.visibility.is_visible(channel);
                let labels = if visible {
                    let projection = Projection {
                        area,
                        points: values.len(),
                        value_range: axis.value_range(channel, &values),
                    };
                    placer.place_series(channel, range.start, &values, &projection)
                } else {
                    Vec::new()
                };
                SeriesView {
                    channel,
                    label: channel.label(),
                    visible,
                    values,
                    labels,
                }
            })
            .collect();

        ChartView {
            window: self.window,
            visible_count: self.viewport.visible_count(),
            position_offset: self.viewport.position_offset(),
            axis,
            timestamps,
            series,
        }
    }
}

/// Shared handle; each closure runs to completion under the lock.
#[derive(Clone)]
pub struct SharedHistory(Arc<Mutex<HistoryService>>);

impl SharedHistory {
    pub fn new(service: HistoryService) -> Self {
        Self(Arc::new(Mutex::new(service)))
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut HistoryService) -> R) -> R {
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
