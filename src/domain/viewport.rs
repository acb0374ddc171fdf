// Viewport controller - maps zoom and pan gestures to a window over the history
use super::buffer::SampleBuffer;
use serde::{Deserialize, Serialize};

/// Visible samples per unit of zoom/pan step.
const STEP_DIVISOR: i64 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSettings {
    /// Smallest number of samples the view may show.
    pub min_visible: usize,
    /// Pointer-move events consumed per pan step while dragging.
    pub pan_hysteresis: u32,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            min_visible: 5,
            pan_hysteresis: 3,
        }
    }
}

/// Resolved index range `[min, max]` over the buffer.
///
/// `max` may equal the buffer length, one past the last stored sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexWindow {
    pub min: usize,
    pub max: usize,
}

impl IndexWindow {
    /// Indices actually stored in a buffer of `len` samples.
    pub fn stored_range(&self, len: usize) -> std::ops::Range<usize> {
        let end = (self.max + 1).min(len);
        self.min.min(end)..end
    }

    /// Translate to the time domain for the renderer.
    pub fn to_time_window(&self, buffer: &SampleBuffer) -> Option<TimeWindow> {
        let last = buffer.len().checked_sub(1)?;
        Some(TimeWindow {
            min_ms: buffer.timestamp(self.min.min(last))?,
            max_ms: buffer.timestamp(self.max.min(last))?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub min_ms: i64,
    pub max_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragPhase {
    Start,
    Move,
    End,
}

#[derive(Debug, Clone, Copy, Default)]
struct DragState {
    anchor_x: f64,
    pending_moves: u32,
}

/// Zoom/pan state over the sample history.
///
/// `visible_count` is how many of the newest samples are shown and
/// `position_offset` (never positive) how far the view is panned back from
/// the live edge.
#[derive(Debug, Clone)]
pub struct Viewport {
    settings: ViewportSettings,
    visible_count: i64,
    position_offset: i64,
    drag: Option<DragState>,
}

impl Viewport {
    pub fn new(settings: ViewportSettings) -> Self {
        Self {
            settings,
            visible_count: 0,
            position_offset: 0,
            drag: None,
        }
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count.max(0) as usize
    }

    pub fn position_offset(&self) -> i64 {
        self.position_offset
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn step(&self) -> i64 {
        (self.visible_count / STEP_DIVISOR).max(1)
    }

    fn clamp(&mut self, len: usize) {
        let len = len as i64;
        let floor = self.settings.min_visible as i64;
        self.visible_count = self.visible_count.min(len).max(floor);
        self.position_offset = self.position_offset.min(0);
    }

    /// Show the whole buffer, tracking the live edge.
    pub fn reset_to(&mut self, len: usize) -> Option<IndexWindow> {
        self.visible_count = len as i64;
        self.position_offset = 0;
        self.clamp(len);
        self.resolve(len)
    }

    /// Wheel input: a positive delta zooms out, anything else zooms in.
    pub fn zoom(&mut self, delta_y: f64, len: usize) -> Option<IndexWindow> {
        let step = self.step();
        if delta_y > 0.0 {
            self.visible_count += step;
        } else {
            self.visible_count -= step;
        }
        self.clamp(len);
        self.resolve(len)
    }

    pub fn drag_start(&mut self, x: f64) {
        self.drag = Some(DragState {
            anchor_x: x,
            pending_moves: 0,
        });
    }

    pub fn drag_end(&mut self) {
        self.drag = None;
    }

    /// Pointer move. Only every `pan_hysteresis`-th move while dragging pans.
    pub fn drag_move(&mut self, x: f64, len: usize) -> Option<IndexWindow> {
        let step = self.step();
        let hysteresis = self.settings.pan_hysteresis.max(1);

        if let Some(drag) = self.drag.as_mut() {
            drag.pending_moves += 1;
            if drag.pending_moves >= hysteresis {
                drag.pending_moves = 0;
                if x < drag.anchor_x {
                    self.position_offset += step;
                } else if x > drag.anchor_x {
                    self.position_offset -= step;
                }
                drag.anchor_x = x;
                self.position_offset = self.position_offset.min(0);
            }
        }
        self.resolve(len)
    }

    pub fn apply_drag(&mut self, phase: DragPhase, x: f64, len: usize) -> Option<IndexWindow> {
        match phase {
            DragPhase::Start => {
                self.drag_start(x);
                self.resolve(len)
            }
            DragPhase::Move => self.drag_move(x, len),
            DragPhase::End => {
                self.drag_end();
                self.resolve(len)
            }
        }
    }

    /// Bookkeeping after a buffer append.
    ///
    /// At the live edge the window grows with the data; panned back it
    /// shrinks. An eviction removes one more visible sample.
    pub fn on_append(&mut self, evicted: bool, len: usize) -> Option<IndexWindow> {
        if self.position_offset == 0 {
            self.visible_count += 1;
        } else {
            self.visible_count -= 1;
        }
        if evicted {
            self.visible_count -= 1;
        }
        self.clamp(len);
        self.resolve(len)
    }

    /// Map the current state onto a buffer of `len` samples.
    ///
    /// If the window would start before the buffer, the pan offset creeps one
    /// step toward the live edge and no window is produced for this call.
    /// A buffer shorter than the zoom floor is shown whole.
    pub fn resolve(&mut self, len: usize) -> Option<IndexWindow> {
        if len == 0 {
            return None;
        }
        if len < self.settings.min_visible {
            return Some(IndexWindow { min: 0, max: len });
        }

        let len_i = len as i64;
        let mut min = len_i - self.visible_count + self.position_offset;
        if min < 0 {
            self.position_offset = (self.position_offset + 1).min(0);
            return None;
        }

        let max = (len_i + self.position_offset).min(len_i);
        if min >= len_i {
            min = (len_i - self.settings.min_visible as i64).max(0);
        }

        Some(IndexWindow {
            min: min as usize,
            max: max.max(min) as usize,
        })
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ViewportSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::Sample;

    fn filled(len: usize) -> (SampleBuffer, Viewport) {
        let mut buffer = SampleBuffer::new(720);
        let mut viewport = Viewport::default();
        for i in 0..len {
            let outcome = buffer.append(&Sample {
                timestamp_ms: i as i64 * 1000,
                ..Default::default()
            });
            viewport.on_append(outcome.evicted, buffer.len());
        }
        (buffer, viewport)
    }

    #[test]
    fn test_live_edge_window_covers_buffer() {
        let (buffer, mut viewport) = filled(100);
        assert_eq!(viewport.visible_count(), 100);
        assert_eq!(viewport.resolve(buffer.len()), Some(IndexWindow { min: 0, max: 100 }));
    }

    #[test]
    fn test_zoom_step_scales_with_visible_count() {
        let (buffer, mut viewport) = filled(200);
        // 200 / 40 = 5 per notch
        viewport.zoom(-1.0, buffer.len());
        assert_eq!(viewport.visible_count(), 195);
        // 195 / 40 = 4 per notch
        viewport.zoom(1.0, buffer.len());
        assert_eq!(viewport.visible_count(), 199);
        // Capped at the buffer length
        viewport.zoom(1.0, buffer.len());
        assert_eq!(viewport.visible_count(), 200);
    }

    #[test]
    fn test_zoom_never_below_minimum() {
        let (buffer, mut viewport) = filled(20);
        for _ in 0..50 {
            viewport.zoom(-1.0, buffer.len());
        }
        assert_eq!(viewport.visible_count(), 5);
        assert_eq!(viewport.resolve(buffer.len()), Some(IndexWindow { min: 15, max: 20 }));
    }

    #[test]
    fn test_pan_applies_every_third_move() {
        let (buffer, mut viewport) = filled(100);
        viewport.zoom(-1.0, buffer.len());
        let len = buffer.len();

        viewport.drag_start(500.0);
        viewport.drag_move(510.0, len);
        viewport.drag_move(520.0, len);
        assert_eq!(viewport.position_offset(), 0);
        viewport.drag_move(530.0, len);
        // Dragging right looks back in time
        assert_eq!(viewport.position_offset(), -2);

        for x in [520.0, 510.0, 500.0] {
            viewport.drag_move(x, len);
        }
        assert_eq!(viewport.position_offset(), 0);
        // Cannot pan past the live edge
        for x in [490.0, 480.0, 470.0] {
            viewport.drag_move(x, len);
        }
        assert_eq!(viewport.position_offset(), 0);
    }

    #[test]
    fn test_moves_without_drag_are_ignored() {
        let (buffer, mut viewport) = filled(100);
        for x in 0..10 {
            viewport.drag_move(x as f64 * 10.0, buffer.len());
        }
        assert_eq!(viewport.position_offset(), 0);

        viewport.apply_drag(DragPhase::Start, 0.0, buffer.len());
        assert!(viewport.is_dragging());
        viewport.apply_drag(DragPhase::End, 0.0, buffer.len());
        assert!(!viewport.is_dragging());
    }

    #[test]
    fn test_drift_guard_creeps_toward_live_edge() {
        let (buffer, mut viewport) = filled(100);
        let len = buffer.len();
        viewport.drag_start(0.0);
        for i in 1..=30 {
            viewport.drag_move(i as f64 * 10.0, len);
        }
        // Window runs off the start: each resolve nudges the offset once
        let before = viewport.position_offset();
        assert!(before < 0);
        assert_eq!(viewport.resolve(len), None);
        assert_eq!(viewport.position_offset(), before + 1);
    }

    #[test]
    fn test_resolve_bounds_hold_for_gesture_sequences() {
        let (buffer, mut viewport) = filled(300);
        let len = buffer.len();
        let mut x = 0.0;
        viewport.drag_start(x);
        for i in 0..2000u32 {
            let window = match i % 7 {
                0 | 3 => viewport.zoom(if i % 2 == 0 { 1.0 } else { -1.0 }, len),
                1 | 4 | 5 => {
                    x += if i % 11 < 6 { 7.0 } else { -5.0 };
                    viewport.drag_move(x, len)
                }
                _ => viewport.resolve(len),
            };
            if let Some(window) = window {
                assert!(window.max <= len);
                assert!(window.min <= window.max);
            }
            assert!(viewport.position_offset() <= 0);
        }
    }

    #[test]
    fn test_eviction_shrinks_visible_count() {
        let (mut buffer, mut viewport) = filled(720);
        let before = viewport.visible_count();
        assert_eq!(before, 720);

        let outcome = buffer.append(&Sample {
            timestamp_ms: 720_000,
            ..Default::default()
        });
        assert!(outcome.evicted);
        viewport.on_append(outcome.evicted, buffer.len());
        // +1 for the live edge, -1 for the evicted sample
        assert_eq!(viewport.visible_count(), before);
        assert_eq!(buffer.timestamp(0), Some(1000));
    }

    #[test]
    fn test_panned_view_shrinks_on_append() {
        let (mut buffer, mut viewport) = filled(100);
        viewport.zoom(-1.0, buffer.len());
        viewport.drag_start(0.0);
        for x in [10.0, 20.0, 30.0] {
            viewport.drag_move(x, buffer.len());
        }
        let visible = viewport.visible_count();
        let outcome = buffer.append(&Sample {
            timestamp_ms: 100_000,
            ..Default::default()
        });
        viewport.on_append(outcome.evicted, buffer.len());
        assert_eq!(viewport.visible_count(), visible - 1);
    }

    #[test]
    fn test_time_window_lookup() {
        let (buffer, mut viewport) = filled(10);
        let window = viewport.resolve(buffer.len()).unwrap();
        assert_eq!(
            window.to_time_window(&buffer),
            Some(TimeWindow { min_ms: 0, max_ms: 9000 })
        );
        assert_eq!(window.stored_range(buffer.len()), 0..10);
    }

    #[test]
    fn test_empty_buffer_has_no_window() {
        let mut viewport = Viewport::default();
        assert_eq!(viewport.resolve(0), None);
        assert_eq!(viewport.position_offset(), 0);
    }

    #[test]
    fn test_short_buffer_resolves_whole() {
        for len in 1..5 {
            let (buffer, mut viewport) = filled(len);
            let whole = Some(IndexWindow { min: 0, max: len });
            assert_eq!(viewport.resolve(buffer.len()), whole);
            assert_eq!(viewport.zoom(-1.0, buffer.len()), whole);
            assert_eq!(viewport.zoom(1.0, buffer.len()), whole);
            // The zoom floor still applies to the state itself
            assert_eq!(viewport.visible_count(), 5);
        }
    }
}
