// Value label selection and collision-free placement
use super::channel::Channel;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelSettings {
    /// Vertical displacement attempts before a colliding label is left as is.
    pub max_attempts: u32,
    /// Estimated advance of one glyph at the label font size.
    pub char_width: f64,
    pub padding_x: f64,
    pub height: f64,
    /// Distance between a point and its label centre line.
    pub y_offset: f64,
    /// Gap kept between stacked labels.
    pub margin: f64,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            char_width: 6.0,
            padding_x: 4.0,
            height: 14.0,
            y_offset: 15.0,
            margin: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// Pixel area the series is drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }
    }

    fn mid_x(&self) -> f64 {
        self.left + self.width / 2.0
    }
}

/// Maps a visible slice onto the plot area.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    pub area: PlotArea,
    pub points: usize,
    pub value_range: (f64, f64),
}

impl Projection {
    pub fn point(&self, offset: usize, value: f64) -> (f64, f64) {
        let x = if self.points > 1 {
            self.area.left + self.area.width * offset as f64 / (self.points - 1) as f64
        } else {
            self.area.mid_x()
        };
        let (lo, hi) = self.value_range;
        let t = if hi > lo { (value - lo) / (hi - lo) } else { 0.5 };
        let y = self.area.top + self.area.height * (1.0 - t);
        (x, y)
    }
}

/// An index of the visible slice worth annotating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub offset: usize,
    pub is_first: bool,
    pub is_last: bool,
}

/// First, last, minimum and maximum finite values, deduplicated.
pub fn select_candidates(values: &[f64]) -> Vec<Candidate> {
    let mut first = None;
    let mut last = None;
    let mut min: Option<(usize, f64)> = None;
    let mut max: Option<(usize, f64)> = None;

    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            continue;
        }
        first.get_or_insert(i);
        last = Some(i);
        if min.is_none_or(|(_, m)| v < m) {
            min = Some((i, v));
        }
        if max.is_none_or(|(_, m)| v > m) {
            max = Some((i, v));
        }
    }

    let (Some(first), Some(last)) = (first, last) else {
        return Vec::new();
    };

    let mut offsets = vec![first, last];
    offsets.extend(min.map(|(i, _)| i));
    offsets.extend(max.map(|(i, _)| i));

    let mut seen = Vec::with_capacity(4);
    offsets
        .into_iter()
        .filter(|o| {
            if seen.contains(o) {
                false
            } else {
                seen.push(*o);
                true
            }
        })
        .map(|offset| Candidate {
            offset,
            is_first: offset == first,
            is_last: offset == last,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedLabel {
    pub channel: Channel,
    /// Absolute buffer index of the annotated sample.
    pub index: usize,
    pub value: f64,
    pub text: String,
    pub rect: Rect,
    /// False when the attempt budget ran out with the label still overlapping.
    pub settled: bool,
}

/// Places labels for one redraw. Every channel placed through the same
/// placer avoids the labels placed before it.
#[derive(Debug, Clone)]
pub struct LabelPlacer {
    settings: LabelSettings,
    placed: Vec<Rect>,
}

impl LabelPlacer {
    pub fn new(settings: LabelSettings) -> Self {
        Self {
            settings,
            placed: Vec::new(),
        }
    }

    /// Annotate `values`, the visible slice of `channel` starting at buffer
    /// index `start`.
    pub fn place_series(
        &mut self,
        channel: Channel,
        start: usize,
        values: &[f64],
        projection: &Projection,
    ) -> Vec<PlacedLabel> {
        select_candidates(values)
            .into_iter()
            .map(|candidate| {
                let value = values[candidate.offset];
                let text = channel.format_value(value);
                let point = projection.point(candidate.offset, value);
                let (rect, settled) = self.place(&text, point, candidate, &projection.area);
                PlacedLabel {
                    channel,
                    index: start + candidate.offset,
                    value,
                    text,
                    rect,
                    settled,
                }
            })
            .collect()
    }

    fn place(
        &mut self,
        text: &str,
        (px, py): (f64, f64),
        candidate: Candidate,
        area: &PlotArea,
    ) -> (Rect, bool) {
        let s = &self.settings;
        let width = text.chars().count() as f64 * s.char_width + s.padding_x * 2.0;
        let height = s.height;

        let mut x = px - width / 2.0;
        let nudge = width / 2.0 + s.padding_x;
        match (candidate.is_first, candidate.is_last) {
            (true, false) => x -= nudge,
            (false, true) => x += nudge,
            _ => {}
        }

        // Left half hangs below the line, right half above it.
        let (mut y, direction) = if px < area.mid_x() {
            (py + s.y_offset - height / 2.0, 1.0)
        } else {
            (py - s.y_offset - height / 2.0, -1.0)
        };

        let mut rect = Rect { x, y, width, height };
        let mut attempts = 0;
        while self.collides(&rect) && attempts < s.max_attempts {
            y += direction * (height + s.margin);
            rect.y = y;
            attempts += 1;
        }

        let settled = !self.collides(&rect);
        self.placed.push(rect);
        (rect, settled)
    }

    fn collides(&self, rect: &Rect) -> bool {
        self.placed.iter().any(|other| rect.intersects(other))
    }
}

impl Default for LabelPlacer {
    fn default() -> Self {
        Self::new(LabelSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERIES: [f64; 10] = [55.0, 54.0, 53.0, 50.0, 56.0, 58.0, 61.0, 57.0, 56.0, 55.0];

    fn projection(values: &[f64]) -> Projection {
        Projection {
            area: PlotArea::new(800.0, 400.0),
            points: values.len(),
            value_range: (40.0, 80.0),
        }
    }

    fn assert_disjoint(labels: &[PlacedLabel]) {
        for (i, a) in labels.iter().enumerate() {
            for b in &labels[i + 1..] {
                assert!(
                    !a.rect.intersects(&b.rect),
                    "{} at {:?} overlaps {} at {:?}",
                    a.text,
                    a.rect,
                    b.text,
                    b.rect
                );
            }
        }
    }

    #[test]
    fn test_candidates_first_last_min_max() {
        let candidates = select_candidates(&SERIES);
        let offsets: Vec<usize> = candidates.iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0, 9, 3, 6]);
        assert!(candidates[0].is_first);
        assert!(candidates[1].is_last);
    }

    #[test]
    fn test_candidates_skip_non_finite_and_dedupe() {
        let values = [f64::NAN, 1.0, 2.0, f64::INFINITY];
        let offsets: Vec<usize> = select_candidates(&values).iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![1, 2]);
        assert!(select_candidates(&[f64::NAN]).is_empty());
        assert!(select_candidates(&[]).is_empty());
    }

    #[test]
    fn test_ten_point_series_labels_do_not_overlap() {
        let mut placer = LabelPlacer::default();
        let labels = placer.place_series(Channel::Temperature, 0, &SERIES, &projection(&SERIES));

        assert_eq!(labels.len(), 4);
        assert!(labels.iter().all(|l| l.settled));
        assert_disjoint(&labels);
        assert_eq!(labels[2].text, "50°C");
        assert_eq!(labels[2].index, 3);
    }

    #[test]
    fn test_colliding_channels_are_stacked() {
        let mut placer = LabelPlacer::default();
        let projection = projection(&SERIES);
        let mut labels = placer.place_series(Channel::Temperature, 100, &SERIES, &projection);
        let first_pass = labels.clone();
        labels.extend(placer.place_series(Channel::Temperature, 100, &SERIES, &projection));

        assert_eq!(labels.len(), 8);
        assert!(labels.iter().all(|l| l.settled));
        assert_disjoint(&labels);

        // Left-half labels move down, right-half labels move up.
        assert!(labels[4].rect.y > first_pass[0].rect.y);
        assert!(labels[7].rect.y < first_pass[3].rect.y);
        assert_eq!(labels[4].index, 100);
    }

    #[test]
    fn test_edge_labels_are_nudged_outward() {
        let mut placer = LabelPlacer::default();
        let projection = projection(&SERIES);
        let labels = placer.place_series(Channel::Temperature, 0, &SERIES, &projection);

        let (first_x, _) = projection.point(0, SERIES[0]);
        let (last_x, _) = projection.point(9, SERIES[9]);
        assert!(labels[0].rect.x + labels[0].rect.width <= first_x);
        assert!(labels[1].rect.x >= last_x);
    }

    #[test]
    fn test_exhausted_budget_keeps_last_position() {
        let settings = LabelSettings {
            max_attempts: 0,
            ..Default::default()
        };
        let mut placer = LabelPlacer::new(settings);
        let projection = projection(&SERIES);
        placer.place_series(Channel::Temperature, 0, &SERIES, &projection);
        let again = placer.place_series(Channel::Temperature, 0, &SERIES, &projection);
        assert!(again.iter().all(|l| !l.settled));
    }
}
