//! Exact-click detection
//!
//! Scripted clicks land on the same pixel, on round coordinates, or on a
//! regular grid. Each of those signatures is scored separately.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::clock::{system_clock, Clock};
use super::stats;

/// Options for [`ExactClickDetector`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExactClickOptions {
    /// Two clicks this close (px) count as the same spot
    pub exactness_radius: f64,
    /// Clicks required before any decision
    pub min_clicks: usize,
    /// Sliding window in milliseconds
    pub time_window: f64,
    /// Score above which the clicks are flagged
    pub suspicion_threshold: f64,
}

impl Default for ExactClickOptions {
    fn default() -> Self {
        Self {
            exactness_radius: 2.0,
            min_clicks: 5,
            time_window: 5000.0,
            suspicion_threshold: 0.7,
        }
    }
}

#[derive(Debug, Clone)]
struct ClickSample {
    x: f64,
    y: f64,
    timestamp: f64,
    target: Option<String>,
}

/// Sub-score breakdown, all in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClickScores {
    /// Share of click pairs within the exactness radius
    pub exact_match_ratio: f64,
    /// Share of clicks on multiples of 10 (or 5, half credit)
    pub round_coordinate_ratio: f64,
    /// Gap uniformity of sorted coordinates, averaged over both axes
    pub grid_pattern: f64,
    pub aggregate: f64,
}

/// Sliding-window analyzer for click coordinates
pub struct ExactClickDetector {
    options: ExactClickOptions,
    clicks: Vec<ClickSample>,
    clock: Arc<dyn Clock>,
}

impl ExactClickDetector {
    /// Create a detector on the system clock
    pub fn new(options: ExactClickOptions) -> Self {
        Self::with_clock(options, system_clock())
    }

    /// Create a detector on a custom clock
    pub fn with_clock(options: ExactClickOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            options,
            clicks: Vec::new(),
            clock,
        }
    }

    pub fn options(&self) -> &ExactClickOptions {
        &self.options
    }

    /// Record a click at the current clock time
    pub fn add_click(&mut self, x: f64, y: f64, target: Option<&str>) {
        let now = self.clock.now_ms();
        self.add_click_at(x, y, target, now);
    }

    /// Record a click at an explicit timestamp
    pub fn add_click_at(&mut self, x: f64, y: f64, target: Option<&str>, timestamp: f64) {
        self.clicks.push(ClickSample {
            x,
            y,
            timestamp,
            target: target.map(str::to_owned),
        });
        let window = self.options.time_window;
        self.clicks.retain(|c| timestamp - c.timestamp <= window);
    }

    /// Number of buffered clicks
    pub fn len(&self) -> usize {
        self.clicks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clicks.is_empty()
    }

    /// Number of buffered clicks on a given target tag
    pub fn clicks_on(&self, target: &str) -> usize {
        self.clicks
            .iter()
            .filter(|c| c.target.as_deref() == Some(target))
            .count()
    }

    /// Whether the buffered clicks look scripted
    pub fn has_exact_click_pattern(&self) -> bool {
        if self.clicks.len() < self.options.min_clicks {
            return false;
        }
        let score = self.sub_scores().aggregate;
        let suspicious = score > self.options.suspicion_threshold;
        if suspicious {
            log::debug!(
                "Exact click pattern over {} clicks (score {:.3})",
                self.clicks.len(),
                score
            );
        }
        suspicious
    }

    /// Aggregate suspicion in [0, 1], 0 below the minimum click count
    pub fn get_score(&self) -> f64 {
        self.sub_scores().aggregate
    }

    /// Sub-score breakdown, all zero below the minimum click count
    pub fn sub_scores(&self) -> ClickScores {
        if self.clicks.len() < self.options.min_clicks {
            return ClickScores::default();
        }

        let exact_match_ratio = self.exact_match_ratio();
        let round_coordinate_ratio = self.round_coordinate_ratio();
        let grid_pattern = self.grid_pattern();
        let aggregate = (exact_match_ratio + round_coordinate_ratio + grid_pattern) / 3.0;

        log::trace!(
            "clicks: exact={:.3} round={:.3} grid={:.3}",
            exact_match_ratio,
            round_coordinate_ratio,
            grid_pattern
        );

        ClickScores {
            exact_match_ratio,
            round_coordinate_ratio,
            grid_pattern,
            aggregate,
        }
    }

    /// Drop every buffered click
    pub fn reset(&mut self) {
        self.clicks.clear();
    }

    fn exact_match_ratio(&self) -> f64 {
        let n = self.clicks.len();
        if n < 2 {
            return 0.0;
        }
        let radius = self.options.exactness_radius;
        let mut matches = 0usize;
        for (i, a) in self.clicks.iter().enumerate() {
            for b in &self.clicks[i + 1..] {
                let dx = a.x - b.x;
                let dy = a.y - b.y;
                if (dx * dx + dy * dy).sqrt() <= radius {
                    matches += 1;
                }
            }
        }
        let pairs = n * (n - 1) / 2;
        matches as f64 / pairs as f64
    }

    fn round_coordinate_ratio(&self) -> f64 {
        if self.clicks.is_empty() {
            return 0.0;
        }
        let credit: f64 = self
            .clicks
            .iter()
            .map(|c| {
                if is_multiple_of(c.x, 10.0) || is_multiple_of(c.y, 10.0) {
                    1.0
                } else if is_multiple_of(c.x, 5.0) || is_multiple_of(c.y, 5.0) {
                    0.5
                } else {
                    0.0
                }
            })
            .sum();
        credit / self.clicks.len() as f64
    }

    fn grid_pattern(&self) -> f64 {
        let mut xs: Vec<f64> = self.clicks.iter().map(|c| c.x).collect();
        let mut ys: Vec<f64> = self.clicks.iter().map(|c| c.y).collect();
        xs.sort_by(f64::total_cmp);
        ys.sort_by(f64::total_cmp);
        (axis_uniformity(&xs) + axis_uniformity(&ys)) / 2.0
    }
}

impl Default for ExactClickDetector {
    fn default() -> Self {
        Self::new(ExactClickOptions::default())
    }
}

fn is_multiple_of(value: f64, step: f64) -> bool {
    value.rem_euclid(step) == 0.0
}

/// Evenness of the gaps between sorted coordinates
fn axis_uniformity(sorted: &[f64]) -> f64 {
    if sorted.len() < 2 {
        return 0.0;
    }
    stats::evenness(&stats::deltas(sorted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::clock::ManualClock;

    fn detector_with_clock() -> (ExactClickDetector, ManualClock) {
        let clock = ManualClock::new(0.0);
        let detector = ExactClickDetector::with_clock(ExactClickOptions::default(), clock.handle());
        (detector, clock)
    }

    #[test]
    fn test_repeated_identical_clicks() {
        let (mut detector, clock) = detector_with_clock();
        for i in 0..8 {
            clock.set(i as f64 * 300.0);
            detector.add_click(237.0, 418.0, Some("button"));
        }
        let scores = detector.sub_scores();
        assert_eq!(scores.exact_match_ratio, 1.0);
        assert_eq!(scores.grid_pattern, 1.0);
        assert!(detector.get_score() > 0.6);
        assert_eq!(detector.clicks_on("button"), 8);
    }

    #[test]
    fn test_grid_clicks_flagged() {
        let (mut detector, clock) = detector_with_clock();
        for i in 0..6 {
            clock.set(i as f64 * 200.0);
            detector.add_click(100.0 + i as f64 * 50.0, 200.0 + i as f64 * 30.0, None);
        }
        let scores = detector.sub_scores();
        assert_eq!(scores.round_coordinate_ratio, 1.0);
        assert_eq!(scores.grid_pattern, 1.0);
        assert_eq!(scores.exact_match_ratio, 0.0);
        assert!(detector.get_score() > 0.6);
    }

    #[test]
    fn test_scattered_clicks_not_flagged() {
        let (mut detector, clock) = detector_with_clock();
        let points = [
            (13.0, 427.0),
            (281.0, 39.0),
            (96.0, 188.0),
            (412.0, 301.0),
            (157.0, 77.0),
            (333.0, 263.0),
        ];
        for (i, (x, y)) in points.iter().enumerate() {
            clock.set(i as f64 * 400.0);
            detector.add_click(*x, *y, None);
        }
        assert!(!detector.has_exact_click_pattern());
        assert!(detector.get_score() < 0.5);
    }

    #[test]
    fn test_half_credit_for_multiples_of_five() {
        let (mut detector, clock) = detector_with_clock();
        for i in 0..5 {
            clock.set(i as f64 * 100.0);
            detector.add_click(15.0 + i as f64 * 101.0, 33.0, None);
        }
        // x values 15, 116, 217, 318, 419: only the first lands on a multiple of 5
        assert!((detector.sub_scores().round_coordinate_ratio - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_below_min_clicks() {
        let (mut detector, _clock) = detector_with_clock();
        for _ in 0..4 {
            detector.add_click(10.0, 10.0, None);
        }
        assert_eq!(detector.get_score(), 0.0);
        assert!(!detector.has_exact_click_pattern());
    }

    #[test]
    fn test_window_and_reset() {
        let (mut detector, clock) = detector_with_clock();
        for _ in 0..5 {
            detector.add_click(10.0, 10.0, None);
        }
        clock.set(5001.0);
        detector.add_click(10.0, 10.0, None);
        assert_eq!(detector.len(), 1);

        detector.reset();
        assert!(detector.is_empty());
        assert_eq!(detector.get_score(), 0.0);
    }
}
