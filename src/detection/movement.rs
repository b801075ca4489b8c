//! Perfect-movement detection
//!
//! Flags pointer paths that are too straight, sampled at too regular an
//! interval, and missing the small direction changes of a human hand.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::clock::{system_clock, Clock};
use super::stats;

/// Mean turning angle (radians) that counts as fully natural jitter
const JITTER_FULL_SCALE: f64 = 0.3;

/// Options for [`PerfectMovementDetector`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerfectMovementOptions {
    /// Sliding window in milliseconds
    pub time_window: f64,
    /// Points required before any decision
    pub min_points: usize,
    /// Movement is flagged when the score exceeds `1 - perfectness_threshold`
    pub perfectness_threshold: f64,
}

impl Default for PerfectMovementOptions {
    fn default() -> Self {
        Self {
            time_window: 1000.0,
            min_points: 10,
            perfectness_threshold: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct MovementSample {
    x: f64,
    y: f64,
    timestamp: f64,
}

/// Sub-score breakdown, all in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MovementScores {
    /// 1 for a perfectly straight path
    pub straightness: f64,
    /// 1 for perfectly fixed sampling intervals
    pub timing_uniformity: f64,
    /// 1 for plenty of natural direction noise
    pub jitter: f64,
    /// Mean of straightness, timing uniformity and `1 - jitter`
    pub aggregate: f64,
}

/// Sliding-window analyzer for pointer movement
pub struct PerfectMovementDetector {
    options: PerfectMovementOptions,
    points: Vec<MovementSample>,
    clock: Arc<dyn Clock>,
}

impl PerfectMovementDetector {
    /// Create a detector on the system clock
    pub fn new(options: PerfectMovementOptions) -> Self {
        Self::with_clock(options, system_clock())
    }

    /// Create a detector on a custom clock
    pub fn with_clock(options: PerfectMovementOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            options,
            points: Vec::new(),
            clock,
        }
    }

    pub fn options(&self) -> &PerfectMovementOptions {
        &self.options
    }

    /// Record a pointer position at the current clock time
    pub fn add_point(&mut self, x: f64, y: f64) {
        let now = self.clock.now_ms();
        self.add_point_at(x, y, now);
    }

    /// Record a pointer position at an explicit timestamp
    pub fn add_point_at(&mut self, x: f64, y: f64, timestamp: f64) {
        self.points.push(MovementSample { x, y, timestamp });
        let window = self.options.time_window;
        self.points.retain(|p| timestamp - p.timestamp <= window);
    }

    /// Number of buffered points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether the buffered path looks machine-generated
    pub fn is_perfect_movement(&self) -> bool {
        if self.points.len() < self.options.min_points {
            return false;
        }
        let score = self.sub_scores().aggregate;
        let perfect = score > 1.0 - self.options.perfectness_threshold;
        if perfect {
            log::debug!(
                "Perfect movement over {} points (score {:.3})",
                self.points.len(),
                score
            );
        }
        perfect
    }

    /// Aggregate suspicion in [0, 1], 0 below the minimum point count
    pub fn get_score(&self) -> f64 {
        if self.points.len() < self.options.min_points {
            return 0.0;
        }
        self.sub_scores().aggregate
    }

    /// Sub-score breakdown, all zero below the minimum point count
    pub fn sub_scores(&self) -> MovementScores {
        if self.points.len() < self.options.min_points {
            return MovementScores::default();
        }

        let straightness = self.straightness();
        let timing_uniformity = self.timing_uniformity();
        let jitter = self.jitter();
        let aggregate = (straightness + timing_uniformity + (1.0 - jitter)) / 3.0;

        log::trace!(
            "movement: straightness={:.3} timing={:.3} jitter={:.3}",
            straightness,
            timing_uniformity,
            jitter
        );

        MovementScores {
            straightness,
            timing_uniformity,
            jitter,
            aggregate,
        }
    }

    /// Drop every buffered point
    pub fn reset(&mut self) {
        self.points.clear();
    }

    /// Perpendicular deviation of interior points from the first-to-last
    /// chord, inverted so a straight path scores 1
    fn straightness(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let first = self.points[0];
        let last = self.points[n - 1];
        let cx = last.x - first.x;
        let cy = last.y - first.y;
        let chord = (cx * cx + cy * cy).sqrt();
        if chord == 0.0 {
            return 0.0;
        }

        let interior = &self.points[1..n - 1];
        let total_deviation: f64 = interior
            .iter()
            .map(|p| (cx * (p.y - first.y) - cy * (p.x - first.x)).abs() / chord)
            .sum();
        let max_deviation = chord / 2.0 * interior.len() as f64;

        1.0 - (total_deviation / max_deviation).min(1.0)
    }

    fn timing_uniformity(&self) -> f64 {
        let timestamps: Vec<f64> = self.points.iter().map(|p| p.timestamp).collect();
        stats::interval_regularity(&stats::deltas(&timestamps))
    }

    /// Mean absolute turning angle between consecutive segments, scaled to
    /// [0, 1]; zero-length segments are skipped
    fn jitter(&self) -> f64 {
        let angles: Vec<f64> = self
            .points
            .windows(3)
            .filter_map(|w| {
                let (ax, ay) = (w[1].x - w[0].x, w[1].y - w[0].y);
                let (bx, by) = (w[2].x - w[1].x, w[2].y - w[1].y);
                let la = (ax * ax + ay * ay).sqrt();
                let lb = (bx * bx + by * by).sqrt();
                if la == 0.0 || lb == 0.0 {
                    return None;
                }
                let cos = ((ax * bx + ay * by) / (la * lb)).clamp(-1.0, 1.0);
                Some(cos.acos())
            })
            .collect();

        if angles.is_empty() {
            return 0.0;
        }
        (stats::mean(&angles) / JITTER_FULL_SCALE).min(1.0)
    }
}

impl Default for PerfectMovementDetector {
    fn default() -> Self {
        Self::new(PerfectMovementOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::clock::ManualClock;

    fn detector_with_clock() -> (PerfectMovementDetector, ManualClock) {
        let clock = ManualClock::new(0.0);
        let detector =
            PerfectMovementDetector::with_clock(PerfectMovementOptions::default(), clock.handle());
        (detector, clock)
    }

    #[test]
    fn test_straight_uniform_line_is_perfect() {
        let (mut detector, clock) = detector_with_clock();
        for i in 0..15 {
            clock.set(i as f64 * 50.0);
            detector.add_point(i as f64 * 10.0, i as f64 * 10.0);
        }

        assert!(detector.is_perfect_movement());
        let scores = detector.sub_scores();
        assert!((scores.straightness - 1.0).abs() < 1e-9);
        assert_eq!(scores.timing_uniformity, 1.0);
        assert!(scores.jitter < 1e-6);
    }

    #[test]
    fn test_noisy_irregular_path_is_not_perfect() {
        let (mut detector, clock) = detector_with_clock();
        let intervals = [
            30.0, 70.0, 45.0, 90.0, 25.0, 60.0, 80.0, 35.0, 55.0, 40.0, 65.0,
        ];
        let mut t = 0.0;
        for (i, dt) in intervals.iter().enumerate() {
            t += dt;
            clock.set(t);
            let wobble = if i % 2 == 0 { 8.0 } else { -8.0 };
            detector.add_point(i as f64 * 10.0, i as f64 * 10.0 + wobble);
        }

        assert!(!detector.is_perfect_movement());
        assert!(detector.sub_scores().jitter > 0.9);
    }

    #[test]
    fn test_below_min_points_scores_zero() {
        let (mut detector, clock) = detector_with_clock();
        for i in 0..9 {
            clock.set(i as f64 * 50.0);
            detector.add_point(i as f64, i as f64);
        }
        assert_eq!(detector.get_score(), 0.0);
        assert!(!detector.is_perfect_movement());
    }

    #[test]
    fn test_window_evicts_old_points() {
        let (mut detector, clock) = detector_with_clock();
        for i in 0..10 {
            clock.set(i as f64 * 50.0);
            detector.add_point(i as f64, 0.0);
        }
        assert_eq!(detector.len(), 10);

        clock.set(5000.0);
        detector.add_point(0.0, 0.0);
        assert_eq!(detector.len(), 1);
    }

    #[test]
    fn test_stationary_points_do_not_produce_nan() {
        let (mut detector, clock) = detector_with_clock();
        for i in 0..12 {
            clock.set(i as f64 * 20.0);
            detector.add_point(5.0, 5.0);
        }
        let score = detector.get_score();
        assert!(score.is_finite());
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut detector = PerfectMovementDetector::default();
        for i in 0..15 {
            detector.add_point_at(i as f64 * 10.0, 0.0, i as f64 * 50.0);
        }
        assert!(detector.get_score() > 0.0);

        detector.reset();
        assert!(detector.is_empty());
        assert_eq!(detector.get_score(), 0.0);
        assert!(!detector.is_perfect_movement());
    }
}
