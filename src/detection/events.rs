//! Adapters from host pointer events to detector calls

use serde::{Deserialize, Serialize};

use super::clicks::ExactClickDetector;
use super::movement::PerfectMovementDetector;
use super::timing::TimingDetector;

/// Platform-neutral pointer event
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    /// Event time in ms; the detector's clock is used when absent
    pub timestamp: Option<f64>,
    /// Tag or id of the element under the pointer
    pub target: Option<String>,
}

impl PointerEvent {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    pub fn at(mut self, timestamp: f64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn on(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// Feed a pointer move into the detector and report its decision
pub fn detect_perfect_movement(
    event: &PointerEvent,
    detector: &mut PerfectMovementDetector,
) -> bool {
    match event.timestamp {
        Some(timestamp) => detector.add_point_at(event.x, event.y, timestamp),
        None => detector.add_point(event.x, event.y),
    }
    detector.is_perfect_movement()
}

/// Feed a click into the detector and report its decision
pub fn detect_exact_click(event: &PointerEvent, detector: &mut ExactClickDetector) -> bool {
    let target = event.target.as_deref();
    match event.timestamp {
        Some(timestamp) => detector.add_click_at(event.x, event.y, target, timestamp),
        None => detector.add_click(event.x, event.y, target),
    }
    detector.has_exact_click_pattern()
}

/// Mark a stimulus and present it.
///
/// The stimulus time is recorded before `stimulus` runs; the matching
/// response arrives later through [`TimingDetector::record_response`].
/// Returns the stimulus timestamp.
pub fn measure_reaction_time<F: FnOnce()>(stimulus: F, detector: &mut TimingDetector) -> f64 {
    let shown_at = detector.now_ms();
    detector.record_stimulus_at(shown_at);
    stimulus();
    shown_at
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::clicks::ExactClickOptions;
    use crate::detection::clock::ManualClock;
    use crate::detection::timing::TimingOptions;

    #[test]
    fn test_movement_adapter_uses_event_timestamps() {
        let mut detector = PerfectMovementDetector::default();
        let mut flagged = false;
        for i in 0..15 {
            let event = PointerEvent::new(i as f64 * 10.0, i as f64 * 5.0).at(i as f64 * 16.0);
            flagged = detect_perfect_movement(&event, &mut detector);
        }
        assert!(flagged);
        assert_eq!(detector.len(), 15);
    }

    #[test]
    fn test_click_adapter_falls_back_to_clock() {
        let clock = ManualClock::new(1000.0);
        let mut detector =
            ExactClickDetector::with_clock(ExactClickOptions::default(), clock.handle());
        let click = PointerEvent::new(50.0, 50.0).on("submit");
        for _ in 0..6 {
            detect_exact_click(&click, &mut detector);
            clock.advance(100.0);
        }
        // Exact, round and stacked: every signal fires
        assert!(detect_exact_click(&click, &mut detector));
        assert_eq!(detector.clicks_on("submit"), 7);
    }

    #[test]
    fn test_measure_reaction_time() {
        let clock = ManualClock::new(500.0);
        let mut detector = TimingDetector::with_clock(TimingOptions::default(), clock.handle());

        let mut shown = false;
        let shown_at = measure_reaction_time(|| shown = true, &mut detector);
        assert!(shown);
        assert_eq!(shown_at, 500.0);

        clock.advance(230.0);
        assert_eq!(detector.record_response("click"), Some(230.0));
    }
}
