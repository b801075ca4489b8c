//! Reaction-timing detection
//!
//! Measures stimulus-to-response latency and the gaps between sequential
//! events. Superhuman reactions, metronome-like consistency and
//! near-simultaneous actions each raise the score.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::clock::{system_clock, Clock};
use super::stats;

/// Gap (ms) under which two consecutive events count as simultaneous
const INSTANTANEOUS_GAP_MS: f64 = 50.0;

/// Options for [`TimingDetector`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingOptions {
    /// Reactions faster than this (ms) are superhuman
    pub min_human_reaction_time: f64,
    /// Reaction std-dev (ms) below which timing is suspiciously consistent
    pub max_consistent_variance: f64,
    /// Events required before any decision
    pub min_events: usize,
    /// Score above which timing is flagged
    pub suspicion_threshold: f64,
    /// Sliding window in milliseconds
    pub time_window: f64,
}

impl Default for TimingOptions {
    fn default() -> Self {
        Self {
            min_human_reaction_time: 150.0,
            max_consistent_variance: 20.0,
            min_events: 5,
            suspicion_threshold: 0.7,
            time_window: 10_000.0,
        }
    }
}

/// What produced a sequential timing event
#[derive(Debug, Clone, PartialEq, Eq)]
enum TimingEventKind {
    Stimulus,
    Response(String),
    Event(String),
}

#[derive(Debug, Clone)]
struct TimedEvent {
    kind: TimingEventKind,
    timestamp: f64,
}

#[derive(Debug, Clone, Copy)]
struct Reaction {
    reaction_time: f64,
    responded_at: f64,
}

/// Sub-score breakdown, all in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimingScores {
    /// Share of reactions under the human minimum
    pub superhuman_speed: f64,
    /// `1 - std_dev / max_consistent_variance` when under the limit, else 0
    pub suspicious_consistency: f64,
    /// Share of consecutive event gaps under 50ms
    pub instantaneous_actions: f64,
    pub aggregate: f64,
}

/// Sliding-window analyzer for reaction and inter-event timing
pub struct TimingDetector {
    options: TimingOptions,
    events: Vec<TimedEvent>,
    reactions: Vec<Reaction>,
    pending_stimulus: Option<f64>,
    clock: Arc<dyn Clock>,
}

impl TimingDetector {
    /// Create a detector on the system clock
    pub fn new(options: TimingOptions) -> Self {
        Self::with_clock(options, system_clock())
    }

    /// Create a detector on a custom clock
    pub fn with_clock(options: TimingOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            options,
            events: Vec::new(),
            reactions: Vec::new(),
            pending_stimulus: None,
            clock,
        }
    }

    pub fn options(&self) -> &TimingOptions {
        &self.options
    }

    /// Current clock reading
    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    /// Mark the moment a stimulus was shown
    pub fn record_stimulus(&mut self) {
        let now = self.clock.now_ms();
        self.record_stimulus_at(now);
    }

    pub fn record_stimulus_at(&mut self, timestamp: f64) {
        self.pending_stimulus = Some(timestamp);
        self.push_event(TimingEventKind::Stimulus, timestamp);
    }

    /// Record a response to the pending stimulus.
    ///
    /// Returns the reaction time, or `None` when no stimulus was pending (the
    /// response still counts as a sequential event).
    pub fn record_response(&mut self, response_type: &str) -> Option<f64> {
        let now = self.clock.now_ms();
        self.record_response_at(response_type, now)
    }

    pub fn record_response_at(&mut self, response_type: &str, timestamp: f64) -> Option<f64> {
        // A stimulus older than the window no longer pairs
        self.prune(timestamp);
        let reaction_time = self
            .pending_stimulus
            .take()
            .map(|stimulus| timestamp - stimulus);
        if let Some(reaction_time) = reaction_time {
            self.reactions.push(Reaction {
                reaction_time,
                responded_at: timestamp,
            });
        }
        self.push_event(
            TimingEventKind::Response(response_type.to_owned()),
            timestamp,
        );
        reaction_time
    }

    /// Record a raw sequential event with no stimulus pairing
    pub fn record_event(&mut self, event_type: &str) {
        let now = self.clock.now_ms();
        self.record_event_at(event_type, now);
    }

    pub fn record_event_at(&mut self, event_type: &str, timestamp: f64) {
        self.push_event(TimingEventKind::Event(event_type.to_owned()), timestamp);
    }

    fn push_event(&mut self, kind: TimingEventKind, timestamp: f64) {
        self.events.push(TimedEvent { kind, timestamp });
        self.prune(timestamp);
    }

    /// Evict events, reactions and the pending stimulus older than the window
    fn prune(&mut self, now: f64) {
        let window = self.options.time_window;
        self.events.retain(|e| now - e.timestamp <= window);
        self.reactions.retain(|r| now - r.responded_at <= window);
        if let Some(stimulus) = self.pending_stimulus {
            if now - stimulus > window {
                log::trace!("Dropping stimulus pending for over {}ms", window);
                self.pending_stimulus = None;
            }
        }
    }

    /// Number of buffered sequential events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of buffered responses of a given type
    pub fn responses_of(&self, response_type: &str) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(&e.kind, TimingEventKind::Response(t) if t == response_type))
            .count()
    }

    /// Number of buffered stimulus/response pairs
    pub fn reaction_count(&self) -> usize {
        self.reactions.len()
    }

    /// Mean reaction time, `None` without any pairs
    pub fn average_reaction_time(&self) -> Option<f64> {
        if self.reactions.is_empty() {
            return None;
        }
        Some(stats::mean(&self.reaction_times()))
    }

    /// Whether the timing looks machine-driven
    pub fn has_suspicious_timing(&self) -> bool {
        if self.events.len() < self.options.min_events {
            return false;
        }
        let score = self.sub_scores().aggregate;
        let suspicious = score > self.options.suspicion_threshold;
        if suspicious {
            log::debug!(
                "Suspicious timing over {} events / {} reactions (score {:.3})",
                self.events.len(),
                self.reactions.len(),
                score
            );
        }
        suspicious
    }

    /// Aggregate suspicion in [0, 1], 0 below the minimum event count
    pub fn get_score(&self) -> f64 {
        self.sub_scores().aggregate
    }

    /// Sub-score breakdown, all zero below the minimum event count
    pub fn sub_scores(&self) -> TimingScores {
        if self.events.len() < self.options.min_events {
            return TimingScores::default();
        }

        let reaction_times = self.reaction_times();
        let superhuman_speed = self.superhuman_speed(&reaction_times);
        let suspicious_consistency = self.suspicious_consistency(&reaction_times);
        let instantaneous_actions = self.instantaneous_actions();
        let aggregate = (superhuman_speed + suspicious_consistency + instantaneous_actions) / 3.0;

        log::trace!(
            "timing: superhuman={:.3} consistency={:.3} instantaneous={:.3}",
            superhuman_speed,
            suspicious_consistency,
            instantaneous_actions
        );

        TimingScores {
            superhuman_speed,
            suspicious_consistency,
            instantaneous_actions,
            aggregate,
        }
    }

    /// Drop every buffered event, reaction and pending stimulus
    pub fn reset(&mut self) {
        self.events.clear();
        self.reactions.clear();
        self.pending_stimulus = None;
    }

    fn reaction_times(&self) -> Vec<f64> {
        self.reactions.iter().map(|r| r.reaction_time).collect()
    }

    fn superhuman_speed(&self, reaction_times: &[f64]) -> f64 {
        if reaction_times.is_empty() {
            return 0.0;
        }
        let fast = reaction_times
            .iter()
            .filter(|&&t| t < self.options.min_human_reaction_time)
            .count();
        fast as f64 / reaction_times.len() as f64
    }

    fn suspicious_consistency(&self, reaction_times: &[f64]) -> f64 {
        if reaction_times.len() < 2 || self.options.max_consistent_variance <= 0.0 {
            return 0.0;
        }
        let spread = stats::std_dev(reaction_times);
        if spread < self.options.max_consistent_variance {
            1.0 - spread / self.options.max_consistent_variance
        } else {
            0.0
        }
    }

    fn instantaneous_actions(&self) -> f64 {
        let timestamps: Vec<f64> = self.events.iter().map(|e| e.timestamp).collect();
        let gaps = stats::deltas(&timestamps);
        if gaps.is_empty() {
            return 0.0;
        }
        let instant = gaps.iter().filter(|&&g| g < INSTANTANEOUS_GAP_MS).count();
        instant as f64 / gaps.len() as f64
    }
}

impl Default for TimingDetector {
    fn default() -> Self {
        Self::new(TimingOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::clock::ManualClock;

    fn detector_with_clock() -> (TimingDetector, ManualClock) {
        let clock = ManualClock::new(0.0);
        let detector = TimingDetector::with_clock(TimingOptions::default(), clock.handle());
        (detector, clock)
    }

    #[test]
    fn test_superhuman_reactions_flagged() {
        let (mut detector, clock) = detector_with_clock();
        for i in 0..5 {
            clock.set(i as f64 * 1000.0);
            detector.record_stimulus();
            clock.advance(20.0);
            assert_eq!(detector.record_response("click"), Some(20.0));
        }

        let scores = detector.sub_scores();
        assert_eq!(scores.superhuman_speed, 1.0);
        assert_eq!(scores.suspicious_consistency, 1.0);
        assert!(detector.has_suspicious_timing());
        assert_eq!(detector.average_reaction_time(), Some(20.0));
        assert_eq!(detector.responses_of("click"), 5);
    }

    #[test]
    fn test_human_reactions_not_flagged() {
        let (mut detector, clock) = detector_with_clock();
        let latencies = [240.0, 310.0, 195.0, 420.0, 275.0, 350.0];
        for (i, latency) in latencies.iter().enumerate() {
            clock.set(i as f64 * 1500.0);
            detector.record_stimulus();
            clock.advance(*latency);
            detector.record_response("click");
        }

        let scores = detector.sub_scores();
        assert_eq!(scores.superhuman_speed, 0.0);
        assert_eq!(scores.suspicious_consistency, 0.0);
        assert!(!detector.has_suspicious_timing());
    }

    #[test]
    fn test_response_without_stimulus() {
        let (mut detector, _clock) = detector_with_clock();
        assert_eq!(detector.record_response("key"), None);
        assert_eq!(detector.reaction_count(), 0);
        assert_eq!(detector.len(), 1);
    }

    #[test]
    fn test_burst_of_raw_events() {
        let (mut detector, clock) = detector_with_clock();
        for _ in 0..10 {
            detector.record_event("keypress");
            clock.advance(10.0);
        }
        let scores = detector.sub_scores();
        assert_eq!(scores.instantaneous_actions, 1.0);
        // No reactions: only one signal can fire
        assert!((detector.get_score() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_below_min_events() {
        let (mut detector, clock) = detector_with_clock();
        detector.record_stimulus();
        clock.advance(5.0);
        detector.record_response("click");
        assert_eq!(detector.get_score(), 0.0);
        assert!(!detector.has_suspicious_timing());
    }

    #[test]
    fn test_window_evicts_old_events() {
        let (mut detector, clock) = detector_with_clock();
        for i in 0..5 {
            clock.set(i as f64 * 100.0);
            detector.record_stimulus();
            clock.advance(20.0);
            detector.record_response("click");
        }
        assert_eq!(detector.len(), 10);
        assert_eq!(detector.reaction_count(), 5);
        assert!(detector.get_score() > 0.0);

        detector.record_event_at("tick", 20_000.0);
        assert_eq!(detector.len(), 1);
        assert_eq!(detector.reaction_count(), 0);
        assert_eq!(detector.get_score(), 0.0);
        assert_eq!(detector.average_reaction_time(), None);
    }

    #[test]
    fn test_stale_stimulus_expires() {
        let (mut detector, _clock) = detector_with_clock();
        detector.record_stimulus_at(20_100.0);
        detector.record_event_at("tick", 60_000.0);
        assert_eq!(detector.record_response_at("click", 60_010.0), None);
        assert_eq!(detector.reaction_count(), 0);

        // Response arriving just past the window after its stimulus
        detector.record_stimulus_at(70_000.0);
        assert_eq!(detector.record_response_at("click", 80_001.0), None);
        assert_eq!(detector.reaction_count(), 0);

        // Still inside the window: pairs normally
        detector.record_stimulus_at(90_000.0);
        let reaction = detector.record_response_at("click", 99_000.0);
        assert_eq!(reaction, Some(9000.0));
        assert_eq!(detector.reaction_count(), 1);
    }

    #[test]
    fn test_reset() {
        let (mut detector, clock) = detector_with_clock();
        for _ in 0..5 {
            detector.record_stimulus();
            clock.advance(10.0);
            detector.record_response("click");
        }
        detector.record_stimulus();
        detector.reset();

        assert!(detector.is_empty());
        assert_eq!(detector.reaction_count(), 0);
        assert_eq!(detector.get_score(), 0.0);
        assert_eq!(detector.record_response("click"), None);
    }
}
