//! Repetitive action-pattern detection
//!
//! Scripted loops replay the same action sequence at a fixed cadence and
//! spread their actions evenly over a handful of types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::clock::{system_clock, Clock};
use super::stats;

/// Smallest period considered by [`analyze_sequence`]
const SEQUENCE_MIN_PERIOD: usize = 2;

/// Full repetitions [`analyze_sequence`] needs to report a pattern
const SEQUENCE_MIN_REPETITIONS: usize = 3;

/// Options for [`PatternDetector`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternOptions {
    /// Shortest period length searched for
    pub min_pattern_length: usize,
    /// Repetitions needed before a period counts
    pub min_repetitions: usize,
    /// Sliding window in milliseconds
    pub time_window: f64,
    /// Score above which the actions are flagged
    pub suspicion_threshold: f64,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            min_pattern_length: 2,
            min_repetitions: 3,
            time_window: 10_000.0,
            suspicion_threshold: 0.7,
        }
    }
}

impl PatternOptions {
    /// Actions required before any decision
    pub fn min_events(&self) -> usize {
        self.min_pattern_length * self.min_repetitions
    }
}

/// Category of a user action
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    Hover,
    Keypress,
    Scroll,
    Focus,
    Custom(String),
}

impl From<&str> for ActionKind {
    fn from(name: &str) -> Self {
        match name {
            "click" => ActionKind::Click,
            "hover" => ActionKind::Hover,
            "keypress" => ActionKind::Keypress,
            "scroll" => ActionKind::Scroll,
            "focus" => ActionKind::Focus,
            other => ActionKind::Custom(other.to_owned()),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Click => write!(f, "click"),
            ActionKind::Hover => write!(f, "hover"),
            ActionKind::Keypress => write!(f, "keypress"),
            ActionKind::Scroll => write!(f, "scroll"),
            ActionKind::Focus => write!(f, "focus"),
            ActionKind::Custom(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone)]
struct ActionSample {
    kind: ActionKind,
    timestamp: f64,
}

/// Sub-score breakdown, all in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PatternScores {
    /// Best period repetition count over `min_repetitions`, 0 below it
    pub repeating_sequence: f64,
    /// Fixed-cadence score of the gaps between actions
    pub uniform_intervals: f64,
    /// Evenness of per-type counts, 0 with fewer than three types
    pub cyclic_distribution: f64,
    pub aggregate: f64,
}

/// Sliding-window analyzer for discrete action streams
pub struct PatternDetector {
    options: PatternOptions,
    actions: Vec<ActionSample>,
    clock: Arc<dyn Clock>,
}

impl PatternDetector {
    /// Create a detector on the system clock
    pub fn new(options: PatternOptions) -> Self {
        Self::with_clock(options, system_clock())
    }

    /// Create a detector on a custom clock
    pub fn with_clock(options: PatternOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            options,
            actions: Vec::new(),
            clock,
        }
    }

    pub fn options(&self) -> &PatternOptions {
        &self.options
    }

    /// Record an action at the current clock time
    pub fn record_action(&mut self, kind: impl Into<ActionKind>) {
        let now = self.clock.now_ms();
        self.record_action_at(kind, now);
    }

    /// Record an action at an explicit timestamp
    pub fn record_action_at(&mut self, kind: impl Into<ActionKind>, timestamp: f64) {
        self.actions.push(ActionSample {
            kind: kind.into(),
            timestamp,
        });
        let window = self.options.time_window;
        self.actions.retain(|a| timestamp - a.timestamp <= window);
    }

    /// Number of buffered actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Buffered action count per type
    pub fn action_counts(&self) -> HashMap<ActionKind, usize> {
        let mut counts = HashMap::new();
        for action in &self.actions {
            *counts.entry(action.kind.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Whether the buffered actions look like a scripted loop
    pub fn has_repetitive_pattern(&self) -> bool {
        if self.actions.len() < self.options.min_events() {
            return false;
        }
        let score = self.sub_scores().aggregate;
        let repetitive = score > self.options.suspicion_threshold;
        if repetitive {
            log::debug!(
                "Repetitive pattern over {} actions (score {:.3})",
                self.actions.len(),
                score
            );
        }
        repetitive
    }

    /// Aggregate suspicion in [0, 1], 0 below the minimum action count
    pub fn get_score(&self) -> f64 {
        self.sub_scores().aggregate
    }

    /// Sub-score breakdown, all zero below the minimum action count
    pub fn sub_scores(&self) -> PatternScores {
        if self.actions.len() < self.options.min_events() {
            return PatternScores::default();
        }

        let repeating_sequence = self.repeating_sequence();
        let uniform_intervals = self.uniform_intervals();
        let cyclic_distribution = self.cyclic_distribution();
        let aggregate = (repeating_sequence + uniform_intervals + cyclic_distribution) / 3.0;

        log::trace!(
            "pattern: repeating={:.3} intervals={:.3} cyclic={:.3}",
            repeating_sequence,
            uniform_intervals,
            cyclic_distribution
        );

        PatternScores {
            repeating_sequence,
            uniform_intervals,
            cyclic_distribution,
            aggregate,
        }
    }

    /// Drop every buffered action
    pub fn reset(&mut self) {
        self.actions.clear();
    }

    /// Longest run of identical periods starting at the oldest buffered
    /// action, over every period length up to half the buffer
    fn repeating_sequence(&self) -> f64 {
        let min_repetitions = self.options.min_repetitions.max(1);
        let kinds: Vec<&ActionKind> = self.actions.iter().map(|a| &a.kind).collect();
        let min_len = self.options.min_pattern_length.max(1);

        let best = (min_len..=kinds.len() / 2)
            .map(|len| leading_repetitions(&kinds, len))
            .max()
            .unwrap_or(0);

        if best < min_repetitions {
            return 0.0;
        }
        (best as f64 / min_repetitions as f64).min(1.0)
    }

    fn uniform_intervals(&self) -> f64 {
        let timestamps: Vec<f64> = self.actions.iter().map(|a| a.timestamp).collect();
        stats::interval_regularity(&stats::deltas(&timestamps))
    }

    fn cyclic_distribution(&self) -> f64 {
        let counts = self.action_counts();
        if counts.len() < 3 {
            return 0.0;
        }
        let values: Vec<f64> = counts.values().map(|&c| c as f64).collect();
        stats::evenness(&values)
    }
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::new(PatternOptions::default())
    }
}

/// Count how many consecutive copies of the first `len` tokens open the
/// sequence
fn leading_repetitions<T: PartialEq>(sequence: &[T], len: usize) -> usize {
    if len == 0 || sequence.len() < len {
        return 0;
    }
    let pattern = &sequence[..len];
    sequence
        .chunks_exact(len)
        .take_while(|chunk| *chunk == pattern)
        .count()
}

/// Result of [`analyze_sequence`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SequenceAnalysis {
    pub has_pattern: bool,
    pub pattern_length: usize,
    pub repetitions: usize,
}

/// Find the smallest period (at least 2) that repeats at least three full
/// times from the start of `sequence`
pub fn analyze_sequence<T: PartialEq>(sequence: &[T]) -> SequenceAnalysis {
    for len in SEQUENCE_MIN_PERIOD..=sequence.len() / SEQUENCE_MIN_REPETITIONS {
        let repetitions = leading_repetitions(sequence, len);
        if repetitions >= SEQUENCE_MIN_REPETITIONS {
            return SequenceAnalysis {
                has_pattern: true,
                pattern_length: len,
                repetitions,
            };
        }
    }
    SequenceAnalysis::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::clock::ManualClock;

    fn detector_with_clock() -> (PatternDetector, ManualClock) {
        let clock = ManualClock::new(0.0);
        let detector = PatternDetector::with_clock(PatternOptions::default(), clock.handle());
        (detector, clock)
    }

    #[test]
    fn test_abc_loop_is_repetitive() {
        let (mut detector, clock) = detector_with_clock();
        for name in ["A", "B", "C", "A", "B", "C", "A", "B", "C"] {
            detector.record_action(name);
            clock.advance(100.0);
        }

        let scores = detector.sub_scores();
        assert_eq!(scores.repeating_sequence, 1.0);
        assert_eq!(scores.uniform_intervals, 1.0);
        assert_eq!(scores.cyclic_distribution, 1.0);
        assert!(detector.has_repetitive_pattern());
    }

    #[test]
    fn test_irregular_actions_not_flagged() {
        let (mut detector, clock) = detector_with_clock();
        let actions = [
            ("click", 120.0),
            ("hover", 340.0),
            ("hover", 90.0),
            ("scroll", 610.0),
            ("click", 45.0),
            ("keypress", 280.0),
            ("keypress", 150.0),
            ("hover", 700.0),
        ];
        for (name, gap) in actions {
            detector.record_action(name);
            clock.advance(gap);
        }

        let scores = detector.sub_scores();
        assert_eq!(scores.repeating_sequence, 0.0);
        assert_eq!(scores.uniform_intervals, 0.0);
        assert!(!detector.has_repetitive_pattern());
    }

    #[test]
    fn test_below_min_events() {
        let (mut detector, clock) = detector_with_clock();
        for name in ["click", "hover", "click", "hover", "click"] {
            detector.record_action(name);
            clock.advance(100.0);
        }
        assert_eq!(detector.get_score(), 0.0);
        assert!(!detector.has_repetitive_pattern());
    }

    #[test]
    fn test_two_types_skip_cyclic_score() {
        let (mut detector, clock) = detector_with_clock();
        for _ in 0..4 {
            detector.record_action(ActionKind::Click);
            clock.advance(200.0);
            detector.record_action(ActionKind::Hover);
            clock.advance(200.0);
        }
        let scores = detector.sub_scores();
        assert_eq!(scores.cyclic_distribution, 0.0);
        assert_eq!(scores.repeating_sequence, 1.0);
    }

    #[test]
    fn test_action_kind_from_str() {
        assert_eq!(ActionKind::from("click"), ActionKind::Click);
        assert_eq!(
            ActionKind::from("drag"),
            ActionKind::Custom("drag".to_string())
        );
        assert_eq!(ActionKind::Custom("drag".into()).to_string(), "drag");
    }

    #[test]
    fn test_simultaneous_burst_has_no_cadence() {
        let (mut detector, _clock) = detector_with_clock();
        for name in ["A", "B", "C", "A", "B", "C", "A", "B", "C"] {
            detector.record_action(name);
        }
        let scores = detector.sub_scores();
        assert_eq!(scores.uniform_intervals, 0.0);
        assert_eq!(scores.repeating_sequence, 1.0);
        assert!(!detector.has_repetitive_pattern());
    }

    #[test]
    fn test_window_evicts_old_actions() {
        let (mut detector, _clock) = detector_with_clock();
        let names = ["A", "B", "C", "A", "B", "C", "A", "B", "C"];
        for (i, name) in names.iter().enumerate() {
            detector.record_action_at(*name, i as f64 * 100.0);
        }
        assert_eq!(detector.len(), 9);
        assert!(detector.has_repetitive_pattern());

        // 10s after the last action only the new one is inside the window
        detector.record_action_at("A", 10_900.0);
        assert_eq!(detector.len(), 1);
        let counts = detector.action_counts();
        assert_eq!(counts.get(&ActionKind::from("A")), Some(&1));
        assert_eq!(detector.get_score(), 0.0);
        assert!(!detector.has_repetitive_pattern());
    }

    #[test]
    fn test_reset() {
        let (mut detector, clock) = detector_with_clock();
        for name in ["A", "B", "C", "A", "B", "C", "A", "B", "C"] {
            detector.record_action(name);
            clock.advance(100.0);
        }
        detector.reset();
        assert!(detector.is_empty());
        assert!(detector.action_counts().is_empty());
        assert_eq!(detector.get_score(), 0.0);
    }

    #[test]
    fn test_analyze_sequence_finds_period() {
        let result = analyze_sequence(&["A", "B", "C", "A", "B", "C", "A", "B", "C"]);
        assert_eq!(
            result,
            SequenceAnalysis {
                has_pattern: true,
                pattern_length: 3,
                repetitions: 3,
            }
        );
    }

    #[test]
    fn test_analyze_sequence_prefers_smallest_period() {
        let result = analyze_sequence(&[1, 2, 1, 2, 1, 2, 1, 2]);
        assert!(result.has_pattern);
        assert_eq!(result.pattern_length, 2);
        assert_eq!(result.repetitions, 4);
    }

    #[test]
    fn test_analyze_sequence_without_pattern() {
        let result = analyze_sequence(&[1, 2, 3, 1, 2, 4]);
        assert_eq!(result, SequenceAnalysis::default());
        assert!(!analyze_sequence::<u8>(&[]).has_pattern);
        assert!(!analyze_sequence(&[7, 7]).has_pattern);
    }
}
