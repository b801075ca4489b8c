//! Behavioral anomaly detectors
//!
//! Four independent sliding-window classifiers over interaction streams.
//! Each keeps a time-windowed event log, computes a few sub-scores in
//! [0, 1], averages them, and compares the result to a threshold. Below its
//! minimum sample count a detector always reports score 0 and "not
//! suspicious".
//!
//! Detectors are single-owner values: mutate them from one event loop.

pub mod clicks;
pub mod clock;
pub mod events;
pub mod movement;
pub mod pattern;
pub mod stats;
pub mod timing;

pub use clicks::{ClickScores, ExactClickDetector, ExactClickOptions};
pub use clock::{system_clock, Clock, ManualClock, SystemClock};
pub use events::{detect_exact_click, detect_perfect_movement, measure_reaction_time, PointerEvent};
pub use movement::{MovementScores, PerfectMovementDetector, PerfectMovementOptions};
pub use pattern::{
    analyze_sequence, ActionKind, PatternDetector, PatternOptions, PatternScores, SequenceAnalysis,
};
pub use timing::{TimingDetector, TimingOptions, TimingScores};
