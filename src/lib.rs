//! Dark UI Core - motion and bot-behavior heuristics for adversarial widgets
//!
//! This library provides the framework-free numerical core behind evasive
//! form controls: where a fleeing element should move, and whether a stream
//! of pointer, click, timing or action events looks scripted.
//!
//! ## Motion
//!
//! The `motion` module holds position/bounds primitives, best-effort random
//! placement, and eased evasion vectors.
//!
//! ## Detection
//!
//! The `detection` module provides four independent sliding-window
//! detectors. [`BotGuard`] bundles one of each on a shared clock for hosts
//! that want a single verdict.

pub mod config;
pub mod detection;
pub mod motion;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Settings;
use crate::detection::{
    system_clock, ActionKind, Clock, ExactClickDetector, PatternDetector, PerfectMovementDetector,
    PointerEvent, TimingDetector,
};

/// Interaction events a host can forward to [`BotGuard`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionEvent {
    /// Pointer moved
    PointerMove(PointerEvent),
    /// Pointer clicked; also counts as a click action
    Click(PointerEvent),
    /// A stimulus was presented
    Stimulus { timestamp: Option<f64> },
    /// The user responded to the last stimulus
    Response {
        kind: String,
        timestamp: Option<f64>,
    },
    /// Any other discrete action
    Action {
        kind: ActionKind,
        timestamp: Option<f64>,
    },
}

/// Score and decision of one detector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectorVerdict {
    pub score: f64,
    pub flagged: bool,
}

/// Snapshot of every detector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BehaviorReport {
    pub movement: DetectorVerdict,
    pub clicks: DetectorVerdict,
    pub timing: DetectorVerdict,
    pub pattern: DetectorVerdict,
    /// True when any detector flags
    pub suspicious: bool,
}

/// One detector of each kind, fed from a single event stream
pub struct BotGuard {
    pub movement: PerfectMovementDetector,
    pub clicks: ExactClickDetector,
    pub timing: TimingDetector,
    pub pattern: PatternDetector,
    settings: Settings,
}

impl BotGuard {
    /// Create a guard on the system clock
    pub fn new(settings: Settings) -> Self {
        Self::with_clock(settings, system_clock())
    }

    /// Create a guard whose detectors share `clock`
    pub fn with_clock(settings: Settings, clock: Arc<dyn Clock>) -> Self {
        Self {
            movement: PerfectMovementDetector::with_clock(settings.movement.clone(), clock.clone()),
            clicks: ExactClickDetector::with_clock(settings.clicks.clone(), clock.clone()),
            timing: TimingDetector::with_clock(settings.timing.clone(), clock.clone()),
            pattern: PatternDetector::with_clock(settings.pattern.clone(), clock),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Route an event to the detectors that consume it
    pub fn observe(&mut self, event: &InteractionEvent) {
        match event {
            InteractionEvent::PointerMove(pointer) => match pointer.timestamp {
                Some(t) => self.movement.add_point_at(pointer.x, pointer.y, t),
                None => self.movement.add_point(pointer.x, pointer.y),
            },
            InteractionEvent::Click(pointer) => {
                let target = pointer.target.as_deref();
                match pointer.timestamp {
                    Some(t) => {
                        self.clicks.add_click_at(pointer.x, pointer.y, target, t);
                        self.pattern.record_action_at(ActionKind::Click, t);
                    }
                    None => {
                        self.clicks.add_click(pointer.x, pointer.y, target);
                        self.pattern.record_action(ActionKind::Click);
                    }
                }
            }
            InteractionEvent::Stimulus { timestamp } => match timestamp {
                Some(t) => self.timing.record_stimulus_at(*t),
                None => self.timing.record_stimulus(),
            },
            InteractionEvent::Response { kind, timestamp } => {
                let reaction = match timestamp {
                    Some(t) => self.timing.record_response_at(kind, *t),
                    None => self.timing.record_response(kind),
                };
                if let Some(ms) = reaction {
                    log::trace!("{} response after {:.0}ms", kind, ms);
                }
            }
            InteractionEvent::Action { kind, timestamp } => match timestamp {
                Some(t) => self.pattern.record_action_at(kind.clone(), *t),
                None => self.pattern.record_action(kind.clone()),
            },
        }
    }

    /// Current score and decision of every detector
    pub fn report(&self) -> BehaviorReport {
        let movement = DetectorVerdict {
            score: self.movement.get_score(),
            flagged: self.movement.is_perfect_movement(),
        };
        let clicks = DetectorVerdict {
            score: self.clicks.get_score(),
            flagged: self.clicks.has_exact_click_pattern(),
        };
        let timing = DetectorVerdict {
            score: self.timing.get_score(),
            flagged: self.timing.has_suspicious_timing(),
        };
        let pattern = DetectorVerdict {
            score: self.pattern.get_score(),
            flagged: self.pattern.has_repetitive_pattern(),
        };
        let suspicious = movement.flagged || clicks.flagged || timing.flagged || pattern.flagged;

        if suspicious {
            log::info!(
                "Bot-like behavior: movement={} clicks={} timing={} pattern={}",
                movement.flagged,
                clicks.flagged,
                timing.flagged,
                pattern.flagged
            );
        }

        BehaviorReport {
            movement,
            clicks,
            timing,
            pattern,
            suspicious,
        }
    }

    /// Reset every detector
    pub fn reset(&mut self) {
        self.movement.reset();
        self.clicks.reset();
        self.timing.reset();
        self.pattern.reset();
    }
}

impl Default for BotGuard {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
