//! Evasion vector math
//!
//! Decides whether an element should flee a threat point (usually the
//! cursor) and where it should go. Intensity follows an easing curve over
//! the closeness fraction, so fleeing is gentle near the edge of the
//! evasion radius and sharp as the threat closes in.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::position::{distance, Position};

/// Pixels moved per unit of `intensity * speed`
const STEP_SCALE: f64 = 50.0;

/// Default cap on a single evasion step
pub const DEFAULT_MAX_STEP: f64 = 100.0;

/// Fixed distance covered by [`calculate_escape_route`]
const ESCAPE_STEP: f64 = 100.0;

/// Radius widening per unit of fear in [`calculate_adaptive_evasion`]
const FEAR_WIDENING: f64 = 0.5;

/// Share of the widened-radius shortfall added as an extra nudge
const FEAR_NUDGE: f64 = 0.1;

/// Easing curve applied to the closeness fraction `t` in [0, 1]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseInQuad,
    EaseOutQuad,
    EaseInCubic,
    /// `1 - (1 - t)^3`
    #[default]
    EaseOutCubic,
    EaseInOutCubic,
    /// Caller-supplied curve, not serializable
    #[serde(skip)]
    Custom(fn(f64) -> f64),
}

impl Easing {
    pub fn apply(&self, t: f64) -> f64 {
        match self {
            Easing::Linear => t,
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::Custom(curve) => curve(t),
        }
    }
}

/// Per-call evasion configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EvasionOptions {
    /// Radius inside which the element flees
    pub evasion_distance: f64,
    /// Speed multiplier
    pub speed: f64,
    /// Upper bound on a single step
    pub max_step: f64,
    /// Intensity curve
    pub easing: Easing,
}

impl Default for EvasionOptions {
    fn default() -> Self {
        Self {
            evasion_distance: 100.0,
            speed: 1.0,
            max_step: DEFAULT_MAX_STEP,
            easing: Easing::default(),
        }
    }
}

impl EvasionOptions {
    pub fn new(evasion_distance: f64, speed: f64) -> Self {
        Self {
            evasion_distance,
            speed,
            ..Default::default()
        }
    }

    pub fn with_max_step(mut self, max_step: f64) -> Self {
        self.max_step = max_step;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// Outcome of an evasion calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvasionResult {
    pub should_evade: bool,
    /// Where the element should move, `None` when not evading
    pub new_position: Option<Position>,
    /// Raw element-to-threat distance
    pub distance: f64,
}

/// Unit vector from threat toward element, zero when they coincide
fn flee_direction(element: Position, threat: Position) -> Position {
    let dx = element.x - threat.x;
    let dy = element.y - threat.y;
    let magnitude = (dx * dx + dy * dy).sqrt();
    if magnitude == 0.0 {
        return Position::new(0.0, 0.0);
    }
    Position::new(dx / magnitude, dy / magnitude)
}

/// Decide whether `element` should flee `threat`, and where to
pub fn calculate_evasion(
    element: Position,
    threat: Position,
    options: &EvasionOptions,
) -> EvasionResult {
    let dist = distance(element, threat);

    if dist >= options.evasion_distance {
        return EvasionResult {
            should_evade: false,
            new_position: None,
            distance: dist,
        };
    }

    let direction = flee_direction(element, threat);
    let closeness = 1.0 - dist / options.evasion_distance;
    let intensity = options.easing.apply(closeness).clamp(0.0, 1.0);
    let step = (intensity * options.speed * STEP_SCALE).min(options.max_step);

    EvasionResult {
        should_evade: true,
        new_position: Some(Position::new(
            element.x + direction.x * step,
            element.y + direction.y * step,
        )),
        distance: dist,
    }
}

/// [`calculate_evasion`] with a fear-widened radius.
///
/// `fear_level` is maintained by the caller. When evading, the effective
/// radius grows by `1 + fear_level * 0.5` and the new position is pushed a
/// further tenth of the shortfall along the flee direction.
pub fn calculate_adaptive_evasion(
    element: Position,
    threat: Position,
    options: &EvasionOptions,
    fear_level: f64,
) -> EvasionResult {
    let mut result = calculate_evasion(element, threat, options);
    if !result.should_evade {
        return result;
    }

    let fear_multiplier = 1.0 + fear_level * FEAR_WIDENING;
    let enhanced_distance = options.evasion_distance * fear_multiplier;

    if result.distance < enhanced_distance {
        if let Some(position) = result.new_position.as_mut() {
            let direction = flee_direction(element, threat);
            let nudge = (enhanced_distance - result.distance) * FEAR_NUDGE;
            position.x += direction.x * nudge;
            position.y += direction.y * nudge;
        }
    }

    result
}

/// Add uniform noise in `[-amount/2, amount/2]` per axis (thread RNG)
pub fn add_evasion_jitter(position: Position, jitter_amount: f64) -> Position {
    add_evasion_jitter_with(position, jitter_amount, &mut rand::thread_rng())
}

/// Add uniform noise in `[-amount/2, amount/2]` per axis.
/// A zero amount returns the input unchanged.
pub fn add_evasion_jitter_with<R: Rng + ?Sized>(
    position: Position,
    jitter_amount: f64,
    rng: &mut R,
) -> Position {
    if jitter_amount == 0.0 {
        return position;
    }
    Position::new(
        position.x + (rng.gen::<f64>() - 0.5) * jitter_amount,
        position.y + (rng.gen::<f64>() - 0.5) * jitter_amount,
    )
}

/// Whether a position lies within `margin` of any edge of a
/// `width` x `height` area anchored at the origin
pub fn is_element_cornered(position: Position, width: f64, height: f64, margin: f64) -> bool {
    position.x < margin
        || position.x > width - margin
        || position.y < margin
        || position.y > height - margin
}

/// Move 100 units straight toward the center of the area
pub fn calculate_escape_route(position: Position, width: f64, height: f64) -> Position {
    let center = Position::new(width / 2.0, height / 2.0);
    let direction = flee_direction(center, position);
    Position::new(
        position.x + direction.x * ESCAPE_STEP,
        position.y + direction.y * ESCAPE_STEP,
    )
}

/// Linear extrapolation: `current + (current - previous) * factor`
pub fn predict_threat_position(
    current: Position,
    previous: Position,
    prediction_factor: f64,
) -> Position {
    Position::new(
        current.x + (current.x - previous.x) * prediction_factor,
        current.y + (current.y - previous.y) * prediction_factor,
    )
}
