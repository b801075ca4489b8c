//! Position and bounds primitives
//!
//! Points, axis-aligned rectangles, and best-effort random placement with
//! exclusion disks.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default number of resampling attempts for [`random_position`]
pub const DEFAULT_MAX_ATTEMPTS: usize = 50;

/// A point in a caller-chosen 2D coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Position) -> f64 {
        distance(*self, *other)
    }
}

/// Axis-aligned rectangle. `min_x <= max_x` and `min_y <= max_y` is the
/// caller's responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Width of the rectangle
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the rectangle
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Shrink symmetrically on all four sides
    pub fn shrink(&self, padding: f64) -> Self {
        Self {
            min_x: self.min_x + padding,
            max_x: self.max_x - padding,
            min_y: self.min_y + padding,
            max_y: self.max_y - padding,
        }
    }
}

/// A disk that sampled positions should stay out of
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvoidZone {
    pub position: Position,
    pub radius: f64,
}

impl AvoidZone {
    pub fn new(position: Position, radius: f64) -> Self {
        Self { position, radius }
    }

    /// Whether a point falls strictly inside the disk
    pub fn contains(&self, point: Position) -> bool {
        distance(self.position, point) < self.radius
    }
}

/// Options for [`random_position`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomPositionOptions {
    /// Shrinks the sampled rectangle on every side
    pub edge_padding: f64,
    /// Exclusion disks
    pub avoid_positions: Vec<AvoidZone>,
    /// Resampling attempts before giving up
    pub max_attempts: usize,
}

impl Default for RandomPositionOptions {
    fn default() -> Self {
        Self {
            edge_padding: 0.0,
            avoid_positions: Vec::new(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RandomPositionOptions {
    pub fn with_padding(mut self, edge_padding: f64) -> Self {
        self.edge_padding = edge_padding;
        self
    }

    pub fn avoiding(mut self, position: Position, radius: f64) -> Self {
        self.avoid_positions.push(AvoidZone::new(position, radius));
        self
    }
}

/// Sample a random position using the thread-local RNG
pub fn random_position(bounds: &Bounds, options: &RandomPositionOptions) -> Position {
    random_position_with(bounds, options, &mut rand::thread_rng())
}

/// Sample a uniformly random position inside `bounds` (shrunk by
/// `edge_padding`), resampling while it lands inside an exclusion disk.
///
/// Best effort: once `max_attempts` samples have been drawn the last one is
/// returned even if it still overlaps a disk.
pub fn random_position_with<R: Rng + ?Sized>(
    bounds: &Bounds,
    options: &RandomPositionOptions,
    rng: &mut R,
) -> Position {
    let area = bounds.shrink(options.edge_padding);
    let attempts = options.max_attempts.max(1);

    let mut candidate = sample_in(&area, rng);
    for _ in 1..attempts {
        if !overlaps_any(candidate, &options.avoid_positions) {
            return candidate;
        }
        candidate = sample_in(&area, rng);
    }

    if overlaps_any(candidate, &options.avoid_positions) {
        log::warn!(
            "random_position gave up after {} attempts at ({:.1}, {:.1})",
            attempts,
            candidate.x,
            candidate.y
        );
    }
    candidate
}

fn sample_in<R: Rng + ?Sized>(area: &Bounds, rng: &mut R) -> Position {
    // Interpolate rather than gen_range so a degenerate area never panics
    let x = area.min_x + rng.gen::<f64>() * area.width();
    let y = area.min_y + rng.gen::<f64>() * area.height();
    Position::new(x, y)
}

fn overlaps_any(point: Position, zones: &[AvoidZone]) -> bool {
    zones.iter().any(|zone| zone.contains(point))
}

/// Euclidean distance between two points
pub fn distance(p1: Position, p2: Position) -> f64 {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    (dx * dx + dy * dy).sqrt()
}

/// Inclusive containment check on both axes
pub fn is_within_bounds(position: Position, bounds: &Bounds) -> bool {
    (bounds.min_x..=bounds.max_x).contains(&position.x)
        && (bounds.min_y..=bounds.max_y).contains(&position.y)
}

/// Clamp each axis independently into the rectangle
pub fn constrain_to_bounds(position: Position, bounds: &Bounds) -> Position {
    Position::new(
        position.x.max(bounds.min_x).min(bounds.max_x),
        position.y.max(bounds.min_y).min(bounds.max_y),
    )
}
