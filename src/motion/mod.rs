//! Spatial motion kit
//!
//! Position and bounds primitives, random placement, and the evasion math
//! used by runaway-style widgets:
//! - Best-effort random placement that avoids exclusion disks
//! - Eased flee vectors away from a threat point
//! - Cornering, escape and threat prediction helpers

pub mod evasion;
pub mod layout;
pub mod position;

pub use evasion::{
    add_evasion_jitter, add_evasion_jitter_with, calculate_adaptive_evasion, calculate_escape_route,
    calculate_evasion, is_element_cornered, predict_threat_position, Easing, EvasionOptions,
    EvasionResult,
};
pub use layout::{
    get_container_bounds, get_element_bounds, get_viewport_bounds, LayoutSurface, Rect,
};
pub use position::{
    constrain_to_bounds, distance, is_within_bounds, random_position, random_position_with,
    AvoidZone, Bounds, Position, RandomPositionOptions,
};
