//! Constants for board dimensions, scoring defaults and playout limits.
//!
//! Board sizes are not fixed at compile time: every record carries its own
//! dimensions, so the values here only bound what a record may declare.

// =============================================================================
// Board Geometry
// =============================================================================

/// Default board size (NxN) when a record does not declare one.
pub const DEFAULT_SIZE: usize = 19;

/// Largest board side a record may declare. Coordinates are written with
/// `a-z` then `A-Z`, which gives 52 distinct letters.
pub const MAX_SIZE: usize = 52;

/// Largest board side on which `tt` is still read as a pass.
pub const TT_PASS_MAX_SIZE: usize = 19;

// =============================================================================
// Scoring
// =============================================================================

/// Komi used when a record does not declare one.
pub const DEFAULT_KOMI: f64 = 6.5;

/// Ownership value at or above which the estimator assigns a point.
pub const DEFAULT_ESTIMATOR_THRESHOLD: f64 = 0.5;

// =============================================================================
// Playouts
// =============================================================================

/// Default number of playouts used for an ownership map.
pub const DEFAULT_PLAYOUTS: usize = 200;

/// Game length limit of a single playout, as a multiple of the board area.
pub const PLAYOUT_LENGTH_FACTOR: usize = 3;
