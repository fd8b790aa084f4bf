//! Tap Critters - a tap-the-animals toy for very small children
//!
//! Core modules:
//! - `sim`: Round lifecycle and motion simulation (placement, critters, motion, round state machine)
//! - `host`: Collaborator traits and the dispatcher that feeds them simulation output
//! - `audio`: Procedural animal cues and background music
//! - `effects`: Self-timed tap ripples and fireworks
//! - `platform`: Browser glue (canvas, pointer input, vibration, timers)
//! - `tuning`: Data-driven gameplay constants

pub mod audio;
pub mod effects;
pub mod host;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::Settings;
pub use tuning::{Tuning, TuningError};

use glam::Vec2;

/// Gameplay constants. These are hand-tuned values; keep them literal.
pub mod consts {
    /// Normalized coordinate space spans 0..=100 on both axes
    pub const FIELD_SIZE: f32 = 100.0;
    /// Nominal frame period that velocities are expressed against (ms)
    pub const NOMINAL_FRAME_MS: f32 = 16.67;

    /// Minimum distance between freshly placed critters (normalized units)
    pub const MIN_SEPARATION: f32 = 25.0;
    /// Random placement attempts before falling back to preset slots
    pub const MAX_PLACEMENT_ATTEMPTS: u32 = 100;
    /// Preset slots used when random placement keeps colliding
    pub const FALLBACK_SLOTS: [(f32, f32); 3] = [(25.0, 30.0), (50.0, 50.0), (75.0, 70.0)];
    /// Margin used until the host measures a critter
    pub const DEFAULT_MARGIN: f32 = 10.0;

    /// Critters per round (inclusive)
    pub const MIN_CRITTERS: usize = 2;
    pub const MAX_CRITTERS: usize = 6;
    /// Initial speed in normalized units per nominal frame
    pub const CRITTER_SPEED: f32 = 0.5;

    /// Added to the speed multiplier after every cleared round
    pub const SPEED_INCREMENT: f32 = 0.15;
    /// Delay between the last tap and the fireworks (ms)
    pub const CELEBRATION_DELAY_MS: f64 = 500.0;
    /// Total celebration length measured from the last tap (ms)
    pub const CELEBRATION_TOTAL_MS: f64 = 4000.0;

    /// Particles per tap ripple
    pub const RIPPLE_PARTICLES: u32 = 8;
}

/// Convert a screen-space point to normalized field coordinates
#[inline]
pub fn screen_to_field(point: Vec2, viewport: Vec2) -> Vec2 {
    if viewport.x <= 0.0 || viewport.y <= 0.0 {
        return Vec2::ZERO;
    }
    point / viewport * consts::FIELD_SIZE
}

/// Convert normalized field coordinates to a screen-space point
#[inline]
pub fn field_to_screen(pos: Vec2, viewport: Vec2) -> Vec2 {
    pos / consts::FIELD_SIZE * viewport
}
