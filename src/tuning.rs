//! Data-driven gameplay tuning
//!
//! Defaults are the literal values from `consts`. A host may override them
//! with a JSON document; missing fields keep their defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::Species;

/// Problems found while loading a tuning document
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("critter count range is empty: {min}..={max}")]
    EmptyCountRange { min: usize, max: usize },
    #[error("celebration delay ({delay_ms} ms) must be shorter than its total ({total_ms} ms)")]
    CelebrationOrder { delay_ms: f64, total_ms: f64 },
}

/// Gameplay constants in one place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub min_separation: f32,
    pub max_placement_attempts: u32,
    pub fallback_slots: Vec<(f32, f32)>,
    pub default_margin: f32,
    pub min_critters: usize,
    pub max_critters: usize,
    pub critter_speed: f32,
    pub nominal_frame_ms: f32,
    pub speed_increment: f32,
    pub celebration_delay_ms: f64,
    pub celebration_total_ms: f64,
    pub ripple_particles: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            min_separation: MIN_SEPARATION,
            max_placement_attempts: MAX_PLACEMENT_ATTEMPTS,
            fallback_slots: FALLBACK_SLOTS.to_vec(),
            default_margin: DEFAULT_MARGIN,
            min_critters: MIN_CRITTERS,
            max_critters: MAX_CRITTERS,
            critter_speed: CRITTER_SPEED,
            nominal_frame_ms: NOMINAL_FRAME_MS,
            speed_increment: SPEED_INCREMENT,
            celebration_delay_ms: CELEBRATION_DELAY_MS,
            celebration_total_ms: CELEBRATION_TOTAL_MS,
            ripple_particles: RIPPLE_PARTICLES,
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Check that every value leaves the game playable
    pub fn validate(&self) -> Result<(), TuningError> {
        if !(0.0..FIELD_SIZE / 2.0).contains(&self.default_margin) {
            return Err(TuningError::OutOfRange {
                field: "default_margin",
                value: self.default_margin.into(),
            });
        }
        if self.min_separation < 0.0 {
            return Err(TuningError::OutOfRange {
                field: "min_separation",
                value: self.min_separation.into(),
            });
        }
        if self.fallback_slots.is_empty() {
            return Err(TuningError::OutOfRange {
                field: "fallback_slots",
                value: 0.0,
            });
        }
        // A round picks distinct species, so it can never hold more than the set
        if self.min_critters == 0
            || self.min_critters > self.max_critters
            || self.max_critters > Species::ALL.len()
        {
            return Err(TuningError::EmptyCountRange {
                min: self.min_critters,
                max: self.max_critters,
            });
        }
        if self.critter_speed <= 0.0 {
            return Err(TuningError::OutOfRange {
                field: "critter_speed",
                value: self.critter_speed.into(),
            });
        }
        if self.nominal_frame_ms <= 0.0 {
            return Err(TuningError::OutOfRange {
                field: "nominal_frame_ms",
                value: self.nominal_frame_ms.into(),
            });
        }
        if self.speed_increment < 0.0 {
            return Err(TuningError::OutOfRange {
                field: "speed_increment",
                value: self.speed_increment.into(),
            });
        }
        if self.celebration_delay_ms < 0.0 || self.celebration_delay_ms >= self.celebration_total_ms {
            return Err(TuningError::CelebrationOrder {
                delay_ms: self.celebration_delay_ms,
                total_ms: self.celebration_total_ms,
            });
        }
        Ok(())
    }
}
