//! Placement of new critters inside the safe region of the field

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rng::{RandomSource, range_f32};
use crate::consts::FIELD_SIZE;
use crate::tuning::Tuning;

/// Largest legal margin; at 50 the legal range collapses to a point
const MAX_MARGIN: f32 = FIELD_SIZE / 2.0 - 0.01;

/// Minimum distance a critter's center keeps from each edge, per axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub x: f32,
    pub y: f32,
}

impl Margin {
    /// Build a margin, forcing both axes into `[0, 50)`
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: sanitize(x),
            y: sanitize(y),
        }
    }

    pub fn uniform(m: f32) -> Self {
        Self::new(m, m)
    }

    /// Margin for a critter of `critter_size` pixels drawn in a `viewport` of pixels:
    /// half the critter, expressed in percent of the viewport.
    pub fn from_sizes(viewport: Vec2, critter_size: Vec2) -> Self {
        let pct = |half: f32, extent: f32| {
            if extent > 0.0 {
                half / extent * FIELD_SIZE
            } else {
                MAX_MARGIN
            }
        };
        Self::new(
            pct(critter_size.x / 2.0, viewport.x),
            pct(critter_size.y / 2.0, viewport.y),
        )
    }

    /// Lowest legal coordinate per axis
    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Highest legal coordinate per axis
    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(FIELD_SIZE - self.x, FIELD_SIZE - self.y)
    }

    /// Clamp a point into the legal range
    #[inline]
    pub fn clamp(&self, pos: Vec2) -> Vec2 {
        pos.clamp(self.min(), self.max())
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        pos.cmpge(self.min()).all() && pos.cmple(self.max()).all()
    }
}

fn sanitize(m: f32) -> f32 {
    if m.is_nan() { 0.0 } else { m.clamp(0.0, MAX_MARGIN) }
}

/// Outcome of a placement request
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Random candidate that respects the separation
    Random(Vec2),
    /// Preset slot that respects the separation
    Fallback(Vec2),
    /// Preset slot picked by rotation; may overlap an existing critter
    Overlapping(Vec2),
}

impl Placement {
    pub fn pos(&self) -> Vec2 {
        match *self {
            Placement::Random(p) | Placement::Fallback(p) | Placement::Overlapping(p) => p,
        }
    }

    /// True when the separation guarantee does not hold
    pub fn is_degraded(&self) -> bool {
        matches!(self, Placement::Overlapping(_))
    }
}

/// Pick a position for a new critter away from `existing` ones.
///
/// Tries `max_placement_attempts` uniform candidates in the margin box, then
/// the first preset slot that keeps its distance, then the preset slot at
/// `existing.len() % slots` as a last resort. Preset slots are clamped into
/// the margin box so containment always holds.
pub fn place_entity(
    existing: &[Vec2],
    margin: Margin,
    tuning: &Tuning,
    rng: &mut impl RandomSource,
) -> Placement {
    let far_enough =
        |candidate: Vec2| existing.iter().all(|p| p.distance(candidate) >= tuning.min_separation);

    let lo = margin.min();
    let hi = margin.max();
    for _ in 0..tuning.max_placement_attempts {
        let candidate = Vec2::new(range_f32(rng, lo.x, hi.x), range_f32(rng, lo.y, hi.y));
        if far_enough(candidate) {
            return Placement::Random(candidate);
        }
    }

    let slots: Vec<Vec2> = tuning
        .fallback_slots
        .iter()
        .map(|&(x, y)| margin.clamp(Vec2::new(x, y)))
        .collect();

    if let Some(&slot) = slots.iter().find(|&&slot| far_enough(slot)) {
        log::debug!("Placement fell back to preset slot {slot}");
        return Placement::Fallback(slot);
    }

    let slot = slots
        .get(existing.len() % slots.len().max(1))
        .copied()
        .unwrap_or_else(|| margin.clamp(Vec2::splat(FIELD_SIZE / 2.0)));
    log::debug!("Placement exhausted, accepting overlap at {slot}");
    Placement::Overlapping(slot)
}
