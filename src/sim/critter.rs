//! Critters and the pool of live critters for the current round

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::placement::{Margin, place_entity};
use super::rng::{RandomSource, shuffle};
use crate::tuning::Tuning;

/// The fixed set of animals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Cat,
    Dog,
    Bird,
    Rabbit,
    Fish,
    Squirrel,
    Turtle,
    Bug,
}

impl Species {
    pub const ALL: [Species; 8] = [
        Species::Cat,
        Species::Dog,
        Species::Bird,
        Species::Rabbit,
        Species::Fish,
        Species::Squirrel,
        Species::Turtle,
        Species::Bug,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Species::Cat => "cat",
            Species::Dog => "dog",
            Species::Bird => "bird",
            Species::Rabbit => "rabbit",
            Species::Fish => "fish",
            Species::Squirrel => "squirrel",
            Species::Turtle => "turtle",
            Species::Bug => "bug",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Audio cue identifier
    pub fn cue(&self) -> &'static str {
        match self {
            Species::Cat => "meow",
            Species::Dog => "woof",
            Species::Bird => "chirp",
            Species::Rabbit => "squeak",
            Species::Fish => "bubble",
            Species::Squirrel => "chatter",
            Species::Turtle => "slow",
            Species::Bug => "buzz",
        }
    }

    /// Color token for badges and tap ripples (CSS color)
    pub fn color(&self) -> &'static str {
        match self {
            Species::Cat => "#fb923c",
            Species::Dog => "#d97706",
            Species::Bird => "#38bdf8",
            Species::Rabbit => "#f472b6",
            Species::Fish => "#60a5fa",
            Species::Squirrel => "#ca8a04",
            Species::Turtle => "#22c55e",
            Species::Bug => "#84cc16",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Species::Cat => "🐱",
            Species::Dog => "🐶",
            Species::Bird => "🐦",
            Species::Rabbit => "🐰",
            Species::Fish => "🐠",
            Species::Squirrel => "🐿️",
            Species::Turtle => "🐢",
            Species::Bug => "🐛",
        }
    }
}

/// One live critter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Critter {
    pub id: u32,
    pub species: Species,
    /// Center, in normalized field units
    pub pos: Vec2,
    /// Normalized units per nominal frame
    pub vel: Vec2,
}

/// Result of a successful tap lookup
#[derive(Debug, Clone, PartialEq)]
pub struct TapOutcome {
    pub removed: Critter,
    pub pool_now_empty: bool,
}

/// Live critters of the current round (ordered by spawn)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CritterPool {
    critters: Vec<Critter>,
    /// Next critter ID; never rewinds, so IDs are unique for the whole session
    next_id: u32,
}

impl Default for CritterPool {
    fn default() -> Self {
        Self::new()
    }
}

impl CritterPool {
    pub fn new() -> Self {
        Self {
            critters: Vec::new(),
            next_id: 1,
        }
    }

    /// Spawn `count` critters of distinct species.
    ///
    /// Species come from a shuffled copy of the full set; each critter is placed
    /// away from those already placed in this call and starts at `speed` in a
    /// uniformly random direction.
    pub fn spawn(
        &mut self,
        count: usize,
        margin: Margin,
        tuning: &Tuning,
        rng: &mut impl RandomSource,
    ) -> &[Critter] {
        let mut species = Species::ALL;
        shuffle(&mut species, rng);

        let start = self.critters.len();
        let mut placed: Vec<Vec2> = Vec::with_capacity(count);
        for &kind in species.iter().take(count) {
            let pos = place_entity(&placed, margin, tuning, rng).pos();
            placed.push(pos);

            let angle = rng.next_f32() * std::f32::consts::TAU;
            let vel = Vec2::from_angle(angle) * tuning.critter_speed;

            let id = self.next_entity_id();
            self.critters.push(Critter {
                id,
                species: kind,
                pos,
                vel,
            });
        }
        &self.critters[start..]
    }

    /// Remove a critter; absent IDs are ignored
    pub fn remove(&mut self, id: u32) -> Option<Critter> {
        let idx = self.critters.iter().position(|c| c.id == id)?;
        Some(self.critters.remove(idx))
    }

    /// Look up and remove the tapped critter in one step.
    ///
    /// `None` means the tap was stale (the critter is already gone).
    pub fn resolve_tap(&mut self, id: u32) -> Option<TapOutcome> {
        let removed = self.remove(id)?;
        Some(TapOutcome {
            removed,
            pool_now_empty: self.critters.is_empty(),
        })
    }

    pub fn clear(&mut self) {
        self.critters.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.critters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.critters.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Critter> {
        self.critters.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Critter> {
        self.critters.iter_mut()
    }

    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::collections::HashSet;

    fn spawned(count: usize, seed: u64) -> CritterPool {
        let mut pool = CritterPool::new();
        let mut rng = Pcg32::seed_from_u64(seed);
        pool.spawn(count, Margin::uniform(10.0), &Tuning::default(), &mut rng);
        pool
    }

    #[test]
    fn test_species_catalogue() {
        assert_eq!(Species::Cat.cue(), "meow");
        assert_eq!(Species::Bug.cue(), "buzz");
        assert_eq!(Species::from_id("turtle"), Some(Species::Turtle));
        assert_eq!(Species::from_id("dragon"), None);
        let ids: HashSet<_> = Species::ALL.iter().map(|s| s.id()).collect();
        assert_eq!(ids.len(), 8);
    }

    #[test]
    fn test_spawn_distinct_species_and_ids() {
        for seed in 0..20 {
            let pool = spawned(6, seed);
            assert_eq!(pool.len(), 6);
            let species: HashSet<_> = pool.iter().map(|c| c.species).collect();
            let ids: HashSet<_> = pool.iter().map(|c| c.id).collect();
            assert_eq!(species.len(), 6);
            assert_eq!(ids.len(), 6);
        }
    }

    #[test]
    fn test_spawn_speed_and_containment() {
        let pool = spawned(4, 11);
        let margin = Margin::uniform(10.0);
        for critter in pool.iter() {
            assert!((critter.vel.length() - 0.5).abs() < 1e-5);
            assert!(margin.contains(critter.pos));
        }
    }

    #[test]
    fn test_ids_not_reused_after_clear() {
        let mut pool = spawned(3, 2);
        let first: HashSet<_> = pool.iter().map(|c| c.id).collect();
        pool.clear();
        let mut rng = Pcg32::seed_from_u64(9);
        pool.spawn(3, Margin::uniform(10.0), &Tuning::default(), &mut rng);
        assert!(pool.iter().all(|c| !first.contains(&c.id)));
    }

    #[test]
    fn test_resolve_tap_is_idempotent() {
        let mut pool = spawned(2, 4);
        let ids: Vec<u32> = pool.iter().map(|c| c.id).collect();

        let outcome = pool.resolve_tap(ids[0]).unwrap();
        assert_eq!(outcome.removed.id, ids[0]);
        assert!(!outcome.pool_now_empty);
        assert!(pool.resolve_tap(ids[0]).is_none());
        assert_eq!(pool.len(), 1);

        let outcome = pool.resolve_tap(ids[1]).unwrap();
        assert!(outcome.pool_now_empty);
        assert!(pool.is_empty());
        assert!(pool.remove(ids[1]).is_none());
    }
}
