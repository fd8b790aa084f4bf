//! Motion integration with elastic wall reflection

use glam::Vec2;

use super::critter::CritterPool;
use super::placement::Margin;

/// Advance every critter by `dt_frames` nominal frames.
///
/// Each axis is handled on its own: reaching or passing either edge of the
/// margin box clamps the position onto that edge and flips the velocity
/// component, so speed is preserved exactly.
pub fn integrate(pool: &mut CritterPool, dt_frames: f32, speed_multiplier: f32, margin: Margin) {
    let lo = margin.min();
    let hi = margin.max();
    for critter in pool.iter_mut() {
        let next = critter.pos + critter.vel * speed_multiplier * dt_frames;
        let (x, vx) = reflect_axis(next.x, critter.vel.x, lo.x, hi.x);
        let (y, vy) = reflect_axis(next.y, critter.vel.y, lo.y, hi.y);
        critter.pos = Vec2::new(x, y);
        critter.vel = Vec2::new(vx, vy);
    }
}

/// Reflect a single axis against `[lo, hi]`
#[inline]
fn reflect_axis(pos: f32, vel: f32, lo: f32, hi: f32) -> (f32, f32) {
    if pos <= lo {
        (lo, -vel)
    } else if pos >= hi {
        (hi, -vel)
    } else {
        (pos, vel)
    }
}

/// Turns wall-clock timestamps into frame-normalized deltas
#[derive(Debug, Clone)]
pub struct FrameClock {
    nominal_frame_ms: f32,
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new(nominal_frame_ms: f32) -> Self {
        Self {
            nominal_frame_ms,
            last_ms: None,
        }
    }

    /// Elapsed time since the previous call, in nominal frames.
    /// The first call after construction or [`reset`](Self::reset) yields 0.
    pub fn advance(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_ms {
            Some(last) => ((now_ms - last).max(0.0) as f32) / self.nominal_frame_ms,
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        dt
    }

    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::critter::{Critter, Species};
    use crate::tuning::Tuning;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn single(pos: Vec2, vel: Vec2) -> CritterPool {
        let mut pool = CritterPool::new();
        // Spawn to allocate an ID, then overwrite the kinematics
        let mut rng = Pcg32::seed_from_u64(0);
        pool.spawn(1, Margin::uniform(10.0), &Tuning::default(), &mut rng);
        if let Some(c) = pool.iter_mut().next() {
            c.pos = pos;
            c.vel = vel;
        }
        pool
    }

    fn only(pool: &CritterPool) -> &Critter {
        pool.iter().next().unwrap()
    }

    #[test]
    fn test_free_flight() {
        let mut pool = single(Vec2::new(50.0, 50.0), Vec2::new(0.5, -0.25));
        integrate(&mut pool, 2.0, 1.5, Margin::uniform(10.0));
        let c = only(&pool);
        assert_eq!(c.pos, Vec2::new(51.5, 49.25));
        assert_eq!(c.vel, Vec2::new(0.5, -0.25));
    }

    #[test]
    fn test_reflects_off_low_edge() {
        let margin = Margin::uniform(10.0);
        let mut pool = single(Vec2::new(10.0 - 0.01, 50.0), Vec2::new(-0.5, 0.0));
        integrate(&mut pool, 1.0, 1.0, margin);
        let c = only(&pool);
        assert_eq!(c.pos.x, 10.0);
        assert_eq!(c.vel.x, 0.5);
    }

    #[test]
    fn test_reflects_off_high_edge() {
        let margin = Margin::new(5.0, 20.0);
        let mut pool = single(Vec2::new(50.0, 79.8), Vec2::new(0.0, 0.5));
        integrate(&mut pool, 1.0, 1.0, margin);
        let c = only(&pool);
        assert_eq!(c.pos.y, 80.0);
        assert_eq!(c.vel.y, -0.5);
    }

    #[test]
    fn test_simultaneous_corner_hit() {
        let margin = Margin::uniform(10.0);
        let mut pool = single(Vec2::new(10.0, 10.0), Vec2::new(-0.5, -0.5));
        integrate(&mut pool, 1.0, 1.0, margin);
        let c = only(&pool);
        assert_eq!(c.pos, Vec2::new(10.0, 10.0));
        assert_eq!(c.vel, Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_zero_delta_is_still() {
        let mut pool = single(Vec2::new(40.0, 60.0), Vec2::new(0.5, 0.5));
        integrate(&mut pool, 0.0, 3.0, Margin::uniform(10.0));
        assert_eq!(only(&pool).pos, Vec2::new(40.0, 60.0));
    }

    #[test]
    fn test_frame_clock() {
        let mut clock = FrameClock::new(16.67);
        assert_eq!(clock.advance(1000.0), 0.0);
        assert!((clock.advance(1016.67) - 1.0).abs() < 1e-3);
        assert!((clock.advance(1050.01) - 2.0).abs() < 1e-3);
        // Clock going backwards never produces negative motion
        assert_eq!(clock.advance(900.0), 0.0);
        clock.reset();
        assert_eq!(clock.advance(5000.0), 0.0);
    }

    proptest! {
        #[test]
        fn prop_critters_stay_inside(
            seed in any::<u64>(),
            m in 0.0f32..40.0,
            steps in proptest::collection::vec(0.0f32..120.0, 1..40),
            speed in 1.0f32..5.0,
        ) {
            let margin = Margin::uniform(m);
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut pool = CritterPool::new();
            pool.spawn(Species::ALL.len(), margin, &Tuning::default(), &mut rng);
            for dt in steps {
                let speeds: Vec<f32> = pool.iter().map(|c| c.vel.length()).collect();
                integrate(&mut pool, dt, speed, margin);
                for (c, before) in pool.iter().zip(speeds) {
                    prop_assert!(margin.contains(c.pos));
                    prop_assert!((c.vel.length() - before).abs() < 1e-5);
                }
            }
        }
    }
}
