//! Tap ripples and the fireworks celebration
//!
//! The layer runs on its own clock (`advance`) and cleans up after itself;
//! the simulation only says when to start or stop things. All particle
//! positions are in screen pixels.

use glam::Vec2;

use crate::consts::FIELD_SIZE;
use crate::field_to_screen;
use crate::host::EffectPresenter;
use crate::sim::rng::{RandomSource, range_f32};

/// Ripple particle lifetime (seconds)
const RIPPLE_LIFE: f32 = 0.8;
/// Ripple particles are dropped after this long even if still drawn (seconds)
const RIPPLE_CLEANUP: f32 = 1.0;
/// Furthest a ripple particle travels on each axis (pixels)
const RIPPLE_SPREAD: f32 = 100.0;
const RIPPLE_SIZE: f32 = 8.0;

const FIREWORK_BURSTS: u32 = 15;
const FIREWORK_PARTICLES: u32 = 30;
const FIREWORK_LIFE: f32 = 2.5;
const FLASH_LIFE: f32 = 0.8;
const FIREWORK_SIZE: f32 = 6.0;
const FLASH_SIZE: f32 = 16.0;
/// Celebration display is torn down after this long (seconds)
const CELEBRATION_SECS: f32 = 4.0;

const FIREWORK_COLORS: [&str; 8] = [
    "#ef4444", "#f97316", "#eab308", "#22c55e", "#3b82f6", "#6366f1", "#a855f7", "#ec4899",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Ripple,
    Spark,
    Flash,
}

/// A particle for visual effects
#[derive(Debug, Clone)]
struct Particle {
    kind: Kind,
    origin: Vec2,
    /// Full displacement reached at the end of its life
    travel: Vec2,
    color: &'static str,
    age: f32,
}

impl Particle {
    fn life(&self) -> f32 {
        match self.kind {
            Kind::Ripple => RIPPLE_LIFE,
            Kind::Spark => FIREWORK_LIFE,
            Kind::Flash => FLASH_LIFE,
        }
    }

    fn expired(&self) -> bool {
        match self.kind {
            Kind::Ripple => self.age >= RIPPLE_CLEANUP,
            _ => self.age >= self.life(),
        }
    }

    fn view(&self) -> ParticleView {
        let t = (self.age / self.life()).clamp(0.0, 1.0);
        let (scale, alpha, size) = match self.kind {
            Kind::Ripple => (1.0 - t, 1.0 - t, RIPPLE_SIZE),
            Kind::Spark => (
                keyframes(t, &[0.0, 0.3, 0.7, 1.0], &[0.0, 1.0, 0.5, 0.0]),
                keyframes(t, &[0.0, 0.3, 0.7, 1.0], &[1.0, 1.0, 0.5, 0.0]),
                FIREWORK_SIZE,
            ),
            Kind::Flash => (
                keyframes(t, &[0.0, 0.5, 1.0], &[0.0, 2.0, 0.0]),
                keyframes(t, &[0.0, 0.5, 1.0], &[1.0, 0.8, 0.0]),
                FLASH_SIZE,
            ),
        };
        ParticleView {
            pos: self.origin + self.travel * ease_out(t),
            radius: size * scale,
            alpha,
            color: self.color,
            glow: self.kind != Kind::Ripple,
        }
    }
}

/// One particle as the painter sees it
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleView {
    pub pos: Vec2,
    pub radius: f32,
    pub alpha: f32,
    pub color: &'static str,
    pub glow: bool,
}

/// Quadratic ease-out
#[inline]
fn ease_out(t: f32) -> f32 {
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Piecewise-linear interpolation through keyframes
fn keyframes(t: f32, times: &[f32], values: &[f32]) -> f32 {
    for i in 1..times.len().min(values.len()) {
        if t <= times[i] {
            let span = (times[i] - times[i - 1]).max(f32::EPSILON);
            let local = (t - times[i - 1]) / span;
            return values[i - 1] + (values[i] - values[i - 1]) * local;
        }
    }
    values.last().copied().unwrap_or(0.0)
}

/// Self-timed particle presenter
pub struct EffectLayer<R: RandomSource> {
    particles: Vec<Particle>,
    viewport: Vec2,
    /// Seconds left on the celebration display, if showing
    celebration_left: Option<f32>,
    ripple_particles: u32,
    /// Skip fireworks particles; the celebration still runs its course
    reduced_motion: bool,
    rng: R,
}

impl<R: RandomSource> EffectLayer<R> {
    pub fn new(viewport: Vec2, ripple_particles: u32, reduced_motion: bool, rng: R) -> Self {
        Self {
            particles: Vec::new(),
            viewport,
            celebration_left: None,
            ripple_particles,
            reduced_motion,
            rng,
        }
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    /// Age everything by `dt` seconds and drop what has finished
    pub fn advance(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        for particle in &mut self.particles {
            particle.age += dt;
        }
        self.particles.retain(|p| !p.expired());

        if let Some(left) = self.celebration_left.as_mut() {
            *left -= dt;
            if *left <= 0.0 {
                self.hide_celebration();
            }
        }
    }

    pub fn is_active(&self) -> bool {
        !self.particles.is_empty() || self.celebration_left.is_some()
    }

    pub fn celebrating(&self) -> bool {
        self.celebration_left.is_some()
    }

    pub fn particles(&self) -> impl Iterator<Item = ParticleView> + '_ {
        self.particles.iter().map(Particle::view)
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

impl<R: RandomSource> EffectPresenter for EffectLayer<R> {
    fn show_ripple(&mut self, screen: Vec2, color: &'static str) {
        for _ in 0..self.ripple_particles {
            let travel = Vec2::new(
                range_f32(&mut self.rng, -RIPPLE_SPREAD, RIPPLE_SPREAD),
                range_f32(&mut self.rng, -RIPPLE_SPREAD, RIPPLE_SPREAD),
            );
            self.particles.push(Particle {
                kind: Kind::Ripple,
                origin: screen,
                travel,
                color,
                age: 0.0,
            });
        }
    }

    fn show_celebration(&mut self) {
        self.celebration_left = Some(CELEBRATION_SECS);
        if self.reduced_motion {
            return;
        }
        let px_per_unit = self.viewport / FIELD_SIZE;
        for _ in 0..FIREWORK_BURSTS {
            let center = Vec2::new(
                range_f32(&mut self.rng, 0.0, FIELD_SIZE),
                range_f32(&mut self.rng, 10.0, 90.0),
            );
            let origin = field_to_screen(center, self.viewport);
            let color_idx = (self.rng.next_f32() * FIREWORK_COLORS.len() as f32) as usize;
            let color = FIREWORK_COLORS[color_idx.min(FIREWORK_COLORS.len() - 1)];

            for j in 0..FIREWORK_PARTICLES {
                let angle = std::f32::consts::TAU * j as f32 / FIREWORK_PARTICLES as f32;
                // 10 to 15 field units
                let distance = range_f32(&mut self.rng, 100.0, 150.0) / 10.0;
                self.particles.push(Particle {
                    kind: Kind::Spark,
                    origin,
                    travel: Vec2::from_angle(angle) * distance * px_per_unit,
                    color,
                    age: 0.0,
                });
            }
            self.particles.push(Particle {
                kind: Kind::Flash,
                origin,
                travel: Vec2::ZERO,
                color: "#ffffff",
                age: 0.0,
            });
        }
    }

    fn hide_celebration(&mut self) {
        self.celebration_left = None;
        self.particles.retain(|p| p.kind == Kind::Ripple);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn layer(reduced_motion: bool) -> EffectLayer<Pcg32> {
        let settings = Settings {
            reduced_motion,
            ..Settings::default()
        };
        EffectLayer::new(
            Vec2::new(1000.0, 500.0),
            settings.ripple_particles(8),
            settings.reduced_motion,
            Pcg32::seed_from_u64(1),
        )
    }

    #[test]
    fn test_ripple_lifetime() {
        let mut fx = layer(false);
        fx.show_ripple(Vec2::new(200.0, 100.0), "#fb923c");
        assert_eq!(fx.len(), 8);
        for p in fx.particles() {
            assert_eq!(p.pos, Vec2::new(200.0, 100.0));
            assert_eq!(p.alpha, 1.0);
        }

        fx.advance(0.8);
        assert_eq!(fx.len(), 8);
        for p in fx.particles() {
            assert!(p.alpha.abs() < 1e-6);
            assert!((p.pos - Vec2::new(200.0, 100.0)).abs().max_element() <= RIPPLE_SPREAD + 1e-3);
        }

        fx.advance(0.25);
        assert!(fx.is_empty());
        assert!(!fx.is_active());
    }

    #[test]
    fn test_fireworks_self_terminate() {
        let mut fx = layer(false);
        fx.show_celebration();
        assert!(fx.celebrating());
        assert_eq!(
            fx.len(),
            (FIREWORK_BURSTS * (FIREWORK_PARTICLES + 1)) as usize
        );
        for p in fx.particles() {
            assert!(p.pos.x >= 0.0 && p.pos.x <= 1000.0);
            assert!(p.pos.y >= 50.0 && p.pos.y <= 450.0);
        }

        fx.advance(1.0);
        // Flashes are gone, sparks remain
        assert_eq!(fx.len(), (FIREWORK_BURSTS * FIREWORK_PARTICLES) as usize);
        fx.advance(2.0);
        assert!(fx.is_empty());
        assert!(fx.celebrating());
        fx.advance(1.1);
        assert!(!fx.celebrating());
        assert!(!fx.is_active());
    }

    #[test]
    fn test_hide_keeps_ripples() {
        let mut fx = layer(false);
        fx.show_ripple(Vec2::ZERO, "#000000");
        fx.show_celebration();
        fx.hide_celebration();
        assert_eq!(fx.len(), 8);
        assert!(!fx.celebrating());
    }

    #[test]
    fn test_reduced_motion() {
        let mut fx = layer(true);
        fx.show_ripple(Vec2::ZERO, "#000000");
        assert_eq!(fx.len(), 4);
        fx.show_celebration();
        assert_eq!(fx.len(), 4);
        assert!(fx.celebrating());
    }

    #[test]
    fn test_keyframes() {
        let times = [0.0, 0.3, 0.7, 1.0];
        let values = [0.0, 1.0, 0.5, 0.0];
        assert_eq!(keyframes(0.0, &times, &values), 0.0);
        assert!((keyframes(0.15, &times, &values) - 0.5).abs() < 1e-6);
        assert!((keyframes(0.5, &times, &values) - 0.75).abs() < 1e-6);
        assert!(keyframes(1.0, &times, &values).abs() < 1e-6);
        // Past the last key holds the last value
        assert_eq!(keyframes(2.0, &times, &values), 0.0);
    }
}
