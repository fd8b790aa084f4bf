//! Platform glue
//!
//! [`Session`] ties a [`RoundController`] to a [`Host`] so drivers only deal
//! with time, input and the [`Control`] requests that come back. The browser
//! driver lives in `web`; the native binary drives a session headlessly.

#[cfg(target_arch = "wasm32")]
pub mod web;

use glam::Vec2;

use crate::host::{AudioGateway, EffectPresenter, Haptics, Host, Renderer, hit_test};
use crate::screen_to_field;
use crate::sim::{Control, Margin, RandomSource, RoundController, TapOutcome};

/// Critter sprite bounds (CSS pixels)
const SPRITE_MIN_PX: f32 = 48.0;
const SPRITE_MAX_PX: f32 = 120.0;
/// Sprite edge as a fraction of the shorter viewport side
const SPRITE_FRACTION: f32 = 0.15;

/// Sprite edge length for a viewport, in pixels
pub fn sprite_px(viewport: Vec2) -> f32 {
    (viewport.min_element() * SPRITE_FRACTION).clamp(SPRITE_MIN_PX, SPRITE_MAX_PX)
}

/// Margin that keeps a whole sprite on screen. Also the tap hit radius.
pub fn sprite_margin(viewport: Vec2) -> Margin {
    Margin::from_sizes(viewport, Vec2::splat(sprite_px(viewport)))
}

/// A controller and its presentation collaborators
pub struct Session<R, Rd, A, H, E>
where
    R: RandomSource,
{
    pub controller: RoundController<R>,
    pub host: Host<Rd, A, H, E>,
    viewport: Vec2,
}

impl<R, Rd, A, H, E> Session<R, Rd, A, H, E>
where
    R: RandomSource,
    Rd: Renderer,
    A: AudioGateway,
    H: Haptics,
    E: EffectPresenter,
{
    /// Measure the viewport, then activate the controller so the opening
    /// round is placed inside the real margin.
    pub fn new(mut controller: RoundController<R>, host: Host<Rd, A, H, E>, viewport: Vec2) -> Self {
        controller.set_margin(sprite_margin(viewport));
        controller.activate();
        Self {
            controller,
            host,
            viewport,
        }
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Present everything the controller queued; returns the driver requests
    pub fn pump(&mut self) -> Vec<Control> {
        let outbox = self.controller.take_outbox();
        let controller = &self.controller;
        self.host
            .present(&outbox.feedback, || controller.render_frame());
        outbox.control
    }

    /// Resolve a pointer press at `screen` (pixels) to a critter and tap it
    pub fn tap_at(&mut self, screen: Vec2) -> Option<TapOutcome> {
        let point = screen_to_field(screen, self.viewport);
        let radius = sprite_margin(self.viewport).min();
        let frame = self.controller.render_frame();
        let Some(id) = hit_test(&frame.critters, point, radius) else {
            log::trace!("Miss at ({:.0}, {:.0})", screen.x, screen.y);
            return None;
        };
        self.controller.tap(id, screen.x, screen.y)
    }

    /// Viewport changed; recompute the margin
    pub fn resize(&mut self, viewport: Vec2) {
        self.viewport = viewport;
        self.controller.set_margin(sprite_margin(viewport));
    }
}
