//! Round lifecycle state machine
//!
//! `Running -> Celebrating -> Running (next round)`, forever. Spawning and
//! clearing are folded into the transitions. Timed steps are handed to the
//! driver as [`Control::Schedule`] and come back through [`RoundController::fire`];
//! each carries the round ID it was scheduled for, and anything that arrives
//! for a round that no longer exists is dropped.

use glam::Vec2;

use super::critter::TapOutcome;
use super::motion::{FrameClock, integrate};
use super::placement::Margin;
use super::rng::{RandomSource, range_inclusive};
use super::state::{
    Control, Deferred, DeferredAction, Feedback, FrameControl, Outbox, Phase, RenderFrame,
    RoundState,
};
use crate::tuning::Tuning;

/// Drives rounds, motion and taps for one game view
pub struct RoundController<R: RandomSource> {
    state: RoundState,
    tuning: Tuning,
    rng: R,
    clock: FrameClock,
    outbox: Outbox,
}

impl<R: RandomSource> RoundController<R> {
    pub fn new(tuning: Tuning, rng: R) -> Self {
        let margin = Margin::uniform(tuning.default_margin);
        Self {
            state: RoundState::new(margin),
            clock: FrameClock::new(tuning.nominal_frame_ms),
            tuning,
            rng,
            outbox: Outbox::default(),
        }
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn render_frame(&self) -> RenderFrame {
        self.state.render_frame()
    }

    /// Everything queued since the last call
    pub fn take_outbox(&mut self) -> Outbox {
        std::mem::take(&mut self.outbox)
    }

    /// First activation: spawn the opening round and start the frame loop.
    /// Activating an already running controller is a no-op.
    pub fn activate(&mut self) {
        if self.state.phase != Phase::Idle {
            return;
        }
        log::info!("Session started");
        self.spawn_round();
        self.outbox.control.push(Control::ResumeFrames);
    }

    /// One animation frame. Returns whether the driver should keep requesting frames.
    pub fn frame(&mut self, now_ms: f64) -> FrameControl {
        if self.state.phase != Phase::Running {
            self.clock.reset();
            return FrameControl::Suspend;
        }

        let dt = self.clock.advance(now_ms);
        integrate(
            &mut self.state.pool,
            dt,
            self.state.speed_multiplier,
            self.state.margin,
        );
        self.outbox.feedback.push(Feedback::Render);
        FrameControl::Continue
    }

    /// Resolve a tap on critter `id` at screen point (`screen_x`, `screen_y`).
    ///
    /// Stale taps (critter already gone, round reset) return `None` and change nothing.
    pub fn tap(&mut self, id: u32, screen_x: f32, screen_y: f32) -> Option<TapOutcome> {
        if self.state.phase != Phase::Running {
            log::debug!("Tap on {id} ignored outside a running round");
            return None;
        }
        let Some(outcome) = self.state.pool.resolve_tap(id) else {
            log::debug!("Stale tap on {id}");
            return None;
        };

        self.state.tap_count += 1;
        let species = outcome.removed.species;
        self.outbox.feedback.push(Feedback::PlayCue(species));
        self.outbox.feedback.push(Feedback::Haptic);
        self.outbox.feedback.push(Feedback::Ripple {
            screen: Vec2::new(screen_x, screen_y),
            color: species.color(),
        });
        self.outbox.feedback.push(Feedback::Render);

        if outcome.pool_now_empty {
            self.begin_celebration();
        }
        Some(outcome)
    }

    /// Apply a deferred callback. Returns `false` when it was discarded.
    pub fn fire(&mut self, deferred: Deferred) -> bool {
        if deferred.round_id != self.state.round_id || self.state.phase != Phase::Celebrating {
            log::debug!(
                "Discarding {:?} for round {} (current round {})",
                deferred.action,
                deferred.round_id,
                self.state.round_id
            );
            return false;
        }

        match deferred.action {
            DeferredAction::ShowCelebration => {
                self.outbox.feedback.push(Feedback::ShowCelebration);
                self.outbox.feedback.push(Feedback::PlayCelebrationCue);
            }
            DeferredAction::FinishCelebration => {
                self.outbox.feedback.push(Feedback::HideCelebration);

                self.state.rounds_cleared += 1;
                // Derived rather than accumulated so N rounds give exactly 1 + inc * N
                self.state.speed_multiplier =
                    1.0 + self.tuning.speed_increment * self.state.rounds_cleared as f32;
                log::info!(
                    "Round {} cleared, speed x{:.2}",
                    self.state.round_id,
                    self.state.speed_multiplier
                );

                self.spawn_round();
                self.outbox.control.push(Control::ResumeFrames);
            }
        }
        true
    }

    /// New margin from the viewport/critter size hook. Live critters are
    /// pulled inside the new bounds immediately.
    pub fn set_margin(&mut self, margin: Margin) {
        self.state.margin = margin;
        for critter in self.state.pool.iter_mut() {
            critter.pos = margin.clamp(critter.pos);
        }
        self.outbox.feedback.push(Feedback::Render);
    }

    /// View remount: throw away the current round (and any pending timers for
    /// it) and start a fresh one. Speed and tap count carry over.
    pub fn reset_round(&mut self) {
        if self.state.phase == Phase::Idle {
            self.activate();
            return;
        }
        if self.state.celebration_active() {
            self.outbox.feedback.push(Feedback::HideCelebration);
        }
        self.state.pool.clear();
        self.spawn_round();
        self.outbox.control.push(Control::ResumeFrames);
    }

    /// Start over with speed 1 and no taps. Timers from before the restart are
    /// discarded because the round ID keeps counting.
    pub fn restart_session(&mut self) {
        let round_id = self.state.round_id;
        let margin = self.state.margin;
        let was_celebrating = self.state.celebration_active();
        let pool = std::mem::take(&mut self.state.pool);

        self.state = RoundState::new(margin);
        self.state.round_id = round_id;
        // Keep the ID counter so old IDs stay stale
        self.state.pool = pool;
        self.state.pool.clear();

        if was_celebrating {
            self.outbox.feedback.push(Feedback::HideCelebration);
        }
        self.activate();
    }

    fn begin_celebration(&mut self) {
        if self.state.celebration_active() {
            return;
        }
        self.state.phase = Phase::Celebrating;
        self.clock.reset();
        log::info!("Round {} cleared, celebrating", self.state.round_id);

        let round_id = self.state.round_id;
        self.outbox.control.push(Control::SuspendFrames);
        self.outbox.control.push(Control::Schedule {
            delay_ms: self.tuning.celebration_delay_ms,
            deferred: Deferred {
                round_id,
                action: DeferredAction::ShowCelebration,
            },
        });
        self.outbox.control.push(Control::Schedule {
            delay_ms: self.tuning.celebration_total_ms,
            deferred: Deferred {
                round_id,
                action: DeferredAction::FinishCelebration,
            },
        });
    }

    fn spawn_round(&mut self) {
        let count = range_inclusive(
            &mut self.rng,
            self.tuning.min_critters,
            self.tuning.max_critters,
        );
        self.state.round_id += 1;
        self.state
            .pool
            .spawn(count, self.state.margin, &self.tuning, &mut self.rng);
        self.state.round_size = self.state.pool.len();
        self.state.phase = Phase::Running;
        self.clock.reset();
        log::info!(
            "Round {} spawned with {} critters",
            self.state.round_id,
            self.state.round_size
        );
        self.outbox.feedback.push(Feedback::Render);
    }
}
