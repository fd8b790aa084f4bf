//! Round state and the messages the simulation sends outward
//!
//! The simulation never calls collaborators directly. It queues [`Feedback`]
//! for presentation (renderer, audio, haptics, effects) and [`Control`] for
//! the driver (timers, frame loop), which the host drains after each call.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::critter::{CritterPool, Species};
use super::placement::Margin;

/// Where the round lifecycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Not activated yet
    Idle,
    /// Critters moving, taps accepted
    Running,
    /// Pool cleared; motion and spawning suspended until the deferred finish
    Celebrating,
}

/// Session-wide state of the single active round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundState {
    pub phase: Phase,
    pub pool: CritterPool,
    /// Rounds cleared this session; drives the speed multiplier
    pub rounds_cleared: u32,
    pub speed_multiplier: f32,
    /// Successful taps this session
    pub tap_count: u64,
    pub margin: Margin,
    /// Critters spawned at the start of the current round
    pub round_size: usize,
    /// Identifies the current round; deferred callbacks carry it
    pub round_id: u64,
}

impl RoundState {
    pub fn new(margin: Margin) -> Self {
        Self {
            phase: Phase::Idle,
            pool: CritterPool::new(),
            rounds_cleared: 0,
            speed_multiplier: 1.0,
            tap_count: 0,
            margin,
            round_size: 0,
            round_id: 0,
        }
    }

    /// Pool cleared and the next round not yet spawned
    pub fn celebration_active(&self) -> bool {
        self.phase == Phase::Celebrating
    }

    /// Snapshot for the renderer
    pub fn render_frame(&self) -> RenderFrame {
        RenderFrame {
            critters: self
                .pool
                .iter()
                .map(|c| CritterView {
                    id: c.id,
                    species: c.species,
                    x: c.pos.x,
                    y: c.pos.y,
                })
                .collect(),
            tap_count: self.tap_count,
            remaining: self.pool.len(),
            round_size: self.round_size,
            speed_multiplier: self.speed_multiplier,
            celebrating: self.celebration_active(),
        }
    }
}

/// What a deferred callback does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeferredAction {
    /// Start the fireworks once the last tap's feedback has played
    ShowCelebration,
    /// End the celebration, speed up, and spawn the next round
    FinishCelebration,
}

/// One-shot timer payload, tied to the round that scheduled it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deferred {
    pub round_id: u64,
    pub action: DeferredAction,
}

/// Whether the driver should request another animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameControl {
    Continue,
    Suspend,
}

/// Requests for presentation collaborators
#[derive(Debug, Clone, PartialEq)]
pub enum Feedback {
    /// Critters moved or the pool changed
    Render,
    PlayCue(Species),
    Haptic,
    Ripple { screen: Vec2, color: &'static str },
    ShowCelebration,
    PlayCelebrationCue,
    HideCelebration,
}

/// Requests for the driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    /// Call `fire(deferred)` after `delay_ms`
    Schedule { delay_ms: f64, deferred: Deferred },
    /// Withdraw the pending animation frame request
    SuspendFrames,
    /// Start requesting animation frames again
    ResumeFrames,
}

/// Messages queued since the last drain
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    pub feedback: Vec<Feedback>,
    pub control: Vec<Control>,
}

impl Outbox {
    pub fn is_empty(&self) -> bool {
        self.feedback.is_empty() && self.control.is_empty()
    }
}

/// A critter as the renderer sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CritterView {
    pub id: u32,
    pub species: Species,
    pub x: f32,
    pub y: f32,
}

/// Everything the renderer needs for one frame, HUD included
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFrame {
    pub critters: Vec<CritterView>,
    pub tap_count: u64,
    pub remaining: usize,
    pub round_size: usize,
    pub speed_multiplier: f32,
    pub celebrating: bool,
}
