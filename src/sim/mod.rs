//! Round lifecycle and motion simulation
//!
//! All gameplay logic lives here. This module must stay pure:
//! - Randomness only through an injected `RandomSource`
//! - Time only through timestamps and deferred callbacks handed in by the driver
//! - No rendering, audio or platform dependencies

pub mod critter;
pub mod motion;
pub mod placement;
pub mod rng;
pub mod round;
pub mod state;
pub mod timers;

pub use critter::{Critter, CritterPool, Species, TapOutcome};
pub use motion::{FrameClock, integrate};
pub use placement::{Margin, Placement, place_entity};
pub use rng::RandomSource;
pub use round::RoundController;
pub use state::{
    Control, CritterView, Deferred, DeferredAction, Feedback, FrameControl, Outbox, Phase,
    RenderFrame, RoundState,
};
pub use timers::TimerQueue;
