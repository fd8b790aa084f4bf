//! Tap Critters entry point
//!
//! On the web this wires up the canvas driver. Natively there is no window:
//! the binary plays a few rounds headlessly on a virtual clock, which is handy
//! for checking a tuning file (`tap-critters [tuning.json]`, `RUST_LOG=debug`).

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    tap_critters::platform::web::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    log::info!("Tap Critters (native) starting...");

    let tuning = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)?;
            let tuning = tap_critters::Tuning::from_json(&json)?;
            log::info!("Loaded tuning from {path}");
            tuning
        }
        None => tap_critters::Tuning::default(),
    };

    let report = headless::play(tuning, headless::ROUNDS)?;
    println!(
        "Cleared {} rounds with {} taps in {:.1}s of play, final speed x{:.2}, {} frames rendered",
        report.rounds, report.taps, report.seconds, report.speed, report.frames
    );
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;

    use tap_critters::Settings;
    use tap_critters::audio::AudioSession;
    use tap_critters::effects::EffectLayer;
    use tap_critters::field_to_screen;
    use tap_critters::host::{Host, LogRenderer, NoHaptics};
    use tap_critters::platform::Session;
    use tap_critters::sim::{Control, FrameControl, Phase, RoundController, TimerQueue};
    use tap_critters::tuning::Tuning;

    pub const ROUNDS: u32 = 3;
    const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);
    /// Virtual time between scripted taps (ms)
    const TAP_EVERY_MS: f64 = 350.0;
    /// Give up if the rounds haven't cleared by then (ms)
    const TIME_LIMIT_MS: f64 = 600_000.0;

    pub struct Report {
        pub rounds: u32,
        pub taps: u64,
        pub seconds: f64,
        pub speed: f32,
        pub frames: u64,
    }

    pub fn play(tuning: Tuning, rounds: u32) -> Result<Report, String> {
        let settings = Settings::default();
        let step_ms = tuning.nominal_frame_ms as f64;

        let mut audio = AudioSession::new(&settings);
        if let Err(e) = audio.open() {
            log::info!("Running silently: {e}");
        }
        let effects = EffectLayer::new(
            VIEWPORT,
            settings.ripple_particles(tuning.ripple_particles),
            settings.reduced_motion,
            rand::rng(),
        );
        let host = Host::new(LogRenderer::default(), audio, NoHaptics, effects, &settings);
        let controller = RoundController::new(tuning, rand::rng());
        let mut session = Session::new(controller, host, VIEWPORT);

        let mut timers = TimerQueue::new();
        let mut frames_on = false;
        let mut now = 0.0;
        let mut next_tap = TAP_EVERY_MS;

        while session.controller.state().rounds_cleared < rounds {
            if now > TIME_LIMIT_MS {
                return Err(format!(
                    "gave up after {:.0}s with {} rounds cleared",
                    now / 1000.0,
                    session.controller.state().rounds_cleared
                ));
            }

            for control in session.pump() {
                match control {
                    Control::Schedule { delay_ms, deferred } => {
                        timers.schedule(now, delay_ms, deferred)
                    }
                    Control::SuspendFrames => frames_on = false,
                    Control::ResumeFrames => frames_on = true,
                }
            }

            if frames_on && session.controller.frame(now) == FrameControl::Suspend {
                frames_on = false;
            }

            if now >= next_tap && session.controller.state().phase == Phase::Running {
                let target = session.controller.state().pool.iter().next().map(|c| c.pos);
                if let Some(pos) = target {
                    session.tap_at(field_to_screen(pos, VIEWPORT));
                }
                next_tap = now + TAP_EVERY_MS;
            }

            for deferred in timers.due(now) {
                session.controller.fire(deferred);
            }

            session.host.effects.advance((step_ms / 1000.0) as f32);
            now += step_ms;
        }

        let state = session.controller.state();
        Ok(Report {
            rounds: state.rounds_cleared,
            taps: state.tap_count,
            seconds: now / 1000.0,
            speed: state.speed_multiplier,
            frames: session.host.renderer.frames,
        })
    }
}
