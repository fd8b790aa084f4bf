//! Presentation collaborators and the dispatcher that feeds them
//!
//! The simulation queues [`Feedback`]; a [`Host`] turns each drained batch
//! into calls on a renderer, an audio gateway, a haptics device and an
//! effects presenter. Collaborator failures are absorbed here and never reach
//! the simulation.

use glam::Vec2;

use crate::audio::AudioError;
use crate::settings::Settings;
use crate::sim::{CritterView, Feedback, RenderFrame};

/// Draws critters and the HUD
pub trait Renderer {
    fn render_frame(&mut self, frame: &RenderFrame);
}

/// Plays sound cues; may fail without affecting gameplay
pub trait AudioGateway {
    fn play_cue(&mut self, cue: &str) -> Result<(), AudioError>;
    fn play_celebration_cue(&mut self) -> Result<(), AudioError>;
}

/// Short vibration on tap, where supported
pub trait Haptics {
    fn trigger(&mut self);
}

/// Transient visuals. Implementations manage their own lifetimes.
pub trait EffectPresenter {
    /// Burst at a screen position (pixels)
    fn show_ripple(&mut self, screen: Vec2, color: &'static str);
    fn show_celebration(&mut self);
    fn hide_celebration(&mut self);
}

/// Routes feedback to collaborators
pub struct Host<Rd, A, H, E> {
    pub renderer: Rd,
    pub audio: A,
    pub haptics: H,
    pub effects: E,
    haptics_enabled: bool,
    audio_failures: u64,
}

impl<Rd, A, H, E> Host<Rd, A, H, E>
where
    Rd: Renderer,
    A: AudioGateway,
    H: Haptics,
    E: EffectPresenter,
{
    pub fn new(renderer: Rd, audio: A, haptics: H, effects: E, settings: &Settings) -> Self {
        Self {
            renderer,
            audio,
            haptics,
            effects,
            haptics_enabled: settings.haptics,
            audio_failures: 0,
        }
    }

    pub fn set_haptics(&mut self, enabled: bool) {
        self.haptics_enabled = enabled;
    }

    /// Audio calls that have failed so far
    pub fn audio_failures(&self) -> u64 {
        self.audio_failures
    }

    /// Deliver one batch of feedback in order. Any number of `Render`
    /// requests collapse into a single render at the end of the batch, using
    /// the snapshot from `frame`.
    pub fn present<F>(&mut self, feedback: &[Feedback], frame: F)
    where
        F: FnOnce() -> RenderFrame,
    {
        let mut needs_render = false;
        for item in feedback {
            match item {
                Feedback::Render => needs_render = true,
                Feedback::PlayCue(species) => {
                    let result = self.audio.play_cue(species.cue());
                    self.absorb(result);
                }
                Feedback::Haptic => {
                    if self.haptics_enabled {
                        self.haptics.trigger();
                    }
                }
                Feedback::Ripple { screen, color } => self.effects.show_ripple(*screen, color),
                Feedback::ShowCelebration => self.effects.show_celebration(),
                Feedback::PlayCelebrationCue => {
                    let result = self.audio.play_celebration_cue();
                    self.absorb(result);
                }
                Feedback::HideCelebration => self.effects.hide_celebration(),
            }
        }
        if needs_render {
            self.renderer.render_frame(&frame());
        }
    }

    fn absorb(&mut self, result: Result<(), AudioError>) {
        if let Err(e) = result {
            self.audio_failures += 1;
            if self.audio_failures == 1 {
                log::warn!("Audio unavailable, continuing silently: {e}");
            } else {
                log::debug!("Audio failed: {e}");
            }
        }
    }
}

/// Nearest critter whose hit ellipse (half extents `radius`, field units)
/// contains `point`.
pub fn hit_test(critters: &[CritterView], point: Vec2, radius: Vec2) -> Option<u32> {
    if radius.x <= 0.0 || radius.y <= 0.0 {
        return None;
    }
    critters
        .iter()
        .map(|c| {
            let d = (Vec2::new(c.x, c.y) - point) / radius;
            (c.id, d.length_squared())
        })
        .filter(|&(_, d2)| d2 <= 1.0)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

/// Renderer for headless runs: frames go to the log as JSON
#[derive(Debug, Default)]
pub struct LogRenderer {
    pub frames: u64,
}

impl Renderer for LogRenderer {
    fn render_frame(&mut self, frame: &RenderFrame) {
        self.frames += 1;
        if log::log_enabled!(log::Level::Trace) {
            match serde_json::to_string(frame) {
                Ok(json) => log::trace!("frame {}: {json}", self.frames),
                Err(e) => log::warn!("Failed to serialize frame: {e}"),
            }
        }
    }
}

/// Haptics for devices without a vibration motor
#[derive(Debug, Default)]
pub struct NoHaptics;

impl Haptics for NoHaptics {
    fn trigger(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Species;

    #[derive(Default)]
    struct CountingRenderer {
        frames: Vec<RenderFrame>,
    }

    impl Renderer for CountingRenderer {
        fn render_frame(&mut self, frame: &RenderFrame) {
            self.frames.push(frame.clone());
        }
    }

    #[derive(Default)]
    struct RecordingAudio {
        cues: Vec<String>,
        fail: bool,
    }

    impl AudioGateway for RecordingAudio {
        fn play_cue(&mut self, cue: &str) -> Result<(), AudioError> {
            if self.fail {
                return Err(AudioError::Backend("context lost".into()));
            }
            self.cues.push(cue.to_string());
            Ok(())
        }

        fn play_celebration_cue(&mut self) -> Result<(), AudioError> {
            if self.fail {
                return Err(AudioError::Closed);
            }
            self.cues.push("celebration".to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingHaptics(u32);

    impl Haptics for CountingHaptics {
        fn trigger(&mut self) {
            self.0 += 1;
        }
    }

    #[derive(Default)]
    struct RecordingEffects(Vec<String>);

    impl EffectPresenter for RecordingEffects {
        fn show_ripple(&mut self, screen: Vec2, color: &'static str) {
            self.0.push(format!("ripple {} {} {color}", screen.x, screen.y));
        }
        fn show_celebration(&mut self) {
            self.0.push("show".into());
        }
        fn hide_celebration(&mut self) {
            self.0.push("hide".into());
        }
    }

    type TestHost = Host<CountingRenderer, RecordingAudio, CountingHaptics, RecordingEffects>;

    fn host(settings: &Settings) -> TestHost {
        Host::new(
            CountingRenderer::default(),
            RecordingAudio::default(),
            CountingHaptics::default(),
            RecordingEffects::default(),
            settings,
        )
    }

    fn empty_frame() -> RenderFrame {
        RenderFrame {
            critters: Vec::new(),
            tap_count: 0,
            remaining: 0,
            round_size: 0,
            speed_multiplier: 1.0,
            celebrating: false,
        }
    }

    fn tap_feedback() -> Vec<Feedback> {
        vec![
            Feedback::PlayCue(Species::Dog),
            Feedback::Haptic,
            Feedback::Ripple {
                screen: Vec2::new(10.0, 20.0),
                color: Species::Dog.color(),
            },
            Feedback::Render,
        ]
    }

    #[test]
    fn test_tap_feedback_reaches_everyone() {
        let mut host = host(&Settings::default());
        host.present(&tap_feedback(), empty_frame);
        assert_eq!(host.audio.cues, vec!["woof"]);
        assert_eq!(host.haptics.0, 1);
        assert_eq!(host.effects.0.len(), 1);
        assert!(host.effects.0[0].starts_with("ripple 10 20"));
        assert_eq!(host.renderer.frames.len(), 1);
    }

    #[test]
    fn test_renders_are_coalesced() {
        let mut host = host(&Settings::default());
        host.present(&[Feedback::Render, Feedback::Render, Feedback::Render], empty_frame);
        assert_eq!(host.renderer.frames.len(), 1);

        let mut called = false;
        host.present(&[Feedback::Haptic], || {
            called = true;
            empty_frame()
        });
        assert!(!called);
        assert_eq!(host.renderer.frames.len(), 1);
    }

    #[test]
    fn test_haptics_setting_respected() {
        let settings = Settings {
            haptics: false,
            ..Settings::default()
        };
        let mut host = host(&settings);
        host.present(&tap_feedback(), empty_frame);
        assert_eq!(host.haptics.0, 0);
        host.set_haptics(true);
        host.present(&tap_feedback(), empty_frame);
        assert_eq!(host.haptics.0, 1);
    }

    #[test]
    fn test_audio_failure_is_absorbed() {
        let mut host = host(&Settings::default());
        host.audio.fail = true;
        host.present(&tap_feedback(), empty_frame);
        host.present(
            &[Feedback::ShowCelebration, Feedback::PlayCelebrationCue],
            empty_frame,
        );
        assert_eq!(host.audio_failures(), 2);
        // Everything else still happened
        assert_eq!(host.haptics.0, 1);
        assert_eq!(host.renderer.frames.len(), 1);
        assert_eq!(host.effects.0.last().map(String::as_str), Some("show"));
    }

    #[test]
    fn test_celebration_order() {
        let mut host = host(&Settings::default());
        host.present(
            &[
                Feedback::ShowCelebration,
                Feedback::PlayCelebrationCue,
                Feedback::HideCelebration,
            ],
            empty_frame,
        );
        assert_eq!(host.effects.0, vec!["show", "hide"]);
        assert_eq!(host.audio.cues, vec!["celebration"]);
    }

    #[test]
    fn test_hit_test_picks_nearest() {
        let critters = vec![
            CritterView { id: 1, species: Species::Cat, x: 20.0, y: 20.0 },
            CritterView { id: 2, species: Species::Dog, x: 26.0, y: 20.0 },
            CritterView { id: 3, species: Species::Fish, x: 80.0, y: 80.0 },
        ];
        let radius = Vec2::new(8.0, 8.0);
        assert_eq!(hit_test(&critters, Vec2::new(22.0, 20.0), radius), Some(1));
        assert_eq!(hit_test(&critters, Vec2::new(24.0, 20.0), radius), Some(2));
        assert_eq!(hit_test(&critters, Vec2::new(50.0, 50.0), radius), None);
        assert_eq!(hit_test(&critters, Vec2::new(20.0, 20.0), Vec2::ZERO), None);
        assert_eq!(hit_test(&[], Vec2::new(20.0, 20.0), radius), None);
    }

    #[test]
    fn test_hit_test_is_elliptical() {
        let critters = vec![CritterView { id: 7, species: Species::Bug, x: 50.0, y: 50.0 }];
        // Wide landscape viewport: the box is narrower in x than in y
        let radius = Vec2::new(4.0, 8.0);
        assert_eq!(hit_test(&critters, Vec2::new(50.0, 57.0), radius), Some(7));
        assert_eq!(hit_test(&critters, Vec2::new(55.0, 50.0), radius), None);
    }

    #[test]
    fn test_log_renderer_counts() {
        let mut renderer = LogRenderer::default();
        renderer.render_frame(&empty_frame());
        renderer.render_frame(&empty_frame());
        assert_eq!(renderer.frames, 2);
    }
}
