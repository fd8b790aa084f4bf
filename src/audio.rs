//! Audio using the Web Audio API
//!
//! Every sound is synthesized from oscillators; no sample files. Recipes are
//! plain data (`Tone`) so they can be inspected off the browser; only the
//! `web` backend turns them into nodes.

use thiserror::Error;

use crate::host::AudioGateway;
use crate::settings::Settings;
use crate::sim::rng::{RandomSource, range_f32};

/// Why a sound could not be played
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio is not supported on this platform")]
    Unsupported,
    #[error("audio session is closed")]
    Closed,
    #[error("audio backend failed: {0}")]
    Backend(String),
}

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// How the frequency moves between sweep points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ramp {
    Linear,
    Exponential,
}

/// One oscillator voice
#[derive(Debug, Clone, PartialEq)]
pub struct Tone {
    pub wave: Wave,
    /// Peak gain before master volume
    pub gain: f32,
    /// Start offset from "now" (seconds)
    pub start: f64,
    /// Length; gain decays to 0.01 over it (seconds)
    pub duration: f64,
    /// Frequency points as (offset from tone start, Hz); first point at 0
    pub sweep: Vec<(f64, f32)>,
    pub ramp: Ramp,
}

impl Tone {
    fn new(wave: Wave, gain: f32, duration: f64, sweep: &[(f64, f32)]) -> Self {
        Self {
            wave,
            gain,
            start: 0.0,
            duration,
            sweep: sweep.to_vec(),
            ramp: Ramp::Linear,
        }
    }

    fn at(mut self, start: f64) -> Self {
        self.start = start;
        self
    }

    fn exponential(mut self) -> Self {
        self.ramp = Ramp::Exponential;
        self
    }
}

/// Recipe for an animal cue. Unknown cue IDs get a plain C5 chime.
pub fn cue_tones(cue: &str) -> Vec<Tone> {
    match cue {
        // Cat - high meow
        "meow" => vec![Tone::new(Wave::Sine, 0.3, 0.2, &[(0.0, 800.0), (0.1, 600.0)])],
        // Dog - low woof
        "woof" => vec![Tone::new(Wave::Sawtooth, 0.3, 0.15, &[(0.0, 200.0), (0.15, 150.0)])],
        // Bird - up-down chirp
        "chirp" => vec![Tone::new(
            Wave::Sine,
            0.25,
            0.15,
            &[(0.0, 1200.0), (0.05, 1500.0), (0.1, 1200.0)],
        )],
        // Rabbit - soft squeak
        "squeak" => vec![Tone::new(Wave::Sine, 0.2, 0.1, &[(0.0, 900.0), (0.08, 950.0)])],
        // Fish - three rising bubbles
        "bubble" => (0..3)
            .map(|i| {
                Tone::new(Wave::Sine, 0.15, 0.1, &[(0.0, 300.0 + i as f32 * 50.0)])
                    .at(i as f64 * 0.08)
            })
            .collect(),
        // Squirrel - quick double chatter
        "chatter" => (0..2)
            .map(|i| Tone::new(Wave::Square, 0.2, 0.08, &[(0.0, 1000.0)]).at(i as f64 * 0.1))
            .collect(),
        // Turtle - slow low hum
        "slow" => vec![Tone::new(Wave::Triangle, 0.25, 0.3, &[(0.0, 150.0), (0.3, 120.0)])],
        // Bug - buzz
        "buzz" => vec![Tone::new(Wave::Sawtooth, 0.2, 0.2, &[(0.0, 400.0), (0.2, 450.0)])],
        _ => vec![Tone::new(Wave::Sine, 0.3, 0.2, &[(0.0, 523.25)])],
    }
}

/// Fireworks: three bursts 200 ms apart, each a falling bass thump plus a
/// rising sparkle whose pitch is jittered.
pub fn celebration_tones(rng: &mut impl RandomSource) -> Vec<Tone> {
    let mut tones = Vec::with_capacity(6);
    for i in 0..3 {
        let at = i as f64 * 0.2;
        tones.push(
            Tone::new(Wave::Sine, 0.4, 0.3, &[(0.0, 80.0), (0.3, 40.0)])
                .exponential()
                .at(at),
        );
        let from = range_f32(rng, 2000.0, 3000.0);
        let to = range_f32(rng, 3000.0, 4000.0);
        tones.push(
            Tone::new(Wave::Sine, 0.15, 0.2, &[(0.0, from), (0.2, to)])
                .exponential()
                .at(at),
        );
    }
    tones
}

/// Pentatonic lullaby for the background music loop (Hz)
pub const MUSIC_NOTES: [f32; 8] = [
    261.63, 293.66, 329.63, 392.0, 440.0, 392.0, 329.63, 293.66,
];
/// Length of one music note (seconds)
pub const MUSIC_NOTE_SECS: f64 = 0.45;
/// How far ahead the music loop is scheduled (seconds)
pub const MUSIC_SPAN_SECS: f64 = 120.0;

/// Owns the audio context and music state for one game view.
///
/// Must be opened (after a user gesture, on the web) before it makes sound,
/// and closed when the view goes away.
pub struct AudioSession {
    #[cfg(target_arch = "wasm32")]
    backend: Option<web::Backend>,
    open: bool,
    sfx_volume: f32,
    #[cfg(target_arch = "wasm32")]
    music_volume: f32,
    muted: bool,
    music_on: bool,
    jitter: rand::rngs::ThreadRng,
}

impl AudioSession {
    pub fn new(settings: &Settings) -> Self {
        Self {
            #[cfg(target_arch = "wasm32")]
            backend: None,
            open: false,
            sfx_volume: settings.master_volume * settings.sfx_volume,
            #[cfg(target_arch = "wasm32")]
            music_volume: settings.master_volume * settings.music_volume,
            muted: settings.muted,
            music_on: settings.music,
            jitter: rand::rng(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Create the underlying context
    #[cfg(target_arch = "wasm32")]
    pub fn open(&mut self) -> Result<(), AudioError> {
        if self.open {
            return Ok(());
        }
        let backend = web::Backend::new()?;
        self.backend = Some(backend);
        self.open = true;
        log::info!("Audio session opened");
        if self.music_on {
            self.start_music()?;
        }
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn open(&mut self) -> Result<(), AudioError> {
        Err(AudioError::Unsupported)
    }

    /// Stop music and release the context
    pub fn close(&mut self) {
        #[cfg(target_arch = "wasm32")]
        {
            if let Some(backend) = self.backend.take() {
                backend.close();
            }
        }
        if self.open {
            log::info!("Audio session closed");
        }
        self.open = false;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            #[cfg(target_arch = "wasm32")]
            {
                if let Some(backend) = &mut self.backend {
                    backend.stop_music();
                }
            }
        } else if self.music_on && self.open {
            if let Err(e) = self.start_music() {
                log::debug!("Music did not resume after unmute: {e}");
            }
        }
    }

    /// Toggle background music
    pub fn set_music(&mut self, on: bool) -> Result<(), AudioError> {
        self.music_on = on;
        if !self.open {
            return Ok(());
        }
        if on {
            self.start_music()
        } else {
            #[cfg(target_arch = "wasm32")]
            {
                if let Some(backend) = &mut self.backend {
                    backend.stop_music();
                }
            }
            Ok(())
        }
    }

    pub fn music_on(&self) -> bool {
        self.music_on
    }

    /// Reschedule the music loop if it is about to run out
    pub fn keep_music_alive(&mut self) {
        if self.open && self.music_on && !self.muted {
            #[cfg(target_arch = "wasm32")]
            {
                if let Some(backend) = &mut self.backend {
                    if backend.music_ending_soon() {
                        if let Err(e) = backend.start_music(self.music_volume) {
                            log::debug!("Music loop not rescheduled: {e}");
                        }
                    }
                }
            }
        }
    }

    /// Effective effects volume
    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.sfx_volume }
    }

    #[cfg(target_arch = "wasm32")]
    fn start_music(&mut self) -> Result<(), AudioError> {
        if self.muted {
            return Ok(());
        }
        match &mut self.backend {
            Some(backend) => backend.start_music(self.music_volume),
            None => Err(AudioError::Closed),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn start_music(&mut self) -> Result<(), AudioError> {
        if self.muted {
            return Ok(());
        }
        Err(AudioError::Unsupported)
    }

    /// Play a set of tones now
    pub fn play_tones(&mut self, tones: &[Tone]) -> Result<(), AudioError> {
        if !self.open {
            return Err(AudioError::Closed);
        }
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return Ok(());
        }
        #[cfg(target_arch = "wasm32")]
        {
            if let Some(backend) = &self.backend {
                return backend.play(tones, vol);
            }
        }
        let _ = tones;
        Err(AudioError::Closed)
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl AudioGateway for AudioSession {
    fn play_cue(&mut self, cue: &str) -> Result<(), AudioError> {
        self.play_tones(&cue_tones(cue))
    }

    fn play_celebration_cue(&mut self) -> Result<(), AudioError> {
        let tones = celebration_tones(&mut self.jitter);
        self.play_tones(&tones)
    }
}

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioError, MUSIC_NOTE_SECS, MUSIC_NOTES, MUSIC_SPAN_SECS, Ramp, Tone, Wave};

    fn js_err(e: wasm_bindgen::JsValue) -> AudioError {
        AudioError::Backend(format!("{e:?}"))
    }

    fn osc_type(wave: Wave) -> OscillatorType {
        match wave {
            Wave::Sine => OscillatorType::Sine,
            Wave::Square => OscillatorType::Square,
            Wave::Sawtooth => OscillatorType::Sawtooth,
            Wave::Triangle => OscillatorType::Triangle,
        }
    }

    struct Music {
        osc: OscillatorNode,
        ends_at: f64,
    }

    pub(super) struct Backend {
        ctx: AudioContext,
        music: Option<Music>,
    }

    impl Backend {
        pub(super) fn new() -> Result<Self, AudioError> {
            let ctx = AudioContext::new().map_err(|e| {
                log::warn!("Failed to create AudioContext - audio disabled");
                js_err(e)
            })?;
            Ok(Self { ctx, music: None })
        }

        /// Create an oscillator with gain envelope
        fn create_osc(&self, freq: f32, wave: Wave) -> Result<(OscillatorNode, GainNode), AudioError> {
            let osc = self.ctx.create_oscillator().map_err(js_err)?;
            let gain = self.ctx.create_gain().map_err(js_err)?;
            osc.set_type(osc_type(wave));
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).map_err(js_err)?;
            gain.connect_with_audio_node(&self.ctx.destination())
                .map_err(js_err)?;
            Ok((osc, gain))
        }

        pub(super) fn play(&self, tones: &[Tone], vol: f32) -> Result<(), AudioError> {
            // Resume context if suspended (browsers require user gesture)
            if self.ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = self.ctx.resume();
            }
            let now = self.ctx.current_time();
            for tone in tones {
                let first = tone.sweep.first().map(|&(_, f)| f).unwrap_or(440.0);
                let (osc, gain) = self.create_osc(first, tone.wave)?;
                let t = now + tone.start;

                gain.gain().set_value_at_time(vol * tone.gain, t).map_err(js_err)?;
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, t + tone.duration)
                    .map_err(js_err)?;

                osc.frequency().set_value_at_time(first, t).map_err(js_err)?;
                for &(offset, freq) in tone.sweep.iter().skip(1) {
                    let param = osc.frequency();
                    let scheduled = match tone.ramp {
                        Ramp::Linear => param.linear_ramp_to_value_at_time(freq, t + offset),
                        Ramp::Exponential => param.exponential_ramp_to_value_at_time(freq, t + offset),
                    };
                    scheduled.map_err(js_err)?;
                }

                osc.start_with_when(t).map_err(js_err)?;
                osc.stop_with_when(t + tone.duration).map_err(js_err)?;
            }
            Ok(())
        }

        pub(super) fn start_music(&mut self, vol: f32) -> Result<(), AudioError> {
            self.stop_music();
            let (osc, gain) = self.create_osc(MUSIC_NOTES[0], Wave::Triangle)?;
            let t = self.ctx.current_time();
            gain.gain().set_value_at_time(vol * 0.08, t).map_err(js_err)?;
            let notes = (MUSIC_SPAN_SECS / MUSIC_NOTE_SECS) as usize;
            for i in 0..notes {
                let freq = MUSIC_NOTES[i % MUSIC_NOTES.len()];
                osc.frequency()
                    .set_value_at_time(freq, t + i as f64 * MUSIC_NOTE_SECS)
                    .map_err(js_err)?;
            }
            osc.start_with_when(t).map_err(js_err)?;
            osc.stop_with_when(t + MUSIC_SPAN_SECS).map_err(js_err)?;
            self.music = Some(Music {
                osc,
                ends_at: t + MUSIC_SPAN_SECS,
            });
            Ok(())
        }

        pub(super) fn stop_music(&mut self) {
            if let Some(music) = self.music.take() {
                let _ = music.osc.stop();
            }
        }

        pub(super) fn music_ending_soon(&self) -> bool {
            match &self.music {
                Some(music) => self.ctx.current_time() > music.ends_at - 10.0,
                None => true,
            }
        }

        pub(super) fn close(mut self) {
            self.stop_music();
            let _ = self.ctx.close();
        }
    }
}
