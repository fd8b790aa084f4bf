//! Browser driver: canvas painting, pointer input, vibration and timers
//!
//! Two animation-frame loops run side by side. The game loop advances motion
//! and is cancelled while a celebration is on; the paint loop always runs so
//! ripples and fireworks keep animating.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use rand::rngs::ThreadRng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlCanvasElement, KeyboardEvent, Navigator, PointerEvent,
    Window,
};

use super::{Session, sprite_px};
use crate::audio::AudioSession;
use crate::effects::{EffectLayer, ParticleView};
use crate::field_to_screen;
use crate::host::{Haptics, Host, Renderer};
use crate::settings::Settings;
use crate::sim::{Control, Deferred, FrameControl, RenderFrame, RoundController};
use crate::tuning::Tuning;

const VIBRATE_MS: u32 = 30;
const HUD_FONT: &str = "bold 28px sans-serif";
const HUD_DOT_RADIUS: f64 = 8.0;
const HUD_PAD: f64 = 20.0;

/// Draws the latest frame and the effect particles onto a 2D canvas
pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    /// CSS pixels
    viewport: Vec2,
    dpr: f64,
    frame: Option<RenderFrame>,
}

impl CanvasRenderer {
    fn new(canvas: HtmlCanvasElement, dpr: f64) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or("2d canvas context unavailable")?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let mut renderer = Self {
            canvas,
            ctx,
            viewport: Vec2::ZERO,
            dpr,
            frame: None,
        };
        renderer.resize(dpr);
        Ok(renderer)
    }

    /// Match the backing store to the element's CSS size; returns the new viewport
    fn resize(&mut self, dpr: f64) -> Vec2 {
        self.dpr = dpr;
        let w = self.canvas.client_width().max(1);
        let h = self.canvas.client_height().max(1);
        self.canvas.set_width((w as f64 * dpr) as u32);
        self.canvas.set_height((h as f64 * dpr) as u32);
        self.viewport = Vec2::new(w as f32, h as f32);
        log::debug!("Canvas resized to {w}x{h} @{dpr}x");
        self.viewport
    }

    fn paint(&self, particles: impl Iterator<Item = ParticleView>) {
        let ctx = &self.ctx;
        let _ = ctx.set_transform(self.dpr, 0.0, 0.0, self.dpr, 0.0, 0.0);
        ctx.clear_rect(0.0, 0.0, self.viewport.x as f64, self.viewport.y as f64);

        if let Some(frame) = &self.frame {
            self.paint_critters(frame);
            self.paint_hud(frame);
        }
        for p in particles {
            self.paint_particle(&p);
        }
        ctx.set_global_alpha(1.0);
        ctx.set_shadow_blur(0.0);
    }

    fn paint_critters(&self, frame: &RenderFrame) {
        let ctx = &self.ctx;
        let size = sprite_px(self.viewport) as f64;
        ctx.set_font(&format!("{:.0}px sans-serif", size * 0.8));
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");

        for critter in &frame.critters {
            let pos = field_to_screen(Vec2::new(critter.x, critter.y), self.viewport);
            let (x, y) = (pos.x as f64, pos.y as f64);

            // Badge
            ctx.set_global_alpha(0.25);
            ctx.set_fill_style_str(critter.species.color());
            ctx.begin_path();
            let _ = ctx.arc(x, y, size / 2.0, 0.0, std::f64::consts::TAU);
            ctx.fill();

            ctx.set_global_alpha(1.0);
            let _ = ctx.fill_text(critter.species.emoji(), x, y);
        }
    }

    fn paint_hud(&self, frame: &RenderFrame) {
        let ctx = &self.ctx;
        ctx.set_global_alpha(1.0);
        ctx.set_font(HUD_FONT);
        ctx.set_text_align("left");
        ctx.set_text_baseline("top");
        ctx.set_fill_style_str("#ffffff");
        let _ = ctx.fill_text(&format!("⭐ {}", frame.tap_count), HUD_PAD, HUD_PAD);

        // One dot per critter this round, filled once tapped
        let tapped = frame.round_size.saturating_sub(frame.remaining);
        let step = HUD_DOT_RADIUS * 3.0;
        let right = self.viewport.x as f64 - HUD_PAD - HUD_DOT_RADIUS;
        for i in 0..frame.round_size {
            let x = right - (frame.round_size - 1 - i) as f64 * step;
            ctx.begin_path();
            let _ = ctx.arc(
                x,
                HUD_PAD + HUD_DOT_RADIUS,
                HUD_DOT_RADIUS,
                0.0,
                std::f64::consts::TAU,
            );
            if i < tapped {
                ctx.set_fill_style_str("#facc15");
                ctx.fill();
            } else {
                ctx.set_stroke_style_str("#ffffff");
                ctx.stroke();
            }
        }
    }

    fn paint_particle(&self, p: &ParticleView) {
        if p.radius <= 0.0 || p.alpha <= 0.0 {
            return;
        }
        let ctx = &self.ctx;
        ctx.set_global_alpha(p.alpha as f64);
        ctx.set_fill_style_str(p.color);
        if p.glow {
            ctx.set_shadow_color(p.color);
            ctx.set_shadow_blur(p.radius as f64 * 2.0);
        } else {
            ctx.set_shadow_blur(0.0);
        }
        ctx.begin_path();
        let _ = ctx.arc(
            p.pos.x as f64,
            p.pos.y as f64,
            p.radius as f64,
            0.0,
            std::f64::consts::TAU,
        );
        ctx.fill();
    }
}

impl Renderer for CanvasRenderer {
    fn render_frame(&mut self, frame: &RenderFrame) {
        log::trace!("render {} critters", frame.critters.len());
        self.frame = Some(frame.clone());
    }
}

/// `navigator.vibrate`; silently does nothing where unsupported
pub struct VibrateHaptics {
    navigator: Navigator,
}

impl Haptics for VibrateHaptics {
    fn trigger(&mut self) {
        let _ = self.navigator.vibrate_with_duration(VIBRATE_MS);
    }
}

type WebSession =
    Session<ThreadRng, CanvasRenderer, AudioSession, VibrateHaptics, EffectLayer<ThreadRng>>;

/// Game instance holding all state
struct App {
    session: WebSession,
    window: Window,
    /// Pending game-loop frame request
    game_frame: Option<i32>,
    last_paint: Option<f64>,
    /// Opening audio failed once; don't retry on every tap
    audio_failed: bool,
}

impl App {
    /// Audio may only start from a user gesture
    fn unlock_audio(&mut self) {
        let audio = &mut self.session.host.audio;
        if audio.is_open() || self.audio_failed {
            return;
        }
        if let Err(e) = audio.open() {
            log::warn!("Audio disabled: {e}");
            self.audio_failed = true;
        }
    }
}

pub fn run() -> Result<(), JsValue> {
    log::info!("Tap Critters starting...");

    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;

    // Hide loading indicator
    if let Some(loading) = document.get_element_by_id("loading") {
        let _ = loading.set_attribute("class", "hidden");
    }

    let canvas: HtmlCanvasElement = document
        .get_element_by_id("canvas")
        .ok_or("no canvas")?
        .dyn_into()?;

    let settings = Settings::from_query(&window.location().search().unwrap_or_default());
    let tuning = Tuning::default();
    log::info!("Settings: {settings:?}");

    let renderer = CanvasRenderer::new(canvas.clone(), window.device_pixel_ratio())?;
    let viewport = renderer.viewport;
    let effects = EffectLayer::new(
        viewport,
        settings.ripple_particles(tuning.ripple_particles),
        settings.reduced_motion,
        rand::rng(),
    );
    let haptics = VibrateHaptics {
        navigator: window.navigator(),
    };
    let host = Host::new(
        renderer,
        AudioSession::new(&settings),
        haptics,
        effects,
        &settings,
    );

    let controller = RoundController::new(tuning, rand::rng());
    let session = Session::new(controller, host, viewport);

    let app = Rc::new(RefCell::new(App {
        session,
        window: window.clone(),
        game_frame: None,
        last_paint: None,
        audio_failed: false,
    }));

    setup_input_handlers(&canvas, &window, &app)?;
    setup_restart_button(&document, &app)?;
    setup_lifecycle(&window, &app)?;

    let controls = app.borrow_mut().session.pump();
    apply_controls(&app, controls);
    request_paint_frame(app);

    log::info!("Tap Critters running!");
    Ok(())
}

/// Carry out driver requests from the controller
fn apply_controls(app: &Rc<RefCell<App>>, controls: Vec<Control>) {
    for control in controls {
        match control {
            Control::Schedule { delay_ms, deferred } => schedule(app.clone(), delay_ms, deferred),
            Control::SuspendFrames => {
                let mut a = app.borrow_mut();
                if let Some(handle) = a.game_frame.take() {
                    let _ = a.window.cancel_animation_frame(handle);
                }
            }
            Control::ResumeFrames => request_game_frame(app.clone()),
        }
    }
}

fn schedule(app: Rc<RefCell<App>>, delay_ms: f64, deferred: Deferred) {
    let window = app.borrow().window.clone();
    let closure = Closure::once(move || {
        let controls = {
            let mut a = app.borrow_mut();
            a.session.controller.fire(deferred);
            a.session.pump()
        };
        apply_controls(&app, controls);
    });
    if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        closure.as_ref().unchecked_ref(),
        delay_ms.round() as i32,
    ) {
        log::warn!("Failed to schedule {:?}: {e:?}", deferred.action);
    }
    closure.forget();
}

fn request_game_frame(app: Rc<RefCell<App>>) {
    if app.borrow().game_frame.is_some() {
        return;
    }
    let window = app.borrow().window.clone();
    let pending = app.clone();
    let closure = Closure::once(move |time: f64| {
        game_loop(pending, time);
    });
    match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
        Ok(handle) => app.borrow_mut().game_frame = Some(handle),
        Err(e) => log::warn!("requestAnimationFrame failed: {e:?}"),
    }
    closure.forget();
}

fn game_loop(app: Rc<RefCell<App>>, time: f64) {
    let (next, controls) = {
        let mut a = app.borrow_mut();
        a.game_frame = None;
        let next = a.session.controller.frame(time);
        (next, a.session.pump())
    };
    apply_controls(&app, controls);
    if next == FrameControl::Continue {
        request_game_frame(app);
    }
}

fn request_paint_frame(app: Rc<RefCell<App>>) {
    let window = app.borrow().window.clone();
    let closure = Closure::once(move |time: f64| {
        paint_loop(app, time);
    });
    let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
    closure.forget();
}

fn paint_loop(app: Rc<RefCell<App>>, time: f64) {
    {
        let mut guard = app.borrow_mut();
        let a = &mut *guard;
        let dt = a.last_paint.map_or(0.0, |last| ((time - last) / 1000.0) as f32);
        a.last_paint = Some(time);

        let host = &mut a.session.host;
        host.effects.advance(dt.min(0.1));
        host.renderer.paint(host.effects.particles());
        host.audio.keep_music_alive();
    }
    request_paint_frame(app);
}

fn setup_input_handlers(
    canvas: &HtmlCanvasElement,
    window: &Window,
    app: &Rc<RefCell<App>>,
) -> Result<(), JsValue> {
    // Taps
    {
        let app = app.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
            event.prevent_default();
            let controls = {
                let mut a = app.borrow_mut();
                a.unlock_audio();
                let screen = Vec2::new(event.offset_x() as f32, event.offset_y() as f32);
                a.session.tap_at(screen);
                a.session.pump()
            };
            apply_controls(&app, controls);
        });
        canvas.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Mute and music toggles for grown-ups
    {
        let app = app.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let mut a = app.borrow_mut();
            a.unlock_audio();
            let audio = &mut a.session.host.audio;
            match event.key().as_str() {
                "m" | "M" => {
                    let muted = !audio.is_muted();
                    audio.set_muted(muted);
                    log::info!("Muted: {muted}");
                }
                "b" | "B" => {
                    let on = !audio.music_on();
                    if let Err(e) = audio.set_music(on) {
                        log::warn!("Music toggle failed: {e}");
                    }
                }
                _ => {}
            }
        });
        window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    // Resize
    {
        let app = app.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let controls = {
                let mut guard = app.borrow_mut();
                let a = &mut *guard;
                let viewport = a
                    .session
                    .host
                    .renderer
                    .resize(a.window.device_pixel_ratio());
                a.session.host.effects.set_viewport(viewport);
                a.session.resize(viewport);
                a.session.pump()
            };
            apply_controls(&app, controls);
        });
        window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    Ok(())
}

fn setup_restart_button(document: &Document, app: &Rc<RefCell<App>>) -> Result<(), JsValue> {
    let Some(btn) = document.get_element_by_id("restart") else {
        return Ok(());
    };
    let app = app.clone();
    let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
        let controls = {
            let mut a = app.borrow_mut();
            a.session.controller.restart_session();
            a.session.pump()
        };
        apply_controls(&app, controls);
        log::info!("Session restarted");
    });
    btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// Back-forward cache: close audio when the page goes away, start a fresh
/// round when it comes back.
fn setup_lifecycle(window: &Window, app: &Rc<RefCell<App>>) -> Result<(), JsValue> {
    {
        let app = app.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let mut a = app.borrow_mut();
            a.session.host.audio.close();
            a.audio_failed = false;
        });
        window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    {
        let app = app.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
            let persisted = js_sys::Reflect::get(&event, &JsValue::from_str("persisted"))
                .map(|v| v.is_truthy())
                .unwrap_or(false);
            if !persisted {
                return;
            }
            let controls = {
                let mut a = app.borrow_mut();
                a.session.controller.reset_round();
                a.session.pump()
            };
            apply_controls(&app, controls);
            log::info!("Page restored, round reset");
        });
        window.add_event_listener_with_callback("pageshow", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}
