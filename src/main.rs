//! Fish Frenzy entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
mod audio;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, TouchEvent};

    use crate::audio::{AudioManager, SoundEffect};
    use fish_frenzy::assets::{self, AssetError, ModelLibrary};
    use fish_frenzy::camera::FollowCamera;
    use fish_frenzy::consts::*;
    use fish_frenzy::input::InputState;
    use fish_frenzy::renderer::{MeshRenderer, shapes};
    use fish_frenzy::scene::{self, MarineSnow, MeshId, Reef};
    use fish_frenzy::sim::{GameEvent, GamePhase, GameState, ModelKey, tick};
    use fish_frenzy::{HighScores, QualityPreset, Settings, Tuning};

    /// Game instance holding all state
    struct Game {
        state: GameState,
        settings: Settings,
        high_scores: HighScores,
        input: InputState,
        camera: FollowCamera,
        reef: Reef,
        snow: MarineSnow,
        models: ModelLibrary,
        renderer: Option<MeshRenderer>,
        audio: AudioManager,
        accumulator: f32,
        last_time: f64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
        /// Rank achieved by the last finished round, if any
        last_rank: Option<usize>,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            let mut settings = Settings::load();
            if let Some(quality) = quality_from_url() {
                log::info!("Quality override from URL: {}", quality.as_str());
                settings.quality = quality;
            }
            let mut state = GameState::with_tuning(seed, Tuning::load());
            state.burst_particle_cap = settings.burst_particle_cap();

            let mut audio = AudioManager::new();
            audio.set_volume(settings.effective_sfx_volume());

            Self {
                reef: Reef::generate(settings.quality.coral_count(), seed),
                snow: MarineSnow::generate(scene::SNOW_COUNT, seed ^ 0x5eed),
                state,
                settings,
                high_scores: HighScores::load(),
                input: InputState::default(),
                camera: FollowCamera::default(),
                models: ModelLibrary::new(),
                renderer: None,
                audio,
                accumulator: 0.0,
                last_time: 0.0,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
                last_rank: None,
            }
        }

        /// Run simulation frames. Returns models that need fetching.
        fn update(&mut self, dt: f32, time: f64) -> Vec<ModelKey> {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= FRAME_DT && substeps < MAX_SUBSTEPS {
                let input = self.input.tick_input();
                tick(&mut self.state, &input);
                let player = &self.state.player;
                self.camera.update(player.pos, player.forward(), player.size);
                self.snow.step();
                self.accumulator -= FRAME_DT;
                substeps += 1;
            }

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }

            self.handle_events()
        }

        /// Sounds and scores for this frame's events; returns new fetches
        fn handle_events(&mut self) -> Vec<ModelKey> {
            let events = self.state.drain_events();
            for event in &events {
                if let Some(effect) = SoundEffect::for_event(event) {
                    self.audio.play(effect);
                }
                match event {
                    GameEvent::Eaten { .. } => self.record_score(),
                    GameEvent::SpawnAbandoned(key) => {
                        log::debug!("Spawn abandoned for {}", key.path());
                    }
                    _ => {}
                }
            }
            self.models.service(&mut self.state, &events)
        }

        fn record_score(&mut self) {
            let player = &self.state.player;
            self.last_rank =
                self.high_scores
                    .add_score(player.score, player.size, js_sys::Date::now());
            if let Some(rank) = self.last_rank {
                log::info!("High score #{}: {}", rank, player.score);
                self.high_scores.save();
                if rank == 1 {
                    self.audio.play(SoundEffect::HighScore);
                }
            }
        }

        fn on_model_loaded(&mut self, key: ModelKey, source: &str) {
            if let Err(e) = self.models.on_loaded(key, source) {
                log::warn!("{e}");
            } else if let (Some(renderer), Some(mesh)) =
                (self.renderer.as_mut(), self.models.mesh(key))
            {
                renderer.upload_mesh(MeshId::Model(key), &shapes::from_obj(mesh));
            }
            self.state.sync_models(&self.models);
        }

        fn on_model_failed(&mut self, key: ModelKey, error: &AssetError) {
            self.models.on_failed(key, error);
            self.state.sync_models(&self.models);
        }

        /// Render the current frame
        fn render(&mut self) {
            let player = &self.state.player;
            let pose = self
                .camera
                .pose(player.pos, player.forward(), player.size);
            let frame =
                scene::build_frame(&self.state, pose, &self.settings, &self.reef, &self.snow);

            if let Some(ref mut renderer) = self.renderer {
                match renderer.render(&frame) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        renderer.resize(renderer.size.0, renderer.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let set_text = |selector: &str, text: &str| {
                if let Some(el) = document.query_selector(selector).ok().flatten() {
                    el.set_text_content(Some(text));
                }
            };
            let set_visible = |id: &str, visible: bool| {
                if let Some(el) = document.get_element_by_id(id) {
                    let _ = el.class_list().toggle_with_force("hidden", !visible);
                }
            };

            let player = &self.state.player;
            set_text("#hud-score .hud-value", &player.score.to_string());
            set_text("#hud-size .hud-value", &format!("{:.1}", player.size));
            set_text("#hud-fps .hud-value", &self.fps.to_string());
            set_visible("hud-fps", self.settings.show_fps);

            let running = self.state.phase == GamePhase::Running;
            set_visible("hud", running);
            set_visible("start-screen", self.state.phase == GamePhase::NotStarted);
            set_visible("loading", running && self.models.pending() > 0);

            let ended = self.state.phase == GamePhase::Ended;
            set_visible("game-over", ended);
            if ended {
                set_text("#final-score", &player.score.to_string());
                set_text("#final-size", &format!("{:.1}", player.size));
                let best = self.high_scores.top_score().unwrap_or(0);
                set_text("#high-score", &best.to_string());
                set_visible("new-high-score", self.last_rank == Some(1));
            }
        }

        fn start(&mut self) {
            self.audio.resume();
            self.input.clear();
            self.camera = FollowCamera::default();
            self.last_rank = None;
            self.state.start();
        }

        /// New seed, then straight into a new round
        fn restart(&mut self, seed: u64) {
            self.state.reset(seed);
            self.accumulator = 0.0;
            self.start();
        }
    }

    /// `?quality=low|medium|high`
    fn quality_from_url() -> Option<QualityPreset> {
        let search = web_sys::window()?.location().search().ok()?;
        search
            .trim_start_matches('?')
            .split('&')
            .find_map(|pair| pair.strip_prefix("quality="))
            .and_then(QualityPreset::from_str)
    }

    fn spawn_fetch(game: Rc<RefCell<Game>>, key: ModelKey) {
        wasm_bindgen_futures::spawn_local(async move {
            let result = assets::fetch_text(key.path()).await;
            let mut g = game.borrow_mut();
            match result {
                Ok(source) => g.on_model_loaded(key, &source),
                Err(e) => g.on_model_failed(key, &e),
            }
        });
    }

    /// Match the canvas backing store to its CSS size
    fn fit_canvas(canvas: &HtmlCanvasElement) -> (u32, u32) {
        let dpr = web_sys::window()
            .map(|w| w.device_pixel_ratio())
            .unwrap_or(1.0);
        let width = ((canvas.client_width() as f64 * dpr) as u32).max(1);
        let height = ((canvas.client_height() as f64 * dpr) as u32).max(1);
        canvas.set_width(width);
        canvas.set_height(height);
        (width, height)
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Fish Frenzy starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let (width, height) = fit_canvas(&canvas);

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));
        log::info!("Game initialized with seed: {}", seed);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        match MeshRenderer::new(surface, &adapter, width, height).await {
            Ok(renderer) => game.borrow_mut().renderer = Some(renderer),
            Err(e) => log::error!("Renderer unavailable: {e}"),
        }

        setup_keyboard(game.clone());
        setup_joystick(game.clone());
        setup_buttons(game.clone());
        setup_focus_handling(game.clone());
        setup_resize(&canvas, game.clone());

        request_animation_frame(game);

        log::info!("Fish Frenzy running!");
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        for (event_name, pressed) in [("keydown", true), ("keyup", false)] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                let bound = g.input.keys.apply_key(&event.key(), pressed);
                // Keep arrows from scrolling the page mid-round
                if bound && g.state.phase == GamePhase::Running {
                    event.prevent_default();
                }
            });
            let _ = window
                .add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_joystick(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Some(base) = document.get_element_by_id("joystick") else {
            return;
        };
        let knob = document.get_element_by_id("joystick-knob");

        let on_move = {
            let game = game.clone();
            let base = base.clone();
            let knob = knob.clone();
            Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let Some(touch) = event.target_touches().get(0) else {
                    return;
                };
                let rect = base.get_bounding_client_rect();
                let cx = rect.left() + rect.width() / 2.0;
                let cy = rect.top() + rect.height() / 2.0;
                let dx = (touch.client_x() as f64 - cx) as f32;
                let dy = (touch.client_y() as f64 - cy) as f32;

                let mut g = game.borrow_mut();
                g.input.joystick.update(dx, dy);
                if let Some(knob) = &knob {
                    let k = g.input.joystick.knob;
                    let _ = knob.set_attribute(
                        "style",
                        &format!("transform: translate({}px, {}px)", k.x, k.y),
                    );
                }
            })
        };
        for name in ["touchstart", "touchmove"] {
            let _ = base.add_event_listener_with_callback(name, on_move.as_ref().unchecked_ref());
        }
        on_move.forget();

        let on_end = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
            game.borrow_mut().input.joystick.release();
            if let Some(knob) = &knob {
                let _ = knob.set_attribute("style", "transform: translate(0px, 0px)");
            }
        });
        for name in ["touchend", "touchcancel"] {
            let _ = base.add_event_listener_with_callback(name, on_end.as_ref().unchecked_ref());
        }
        on_end.forget();
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(btn) = document.get_element_by_id("start-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                if g.state.phase == GamePhase::NotStarted {
                    g.start();
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let seed = js_sys::Date::now() as u64;
                game.borrow_mut().restart(seed);
                log::info!("Game restarted with seed: {}", seed);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("fullscreen-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                    return;
                };
                if document.fullscreen_element().is_some() {
                    document.exit_fullscreen();
                } else if let Some(container) = document.get_element_by_id("game-container") {
                    if let Err(e) = container.request_fullscreen() {
                        log::warn!("Fullscreen refused: {:?}", e);
                    }
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_focus_handling(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Keys released while unfocused never deliver keyup
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                g.input.clear();
                if g.settings.mute_on_blur {
                    g.audio.set_muted(true);
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().audio.set_muted(false);
            });
            let _ =
                window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(document) = window.document() {
            let doc = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if doc.visibility_state() == web_sys::VisibilityState::Hidden {
                    game.borrow_mut().input.clear();
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }
    }

    fn setup_resize(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let (width, height) = fit_canvas(&canvas);
            if let Some(renderer) = game.borrow_mut().renderer.as_mut() {
                renderer.resize(width, height);
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let fetches = {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                FRAME_DT
            };
            g.last_time = time;

            let fetches = g.update(dt, time);
            g.render();
            g.update_hud();
            fetches
        };

        for key in fetches {
            spawn_fetch(game.clone(), key);
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

/// Seconds of scripted play in the native smoke run
#[cfg(not(target_arch = "wasm32"))]
const HEADLESS_SECONDS: u64 = 120;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use fish_frenzy::consts::FRAMES_PER_SECOND;
    use fish_frenzy::sim::{GameEvent, GamePhase, GameState, LoadStatus, ModelKey, TickInput, tick};
    use fish_frenzy::{HighScores, Tuning};

    env_logger::init();
    log::info!("Fish Frenzy (native) starting...");
    log::info!("Native mode runs a headless session - use `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(12345);

    let mut state = GameState::with_tuning(seed, Tuning::load());
    state.start();

    let ready = |_: ModelKey| LoadStatus::Ready;
    let (mut meals, mut close_calls, mut bumps) = (0u32, 0u32, 0u32);
    let total_frames = HEADLESS_SECONDS * FRAMES_PER_SECOND as u64;

    for frame in 0..total_frames {
        state.sync_models(&ready);

        // Sweep in slow arcs, sprinting every other second
        let second = frame / FRAMES_PER_SECOND as u64;
        let input = TickInput {
            turn_left: second % 6 < 2,
            pitch_up: second % 10 == 3,
            pitch_down: second % 10 == 7,
            sprint: second % 2 == 0,
            ..Default::default()
        };
        tick(&mut state, &input);

        for event in state.drain_events() {
            match event {
                GameEvent::Ate { close_call, .. } => {
                    meals += 1;
                    if close_call {
                        close_calls += 1;
                    }
                }
                GameEvent::Bumped => bumps += 1,
                _ => {}
            }
        }

        if state.phase == GamePhase::Ended {
            break;
        }
    }

    let mut scores = HighScores::new();
    let rank = scores.add_score(state.player.score, state.player.size, 0.0);

    println!(
        "seed {}: {:?} after {} frames, score {}, size {:.2}, {} meals ({} close calls), {} bumps, {} fish",
        seed,
        state.phase,
        state.frame,
        state.player.score,
        state.player.size,
        meals,
        close_calls,
        bumps,
        state.entities.len()
    );
    if let Some(rank) = rank {
        log::info!("Would rank #{} on a fresh leaderboard", rank);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
