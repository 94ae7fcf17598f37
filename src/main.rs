//! Game Hub arcade entry point
//!
//! On the web this mounts one game into the page's canvas and runs the frame
//! loop. Natively it plays a short attract-mode run of every game headless.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MessageEvent, MouseEvent, TouchEvent};

    use gamehub_arcade::consts::SIM_DT;
    use gamehub_arcade::platform::web::{
        self, CanvasSurface, FetchScoreSink, LocalStore, SCORE_ENDPOINT,
    };
    use gamehub_arcade::{Cabinet, GameKind, HubConfig};

    /// Mounted game plus frame-loop bookkeeping
    struct App {
        cabinet: Cabinet,
        surface: CanvasSurface,
        target_origin: String,
        last_time: f64,
        /// Pending requestAnimationFrame handle, if the loop is running
        frame_handle: Option<i32>,
    }

    impl App {
        /// Post everything the cabinet queued for the host
        fn flush_outbox(&mut self) {
            for msg in self.cabinet.drain_outbox() {
                if let Err(e) = web::post_to_parent(&msg, &self.target_origin) {
                    log::warn!("Could not post {}: {}", msg.kind(), e);
                }
            }
        }
    }

    fn canvas_size(kind: GameKind, config: &HubConfig) -> (f32, f32) {
        match kind {
            GameKind::BubbleTrouble => (config.bubble.canvas_width, config.bubble.canvas_height),
            GameKind::FlappyBird => (config.flappy.canvas_width, config.flappy.canvas_height),
            GameKind::Impossible => (config.runner.canvas_width, config.runner.canvas_height),
        }
    }

    /// `?game=` wins over the canvas `data-game` attribute
    fn selected_game(canvas: &HtmlCanvasElement) -> GameKind {
        let from_query = web_sys::window()
            .and_then(|w| w.location().search().ok())
            .and_then(|search| web_sys::UrlSearchParams::new_with_str(&search).ok())
            .and_then(|params| params.get("game"));
        let name = from_query.or_else(|| canvas.dataset().get("game"));
        match name.as_deref().and_then(GameKind::from_str) {
            Some(kind) => kind,
            None => {
                log::warn!("No game selected ({:?}), defaulting to flappy-bird", name);
                GameKind::FlappyBird
            }
        }
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Game Hub arcade starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("game")
            .ok_or("no canvas")?
            .dyn_into()?;

        let config = HubConfig::load();
        let kind = selected_game(&canvas);
        let (width, height) = canvas_size(kind, &config);
        canvas.set_width(width as u32);
        canvas.set_height(height as u32);

        let ctx: web_sys::CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into()?;

        let seed = js_sys::Date::now() as u64;
        let cabinet = Cabinet::new(
            kind,
            &config,
            seed,
            Box::new(LocalStore::new()),
            Box::new(FetchScoreSink::new(SCORE_ENDPOINT)),
        );
        let app = Rc::new(RefCell::new(App {
            cabinet,
            surface: CanvasSurface::new(ctx, width, height),
            target_origin: config.gate.target_origin.clone(),
            last_time: 0.0,
            frame_handle: None,
        }));

        log::info!("Mounted {} with seed {}", kind.as_str(), seed);

        setup_input_handlers(&canvas, app.clone());
        setup_message_listener(app.clone());
        setup_page_lifecycle(app.clone());

        ensure_running(&app);
        Ok(())
    }

    /// Start the frame loop unless it is already scheduled
    fn ensure_running(app: &Rc<RefCell<App>>) {
        if app.borrow().frame_handle.is_some() {
            return;
        }
        app.borrow_mut().last_time = 0.0;
        request_animation_frame(app.clone());
    }

    fn stop_loop(app: &Rc<RefCell<App>>) {
        let handle = app.borrow_mut().frame_handle.take();
        if let (Some(handle), Some(window)) = (handle, web_sys::window()) {
            let _ = window.cancel_animation_frame(handle);
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let handle_app = app.clone();
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            Ok(handle) => handle_app.borrow_mut().frame_handle = Some(handle),
            Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
        }
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        let keep_going = {
            let mut a = app.borrow_mut();
            a.frame_handle = None;

            let dt = if a.last_time > 0.0 {
                ((time - a.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            a.last_time = time;

            a.cabinet.update(dt);
            let App {
                cabinet, surface, ..
            } = &mut *a;
            cabinet.render(surface);
            a.flush_outbox();
            a.cabinet.wants_frames()
        };

        if keep_going {
            request_animation_frame(app);
        } else {
            log::info!("Run over, frame loop paused");
        }
    }

    /// Route a press through the cabinet and wake the loop if needed
    fn press(app: &Rc<RefCell<App>>) {
        {
            let mut a = app.borrow_mut();
            a.cabinet.press_action();
            a.flush_outbox();
        }
        ensure_running(app);
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Keyboard down
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                match event.code().as_str() {
                    "Space" | "ArrowUp" => {
                        event.prevent_default();
                        if !event.repeat() {
                            press(&app);
                        }
                    }
                    "ArrowLeft" | "KeyA" => app.borrow_mut().cabinet.set_left(true),
                    "ArrowRight" | "KeyD" => app.borrow_mut().cabinet.set_right(true),
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard up
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                match event.code().as_str() {
                    "ArrowLeft" | "KeyA" => app.borrow_mut().cabinet.set_left(false),
                    "ArrowRight" | "KeyD" => app.borrow_mut().cabinet.set_right(false),
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse click
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                press(&app);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                press(&app);
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_message_listener(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MessageEvent| {
            let Some(json) = web::message_json(&event.data()) else {
                return;
            };
            {
                let mut a = app.borrow_mut();
                a.cabinet.receive(&event.origin(), &json);
                a.flush_outbox();
            }
            ensure_running(&app);
        });
        let _ = window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Stop the loop on `pagehide`, resume it on `pageshow` (back/forward cache)
    fn setup_page_lifecycle(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                stop_loop(&app);
                log::info!("Page hidden, frame loop cancelled");
            });
            let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                log::info!("Page shown, resuming frame loop");
                ensure_running(&app);
            });
            let _ = window.add_event_listener_with_callback("pageshow", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run().await
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Game Hub arcade (native) starting...");
    log::info!("Native mode runs a headless attract loop; build for wasm32 to play");

    for kind in [
        gamehub_arcade::GameKind::BubbleTrouble,
        gamehub_arcade::GameKind::FlappyBird,
        gamehub_arcade::GameKind::Impossible,
    ] {
        attract::play(kind);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod attract {
    use gamehub_arcade::cabinet::ScoreLog;
    use gamehub_arcade::config::{GateConfig, HubConfig};
    use gamehub_arcade::consts::TICK_RATE;
    use gamehub_arcade::persistence::MemoryStore;
    use gamehub_arcade::renderer::RecordingCanvas;
    use gamehub_arcade::{Cabinet, GameKind};

    /// Two minutes of simulated play at most
    const MAX_TICKS: u64 = TICK_RATE as u64 * 120;

    /// Scripted input: which tick presses action, and which way to lean
    fn autopilot(kind: GameKind, tick: u64) -> (bool, bool, bool) {
        match kind {
            // Sweep left and right while firing steadily
            GameKind::BubbleTrouble => {
                let sweep = (tick / 90) % 2 == 0;
                (tick % 20 == 0, sweep, !sweep)
            }
            GameKind::FlappyBird => (tick % 18 == 0, false, false),
            GameKind::Impossible => (tick % 37 == 0, false, false),
        }
    }

    pub fn play(kind: GameKind) {
        let config = HubConfig {
            gate: GateConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let scores = ScoreLog::new();
        let mut cabinet = Cabinet::new(
            kind,
            &config,
            0x5eed ^ kind.backend_id() as u64,
            Box::new(MemoryStore::new()),
            Box::new(scores.clone()),
        );

        cabinet.press_action();
        while cabinet.ticks() < MAX_TICKS && !cabinet.phase().is_over() {
            let (action, left, right) = autopilot(kind, cabinet.ticks());
            if action {
                cabinet.press_action();
            }
            cabinet.set_left(left);
            cabinet.set_right(right);
            cabinet.step();
        }

        let mut canvas = RecordingCanvas::new(800.0, 600.0);
        cabinet.render(&mut canvas);

        let run = cabinet.game().run();
        log::info!(
            "{}: {:?} after {} ticks, score {}, level {}, {} draw calls",
            kind.as_str(),
            cabinet.phase(),
            cabinet.ticks(),
            run.score,
            run.level,
            canvas.commands.len()
        );
        for report in scores.reports() {
            log::info!("{} reported {:?}", kind.as_str(), report);
        }
    }
}
