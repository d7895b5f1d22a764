//! Warp Grid entry point
//!
//! In the browser: mounts the surface on `#canvas`, forwards pointer and
//! visibility events, and exposes the measurement API to JS. Natively: runs a
//! seeded headless session and logs what happened.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_host {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, PointerEvent};

    use warp_grid::consts::FRAME_DT;
    use warp_grid::renderer::MeshRenderState;
    use warp_grid::surface::SourceId;
    use warp_grid::viewport::{PixelRect, QueuedChannel};
    use warp_grid::{Engine, Settings};

    /// Host state shared between event handlers and the frame loop
    pub struct App {
        engine: Engine,
        render_state: Option<MeshRenderState>,
        last_time: f64,
        /// A frame callback is queued with the browser
        frame_pending: bool,
    }

    thread_local! {
        static APP: RefCell<Option<Rc<RefCell<App>>>> = const { RefCell::new(None) };
        /// Measurements arrive from JS at any time; the frame loop drains them
        static CHANNEL: RefCell<QueuedChannel> = RefCell::new(QueuedChannel::new());
        static CLICK_HANDLER: RefCell<Option<js_sys::Function>> = const { RefCell::new(None) };
        /// Clicks recorded while the app is borrowed; dispatched afterwards
        static PENDING_CLICKS: RefCell<Vec<Vec2>> = const { RefCell::new(Vec::new()) };
    }

    fn app() -> Option<Rc<RefCell<App>>> {
        APP.with(|a| a.borrow().clone())
    }

    /// Call the JS click handler for every click gathered so far
    ///
    /// Must run with no `App` borrow held: the handler may call back into
    /// `set_rect`, `start_surface` or `stop_surface`.
    fn dispatch_clicks() {
        let clicks = PENDING_CLICKS.with(|c| std::mem::take(&mut *c.borrow_mut()));
        if clicks.is_empty() {
            return;
        }
        let handler = CLICK_HANDLER.with(|h| h.borrow().clone());
        if let Some(handler) = handler {
            for p in clicks {
                if let Err(e) = handler.call2(&JsValue::NULL, &p.x.into(), &p.y.into()) {
                    log::warn!("on_grid_clicked handler threw: {:?}", e);
                }
            }
        }
    }

    pub fn push_measurement(source: &str, rect: Option<PixelRect>) {
        match SourceId::from_str(source) {
            Some(id) => CHANNEL.with(|c| c.borrow_mut().push(id, rect)),
            None => log::warn!("Unknown surface source '{}'", source),
        }
    }

    pub fn set_click_handler(handler: Option<js_sys::Function>) {
        CLICK_HANDLER.with(|h| *h.borrow_mut() = handler);
    }

    /// Apply settings JSON from the page and persist it
    pub fn apply_settings(json: &str) -> Result<(), JsValue> {
        let Some(app) = app() else {
            return Err(JsValue::from_str("surface not running"));
        };
        let mut a = app.borrow_mut();
        a.engine
            .apply_settings_json(json)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        a.engine.settings().save();
        Ok(())
    }

    pub fn start() {
        if let Some(app) = app() {
            let schedule = {
                let mut a = app.borrow_mut();
                a.engine.start();
                // Avoid a huge first dt after a long pause
                a.last_time = 0.0;
                !std::mem::replace(&mut a.frame_pending, true)
            };
            if schedule {
                request_animation_frame(app);
            }
        }
    }

    pub fn stop() {
        if let Some(app) = app() {
            let mut a = app.borrow_mut();
            a.engine.stop();
            // Draw the flat grid once so the last deformed frame doesn't linger
            let time = a.engine.state().time as f32;
            let App {
                engine,
                render_state,
                ..
            } = &mut *a;
            if let Some(rs) = render_state.as_mut() {
                render_frame(rs, engine, time);
            }
        }
    }

    fn render_frame(rs: &mut MeshRenderState, engine: &mut Engine, time: f32) {
        match rs.render(engine.mesh_mut(), time) {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => rs.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => log::error!("Out of memory!"),
            Err(e) => log::warn!("Render error: {:?}", e),
        }
    }

    fn canvas_size(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (f32, f32, u32, u32) {
        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width().max(1);
        let client_h = canvas.client_height().max(1);
        (
            client_w as f32,
            client_h as f32,
            (client_w as f64 * dpr) as u32,
            (client_h as f64 * dpr) as u32,
        )
    }

    pub async fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Logger unavailable: {}", e).into());
        }

        log::info!("Warp Grid starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no #canvas element")?
            .dyn_into()?;

        let (css_w, css_h, width, height) = canvas_size(&window, &canvas);
        canvas.set_width(width);
        canvas.set_height(height);

        let settings = Settings::load();
        let engine = Engine::for_screen(settings, css_w, css_h)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });
        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = MeshRenderState::new(surface, &adapter, width, height)
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        let app = Rc::new(RefCell::new(App {
            engine,
            render_state: Some(render_state),
            last_time: 0.0,
            frame_pending: true,
        }));
        APP.with(|a| *a.borrow_mut() = Some(app.clone()));
        app.borrow_mut().engine.set_on_grid_clicked(|p| {
            PENDING_CLICKS.with(|c| c.borrow_mut().push(p));
        });

        setup_pointer_handlers(&canvas, app.clone());
        setup_resize(&window, &canvas, app.clone());
        setup_visibility(&document);

        request_animation_frame(app);

        log::info!("Warp Grid running");
        Ok(())
    }

    fn pointer_world(app: &App, event: &PointerEvent) -> Vec2 {
        app.engine
            .viewport()
            .point_to_world(event.offset_x() as f32, event.offset_y() as f32)
    }

    fn setup_pointer_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut a = app.borrow_mut();
                let p = pointer_world(&a, &event);
                a.engine.pointer_down(p);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut a = app.borrow_mut();
                let p = pointer_world(&a, &event);
                a.engine.pointer_move(p);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                app.borrow_mut().engine.pointer_up();
                dispatch_clicks();
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                app.borrow_mut().engine.pointer_cancel();
            });
            let _ = canvas.add_event_listener_with_callback(
                "pointercancel",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }
    }

    fn setup_resize(window: &web_sys::Window, canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let Some(window) = web_sys::window() else {
                return;
            };
            let (css_w, css_h, width, height) = canvas_size(&window, &canvas);
            canvas.set_width(width);
            canvas.set_height(height);

            let mut a = app.borrow_mut();
            if let Some(rs) = a.render_state.as_mut() {
                rs.resize(width, height);
            }
            if a.engine.resize_screen(css_w, css_h) {
                log::info!("Resized to {}x{} CSS px", css_w, css_h);
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_visibility(document: &web_sys::Document) {
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                log::info!("Page hidden, stopping surface");
                stop();
            } else {
                start();
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            frame_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>, time: f64) {
        let keep_going = {
            let mut a = app.borrow_mut();
            if !a.engine.is_running() {
                a.frame_pending = false;
                false
            } else {
                let dt = if a.last_time > 0.0 {
                    ((time - a.last_time) / 1000.0) as f32
                } else {
                    FRAME_DT
                };
                a.last_time = time;

                CHANNEL.with(|c| a.engine.pump(&mut *c.borrow_mut()));
                a.engine.frame(dt);
                for event in a.engine.drain_events() {
                    log::debug!("Surface event: {:?}", event);
                }

                let time = a.engine.state().time as f32;
                let App {
                    engine,
                    render_state,
                    ..
                } = &mut *a;
                if let Some(rs) = render_state.as_mut() {
                    render_frame(rs, engine, time);
                }
                true
            }
        };

        if keep_going {
            request_animation_frame(app);
        }
    }
}

/// Report a tracked region's on-screen rect in CSS pixels
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn set_rect(source: &str, width: f32, height: f32, top: f32, left: f32, corner_radius: f32) {
    wasm_host::push_measurement(
        source,
        Some(warp_grid::viewport::PixelRect {
            width,
            height,
            top,
            left,
            corner_radius,
        }),
    );
}

/// Report that a tracked region unmounted
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn clear_rect(source: &str) {
    wasm_host::push_measurement(source, None);
}

/// Register `handler(x, y)`, called with world coordinates on each grid click
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn on_grid_clicked(handler: Option<js_sys::Function>) {
    wasm_host::set_click_handler(handler);
}

/// Replace the surface settings with `json` and store them in LocalStorage
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn apply_settings(json: &str) -> Result<(), JsValue> {
    wasm_host::apply_settings(json)
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn start_surface() {
    wasm_host::start();
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn stop_surface() {
    wasm_host::stop();
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() -> Result<(), JsValue> {
    wasm_host::run().await
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use warp_grid::demo::run_session;
    use warp_grid::{Engine, Settings};

    env_logger::init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(42);
    log::info!("Warp Grid (native) starting headless session, seed {}", seed);

    let mut engine = match Engine::for_screen(Settings::load(), 1280.0, 720.0) {
        Ok(engine) => engine,
        Err(e) => {
            log::error!("Could not build the grid: {}", e);
            std::process::exit(1);
        }
    };

    let report = run_session(&mut engine, seed, 30.0, 0.5);
    log::info!(
        "Session done: {} frames, {} actions, {} ripples, {} clicks, deepest {:.3}",
        report.frames,
        report.actions,
        report.ripples,
        report.clicks,
        report.deepest
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
