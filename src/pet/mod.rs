//! Desktop-pet widget: a sprite that lives on top of the page, can be picked up and
//! thrown, bounces off the viewport edges and hops around when left alone.
//!
//! [`sim`] holds the browser-independent simulation. This module is the host: it
//! creates the sprite element, turns DOM events into [`PetEvent`]s, drives the
//! `requestAnimationFrame` loop and writes each [`RenderFrame`] back as a CSS
//! transform.
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Event, EventTarget, HtmlElement, HtmlImageElement, MouseEvent, TouchEvent, Window,
    window,
};

pub mod config;
pub mod events;
pub mod random;
pub mod sim;

pub use config::{DragConfig, PetConfig, PhysicsConfig, RecoveryConfig, SpriteConfig, WalkConfig};
pub use events::{PetEvent, RenderFrame, RenderSink, Sprite, Viewport};
pub use random::{RandomSource, Sequence, XorShift};
pub use sim::{Bounds, DragSession, Mode, PetState, Simulation, VelocitySample, WalkSchedule};

const ELEMENT_ID: &str = "web-pet";

// --- Rendering ---------------------------------------------------------------

/// Render sink writing frames to the sprite element.
struct DomView {
    element: HtmlElement,
    image: HtmlImageElement,
    idle_src: String,
    dragged_src: String,
    shown: Option<Sprite>,
    held: Option<bool>,
}

impl RenderSink for DomView {
    fn present(&mut self, frame: &RenderFrame) {
        let style = self.element.style();
        style.set_property("transform", &frame.css_transform()).ok();
        if self.held != Some(frame.held) {
            style
                .set_property("transform-origin", frame.css_transform_origin())
                .ok();
            style.set_property("cursor", frame.css_cursor()).ok();
            self.held = Some(frame.held);
        }
        // Only touch src on change; re-assigning restarts image decoding in some browsers.
        if self.shown != Some(frame.sprite) {
            let src = match frame.sprite {
                Sprite::Idle => &self.idle_src,
                Sprite::Dragged => &self.dragged_src,
            };
            self.image.set_src(src);
            self.shown = Some(frame.sprite);
        }
    }
}

fn create_view(doc: &Document, sprite: &SpriteConfig) -> Result<DomView, JsValue> {
    let element: HtmlElement = doc.create_element("div")?.dyn_into()?;
    element.set_id(ELEMENT_ID);
    element.set_class_name("web-pet");
    element.set_attribute(
        "style",
        &format!(
            "position:fixed; left:0; top:0; width:{}px; height:{}px; cursor:grab; z-index:9999; \
             user-select:none; -webkit-user-select:none; touch-action:none; \
             transform-origin:center bottom; will-change:transform;",
            sprite.width, sprite.height
        ),
    )?;

    let image: HtmlImageElement = doc.create_element("img")?.dyn_into()?;
    image.set_src(&sprite.idle_image);
    image.set_alt("pet");
    image.set_draggable(false);
    image.set_attribute(
        "style",
        "width:100%; height:100%; object-fit:contain; pointer-events:none;",
    )?;
    element.append_child(&image)?;

    let body = doc.body().ok_or_else(|| JsValue::from_str("no body"))?;
    body.append_child(&element)?;

    Ok(DomView {
        element,
        image,
        idle_src: sprite.idle_image.clone(),
        dragged_src: sprite.dragged_image.clone(),
        shown: Some(Sprite::Idle),
        held: Some(false),
    })
}

// --- Shared host state -------------------------------------------------------

struct PetHost {
    sim: RefCell<Simulation>,
    view: RefCell<DomView>,
    animation_id: Cell<Option<i32>>,
    running: Cell<bool>,
    reported_repairs: Cell<u32>,
}

impl PetHost {
    fn dispatch(&self, event: PetEvent) -> bool {
        let handled = self.sim.borrow_mut().handle_event(event, now_ms());
        if let PetEvent::Resize(viewport) = event {
            web_sys::console::log_1(
                &format!("[pet] viewport {}x{}", viewport.width, viewport.height).into(),
            );
            self.report_repairs();
        }
        handled
    }

    fn frame(&self, ts: f64) {
        let mut sim = self.sim.borrow_mut();
        sim.advance(ts, &mut *self.view.borrow_mut());
        drop(sim);
        self.report_repairs();
    }

    fn report_repairs(&self) {
        let repairs = self.sim.borrow().repairs();
        if repairs != self.reported_repairs.get() {
            let pet = self.sim.borrow().state().clone();
            web_sys::console::warn_1(
                &format!(
                    "[pet] out of bounds, teleported to ({:.0}, {:.0}) [{} repairs]",
                    pet.x, pet.y, repairs
                )
                .into(),
            );
            self.reported_repairs.set(repairs);
        }
    }
}

// --- Listeners ---------------------------------------------------------------

#[derive(Clone, Copy)]
enum Prevent {
    Always,
    WhenHandled,
    Never,
}

struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

fn listen(
    target: &EventTarget,
    kind: &'static str,
    prevent: Prevent,
    host: &Rc<PetHost>,
    translate: fn(&Event) -> Option<PetEvent>,
) -> Result<Listener, JsValue> {
    let host = Rc::clone(host);
    let callback = Closure::wrap(Box::new(move |evt: Event| {
        let Some(pet_event) = translate(&evt) else {
            return;
        };
        if matches!(prevent, Prevent::Always) {
            evt.prevent_default();
        }
        let handled = host.dispatch(pet_event);
        if handled && matches!(prevent, Prevent::WhenHandled) && evt.cancelable() {
            evt.prevent_default();
        }
    }) as Box<dyn FnMut(_)>);
    target.add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())?;
    Ok(Listener {
        target: target.clone(),
        kind,
        callback,
    })
}

fn mouse_point(evt: &Event) -> Option<(f64, f64)> {
    let m = evt.dyn_ref::<MouseEvent>()?;
    Some((m.client_x() as f64, m.client_y() as f64))
}

fn touch_point(evt: &Event) -> Option<(f64, f64)> {
    let t = evt.dyn_ref::<TouchEvent>()?.touches().get(0)?;
    Some((t.client_x() as f64, t.client_y() as f64))
}

fn on_mouse_down(evt: &Event) -> Option<PetEvent> {
    mouse_point(evt).map(|(x, y)| PetEvent::PointerDown { x, y })
}

fn on_mouse_move(evt: &Event) -> Option<PetEvent> {
    mouse_point(evt).map(|(x, y)| PetEvent::PointerMove { x, y })
}

fn on_touch_start(evt: &Event) -> Option<PetEvent> {
    touch_point(evt).map(|(x, y)| PetEvent::TouchStart { x, y })
}

fn on_touch_move(evt: &Event) -> Option<PetEvent> {
    touch_point(evt).map(|(x, y)| PetEvent::TouchMove { x, y })
}

fn on_resize(_evt: &Event) -> Option<PetEvent> {
    window().and_then(|w| viewport(&w)).map(PetEvent::Resize)
}

fn viewport(win: &Window) -> Option<Viewport> {
    let width = win.inner_width().ok()?.as_f64()?;
    let height = win.inner_height().ok()?.as_f64()?;
    Some(Viewport::new(width, height))
}

fn now_ms() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

// --- Frame loop --------------------------------------------------------------

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn request_frame(win: &Window, f: &FrameCallback) -> Option<i32> {
    let cb = f.borrow();
    let closure = cb.as_ref()?;
    win.request_animation_frame(closure.as_ref().unchecked_ref()).ok()
}

fn start_loop(host: &Rc<PetHost>) -> FrameCallback {
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    let loop_host = Rc::clone(host);
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
        if !loop_host.running.get() {
            return;
        }
        loop_host.frame(ts);
        if let Some(w) = window() {
            loop_host.animation_id.set(request_frame(&w, &f));
        }
    }) as Box<dyn FnMut(f64)>));
    if let Some(w) = window() {
        host.animation_id.set(request_frame(&w, &g));
    }
    g
}

// --- Public handle -----------------------------------------------------------

/// Handle to a running pet. Call `destroy()` (or drop it) to remove the pet.
#[wasm_bindgen]
pub struct PetWidget {
    host: Rc<PetHost>,
    listeners: Vec<Listener>,
    frame: FrameCallback,
}

#[wasm_bindgen]
impl PetWidget {
    /// Stop the frame loop, detach all listeners and remove the sprite element.
    pub fn destroy(self) {
        // teardown runs in Drop
        drop(self);
    }

    /// Current simulation mode, for debugging from the console.
    #[wasm_bindgen(js_name = modeName)]
    pub fn mode_name(&self) -> String {
        let name = match self.host.sim.borrow().mode() {
            Mode::Idle => "idle",
            Mode::Walking => "walking",
            Mode::Dragging(_) => "dragging",
            Mode::Falling => "falling",
            Mode::Bouncing => "bouncing",
            Mode::Recovering => "recovering",
        };
        name.to_string()
    }
}

impl PetWidget {
    fn teardown(&mut self) {
        if !self.host.running.replace(false) {
            return;
        }
        if let (Some(w), Some(id)) = (window(), self.host.animation_id.take()) {
            w.cancel_animation_frame(id).ok();
        }
        // Dropping the closure breaks the loop's self-reference.
        self.frame.borrow_mut().take();
        for l in self.listeners.drain(..) {
            l.target
                .remove_event_listener_with_callback(l.kind, l.callback.as_ref().unchecked_ref())
                .ok();
        }
        self.host.view.borrow().element.remove();
        web_sys::console::log_1(&"[pet] destroyed".into());
    }
}

impl Drop for PetWidget {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Spawn the pet with default tuning.
#[wasm_bindgen]
pub fn start_pet() -> Result<PetWidget, JsValue> {
    spawn(PetConfig::default())
}

/// Spawn the pet with a JSON override of [`PetConfig`]; unknown or missing fields
/// fall back to the defaults.
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn start_pet_with_config(json: &str) -> Result<PetWidget, JsValue> {
    let config = PetConfig::from_json(json).map_err(|e| {
        web_sys::console::warn_1(&format!("[pet] bad config: {}", e).into());
        JsValue::from_str(&e.to_string())
    })?;
    spawn(config)
}

fn spawn(config: PetConfig) -> Result<PetWidget, JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let vp = viewport(&win).ok_or_else(|| JsValue::from_str("no viewport size"))?;

    let view = create_view(&doc, &config.sprite)?;
    let now = now_ms();
    let sim = Simulation::new(config, vp, XorShift::seeded(now), now);
    view_first_frame(&sim, &view);

    let host = Rc::new(PetHost {
        sim: RefCell::new(sim),
        view: RefCell::new(view),
        animation_id: Cell::new(None),
        running: Cell::new(true),
        reported_repairs: Cell::new(0),
    });

    let element: EventTarget = host.view.borrow().element.clone().into();
    let document: EventTarget = doc.into();
    let win_target: EventTarget = win.into();

    let listeners = vec![
        listen(&element, "mousedown", Prevent::Always, &host, on_mouse_down)?,
        listen(&document, "mousemove", Prevent::Never, &host, on_mouse_move)?,
        listen(&document, "mouseup", Prevent::Never, &host, |_| Some(PetEvent::PointerUp))?,
        listen(&element, "touchstart", Prevent::Always, &host, on_touch_start)?,
        listen(&document, "touchmove", Prevent::WhenHandled, &host, on_touch_move)?,
        listen(&document, "touchend", Prevent::Never, &host, |_| Some(PetEvent::TouchEnd))?,
        listen(&document, "mouseleave", Prevent::Never, &host, |_| {
            Some(PetEvent::PointerLeave)
        })?,
        listen(&win_target, "blur", Prevent::Never, &host, |_| Some(PetEvent::WindowBlur))?,
        listen(&win_target, "resize", Prevent::Never, &host, on_resize)?,
    ];

    let frame = start_loop(&host);
    {
        let sim = host.sim.borrow();
        let b = sim.bounds();
        web_sys::console::log_1(
            &format!(
                "[pet] started at x={:.0} (bounds {:.0}..{:.0} x {:.0}..{:.0})",
                sim.state().x,
                b.left,
                b.right,
                b.top,
                b.bottom
            )
            .into(),
        );
    }

    Ok(PetWidget {
        host,
        listeners,
        frame,
    })
}

/// Put the sprite in place before the first animation frame fires.
fn view_first_frame(sim: &Simulation, view: &DomView) {
    let frame = sim.frame();
    view.element
        .style()
        .set_property("transform", &frame.css_transform())
        .ok();
}
