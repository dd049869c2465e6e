//! Frame-driven pet simulation: kinematics, dragging, wandering and landing.
//!
//! The simulation never touches the DOM. The host feeds it [`PetEvent`]s and calls
//! [`Simulation::tick`] once per animation frame, then draws the returned
//! [`RenderFrame`].

use std::collections::VecDeque;

use super::config::PetConfig;
use super::events::{PetEvent, RenderFrame, RenderSink, Sprite, Viewport};
use super::random::{RandomSource, XorShift};

// --- Bounds ------------------------------------------------------------------

/// Region the sprite's top-left corner is confined to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Bounds {
    /// Derive bounds from the viewport; tiny viewports collapse to a zero-width region.
    pub fn new(viewport: Viewport, config: &PetConfig) -> Self {
        let pad = config.padding;
        let left = pad;
        let top = pad;
        let right = viewport.width - config.sprite.width - pad;
        let bottom = viewport.height - config.sprite.height - pad;
        Self {
            left,
            top,
            // f64::max also swallows NaN from a bogus viewport
            right: right.max(left),
            bottom: bottom.max(top),
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.left..=self.right).contains(&x) && (self.top..=self.bottom).contains(&y)
    }

    /// Same region grown by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            left: self.left - margin,
            right: self.right + margin,
            top: self.top - margin,
            bottom: self.bottom + margin,
        }
    }

    fn clamp_x(&self, x: f64) -> f64 {
        x.clamp(self.left, self.right)
    }

    fn clamp_y(&self, y: f64) -> f64 {
        y.clamp(self.top, self.bottom)
    }
}

// --- Modes -------------------------------------------------------------------

/// One pointer sample recorded while dragging.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocitySample {
    pub dx: f64,
    pub dy: f64,
    pub at: f64,
}

/// Bookkeeping for a pet held by the pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct DragSession {
    /// Pointer position relative to the sprite origin at pick-up.
    pub offset_x: f64,
    pub offset_y: f64,
    last_x: f64,
    last_y: f64,
    history: VecDeque<VelocitySample>,
    swing_phase: f64,
}

impl DragSession {
    fn begin(pointer_x: f64, pointer_y: f64, pet_x: f64, pet_y: f64, capacity: usize) -> Self {
        Self {
            offset_x: pointer_x - pet_x,
            offset_y: pointer_y - pet_y,
            last_x: pointer_x,
            last_y: pointer_y,
            history: VecDeque::with_capacity(capacity + 1),
            swing_phase: 0.0,
        }
    }

    fn record(&mut self, x: f64, y: f64, now: f64, capacity: usize) {
        self.history.push_back(VelocitySample {
            dx: x - self.last_x,
            dy: y - self.last_y,
            at: now,
        });
        while self.history.len() > capacity {
            self.history.pop_front();
        }
        self.last_x = x;
        self.last_y = y;
    }

    /// Average of the newest `window` samples scaled by `scale`; zero with no samples.
    fn release_velocity(&self, window: usize, scale: f64) -> (f64, f64) {
        let take = window.min(self.history.len());
        if take == 0 {
            return (0.0, 0.0);
        }
        let (sx, sy) = self
            .history
            .iter()
            .skip(self.history.len() - take)
            .fold((0.0, 0.0), |(sx, sy), s| (sx + s.dx, sy + s.dy));
        (sx / take as f64 * scale, sy / take as f64 * scale)
    }

    pub fn samples(&self) -> impl Iterator<Item = &VelocitySample> {
        self.history.iter()
    }
}

/// Behavioural state of the pet. Exactly one is active at a time.
#[derive(Clone, Debug, PartialEq)]
pub enum Mode {
    Idle,
    /// Mid-hop during autonomous wandering.
    Walking,
    Dragging(DragSession),
    /// Thrown or dropped, airborne.
    Falling,
    /// Rebounding off the floor.
    Bouncing,
    /// On the floor, straightening up after a tilted landing.
    Recovering,
}

// --- State -------------------------------------------------------------------

/// Kinematic and behavioural state of the pet.
#[derive(Clone, Debug, PartialEq)]
pub struct PetState {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub rotation: f64,
    pub rotation_velocity: f64,
    pub mode: Mode,
    pub facing_right: bool,
    pub on_ground: bool,
    pub last_interaction: f64,
    pub sprite: Sprite,
}

impl PetState {
    fn resting_at(x: f64, y: f64, now: f64) -> Self {
        Self {
            x,
            y,
            vx: 0.0,
            vy: 0.0,
            rotation: 0.0,
            rotation_velocity: 0.0,
            mode: Mode::Idle,
            facing_right: false,
            on_ground: true,
            last_interaction: now,
            sprite: Sprite::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.mode, Mode::Dragging(_))
    }

    fn stop(&mut self) {
        self.vx = 0.0;
        self.vy = 0.0;
        self.rotation = 0.0;
        self.rotation_velocity = 0.0;
    }

    fn enter_idle(&mut self) {
        self.mode = Mode::Idle;
        self.sprite = Sprite::Idle;
    }
}

/// When and where the pet hops next while left alone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WalkSchedule {
    pub next_jump_at: f64,
    /// +1 walks right, -1 walks left.
    pub direction: f64,
}

// --- Simulation --------------------------------------------------------------

pub struct Simulation<R = XorShift> {
    config: PetConfig,
    bounds: Bounds,
    pet: PetState,
    walk: WalkSchedule,
    rng: R,
    repairs: u32,
}

impl<R: RandomSource> Simulation<R> {
    /// Place a new pet at a random spot on the floor of `viewport`.
    pub fn new(config: PetConfig, viewport: Viewport, mut rng: R, now: f64) -> Self {
        let bounds = Bounds::new(viewport, &config);
        let x = rng.next_f64() * (bounds.right - bounds.left - 100.0) + bounds.left + 50.0;
        let mut sim = Self {
            pet: PetState::resting_at(bounds.clamp_x(x), bounds.bottom, now),
            walk: WalkSchedule {
                next_jump_at: now,
                direction: 1.0,
            },
            config,
            bounds,
            rng,
            repairs: 0,
        };
        sim.schedule_next_jump(now);
        sim
    }

    pub fn config(&self) -> &PetConfig {
        &self.config
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn state(&self) -> &PetState {
        &self.pet
    }

    /// Direct access for hosts restoring a pose and for scripted scenarios.
    pub fn state_mut(&mut self) -> &mut PetState {
        &mut self.pet
    }

    pub fn mode(&self) -> &Mode {
        &self.pet.mode
    }

    pub fn walk_schedule(&self) -> WalkSchedule {
        self.walk
    }

    pub fn walk_schedule_mut(&mut self) -> &mut WalkSchedule {
        &mut self.walk
    }

    /// Number of times the out-of-bounds safety net had to teleport the pet.
    pub fn repairs(&self) -> u32 {
        self.repairs
    }

    pub fn frame(&self) -> RenderFrame {
        RenderFrame {
            x: self.pet.x,
            y: self.pet.y,
            rotation_degrees: self.pet.rotation,
            mirrored: self.pet.facing_right,
            sprite: self.pet.sprite,
            held: self.pet.is_dragging(),
        }
    }

    // --- Input ---------------------------------------------------------------

    /// Feed one host event. Returns `true` when the event changed the simulation.
    pub fn handle_event(&mut self, event: PetEvent, now: f64) -> bool {
        match event {
            PetEvent::PointerDown { x, y } | PetEvent::TouchStart { x, y } => {
                self.on_pointer_down(x, y, now)
            }
            PetEvent::PointerMove { x, y } | PetEvent::TouchMove { x, y } => {
                self.on_pointer_move(x, y, now)
            }
            PetEvent::PointerUp | PetEvent::TouchEnd => self.on_pointer_up(now),
            PetEvent::PointerLeave => self.on_pointer_leave(now),
            PetEvent::WindowBlur => self.on_window_blur(now),
            PetEvent::Resize(viewport) => {
                self.on_resize(viewport);
                true
            }
        }
    }

    pub fn on_pointer_down(&mut self, x: f64, y: f64, now: f64) -> bool {
        if self.pet.is_dragging() || !is_finite_point(x, y) {
            return false;
        }
        let capacity = self.config.drag.history_len;
        let session = DragSession::begin(x, y, self.pet.x, self.pet.y, capacity);
        let pet = &mut self.pet;
        pet.mode = Mode::Dragging(session);
        pet.vx = 0.0;
        pet.vy = 0.0;
        pet.rotation_velocity = 0.0;
        pet.on_ground = false;
        pet.sprite = Sprite::Dragged;
        pet.last_interaction = now;
        true
    }

    pub fn on_pointer_move(&mut self, x: f64, y: f64, now: f64) -> bool {
        if !is_finite_point(x, y) {
            return false;
        }
        let area = self.bounds.expanded(self.config.drag.overflow);
        let capacity = self.config.drag.history_len;
        let pet = &mut self.pet;
        let Mode::Dragging(session) = &mut pet.mode else {
            return false;
        };
        session.record(x, y, now, capacity);
        pet.x = area.clamp_x(x - session.offset_x);
        pet.y = area.clamp_y(y - session.offset_y);
        pet.last_interaction = now;
        true
    }

    pub fn on_pointer_up(&mut self, now: f64) -> bool {
        self.release(now)
    }

    pub fn on_pointer_leave(&mut self, now: f64) -> bool {
        self.release(now)
    }

    pub fn on_window_blur(&mut self, now: f64) -> bool {
        self.release(now)
    }

    fn release(&mut self, now: f64) -> bool {
        let session = match std::mem::replace(&mut self.pet.mode, Mode::Falling) {
            Mode::Dragging(session) => session,
            other => {
                self.pet.mode = other;
                return false;
            }
        };
        let drag = &self.config.drag;
        let max_v = self.config.physics.max_velocity;
        let (vx, vy) = session.release_velocity(drag.release_window, drag.throw_scale);
        let (vx, vy) = (vx.max(-max_v).min(max_v), vy.max(-max_v).min(max_v));

        let pet = &mut self.pet;
        pet.vx = vx;
        pet.vy = vy;
        pet.rotation_velocity = vx * drag.throw_spin;
        if vx.abs() > 1.0 {
            pet.facing_right = vx > 0.0;
        }
        pet.last_interaction = now;
        true
    }

    pub fn on_resize(&mut self, viewport: Viewport) {
        self.bounds = Bounds::new(viewport, &self.config);
        if self.teleport_if_out_of_bounds() {
            return;
        }
        let b = self.bounds;
        let pet = &mut self.pet;
        if pet.is_dragging() {
            let area = b.expanded(self.config.drag.overflow);
            pet.x = area.clamp_x(pet.x);
            pet.y = area.clamp_y(pet.y);
        } else {
            pet.x = b.clamp_x(pet.x);
            pet.y = if pet.on_ground { b.bottom } else { b.clamp_y(pet.y) };
        }
    }

    // --- Frame ---------------------------------------------------------------

    /// Advance one frame and return the resulting transform.
    pub fn tick(&mut self, now: f64) -> RenderFrame {
        self.maybe_jump(now);

        match &mut self.pet.mode {
            Mode::Dragging(session) => {
                session.swing_phase += self.config.drag.swing_step;
                self.pet.rotation = session.swing_phase.sin() * self.config.drag.swing_amplitude;
            }
            Mode::Walking | Mode::Falling | Mode::Bouncing => self.step_physics(),
            Mode::Recovering => self.step_recovery(),
            Mode::Idle => {}
        }

        self.teleport_if_out_of_bounds();
        self.frame()
    }

    /// [`tick`](Self::tick) and hand the frame to `sink`.
    pub fn advance(&mut self, now: f64, sink: &mut impl RenderSink) {
        let frame = self.tick(now);
        sink.present(&frame);
    }

    fn maybe_jump(&mut self, now: f64) {
        let pet = &self.pet;
        if pet.is_dragging() || !pet.on_ground {
            return;
        }
        let rested = now - pet.last_interaction > self.config.idle_timeout_ms;
        if rested && now > self.walk.next_jump_at {
            self.perform_jump(now);
        }
    }

    fn perform_jump(&mut self, now: f64) {
        let walk = &self.config.walk;
        let pet = &mut self.pet;
        pet.on_ground = false;
        pet.mode = Mode::Walking;
        pet.vy = -walk.jump_speed;
        pet.vx = self.walk.direction * walk.walk_speed;
        pet.facing_right = self.walk.direction > 0.0;
        self.schedule_next_jump(now);
    }

    fn schedule_next_jump(&mut self, now: f64) {
        let walk = &self.config.walk;
        let interval = self.rng.range(walk.min_jump_interval_ms, walk.max_jump_interval_ms);
        self.walk.next_jump_at = now + interval;

        let x = self.pet.x;
        if x < self.bounds.left + walk.edge_threshold {
            self.walk.direction = if self.rng.chance(walk.turn_back_chance) { 1.0 } else { -1.0 };
        } else if x > self.bounds.right - walk.edge_threshold {
            self.walk.direction = if self.rng.chance(walk.turn_back_chance) { -1.0 } else { 1.0 };
        } else if self.rng.chance(walk.flip_chance) {
            self.walk.direction = -self.walk.direction;
        }
    }

    fn step_physics(&mut self) {
        let phys = &self.config.physics;
        let pet = &mut self.pet;
        pet.vy += phys.gravity;
        pet.vx *= phys.air_resistance;
        pet.vy *= phys.air_resistance;

        pet.rotation += pet.rotation_velocity;
        pet.rotation_velocity *= phys.rotation_damping;

        pet.x += pet.vx;
        pet.y += pet.vy;

        self.resolve_collisions();
        self.check_ground_stability();
    }

    fn resolve_collisions(&mut self) {
        let phys = &self.config.physics;
        let b = self.bounds;
        let pet = &mut self.pet;

        if pet.x < b.left {
            pet.x = b.left;
            pet.vx = pet.vx.abs() * phys.wall_bounce_factor;
            pet.rotation_velocity = -pet.vy * phys.wall_spin;
            pet.facing_right = true;
        }
        if pet.x > b.right {
            pet.x = b.right;
            pet.vx = -pet.vx.abs() * phys.wall_bounce_factor;
            pet.rotation_velocity = pet.vy * phys.wall_spin;
            pet.facing_right = false;
        }
        if pet.y < b.top {
            pet.y = b.top;
            pet.vy = pet.vy.abs() * phys.wall_bounce_factor;
        }
        if pet.y > b.bottom {
            pet.y = b.bottom;
            if pet.vy.abs() > phys.min_bounce_velocity {
                pet.vy = -pet.vy.abs() * phys.ground_bounce_factor;
                pet.vx *= phys.friction;
                pet.mode = Mode::Bouncing;
                pet.rotation_velocity += pet.vx * phys.bounce_spin;
            } else {
                pet.vy = 0.0;
                pet.vx *= phys.friction * phys.landing_friction;
                self.settle();
            }
        }
    }

    fn check_ground_stability(&mut self) {
        let phys = &self.config.physics;
        let bottom = self.bounds.bottom;
        let pet = &mut self.pet;
        if pet.y >= bottom - phys.ground_tolerance
            && pet.vy.abs() < phys.min_bounce_velocity
            && pet.vx.abs() < phys.rest_speed
        {
            pet.y = bottom;
            pet.vx = 0.0;
            pet.vy = 0.0;
            self.settle();
        }
    }

    /// Grounded: straighten up gradually if badly tilted, otherwise stand at once.
    /// An already idle pet keeps its pose.
    fn settle(&mut self) {
        let settle_angle = self.config.recovery.settle_angle;
        let pet = &mut self.pet;
        pet.on_ground = true;
        if pet.rotation.abs() > settle_angle {
            pet.mode = Mode::Recovering;
        } else if pet.mode != Mode::Idle {
            pet.rotation = 0.0;
            pet.enter_idle();
        }
    }

    fn step_recovery(&mut self) {
        let rec = &self.config.recovery;
        let pet = &mut self.pet;
        pet.rotation += (0.0 - pet.rotation) * rec.decay;
        if pet.rotation.abs() < rec.snap_angle {
            pet.rotation = 0.0;
            pet.rotation_velocity = 0.0;
            pet.enter_idle();
        }
    }

    /// Last-resort repair: pull a pet that drifted far outside the bounds back in.
    fn teleport_if_out_of_bounds(&mut self) -> bool {
        let margin = self.config.teleport_margin;
        let inset = self.config.teleport_inset;
        let b = self.bounds;
        let pet = &mut self.pet;
        let mut moved = false;

        // NaN compares false against every bound
        if !pet.x.is_finite() {
            pet.x = b.left + inset;
            moved = true;
        }
        if !pet.y.is_finite() {
            pet.y = b.bottom;
            moved = true;
        }
        if pet.x < b.left - margin {
            pet.x = b.left + inset;
            moved = true;
        }
        if pet.x > b.right + margin {
            pet.x = b.right - inset;
            moved = true;
        }
        if pet.y < b.top - margin {
            pet.y = b.top + inset;
            moved = true;
        }
        if pet.y > b.bottom + margin {
            pet.y = b.bottom;
            moved = true;
        }
        if !moved {
            return false;
        }

        pet.x = b.clamp_x(pet.x);
        pet.y = b.clamp_y(pet.y);
        pet.stop();
        pet.enter_idle();
        pet.on_ground = true;
        self.repairs += 1;
        true
    }
}

fn is_finite_point(x: f64, y: f64) -> bool {
    x.is_finite() && y.is_finite()
}
