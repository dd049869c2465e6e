// Property tests: arbitrary interleavings of input and frames must keep the pet
// inside the viewport and keep throws within the speed limit.
#![cfg(not(target_arch = "wasm32"))]

use proptest::prelude::*;
use web_pet::pet::{Mode, PetConfig, PetEvent, Simulation, Viewport, XorShift};

#[derive(Clone, Copy, Debug)]
enum Op {
    Down(f64, f64),
    Move(f64, f64),
    Up,
    Leave,
    Blur,
    Resize(f64, f64),
    Frames(u32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        1 => (-400.0f64..2000.0, -400.0f64..1400.0).prop_map(|(x, y)| Op::Down(x, y)),
        3 => (-400.0f64..2000.0, -400.0f64..1400.0).prop_map(|(x, y)| Op::Move(x, y)),
        1 => Just(Op::Up),
        1 => Just(Op::Leave),
        1 => Just(Op::Blur),
        1 => (0.0f64..2000.0, 0.0f64..1400.0).prop_map(|(w, h)| Op::Resize(w, h)),
        2 => (1u32..240).prop_map(Op::Frames),
    ]
}

fn is_idle_to_bounce(before: &Mode, after: &Mode) -> bool {
    matches!(before, Mode::Idle) && matches!(after, Mode::Bouncing)
}

proptest! {
    /// Outside a drag the pet never leaves its bounds; a held pet may overhang by 20.
    #[test]
    fn pet_stays_within_bounds(seed in any::<u64>(), ops in prop::collection::vec(op(), 1..40)) {
        let cfg = PetConfig::default();
        let overflow = cfg.drag.overflow;
        let max_v = cfg.physics.max_velocity;
        let mut sim = Simulation::new(cfg, Viewport::new(1280.0, 720.0), XorShift::new(seed), 0.0);
        let mut now = 0.0;

        for op in ops {
            now += 1.0;
            match op {
                Op::Down(x, y) => { sim.handle_event(PetEvent::PointerDown { x, y }, now); }
                Op::Move(x, y) => { sim.handle_event(PetEvent::PointerMove { x, y }, now); }
                Op::Up | Op::Leave | Op::Blur => {
                    let event = match op {
                        Op::Up => PetEvent::PointerUp,
                        Op::Leave => PetEvent::PointerLeave,
                        _ => PetEvent::WindowBlur,
                    };
                    if sim.handle_event(event, now) {
                        let pet = sim.state();
                        prop_assert!(pet.vx.abs() <= max_v && pet.vy.abs() <= max_v,
                            "throw ({}, {}) exceeds {}", pet.vx, pet.vy, max_v);
                        prop_assert_eq!(&pet.mode, &Mode::Falling);
                    }
                }
                Op::Resize(w, h) => {
                    sim.handle_event(PetEvent::Resize(Viewport::new(w, h)), now);
                }
                Op::Frames(n) => {
                    for _ in 0..n {
                        now += 16.0;
                        let before = sim.mode().clone();
                        let frame = sim.tick(now);
                        prop_assert!(!is_idle_to_bounce(&before, sim.mode()));

                        let b = sim.bounds();
                        let area = if frame.held { b.expanded(overflow) } else { b };
                        prop_assert!(
                            area.contains(frame.x, frame.y),
                            "frame at ({}, {}) outside {:?} in {:?}",
                            frame.x,
                            frame.y,
                            area,
                            sim.mode()
                        );
                    }
                }
            }

            let b = sim.bounds();
            prop_assert!(b.left <= b.right && b.top <= b.bottom);
        }
    }

    /// A resting pet stays exactly where it is until its next scheduled hop.
    #[test]
    fn settled_pet_is_stable(seed in any::<u64>(), frames in 1usize..200) {
        let viewport = Viewport::new(1024.0, 768.0);
        let mut sim = Simulation::new(PetConfig::default(), viewport, XorShift::new(seed), 0.0);
        let before = sim.state().clone();
        let next_jump = sim.walk_schedule().next_jump_at;
        for i in 1..=frames {
            let now = i as f64 * 5.0;
            prop_assert!(now < next_jump);
            sim.tick(now);
            prop_assert_eq!(sim.state(), &before);
        }
    }
}
