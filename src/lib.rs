//! Web Pet core crate.
//!
//! A desktop-pet widget for web pages: a small sprite that sits on the bottom of the
//! viewport, hops around when left alone and can be picked up, swung and thrown.
//! The physics and behaviour live in [`pet::Simulation`], which has no browser
//! dependencies and is driven by explicit events and ticks. The browser host in
//! [`pet`] wires it to the DOM; JavaScript calls `start_pet()` to spawn one.

use wasm_bindgen::prelude::*;

pub mod pet;

pub use pet::{PetConfig, PetEvent, RenderFrame, RenderSink, Simulation, Viewport};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}
