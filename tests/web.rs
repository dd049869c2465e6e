// Browser tests for the DOM host. Run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn pet_element() -> Option<web_sys::Element> {
    web_sys::window()?.document()?.get_element_by_id("web-pet")
}

#[wasm_bindgen_test]
fn start_creates_sprite_and_destroy_removes_it() {
    let widget = web_pet::pet::start_pet().expect("pet starts");
    let el = pet_element().expect("sprite element is attached");
    let style = el.get_attribute("style").unwrap_or_default();
    assert!(style.contains("translate("), "initial transform missing: {}", style);
    assert_eq!(widget.mode_name(), "idle");

    widget.destroy();
    assert!(pet_element().is_none());
}

#[wasm_bindgen_test]
fn mouse_down_on_sprite_starts_drag() {
    let widget = web_pet::pet::start_pet().expect("pet starts");
    let el = pet_element().expect("sprite element is attached");
    let evt = web_sys::MouseEvent::new("mousedown").expect("event");
    el.dispatch_event(&evt).expect("dispatch");
    assert_eq!(widget.mode_name(), "dragging");

    let doc = web_sys::window().unwrap().document().unwrap();
    let up = web_sys::MouseEvent::new("mouseup").expect("event");
    doc.dispatch_event(&up).expect("dispatch");
    assert_eq!(widget.mode_name(), "falling");
    widget.destroy();
}
