//! Messages exchanged between the simulation and its host.

/// Input delivered by the host, in client-space CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PetEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    /// Pointer left the document.
    PointerLeave,
    TouchStart { x: f64, y: f64 },
    TouchMove { x: f64, y: f64 },
    TouchEnd,
    WindowBlur,
    Resize(Viewport),
}

/// Visible client area of the page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// The two sprite images the pet switches between.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sprite {
    Idle,
    Dragged,
}

/// Transform produced once per frame for the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderFrame {
    pub x: f64,
    pub y: f64,
    pub rotation_degrees: f64,
    /// Flip horizontally; the artwork faces left.
    pub mirrored: bool,
    pub sprite: Sprite,
    /// The pet is held by the pointer (pivot at the head instead of the feet).
    pub held: bool,
}

impl RenderFrame {
    /// CSS `transform` value for this frame.
    pub fn css_transform(&self) -> String {
        let scale_x = if self.mirrored { -1 } else { 1 };
        format!(
            "translate({}px, {}px) rotate({}deg) scaleX({})",
            self.x, self.y, self.rotation_degrees, scale_x
        )
    }

    pub fn css_transform_origin(&self) -> &'static str {
        if self.held { "center top" } else { "center bottom" }
    }

    pub fn css_cursor(&self) -> &'static str {
        if self.held { "grabbing" } else { "grab" }
    }
}

/// Consumer of render frames; the browser host writes them to the DOM.
pub trait RenderSink {
    fn present(&mut self, frame: &RenderFrame);
}

impl<F: FnMut(&RenderFrame)> RenderSink for F {
    fn present(&mut self, frame: &RenderFrame) {
        self(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_transform_formats_mirroring() {
        let frame = RenderFrame {
            x: 12.5,
            y: 40.0,
            rotation_degrees: -3.0,
            mirrored: true,
            sprite: Sprite::Idle,
            held: false,
        };
        assert_eq!(frame.css_transform(), "translate(12.5px, 40px) rotate(-3deg) scaleX(-1)");
        assert_eq!(frame.css_transform_origin(), "center bottom");
        assert_eq!(frame.css_cursor(), "grab");
    }

    #[test]
    fn held_frames_pivot_at_the_head() {
        let frame = RenderFrame {
            x: 0.0,
            y: 0.0,
            rotation_degrees: 0.0,
            mirrored: false,
            sprite: Sprite::Dragged,
            held: true,
        };
        assert!(frame.css_transform().ends_with("scaleX(1)"));
        assert_eq!(frame.css_transform_origin(), "center top");
        assert_eq!(frame.css_cursor(), "grabbing");
    }
}
