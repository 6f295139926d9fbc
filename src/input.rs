use std::collections::HashSet;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};

/// Pixels per wheel "line" when the platform reports line deltas.
pub const LINE_HEIGHT: f32 = 100.0;

/// High-level pointer events the choreography reacts to.
///
/// Coordinates are logical pixels. Wheel deltas follow the page convention:
/// positive means scrolling down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Moved { x: f32, y: f32 },
    Wheel { delta_y: f32 },
    TouchStart { y: f32 },
    TouchMove { y: f32 },
    TouchEnd,
}

/// Tracks mouse state across a frame and translates window events.
pub struct Input {
    mouse_buttons_down: HashSet<MouseButton>,
    mouse_position: Vec2,
    mouse_delta: Vec2,
    scroll_delta: Vec2,
    scale_factor: f32,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            mouse_buttons_down: HashSet::new(),
            mouse_position: Vec2::ZERO,
            mouse_delta: Vec2::ZERO,
            scroll_delta: Vec2::ZERO,
            scale_factor: 1.0,
        }
    }
}

impl Input {
    /// Fresh state: no buttons held, cursor at the origin, scale factor 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset per-frame state. Call after the frame has consumed input.
    pub fn begin_frame(&mut self) {
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    /// Physical-to-logical divisor for cursor and touch coordinates.
    pub fn set_scale_factor(&mut self, scale_factor: f32) {
        self.scale_factor = scale_factor.max(f32::EPSILON);
    }

    /// Process a window event, returning the pointer event it represents.
    pub fn handle_event(&mut self, event: &WindowEvent) -> Option<PointerEvent> {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                self.set_button(*button, *state == ElementState::Pressed);
                None
            }
            WindowEvent::CursorMoved { position, .. } => {
                let logical = Vec2::new(position.x as f32, position.y as f32) / self.scale_factor;
                self.move_cursor(logical);
                Some(PointerEvent::Moved {
                    x: logical.x,
                    y: logical.y,
                })
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let d = match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                    MouseScrollDelta::PixelDelta(pos) => {
                        Vec2::new(pos.x as f32, pos.y as f32) / LINE_HEIGHT
                    }
                };
                self.scroll_delta += d;
                Some(PointerEvent::Wheel {
                    delta_y: wheel_pixels(delta, self.scale_factor),
                })
            }
            WindowEvent::Touch(touch) => {
                let y = touch.location.y as f32 / self.scale_factor;
                match touch.phase {
                    TouchPhase::Started => Some(PointerEvent::TouchStart { y }),
                    TouchPhase::Moved => Some(PointerEvent::TouchMove { y }),
                    TouchPhase::Ended | TouchPhase::Cancelled => Some(PointerEvent::TouchEnd),
                }
            }
            _ => None,
        }
    }

    /// Whether `button` is currently held.
    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons_down.contains(&button)
    }

    pub(crate) fn set_button(&mut self, button: MouseButton, down: bool) {
        if down {
            self.mouse_buttons_down.insert(button);
        } else {
            self.mouse_buttons_down.remove(&button);
        }
    }

    /// Move the cursor to `position` (logical pixels), accumulating this frame's delta.
    pub(crate) fn move_cursor(&mut self, position: Vec2) {
        self.mouse_delta += position - self.mouse_position;
        self.mouse_position = position;
    }

    /// Current mouse position in logical pixels.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Mouse movement this frame.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Scroll wheel delta this frame (in "lines", winit sign convention).
    pub fn scroll_delta(&self) -> Vec2 {
        self.scroll_delta
    }
}

/// Convert a winit wheel delta to page pixels, positive = scroll down.
///
/// winit reports positive `y` when content should move down, which is the
/// opposite of the page's scroll direction.
pub fn wheel_pixels(delta: &MouseScrollDelta, scale_factor: f32) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT,
        MouseScrollDelta::PixelDelta(pos) => -(pos.y as f32) / scale_factor.max(f32::EPSILON),
    }
}
