//! One-shot detection of the first downward scroll or swipe.

/// Listens for a single downward wheel or swipe gesture, then disarms itself.
///
/// Wheel deltas follow the page convention (positive scrolls down). A swipe
/// counts when the finger moved up since the last touch start; the recorded
/// start is cleared after every move, so a second move needs a new touch.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GestureListener {
    armed: bool,
    initial_y: Option<f32>,
}

impl GestureListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self) {
        self.armed = true;
        self.initial_y = None;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
        self.initial_y = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Returns true, and disarms, on the first downward wheel delta.
    pub fn on_wheel(&mut self, delta_y: f32) -> bool {
        if self.armed && delta_y > 0.0 {
            self.disarm();
            return true;
        }
        false
    }

    pub fn on_touch_start(&mut self, y: f32) {
        if self.armed {
            self.initial_y = Some(y);
        }
    }

    /// Returns true, and disarms, when the finger moved up since touch start.
    pub fn on_touch_move(&mut self, y: f32) -> bool {
        if !self.armed {
            return false;
        }
        match self.initial_y.take() {
            Some(initial) if initial - y > 0.0 => {
                self.disarm();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unarmed_listener_ignores_everything() {
        let mut g = GestureListener::new();
        assert!(!g.on_wheel(10.0));
        g.on_touch_start(300.0);
        assert!(!g.on_touch_move(100.0));
    }

    #[test]
    fn first_downward_wheel_triggers_once() {
        let mut g = GestureListener::new();
        g.arm();
        assert!(!g.on_wheel(-5.0));
        assert!(!g.on_wheel(0.0));
        assert!(g.on_wheel(10.0));
        assert!(!g.on_wheel(10.0));
        assert!(!g.is_armed());
    }

    #[test]
    fn upward_swipe_triggers() {
        let mut g = GestureListener::new();
        g.arm();
        g.on_touch_start(400.0);
        assert!(g.on_touch_move(350.0));
        assert!(!g.is_armed());
    }

    #[test]
    fn downward_swipe_consumes_the_touch_start() {
        let mut g = GestureListener::new();
        g.arm();
        g.on_touch_start(400.0);
        assert!(!g.on_touch_move(450.0));
        // No new touch start: the next move cannot trigger.
        assert!(!g.on_touch_move(100.0));
        g.on_touch_start(400.0);
        assert!(g.on_touch_move(399.0));
    }
}
