//! Pointer-driven Y rotation of the primary and environment objects.

use crate::property::{Axis, Property, Target};
use crate::stage::Stage;
use crate::tween::Cue;

/// Below this distance from the target the smoother is considered settled.
pub const SETTLE_EPSILON: f32 = 1e-5;

/// Which sensitivity the pointer maps through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RotationGate {
    #[default]
    Coarse,
    /// Near small interactive elements, where coarse rotation would overshoot.
    Fine,
}

impl RotationGate {
    /// Gate selected by a scroll completion cue, if the cue is one.
    pub fn from_cue(cue: Cue) -> Option<Self> {
        match cue {
            Cue::RotationCoarse => Some(RotationGate::Coarse),
            Cue::RotationFine => Some(RotationGate::Fine),
            _ => None,
        }
    }
}

/// Exponentially smoothed rotation: `current` chases `target` every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollLerpState {
    pub current: f32,
    pub target: f32,
    pub smoothing: f32,
}

impl ScrollLerpState {
    /// At rest at zero. `smoothing` is clamped into `(0, 1]`.
    pub fn new(smoothing: f32) -> Self {
        Self {
            current: 0.0,
            target: 0.0,
            smoothing: smoothing.clamp(f32::EPSILON, 1.0),
        }
    }

    /// One frame of smoothing.
    pub fn tick(&mut self) -> f32 {
        self.current += (self.target - self.current) * self.smoothing;
        self.current
    }

    /// True once `current` is within a hair of `target`.
    pub fn is_settled(&self) -> bool {
        (self.target - self.current).abs() < SETTLE_EPSILON
    }
}

/// Maps pointer X onto a rotation target and applies the smoothed value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotationSmoother {
    state: ScrollLerpState,
    gate: RotationGate,
    coarse: f32,
    fine: f32,
}

impl RotationSmoother {
    /// Start in [`RotationGate::Coarse`] with `coarse` and `fine` as the two
    /// sensitivities.
    ///
    /// # Example
    /// ```
    /// use diorama::RotationSmoother;
    ///
    /// let mut smoother = RotationSmoother::new(0.1, 0.2, 0.02);
    /// smoother.on_pointer(1200.0, 1200.0);
    /// assert_eq!(smoother.state().target, 0.2);
    /// ```
    pub fn new(smoothing: f32, coarse: f32, fine: f32) -> Self {
        Self {
            state: ScrollLerpState::new(smoothing),
            gate: RotationGate::default(),
            coarse,
            fine,
        }
    }

    pub fn state(&self) -> &ScrollLerpState {
        &self.state
    }

    pub fn gate(&self) -> RotationGate {
        self.gate
    }

    /// Takes effect on the next pointer move.
    pub fn set_gate(&mut self, gate: RotationGate) {
        if self.gate != gate {
            log::debug!("Rotation gate: {:?} -> {:?}", self.gate, gate);
            self.gate = gate;
        }
    }

    /// Sensitivity selected by the current gate.
    pub fn sensitivity(&self) -> f32 {
        match self.gate {
            RotationGate::Coarse => self.coarse,
            RotationGate::Fine => self.fine,
        }
    }

    /// Pointer moved to `x` in a viewport `width` logical pixels wide.
    pub fn on_pointer(&mut self, x: f32, width: f32) {
        if width <= 0.0 {
            return;
        }
        let rotation = 2.0 * (x - width / 2.0) / width;
        self.state.target = rotation * self.sensitivity();
    }

    /// Smooth one frame and write the result to both objects.
    pub fn tick(&mut self, stage: &mut Stage) {
        let y = self.state.tick();
        stage.write(Property::rotation(Target::Primary, Axis::Y), y);
        stage.write(Property::rotation(Target::Environment, Axis::Y), y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::tests::test_stage;
    use approx::assert_abs_diff_eq;

    fn smoother() -> RotationSmoother {
        RotationSmoother::new(0.1, 0.2, 0.02)
    }

    #[test]
    fn pointer_maps_viewport_to_unit_range() {
        let mut s = smoother();
        s.on_pointer(1200.0, 1200.0);
        assert_abs_diff_eq!(s.state().target, 0.2);
        s.on_pointer(0.0, 1200.0);
        assert_abs_diff_eq!(s.state().target, -0.2);
        s.on_pointer(600.0, 1200.0);
        assert_eq!(s.state().target, 0.0);
    }

    #[test]
    fn fine_gate_shrinks_the_target() {
        let mut s = smoother();
        s.set_gate(RotationGate::Fine);
        s.on_pointer(900.0, 1200.0);
        assert_abs_diff_eq!(s.state().target, 0.01);
        assert_eq!(RotationGate::from_cue(Cue::RotationCoarse), Some(RotationGate::Coarse));
        assert_eq!(RotationGate::from_cue(Cue::HidePreloader), None);
    }

    #[test]
    fn current_converges_monotonically() {
        let mut state = ScrollLerpState::new(0.1);
        state.target = 0.7;
        let mut gap = (state.target - state.current).abs();
        while !state.is_settled() {
            state.tick();
            let next = (state.target - state.current).abs();
            assert!(next < gap);
            gap = next;
        }
        assert_abs_diff_eq!(state.current, 0.7, epsilon = SETTLE_EPSILON);
    }

    #[test]
    fn tick_rotates_both_objects() {
        let mut stage = test_stage(1200.0);
        let mut s = smoother();
        s.on_pointer(1200.0, 1200.0);
        s.tick(&mut stage);
        let primary = stage.read(Property::rotation(Target::Primary, Axis::Y));
        let environment = stage.read(Property::rotation(Target::Environment, Axis::Y));
        assert_eq!(primary, Some(s.state().current));
        assert_eq!(primary, environment);
        assert_abs_diff_eq!(s.state().current, 0.02);
    }
}
