//! Easing curves, tweens, and timeline placement.
//!
//! A [`Tween`] animates one [`Property`] towards an end value. Tweens are
//! placed on a timeline by a [`Cursor`]: appended at the current end, or at
//! a named label shared by several tweens so they run in lockstep.

use std::collections::HashMap;

use crate::property::Property;

/// Default tween duration in seconds.
pub const DEFAULT_DURATION: f32 = 0.5;

/// Easing functions mapping linear progress to eased progress.
///
/// These control the acceleration curve of every tween.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    /// Constant speed throughout.
    Linear,
    /// Start slow, accelerate.
    EaseIn,
    /// Start fast, decelerate. The default for every tween.
    #[default]
    EaseOut,
    /// Start slow, speed up, then slow down.
    EaseInOut,
    /// Overshoot the end value, then settle. The parameter sets the overshoot.
    BackOut(f32),
    /// Pull back before moving towards the end value.
    BackIn(f32),
}

impl Easing {
    /// Apply the easing function to a linear progress value (0.0 to 1.0).
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::BackOut(s) => {
                let p = t - 1.0;
                p * p * ((s + 1.0) * p + s) + 1.0
            }
            Easing::BackIn(s) => t * t * ((s + 1.0) * t - s),
        }
    }
}

/// Notifications raised when a tween (or staggered group) completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cue {
    /// The preloader has faded out and can be removed.
    HidePreloader,
    /// The first reveal has fully played.
    FirstRevealSettled,
    /// The collapse in the second reveal is done: page two replaces page one.
    CollapseComplete,
    /// The second reveal has fully played.
    SecondRevealSettled,
    /// Pointer rotation should use the coarse sensitivity.
    RotationCoarse,
    /// Pointer rotation should use the fine sensitivity.
    RotationFine,
}

/// Animation of one property towards an end value.
///
/// # Example
///
/// ```ignore
/// Tween::to(Property::scale(Target::Primary, Axis::X), 0.11)
///     .duration(1.0)
///     .ease(Easing::BackOut(2.5))
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    pub property: Property,
    /// Explicit start value. When `None` the current value is captured when
    /// the tween first becomes active.
    pub from: Option<f32>,
    pub to: f32,
    /// Duration in seconds.
    pub duration: f32,
    /// Delay in seconds before the tween starts, relative to its position.
    pub delay: f32,
    pub easing: Easing,
    pub cue: Option<Cue>,
}

impl Tween {
    pub fn to(property: Property, value: f32) -> Self {
        Self {
            property,
            from: None,
            to: value,
            duration: DEFAULT_DURATION,
            delay: 0.0,
            easing: Easing::default(),
            cue: None,
        }
    }

    /// Start from an explicit value instead of the current one.
    pub fn from(mut self, value: f32) -> Self {
        self.from = Some(value);
        self
    }

    pub fn duration(mut self, seconds: f32) -> Self {
        self.duration = seconds.max(0.0);
        self
    }

    pub fn delay(mut self, seconds: f32) -> Self {
        self.delay = seconds.max(0.0);
        self
    }

    pub fn ease(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn on_complete(mut self, cue: Cue) -> Self {
        self.cue = Some(cue);
        self
    }

    /// Linear progress at `local` seconds after the tween's start.
    pub fn progress(&self, local: f32) -> f32 {
        if self.duration <= 0.0 {
            if local >= 0.0 { 1.0 } else { 0.0 }
        } else {
            (local / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Interpolated value for `start` at linear progress `t`.
    pub fn sample(&self, start: f32, t: f32) -> f32 {
        start + (self.to - start) * self.easing.apply(t)
    }
}

/// Where a tween goes on a timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position<'a> {
    /// After everything placed so far.
    End,
    /// At a named label. A label that does not exist yet is created at the current end.
    Label(&'a str),
}

/// Tracks labels and the running end of a timeline while tweens are placed.
#[derive(Clone, Debug, Default)]
pub struct Cursor {
    labels: HashMap<String, f32>,
    end: f32,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `delay + duration` seconds at `position`; returns the active start time.
    pub fn place(&mut self, position: Position<'_>, delay: f32, duration: f32) -> f32 {
        let start = self.anchor(position) + delay;
        self.reserve(start + duration);
        start
    }

    /// Resolve `position` to a time without reserving anything.
    pub fn anchor(&mut self, position: Position<'_>) -> f32 {
        match position {
            Position::End => self.end,
            Position::Label(name) => {
                let end = self.end;
                *self.labels.entry(name.to_string()).or_insert(end)
            }
        }
    }

    /// Extend the timeline so it lasts at least until `until`.
    pub fn reserve(&mut self, until: f32) {
        self.end = self.end.max(until);
    }

    /// Time of `label`, if it has been created.
    pub fn label(&self, name: &str) -> Option<f32> {
        self.labels.get(name).copied()
    }

    /// Total length of the timeline so far.
    pub fn end(&self) -> f32 {
        self.end
    }
}
