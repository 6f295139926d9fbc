//! Scroll-scrubbed timelines.
//!
//! A [`TimelineSpec`] describes tracks declaratively: end values may depend on
//! the viewport width, and start values are left open. Binding compiles it
//! into a [`ScrollTimeline`] with every value fixed. After that, the value
//! of each track is a pure function of the timeline's playhead, so scrolling
//! back and forth can never drift.
//!
//! The playhead trails the trigger progress with a lag (the scrub), easing
//! towards it every frame and snapping once it is close enough.

use crate::property::Property;
use crate::scroll::Trigger;
use crate::tween::{Cue, Cursor, DEFAULT_DURATION, Easing, Position};

/// Scrub lag of section timelines, in seconds.
pub const SECTION_SCRUB: f32 = 0.6;
/// Scrub lag of the pinned progress bars, in seconds.
pub const PROGRESS_SCRUB: f32 = 0.4;
/// Playhead distance below which it snaps onto the target.
pub const SNAP_EPSILON: f32 = 1e-4;
/// Fraction of the remaining lag closed per second is `1 - e^(-SCRUB_RATE / lag)`.
const SCRUB_RATE: f32 = 4.0;

/// End value of a track, resolved when the timeline is bound.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TargetValue {
    Fixed(f32),
    /// A multiple of the viewport width in logical pixels.
    ViewportWidth(f32),
}

impl TargetValue {
    pub fn resolve(self, viewport_width: f32) -> f32 {
        match self {
            TargetValue::Fixed(v) => v,
            TargetValue::ViewportWidth(factor) => viewport_width * factor,
        }
    }
}

/// One declarative track.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackSpec {
    pub property: Property,
    pub to: TargetValue,
    /// Explicit start value; otherwise chained from earlier timelines or the stage.
    pub from: Option<f32>,
    pub position: Position<'static>,
    pub duration: f32,
    pub easing: Easing,
    pub cue: Option<Cue>,
}

impl TrackSpec {
    pub fn to(property: Property, to: TargetValue) -> Self {
        Self {
            property,
            to,
            from: None,
            position: Position::End,
            duration: DEFAULT_DURATION,
            easing: Easing::default(),
            cue: None,
        }
    }

    pub fn fixed(property: Property, to: f32) -> Self {
        Self::to(property, TargetValue::Fixed(to))
    }

    pub fn from(mut self, value: f32) -> Self {
        self.from = Some(value);
        self
    }

    pub fn at(mut self, label: &'static str) -> Self {
        self.position = Position::Label(label);
        self
    }

    pub fn duration(mut self, seconds: f32) -> Self {
        self.duration = seconds.max(0.0);
        self
    }

    pub fn on_complete(mut self, cue: Cue) -> Self {
        self.cue = Some(cue);
        self
    }
}

/// A timeline bound to one trigger.
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineSpec {
    pub name: String,
    pub trigger: Trigger,
    pub scrub: f32,
    pub tracks: Vec<TrackSpec>,
}

impl TimelineSpec {
    pub fn new(name: impl Into<String>, trigger: Trigger, scrub: f32) -> Self {
        Self {
            name: name.into(),
            trigger,
            scrub,
            tracks: Vec::new(),
        }
    }

    pub fn track(mut self, track: TrackSpec) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn tracks(mut self, tracks: impl IntoIterator<Item = TrackSpec>) -> Self {
        self.tracks.extend(tracks);
        self
    }
}

/// A compiled track with fixed endpoints and timing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Track {
    pub property: Property,
    pub from: f32,
    pub to: f32,
    pub start: f32,
    pub duration: f32,
    pub easing: Easing,
    pub cue: Option<Cue>,
}

impl Track {
    /// Value at timeline time `time`.
    pub fn value_at(&self, time: f32) -> f32 {
        let t = if self.duration <= 0.0 {
            if time >= self.start { 1.0 } else { 0.0 }
        } else {
            ((time - self.start) / self.duration).clamp(0.0, 1.0)
        };
        self.from + (self.to - self.from) * self.easing.apply(t)
    }
}

/// A bound, scroll-scrubbed timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct ScrollTimeline {
    name: String,
    trigger: Trigger,
    scrub: f32,
    tracks: Vec<Track>,
    duration: f32,
    playhead: f32,
    target: f32,
}

impl ScrollTimeline {
    /// Fix every value of `spec`. `resolve_from` supplies the start of tracks
    /// without an explicit one; tracks it cannot resolve are dropped.
    pub fn compile<F>(spec: &TimelineSpec, viewport_width: f32, mut resolve_from: F) -> Self
    where
        F: FnMut(Property, f32) -> Option<f32>,
    {
        let mut cursor = Cursor::new();
        let mut tracks = Vec::with_capacity(spec.tracks.len());
        for track in &spec.tracks {
            let start = cursor.place(track.position, 0.0, track.duration);
            let to = track.to.resolve(viewport_width);
            let from = match track.from {
                Some(from) => Some(from),
                None => resolve_from(track.property, to),
            };
            let Some(from) = from else {
                log::debug!("{}: no target for {:?}, dropping track", spec.name, track.property);
                continue;
            };
            tracks.push(Track {
                property: track.property,
                from,
                to,
                start,
                duration: track.duration,
                easing: track.easing,
                cue: track.cue,
            });
        }
        Self {
            name: spec.name.clone(),
            trigger: spec.trigger,
            scrub: spec.scrub,
            tracks,
            duration: cursor.end(),
            playhead: 0.0,
            target: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Normalised playhead in `[0, 1]`.
    pub fn playhead(&self) -> f32 {
        self.playhead
    }

    /// Progress the playhead is easing towards.
    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn set_target(&mut self, progress: f32) {
        self.target = progress.clamp(0.0, 1.0);
    }

    /// Jump straight to `progress`. Returns cues of tracks crossed forwards.
    pub fn snap(&mut self, progress: f32) -> Vec<Cue> {
        self.set_target(progress);
        self.move_playhead(self.target)
    }

    /// Ease the playhead towards the target. Returns cues of tracks crossed forwards.
    pub fn step(&mut self, dt: f32) -> Vec<Cue> {
        let next = if self.scrub <= 0.0 {
            self.target
        } else {
            let k = 1.0 - (-dt.max(0.0) * SCRUB_RATE / self.scrub).exp();
            let next = self.playhead + (self.target - self.playhead) * k;
            if (self.target - next).abs() < SNAP_EPSILON {
                self.target
            } else {
                next
            }
        };
        self.move_playhead(next)
    }

    fn move_playhead(&mut self, next: f32) -> Vec<Cue> {
        let prev = self.playhead;
        self.playhead = next;
        if next <= prev {
            return Vec::new();
        }
        let (prev_time, next_time) = (prev * self.duration, next * self.duration);
        self.tracks
            .iter()
            .filter_map(|track| {
                let end = track.start + track.duration;
                let crossed = prev_time < end - f32::EPSILON && next_time >= end - f32::EPSILON;
                crossed.then_some(track.cue).flatten()
            })
            .collect()
    }

    /// Every track's value at the current playhead.
    pub fn sample(&self) -> impl Iterator<Item = (Property, f32)> + '_ {
        let time = self.playhead * self.duration;
        self.tracks.iter().map(move |t| (t.property, t.value_at(time)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{Axis, Target};
    use approx::assert_abs_diff_eq;

    fn spot_x() -> Property {
        Property::position(Target::SpotLight, Axis::X)
    }

    fn timeline(scrub: f32) -> ScrollTimeline {
        let spec = TimelineSpec::new("first-move", Trigger::section(0), scrub)
            .track(
                TrackSpec::to(spot_x(), TargetValue::ViewportWidth(0.0002))
                    .at("same")
                    .on_complete(Cue::RotationCoarse),
            )
            .track(TrackSpec::fixed(Property::ProgressBar(0), 1.0).from(0.0).at("same"));
        ScrollTimeline::compile(&spec, 1200.0, |_, _| Some(-0.28))
    }

    #[test]
    fn compile_resolves_width_relative_targets() {
        let tl = timeline(0.0);
        assert_abs_diff_eq!(tl.tracks()[0].to, 0.24);
        assert_eq!(tl.tracks()[0].from, -0.28);
        assert_eq!(tl.tracks()[1].from, 0.0);
        assert_eq!(tl.tracks()[0].start, tl.tracks()[1].start);
    }

    #[test]
    fn unresolved_tracks_are_dropped() {
        let spec = TimelineSpec::new("x", Trigger::section(0), 0.0)
            .track(TrackSpec::fixed(spot_x(), 1.0));
        let tl = ScrollTimeline::compile(&spec, 1200.0, |_, _| None);
        assert!(tl.tracks().is_empty());
    }

    #[test]
    fn values_are_a_pure_function_of_the_playhead() {
        let mut tl = timeline(0.0);
        tl.snap(0.37);
        let first: Vec<_> = tl.sample().collect();
        for p in [1.0, 0.0, 0.9, 0.1, 0.37] {
            tl.snap(p);
        }
        let again: Vec<_> = tl.sample().collect();
        assert_eq!(first, again);

        tl.snap(0.0);
        assert_eq!(tl.sample().next(), Some((spot_x(), -0.28)));
    }

    #[test]
    fn scrub_lags_then_snaps() {
        let mut tl = timeline(SECTION_SCRUB);
        tl.set_target(1.0);
        tl.step(1.0 / 60.0);
        assert!(tl.playhead() > 0.0 && tl.playhead() < 0.2);
        for _ in 0..600 {
            tl.step(1.0 / 60.0);
        }
        assert_eq!(tl.playhead(), 1.0);
    }

    #[test]
    fn completion_cue_fires_on_forward_crossing_only() {
        let mut tl = timeline(0.0);
        assert!(tl.snap(0.5).is_empty());
        assert_eq!(tl.snap(1.0), vec![Cue::RotationCoarse]);
        assert!(tl.snap(1.0).is_empty());
        assert!(tl.snap(0.2).is_empty());
        assert_eq!(tl.snap(1.0), vec![Cue::RotationCoarse]);
    }
}
