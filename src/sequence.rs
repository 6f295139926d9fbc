//! Time-driven sequences of tweens.
//!
//! A [`Sequence`] owns an ordered list of placed tweens and a playhead that
//! only moves forward. Every [`advance`](Sequence::advance) applies all
//! started tweens in registration order, so a step's values land on the stage
//! together before the next frame is drawn.

use crate::property::Property;
use crate::stage::Stage;
use crate::tween::{Cue, Cursor, DEFAULT_DURATION, Easing, Position, Tween};

/// Delay between consecutive glyphs of a staggered reveal.
pub const GLYPH_STAGGER: f32 = 0.04;

#[derive(Clone, Debug)]
struct Step {
    /// `None` for a staggered group that had no targets.
    tween: Option<Tween>,
    start: f32,
    duration: f32,
    cue: Option<Cue>,
    captured: Option<f32>,
    finished: bool,
}

/// An ordered, one-shot animation sequence.
#[derive(Clone, Debug, Default)]
pub struct Sequence {
    steps: Vec<Step>,
    cursor: Cursor,
    time: f32,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `tween` after everything placed so far.
    pub fn then(&mut self, tween: Tween) -> &mut Self {
        self.push(Position::End, tween)
    }

    /// Place `tween` at `label`, creating the label at the current end if needed.
    pub fn at(&mut self, label: &str, tween: Tween) -> &mut Self {
        self.push(Position::Label(label), tween)
    }

    pub fn push(&mut self, position: Position<'_>, tween: Tween) -> &mut Self {
        let start = self.cursor.place(position, tween.delay, tween.duration);
        self.steps.push(Step {
            cue: tween.cue,
            tween: Some(tween),
            start,
            duration: tween.duration,
            captured: None,
            finished: false,
        });
        self
    }

    /// Place several tweens at the same position, as one multi-property tween.
    pub fn group(
        &mut self,
        position: Position<'_>,
        tweens: impl IntoIterator<Item = Tween>,
    ) -> &mut Self {
        let anchor = self.cursor.anchor(position);
        for tween in tweens {
            let start = anchor + tween.delay;
            self.cursor.reserve(start + tween.duration);
            self.steps.push(Step {
                cue: tween.cue,
                tween: Some(tween),
                start,
                duration: tween.duration,
                captured: None,
                finished: false,
            });
        }
        self
    }

    /// Place one tween per target, each starting `group.each` seconds after
    /// the previous. The group's cue fires once, when the last target
    /// finishes, and fires even if `targets` is empty.
    pub fn stagger(
        &mut self,
        position: Position<'_>,
        targets: impl IntoIterator<Item = Property>,
        group: Stagger,
    ) -> &mut Self {
        let targets: Vec<Property> = targets.into_iter().collect();
        let span = group.duration + group.each * targets.len().saturating_sub(1) as f32;
        let base = self.cursor.place(position, 0.0, span);

        if targets.is_empty() {
            log::debug!("Staggered group at {base:.2}s has no targets");
            self.steps.push(Step {
                tween: None,
                start: base,
                duration: span,
                cue: group.cue,
                captured: None,
                finished: false,
            });
            return self;
        }

        let last = targets.len() - 1;
        for (i, property) in targets.into_iter().enumerate() {
            let tween = Tween::to(property, group.to)
                .duration(group.duration)
                .ease(group.easing);
            self.steps.push(Step {
                tween: Some(tween),
                start: base + group.each * i as f32,
                duration: group.duration,
                cue: if i == last { group.cue } else { None },
                captured: None,
                finished: false,
            });
        }
        self
    }

    /// Move the playhead forward by `dt` and apply every started tween.
    ///
    /// Returns the cues of tweens that finished during this call, in
    /// registration order. Each cue fires exactly once.
    pub fn advance(&mut self, stage: &mut Stage, dt: f32) -> Vec<Cue> {
        self.time += dt.max(0.0);
        let mut cues = Vec::new();
        for step in &mut self.steps {
            if step.finished || self.time < step.start {
                continue;
            }
            let local = self.time - step.start;
            let t = if step.duration <= 0.0 {
                1.0
            } else {
                (local / step.duration).clamp(0.0, 1.0)
            };

            if let Some(tween) = &step.tween {
                let start = match step.captured {
                    Some(v) => Some(v),
                    None => {
                        let v = tween.from.or_else(|| stage.read(tween.property));
                        step.captured = v;
                        v
                    }
                };
                match start {
                    Some(start) => {
                        stage.write(tween.property, tween.sample(start, t));
                    }
                    None => log::debug!("No target for {:?}, skipping", tween.property),
                }
            }

            if t >= 1.0 {
                step.finished = true;
                if let Some(cue) = step.cue {
                    cues.push(cue);
                }
            }
        }
        cues
    }

    /// True once every step has finished.
    pub fn is_finished(&self) -> bool {
        self.steps.iter().all(|s| s.finished)
    }

    /// Total length in seconds.
    pub fn duration(&self) -> f32 {
        self.cursor.end()
    }

    /// Playhead position in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Start time of `label`, if placed.
    pub fn label(&self, name: &str) -> Option<f32> {
        self.cursor.label(name)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// A group of identical tweens started one after another.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stagger {
    pub to: f32,
    /// Duration of each member tween.
    pub duration: f32,
    /// Offset between consecutive member start times.
    pub each: f32,
    pub easing: Easing,
    pub cue: Option<Cue>,
}

impl Stagger {
    pub fn to(value: f32) -> Self {
        Self {
            to: value,
            duration: DEFAULT_DURATION,
            each: GLYPH_STAGGER,
            easing: Easing::default(),
            cue: None,
        }
    }

    pub fn duration(mut self, seconds: f32) -> Self {
        self.duration = seconds.max(0.0);
        self
    }

    pub fn each(mut self, seconds: f32) -> Self {
        self.each = seconds.max(0.0);
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{Axis, Target, TextBlock};
    use crate::stage::tests::test_stage;
    use approx::assert_abs_diff_eq;

    fn run(seq: &mut Sequence, stage: &mut Stage, seconds: f32) -> Vec<Cue> {
        let mut cues = Vec::new();
        let steps = (seconds / 0.01).ceil() as usize;
        for _ in 0..steps {
            cues.extend(seq.advance(stage, 0.01));
        }
        cues
    }

    #[test]
    fn labelled_tweens_run_in_lockstep() {
        let mut stage = test_stage(1200.0);
        let mut seq = Sequence::new();
        seq.at(
            "same",
            Tween::to(Property::position(Target::Primary, Axis::X), -0.5).duration(1.0),
        )
        .at(
            "same",
            Tween::to(Property::position(Target::Environment, Axis::X), -0.5).duration(1.0),
        );
        seq.advance(&mut stage, 0.3);
        assert_abs_diff_eq!(stage.primary.transform.position.x, stage.environment.transform.position.x);
        run(&mut seq, &mut stage, 1.0);
        assert_abs_diff_eq!(stage.primary.transform.position.x, -0.5);
        assert!(seq.is_finished());
    }

    #[test]
    fn start_values_are_captured_when_a_tween_starts() {
        let mut stage = test_stage(1200.0);
        let x = Property::position(Target::Primary, Axis::X);
        let mut seq = Sequence::new();
        seq.then(Tween::to(x, 1.0).duration(1.0))
            .then(Tween::to(x, 0.0).duration(1.0));
        seq.advance(&mut stage, 1.0);
        assert_abs_diff_eq!(stage.primary.transform.position.x, 1.0);
        seq.advance(&mut stage, 0.5);
        assert_abs_diff_eq!(stage.primary.transform.position.x, 0.25, epsilon = 1e-5);
    }

    #[test]
    fn cues_fire_exactly_once() {
        let mut stage = test_stage(1200.0);
        let mut seq = Sequence::new();
        seq.then(Tween::to(Property::ArrowOpacity, 1.0).on_complete(Cue::FirstRevealSettled));
        let cues = run(&mut seq, &mut stage, 3.0);
        assert_eq!(cues, vec![Cue::FirstRevealSettled]);
        assert!(seq.advance(&mut stage, 1.0).is_empty());
    }

    #[test]
    fn grouped_tweens_share_one_start() {
        let mut stage = test_stage(1200.0);
        let mut seq = Sequence::new();
        seq.then(Tween::to(Property::ArrowOpacity, 1.0))
            .group(
                Position::End,
                Axis::ALL.map(|axis| Tween::to(Property::scale(Target::Primary, axis), 0.11).duration(1.0)),
            );
        assert_abs_diff_eq!(seq.duration(), 1.5);
        seq.advance(&mut stage, 1.0);
        let scale = stage.primary.transform.scale;
        assert_abs_diff_eq!(scale.x, scale.y);
        assert_abs_diff_eq!(scale.y, scale.z);
        assert!(scale.x < 0.2 && scale.x > 0.11);
    }

    #[test]
    fn delays_push_the_end_of_the_sequence() {
        let mut seq = Sequence::new();
        seq.then(Tween::to(Property::PreloaderOpacity, 0.0).delay(2.0))
            .then(Tween::to(Property::ArrowOpacity, 1.0));
        assert_abs_diff_eq!(seq.duration(), 3.0);
    }

    #[test]
    fn stagger_offsets_each_glyph() {
        let mut stage = test_stage(1200.0);
        let count = stage.page.glyph_count(TextBlock::Intro);
        let targets = (0..count).map(|index| Property::GlyphOffset {
            block: TextBlock::Intro,
            index,
        });
        let mut seq = Sequence::new();
        seq.stagger(
            Position::End,
            targets,
            Stagger::to(-100.0)
                .ease(Easing::Linear)
                .on_complete(Cue::FirstRevealSettled),
        );
        assert_abs_diff_eq!(seq.duration(), 0.5 + GLYPH_STAGGER * (count - 1) as f32);

        seq.advance(&mut stage, 0.25);
        let first = stage.page.glyph_offset(TextBlock::Intro, 0).unwrap();
        let second = stage.page.glyph_offset(TextBlock::Intro, 1).unwrap();
        assert!(first < second);

        let total = seq.duration();
        let cues = run(&mut seq, &mut stage, total);
        assert_eq!(cues, vec![Cue::FirstRevealSettled]);
        assert_eq!(stage.page.glyph_offset(TextBlock::Intro, count - 1), Some(-100.0));
    }

    #[test]
    fn empty_stagger_still_fires_its_cue() {
        let mut stage = test_stage(1200.0);
        let mut seq = Sequence::new();
        seq.stagger(
            Position::End,
            std::iter::empty(),
            Stagger::to(-100.0).on_complete(Cue::CollapseComplete),
        );
        let cues = run(&mut seq, &mut stage, 1.0);
        assert_eq!(cues, vec![Cue::CollapseComplete]);
    }
}
