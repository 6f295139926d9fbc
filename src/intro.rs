//! The one-shot intro: preload, first reveal, wait for a gesture, second reveal.
//!
//! [`IntroSequencer`] is an explicit state machine. Phases only move forward
//! one step at a time; any other transition is an [`IntroError`]. Reveal
//! animations are [`Sequence`]s whose completion cues drive the transitions:
//!
//! | From               | To                 | Trigger                              |
//! |--------------------|--------------------|--------------------------------------|
//! | Preloading         | FirstReveal        | [`IntroSequencer::begin`] after assembly |
//! | FirstReveal        | AwaitingUserScroll | first reveal settled                 |
//! | AwaitingUserScroll | SecondReveal       | first downward wheel or swipe        |
//! | SecondReveal       | MainScene          | collapse finished, page two shown    |
//!
//! The second reveal keeps playing its trailing text reveal after the phase
//! has become [`IntroPhase::MainScene`].

use std::f32::consts::TAU;

use glam::Vec3;

use crate::device::DeviceCategory;
use crate::error::IntroError;
use crate::gesture::GestureListener;
use crate::page::Page;
use crate::property::{Axis, Channel, Property, Target, TextBlock};
use crate::sequence::{Sequence, Stagger};
use crate::stage::Stage;
use crate::tween::{Cue, Easing, Position, Tween};

/// Phase of the intro. Ordered: phases only ever increase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntroPhase {
    Preloading,
    FirstReveal,
    AwaitingUserScroll,
    SecondReveal,
    MainScene,
}

impl IntroPhase {
    /// The phase that follows this one.
    pub fn next(self) -> Option<Self> {
        match self {
            IntroPhase::Preloading => Some(IntroPhase::FirstReveal),
            IntroPhase::FirstReveal => Some(IntroPhase::AwaitingUserScroll),
            IntroPhase::AwaitingUserScroll => Some(IntroPhase::SecondReveal),
            IntroPhase::SecondReveal => Some(IntroPhase::MainScene),
            IntroPhase::MainScene => None,
        }
    }
}

/// Drives the intro phases.
#[derive(Debug)]
pub struct IntroSequencer {
    phase: IntroPhase,
    sequence: Option<Sequence>,
    gesture: GestureListener,
    move_on_resize: bool,
    main_scene_ready: bool,
    advisory: String,
    history: Vec<IntroPhase>,
}

impl IntroSequencer {
    /// `advisory` is shown once the first reveal settles.
    pub fn new(advisory: impl Into<String>) -> Self {
        Self {
            phase: IntroPhase::Preloading,
            sequence: None,
            gesture: GestureListener::new(),
            move_on_resize: false,
            main_scene_ready: false,
            advisory: advisory.into(),
            history: vec![IntroPhase::Preloading],
        }
    }

    pub fn phase(&self) -> IntroPhase {
        self.phase
    }

    /// Every phase entered so far, in order.
    pub fn history(&self) -> &[IntroPhase] {
        &self.history
    }

    /// Whether the point-of-view camera follows resizes (only while waiting for the gesture).
    pub fn move_on_resize(&self) -> bool {
        self.move_on_resize
    }

    /// Set once the main scene is showing; scroll timelines may bind.
    pub fn main_scene_ready(&self) -> bool {
        self.main_scene_ready
    }

    pub fn gesture_armed(&self) -> bool {
        self.gesture.is_armed()
    }

    /// True while a reveal is still playing.
    pub fn is_animating(&self) -> bool {
        self.sequence.as_ref().is_some_and(|s| !s.is_finished())
    }

    fn transition(&mut self, to: IntroPhase) -> Result<(), IntroError> {
        if self.phase.next() != Some(to) {
            return Err(IntroError {
                from: self.phase,
                to,
            });
        }
        log::info!("Intro: {:?} -> {:?}", self.phase, to);
        self.phase = to;
        self.history.push(to);
        Ok(())
    }

    /// Start the first reveal. Call once the stage is assembled.
    pub fn begin(&mut self, stage: &mut Stage, device: DeviceCategory) -> Result<(), IntroError> {
        self.transition(IntroPhase::FirstReveal)?;
        self.sequence = Some(first_reveal(&stage.page, device));
        Ok(())
    }

    /// Advance the running reveal and react to its cues.
    pub fn update(&mut self, stage: &mut Stage, dt: f32) -> Result<(), IntroError> {
        let cues = match &mut self.sequence {
            Some(sequence) => sequence.advance(stage, dt),
            None => return Ok(()),
        };
        for cue in cues {
            self.on_cue(stage, cue)?;
        }
        Ok(())
    }

    fn on_cue(&mut self, stage: &mut Stage, cue: Cue) -> Result<(), IntroError> {
        match cue {
            Cue::HidePreloader => stage.page.hide_preloader(),
            Cue::FirstRevealSettled => {
                self.transition(IntroPhase::AwaitingUserScroll)?;
                self.move_on_resize = true;
                log::info!("{}", self.advisory);
                stage.page.set_advisory(self.advisory.clone());
                self.gesture.arm();
            }
            Cue::CollapseComplete => {
                stage.page.show_page_two();
                self.main_scene_ready = true;
                self.transition(IntroPhase::MainScene)?;
            }
            Cue::SecondRevealSettled => log::debug!("Second reveal settled"),
            Cue::RotationCoarse | Cue::RotationFine => {}
        }
        Ok(())
    }

    /// Feed a wheel delta (positive scrolls down). Returns true if it started the second reveal.
    pub fn on_wheel(&mut self, stage: &mut Stage, delta_y: f32) -> Result<bool, IntroError> {
        if self.gesture.on_wheel(delta_y) {
            self.start_second_reveal(stage)?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn on_touch_start(&mut self, y: f32) {
        self.gesture.on_touch_start(y);
    }

    /// Feed a touch move. Returns true if it started the second reveal.
    pub fn on_touch_move(&mut self, stage: &mut Stage, y: f32) -> Result<bool, IntroError> {
        if self.gesture.on_touch_move(y) {
            self.start_second_reveal(stage)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn start_second_reveal(&mut self, stage: &mut Stage) -> Result<(), IntroError> {
        self.gesture.disarm();
        self.move_on_resize = false;
        self.transition(IntroPhase::SecondReveal)?;
        self.sequence = Some(second_reveal(&stage.page));
        Ok(())
    }
}

fn glyphs(page: &Page, block: TextBlock) -> impl Iterator<Item = Property> {
    (0..page.glyph_count(block)).map(move |index| Property::GlyphOffset { block, index })
}

fn vec3_tweens(target: Target, channel: Channel, value: Vec3, duration: f32) -> [Tween; 3] {
    Property::vec3(target, channel, value).map(|(p, v)| Tween::to(p, v).duration(duration))
}

/// Primary scale at the end of the first reveal.
pub fn first_reveal_scale(device: DeviceCategory) -> f32 {
    match device {
        DeviceCategory::Desktop => 0.11,
        DeviceCategory::Mobile => 0.10,
    }
}

/// Preloader out, primary object into its resting pose, intro text up, arrow in.
pub fn first_reveal(page: &Page, device: DeviceCategory) -> Sequence {
    let mut seq = Sequence::new();
    seq.then(
        Tween::to(Property::PreloaderOpacity, 0.0)
            .delay(2.0)
            .on_complete(Cue::HidePreloader),
    );

    let scale = Vec3::splat(first_reveal_scale(device));
    seq.group(
        Position::End,
        vec3_tweens(Target::Primary, Channel::Scale, scale, 1.0)
            .map(|t| t.ease(Easing::BackOut(2.5))),
    );

    // Desktop slides left, mobile pushes back.
    let axis = match device {
        DeviceCategory::Desktop => Axis::X,
        DeviceCategory::Mobile => Axis::Z,
    };
    for target in [Target::Primary, Target::Environment] {
        seq.at(
            "same",
            Tween::to(Property::position(target, axis), -0.5).duration(1.0),
        );
    }

    seq.stagger(
        Position::End,
        glyphs(page, TextBlock::Intro),
        Stagger::to(-100.0).ease(Easing::BackOut(2.5)),
    );
    seq.then(Tween::to(Property::ArrowOpacity, 1.0).on_complete(Cue::FirstRevealSettled));
    seq
}

/// Intro text down, primary spins and collapses into the room, page two text up.
pub fn second_reveal(page: &Page) -> Sequence {
    let mut seq = Sequence::new();
    seq.stagger(
        Position::Label("start"),
        glyphs(page, TextBlock::Intro),
        Stagger::to(100.0).ease(Easing::BackIn(0.5)),
    );
    seq.at("start", Tween::to(Property::ArrowOpacity, 0.0));

    seq.group(
        Position::Label("same"),
        [Tween::to(Property::rotation(Target::Primary, Axis::Y), TAU).duration(1.0)],
    );
    seq.group(
        Position::Label("same"),
        vec3_tweens(Target::Primary, Channel::Scale, Vec3::splat(0.49), 1.0),
    );
    seq.group(
        Position::Label("same"),
        vec3_tweens(
            Target::Primary,
            Channel::Position,
            Vec3::new(0.02, 0.05, 0.05),
            1.0,
        ),
    );
    seq.group(
        Position::Label("same"),
        vec3_tweens(Target::Environment, Channel::Position, Vec3::ZERO, 1.0),
    );

    seq.group(
        Position::Label("cube"),
        vec3_tweens(Target::Environment, Channel::Scale, Vec3::splat(0.1), 1.0),
    );
    let [x, y, z] = vec3_tweens(Target::Primary, Channel::Scale, Vec3::ZERO, 1.0);
    seq.group(
        Position::Label("cube"),
        [x, y, z.on_complete(Cue::CollapseComplete)],
    );

    for block in TextBlock::PAGE_TWO {
        seq.stagger(
            Position::Label("text"),
            glyphs(page, block),
            Stagger::to(-100.0).ease(Easing::BackOut(0.5)),
        );
    }
    seq.then(Tween::to(Property::ArrowOpacity, 1.0).on_complete(Cue::SecondRevealSettled));
    seq
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::tests::test_stage;
    use approx::assert_abs_diff_eq;

    fn settle(intro: &mut IntroSequencer, stage: &mut Stage, seconds: f32) {
        for _ in 0..(seconds * 60.0).ceil() as usize {
            intro.update(stage, 1.0 / 60.0).unwrap();
        }
    }

    #[test]
    fn phases_only_advance_one_step() {
        assert_eq!(IntroPhase::Preloading.next(), Some(IntroPhase::FirstReveal));
        assert_eq!(IntroPhase::MainScene.next(), None);
        let mut intro = IntroSequencer::new("note");
        let err = intro.transition(IntroPhase::MainScene).unwrap_err();
        assert_eq!(err.from, IntroPhase::Preloading);
        assert_eq!(intro.phase(), IntroPhase::Preloading);
    }

    #[test]
    fn begin_twice_is_rejected() {
        let mut stage = test_stage(1200.0);
        let mut intro = IntroSequencer::new("note");
        intro.begin(&mut stage, DeviceCategory::Desktop).unwrap();
        assert!(intro.begin(&mut stage, DeviceCategory::Desktop).is_err());
        assert_eq!(intro.phase(), IntroPhase::FirstReveal);
    }

    #[test]
    fn desktop_first_reveal_slides_left() {
        let mut stage = test_stage(1200.0);
        let mut intro = IntroSequencer::new("note");
        intro.begin(&mut stage, DeviceCategory::Desktop).unwrap();
        settle(&mut intro, &mut stage, 10.0);

        assert_eq!(intro.phase(), IntroPhase::AwaitingUserScroll);
        assert_abs_diff_eq!(stage.primary.transform.position.x, -0.5, epsilon = 1e-5);
        assert_abs_diff_eq!(stage.environment.transform.position.x, -0.5, epsilon = 1e-5);
        assert_abs_diff_eq!(stage.primary.transform.position.z, 0.0);
        assert_abs_diff_eq!(stage.primary.transform.scale.x, 0.11, epsilon = 1e-5);
        assert!(stage.page.preloader_hidden);
        assert_eq!(stage.page.arrow_opacity, 1.0);
        assert_eq!(stage.page.advisory(), Some("note"));
        assert!(intro.move_on_resize());
        assert!(intro.gesture_armed());
    }

    #[test]
    fn mobile_first_reveal_pushes_back() {
        let mut stage = test_stage(500.0);
        let mut intro = IntroSequencer::new("note");
        intro.begin(&mut stage, DeviceCategory::Mobile).unwrap();
        settle(&mut intro, &mut stage, 10.0);

        assert_abs_diff_eq!(stage.primary.transform.position.z, -0.5, epsilon = 1e-5);
        assert_abs_diff_eq!(stage.primary.transform.position.x, 0.0);
        assert_abs_diff_eq!(stage.primary.transform.scale.x, 0.10, epsilon = 1e-5);
    }

    #[test]
    fn gestures_before_arming_are_ignored() {
        let mut stage = test_stage(1200.0);
        let mut intro = IntroSequencer::new("note");
        intro.begin(&mut stage, DeviceCategory::Desktop).unwrap();
        assert!(!intro.on_wheel(&mut stage, 10.0).unwrap());
        assert_eq!(intro.phase(), IntroPhase::FirstReveal);
    }

    #[test]
    fn second_reveal_reaches_main_scene_once() {
        let mut stage = test_stage(1200.0);
        let mut intro = IntroSequencer::new("note");
        intro.begin(&mut stage, DeviceCategory::Desktop).unwrap();
        settle(&mut intro, &mut stage, 10.0);

        assert!(intro.on_wheel(&mut stage, 10.0).unwrap());
        assert!(!intro.on_wheel(&mut stage, 10.0).unwrap());
        assert_eq!(intro.phase(), IntroPhase::SecondReveal);
        assert!(!intro.move_on_resize());

        settle(&mut intro, &mut stage, 4.0);
        assert_eq!(intro.phase(), IntroPhase::MainScene);
        assert!(intro.main_scene_ready());
        assert!(stage.page.page_two_visible);
        assert_abs_diff_eq!(stage.primary.transform.scale.x, 0.0, epsilon = 1e-5);
        assert_abs_diff_eq!(stage.environment.transform.scale.x, 0.1, epsilon = 1e-5);
        assert_abs_diff_eq!(stage.primary.transform.rotation.y, TAU, epsilon = 1e-4);

        settle(&mut intro, &mut stage, 10.0);
        assert!(!intro.is_animating());
        assert_eq!(stage.page.glyph_offset(TextBlock::HeroTitle, 0), Some(-100.0));
        assert_eq!(
            intro.history(),
            &[
                IntroPhase::Preloading,
                IntroPhase::FirstReveal,
                IntroPhase::AwaitingUserScroll,
                IntroPhase::SecondReveal,
                IntroPhase::MainScene,
            ]
        );
    }

    #[test]
    fn missing_text_does_not_stall_the_intro() {
        let mut stage = test_stage(1200.0);
        for block in TextBlock::ALL {
            stage.page.remove_block(block);
        }
        let mut intro = IntroSequencer::new("note");
        intro.begin(&mut stage, DeviceCategory::Desktop).unwrap();
        settle(&mut intro, &mut stage, 10.0);
        assert_eq!(intro.phase(), IntroPhase::AwaitingUserScroll);

        intro.on_touch_start(400.0);
        assert!(intro.on_touch_move(&mut stage, 300.0).unwrap());
        settle(&mut intro, &mut stage, 10.0);
        assert_eq!(intro.phase(), IntroPhase::MainScene);
    }
}
