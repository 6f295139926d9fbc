//! End-to-end choreography through a headless session.

use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use approx::assert_abs_diff_eq;
use diorama::{
    AssetError, AssetSource, Axis, DeviceCategory, Error, IntroPhase, NodeSource, PointerEvent,
    Property, RotationGate, SceneNode, Session, StageConfig, SubNode, Target, Transform, Vec3,
    Viewport,
};

const FRAME: f32 = 1.0 / 60.0;

fn room() -> SceneNode {
    SubNode::ALL
        .into_iter()
        .fold(SceneNode::new("room"), |room, sub| {
            room.with_child(
                SceneNode::new(sub.name()).with_transform(Transform::from_position(Vec3::ZERO)),
            )
        })
        .with_child(SceneNode::new("desk"))
}

fn session_with(config: StageConfig, width: f32) -> Session {
    let mut session = Session::new(config, Viewport::new(width, 800.0));
    session
        .load(NodeSource(SceneNode::new("cube")), NodeSource(room()))
        .unwrap();
    session
}

fn session(width: f32) -> Session {
    session_with(StageConfig::default(), width)
}

fn step(session: &mut Session, frames: usize) {
    for _ in 0..frames {
        session.update(FRAME).unwrap();
    }
}

fn run_until(session: &mut Session, mut done: impl FnMut(&Session) -> bool) {
    for _ in 0..3000 {
        if done(session) {
            return;
        }
        session.update(FRAME).unwrap();
        std::thread::sleep(Duration::from_micros(200));
    }
    panic!("condition not reached; phase {:?}", session.phase());
}

fn read(session: &Session, property: Property) -> f32 {
    session
        .stage()
        .and_then(|stage| stage.read(property))
        .unwrap_or(f32::NAN)
}

fn main_scene(width: f32) -> Session {
    let mut s = session(width);
    run_until(&mut s, |s| s.phase() == IntroPhase::AwaitingUserScroll);
    s.pointer(PointerEvent::Wheel { delta_y: 10.0 }).unwrap();
    run_until(&mut s, |s| s.binder().is_bound());
    s
}

/// Scroll to progress `p` through `section` and let the scrub settle.
fn scroll_section(s: &mut Session, section: usize, p: f32) {
    let bounds = s.layout().sections[section];
    let offset = bounds.top + (bounds.height() - s.layout().viewport_height) * p;
    s.scroll_to(offset);
    step(s, 600);
}

struct GatedSource {
    open: Receiver<()>,
    node: SceneNode,
}

impl AssetSource for GatedSource {
    fn describe(&self) -> String {
        format!("gated '{}'", self.node.name)
    }

    fn load(self: Box<Self>) -> Result<SceneNode, AssetError> {
        let _ = self.open.recv();
        Ok(self.node)
    }
}

struct FailingSource;

impl AssetSource for FailingSource {
    fn describe(&self) -> String {
        "broken".into()
    }

    fn load(self: Box<Self>) -> Result<SceneNode, AssetError> {
        Err(AssetError::UnknownFormat("broken.xyz".into()))
    }
}

#[test]
fn desktop_first_reveal_slides_the_objects_left() {
    let mut s = session(1200.0);
    assert_eq!(s.device(), DeviceCategory::Desktop);
    run_until(&mut s, |s| s.phase() == IntroPhase::AwaitingUserScroll);
    assert_abs_diff_eq!(read(&s, Property::position(Target::Primary, Axis::X)), -0.5);
    assert_abs_diff_eq!(read(&s, Property::position(Target::Environment, Axis::X)), -0.5);
    assert_abs_diff_eq!(read(&s, Property::position(Target::Primary, Axis::Z)), 0.0);
}

#[test]
fn mobile_first_reveal_pushes_the_objects_back() {
    let mut s = session(500.0);
    assert_eq!(s.device(), DeviceCategory::Mobile);
    run_until(&mut s, |s| s.phase() == IntroPhase::AwaitingUserScroll);
    assert_abs_diff_eq!(read(&s, Property::position(Target::Primary, Axis::Z)), -0.5);
    assert_abs_diff_eq!(read(&s, Property::position(Target::Primary, Axis::X)), 0.0);
}

#[test]
fn assembly_waits_for_every_asset() {
    let (open, gate) = mpsc::channel();
    let mut s = Session::new(StageConfig::default(), Viewport::new(1200.0, 800.0));
    s.load(
        GatedSource {
            open: gate,
            node: SceneNode::new("cube"),
        },
        NodeSource(room()),
    )
    .unwrap();

    for _ in 0..30 {
        s.update(FRAME).unwrap();
        std::thread::sleep(Duration::from_millis(1));
    }
    assert!(s.stage().is_none());
    assert_eq!(s.phase(), IntroPhase::Preloading);

    open.send(()).unwrap();
    run_until(&mut s, |s| s.stage().is_some());
    assert_eq!(s.phase(), IntroPhase::FirstReveal);
}

#[test]
fn asset_failure_stops_startup() {
    let mut s = Session::new(StageConfig::default(), Viewport::new(1200.0, 800.0));
    s.load(FailingSource, NodeSource(room())).unwrap();
    let mut failure = None;
    for _ in 0..2000 {
        if let Err(err) = s.update(FRAME) {
            failure = Some(err);
            break;
        }
        std::thread::sleep(Duration::from_micros(200));
    }
    assert!(matches!(failure, Some(Error::Asset(AssetError::UnknownFormat(_)))));
    assert!(s.stage().is_none());
}

#[test]
fn intro_phases_only_move_forward() {
    let s = main_scene(1200.0);
    assert_eq!(
        s.intro().history(),
        [
            IntroPhase::Preloading,
            IntroPhase::FirstReveal,
            IntroPhase::AwaitingUserScroll,
            IntroPhase::SecondReveal,
            IntroPhase::MainScene,
        ]
    );
}

#[test]
fn gesture_starts_the_second_reveal_once() {
    let mut s = session(1200.0);
    run_until(&mut s, |s| s.phase() == IntroPhase::AwaitingUserScroll);

    s.pointer(PointerEvent::Wheel { delta_y: 10.0 }).unwrap();
    s.pointer(PointerEvent::Wheel { delta_y: 10.0 }).unwrap();
    s.pointer(PointerEvent::TouchStart { y: 400.0 }).unwrap();
    s.pointer(PointerEvent::TouchMove { y: 100.0 }).unwrap();

    assert_eq!(s.phase(), IntroPhase::SecondReveal);
    let entries = s
        .intro()
        .history()
        .iter()
        .filter(|&&p| p == IntroPhase::SecondReveal)
        .count();
    assert_eq!(entries, 1);
}

#[test]
fn upward_swipe_also_starts_the_second_reveal() {
    let mut s = session(500.0);
    run_until(&mut s, |s| s.phase() == IntroPhase::AwaitingUserScroll);
    s.pointer(PointerEvent::TouchStart { y: 400.0 }).unwrap();
    s.pointer(PointerEvent::TouchMove { y: 380.0 }).unwrap();
    assert_eq!(s.phase(), IntroPhase::SecondReveal);
}

#[test]
fn missing_intro_text_does_not_stall_the_intro() {
    let mut config = StageConfig::default();
    config.text.intro.clear();
    let mut s = session_with(config, 1200.0);
    run_until(&mut s, |s| s.phase() == IntroPhase::AwaitingUserScroll);
    let stage = s.stage().unwrap();
    assert_eq!(stage.page.advisory(), Some(s.config().advisory.as_str()));
}

#[test]
fn section_two_round_trip_returns_lights_exactly() {
    let mut s = main_scene(1200.0);
    scroll_section(&mut s, 1, 0.0);
    let start = [Axis::X, Axis::Y, Axis::Z]
        .map(|axis| read(&s, Property::position(Target::SpotLight, axis)));

    scroll_section(&mut s, 1, 1.0);
    assert_abs_diff_eq!(
        read(&s, Property::position(Target::SpotLight, Axis::Y)),
        1.25,
        epsilon = 1e-5
    );

    scroll_section(&mut s, 1, 0.0);
    let back = [Axis::X, Axis::Y, Axis::Z]
        .map(|axis| read(&s, Property::position(Target::SpotLight, axis)));
    assert_eq!(start, back);
}

#[test]
fn device_change_discards_mobile_targets() {
    let mut s = main_scene(500.0);
    let env_scale = Property::scale(Target::Environment, Axis::X);
    let before = read(&s, env_scale);

    scroll_section(&mut s, 0, 1.0);
    assert_abs_diff_eq!(read(&s, env_scale), 0.085, epsilon = 1e-5);

    s.resize(Viewport::new(1200.0, 800.0));
    assert_eq!(s.binder().device(), Some(DeviceCategory::Desktop));
    step(&mut s, 120);
    assert_eq!(read(&s, env_scale), before);
}

#[test]
fn last_section_switches_to_fine_rotation_and_lifts_sub_nodes() {
    let mut s = main_scene(1200.0);
    scroll_section(&mut s, 2, 1.0);
    assert_eq!(s.smoother().gate(), RotationGate::Fine);
    for sub in SubNode::ALL {
        assert_abs_diff_eq!(
            read(&s, Property::position(Target::EnvironmentNode(sub), Axis::Y)),
            0.2,
            epsilon = 1e-5
        );
    }

    scroll_section(&mut s, 0, 0.5);
    assert_eq!(s.smoother().gate(), RotationGate::Fine);
    scroll_section(&mut s, 0, 1.0);
    assert_eq!(s.smoother().gate(), RotationGate::Coarse);
}

#[test]
fn pointer_rotation_runs_during_the_intro() {
    let mut s = session(1200.0);
    run_until(&mut s, |s| s.stage().is_some());
    s.pointer(PointerEvent::Moved { x: 1200.0, y: 0.0 }).unwrap();
    step(&mut s, 300);
    assert_abs_diff_eq!(s.smoother().state().current, 0.2, epsilon = 1e-4);
    assert_abs_diff_eq!(
        read(&s, Property::rotation(Target::Environment, Axis::Y)),
        s.smoother().state().current
    );
}
