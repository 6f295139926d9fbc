//! The composition root: owns every piece of choreography state for one page view.
//!
//! A [`Session`] is driven by the host once per frame through
//! [`Session::update`] and fed viewport and pointer events as they arrive.
//! It never touches the GPU, so tests drive it headlessly with in-memory
//! asset sources.

use glam::Vec3;
use winit::event::WindowEvent;

use crate::assets::{AssetGate, AssetHandle, AssetSource, FileSource, RetryTimer};
use crate::binder::TimelineBinder;
use crate::config::StageConfig;
use crate::device::{DeviceCategory, Viewport};
use crate::error::Result;
use crate::input::{Input, PointerEvent};
use crate::intro::{IntroPhase, IntroSequencer};
use crate::page::Page;
use crate::scroll::{PageLayout, ScrollProvider};
use crate::smoother::{RotationGate, RotationSmoother};
use crate::stage::Stage;

/// Where the point-of-view camera jumps on resize while the intro waits for a gesture.
pub fn resting_camera_position(device: DeviceCategory) -> Vec3 {
    match device {
        DeviceCategory::Desktop => Vec3::new(0.75, 0.0, 0.0),
        DeviceCategory::Mobile => Vec3::new(0.0, 0.0, 0.75),
    }
}

/// One page view: asset gate, intro, scroll timelines and pointer rotation.
///
/// The host forwards window events and calls [`update`](Self::update) once
/// per frame, then renders [`stage`](Self::stage). Nothing here touches the
/// GPU.
///
/// # Example
/// ```no_run
/// use diorama::{IntroPhase, NodeSource, PointerEvent, SceneNode, Session, StageConfig, Viewport};
///
/// let mut session = Session::new(StageConfig::default(), Viewport::new(1200.0, 800.0));
/// session.load(NodeSource(SceneNode::new("cube")), NodeSource(SceneNode::new("room")))?;
///
/// while session.phase() != IntroPhase::AwaitingUserScroll {
///     session.update(1.0 / 60.0)?;
/// }
/// session.pointer(PointerEvent::Wheel { delta_y: 10.0 })?;
/// # Ok::<(), diorama::Error>(())
/// ```
pub struct Session {
    config: StageConfig,
    viewport: Viewport,
    device: DeviceCategory,
    input: Input,
    gate: AssetGate,
    asset_timer: RetryTimer,
    main_scene_timer: RetryTimer,
    page: Option<Page>,
    stage: Option<Stage>,
    intro: IntroSequencer,
    layout: PageLayout,
    scroll: ScrollProvider,
    binder: TimelineBinder,
    smoother: RotationSmoother,
}

impl Session {
    /// Create a session for `viewport`. Nothing loads until [`load`](Self::load)
    /// or [`load_configured`](Self::load_configured) is called.
    pub fn new(config: StageConfig, viewport: Viewport) -> Self {
        let device = DeviceCategory::classify_with(viewport.width, config.breakpoint);
        log::info!("Viewport {}x{} classified as {device}", viewport.width, viewport.height);

        let layout = PageLayout::compute(viewport.height, &config.layout);
        let mut scroll = ScrollProvider::new();
        scroll.set_layout(&layout);

        let mut input = Input::new();
        input.set_scale_factor(viewport.scale_factor);

        Self {
            device,
            input,
            gate: AssetGate::new(),
            asset_timer: RetryTimer::for_strategy(config.readiness, config.asset_poll_interval()),
            main_scene_timer: RetryTimer::for_strategy(
                config.readiness,
                config.main_scene_poll_interval(),
            ),
            page: Some(Page::new(&config.text, config.sides)),
            stage: None,
            intro: IntroSequencer::new(config.advisory.clone()),
            layout,
            scroll,
            binder: TimelineBinder::new(),
            smoother: RotationSmoother::new(
                config.smoothing,
                config.coarse_sensitivity,
                config.fine_sensitivity,
            ),
            viewport,
            config,
        }
    }

    /// Start loading both objects from the configured files.
    pub fn load_configured(&mut self) -> Result<()> {
        let primary = FileSource::new(self.config.primary_asset.clone());
        let environment = FileSource::new(self.config.environment_asset.clone());
        self.load(primary, environment)
    }

    /// Start loading both objects from arbitrary sources.
    pub fn load<P: AssetSource, E: AssetSource>(&mut self, primary: P, environment: E) -> Result<()> {
        self.gate.register_load(AssetHandle::Primary, primary)?;
        self.gate.register_load(AssetHandle::Environment, environment)?;
        Ok(())
    }

    /// The configuration this session was created with.
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Current logical viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Device category of the current viewport.
    pub fn device(&self) -> DeviceCategory {
        self.device
    }

    /// The assembled scene, once both assets are in.
    pub fn stage(&self) -> Option<&Stage> {
        self.stage.as_ref()
    }

    /// Asset readiness gate.
    pub fn gate(&self) -> &AssetGate {
        &self.gate
    }

    /// Intro state machine, including its phase history.
    pub fn intro(&self) -> &IntroSequencer {
        &self.intro
    }

    /// Current intro phase.
    pub fn phase(&self) -> IntroPhase {
        self.intro.phase()
    }

    /// Scroll timelines, bound once the main scene is reached.
    pub fn binder(&self) -> &TimelineBinder {
        &self.binder
    }

    /// Section geometry for the current viewport height.
    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// Page scroll offset, inert until the main scene is reached.
    pub fn scroll(&self) -> &ScrollProvider {
        &self.scroll
    }

    /// Pointer-driven rotation state.
    pub fn smoother(&self) -> &RotationSmoother {
        &self.smoother
    }

    /// Advance everything by `dt` seconds.
    ///
    /// Pointer rotation is applied before the intro, so a reveal tween on
    /// the same channel is what gets rendered while it runs.
    ///
    /// Returns an error if an asset failed to load; there is no scene
    /// without both objects.
    pub fn update(&mut self, dt: f32) -> Result<()> {
        if self.stage.is_none() {
            self.try_assemble(dt)?;
        }
        let Some(stage) = self.stage.as_mut() else {
            return Ok(());
        };

        // Rotation first: a running reveal tween on the same channel wins this frame.
        self.smoother.tick(stage);
        self.intro.update(stage, dt)?;

        if !self.binder.is_bound() && self.intro.main_scene_ready() && self.main_scene_timer.tick(dt) {
            self.scroll.activate();
            self.binder.bind(
                stage,
                self.device,
                &self.layout,
                self.scroll.offset(),
                self.viewport.width,
            );
        }
        for cue in self.binder.update(stage, &self.layout, self.scroll.offset(), dt) {
            if let Some(gate) = RotationGate::from_cue(cue) {
                self.smoother.set_gate(gate);
            }
        }

        stage.orbit.update(&self.input, dt);
        self.input.begin_frame();
        Ok(())
    }

    fn try_assemble(&mut self, dt: f32) -> Result<()> {
        if !self.asset_timer.tick(dt) {
            return Ok(());
        }
        self.gate.pump()?;
        let Some(assets) = self.gate.take_ready() else {
            return Ok(());
        };
        let page = self
            .page
            .take()
            .unwrap_or_else(|| Page::new(&self.config.text, self.config.sides));
        let mut stage = Stage::assemble(assets, &self.viewport, &self.config, page);
        self.intro.begin(&mut stage, self.device)?;
        self.stage = Some(stage);
        Ok(())
    }

    /// React to a new viewport size.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.input.set_scale_factor(viewport.scale_factor);
        if let Some(device) =
            DeviceCategory::has_changed_with(viewport.width, self.device, self.config.breakpoint)
        {
            log::info!("Device category {} -> {device}", self.device);
            self.device = device;
        }

        self.layout = PageLayout::compute(viewport.height, &self.config.layout);
        self.scroll.set_layout(&self.layout);

        let Some(stage) = self.stage.as_mut() else {
            return;
        };
        stage.set_aspect(viewport.aspect());
        if self.intro.move_on_resize() {
            stage.pov_camera.position = resting_camera_position(self.device);
        }
        if self.binder.is_bound() {
            self.binder.bind(
                stage,
                self.device,
                &self.layout,
                self.scroll.offset(),
                viewport.width,
            );
        }
    }

    /// Route a window event through input tracking into the choreography.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> Result<()> {
        match self.input.handle_event(event) {
            Some(pointer) => self.pointer(pointer),
            None => Ok(()),
        }
    }

    /// Feed one pointer event.
    pub fn pointer(&mut self, event: PointerEvent) -> Result<()> {
        match event {
            PointerEvent::Moved { x, .. } => self.smoother.on_pointer(x, self.viewport.width),
            PointerEvent::Wheel { delta_y } => {
                if let Some(stage) = self.stage.as_mut() {
                    self.intro.on_wheel(stage, delta_y)?;
                }
                self.scroll.scroll_by(delta_y);
            }
            PointerEvent::TouchStart { y } => {
                self.intro.on_touch_start(y);
                self.scroll.touch_start(y);
            }
            PointerEvent::TouchMove { y } => {
                if let Some(stage) = self.stage.as_mut() {
                    self.intro.on_touch_move(stage, y)?;
                }
                self.scroll.touch_move(y);
            }
            PointerEvent::TouchEnd => self.scroll.touch_end(),
        }
        Ok(())
    }

    /// Jump the page to `offset` (once scrolling is enabled).
    pub fn scroll_to(&mut self, offset: f32) {
        self.scroll.scroll_to(offset);
    }
}
