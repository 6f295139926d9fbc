//! Native host: a winit event loop driving one [`Session`] and its [`Renderer`].

use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::config::StageConfig;
use crate::device::Viewport;
use crate::error::{Error, Result};
use crate::render::Renderer;
use crate::session::Session;

/// Run with the default configuration.
///
/// # Example
/// ```no_run
/// diorama::run().unwrap();
/// ```
pub fn run() -> Result<()> {
    run_with_config(StageConfig::default())
}

/// Open a window and play the scene described by `config` until it is closed.
///
/// Returns the error that stopped the loop, such as an asset that failed to
/// load or a GPU that could not be initialised.
pub fn run_with_config(config: StageConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DioramaApp::Pending { config };
    event_loop.run_app(&mut app)?;

    match app {
        DioramaApp::Failed(err) => Err(err),
        _ => Ok(()),
    }
}

enum DioramaApp {
    Pending {
        config: StageConfig,
    },
    Running {
        window: Arc<Window>,
        session: Session,
        renderer: Renderer,
        last_frame: Instant,
    },
    Failed(Error),
    Finished,
}

fn viewport_of(window: &Window) -> Viewport {
    let size = window.inner_size();
    Viewport::from_physical(size.width, size.height, window.scale_factor())
}

fn start(event_loop: &ActiveEventLoop, config: StageConfig) -> Result<DioramaApp> {
    let window_attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
    let window = Arc::new(event_loop.create_window(window_attrs)?);

    let mut session = Session::new(config, viewport_of(&window));
    session.load_configured()?;
    let renderer = Renderer::new(window.clone(), &session)?;
    window.request_redraw();

    Ok(DioramaApp::Running {
        window,
        session,
        renderer,
        last_frame: Instant::now(),
    })
}

impl DioramaApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: Error) {
        log::error!("{err}");
        *self = DioramaApp::Failed(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for DioramaApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let DioramaApp::Pending { config } = self else {
            return;
        };
        let config = std::mem::take(config);
        match start(event_loop, config) {
            Ok(running) => *self = running,
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let DioramaApp::Running {
            window,
            session,
            renderer,
            last_frame,
        } = self
        else {
            return;
        };

        let outcome = match &event {
            WindowEvent::CloseRequested => {
                *self = DioramaApp::Finished;
                event_loop.exit();
                return;
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                session.resize(viewport_of(window));
                renderer.resize(session);
                Ok(())
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                let dt = now.duration_since(*last_frame).as_secs_f32();
                *last_frame = now;

                let outcome = session.update(dt);
                if outcome.is_ok() {
                    renderer.render(session);
                    window.request_redraw();
                }
                outcome
            }
            _ => session.handle_window_event(&event),
        };

        if let Err(err) = outcome {
            self.fail(event_loop, err);
        }
    }
}
