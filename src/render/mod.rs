//! Frame rendering: clear to the background, draw the stage, composite the page overlay.

mod mesh_pass;
mod overlay_pass;

use std::sync::Arc;

use winit::window::Window;

pub use mesh_pass::{MeshPass, ModelUniforms, SceneUniforms};
pub use overlay_pass::{OverlayPass, OverlayState};

use crate::error::Result;
use crate::gpu::{GpuContext, surface_size};
use crate::session::Session;

/// Owns the GPU context and every pass.
pub struct Renderer {
    gpu: GpuContext,
    mesh_pass: MeshPass,
    overlay_pass: OverlayPass,
    max_pixel_ratio: f32,
}

impl Renderer {
    /// Create the GPU context for `window`, sized to the session's viewport.
    ///
    /// Fails if no surface, adapter or device is available.
    pub fn new(window: Arc<Window>, session: &Session) -> Result<Self> {
        let viewport = session.viewport();
        let max_pixel_ratio = session.config().max_pixel_ratio;
        let size = surface_size(
            viewport.width,
            viewport.height,
            viewport.pixel_ratio(max_pixel_ratio),
        );
        let gpu = GpuContext::new(window, size)?;
        let mesh_pass = MeshPass::new(&gpu);
        let overlay_pass = OverlayPass::new(&gpu);
        log::info!("Renderer ready at {}x{}", gpu.width(), gpu.height());
        Ok(Self {
            gpu,
            mesh_pass,
            overlay_pass,
            max_pixel_ratio,
        })
    }

    /// Match the surface to the session's viewport.
    pub fn resize(&mut self, session: &Session) {
        let viewport = session.viewport();
        let (width, height) = surface_size(
            viewport.width,
            viewport.height,
            viewport.pixel_ratio(self.max_pixel_ratio),
        );
        self.gpu.resize(width, height);
    }

    /// Render one frame of `session`.
    pub fn render(&mut self, session: &Session) {
        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost, reconfiguring");
                self.gpu.reconfigure();
                return;
            }
            Err(err) => {
                log::error!("Failed to acquire frame: {err}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let background = session.config().background_color();
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let [r, g, b, a] = background.map(f64::from);
            let _clear = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }

        let stage = session.stage();
        if let Some(stage) = stage {
            let camera = stage.active_camera(session.config().debug_orbit);
            self.mesh_pass
                .render(&self.gpu, &mut encoder, &view, stage, &camera);
        }

        let section = session.layout().section_at(session.scroll().offset());
        let overlay = OverlayState::new(stage.map(|s| &s.page), section);
        let viewport = session.viewport();
        self.overlay_pass.render(
            &self.gpu,
            &mut encoder,
            &view,
            &overlay,
            [viewport.width, viewport.height],
            background,
        );

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}
