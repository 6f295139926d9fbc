//! Full-screen page overlay: preloader fade, arrow prompt, and the pinned
//! progress bar of the section in view.

use crate::config::SectionSide;
use crate::gpu::GpuContext;
use crate::page::Page;

/// What the overlay shows this frame, derived from the page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayState {
    pub preloader: f32,
    pub arrow: f32,
    /// Fill and side of the progress bar, when a section is in view.
    pub bar: Option<(f32, SectionSide)>,
}

impl OverlayState {
    /// Before the page exists the preloader covers everything.
    pub fn new(page: Option<&Page>, section: Option<usize>) -> Self {
        let Some(page) = page else {
            return Self {
                preloader: 1.0,
                arrow: 0.0,
                bar: None,
            };
        };
        let preloader = if page.preloader_hidden {
            0.0
        } else {
            page.preloader_opacity
        };
        let bar = section
            .filter(|_| page.page_two_visible)
            .and_then(|i| page.sections.get(i))
            .map(|panel| (panel.progress, panel.side));
        Self {
            preloader,
            arrow: page.arrow_opacity,
            bar,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct OverlayUniforms {
    resolution: [f32; 2],
    preloader: f32,
    arrow: f32,
    /// x: fill, y: visible, z: right edge.
    bar: [f32; 4],
    background: [f32; 4],
    accent: [f32; 4],
}

const ACCENT: [f32; 4] = [0.9, 0.9, 1.0, 1.0];

/// Composites the page chrome over the scene in one fullscreen triangle:
/// preloader fade, arrow prompt and the pinned section progress bar.
pub struct OverlayPass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl OverlayPass {
    /// Build the overlay pipeline for the surface format.
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Overlay Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/overlay.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Overlay Uniforms"),
            size: std::mem::size_of::<OverlayUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Overlay Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Overlay Bind Group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Overlay Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Overlay Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.format(),
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            uniform_buffer,
            bind_group,
        }
    }

    /// Composite the overlay onto `target`. `resolution` is in logical pixels.
    pub fn render(
        &self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        state: &OverlayState,
        resolution: [f32; 2],
        background: [f32; 4],
    ) {
        let bar = match state.bar {
            Some((fill, side)) => [fill, 1.0, (side == SectionSide::Right) as u8 as f32, 0.0],
            None => [0.0; 4],
        };
        let uniforms = OverlayUniforms {
            resolution,
            preloader: state.preloader,
            arrow: state.arrow,
            bar,
            background,
            accent: ACCENT,
        };
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Overlay Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
