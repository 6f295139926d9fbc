//! Lit mesh rendering with depth testing.
//!
//! Two bind groups:
//! - **Group 0**: scene uniforms (view-projection, camera position, lights)
//! - **Group 1**: per-draw model uniforms, addressed by dynamic offset so a
//!   whole frame's worth of draws shares one buffer

use std::collections::HashMap;

use glam::Mat4;

use crate::camera::Camera;
use crate::gpu::{DEPTH_FORMAT, GpuContext};
use crate::mesh::{Mesh, Vertex3d};
use crate::scene_graph::MeshKey;
use crate::stage::Stage;

/// Scene-wide uniforms: camera and every light, packed into vec4s.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub ambient: [f32; 4],
    pub moon_dir: [f32; 4],
    pub moon_color: [f32; 4],
    /// `w` is the range.
    pub spot_pos: [f32; 4],
    /// `w` is the cosine of the outer cone angle.
    pub spot_dir: [f32; 4],
    /// `w` is the cosine of the inner cone angle.
    pub spot_color: [f32; 4],
    /// `w` is the range.
    pub point_pos: [f32; 4],
    pub point_color: [f32; 4],
}

fn scaled(color: [f32; 4], intensity: f32) -> [f32; 4] {
    [
        color[0] * intensity,
        color[1] * intensity,
        color[2] * intensity,
        1.0,
    ]
}

impl SceneUniforms {
    pub fn new(stage: &Stage, camera: &Camera) -> Self {
        let spot = &stage.spot;
        let outer = spot.angle.cos();
        let inner = (spot.angle * (1.0 - spot.penumbra)).cos();
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
            ambient: scaled(stage.ambient.color, stage.ambient.intensity),
            moon_dir: stage.moon.direction().extend(0.0).to_array(),
            moon_color: scaled(stage.moon.color, stage.moon.intensity),
            spot_pos: spot.position.extend(spot.distance).to_array(),
            spot_dir: spot.direction().extend(outer).to_array(),
            spot_color: {
                let [r, g, b, _] = scaled(spot.color, spot.intensity);
                [r, g, b, inner]
            },
            point_pos: stage.point.position.extend(stage.point.distance).to_array(),
            point_color: scaled(stage.point.color, stage.point.intensity),
        }
    }
}

/// Per-draw uniforms.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniforms {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of the model matrix, for normals under non-uniform scale.
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl ModelUniforms {
    /// `None` for degenerate (zero-scale) transforms, which draw nothing.
    pub fn new(world: Mat4, color: [f32; 4]) -> Option<Self> {
        let det = world.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Self {
            model: world.to_cols_array_2d(),
            normal_matrix: world.inverse().transpose().to_cols_array_2d(),
            color,
        })
    }
}

/// Dynamic uniform offsets must be a multiple of this on every backend.
const MODEL_STRIDE: u64 = 256;
const INITIAL_MODEL_CAPACITY: u64 = 64;

struct Draw {
    key: MeshKey,
    offset: u32,
}

/// Draws every meshed node of a [`Stage`] with flat-coloured Lambert lighting.
///
/// Geometry is uploaded the first time its [`MeshKey`] is seen and cached
/// afterwards. Each draw gets its own slot in a dynamic-offset model buffer.
pub struct MeshPass {
    pipeline: wgpu::RenderPipeline,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,
    model_layout: wgpu::BindGroupLayout,
    model_buffer: wgpu::Buffer,
    model_bind_group: wgpu::BindGroup,
    model_capacity: u64,
    meshes: HashMap<MeshKey, Mesh>,
}

impl MeshPass {
    /// Build the pipeline and the scene and model uniform buffers.
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/scene.wgsl").into()),
        });

        let scene_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Scene Uniforms"),
            size: std::mem::size_of::<SceneUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &scene_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
        });

        let model_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Model Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ModelUniforms>() as u64
                    ),
                },
                count: None,
            }],
        });
        let (model_buffer, model_bind_group) =
            create_model_buffer(device, &model_layout, INITIAL_MODEL_CAPACITY);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&scene_layout, &model_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[Vertex3d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.format(),
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            // Double-sided: the discs are flat and imported meshes may be open.
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            scene_buffer,
            scene_bind_group,
            model_layout,
            model_buffer,
            model_bind_group,
            model_capacity: INITIAL_MODEL_CAPACITY,
            meshes: HashMap::new(),
        }
    }

    /// Number of distinct geometries uploaded so far.
    pub fn uploaded(&self) -> usize {
        self.meshes.len()
    }

    /// Upload new geometry and write this frame's uniforms. Call before the render pass.
    fn prepare(&mut self, gpu: &GpuContext, stage: &Stage, camera: &Camera) -> Vec<Draw> {
        let scene = SceneUniforms::new(stage, camera);
        gpu.queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::bytes_of(&scene));

        let mut models = Vec::new();
        let mut keys = Vec::new();
        stage.visit_meshes(|node, world| {
            let Some(mesh) = &node.mesh else { return };
            let Some(uniforms) = ModelUniforms::new(world, mesh.color) else {
                return;
            };
            self.meshes
                .entry(mesh.key)
                .or_insert_with(|| Mesh::from_geometry(gpu, &mesh.geometry));
            models.push(uniforms);
            keys.push(mesh.key);
        });

        let needed = models.len() as u64;
        if needed > self.model_capacity {
            let capacity = needed.next_power_of_two();
            let (buffer, bind_group) = create_model_buffer(&gpu.device, &self.model_layout, capacity);
            self.model_buffer = buffer;
            self.model_bind_group = bind_group;
            self.model_capacity = capacity;
        }

        let mut bytes = vec![0u8; (needed * MODEL_STRIDE) as usize];
        for (i, model) in models.iter().enumerate() {
            let start = i * MODEL_STRIDE as usize;
            let src = bytemuck::bytes_of(model);
            bytes[start..start + src.len()].copy_from_slice(src);
        }
        if !bytes.is_empty() {
            gpu.queue.write_buffer(&self.model_buffer, 0, &bytes);
        }

        keys.into_iter()
            .enumerate()
            .map(|(i, key)| Draw {
                key,
                offset: (i as u64 * MODEL_STRIDE) as u32,
            })
            .collect()
    }

    /// Draw every mesh of `stage` through `camera`.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        stage: &Stage,
        camera: &Camera,
    ) {
        let draws = self.prepare(gpu, stage, camera);

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Mesh Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &gpu.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.scene_bind_group, &[]);
        for draw in &draws {
            let Some(mesh) = self.meshes.get(&draw.key) else {
                continue;
            };
            pass.set_bind_group(1, &self.model_bind_group, &[draw.offset]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

fn create_model_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    capacity: u64,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Model Uniforms"),
        size: capacity * MODEL_STRIDE,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Model Bind Group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<ModelUniforms>() as u64),
            }),
        }],
    });
    (buffer, bind_group)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn uniforms_fit_the_dynamic_stride() {
        assert!(std::mem::size_of::<ModelUniforms>() as u64 <= MODEL_STRIDE);
        assert_eq!(std::mem::size_of::<SceneUniforms>() % 16, 0);
    }

    #[test]
    fn zero_scale_nodes_are_skipped() {
        let hidden = Mat4::from_scale(Vec3::ZERO);
        assert!(ModelUniforms::new(hidden, [1.0; 4]).is_none());
        assert!(ModelUniforms::new(Mat4::IDENTITY, [1.0; 4]).is_some());
    }
}
