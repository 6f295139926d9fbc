//! The assembled scene: objects, cameras, lights, decorative discs and page.
//!
//! [`Stage::assemble`] runs exactly once, after the asset gate has handed
//! over both objects. From then on the choreography mutates the stage only
//! through [`Stage::write`], addressing scalars by [`Property`].

use std::f32::consts::PI;

use glam::{Mat4, Vec3};

use crate::assets::SceneAssets;
use crate::camera::Camera;
use crate::config::{StageConfig, hex_to_linear};
use crate::device::Viewport;
use crate::geometry::RawGeometry;
use crate::lights::{AmbientLight, DirectionalLight, PointLight, SpotLight};
use crate::orbit_camera::OrbitControls;
use crate::page::Page;
use crate::property::{Channel, Property, Target};
use crate::scene_graph::{NodeMesh, SceneNode, Transform};

/// Point-of-view camera resting position.
pub const POV_POSITION: Vec3 = Vec3::new(0.0, 0.70, 1.75);
/// Point-of-view camera pitch.
pub const POV_PITCH: f32 = -PI / 12.0;
/// Free-orbit camera starting position, looking at the origin.
pub const ORBIT_POSITION: Vec3 = Vec3::new(5.0, 5.0, 5.0);

const DISC_RADIUS: f32 = 5.0;
const DISC_SEGMENTS: u32 = 64;
const DISC_COLORS: [u32; 3] = [0x0a1838, 0x14243e, 0x385b84];
const DISC_POSITIONS: [Vec3; 3] = [
    Vec3::new(0.0, -0.29, -1.0),
    Vec3::new(2.0, -0.28, -1.0),
    Vec3::new(0.0, -0.27, -1.0),
];

/// Everything the choreography animates and the renderer draws.
#[derive(Clone, Debug)]
pub struct Stage {
    pub background: [f32; 4],
    pub primary: SceneNode,
    pub environment: SceneNode,
    pub pov_camera: Camera,
    pub orbit: OrbitControls,
    pub spot: SpotLight,
    pub moon: DirectionalLight,
    pub ambient: AmbientLight,
    pub point: PointLight,
    pub discs: [SceneNode; 3],
    pub page: Page,
}

impl Stage {
    /// Build the scene around the loaded objects.
    pub fn assemble(
        assets: SceneAssets,
        viewport: &Viewport,
        config: &StageConfig,
        page: Page,
    ) -> Self {
        let aspect = viewport.aspect();

        let mut pov_camera = Camera::new()
            .with_fov(45.0)
            .with_clip(0.1, 10.0)
            .with_aspect(aspect)
            .at(POV_POSITION);
        pov_camera.rotation.x = POV_PITCH;

        let orbit_lens = Camera::new()
            .with_fov(45.0)
            .with_clip(0.1, 100.0)
            .with_aspect(aspect)
            .at(ORBIT_POSITION)
            .looking_at(Vec3::ZERO);
        let orbit = OrbitControls::new(orbit_lens, Vec3::ZERO)
            .damping(Some(0.05))
            .zoom(false);

        let disc = RawGeometry::disc(DISC_RADIUS, DISC_SEGMENTS);
        let discs = std::array::from_fn(|i| {
            SceneNode::new(format!("disc{}", i + 1))
                .with_mesh(NodeMesh::new(disc.clone(), hex_to_linear(DISC_COLORS[i])))
                .with_transform(
                    Transform::from_position(DISC_POSITIONS[i])
                        .rotation(Vec3::new(-PI / 4.0, 0.0, 0.0))
                        .uniform_scale(0.0),
                )
        });

        log::info!(
            "Stage assembled ({} + {} nodes) at {}x{}",
            assets.primary.node_count(),
            assets.environment.node_count(),
            viewport.width,
            viewport.height
        );

        Self {
            background: config.background_color(),
            primary: assets.primary,
            environment: assets.environment,
            pov_camera,
            orbit,
            spot: SpotLight::desk(),
            moon: DirectionalLight::moon(),
            ambient: AmbientLight::moonlit(),
            point: PointLight::mailbox(),
            discs,
            page,
        }
    }

    /// Current value of `property`, or `None` if it has no target.
    pub fn read(&self, property: Property) -> Option<f32> {
        match property {
            Property::Transform {
                target,
                channel,
                axis,
            } => self.channel(target, channel).map(|v| axis.get(*v)),
            Property::PreloaderOpacity => Some(self.page.preloader_opacity),
            Property::ArrowOpacity => Some(self.page.arrow_opacity),
            Property::GlyphOffset { block, index } => self.page.glyph_offset(block, index),
            Property::CornerRadius { section, corner } => {
                self.page.sections.get(section).map(|s| s.radius(corner))
            }
            Property::ProgressBar(section) => self.page.sections.get(section).map(|s| s.progress),
        }
    }

    /// Set `property`. Returns false if it has no target.
    pub fn write(&mut self, property: Property, value: f32) -> bool {
        match property {
            Property::Transform {
                target,
                channel,
                axis,
            } => match self.channel_mut(target, channel) {
                Some(v) => {
                    axis.set(v, value);
                    true
                }
                None => false,
            },
            Property::PreloaderOpacity => {
                self.page.preloader_opacity = value;
                true
            }
            Property::ArrowOpacity => {
                self.page.arrow_opacity = value;
                true
            }
            Property::GlyphOffset { block, index } => {
                self.page.set_glyph_offset(block, index, value)
            }
            Property::CornerRadius { section, corner } => match self.page.sections.get_mut(section)
            {
                Some(panel) => {
                    *panel.radius_mut(corner) = value;
                    true
                }
                None => false,
            },
            Property::ProgressBar(section) => match self.page.sections.get_mut(section) {
                Some(panel) => {
                    panel.progress = value;
                    true
                }
                None => false,
            },
        }
    }

    fn channel(&self, target: Target, channel: Channel) -> Option<&Vec3> {
        let node = match target {
            Target::Primary => &self.primary,
            Target::Environment => &self.environment,
            Target::EnvironmentNode(sub) => self
                .environment
                .children
                .iter()
                .find(|c| c.name == sub.name())?,
            Target::Disc(i) => self.discs.get(i)?,
            Target::PovCamera => {
                return match channel {
                    Channel::Position => Some(&self.pov_camera.position),
                    Channel::Rotation => Some(&self.pov_camera.rotation),
                    Channel::Scale => None,
                };
            }
            Target::SpotLight => return point_only(channel, &self.spot.position),
            Target::SpotTarget => return point_only(channel, &self.spot.target),
            Target::PointLight => return point_only(channel, &self.point.position),
        };
        Some(node_channel(&node.transform, channel))
    }

    fn channel_mut(&mut self, target: Target, channel: Channel) -> Option<&mut Vec3> {
        let node = match target {
            Target::Primary => &mut self.primary,
            Target::Environment => &mut self.environment,
            Target::EnvironmentNode(sub) => self
                .environment
                .children
                .iter_mut()
                .find(|c| c.name == sub.name())?,
            Target::Disc(i) => self.discs.get_mut(i)?,
            Target::PovCamera => {
                return match channel {
                    Channel::Position => Some(&mut self.pov_camera.position),
                    Channel::Rotation => Some(&mut self.pov_camera.rotation),
                    Channel::Scale => None,
                };
            }
            Target::SpotLight => return point_only_mut(channel, &mut self.spot.position),
            Target::SpotTarget => return point_only_mut(channel, &mut self.spot.target),
            Target::PointLight => return point_only_mut(channel, &mut self.point.position),
        };
        Some(match channel {
            Channel::Position => &mut node.transform.position,
            Channel::Rotation => &mut node.transform.rotation,
            Channel::Scale => &mut node.transform.scale,
        })
    }

    /// Update both camera aspects after a resize.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.pov_camera.aspect = aspect;
        self.orbit.set_aspect(aspect);
    }

    /// The camera frames are rendered through.
    pub fn active_camera(&self, debug_orbit: bool) -> Camera {
        if debug_orbit {
            self.orbit.camera()
        } else {
            self.pov_camera
        }
    }

    /// Visit every drawable node with its world matrix.
    pub fn visit_meshes<F: FnMut(&SceneNode, Mat4)>(&self, mut f: F) {
        let mut visit = |node: &SceneNode, world: Mat4| {
            if node.mesh.is_some() {
                f(node, world);
            }
        };
        for root in [&self.primary, &self.environment]
            .into_iter()
            .chain(self.discs.iter())
        {
            root.visit(Mat4::IDENTITY, &mut visit);
        }
    }
}

fn node_channel(transform: &Transform, channel: Channel) -> &Vec3 {
    match channel {
        Channel::Position => &transform.position,
        Channel::Rotation => &transform.rotation,
        Channel::Scale => &transform.scale,
    }
}

fn point_only(channel: Channel, position: &Vec3) -> Option<&Vec3> {
    (channel == Channel::Position).then_some(position)
}

fn point_only_mut(channel: Channel, position: &mut Vec3) -> Option<&mut Vec3> {
    (channel == Channel::Position).then_some(position)
}
