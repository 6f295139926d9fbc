//! # Diorama
//!
//! **A scroll-choreographed 3D scene runtime.**
//!
//! Load two objects, play a one-shot intro once both are in, wait for the
//! visitor's first scroll, then let the page's scroll position drive the
//! camera and lights through three sections, with different poses per
//! device category.
//!
//! ## Quick Start
//!
//! ```no_run
//! use diorama::StageConfig;
//!
//! fn main() -> diorama::Result<()> {
//!     let config = StageConfig::new().title("Room").size(1280, 720);
//!     diorama::run_with_config(config)
//! }
//! ```
//!
//! ## Headless
//!
//! Everything except the host is GPU-free. A [`Session`] can be driven from
//! tests with in-memory sources:
//!
//! ```no_run
//! use diorama::{NodeSource, SceneNode, Session, StageConfig, Viewport};
//!
//! let mut session = Session::new(StageConfig::default(), Viewport::new(1200.0, 800.0));
//! session
//!     .load(NodeSource(SceneNode::new("cube")), NodeSource(SceneNode::new("room")))
//!     .unwrap();
//! session.update(1.0 / 60.0).unwrap();
//! ```

mod app;
pub mod assets;
pub mod binder;
pub mod camera;
pub mod config;
pub mod device;
pub mod error;
pub mod geometry;
pub mod gesture;
mod gpu;
pub mod input;
pub mod intro;
pub mod lights;
mod mesh;
pub mod orbit_camera;
pub mod page;
pub mod presets;
pub mod property;
pub mod render;
pub mod scene_graph;
pub mod scroll;
pub mod sequence;
pub mod session;
pub mod smoother;
pub mod stage;
pub mod timeline;
pub mod tween;

pub use app::{run, run_with_config};
pub use assets::{
    AssetGate, AssetHandle, AssetSlot, AssetSource, BytesFormat, BytesSource, FileSource,
    NodeSource, RetryTimer, SceneAssets,
};
pub use binder::TimelineBinder;
pub use camera::Camera;
pub use config::{ReadinessStrategy, SectionSide, StageConfig};
pub use device::{DeviceCategory, Viewport};
pub use error::{AssetError, ConfigError, Error, IntroError, Result};
pub use geometry::RawGeometry;
pub use gpu::GpuContext;
pub use input::{Input, PointerEvent};
pub use intro::{IntroPhase, IntroSequencer};
pub use mesh::{Mesh, Vertex3d};
pub use orbit_camera::OrbitControls;
pub use page::Page;
pub use property::{Axis, Channel, Property, SubNode, Target, TextBlock};
pub use render::Renderer;
pub use scene_graph::{MeshKey, NodeMesh, SceneNode, Transform};
pub use scroll::{PageLayout, ScrollProvider, Trigger};
pub use sequence::Sequence;
pub use session::Session;
pub use smoother::{RotationGate, RotationSmoother, ScrollLerpState};
pub use stage::Stage;
pub use timeline::{ScrollTimeline, TimelineSpec};
pub use tween::{Cue, Easing, Tween};

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3};
