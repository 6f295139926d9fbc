//! Scene-graph nodes and spatial transforms.
//!
//! Loaded assets arrive as a tree of [`SceneNode`]s. Each node carries a
//! [`Transform`] relative to its parent, optional CPU geometry, and shadow
//! flags. The choreography addresses nodes by name (the environment's
//! decorative sub-nodes) and animates individual transform channels, so
//! rotation is stored as XYZ Euler angles rather than a quaternion.
//!
//! ```
//! use diorama::{SceneNode, Transform, Vec3};
//!
//! let mut room = SceneNode::new("room")
//!     .with_child(SceneNode::new("mailbox"))
//!     .with_child(SceneNode::new("desk"));
//! room.transform = Transform::new().position(Vec3::new(0.0, 0.15, 0.0)).uniform_scale(0.01);
//!
//! assert!(room.find("mailbox").is_some());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::geometry::RawGeometry;

/// Position, Euler rotation and scale of a node relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Translation.
    pub position: Vec3,
    /// Rotation in radians, applied in XYZ order.
    pub rotation: Vec3,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity rotation and scale at `position`.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Sets the Euler rotation (radians, XYZ order).
    pub fn rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Rotation as a quaternion.
    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Local-to-parent matrix (scale, then rotate, then translate).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }

    /// Build from a decomposed translation/quaternion/scale triple.
    pub fn from_decomposed(translation: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        let (x, y, z) = Quat::from_array(rotation).to_euler(EulerRot::XYZ);
        Self {
            position: Vec3::from(translation),
            rotation: Vec3::new(x, y, z),
            scale: Vec3::from(scale),
        }
    }
}

/// Stable identity of a piece of geometry, used to cache GPU uploads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshKey(u64);

impl MeshKey {
    /// Allocate a process-unique key.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// CPU geometry attached to a node.
#[derive(Clone, Debug)]
pub struct NodeMesh {
    pub key: MeshKey,
    pub geometry: Arc<RawGeometry>,
    /// Base colour (linear RGBA).
    pub color: [f32; 4],
}

impl NodeMesh {
    pub fn new(geometry: RawGeometry, color: [f32; 4]) -> Self {
        Self {
            key: MeshKey::next(),
            geometry: Arc::new(geometry),
            color,
        }
    }
}

/// A named node in a loaded scene.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub mesh: Option<NodeMesh>,
    pub children: Vec<SceneNode>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::new(),
            mesh: None,
            children: Vec::new(),
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_mesh(mut self, mesh: NodeMesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first search for a node named `name`, including `self`.
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Mutable variant of [`find`](Self::find).
    pub fn find_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(name))
    }

    /// Enable shadow casting and receiving on this node and every descendant.
    pub fn set_shadows(&mut self, cast: bool, receive: bool) {
        self.cast_shadow = cast;
        self.receive_shadow = receive;
        for child in &mut self.children {
            child.set_shadows(cast, receive);
        }
    }

    /// Visit every node with its world matrix.
    pub fn visit<F: FnMut(&SceneNode, Mat4)>(&self, parent: Mat4, f: &mut F) {
        let world = parent * self.transform.matrix();
        f(self, world);
        for child in &self.children {
            child.visit(world, f);
        }
    }

    /// Number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SceneNode::node_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn room() -> SceneNode {
        SceneNode::new("room")
            .with_child(SceneNode::new("walls").with_child(SceneNode::new("tile1")))
            .with_child(SceneNode::new("mailbox"))
    }

    #[test]
    fn find_searches_depth_first() {
        let room = room();
        assert_eq!(room.find("tile1").map(|n| n.name.as_str()), Some("tile1"));
        assert!(room.find("tile9").is_none());
        assert_eq!(room.node_count(), 4);
    }

    #[test]
    fn set_shadows_reaches_grandchildren() {
        let mut room = room();
        room.set_shadows(true, true);
        let tile = room.find("tile1").unwrap();
        assert!(tile.cast_shadow && tile.receive_shadow);
    }

    #[test]
    fn visit_composes_parent_matrices() {
        let mut room = room();
        room.transform = Transform::new().uniform_scale(0.01);
        room.find_mut("mailbox").unwrap().transform.position.y = 100.0;

        let mut mailbox_y = None;
        room.visit(Mat4::IDENTITY, &mut |node, world| {
            if node.name == "mailbox" {
                mailbox_y = Some(world.w_axis.y);
            }
        });
        assert_abs_diff_eq!(mailbox_y.unwrap(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn decomposed_quaternion_round_trips_to_euler() {
        let q = Quat::from_rotation_y(0.5);
        let t = Transform::from_decomposed([1.0, 2.0, 3.0], q.to_array(), [1.0; 3]);
        assert_abs_diff_eq!(t.rotation.y, 0.5, epsilon = 1e-5);
        assert_eq!(t.position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn mesh_keys_are_unique() {
        assert_ne!(MeshKey::next(), MeshKey::next());
    }
}
