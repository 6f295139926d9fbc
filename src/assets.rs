//! Asset readiness gate.
//!
//! Scene assembly needs both the primary object and the environment. Each is
//! fetched and decoded on a worker thread by an [`AssetSource`]; results come
//! back over a channel and are written into their slot on the main thread by
//! [`AssetGate::pump`]. Slots fill in any order, each exactly once, and
//! [`AssetGate::take_ready`] hands out the assembled [`SceneAssets`] a single
//! time once both are loaded.
//!
//! ```ignore
//! let mut gate = AssetGate::new();
//! gate.register_load(AssetHandle::Primary, FileSource::new("cube.glb"))?;
//! gate.register_load(AssetHandle::Environment, FileSource::new("room.glb"))?;
//!
//! // Every frame:
//! gate.pump()?;
//! if let Some(assets) = gate.take_ready() {
//!     // assemble the stage
//! }
//! ```

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use glam::Vec3;

use crate::config::ReadinessStrategy;
use crate::error::AssetError;
use crate::geometry::{load_scene_file, load_scene_gltf_bytes, load_scene_stl_bytes};
use crate::property::SubNode;
use crate::scene_graph::{SceneNode, Transform};

/// Resting position of both objects right after loading.
pub const LOADED_POSITION: Vec3 = Vec3::new(0.0, 0.15, 0.0);
/// Uniform scale of the primary object right after loading.
pub const PRIMARY_LOADED_SCALE: f32 = 0.2;
/// Uniform scale of the environment right after loading.
pub const ENVIRONMENT_LOADED_SCALE: f32 = 0.01;
/// Local height the decorative sub-nodes are parked at until the final section lifts them.
pub const OFFSTAGE_Y: f32 = 100.0;

/// The two scene objects the stage cannot start without.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetHandle {
    Primary,
    Environment,
}

impl AssetHandle {
    pub const ALL: [AssetHandle; 2] = [AssetHandle::Primary, AssetHandle::Environment];

    fn index(self) -> usize {
        match self {
            AssetHandle::Primary => 0,
            AssetHandle::Environment => 1,
        }
    }
}

impl std::fmt::Display for AssetHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetHandle::Primary => write!(f, "primary object"),
            AssetHandle::Environment => write!(f, "environment object"),
        }
    }
}

/// Load state of one handle.
#[derive(Debug, Default)]
pub enum AssetSlot {
    #[default]
    Unloaded,
    Loaded(SceneNode),
}

impl AssetSlot {
    /// True once the handle holds a node.
    pub fn is_loaded(&self) -> bool {
        matches!(self, AssetSlot::Loaded(_))
    }
}

/// Something that can produce a scene node, possibly slowly.
///
/// Sources run on a worker thread, so they must be `Send`.
pub trait AssetSource: Send + 'static {
    /// Short human-readable description for logs.
    fn describe(&self) -> String;

    /// Fetch and decode the node.
    fn load(self: Box<Self>) -> Result<SceneNode, AssetError>;
}

/// Loads a glTF/GLB or STL file, picking the decoder from the extension.
#[derive(Clone, Debug)]
pub struct FileSource {
    pub path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AssetSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(self: Box<Self>) -> Result<SceneNode, AssetError> {
        load_scene_file(&self.path)
    }
}

/// Encoding of an in-memory asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BytesFormat {
    Glb,
    Stl,
}

/// Decodes an asset that is already in memory.
#[derive(Clone, Debug)]
pub struct BytesSource {
    pub name: String,
    pub format: BytesFormat,
    pub bytes: Vec<u8>,
}

impl BytesSource {
    pub fn new(name: impl Into<String>, format: BytesFormat, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            format,
            bytes,
        }
    }
}

impl AssetSource for BytesSource {
    fn describe(&self) -> String {
        format!("{} ({} bytes)", self.name, self.bytes.len())
    }

    fn load(self: Box<Self>) -> Result<SceneNode, AssetError> {
        match self.format {
            BytesFormat::Glb => load_scene_gltf_bytes(&self.name, &self.bytes),
            BytesFormat::Stl => load_scene_stl_bytes(&self.name, &self.bytes),
        }
    }
}

/// Hands over a node built in code.
#[derive(Clone, Debug)]
pub struct NodeSource(pub SceneNode);

impl AssetSource for NodeSource {
    fn describe(&self) -> String {
        format!("prebuilt node '{}'", self.0.name)
    }

    fn load(self: Box<Self>) -> Result<SceneNode, AssetError> {
        Ok(self.0)
    }
}

/// Both required objects, configured and ready for assembly.
#[derive(Debug)]
pub struct SceneAssets {
    pub primary: SceneNode,
    pub environment: SceneNode,
}

type Completion = (AssetHandle, Result<SceneNode, AssetError>);

/// Collects asynchronous loads and reports when every handle is loaded.
pub struct AssetGate {
    slots: [AssetSlot; 2],
    workers: Vec<(AssetHandle, JoinHandle<()>)>,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
    taken: bool,
}

impl Default for AssetGate {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetGate {
    /// An empty gate with both handles unloaded.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            slots: Default::default(),
            workers: Vec::new(),
            sender,
            receiver,
            taken: false,
        }
    }

    /// Start loading `handle` on a worker thread.
    pub fn register_load<S: AssetSource>(
        &mut self,
        handle: AssetHandle,
        source: S,
    ) -> Result<(), AssetError> {
        log::info!("Loading {handle} from {}", source.describe());
        let sender = self.sender.clone();
        let source: Box<dyn AssetSource> = Box::new(source);
        let worker = std::thread::Builder::new()
            .name(format!("load-{handle}"))
            .spawn(move || {
                let result = source.load();
                // The gate may already be gone; nothing to report to then.
                let _ = sender.send((handle, result));
            })
            .map_err(AssetError::Spawn)?;
        self.workers.push((handle, worker));
        Ok(())
    }

    /// Drain finished loads into their slots. Returns how many completed.
    ///
    /// The first failure is returned as an error; it is fatal to startup.
    pub fn pump(&mut self) -> Result<usize, AssetError> {
        let (finished, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.workers)
            .into_iter()
            .partition(|(_, worker)| worker.is_finished());
        self.workers = running;

        let mut completed = 0;
        while let Ok((handle, result)) = self.receiver.try_recv() {
            self.complete(handle, result)?;
            completed += 1;
        }

        // Workers that had finished before the drain have delivered by now,
        // unless they panicked.
        for (handle, worker) in finished {
            let panicked = worker.join().is_err();
            if !self.taken && !self.slots[handle.index()].is_loaded() {
                let err = AssetError::Disconnected(handle);
                log::error!("{err} (panicked: {panicked})");
                return Err(err);
            }
        }
        Ok(completed)
    }

    /// Record the outcome of a load. Each handle is written at most once.
    pub fn complete(
        &mut self,
        handle: AssetHandle,
        result: Result<SceneNode, AssetError>,
    ) -> Result<(), AssetError> {
        let mut node = match result {
            Ok(node) => node,
            Err(err) => {
                log::error!("Failed to load {handle}: {err}");
                return Err(err);
            }
        };
        let slot = &mut self.slots[handle.index()];
        if slot.is_loaded() || self.taken {
            log::warn!("Ignoring duplicate completion for {handle}");
            return Ok(());
        }
        configure_loaded(handle, &mut node);
        log::info!("Loaded {handle} '{}' ({} nodes)", node.name, node.node_count());
        *slot = AssetSlot::Loaded(node);
        Ok(())
    }

    /// Load state of `handle`.
    pub fn slot(&self, handle: AssetHandle) -> &AssetSlot {
        &self.slots[handle.index()]
    }

    /// True once every handle is loaded.
    pub fn poll_ready(&self) -> bool {
        self.slots.iter().all(AssetSlot::is_loaded)
    }

    /// Move the loaded assets out. Returns `Some` exactly once.
    pub fn take_ready(&mut self) -> Option<SceneAssets> {
        if self.taken || !self.poll_ready() {
            return None;
        }
        let [primary, environment] = std::mem::take(&mut self.slots);
        match (primary, environment) {
            (AssetSlot::Loaded(primary), AssetSlot::Loaded(environment)) => {
                self.taken = true;
                Some(SceneAssets {
                    primary,
                    environment,
                })
            }
            (primary, environment) => {
                self.slots = [primary, environment];
                None
            }
        }
    }

    /// Whether the assets have already been handed out.
    pub fn is_taken(&self) -> bool {
        self.taken
    }
}

/// Apply the post-load pose: shadows everywhere, resting placement, and the
/// environment's decorative sub-nodes parked off-stage.
pub fn configure_loaded(handle: AssetHandle, node: &mut SceneNode) {
    node.set_shadows(true, true);
    match handle {
        AssetHandle::Primary => {
            node.transform = Transform::from_position(LOADED_POSITION)
                .uniform_scale(PRIMARY_LOADED_SCALE);
        }
        AssetHandle::Environment => {
            node.transform = Transform::from_position(LOADED_POSITION)
                .uniform_scale(ENVIRONMENT_LOADED_SCALE);
            for child in &mut node.children {
                if SubNode::from_name(&child.name).is_some() {
                    child.transform.position.y = OFFSTAGE_Y;
                }
            }
        }
    }
}

/// Fires at most once per interval of accumulated time.
///
/// With [`ReadinessStrategy::Event`] the interval is zero and every tick fires.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryTimer {
    interval: f32,
    elapsed: f32,
}

impl RetryTimer {
    /// `interval` in seconds.
    pub fn new(interval: f32) -> Self {
        Self {
            interval: interval.max(0.0),
            elapsed: 0.0,
        }
    }

    /// A timer that fires every tick for [`ReadinessStrategy::Event`], or
    /// every `interval` for [`ReadinessStrategy::Poll`].
    pub fn for_strategy(strategy: ReadinessStrategy, interval: std::time::Duration) -> Self {
        match strategy {
            ReadinessStrategy::Event => Self::new(0.0),
            ReadinessStrategy::Poll => Self::new(interval.as_secs_f32()),
        }
    }

    /// Interval in seconds.
    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Advance by `dt` seconds; true when a check is due.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.elapsed += dt.max(0.0);
        if self.elapsed + f32::EPSILON >= self.interval {
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct FailingSource;

    impl AssetSource for FailingSource {
        fn describe(&self) -> String {
            "failing".into()
        }

        fn load(self: Box<Self>) -> Result<SceneNode, AssetError> {
            Err(AssetError::Parse("corrupt".into()))
        }
    }

    struct PanickingSource;

    impl AssetSource for PanickingSource {
        fn describe(&self) -> String {
            "panicking".into()
        }

        fn load(self: Box<Self>) -> Result<SceneNode, AssetError> {
            panic!("decoder blew up")
        }
    }

    fn room() -> SceneNode {
        SceneNode::new("room")
            .with_child(SceneNode::new("desk"))
            .with_child(SceneNode::new("mailbox"))
            .with_child(SceneNode::new("tile2"))
    }

    fn pump_until<F: Fn(&AssetGate) -> bool>(
        gate: &mut AssetGate,
        done: F,
    ) -> Result<(), AssetError> {
        for _ in 0..400 {
            gate.pump()?;
            if done(gate) {
                return Ok(());
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("gate never settled");
    }

    #[test]
    fn ready_only_after_both_handles_load() {
        let mut gate = AssetGate::new();
        gate.register_load(AssetHandle::Environment, NodeSource(room()))
            .unwrap();
        pump_until(&mut gate, |g| g.slot(AssetHandle::Environment).is_loaded()).unwrap();
        assert!(!gate.poll_ready());
        assert!(gate.take_ready().is_none());

        gate.register_load(AssetHandle::Primary, NodeSource(SceneNode::new("cube")))
            .unwrap();
        pump_until(&mut gate, AssetGate::poll_ready).unwrap();

        let assets = gate.take_ready().unwrap();
        assert_eq!(assets.primary.name, "cube");
        assert!(gate.take_ready().is_none());
        assert!(gate.is_taken());
    }

    #[test]
    fn loaded_nodes_are_configured() {
        let mut gate = AssetGate::new();
        gate.complete(AssetHandle::Primary, Ok(SceneNode::new("cube")))
            .unwrap();
        gate.complete(AssetHandle::Environment, Ok(room())).unwrap();
        let assets = gate.take_ready().unwrap();

        assert_eq!(assets.primary.transform.scale, Vec3::splat(0.2));
        assert_eq!(assets.primary.transform.position, LOADED_POSITION);
        assert_eq!(assets.environment.transform.scale, Vec3::splat(0.01));
        assert!(assets.environment.find("desk").unwrap().cast_shadow);
        assert_eq!(assets.environment.find("mailbox").unwrap().transform.position.y, 100.0);
        assert_eq!(assets.environment.find("tile2").unwrap().transform.position.y, 100.0);
        assert_eq!(assets.environment.find("desk").unwrap().transform.position.y, 0.0);
    }

    #[test]
    fn draco_bytes_surface_as_unsupported_compression() {
        let json = br#"{
            "asset": { "version": "2.0" },
            "extensionsRequired": ["KHR_draco_mesh_compression"],
            "scenes": [{ "nodes": [] }]
        }"#;
        let mut gate = AssetGate::new();
        gate.register_load(
            AssetHandle::Environment,
            BytesSource::new("room", BytesFormat::Glb, json.to_vec()),
        )
        .unwrap();
        let err = pump_until(&mut gate, |_| false).unwrap_err();
        assert!(matches!(err, AssetError::UnsupportedCompression(_)), "{err:?}");
        assert!(!gate.slot(AssetHandle::Environment).is_loaded());
    }

    #[test]
    fn failure_is_fatal_and_reported() {
        let mut gate = AssetGate::new();
        gate.register_load(AssetHandle::Primary, FailingSource).unwrap();
        let err = pump_until(&mut gate, |_| false).unwrap_err();
        assert!(matches!(err, AssetError::Parse(_)));
        assert!(!gate.poll_ready());
    }

    #[test]
    fn panicking_loader_is_reported_as_disconnected() {
        let mut gate = AssetGate::new();
        gate.register_load(AssetHandle::Environment, PanickingSource)
            .unwrap();
        let err = pump_until(&mut gate, |_| false).unwrap_err();
        assert!(matches!(err, AssetError::Disconnected(AssetHandle::Environment)));
    }

    #[test]
    fn handles_are_written_once() {
        let mut gate = AssetGate::new();
        gate.complete(AssetHandle::Primary, Ok(SceneNode::new("first")))
            .unwrap();
        gate.complete(AssetHandle::Primary, Ok(SceneNode::new("second")))
            .unwrap();
        match gate.slot(AssetHandle::Primary) {
            AssetSlot::Loaded(node) => assert_eq!(node.name, "first"),
            AssetSlot::Unloaded => panic!("primary should be loaded"),
        }
    }

    #[test]
    fn retry_timer_fires_once_per_interval() {
        let mut timer = RetryTimer::for_strategy(ReadinessStrategy::Poll, Duration::from_millis(100));
        assert!(!timer.tick(0.05));
        assert!(timer.tick(0.05));
        assert!(!timer.tick(0.02));

        let mut eager = RetryTimer::for_strategy(ReadinessStrategy::Event, Duration::from_millis(100));
        assert!(eager.tick(0.0));
        assert!(eager.tick(0.001));
    }
}
