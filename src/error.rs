//! Error types for the choreography runtime.
//!
//! Each concern owns a small [`thiserror`] enum; [`Error`] aggregates them for
//! the host and the session so callers can propagate with `?`.

use std::path::PathBuf;

use crate::assets::AssetHandle;
use crate::intro::IntroPhase;

/// Errors raised while fetching or decoding a scene asset.
///
/// Any of these is fatal to scene startup: there is no fallback scene.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The file could not be read.
    #[error("failed to read asset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file extension does not map to a supported format.
    #[error("unknown asset format: '{0}'")]
    UnknownFormat(String),
    /// The data was recognised but could not be decoded.
    #[error("failed to parse asset: {0}")]
    Parse(String),
    /// The glTF importer rejected the document.
    #[error("glTF import failed: {0}")]
    Gltf(#[from] gltf::Error),
    /// The document relies on a mesh compression extension we cannot decode.
    #[error("unsupported mesh compression: {0}")]
    UnsupportedCompression(String),
    /// The document contains no scene to instantiate.
    #[error("asset contains no scene")]
    MissingScene,
    /// The loader thread could not be started.
    #[error("failed to spawn loader thread: {0}")]
    Spawn(#[source] std::io::Error),
    /// The loader thread went away before reporting a result.
    #[error("loader for {0} disconnected before completing")]
    Disconnected(AssetHandle),
}

/// Errors raised while loading a [`StageConfig`](crate::StageConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid colour '{0}', expected #rrggbb")]
    InvalidColor(String),
}

/// An intro transition that would break phase monotonicity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal intro transition {from:?} -> {to:?}")]
pub struct IntroError {
    pub from: IntroPhase,
    pub to: IntroPhase,
}

/// Crate-level error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Intro(#[from] IntroError),
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
