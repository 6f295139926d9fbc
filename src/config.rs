//! Runtime configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a
//! valid configuration:
//!
//! ```ignore
//! let config = StageConfig::load_optional(std::env::args().nth(1).as_deref().map(Path::new))?
//!     .title("Portfolio")
//!     .size(1440, 900);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::device::BREAKPOINT;
use crate::error::ConfigError;

/// Environment variable consulted for the config path when no argument is given.
pub const CONFIG_ENV: &str = "DIORAMA_CONFIG";

/// How the session waits for readiness conditions (assets loaded, main scene reached).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessStrategy {
    /// React as soon as the condition becomes true.
    #[default]
    Event,
    /// Re-check on a fixed interval.
    Poll,
}

/// Which edge of the viewport a section hugs. The rounded corners sit on the
/// opposite, inner side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionSide {
    Left,
    Right,
}

/// Vertical page layout in viewport heights.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Height of the hero region above the first section.
    pub hero_vh: f32,
    /// Height of each of the three sections.
    pub section_vh: [f32; 3],
    /// Spacing between consecutive sections and after the last one.
    pub gap_vh: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            hero_vh: 1.0,
            section_vh: [3.0, 3.0, 3.0],
            gap_vh: 1.0,
        }
    }
}

/// Text content split into glyphs for the staggered reveals.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub intro: String,
    pub hero_title: String,
    pub hero_description: String,
    pub second_description: String,
    pub second_subheading: String,
    pub second_sub: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            intro: "Welcome to my room".into(),
            hero_title: "Creative Developer".into(),
            hero_description: "Building things for the web".into(),
            second_description: "Portfolio".into(),
            second_subheading: "Scroll to explore".into(),
            second_sub: "Three rooms, one story".into(),
        }
    }
}

/// Configuration for a choreographed stage and its host window.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Device breakpoint in logical pixels.
    pub breakpoint: f32,
    pub primary_asset: PathBuf,
    pub environment_asset: PathBuf,
    pub readiness: ReadinessStrategy,
    /// Asset gate polling interval in milliseconds when polling.
    pub asset_poll_ms: u64,
    /// Main-scene gate polling interval in milliseconds when polling.
    pub main_scene_poll_ms: u64,
    /// Fraction of the remaining distance the rotation smoother covers per frame.
    pub smoothing: f32,
    pub coarse_sensitivity: f32,
    pub fine_sensitivity: f32,
    pub layout: LayoutConfig,
    pub sides: [SectionSide; 3],
    pub text: TextConfig,
    /// Shown once after the first reveal settles.
    pub advisory: String,
    pub max_pixel_ratio: f32,
    /// Background colour as `#rrggbb`.
    pub background: String,
    /// Render through the free-orbit camera instead of the point-of-view camera.
    pub debug_orbit: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            title: "diorama".into(),
            width: 1280,
            height: 800,
            breakpoint: BREAKPOINT,
            primary_asset: PathBuf::from("assets/cube.glb"),
            environment_asset: PathBuf::from("assets/room_prototype.glb"),
            readiness: ReadinessStrategy::Event,
            asset_poll_ms: 100,
            main_scene_poll_ms: 200,
            smoothing: 0.1,
            coarse_sensitivity: 0.2,
            fine_sensitivity: 0.02,
            layout: LayoutConfig::default(),
            sides: [SectionSide::Left, SectionSide::Right, SectionSide::Left],
            text: TextConfig::default(),
            advisory: "Updates are in progress with the possibility of consulting the code \
                       or the final result of my various works"
                .into(),
            max_pixel_ratio: 2.0,
            background: "#0e103d".into(),
            debug_orbit: false,
        }
    }
}

impl StageConfig {
    /// Default configuration. Chain the builder setters to adjust it.
    ///
    /// # Example
    /// ```
    /// use diorama::{ReadinessStrategy, StageConfig};
    ///
    /// let config = StageConfig::new()
    ///     .title("Room")
    ///     .size(1280, 720)
    ///     .readiness(ReadinessStrategy::Poll);
    /// assert_eq!(config.width, 1280);
    /// assert_eq!(config.asset_poll_interval().as_millis(), 100);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Load `path` if given, falling back to `$DIORAMA_CONFIG`, then defaults.
    pub fn load_optional(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a JSON string.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        parse_hex_color(&config.background)
            .ok_or_else(|| ConfigError::InvalidColor(config.background.clone()))?;
        Ok(config)
    }

    /// Window title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Initial window size in logical pixels.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Width below which the viewport counts as mobile.
    pub fn breakpoint(mut self, breakpoint: f32) -> Self {
        self.breakpoint = breakpoint;
        self
    }

    /// How the session waits for assets and the main scene.
    pub fn readiness(mut self, readiness: ReadinessStrategy) -> Self {
        self.readiness = readiness;
        self
    }

    /// Render through the free-orbit camera instead of the point-of-view camera.
    pub fn debug_orbit(mut self, enabled: bool) -> Self {
        self.debug_orbit = enabled;
        self
    }

    /// Retry interval of the asset gate in [`ReadinessStrategy::Poll`] mode.
    pub fn asset_poll_interval(&self) -> Duration {
        Duration::from_millis(self.asset_poll_ms)
    }

    /// Retry interval of the main-scene gate in [`ReadinessStrategy::Poll`] mode.
    pub fn main_scene_poll_interval(&self) -> Duration {
        Duration::from_millis(self.main_scene_poll_ms)
    }

    /// Background colour as linear RGBA. Falls back to black on a malformed value.
    pub fn background_color(&self) -> [f32; 4] {
        parse_hex_color(&self.background).unwrap_or([0.0, 0.0, 0.0, 1.0])
    }
}

/// Parse `#rrggbb` into linear RGBA.
pub fn parse_hex_color(text: &str) -> Option<[f32; 4]> {
    let hex = text.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    Some(hex_to_linear(value))
}

/// Convert a packed `0xRRGGBB` sRGB colour to linear RGBA.
pub fn hex_to_linear(value: u32) -> [f32; 4] {
    let channel = |shift: u32| {
        let c = ((value >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(16), channel(8), channel(0), 1.0]
}
