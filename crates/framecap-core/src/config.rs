use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Backend, WindowGeometry};

/// How `init` validates the window geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryPolicy {
    /// Every geometry is accepted.
    #[default]
    Permissive,
    /// Width and height must both be multiples of 2.
    #[serde(alias = "requireEven")]
    RequireEven,
}

impl GeometryPolicy {
    pub fn accepts(&self, geometry: &WindowGeometry) -> bool {
        match self {
            Self::Permissive => true,
            Self::RequireEven => geometry.is_even(),
        }
    }
}

/// Capture session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    #[serde(alias = "geometryPolicy")]
    pub geometry_policy: GeometryPolicy,
    /// Keep the canonical buffer current on draw frames and re-present it
    /// on non-draw frames.
    #[serde(alias = "saveScreenPixels")]
    pub save_screen_pixels: bool,
    #[serde(alias = "targetFPS", alias = "targetFps")]
    pub target_fps: u32,
    pub frames: u32,
    pub backend: Option<Backend>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            geometry_policy: GeometryPolicy::Permissive,
            save_screen_pixels: true,
            target_fps: 60,
            frames: 8,
            backend: None,
        }
    }
}

impl CaptureConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Reads a JSON config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Interval between frames in microseconds.
    pub fn frame_interval_us(&self) -> u64 {
        1_000_000 / self.target_fps.max(1) as u64
    }
}
