use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, ensure};
use serde::Deserialize;

use crate::error::Error;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    /// Root directory to scan recursively for images.
    pub photo_library_path: PathBuf,
    /// Grid (and window) width in pixels.
    pub width: u32,
    /// Grid (and window) height in pixels.
    pub height: u32,
    /// Number of grid columns.
    pub columns: u32,
    /// Number of rows visible at once.
    pub rows: u32,
    /// Tick rate of zoom/scroll animations.
    pub anim_fps: u32,
    /// Ticks per zoom transition; scrolls take a quarter of this.
    pub anim_steps: u32,
    /// Tick rate used while photos are still arriving from the loader.
    pub populate_fps: u32,
    /// Open the viewer borderless fullscreen.
    pub fullscreen: bool,
    /// Reload photos in place when their files change on disk.
    pub watch: bool,
    /// How many prepared cells the loader may queue ahead of the grid.
    pub loader_queue: usize,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(self.width > 0, "width must be greater than zero");
        ensure!(self.height > 0, "height must be greater than zero");
        ensure!(self.columns > 0, "columns must be greater than zero");
        ensure!(self.rows > 0, "rows must be greater than zero");
        ensure!(
            self.columns <= self.width && self.rows <= self.height,
            "grid cells must be at least one pixel in size"
        );
        ensure!(self.anim_fps > 0, "anim-fps must be greater than zero");
        ensure!(
            self.anim_steps >= 4,
            "anim-steps must be at least 4 so scrolls take one tick or more"
        );
        ensure!(self.populate_fps > 0, "populate-fps must be greater than zero");
        ensure!(self.loader_queue > 0, "loader-queue must be greater than zero");
        Ok(self)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            photo_library_path: PathBuf::new(),
            width: 640,
            height: 480,
            columns: 3,
            rows: 3,
            anim_fps: 50,
            anim_steps: 10,
            populate_fps: 20,
            fullscreen: false,
            watch: true,
            loader_queue: 8,
        }
    }
}

/// Timer interval for a tick rate, clamped so a zero rate never divides by zero.
pub fn fps_to_interval(fps: u32) -> Duration {
    Duration::from_millis(1000 / u64::from(fps.max(1)))
}
