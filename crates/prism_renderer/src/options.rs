//! Render configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default maximum path depth.
pub const DEFAULT_MAX_DEPTH: u32 = 8;

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 32;

/// Everything a render needs besides the scene data on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Built-in scene name
    pub scene: String,
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u32,
    /// Drop emission seen directly by the camera
    pub indirect_only: bool,
    /// Paths are cut off after this many vertices
    pub max_depth: u32,
    pub tile_size: u32,
    /// Worker count; `None` uses one per hardware thread
    pub threads: Option<usize>,
    /// Mixed into every worker's stream seed
    pub seed: u32,
    /// When off, flux is weighted by the cosine to the camera axis
    pub flat_field_correction: bool,
    /// Print the progress/ETA line to stderr
    pub report_progress: bool,
    /// Root directory for scene data files
    pub data_dir: PathBuf,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scene: "cornell".to_string(),
            width: 512,
            height: 512,
            samples_per_pixel: 16,
            indirect_only: false,
            max_depth: DEFAULT_MAX_DEPTH,
            tile_size: DEFAULT_TILE_SIZE,
            threads: None,
            seed: 0,
            flat_field_correction: true,
            report_progress: true,
            data_dir: PathBuf::from("data"),
        }
    }
}

impl RenderOptions {
    /// Worker count to spawn.
    pub fn thread_count(&self) -> usize {
        self.threads
            .filter(|&n| n > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
    }
}
