use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use prism_renderer::{PngSink, RenderOptions, RenderState, Renderer, SCENE_NAMES};

/// Spectral path tracer
#[derive(Parser, Debug)]
#[command(name = "prism", version, about, long_about = None)]
struct Args {
    /// Built-in scene to render (cornell, cornell-srgb, plane-srgb, white-point)
    #[arg(short, long)]
    scene: Option<String>,

    /// Image width in pixels
    #[arg(short = 'W', long)]
    width: Option<u32>,

    /// Image height in pixels
    #[arg(short = 'H', long)]
    height: Option<u32>,

    /// Samples per pixel
    #[arg(long, visible_alias = "spp")]
    samples: Option<u32>,

    /// Output PNG path
    #[arg(short, long, default_value = "output.png")]
    output: PathBuf,

    /// Render only indirect illumination
    #[arg(long)]
    indirect_only: bool,

    /// Maximum path depth
    #[arg(long)]
    max_depth: Option<u32>,

    /// Tile edge length in pixels
    #[arg(long)]
    tile_size: Option<u32>,

    /// Worker threads (default: one per hardware thread)
    #[arg(long)]
    threads: Option<usize>,

    /// Base seed for the per-thread random streams
    #[arg(long)]
    seed: Option<u32>,

    /// Weight flux by the cosine to the camera axis
    #[arg(long)]
    no_flat_field: bool,

    /// Do not print the progress line
    #[arg(short, long)]
    quiet: bool,

    /// Directory holding scene data files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// JSON file with render options; flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Re-write the output image every N seconds while rendering
    #[arg(long, value_name = "SECONDS")]
    preview: Option<f64>,
}

impl Args {
    /// Defaults, then the config file, then flags.
    fn render_options(&self) -> Result<RenderOptions> {
        let mut options = match &self.config {
            Some(path) => load_config(path)?,
            None => RenderOptions::default(),
        };

        if let Some(scene) = &self.scene {
            options.scene = scene.clone();
        }
        if let Some(width) = self.width {
            options.width = width;
        }
        if let Some(height) = self.height {
            options.height = height;
        }
        if let Some(samples) = self.samples {
            options.samples_per_pixel = samples;
        }
        if let Some(max_depth) = self.max_depth {
            options.max_depth = max_depth;
        }
        if let Some(tile_size) = self.tile_size {
            options.tile_size = tile_size;
        }
        if let Some(threads) = self.threads {
            options.threads = Some(threads);
        }
        if let Some(seed) = self.seed {
            options.seed = seed;
        }
        if let Some(data_dir) = &self.data_dir {
            options.data_dir = data_dir.clone();
        }
        options.indirect_only |= self.indirect_only;
        if self.no_flat_field {
            options.flat_field_correction = false;
        }
        if self.quiet {
            options.report_progress = false;
        }

        Ok(options)
    }
}

fn load_config(path: &Path) -> Result<RenderOptions> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

/// Re-encode the in-progress image while the render runs.
///
/// Returns true if a preview may have landed after the final image.
fn run_preview(renderer: &Renderer, output: &Path, interval: Duration) -> bool {
    let staging = output.with_extension("preview.png");
    let mut stale = false;

    while renderer.state() == RenderState::Running {
        thread::sleep(interval);
        if renderer.state() != RenderState::Running {
            break;
        }

        let written = renderer
            .framebuffer()
            .save_png(&staging)
            .and_then(|()| fs::rename(&staging, output).map_err(image::ImageError::IoError));
        if let Err(err) = written {
            log::warn!("Preview write failed: {err}");
        }
        stale = renderer.state() != RenderState::Running;
    }

    stale
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let options = args.render_options()?;

    log::info!("Starting Prism");
    let mut renderer = Renderer::from_options(options)
        .with_context(|| format!("Failed to set up scene (available: {})", SCENE_NAMES.join(", ")))?
        .with_sink(PngSink::new(&args.output));

    renderer.start()?;

    let stale = match args.preview {
        Some(seconds) => {
            let interval = Duration::from_secs_f64(seconds.max(0.05));
            run_preview(&renderer, &args.output, interval)
        }
        None => false,
    };

    renderer.wait();

    if stale {
        renderer
            .framebuffer()
            .save_png(&args.output)
            .with_context(|| format!("Failed to write {}", args.output.display()))?;
    }

    Ok(())
}
