//! Multithreaded tile scheduler.
//!
//! `start()` cuts the image into tiles and spawns a fixed pool of worker
//! threads. Workers pop tiles off a shared list and render them with a private
//! random stream; the last worker to exit finalizes the render and hands the
//! framebuffer to the caller's `FrameSink`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::framebuffer::Framebuffer;
use crate::integrator::PathIntegrator;
use crate::options::RenderOptions;
use crate::progress::{format_duration, status_line};
use crate::random::RandomStream;
use crate::scene::{Scene, SceneError};
use crate::scenes::load_scene;
use crate::tile::{generate_tiles, Tile};

/// Minimum time between two progress lines.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("A render is already running")]
    AlreadyRunning,

    #[error("Samples per pixel must be at least 1")]
    ZeroSamples,

    #[error("Failed to spawn render worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

pub type RenderResult<T> = Result<T, RenderError>;

pub type SinkResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Receives the framebuffer once every worker has exited.
///
/// Called from the finalizing worker thread.
pub trait FrameSink: Send + Sync {
    fn consume(&self, framebuffer: &Framebuffer) -> SinkResult;
}

/// Writes the finished image to a PNG file.
#[derive(Debug, Clone)]
pub struct PngSink {
    path: PathBuf,
}

impl PngSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSink for PngSink {
    fn consume(&self, framebuffer: &Framebuffer) -> SinkResult {
        framebuffer.save_png(&self.path)?;
        log::info!("Saved {}", self.path.display());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Running,
    /// The last worker is emptying the tile list and handing off the image
    Completing,
}

// Job lifecycle, stored in an AtomicU8.
const JOB_RUNNING: u8 = 0;
const JOB_COMPLETING: u8 = 1;
const JOB_DONE: u8 = 2;

struct PendingTiles {
    tiles: Vec<Tile>,
    last_print: Instant,
}

/// State shared by the workers of one render.
struct RenderJob {
    scene: Arc<Scene>,
    options: RenderOptions,
    framebuffer: Arc<Framebuffer>,
    sink: Option<Arc<dyn FrameSink>>,

    pending: Mutex<PendingTiles>,
    total_tiles: usize,
    started: Instant,

    render_continue: AtomicBool,
    /// Set when the worker pool could not be brought up
    aborted: AtomicBool,
    num_rendering: AtomicUsize,
    tiles_completed: AtomicUsize,
    state: AtomicU8,
}

/// Retires its worker on drop, so a panicking worker still counts down.
struct WorkerGuard<'a>(&'a RenderJob);

impl Drop for WorkerGuard<'_> {
    fn drop(&mut self) {
        self.0.retire(1);
    }
}

impl RenderJob {
    fn new(
        scene: Arc<Scene>,
        options: RenderOptions,
        framebuffer: Arc<Framebuffer>,
        sink: Option<Arc<dyn FrameSink>>,
        thread_count: usize,
    ) -> Self {
        let mut tiles = generate_tiles(framebuffer.width(), framebuffer.height(), options.tile_size);
        // Popped from the back, so this renders row-major from row 0.
        tiles.reverse();
        let total_tiles = tiles.len();

        let started = Instant::now();
        Self {
            scene,
            options,
            framebuffer,
            sink,
            pending: Mutex::new(PendingTiles {
                tiles,
                last_print: started.checked_sub(Duration::from_secs(1)).unwrap_or(started),
            }),
            total_tiles,
            started,
            render_continue: AtomicBool::new(true),
            aborted: AtomicBool::new(false),
            num_rendering: AtomicUsize::new(thread_count),
            tiles_completed: AtomicUsize::new(0),
            state: AtomicU8::new(JOB_RUNNING),
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, PendingTiles> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_worker(&self, thread_index: u32) {
        let _guard = WorkerGuard(self);
        let mut rng = RandomStream::for_thread(thread_index, self.options.seed);
        let integrator = PathIntegrator::new(&self.scene, &self.options);
        let samples = self.options.samples_per_pixel;

        while self.render_continue.load(Ordering::Acquire) {
            let Some(tile) = self.next_tile() else {
                self.render_continue.store(false, Ordering::Release);
                break;
            };

            for (i, j) in tile.pixels() {
                let color = integrator.render_pixel(i, j, samples, &mut rng);
                self.framebuffer.set(i, j, color);
            }
            self.tiles_completed.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Pop the next tile, printing progress while the lock is held.
    fn next_tile(&self) -> Option<Tile> {
        let mut pending = self.lock_pending();

        let now = Instant::now();
        if self.options.report_progress && now.duration_since(pending.last_print) > PROGRESS_INTERVAL {
            self.print_progress(false);
            pending.last_print = now;
        }

        pending.tiles.pop()
    }

    /// Must be called with the pending lock held.
    fn print_progress(&self, last: bool) {
        let line = status_line(
            self.tiles_completed.load(Ordering::Acquire),
            self.total_tiles,
            self.started.elapsed(),
        );
        let mut stderr = std::io::stderr().lock();
        // Status output is best effort
        let _ = write!(stderr, "\r{line:<56}");
        if last {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    }

    fn stop(&self) {
        self.render_continue.store(false, Ordering::Release);
    }

    /// Give up after a failed spawn. `unspawned` workers never started; the
    /// ones that did drain out and the image is not handed to the sink.
    fn abort(&self, unspawned: usize) {
        self.aborted.store(true, Ordering::Release);
        self.stop();
        self.retire(unspawned);
    }

    /// Remove `count` workers from the live count; whoever takes it to zero
    /// finalizes.
    fn retire(&self, count: usize) {
        if self.num_rendering.fetch_sub(count, Ordering::AcqRel) == count {
            self.finalize();
        }
    }

    fn finalize(&self) {
        self.state.store(JOB_COMPLETING, Ordering::Release);

        {
            let mut pending = self.lock_pending();
            pending.tiles.clear();
            if self.options.report_progress {
                self.print_progress(true);
            }
        }

        if self.aborted.load(Ordering::Acquire) {
            log::warn!("Render aborted before all workers started; image not saved");
        } else if let Some(sink) = &self.sink {
            if let Err(err) = sink.consume(&self.framebuffer) {
                log::error!("Failed to hand off the rendered image: {err}");
            }
        }

        log::info!(
            "Render finished: {}/{} tiles in {}",
            self.tiles_completed.load(Ordering::Acquire),
            self.total_tiles,
            format_duration(self.started.elapsed())
        );
        self.state.store(JOB_DONE, Ordering::Release);
    }
}

/// Renders a scene into a shared framebuffer on a pool of worker threads.
pub struct Renderer {
    scene: Arc<Scene>,
    options: RenderOptions,
    framebuffer: Arc<Framebuffer>,
    sink: Option<Arc<dyn FrameSink>>,
    job: Option<Arc<RenderJob>>,
    workers: Vec<JoinHandle<()>>,
}

impl Renderer {
    /// Create a renderer for `scene`; the framebuffer takes the camera's
    /// resolution.
    pub fn new(scene: Scene, options: RenderOptions) -> Self {
        let camera = scene.camera();
        let framebuffer = Framebuffer::new(camera.image_width, camera.image_height);
        Self {
            scene: Arc::new(scene),
            options,
            framebuffer: Arc::new(framebuffer),
            sink: None,
            job: None,
            workers: Vec::new(),
        }
    }

    /// Build the built-in scene named by `options.scene`.
    pub fn from_options(options: RenderOptions) -> RenderResult<Self> {
        let scene = load_scene(&options.scene, &options)?;
        Ok(Self::new(scene, options))
    }

    pub fn with_sink(mut self, sink: impl FrameSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// The output image, readable while the render runs.
    pub fn framebuffer(&self) -> &Arc<Framebuffer> {
        &self.framebuffer
    }

    pub fn state(&self) -> RenderState {
        match self.job.as_ref().map(|job| job.state.load(Ordering::Acquire)) {
            Some(JOB_RUNNING) => RenderState::Running,
            Some(JOB_COMPLETING) => RenderState::Completing,
            _ => RenderState::Idle,
        }
    }

    /// True once the most recent render has been finalized.
    pub fn is_finished(&self) -> bool {
        self.job
            .as_ref()
            .is_some_and(|job| job.state.load(Ordering::Acquire) == JOB_DONE)
    }

    /// Fraction of tiles completed in the current or last render.
    pub fn progress(&self) -> f32 {
        match &self.job {
            Some(job) if job.total_tiles > 0 => {
                job.tiles_completed.load(Ordering::Acquire) as f32 / job.total_tiles as f32
            }
            Some(_) => 1.0,
            None => 0.0,
        }
    }

    /// Spawn the workers and return immediately.
    pub fn start(&mut self) -> RenderResult<()> {
        if self.state() != RenderState::Idle {
            return Err(RenderError::AlreadyRunning);
        }
        if self.options.samples_per_pixel == 0 {
            return Err(RenderError::ZeroSamples);
        }
        self.join_workers();

        let thread_count = self.options.thread_count();
        let job = Arc::new(RenderJob::new(
            Arc::clone(&self.scene),
            self.options.clone(),
            Arc::clone(&self.framebuffer),
            self.sink.clone(),
            thread_count,
        ));
        self.job = Some(Arc::clone(&job));

        log::info!(
            "Render started: {}x{} at {} spp, {} tiles on {} threads",
            self.framebuffer.width(),
            self.framebuffer.height(),
            self.options.samples_per_pixel,
            job.total_tiles,
            thread_count
        );

        for thread_index in 0..thread_count {
            let worker_job = Arc::clone(&job);
            let spawned = thread::Builder::new()
                .name(format!("prism-render-{thread_index}"))
                .spawn(move || worker_job.run_worker(thread_index as u32));
            match spawned {
                Ok(handle) => self.workers.push(handle),
                Err(err) => {
                    log::error!("Failed to spawn render worker {thread_index}: {err}");
                    job.abort(thread_count - thread_index);
                    return Err(RenderError::Spawn(err));
                }
            }
        }

        Ok(())
    }

    /// Ask the workers to exit after their current tile.
    pub fn stop(&self) {
        if let Some(job) = &self.job {
            job.stop();
        }
    }

    /// Block until every worker has exited.
    pub fn wait(&mut self) {
        self.join_workers();
    }

    fn join_workers(&mut self) {
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                log::error!("Render worker panicked");
            }
        }
    }

    /// Start and wait.
    pub fn render(&mut self) -> RenderResult<()> {
        self.start()?;
        self.wait();
        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.stop();
        self.join_workers();
    }
}
