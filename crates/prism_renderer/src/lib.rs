//! Prism Renderer - spectral CPU path tracing
//!
//! A Monte Carlo path tracer that carries four hero wavelengths along every
//! path, samples lights explicitly at each diffuse vertex, and renders tiles
//! in parallel on a fixed pool of worker threads.
//!
//! ```ignore
//! use prism_renderer::{PngSink, RenderOptions, Renderer};
//!
//! let options = RenderOptions::default();
//! let mut renderer = Renderer::from_options(options)?.with_sink(PngSink::new("out.png"));
//! renderer.render()?;
//! ```

pub mod camera;
pub mod framebuffer;
pub mod hittable;
pub mod integrator;
pub mod material;
pub mod options;
pub mod primitive;
pub mod progress;
pub mod quad;
pub mod random;
pub mod renderer;
pub mod scene;
pub mod scenes;
pub mod tile;
pub mod triangle;

pub use camera::Camera;
pub use framebuffer::Framebuffer;
pub use hittable::{BoundingSphere, HitRecord, Hittable};
pub use integrator::PathIntegrator;
pub use material::{LambertianSpectral, LambertianTextured, Material, MaterialId};
pub use options::RenderOptions;
pub use primitive::{Primitive, PrimitiveId, Shape};
pub use quad::Quad;
pub use random::RandomStream;
pub use renderer::{FrameSink, PngSink, RenderError, RenderResult, RenderState, Renderer, SinkResult};
pub use scene::{Scene, SceneBuilder, SceneError, SceneResult};
pub use scenes::{load_scene, SCENE_NAMES};
pub use tile::{generate_tiles, Tile};
pub use triangle::{Triangle, Vertex};

/// Re-export common math types from prism_math
pub use prism_math::{Ray, Vec2, Vec3};

/// Minimum hit distance, and the pdf below which a direction sample is
/// rejected.
pub const EPSILON: f32 = 1e-4;
