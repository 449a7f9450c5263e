//! Camera for ray generation.

use prism_math::{Mat4, Ray, Vec2, Vec3, Vec4};
use rand::RngCore;

use crate::random::uniform01;

/// Pinhole camera that un-projects framebuffer coordinates through the
/// inverse view-projection matrix.
///
/// Framebuffer row 0 is the bottom of the view.
#[derive(Debug, Clone)]
pub struct Camera {
    // Image settings
    pub image_width: u32,
    pub image_height: u32,

    // Camera positioning
    position: Vec3,
    forward: Vec3,
    up: Vec3,

    // Lens settings
    vfov: f32, // Vertical field of view in degrees
    near: f32,
    far: f32,

    // Cached computed values (set by initialize())
    view: Mat4,
    projection: Mat4,
    inv_view_projection: Mat4,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        let mut camera = Self {
            image_width: 512,
            image_height: 512,
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            up: Vec3::Y,
            vfov: 45.0,
            near: 0.1,
            far: 1.0,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            inv_view_projection: Mat4::IDENTITY,
        };
        camera.initialize();
        camera
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Set camera position and orientation. `forward` need not be normalized.
    pub fn with_position(mut self, position: Vec3, forward: Vec3, up: Vec3) -> Self {
        self.position = position;
        self.forward = forward.normalize();
        self.up = up;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, near: f32, far: f32) -> Self {
        self.vfov = vfov;
        self.near = near;
        self.far = far;
        self
    }

    /// Recompute the cached matrices (must be called after the `with_*` setters).
    pub fn initialize(&mut self) {
        let aspect = self.image_width as f32 / self.image_height.max(1) as f32;
        self.projection = Mat4::perspective_rh_gl(self.vfov.to_radians(), aspect, self.near, self.far);
        self.view = Mat4::look_at_rh(self.position, self.position + self.forward, self.up);
        self.inv_view_projection = (self.projection * self.view).inverse();
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn vfov(&self) -> f32 {
        self.vfov
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// World-space direction through framebuffer coordinate `st` in [0, 1]².
    pub fn direction_through(&self, st: Vec2) -> Vec3 {
        let ndc = st * 2.0 - Vec2::ONE;
        let point = self.inv_view_projection * Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        let point = point.truncate() / point.w;
        (point - self.position).normalize()
    }

    /// Ray through pixel (i, j) offset by `jitter` in [0, 1)².
    pub fn ray_through_pixel(&self, i: u32, j: u32, jitter: Vec2) -> Ray {
        let st = Vec2::new(
            (i as f32 + jitter.x) / self.image_width as f32,
            (j as f32 + jitter.y) / self.image_height as f32,
        );
        Ray::new(self.position, self.direction_through(st))
    }

    /// Generate a ray for pixel (i, j) with random sampling.
    pub fn get_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Ray {
        let jitter = Vec2::new(uniform01(rng), uniform01(rng));
        self.ray_through_pixel(i, j, jitter)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
