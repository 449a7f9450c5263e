//! Hittable trait and HitRecord for ray-primitive intersection.

use prism_math::{Ray, Vec2, Vec3};

use crate::primitive::PrimitiveId;

/// Record of the nearest intersection found so far along a ray.
///
/// Starts at infinite distance; each candidate only overwrites it when it is
/// strictly closer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Distance along the ray to the hit
    pub dist: f32,
    /// Primitive that owns the hit
    pub prim: Option<PrimitiveId>,
    /// Geometric face normal (not flipped toward the ray)
    pub normal: Vec3,
    /// Interpolated surface coordinate
    pub st: Vec2,
}

impl Default for HitRecord {
    fn default() -> Self {
        Self {
            dist: f32::INFINITY,
            prim: None,
            normal: Vec3::ZERO,
            st: Vec2::ZERO,
        }
    }
}

impl HitRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_hit(&self) -> bool {
        self.prim.is_some()
    }
}

/// Sphere enclosing a primitive, used to sample directions toward lights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    /// Centroid of `points`, with radius reaching the farthest point.
    pub fn from_points(points: &[Vec3]) -> Self {
        if points.is_empty() {
            return Self {
                center: Vec3::ZERO,
                radius: 0.0,
            };
        }

        let center = points.iter().copied().sum::<Vec3>() / points.len() as f32;
        let radius = points
            .iter()
            .map(|p| p.distance(center))
            .fold(0.0, f32::max);
        Self { center, radius }
    }
}

/// Trait for geometry that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Test `ray` against this geometry.
    ///
    /// Returns true and updates `rec` (distance, normal, surface coordinate)
    /// only if the hit is closer than `rec.dist`. `rec.prim` is left to the
    /// caller.
    fn hit(&self, ray: &Ray, rec: &mut HitRecord) -> bool;

    /// Sphere enclosing the geometry.
    fn bounding_sphere(&self) -> BoundingSphere;
}
