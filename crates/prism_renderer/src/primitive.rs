//! Scene primitives: a shape plus the material it is made of.

use prism_math::Ray;

use crate::hittable::{BoundingSphere, HitRecord, Hittable};
use crate::material::MaterialId;
use crate::quad::Quad;
use crate::triangle::Triangle;

/// Handle to a primitive in the scene's primitive list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveId(pub(crate) usize);

impl PrimitiveId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Triangle(Triangle),
    Quad(Quad),
}

impl Hittable for Shape {
    fn hit(&self, ray: &Ray, rec: &mut HitRecord) -> bool {
        match self {
            Shape::Triangle(tri) => tri.hit(ray, rec),
            Shape::Quad(quad) => quad.hit(ray, rec),
        }
    }

    fn bounding_sphere(&self) -> BoundingSphere {
        match self {
            Shape::Triangle(tri) => tri.bounding_sphere(),
            Shape::Quad(quad) => quad.bounding_sphere(),
        }
    }
}

impl From<Triangle> for Shape {
    fn from(tri: Triangle) -> Self {
        Shape::Triangle(tri)
    }
}

impl From<Quad> for Shape {
    fn from(quad: Quad) -> Self {
        Shape::Quad(quad)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub shape: Shape,
    pub material: MaterialId,
    /// Set when the material emits light
    pub is_light: bool,
}
