//! Quad primitive: two triangles sharing the diagonal v0–v2.

use prism_math::Ray;

use crate::hittable::{BoundingSphere, HitRecord, Hittable};
use crate::triangle::{Triangle, Vertex};

#[derive(Debug, Clone, PartialEq)]
pub struct Quad {
    tri0: Triangle,
    tri1: Triangle,
}

impl Quad {
    /// Corners in order around the quad.
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex, v3: Vertex) -> Self {
        Self {
            tri0: Triangle::new(v0, v1, v2),
            tri1: Triangle::new(v0, v2, v3),
        }
    }

    pub fn triangles(&self) -> [&Triangle; 2] {
        [&self.tri0, &self.tri1]
    }
}

impl Hittable for Quad {
    /// First triangle, else second.
    fn hit(&self, ray: &Ray, rec: &mut HitRecord) -> bool {
        self.tri0.hit(ray, rec) || self.tri1.hit(ray, rec)
    }

    fn bounding_sphere(&self) -> BoundingSphere {
        let [v0, v1, v2] = self.tri0.positions();
        let v3 = self.tri1.positions()[2];
        BoundingSphere::from_points(&[v0, v1, v2, v3])
    }
}
