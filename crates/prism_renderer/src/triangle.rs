//! Triangle primitive for ray tracing.
//!
//! Uses the watertight ray-triangle test of Woop, Benthin and Wald
//! (JCGT 2013): rays that pass exactly through a shared edge or vertex can
//! not slip between adjacent triangles.

use prism_math::{Ray, Vec2, Vec3};

use crate::hittable::{BoundingSphere, HitRecord, Hittable};
use crate::EPSILON;

/// A triangle corner: position plus surface coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub st: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, st: Vec2) -> Self {
        Self { position, st }
    }
}

/// A triangle primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    vertices: [Vertex; 3],
    /// Pre-computed face normal (unit length)
    normal: Vec3,
}

impl Triangle {
    /// Create a new triangle. The normal follows the winding v0 → v1 → v2.
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        let edge1 = v1.position - v0.position;
        let edge2 = v2.position - v0.position;

        Self {
            vertices: [v0, v1, v2],
            normal: edge1.cross(edge2).normalize_or_zero(),
        }
    }

    pub fn vertices(&self) -> &[Vertex; 3] {
        &self.vertices
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn positions(&self) -> [Vec3; 3] {
        self.vertices.map(|v| v.position)
    }
}

/// True if the edge functions disagree in sign.
fn mixed_signs(u: f64, v: f64, w: f64) -> bool {
    (u < 0.0 || v < 0.0 || w < 0.0) && (u > 0.0 || v > 0.0 || w > 0.0)
}

impl Hittable for Triangle {
    fn hit(&self, ray: &Ray, rec: &mut HitRecord) -> bool {
        let dir = ray.direction;

        // Project along the axis where the direction is largest.
        let abs_dir = dir.abs();
        let (mut kx, mut ky, kz) = if abs_dir.x > abs_dir.y {
            if abs_dir.x > abs_dir.z {
                (1, 2, 0)
            } else {
                (0, 1, 2)
            }
        } else if abs_dir.y > abs_dir.z {
            (2, 0, 1)
        } else {
            (0, 1, 2)
        };
        // Keep the winding
        if dir[kz] < 0.0 {
            std::mem::swap(&mut kx, &mut ky);
        }

        let sx = dir[kx] / dir[kz];
        let sy = dir[ky] / dir[kz];
        let sz = 1.0 / dir[kz];

        let [a, b, c] = self.positions().map(|p| p - ray.origin);

        let abc_kx = Vec3::new(a[kx], b[kx], c[kx]);
        let abc_ky = Vec3::new(a[ky], b[ky], c[ky]);
        let abc_kz = Vec3::new(a[kz], b[kz], c[kz]);
        let abc_x = abc_kx - sx * abc_kz;
        let abc_y = abc_ky - sy * abc_kz;

        // Scaled barycentric coordinates
        let mut uvw = abc_y.cross(abc_x);
        if uvw.x != 0.0 && uvw.y != 0.0 && uvw.z != 0.0 {
            if mixed_signs(uvw.x as f64, uvw.y as f64, uvw.z as f64) {
                return false;
            }
        } else {
            // On an edge in single precision; settle it in double.
            let uvw_d = abc_y.as_dvec3().cross(abc_x.as_dvec3());
            if mixed_signs(uvw_d.x, uvw_d.y, uvw_d.z) {
                return false;
            }
            uvw = uvw_d.as_vec3();
        }

        let det = uvw.x + uvw.y + uvw.z;
        if det.abs() <= EPSILON {
            return false;
        }

        // Scaled hit distance; must lie on the same side as det.
        let t = uvw.dot(sz * abc_kz);
        if det.is_sign_negative() != t.is_sign_negative() {
            return false;
        }

        let det_recip = 1.0 / det;
        let dist = t * det_recip;
        if dist.is_nan() || dist < EPSILON || dist >= rec.dist {
            return false;
        }

        let bary = uvw * det_recip;
        rec.dist = dist;
        rec.normal = self.normal;
        rec.st = bary.x * self.vertices[0].st
            + bary.y * self.vertices[1].st
            + bary.z * self.vertices[2].st;

        true
    }

    fn bounding_sphere(&self) -> BoundingSphere {
        BoundingSphere::from_points(&self.positions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle(z: f32) -> Triangle {
        Triangle::new(
            Vertex::new(Vec3::new(-1.0, -1.0, z), Vec2::new(0.0, 0.0)),
            Vertex::new(Vec3::new(1.0, -1.0, z), Vec2::new(1.0, 0.0)),
            Vertex::new(Vec3::new(0.0, 1.0, z), Vec2::new(0.5, 1.0)),
        )
    }

    #[test]
    fn test_triangle_hit() {
        let tri = unit_triangle(-1.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::new();

        assert!(tri.hit(&ray, &mut rec));
        assert!((rec.dist - 1.0).abs() < 1e-5);
        assert_eq!(rec.normal, Vec3::Z);
        // hit_record.prim is owned by the caller
        assert!(rec.prim.is_none());
    }

    #[test]
    fn test_back_face_hit() {
        // Same triangle seen from the other side; the normal is not flipped.
        let tri = unit_triangle(1.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let mut rec = HitRecord::new();

        assert!(tri.hit(&ray, &mut rec));
        assert!((rec.dist - 1.0).abs() < 1e-5);
        assert_eq!(rec.normal, Vec3::Z);
    }

    #[test]
    fn test_triangle_miss() {
        let tri = unit_triangle(-1.0);
        let mut rec = HitRecord::new();

        // Ray pointing away
        assert!(!tri.hit(&Ray::new(Vec3::ZERO, Vec3::Z), &mut rec));
        // Ray passing beside the triangle
        assert!(!tri.hit(&Ray::new(Vec3::new(3.0, 0.0, 0.0), -Vec3::Z), &mut rec));
        // Ray parallel to the plane
        assert!(!tri.hit(&Ray::new(Vec3::new(0.0, 0.0, -1.0), Vec3::X), &mut rec));
        assert_eq!(rec.dist, f32::INFINITY);
    }

    #[test]
    fn test_closest_hit_policy() {
        let tri = unit_triangle(-2.0);
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);

        let mut rec = HitRecord {
            dist: 1.5,
            ..HitRecord::default()
        };
        assert!(!tri.hit(&ray, &mut rec));
        assert_eq!(rec.dist, 1.5);

        let mut rec = HitRecord {
            dist: 3.0,
            ..HitRecord::default()
        };
        assert!(tri.hit(&ray, &mut rec));
        assert!((rec.dist - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_rejects_hits_at_origin() {
        let tri = unit_triangle(0.0);
        let mut rec = HitRecord::new();

        assert!(!tri.hit(&Ray::new(Vec3::ZERO, -Vec3::Z), &mut rec));
    }

    #[test]
    fn test_surface_coordinate_interpolation() {
        let tri = unit_triangle(-1.0);
        let mut rec = HitRecord::new();

        // Through vertex 1
        assert!(tri.hit(&Ray::new(Vec3::new(1.0, -1.0, 0.0), -Vec3::Z), &mut rec));
        assert!((rec.st - Vec2::new(1.0, 0.0)).length() < 1e-5);

        // Through the centroid
        let mut rec = HitRecord::new();
        let centroid = Vec3::new(0.0, -1.0 / 3.0, 0.0);
        assert!(tri.hit(&Ray::new(centroid, -Vec3::Z), &mut rec));
        assert!((rec.st - Vec2::new(0.5, 1.0 / 3.0)).length() < 1e-5);
    }

    #[test]
    fn test_degenerate_triangle() {
        let tri = Triangle::new(
            Vertex::new(Vec3::new(-1.0, 0.0, -1.0), Vec2::ZERO),
            Vertex::new(Vec3::new(0.0, 0.0, -1.0), Vec2::ZERO),
            Vertex::new(Vec3::new(1.0, 0.0, -1.0), Vec2::ZERO),
        );
        let mut rec = HitRecord::new();

        assert!(!tri.hit(&Ray::new(Vec3::ZERO, -Vec3::Z), &mut rec));
    }
}
