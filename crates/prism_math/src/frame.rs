use crate::Vec3;

/// Orthonormal frame whose local +Y axis is a given unit vector.
///
/// Sampling routines generate directions around +Y; `to_world` rotates them
/// onto a surface normal or any other reference direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    tangent: Vec3,
    normal: Vec3,
    bitangent: Vec3,
}

impl Frame {
    /// Build a frame around `normal`, which must be normalized.
    ///
    /// Branchless construction from Duff et al., "Building an Orthonormal
    /// Basis, Revisited" (JCGT 2017).
    pub fn from_normal(normal: Vec3) -> Self {
        let sign = normal.z.signum();
        let a = -1.0 / (sign + normal.z);
        let b = normal.x * normal.y * a;

        let tangent = Vec3::new(
            1.0 + sign * normal.x * normal.x * a,
            sign * b,
            -sign * normal.x,
        );
        let bitangent = Vec3::new(b, sign + normal.y * normal.y * a, -normal.y);

        Self {
            tangent,
            normal,
            bitangent,
        }
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Rotate a direction expressed around local +Y into world space.
    #[inline]
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.tangent * local.x + self.normal * local.y + self.bitangent * local.z
    }

    /// Express a world-space direction in this frame (+Y along the normal).
    #[inline]
    pub fn to_local(&self, world: Vec3) -> Vec3 {
        Vec3::new(
            world.dot(self.tangent),
            world.dot(self.normal),
            world.dot(self.bitangent),
        )
    }
}
