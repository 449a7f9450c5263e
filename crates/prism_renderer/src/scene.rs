//! Scene representation: camera, material table, primitives and lights.
//!
//! Materials live in a table owned by the scene and primitives refer to
//! them by `MaterialId`. A scene is immutable once built.

use std::collections::HashMap;

use prism_core::{SpectralDataError, SpectrumError, TextureError};
use prism_math::{Ray, Vec3};
use rand::RngCore;
use thiserror::Error;

use crate::camera::Camera;
use crate::hittable::{HitRecord, Hittable};
use crate::material::{Material, MaterialId};
use crate::primitive::{Primitive, PrimitiveId, Shape};
use crate::random::{toward_sphere, uniform01};

/// Errors raised while building a scene. All of them are fatal: no
/// rendering starts from a partially built scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Unrecognized scene {name:?} (supported scenes: {supported})")]
    UnknownScene { name: String, supported: String },

    #[error("Unknown material {0:?}")]
    UnknownMaterial(String),

    #[error("Material {0:?} is defined twice")]
    DuplicateMaterial(String),

    #[error("Scene has no light source")]
    NoLights,

    #[error("Invalid resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error(transparent)]
    SpectralData(#[from] SpectralDataError),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error(transparent)]
    Spectrum(#[from] SpectrumError),
}

pub type SceneResult<T> = Result<T, SceneError>;

/// A direction toward a light, with the light it was aimed at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    pub direction: Vec3,
    pub light: PrimitiveId,
    /// Solid-angle density, including the light-selection probability
    pub pdf: f32,
}

#[derive(Debug)]
pub struct Scene {
    camera: Camera,
    materials: Vec<Box<dyn Material>>,
    material_names: HashMap<String, MaterialId>,
    primitives: Vec<Primitive>,
    lights: Vec<PrimitiveId>,
}

impl Scene {
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn material(&self, id: MaterialId) -> &dyn Material {
        self.materials[id.0].as_ref()
    }

    pub fn material_id(&self, name: &str) -> Option<MaterialId> {
        self.material_names.get(name).copied()
    }

    pub fn primitive(&self, id: PrimitiveId) -> &Primitive {
        &self.primitives[id.0]
    }

    /// Material of a primitive.
    pub fn material_of(&self, id: PrimitiveId) -> &dyn Material {
        self.material(self.primitives[id.0].material)
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn lights(&self) -> &[PrimitiveId] {
        &self.lights
    }

    /// Find the nearest hit along `ray`, skipping `ignore`.
    ///
    /// Brute-force scan over every primitive; each one only updates `rec`
    /// when it is closer than the current hit.
    pub fn intersect(&self, ray: &Ray, rec: &mut HitRecord, ignore: Option<PrimitiveId>) -> bool {
        *rec = HitRecord::default();

        for (index, primitive) in self.primitives.iter().enumerate() {
            let id = PrimitiveId(index);
            if Some(id) == ignore {
                continue;
            }
            if primitive.shape.hit(ray, rec) {
                rec.prim = Some(id);
            }
        }

        rec.is_hit()
    }

    /// Pick a light uniformly and sample a direction toward its bounding
    /// sphere as seen from `from`.
    pub fn sample_toward_light(&self, rng: &mut dyn RngCore, from: Vec3) -> LightSample {
        let count = self.lights.len();
        let pick = ((uniform01(rng) * count as f32) as usize).min(count - 1);
        let light = self.lights[pick];

        let bound = self.primitives[light.0].shape.bounding_sphere();
        let sample = toward_sphere(rng, bound.center - from, bound.radius);

        LightSample {
            direction: sample.direction,
            light,
            pdf: sample.pdf / count as f32,
        }
    }
}

/// Builds a `Scene`: named materials first, then primitives referring to them.
#[derive(Debug)]
pub struct SceneBuilder {
    camera: Camera,
    materials: Vec<Box<dyn Material>>,
    material_names: HashMap<String, MaterialId>,
    primitives: Vec<Primitive>,
}

impl SceneBuilder {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            materials: Vec::new(),
            material_names: HashMap::new(),
            primitives: Vec::new(),
        }
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Register a material under `name`.
    pub fn add_material(
        &mut self,
        name: &str,
        material: impl Material + 'static,
    ) -> SceneResult<MaterialId> {
        if self.material_names.contains_key(name) {
            return Err(SceneError::DuplicateMaterial(name.to_string()));
        }
        let id = MaterialId(self.materials.len());
        self.materials.push(Box::new(material));
        self.material_names.insert(name.to_string(), id);
        Ok(id)
    }

    /// Replace the material registered under `name`; every primitive that
    /// uses it picks up the new one.
    pub fn replace_material(
        &mut self,
        name: &str,
        material: impl Material + 'static,
    ) -> SceneResult<MaterialId> {
        let id = self.material_id(name)?;
        self.materials[id.0] = Box::new(material);
        Ok(id)
    }

    pub fn material_id(&self, name: &str) -> SceneResult<MaterialId> {
        self.material_names
            .get(name)
            .copied()
            .ok_or_else(|| SceneError::UnknownMaterial(name.to_string()))
    }

    /// Add a shape made of the material registered under `material`.
    pub fn add(&mut self, shape: impl Into<Shape>, material: &str) -> SceneResult<PrimitiveId> {
        let material = self.material_id(material)?;
        let id = PrimitiveId(self.primitives.len());
        self.primitives.push(Primitive {
            shape: shape.into(),
            material,
            is_light: false,
        });
        Ok(id)
    }

    /// Point every primitive using material `from` at material `to`.
    pub fn reassign_material(&mut self, from: &str, to: &str) -> SceneResult<()> {
        let from = self.material_id(from)?;
        let to = self.material_id(to)?;
        for primitive in self.primitives.iter_mut().filter(|p| p.material == from) {
            primitive.material = to;
        }
        Ok(())
    }

    /// Finish the scene: flag emitters, collect the light list and set up
    /// the camera.
    pub fn build(mut self) -> SceneResult<Scene> {
        let (width, height) = (self.camera.image_width, self.camera.image_height);
        if width == 0 || height == 0 {
            return Err(SceneError::InvalidResolution { width, height });
        }

        for primitive in &mut self.primitives {
            primitive.is_light = self.materials[primitive.material.0].is_emissive();
        }

        let lights: Vec<PrimitiveId> = self
            .primitives
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_light)
            .map(|(index, _)| PrimitiveId(index))
            .collect();
        if lights.is_empty() {
            return Err(SceneError::NoLights);
        }

        self.camera.initialize();

        log::info!(
            "Built scene: {} primitives, {} lights, {} materials",
            self.primitives.len(),
            lights.len(),
            self.materials.len()
        );

        Ok(Scene {
            camera: self.camera,
            materials: self.materials,
            material_names: self.material_names,
            primitives: self.primitives,
            lights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::LambertianSpectral;
    use crate::quad::Quad;
    use crate::random::RandomStream;
    use crate::triangle::Vertex;
    use prism_core::Spectrum;
    use prism_math::Vec2;

    fn quad_at_z(z: f32, half: f32) -> Quad {
        Quad::new(
            Vertex::new(Vec3::new(-half, -half, z), Vec2::new(0.0, 0.0)),
            Vertex::new(Vec3::new(half, -half, z), Vec2::new(1.0, 0.0)),
            Vertex::new(Vec3::new(half, half, z), Vec2::new(1.0, 1.0)),
            Vertex::new(Vec3::new(-half, half, z), Vec2::new(0.0, 1.0)),
        )
    }

    fn two_quad_scene() -> Scene {
        let mut builder = SceneBuilder::new(Camera::new().with_resolution(4, 4));
        builder
            .add_material("white", LambertianSpectral::default())
            .unwrap();
        builder
            .add_material(
                "light",
                LambertianSpectral::emitter(Spectrum::constant(1.0), Spectrum::constant(0.0)),
            )
            .unwrap();
        builder.add(quad_at_z(-1.0, 1.0), "light").unwrap();
        builder.add(quad_at_z(-2.0, 1.0), "white").unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_lights_collected() {
        let scene = two_quad_scene();

        assert_eq!(scene.lights(), &[PrimitiveId(0)]);
        assert!(scene.primitive(PrimitiveId(0)).is_light);
        assert!(!scene.primitive(PrimitiveId(1)).is_light);
    }

    #[test]
    fn test_intersect_reports_quad_and_nearest() {
        let scene = two_quad_scene();
        let ray = Ray::new(Vec3::new(0.3, -0.2, 0.0), -Vec3::Z);
        let mut rec = HitRecord::new();

        assert!(scene.intersect(&ray, &mut rec, None));
        assert_eq!(rec.prim, Some(PrimitiveId(0)));
        assert!((rec.dist - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_intersect_ignores_primitive() {
        let scene = two_quad_scene();
        let ray = Ray::new(Vec3::new(0.3, -0.2, 0.0), -Vec3::Z);
        let mut rec = HitRecord::new();

        assert!(scene.intersect(&ray, &mut rec, Some(PrimitiveId(0))));
        assert_eq!(rec.prim, Some(PrimitiveId(1)));
        assert!((rec.dist - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_intersect_miss_resets_record() {
        let scene = two_quad_scene();
        let mut rec = HitRecord {
            dist: 0.5,
            prim: Some(PrimitiveId(1)),
            ..HitRecord::default()
        };

        assert!(!scene.intersect(&Ray::new(Vec3::ZERO, Vec3::Z), &mut rec, None));
        assert!(rec.prim.is_none());
        assert_eq!(rec.dist, f32::INFINITY);
    }

    #[test]
    fn test_sample_toward_light() {
        let scene = two_quad_scene();
        let mut rng = RandomStream::new();

        for _ in 0..100 {
            let sample = scene.sample_toward_light(&mut rng, Vec3::new(0.0, 0.0, 5.0));
            assert_eq!(sample.light, PrimitiveId(0));
            assert!(sample.direction.z < 0.0);
            assert!(sample.pdf > 0.0);
        }
    }

    #[test]
    fn test_no_lights_is_an_error() {
        let mut builder = SceneBuilder::new(Camera::new());
        builder
            .add_material("white", LambertianSpectral::default())
            .unwrap();
        builder.add(quad_at_z(-1.0, 1.0), "white").unwrap();

        assert!(matches!(builder.build(), Err(SceneError::NoLights)));
    }

    #[test]
    fn test_unknown_and_duplicate_materials() {
        let mut builder = SceneBuilder::new(Camera::new());
        builder
            .add_material("white", LambertianSpectral::default())
            .unwrap();

        assert!(matches!(
            builder.add(quad_at_z(-1.0, 1.0), "chrome"),
            Err(SceneError::UnknownMaterial(name)) if name == "chrome"
        ));
        assert!(matches!(
            builder.add_material("white", LambertianSpectral::default()),
            Err(SceneError::DuplicateMaterial(_))
        ));
    }

    #[test]
    fn test_replace_and_reassign() {
        let mut builder = SceneBuilder::new(Camera::new());
        builder
            .add_material("a", LambertianSpectral::default())
            .unwrap();
        builder
            .add_material("b", LambertianSpectral::default())
            .unwrap();
        builder.add(quad_at_z(-1.0, 1.0), "a").unwrap();
        builder.reassign_material("a", "b").unwrap();
        builder
            .replace_material(
                "b",
                LambertianSpectral::emitter(Spectrum::constant(2.0), Spectrum::constant(0.5)),
            )
            .unwrap();

        let scene = builder.build().unwrap();
        assert_eq!(scene.primitive(PrimitiveId(0)).material, scene.material_id("b").unwrap());
        assert_eq!(scene.lights().len(), 1);
    }

    #[test]
    fn test_invalid_resolution() {
        let builder = SceneBuilder::new(Camera::new().with_resolution(0, 10));
        assert!(matches!(
            builder.build(),
            Err(SceneError::InvalidResolution { width: 0, height: 10 })
        ));
    }
}
