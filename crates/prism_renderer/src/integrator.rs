//! Spectral path tracing with explicit light sampling.
//!
//! Radiance is estimated along the hero wavelengths drawn for each camera
//! sample, converted to CIE XYZ per sample, averaged per pixel and only then
//! turned into display sRGB.

use prism_core::color::spectral_flux_to_xyz;
use prism_core::{CieXyz, HeroSample, HeroWavelengths, Srgb};
use prism_math::{Frame, Ray, Vec3};
use rand::RngCore;

use crate::hittable::HitRecord;
use crate::options::RenderOptions;
use crate::primitive::PrimitiveId;
use crate::random::{cosine_weighted_hemisphere, uniform01};
use crate::scene::Scene;

/// Path tracer over a borrowed scene.
#[derive(Debug, Clone, Copy)]
pub struct PathIntegrator<'a> {
    scene: &'a Scene,
    max_depth: u32,
    indirect_only: bool,
    flat_field_correction: bool,
}

impl<'a> PathIntegrator<'a> {
    pub fn new(scene: &'a Scene, options: &RenderOptions) -> Self {
        Self {
            scene,
            max_depth: options.max_depth,
            indirect_only: options.indirect_only,
            flat_field_correction: options.flat_field_correction,
        }
    }

    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    /// Radiance arriving along `ray`, at the hero wavelengths.
    ///
    /// Emission is only counted when `last_was_specular` is set (the camera
    /// hit, or after a perfectly specular bounce); after a diffuse bounce the
    /// light-sampling step has already accounted for it. Recursion stops
    /// once `depth + 1` reaches the maximum depth.
    pub fn radiance(
        &self,
        ray: &Ray,
        last_was_specular: bool,
        depth: u32,
        ignore: Option<PrimitiveId>,
        wavelengths: &HeroWavelengths,
        rng: &mut dyn RngCore,
    ) -> HeroSample {
        let mut radiance = HeroSample::ZERO;

        let mut rec = HitRecord::new();
        if !self.scene.intersect(ray, &mut rec, ignore) {
            return radiance;
        }
        let Some(prim) = rec.prim else {
            return radiance;
        };
        let material = self.scene.material_of(prim);

        if last_was_specular {
            radiance += material.sample_emission(rec.st, wavelengths);
        }

        if depth + 1 >= self.max_depth {
            return radiance;
        }

        let hit_pos = ray.at(rec.dist);
        let brdf = material.sample_brdf(rec.st, wavelengths);

        // Direct lighting
        let light = self.scene.sample_toward_light(rng, hit_pos);
        let n_dot_l = light.direction.dot(rec.normal);
        if n_dot_l > 0.0 {
            let shadow_ray = Ray::new(hit_pos, light.direction);
            let mut shadow = HitRecord::new();
            self.scene.intersect(&shadow_ray, &mut shadow, Some(prim));
            if shadow.prim == Some(light.light) {
                let emitted = self
                    .scene
                    .material_of(light.light)
                    .sample_emission(shadow.st, wavelengths);
                radiance += emitted * brdf * (n_dot_l / light.pdf);
            }
        }

        // Indirect lighting
        if brdf.has_contribution() {
            let sample = cosine_weighted_hemisphere(rng);
            let direction = Frame::from_normal(rec.normal).to_world(sample.direction);
            let n_dot_l = direction.dot(rec.normal);
            if n_dot_l > 0.0 {
                let next = Ray::new(hit_pos, direction);
                let incoming =
                    self.radiance(&next, false, depth + 1, Some(prim), wavelengths, rng);
                radiance += incoming * brdf * (n_dot_l / sample.pdf);
            }
        }

        radiance
    }

    /// One sample of pixel (i, j), as CIE XYZ.
    pub fn sample_pixel(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> CieXyz {
        let camera = self.scene.camera();
        let ray = camera.get_ray(i, j, rng);
        let wavelengths = HeroWavelengths::sample(uniform01(rng));

        let radiance = self.radiance(&ray, !self.indirect_only, 0, None, &wavelengths, rng);
        let flux = if self.flat_field_correction {
            radiance
        } else {
            radiance * ray.direction.dot(camera.forward())
        };

        spectral_flux_to_xyz(flux, &wavelengths)
    }

    /// Mean of `samples` samples of pixel (i, j), accumulated in XYZ.
    pub fn estimate_pixel(&self, i: u32, j: u32, samples: u32, rng: &mut dyn RngCore) -> CieXyz {
        let sum = (0..samples).fold(Vec3::ZERO, |acc, _| acc + self.sample_pixel(i, j, rng).0);
        CieXyz(sum / samples.max(1) as f32)
    }

    /// Final display value of pixel (i, j).
    pub fn render_pixel(&self, i: u32, j: u32, samples: u32, rng: &mut dyn RngCore) -> Srgb {
        self.estimate_pixel(i, j, samples, rng)
            .to_linear_rgb()
            .to_srgb()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::material::LambertianSpectral;
    use crate::quad::Quad;
    use crate::random::RandomStream;
    use crate::scene::SceneBuilder;
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

    /// Camera at +5 looking down -Z at a white floor (z = 0), lit by a light
    /// behind the camera. With `light_in_view` the light sits in front of the
    /// camera instead and covers the view.
    fn test_scene(light_in_view: bool) -> Scene {
        let camera = Camera::new()
            .with_resolution(8, 8)
            .with_position(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z, Vec3::Y)
            .with_lens(20.0, 0.1, 1.0);
        let mut builder = SceneBuilder::new(camera);
        builder
            .add_material("white", LambertianSpectral::new(Spectrum::constant(0.8)))
            .unwrap();
        builder
            .add_material(
                "light",
                LambertianSpectral::emitter(Spectrum::constant(4.0), Spectrum::constant(0.0)),
            )
            .unwrap();

        builder.add(quad_at_z(0.0, 10.0), "white").unwrap();
        let light_z = if light_in_view { 2.0 } else { 20.0 };
        builder.add(quad_at_z(light_z, 10.0), "light").unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_lit_floor_is_visible() {
        let scene = test_scene(false);
        let integrator = PathIntegrator::new(&scene, &RenderOptions::default());
        let mut rng = RandomStream::new();

        let xyz = integrator.estimate_pixel(4, 4, 64, &mut rng);
        assert!(xyz.luminance() > 0.0);
    }

    #[test]
    fn test_miss_is_black() {
        let scene = test_scene(false);
        let integrator = PathIntegrator::new(&scene, &RenderOptions::default());
        let mut rng = RandomStream::new();
        let wavelengths = HeroWavelengths::sample(0.5);

        let ray = Ray::new(Vec3::new(50.0, 0.0, 5.0), Vec3::X);
        let radiance = integrator.radiance(&ray, true, 0, None, &wavelengths, &mut rng);
        assert_eq!(radiance, HeroSample::ZERO);
    }

    #[test]
    fn test_direct_emission_and_indirect_only() {
        let scene = test_scene(true);
        let mut rng = RandomStream::new();

        let direct = PathIntegrator::new(&scene, &RenderOptions::default());
        assert!(direct.estimate_pixel(4, 4, 8, &mut rng).luminance() > 0.0);

        // The light is black, so with its own emission suppressed nothing
        // else reaches the camera.
        let options = RenderOptions {
            indirect_only: true,
            ..RenderOptions::default()
        };
        let indirect = PathIntegrator::new(&scene, &options);
        assert_eq!(indirect.estimate_pixel(4, 4, 8, &mut rng).0, Vec3::ZERO);
    }

    #[test]
    fn test_depth_one_only_sees_emission() {
        let scene = test_scene(false);
        let options = RenderOptions {
            max_depth: 1,
            ..RenderOptions::default()
        };
        let integrator = PathIntegrator::new(&scene, &options);
        let mut rng = RandomStream::new();

        assert_eq!(integrator.estimate_pixel(4, 4, 16, &mut rng).0, Vec3::ZERO);
    }

    #[test]
    fn test_direct_lighting_matches_irradiance() {
        // A small distant light over a white floor: radiance leaving the
        // floor is approximately reflectance / π * L * Ω * cosθ.
        let scene = test_scene(false);
        let integrator = PathIntegrator::new(
            &scene,
            &RenderOptions {
                max_depth: 2,
                ..RenderOptions::default()
            },
        );
        let mut rng = RandomStream::new();
        let wavelengths = HeroWavelengths::sample(0.25);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);

        let n = 4000;
        let mut sum = 0.0;
        for _ in 0..n {
            sum += integrator
                .radiance(&ray, false, 0, None, &wavelengths, &mut rng)
                .average();
        }
        let estimate = sum / n as f32;

        // The 20x20 light at height 20 subtends a projected solid angle of
        // about 0.75 sr from the floor center.
        let expected = 0.8 / std::f32::consts::PI * 4.0 * 0.75;
        assert!(estimate > expected * 0.7 && estimate < expected * 1.3, "{estimate}");
    }

    #[test]
    fn test_flat_field_toggle() {
        let scene = test_scene(true);
        let flat = PathIntegrator::new(&scene, &RenderOptions::default());
        let cosine = PathIntegrator::new(
            &scene,
            &RenderOptions {
                flat_field_correction: false,
                ..RenderOptions::default()
            },
        );

        // Same stream, so both see identical paths; the cosine weight can
        // only reduce the flux.
        let a = flat.sample_pixel(0, 0, &mut RandomStream::new());
        let b = cosine.sample_pixel(0, 0, &mut RandomStream::new());
        assert!(b.luminance() < a.luminance());
        assert!(b.luminance() > 0.9 * a.luminance());
    }
}
