//! Material trait for spectral surface response.

use std::f32::consts::FRAC_1_PI;
use std::fmt;
use std::sync::Arc;

use prism_core::color::linear_rgb_to_spectral_sample;
use prism_core::{HeroSample, HeroWavelengths, Spectrum, SrgbTexture};
use prism_math::Vec2;

/// Handle to a material in the scene's material table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub(crate) usize);

impl MaterialId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// How a surface emits and reflects light, evaluated at hero wavelengths.
pub trait Material: Send + Sync + fmt::Debug {
    /// Emitted radiance at surface coordinate `st`.
    fn sample_emission(&self, st: Vec2, wavelengths: &HeroWavelengths) -> HeroSample;

    /// BRDF value (per steradian) at surface coordinate `st`.
    fn sample_brdf(&self, st: Vec2, wavelengths: &HeroWavelengths) -> HeroSample;

    /// True if the material emits light anywhere.
    fn is_emissive(&self) -> bool {
        false
    }
}

/// Lambertian (diffuse) material with spectral emission and reflectance.
#[derive(Debug, Clone, PartialEq)]
pub struct LambertianSpectral {
    pub emission: Spectrum,
    pub reflectance: Spectrum,
}

impl LambertianSpectral {
    /// Non-emissive surface with the given reflectance.
    pub fn new(reflectance: Spectrum) -> Self {
        Self {
            emission: Spectrum::constant(0.0),
            reflectance,
        }
    }

    /// Emitter with the given reflectance.
    pub fn emitter(emission: Spectrum, reflectance: Spectrum) -> Self {
        Self {
            emission,
            reflectance,
        }
    }
}

impl Default for LambertianSpectral {
    fn default() -> Self {
        Self::new(Spectrum::constant(1.0))
    }
}

impl Material for LambertianSpectral {
    fn sample_emission(&self, _st: Vec2, wavelengths: &HeroWavelengths) -> HeroSample {
        self.emission.sample(wavelengths)
    }

    fn sample_brdf(&self, _st: Vec2, wavelengths: &HeroWavelengths) -> HeroSample {
        self.reflectance.sample(wavelengths) * FRAC_1_PI
    }

    fn is_emissive(&self) -> bool {
        !self.emission.is_black()
    }
}

/// Lambertian material whose reflectance comes from an sRGB texture,
/// upconverted to a spectrum per lookup.
#[derive(Debug, Clone)]
pub struct LambertianTextured {
    texture: Arc<SrgbTexture>,
}

impl LambertianTextured {
    pub fn new(texture: Arc<SrgbTexture>) -> Self {
        Self { texture }
    }

    pub fn texture(&self) -> &SrgbTexture {
        &self.texture
    }
}

impl Material for LambertianTextured {
    fn sample_emission(&self, _st: Vec2, _wavelengths: &HeroWavelengths) -> HeroSample {
        HeroSample::ZERO
    }

    fn sample_brdf(&self, st: Vec2, wavelengths: &HeroWavelengths) -> HeroSample {
        let rgb = self.texture.sample(st);
        linear_rgb_to_spectral_sample(rgb, wavelengths) * FRAC_1_PI
    }
}
