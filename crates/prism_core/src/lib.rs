//! Prism Core - spectral color pipeline and scene data for Prism.
//!
//! This crate provides:
//!
//! - **Spectra**: piecewise-linear `Spectrum`, and the fixed-size
//!   `HeroWavelengths` / `HeroSample` pair carried along every path
//! - **Color conversion**: hero samples to CIE XYZ, XYZ to linear and display
//!   RGB, and RGB back to spectral reflectance through fixed basis spectra
//! - **Data loading**: tabular spectral data and 8-bit sRGB textures
//!
//! # Example
//!
//! ```ignore
//! use prism_core::{color, HeroWavelengths, Spectrum};
//!
//! let wavelengths = HeroWavelengths::sample(0.5);
//! let flux = Spectrum::constant(1.0).sample(&wavelengths);
//! let xyz = color::spectral_flux_to_xyz(flux, &wavelengths);
//! ```

pub mod cie;
pub mod color;
pub mod spectral_data;
pub mod spectrum;
pub mod texture;

// Re-export commonly used types
pub use color::{CieXyz, LinearRgb, Srgb};
pub use spectral_data::{load_spectral_data, SpectralDataError, SpectralTable};
pub use spectrum::{
    Filter, HeroSample, HeroWavelengths, Spectrum, SpectrumError, HERO_COUNT, LAMBDA_MAX,
    LAMBDA_MIN, LAMBDA_STEP, LAMBDA_WIDTH,
};
pub use texture::{load_texture_file, SrgbTexture, TextureError};
