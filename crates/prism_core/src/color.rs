//! Conversions between spectral quantities and tristimulus color.
//!
//! The chain used at render time is hero sample → CIE XYZ → linear RGB →
//! display sRGB. Textures go the other way: 8-bit sRGB → linear RGB →
//! spectral reflectance, through three basis spectra derived at start-up.

use std::sync::OnceLock;

use prism_math::{DMat3, DVec3, Mat3, Vec3};

use crate::cie;
use crate::spectrum::{HeroSample, HeroWavelengths, Spectrum, HERO_COUNT, LAMBDA_MIN, LAMBDA_WIDTH};

/// Linear sRGB (D65) to CIE XYZ.
pub const RGB_TO_XYZ: Mat3 = Mat3::from_cols(
    Vec3::new(0.4124564, 0.2126729, 0.0193339),
    Vec3::new(0.3575761, 0.7151522, 0.1191920),
    Vec3::new(0.1804375, 0.0721750, 0.9503041),
);

/// CIE XYZ to linear sRGB (D65).
pub const XYZ_TO_RGB: Mat3 = Mat3::from_cols(
    Vec3::new(3.2404542, -0.9692660, 0.0556434),
    Vec3::new(-1.5371385, 1.8760108, -0.2040259),
    Vec3::new(-0.4985314, 0.0415560, 1.0572252),
);

/// 1 nm midpoint steps over the domain.
const QUADRATURE_STEPS: usize = 400;

/// Band nodes (nm) of the piecewise-linear red, green and blue bands.
const BAND_NODES: [f32; 6] = [LAMBDA_MIN, 490.0, 510.0, 575.0, 600.0, 780.0];
const BANDS: [[f32; 6]; 3] = [
    [0.0, 0.0, 0.0, 0.0, 1.0, 1.0],
    [0.0, 0.0, 1.0, 1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0, 0.0, 0.0, 0.0],
];

/// A CIE 1931 XYZ tristimulus value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CieXyz(pub Vec3);

/// Linear-light RGB with sRGB primaries and D65 white.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinearRgb(pub Vec3);

/// Gamma-encoded sRGB, channels in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Srgb(pub Vec3);

impl CieXyz {
    pub fn to_linear_rgb(self) -> LinearRgb {
        LinearRgb(XYZ_TO_RGB * self.0)
    }

    /// Luminance (the Y component).
    pub fn luminance(&self) -> f32 {
        self.0.y
    }
}

impl LinearRgb {
    pub fn to_xyz(self) -> CieXyz {
        CieXyz(RGB_TO_XYZ * self.0)
    }

    /// Clamp to [0, 1] and apply the sRGB transfer curve.
    pub fn to_srgb(self) -> Srgb {
        Srgb(Vec3::new(
            linear_to_srgb(self.0.x),
            linear_to_srgb(self.0.y),
            linear_to_srgb(self.0.z),
        ))
    }
}

impl Srgb {
    pub fn from_u8(rgb: [u8; 3]) -> Self {
        Srgb(Vec3::new(rgb[0] as f32, rgb[1] as f32, rgb[2] as f32) / 255.0)
    }

    /// Quantize to 8 bits per channel with rounding.
    pub fn to_u8(self) -> [u8; 3] {
        let c = (self.0.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
        [c.x as u8, c.y as u8, c.z as u8]
    }

    pub fn to_linear(self) -> LinearRgb {
        LinearRgb(Vec3::new(
            srgb_to_linear(self.0.x),
            srgb_to_linear(self.0.y),
            srgb_to_linear(self.0.z),
        ))
    }
}

/// sRGB opto-electronic transfer; the input is clamped to [0, 1] first.
pub fn linear_to_srgb(c: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.0031308 {
        12.92 * c
    } else if c >= 1.0 {
        // The curve lands a few ulps short of 1 in float arithmetic.
        1.0
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Inverse of [`linear_to_srgb`].
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb_f64(c: f64) -> f64 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.0031308 {
        12.92 * c
    } else if c >= 1.0 {
        1.0
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn srgb_to_linear_f64(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

struct ColorData {
    cie_x: Spectrum,
    cie_y: Spectrum,
    cie_z: Spectrum,
    d65: Spectrum,
    d65_rad: Spectrum,
    /// Red, green and blue basis reflectances.
    basis: [Spectrum; 3],
    /// ∫ȳ(λ)dλ over the domain.
    y_integral: f64,
}

impl ColorData {
    fn new() -> Self {
        let cie_x = cie::cie_x();
        let cie_y = cie::cie_y();
        let cie_z = cie::cie_z();
        let y_integral = integrate(|lambda| cie_y.evaluate(lambda) as f64);

        let mut data = Self {
            cie_x,
            cie_y,
            cie_z,
            d65: cie::d65(),
            d65_rad: cie::d65(),
            basis: [
                Spectrum::constant(0.0),
                Spectrum::constant(0.0),
                Spectrum::constant(0.0),
            ],
            y_integral,
        };

        let d65_luminance = data.integrate_xyz(|lambda| data.d65.evaluate(lambda) as f64).y;
        data.d65_rad = &data.d65 * (1.0 / d65_luminance) as f32;
        data.basis = data.derive_basis();
        data
    }

    /// Integrate an emission spectrum against the color-matching functions.
    fn integrate_xyz(&self, f: impl Fn(f32) -> f64) -> DVec3 {
        let xyz = integrate_vec(|lambda| {
            DVec3::new(
                self.cie_x.evaluate(lambda) as f64,
                self.cie_y.evaluate(lambda) as f64,
                self.cie_z.evaluate(lambda) as f64,
            ) * f(lambda)
        });
        xyz / self.y_integral
    }

    /// Linear RGB of a reflectance lit by `d65_rad`.
    fn reflectance_to_linear_rgb(&self, reflectance: impl Fn(f32) -> f64) -> DVec3 {
        let xyz = self.integrate_xyz(|lambda| self.d65_rad.evaluate(lambda) as f64 * reflectance(lambda));
        XYZ_TO_RGB.as_dmat3() * xyz
    }

    /// Recombine the bands so each channel's basis integrates back to a unit
    /// primary.
    fn derive_basis(&self) -> [Spectrum; 3] {
        let bands: Vec<Spectrum> = BANDS
            .iter()
            .map(|band| Spectrum::from_nodes(&BAND_NODES, band))
            .collect();

        let responses = DMat3::from_cols(
            self.reflectance_to_linear_rgb(|lambda| bands[0].evaluate(lambda) as f64),
            self.reflectance_to_linear_rgb(|lambda| bands[1].evaluate(lambda) as f64),
            self.reflectance_to_linear_rgb(|lambda| bands[2].evaluate(lambda) as f64),
        );
        let weights = responses.inverse();

        let channel = |j: usize| {
            let w = weights.col(j);
            let values: Vec<f32> = (0..BAND_NODES.len())
                .map(|node| {
                    (BANDS[0][node] as f64 * w.x
                        + BANDS[1][node] as f64 * w.y
                        + BANDS[2][node] as f64 * w.z) as f32
                })
                .collect();
            Spectrum::from_nodes(&BAND_NODES, &values)
        };

        [channel(0), channel(1), channel(2)]
    }

    fn rgb_to_spectral(&self, rgb: LinearRgb, lambda: f32) -> f32 {
        rgb.0.x * self.basis[0].evaluate(lambda)
            + rgb.0.y * self.basis[1].evaluate(lambda)
            + rgb.0.z * self.basis[2].evaluate(lambda)
    }
}

fn integrate(f: impl Fn(f32) -> f64) -> f64 {
    let step = LAMBDA_WIDTH as f64 / QUADRATURE_STEPS as f64;
    let sum: f64 = (0..QUADRATURE_STEPS)
        .map(|i| f((LAMBDA_MIN as f64 + (i as f64 + 0.5) * step) as f32))
        .sum();
    sum * step
}

fn integrate_vec(f: impl Fn(f32) -> DVec3) -> DVec3 {
    let step = LAMBDA_WIDTH as f64 / QUADRATURE_STEPS as f64;
    let sum = (0..QUADRATURE_STEPS).fold(DVec3::ZERO, |acc, i| {
        acc + f((LAMBDA_MIN as f64 + (i as f64 + 0.5) * step) as f32)
    });
    sum * step
}

fn color_data() -> &'static ColorData {
    static DATA: OnceLock<ColorData> = OnceLock::new();
    DATA.get_or_init(ColorData::new)
}

/// Estimate the XYZ of a spectral flux known only at the hero wavelengths.
///
/// Each wavelength stands for one `LAMBDA_WIDTH / HERO_COUNT` sub-band, so the
/// weighted sum is a stratified estimate of the color-matching integrals. A
/// flux of 1 at every wavelength has Y = 1 in expectation.
pub fn spectral_flux_to_xyz(flux: HeroSample, wavelengths: &HeroWavelengths) -> CieXyz {
    let data = color_data();
    let xyz = flux
        .iter()
        .zip(wavelengths.iter())
        .fold(Vec3::ZERO, |acc, (f, lambda)| {
            acc + f * Vec3::new(
                data.cie_x.evaluate(lambda),
                data.cie_y.evaluate(lambda),
                data.cie_z.evaluate(lambda),
            )
        });
    let weight = LAMBDA_WIDTH / HERO_COUNT as f32 / data.y_integral as f32;
    CieXyz(xyz * weight)
}

/// XYZ of an emission spectrum, integrated over the full domain.
pub fn spectrum_to_xyz(spectrum: &Spectrum) -> CieXyz {
    let data = color_data();
    CieXyz(data.integrate_xyz(|lambda| spectrum.evaluate(lambda) as f64).as_vec3())
}

/// Reflectance reconstructed from linear RGB, at a single wavelength.
pub fn linear_rgb_to_spectral(rgb: LinearRgb, lambda: f32) -> f32 {
    color_data().rgb_to_spectral(rgb, lambda)
}

/// Reflectance reconstructed from linear RGB, at each hero wavelength.
pub fn linear_rgb_to_spectral_sample(rgb: LinearRgb, wavelengths: &HeroWavelengths) -> HeroSample {
    let data = color_data();
    HeroSample::from_wavelengths(wavelengths, |lambda| data.rgb_to_spectral(rgb, lambda))
}

/// CIE illuminant D65 in its tabulated relative units.
pub fn d65() -> &'static Spectrum {
    &color_data().d65
}

/// D65 scaled to unit luminance.
pub fn d65_rad() -> &'static Spectrum {
    &color_data().d65_rad
}

/// The red, green and blue basis reflectances.
pub fn basis_spectra() -> &'static [Spectrum; 3] {
    &color_data().basis
}

/// Upconvert linear RGB to a reflectance, light it with `d65_rad`, and
/// integrate back to linear RGB.
pub fn round_trip_linear_rgb(rgb: LinearRgb) -> LinearRgb {
    let data = color_data();
    let out = data.reflectance_to_linear_rgb(|lambda| data.rgb_to_spectral(rgb, lambda) as f64);
    LinearRgb(out.as_vec3())
}

/// [`round_trip_linear_rgb`] wrapped in the sRGB transfer curve.
pub fn round_trip_srgb(srgb: Srgb) -> Srgb {
    let data = color_data();
    let c = srgb.0.as_dvec3();
    let linear = DVec3::new(
        srgb_to_linear_f64(c.x),
        srgb_to_linear_f64(c.y),
        srgb_to_linear_f64(c.z),
    );
    let out = data.reflectance_to_linear_rgb(|lambda| {
        data.rgb_to_spectral(LinearRgb(linear.as_vec3()), lambda) as f64
    });
    Srgb(
        DVec3::new(
            linear_to_srgb_f64(out.x),
            linear_to_srgb_f64(out.y),
            linear_to_srgb_f64(out.z),
        )
        .as_vec3(),
    )
}
