//! Wavelength-indexed quantities.
//!
//! A `Spectrum` is a full piecewise-linear function of wavelength, used to
//! describe materials and emitters. Along a path only `HERO_COUNT` wavelengths
//! are ever evaluated: the `HeroWavelengths` drawn for that path sample, with
//! every radiometric quantity carried as a `HeroSample` of matching lanes.

use std::ops::{Add, AddAssign, Div, Mul, MulAssign};

use prism_math::Vec4;
use thiserror::Error;

/// Shortest wavelength (nm) considered by the renderer.
pub const LAMBDA_MIN: f32 = 380.0;

/// Longest wavelength (nm) considered by the renderer.
pub const LAMBDA_MAX: f32 = 780.0;

/// Width of the wavelength domain (nm).
pub const LAMBDA_WIDTH: f32 = LAMBDA_MAX - LAMBDA_MIN;

/// Number of wavelengths traced together per path sample.
pub const HERO_COUNT: usize = 4;

/// Width of each sub-band; also the spacing between hero wavelengths.
pub const LAMBDA_STEP: f32 = LAMBDA_WIDTH / HERO_COUNT as f32;

/// Errors raised when constructing a `Spectrum`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpectrumError {
    #[error("Spectrum needs at least one sample")]
    Empty,

    #[error("Spectrum wavelengths must be strictly increasing (sample {index}: {previous} nm after {current} nm)")]
    NotIncreasing {
        index: usize,
        previous: f32,
        current: f32,
    },

    #[error("Spectrum sample {index} is not finite")]
    NonFinite { index: usize },

    #[error("Invalid wavelength interval [{min}, {max}]")]
    InvalidInterval { min: f32, max: f32 },
}

pub type SpectrumResult<T> = Result<T, SpectrumError>;

/// The set of wavelengths a single path sample is traced along.
///
/// The hero wavelength lies in the first of `HERO_COUNT` equal sub-bands of the
/// domain; the others are offset by multiples of `LAMBDA_STEP`, wrapped back
/// into the domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeroWavelengths(Vec4);

impl HeroWavelengths {
    /// Draw a hero wavelength from a uniform variate in [0, 1).
    pub fn sample(u: f32) -> Self {
        Self::from_hero(LAMBDA_MIN + u * LAMBDA_STEP)
    }

    /// Build the wavelength set around an explicit hero wavelength.
    pub fn from_hero(hero: f32) -> Self {
        let mut lambda = Vec4::ZERO;
        for i in 0..HERO_COUNT {
            let offset = hero + i as f32 * LAMBDA_STEP - LAMBDA_MIN;
            lambda[i] = LAMBDA_MIN + offset.rem_euclid(LAMBDA_WIDTH);
        }
        Self(lambda)
    }

    /// The hero (first) wavelength.
    pub fn hero(&self) -> f32 {
        self.0.x
    }

    pub fn get(&self, i: usize) -> f32 {
        self.0[i]
    }

    pub fn as_vec4(&self) -> Vec4 {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> {
        self.0.to_array().into_iter()
    }
}

/// Values of a spectral quantity at the wavelengths of a `HeroWavelengths`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeroSample(Vec4);

impl HeroSample {
    pub const ZERO: Self = Self(Vec4::ZERO);

    pub fn new(values: Vec4) -> Self {
        Self(values)
    }

    pub fn splat(value: f32) -> Self {
        Self(Vec4::splat(value))
    }

    /// Build a sample by evaluating `f` at every wavelength.
    pub fn from_wavelengths(wavelengths: &HeroWavelengths, mut f: impl FnMut(f32) -> f32) -> Self {
        let mut values = Vec4::ZERO;
        for (i, lambda) in wavelengths.iter().enumerate() {
            values[i] = f(lambda);
        }
        Self(values)
    }

    pub fn get(&self, i: usize) -> f32 {
        self.0[i]
    }

    pub fn as_vec4(&self) -> Vec4 {
        self.0
    }

    /// True if any lane is non-zero.
    pub fn has_contribution(&self) -> bool {
        self.0.length_squared() > 0.0
    }

    /// Mean over the lanes.
    pub fn average(&self) -> f32 {
        self.0.element_sum() / HERO_COUNT as f32
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> {
        self.0.to_array().into_iter()
    }
}

impl Add for HeroSample {
    type Output = HeroSample;

    fn add(self, rhs: HeroSample) -> HeroSample {
        HeroSample(self.0 + rhs.0)
    }
}

impl AddAssign for HeroSample {
    fn add_assign(&mut self, rhs: HeroSample) {
        self.0 += rhs.0;
    }
}

impl Mul for HeroSample {
    type Output = HeroSample;

    fn mul(self, rhs: HeroSample) -> HeroSample {
        HeroSample(self.0 * rhs.0)
    }
}

impl Mul<f32> for HeroSample {
    type Output = HeroSample;

    fn mul(self, rhs: f32) -> HeroSample {
        HeroSample(self.0 * rhs)
    }
}

impl MulAssign<f32> for HeroSample {
    fn mul_assign(&mut self, rhs: f32) {
        self.0 *= rhs;
    }
}

impl Div<f32> for HeroSample {
    type Output = HeroSample;

    fn div(self, rhs: f32) -> HeroSample {
        HeroSample(self.0 / rhs)
    }
}

/// How a `Spectrum` is evaluated between its samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    /// Linear interpolation between neighbouring samples.
    #[default]
    Linear,
    /// Value of the nearest sample.
    Nearest,
}

/// A piecewise-linear function of wavelength.
///
/// Stored as samples with strictly increasing wavelengths; evaluation outside
/// the sampled range clamps to the first/last value.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    wavelengths: Vec<f32>,
    values: Vec<f32>,
    filter: Filter,
}

impl Spectrum {
    /// Create a spectrum from `(wavelength, value)` samples.
    pub fn new(samples: impl IntoIterator<Item = (f32, f32)>) -> SpectrumResult<Self> {
        let (wavelengths, values): (Vec<f32>, Vec<f32>) = samples.into_iter().unzip();
        if wavelengths.is_empty() {
            return Err(SpectrumError::Empty);
        }

        for (index, (lambda, value)) in wavelengths.iter().zip(&values).enumerate() {
            if !lambda.is_finite() || !value.is_finite() {
                return Err(SpectrumError::NonFinite { index });
            }
            if index > 0 && *lambda <= wavelengths[index - 1] {
                return Err(SpectrumError::NotIncreasing {
                    index,
                    previous: wavelengths[index - 1],
                    current: *lambda,
                });
            }
        }

        Ok(Self {
            wavelengths,
            values,
            filter: Filter::Linear,
        })
    }

    /// A spectrum with the same value at every wavelength.
    pub fn constant(value: f32) -> Self {
        Self {
            wavelengths: vec![LAMBDA_MIN, LAMBDA_MAX],
            values: vec![value, value],
            filter: Filter::Linear,
        }
    }

    /// Spread `values` evenly over `[lambda_min, lambda_max]`, first value at
    /// `lambda_min` and last at `lambda_max`.
    pub fn from_uniform(values: &[f32], lambda_min: f32, lambda_max: f32) -> SpectrumResult<Self> {
        if !(lambda_min.is_finite() && lambda_max.is_finite() && lambda_min < lambda_max) {
            return Err(SpectrumError::InvalidInterval {
                min: lambda_min,
                max: lambda_max,
            });
        }

        match values.len() {
            0 => Err(SpectrumError::Empty),
            1 => Self::new([(lambda_min, values[0]), (lambda_max, values[0])]),
            n => {
                let step = (lambda_max - lambda_min) / (n - 1) as f32;
                Self::new(values.iter().enumerate().map(|(i, &value)| {
                    let lambda = if i == n - 1 {
                        lambda_max
                    } else {
                        lambda_min + step * i as f32
                    };
                    (lambda, value)
                }))
            }
        }
    }

    /// Built-in table of at least two values spanning the full domain.
    pub(crate) fn from_domain_table(values: &[f32]) -> Self {
        let step = LAMBDA_WIDTH / (values.len() - 1) as f32;
        Self {
            wavelengths: (0..values.len())
                .map(|i| LAMBDA_MIN + step * i as f32)
                .collect(),
            values: values.to_vec(),
            filter: Filter::Linear,
        }
    }

    /// Build from nodes already known to be strictly increasing.
    pub(crate) fn from_nodes(wavelengths: &[f32], values: &[f32]) -> Self {
        Self {
            wavelengths: wavelengths.to_vec(),
            values: values.to_vec(),
            filter: Filter::Linear,
        }
    }

    /// Use a different filter when evaluating between samples.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// Number of stored samples.
    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    /// Always false; a spectrum holds at least one sample.
    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    /// Iterate over the stored `(wavelength, value)` samples.
    pub fn samples(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.wavelengths.iter().copied().zip(self.values.iter().copied())
    }

    /// Evaluate the spectrum at `lambda` (nm).
    pub fn evaluate(&self, lambda: f32) -> f32 {
        let n = self.wavelengths.len();
        if lambda.is_nan() || lambda <= self.wavelengths[0] {
            return self.values[0];
        }
        if lambda >= self.wavelengths[n - 1] {
            return self.values[n - 1];
        }

        // First sample strictly above lambda; lies in 1..n here.
        let hi = self.wavelengths.partition_point(|&w| w <= lambda);
        let lo = hi - 1;
        let (w0, w1) = (self.wavelengths[lo], self.wavelengths[hi]);
        let (v0, v1) = (self.values[lo], self.values[hi]);

        match self.filter {
            Filter::Linear => {
                let t = (lambda - w0) / (w1 - w0);
                v0 + t * (v1 - v0)
            }
            Filter::Nearest => {
                if lambda - w0 <= w1 - lambda {
                    v0
                } else {
                    v1
                }
            }
        }
    }

    /// Evaluate the spectrum at each of the hero wavelengths.
    pub fn sample(&self, wavelengths: &HeroWavelengths) -> HeroSample {
        HeroSample::from_wavelengths(wavelengths, |lambda| self.evaluate(lambda))
    }

    /// Largest stored value.
    pub fn max_value(&self) -> f32 {
        self.values.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// True if every stored value is zero.
    pub fn is_black(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }

    /// Pointwise combination over the union of both sample sets.
    fn combine(&self, other: &Spectrum, op: impl Fn(f32, f32) -> f32) -> Spectrum {
        let mut wavelengths: Vec<f32> = self
            .wavelengths
            .iter()
            .chain(other.wavelengths.iter())
            .copied()
            .collect();
        wavelengths.sort_by(f32::total_cmp);
        wavelengths.dedup();

        let values = wavelengths
            .iter()
            .map(|&lambda| op(self.evaluate(lambda), other.evaluate(lambda)))
            .collect();

        Spectrum {
            wavelengths,
            values,
            filter: self.filter,
        }
    }
}

impl Mul<f32> for &Spectrum {
    type Output = Spectrum;

    fn mul(self, rhs: f32) -> Spectrum {
        Spectrum {
            wavelengths: self.wavelengths.clone(),
            values: self.values.iter().map(|v| v * rhs).collect(),
            filter: self.filter,
        }
    }
}

impl Mul<f32> for Spectrum {
    type Output = Spectrum;

    fn mul(self, rhs: f32) -> Spectrum {
        &self * rhs
    }
}

impl Add for &Spectrum {
    type Output = Spectrum;

    fn add(self, rhs: &Spectrum) -> Spectrum {
        self.combine(rhs, |a, b| a + b)
    }
}

impl Mul for &Spectrum {
    type Output = Spectrum;

    fn mul(self, rhs: &Spectrum) -> Spectrum {
        self.combine(rhs, |a, b| a * b)
    }
}
