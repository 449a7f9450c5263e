//! PCG-32 random stream and the direction samplers built on it.

use std::f32::consts::{FRAC_1_PI, PI, TAU};

use murmurhash3::murmurhash3_x86_32;
use prism_math::{Frame, Vec3};
use rand::{Rng, RngCore};
use thiserror::Error;

use crate::EPSILON;

const MULTIPLIER: u64 = 6364136223846793005;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeedError {
    #[error("Seed value must not be zero")]
    ZeroSeed,

    #[error("State and increment must not both be zero")]
    ZeroStateAndIncrement,
}

/// PCG-32 (XSH-RR): 64-bit state, 32-bit output.
///
/// Each render thread owns one stream; streams are never shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomStream {
    state: u64,
    inc: u64,
}

impl RandomStream {
    pub fn new() -> Self {
        Self {
            state: 0x853C49E6748FEA9B,
            inc: 0xDA3E39CB94B95BDB,
        }
    }

    /// Stream for a render thread, decorrelated by hashing the thread index.
    pub fn for_thread(thread_index: u32, seed: u32) -> Self {
        let hash = match murmurhash3_x86_32(&thread_index.to_le_bytes(), seed) {
            0 => 1,
            h => h,
        };
        let packed = (hash as u64) << 32 | hash as u64;
        Self {
            state: packed,
            inc: packed,
        }
    }

    /// Seed from a single value, replicated into every word of the state and
    /// increment.
    pub fn seed(&mut self, value: u32) -> Result<(), SeedError> {
        if value == 0 {
            return Err(SeedError::ZeroSeed);
        }
        let packed = (value as u64) << 32 | value as u64;
        self.state = packed;
        self.inc = packed;
        Ok(())
    }

    /// Seed state and increment explicitly.
    pub fn seed_state(&mut self, state: u64, inc: u64) -> Result<(), SeedError> {
        if state == 0 && inc == 0 {
            return Err(SeedError::ZeroStateAndIncrement);
        }
        self.state = state;
        self.inc = inc;
        Ok(())
    }

    /// Next 32-bit output.
    #[inline]
    pub fn next(&mut self) -> u32 {
        let old = self.state;
        self.state = old.wrapping_mul(MULTIPLIER).wrapping_add(self.inc);

        let xorshifted = (((old >> 18) ^ old) >> 27) as u32;
        let rot = (old >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Advance `count` steps without producing output, in O(log count).
    pub fn discard(&mut self, mut count: u64) {
        let mut cur_mult = MULTIPLIER;
        let mut cur_plus = self.inc;
        let mut acc_mult = 1u64;
        let mut acc_plus = 0u64;

        while count > 0 {
            if count & 1 == 1 {
                acc_mult = acc_mult.wrapping_mul(cur_mult);
                acc_plus = acc_plus.wrapping_mul(cur_mult).wrapping_add(cur_plus);
            }
            cur_plus = cur_mult.wrapping_add(1).wrapping_mul(cur_plus);
            cur_mult = cur_mult.wrapping_mul(cur_mult);
            count >>= 1;
        }

        self.state = acc_mult.wrapping_mul(self.state).wrapping_add(acc_plus);
    }
}

impl Default for RandomStream {
    fn default() -> Self {
        Self::new()
    }
}

impl RngCore for RandomStream {
    fn next_u32(&mut self) -> u32 {
        self.next()
    }

    fn next_u64(&mut self) -> u64 {
        let lo = self.next() as u64;
        let hi = self.next() as u64;
        lo | (hi << 32)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Uniform float in [0, 1).
#[inline]
pub fn uniform01(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// A sampled direction and its solid-angle density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionSample {
    pub direction: Vec3,
    pub pdf: f32,
}

/// Cosine-weighted direction about local +Y.
///
/// Samples whose density falls to `EPSILON` or below are redrawn.
pub fn cosine_weighted_hemisphere(rng: &mut dyn RngCore) -> DirectionSample {
    loop {
        let angle = uniform01(rng) * TAU;
        let radius_sq = uniform01(rng);
        let radius = radius_sq.sqrt();

        let direction = Vec3::new(
            radius * angle.cos(),
            (1.0 - radius_sq).sqrt(),
            radius * angle.sin(),
        );
        if direction.y > EPSILON {
            return DirectionSample {
                direction,
                pdf: direction.y * FRAC_1_PI,
            };
        }
    }
}

/// Uniform direction within the cone subtended by a sphere of `radius`
/// centered at `to_center` (relative to the sampling point).
///
/// From inside the sphere every direction is a candidate, so the whole
/// sphere of directions is sampled uniformly.
pub fn toward_sphere(rng: &mut dyn RngCore, to_center: Vec3, radius: f32) -> DirectionSample {
    let dist_sq = to_center.length_squared();
    let radius_sq = radius * radius;

    if dist_sq <= radius_sq {
        let z = 1.0 - 2.0 * uniform01(rng);
        let r = (1.0 - z * z).max(0.0).sqrt();
        let phi = uniform01(rng) * TAU;
        return DirectionSample {
            direction: Vec3::new(r * phi.cos(), z, r * phi.sin()),
            pdf: 1.0 / (4.0 * PI),
        };
    }

    let dist = dist_sq.sqrt();
    let sin_sq_max = radius_sq / dist_sq;
    let cos_max = (1.0 - sin_sq_max).sqrt();
    // 1 - cos_max without cancellation for small cones.
    let one_minus_cos_max = sin_sq_max / (1.0 + cos_max);

    let cos_theta = 1.0 - uniform01(rng) * one_minus_cos_max;
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = uniform01(rng) * TAU;

    let local = Vec3::new(sin_theta * phi.cos(), cos_theta, sin_theta * phi.sin());
    DirectionSample {
        direction: Frame::from_normal(to_center / dist).to_world(local),
        pdf: 1.0 / (TAU * one_minus_cos_max),
    }
}
