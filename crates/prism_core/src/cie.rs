//! CIE standard observer and illuminant tables.
//!
//! All tables are sampled every 10 nm from `LAMBDA_MIN` to `LAMBDA_MAX`
//! inclusive (41 entries).

use crate::spectrum::Spectrum;

/// Number of entries in each table.
pub const TABLE_LEN: usize = 41;

/// CIE 1931 2° color-matching function x̄.
pub const CIE_X: [f32; TABLE_LEN] = [
    0.001368, 0.004243, 0.01431, 0.04351, 0.13438, 0.2839, 0.34828, 0.3362, 0.2908, 0.19536,
    0.09564, 0.03201, 0.0049, 0.0093, 0.06327, 0.1655, 0.2904, 0.43345, 0.5945, 0.7621, 0.9163,
    1.0263, 1.0622, 1.0026, 0.85445, 0.6424, 0.4479, 0.2835, 0.1649, 0.0874, 0.04677, 0.0227,
    0.011359, 0.00579, 0.002899, 0.00144, 0.00069, 0.000332, 0.000166, 0.000083, 0.000042,
];

/// CIE 1931 2° color-matching function ȳ (photopic luminous efficiency).
pub const CIE_Y: [f32; TABLE_LEN] = [
    0.000039, 0.00012, 0.000396, 0.00121, 0.004, 0.0116, 0.023, 0.038, 0.06, 0.09098, 0.13902,
    0.20802, 0.323, 0.503, 0.71, 0.862, 0.954, 0.99495, 0.995, 0.952, 0.87, 0.757, 0.631, 0.503,
    0.381, 0.265, 0.175, 0.107, 0.061, 0.032, 0.017, 0.00821, 0.004102, 0.002091, 0.001047,
    0.00052, 0.000249, 0.00012, 0.00006, 0.00003, 0.000015,
];

/// CIE 1931 2° color-matching function z̄.
pub const CIE_Z: [f32; TABLE_LEN] = [
    0.00645, 0.02005, 0.06785, 0.2074, 0.6456, 1.3856, 1.74706, 1.77211, 1.6692, 1.28764, 0.81295,
    0.46518, 0.272, 0.1582, 0.07825, 0.04216, 0.0203, 0.00875, 0.0039, 0.0021, 0.00165, 0.0011,
    0.0008, 0.00034, 0.00019, 0.00005, 0.00002, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
    0.0, 0.0, 0.0, 0.0,
];

/// CIE standard illuminant D65, relative spectral power (100 at 560 nm).
pub const D65: [f32; TABLE_LEN] = [
    49.98, 54.65, 82.75, 91.49, 93.43, 86.68, 104.86, 117.01, 117.81, 114.86, 115.92, 108.81,
    109.35, 107.80, 104.79, 107.69, 104.41, 104.05, 100.00, 96.33, 95.79, 88.69, 90.01, 89.60,
    87.70, 83.29, 83.70, 80.03, 80.21, 82.28, 78.28, 69.72, 71.61, 74.35, 61.60, 69.89, 75.09,
    63.59, 46.42, 66.81, 63.38,
];

pub fn cie_x() -> Spectrum {
    Spectrum::from_domain_table(&CIE_X)
}

pub fn cie_y() -> Spectrum {
    Spectrum::from_domain_table(&CIE_Y)
}

pub fn cie_z() -> Spectrum {
    Spectrum::from_domain_table(&CIE_Z)
}

/// Illuminant D65 in its tabulated relative units.
pub fn d65() -> Spectrum {
    Spectrum::from_domain_table(&D65)
}
