//! Texture loading for texture-backed materials.
//!
//! Images are decoded once to 8-bit RGB and converted from the sRGB transfer
//! curve to linear RGB. Materials share a loaded texture through an `Arc`.

use std::path::{Path, PathBuf};

use prism_math::{Vec2, Vec3};
use thiserror::Error;

use crate::color::{LinearRgb, Srgb};

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to load texture {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Texture {path} has no pixels")]
    Empty { path: PathBuf },

    #[error("Texel buffer holds {found} texels, expected {width}x{height}")]
    SizeMismatch { width: u32, height: u32, found: usize },
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A texture decoded from 8-bit sRGB.
///
/// Texels are stored row-major with row 0 at the top of the image, already
/// converted to linear RGB.
#[derive(Clone, Debug)]
pub struct SrgbTexture {
    width: u32,
    height: u32,
    pixels: Vec<LinearRgb>,
    /// Original file path (for debugging)
    path: String,
}

impl SrgbTexture {
    /// Build a texture from 8-bit sRGB texels.
    pub fn from_rgb8(
        width: u32,
        height: u32,
        texels: &[[u8; 3]],
        path: impl Into<String>,
    ) -> TextureResult<Self> {
        let path = path.into();
        if texels.len() != width as usize * height as usize {
            return Err(TextureError::SizeMismatch {
                width,
                height,
                found: texels.len(),
            });
        }
        if texels.is_empty() {
            return Err(TextureError::Empty {
                path: PathBuf::from(path),
            });
        }

        Ok(Self {
            width,
            height,
            pixels: texels
                .iter()
                .map(|&texel| Srgb::from_u8(texel).to_linear())
                .collect(),
            path,
        })
    }

    /// Create a solid color texture (1x1).
    pub fn solid_color(color: LinearRgb) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![color],
            path: "<solid>".to_string(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Nearest texel at surface coordinate `st`, with (0, 0) at the
    /// bottom-left of the image. Coordinates outside [0, 1] clamp to the edge.
    pub fn sample(&self, st: Vec2) -> LinearRgb {
        let x = (st.x * self.width as f32).floor().clamp(0.0, (self.width - 1) as f32) as u32;
        let y = ((1.0 - st.y) * self.height as f32)
            .floor()
            .clamp(0.0, (self.height - 1) as f32) as u32;
        self.texel(x, y)
    }

    /// Texel at integer coordinates, row 0 at the top.
    pub fn texel(&self, x: u32, y: u32) -> LinearRgb {
        let idx = (y * self.width + x) as usize;
        self.pixels
            .get(idx)
            .copied()
            .unwrap_or(LinearRgb(Vec3::ZERO))
    }

    /// Get total size in bytes (approximate).
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<LinearRgb>()
    }
}

/// Decode an image file to an `SrgbTexture`.
pub fn load_texture_file(path: &Path) -> TextureResult<SrgbTexture> {
    let img = image::open(path).map_err(|source| TextureError::Image {
        path: path.to_path_buf(),
        source,
    })?;

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(TextureError::Empty {
            path: path.to_path_buf(),
        });
    }

    let texels: Vec<[u8; 3]> = rgb.pixels().map(|p| p.0).collect();
    let texture = SrgbTexture::from_rgb8(width, height, &texels, path.to_string_lossy())?;

    log::debug!(
        "Loaded texture: {} ({}x{}, {:.1} KB)",
        path.display(),
        texture.width,
        texture.height,
        texture.size_bytes() as f32 / 1024.0
    );
    Ok(texture)
}
