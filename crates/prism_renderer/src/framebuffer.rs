//! Shared framebuffer for render output.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use prism_core::Srgb;
use prism_math::Vec3;

/// Display-ready sRGB image written concurrently by the render workers.
///
/// Each channel is stored as the bit pattern of an `f32` in an `AtomicU32`,
/// so workers can write disjoint tiles through a shared reference while a
/// preview reads from another thread. Readers may observe a partially
/// written image; every individual channel value is always whole.
///
/// Row 0 is the bottom of the image.
#[derive(Debug)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    channels: Vec<AtomicU32>,
}

impl Framebuffer {
    /// Create a new framebuffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * 3;
        Self {
            width,
            height,
            channels: (0..len).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y as usize * self.width as usize + x as usize) * 3
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Srgb {
        let o = self.offset(x, y);
        let c = |k: usize| f32::from_bits(self.channels[o + k].load(Ordering::Relaxed));
        Srgb(Vec3::new(c(0), c(1), c(2)))
    }

    /// Set the pixel at (x, y).
    pub fn set(&self, x: u32, y: u32, color: Srgb) {
        let o = self.offset(x, y);
        for (k, value) in color.0.to_array().into_iter().enumerate() {
            self.channels[o + k].store(value.to_bits(), Ordering::Relaxed);
        }
    }

    /// Copy of the current contents, bottom row first.
    pub fn snapshot(&self) -> Vec<Srgb> {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .map(|(x, y)| self.get(x, y))
            .collect()
    }

    /// Packed 8-bit RGB with the top row first, as image files expect.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut texels = Vec::with_capacity(self.width as usize * self.height as usize);
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                texels.push(self.get(x, y).to_u8());
            }
        }
        bytemuck::cast_slice::<[u8; 3], u8>(&texels).to_vec()
    }

    /// Encode the current contents as a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> image::ImageResult<()> {
        let path = path.as_ref();
        image::save_buffer_with_format(
            path,
            &self.to_rgb8(),
            self.width,
            self.height,
            image::ColorType::Rgb8,
            image::ImageFormat::Png,
        )?;
        log::debug!("Wrote {}x{} image to {}", self.width, self.height, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_black() {
        let fb = Framebuffer::new(4, 3);

        assert_eq!(fb.width(), 4);
        assert_eq!(fb.height(), 3);
        assert!(fb.snapshot().iter().all(|p| p.0 == Vec3::ZERO));
    }

    #[test]
    fn test_set_get() {
        let fb = Framebuffer::new(4, 3);
        let color = Srgb(Vec3::new(0.25, 0.5, 1.0));
        fb.set(3, 2, color);

        assert_eq!(fb.get(3, 2), color);
        assert_eq!(fb.get(2, 2).0, Vec3::ZERO);
        assert_eq!(fb.snapshot()[2 * 4 + 3], color);
    }

    #[test]
    fn test_rgb8_flips_rows() {
        let fb = Framebuffer::new(2, 2);
        fb.set(0, 0, Srgb(Vec3::new(1.0, 0.0, 0.0)));
        fb.set(1, 1, Srgb(Vec3::new(0.0, 0.0, 1.0)));

        let bytes = fb.to_rgb8();
        assert_eq!(bytes.len(), 12);
        // Top-left of the file is the framebuffer's (0, 1).
        assert_eq!(&bytes[0..3], &[0, 0, 0]);
        assert_eq!(&bytes[3..6], &[0, 0, 255]);
        assert_eq!(&bytes[6..9], &[255, 0, 0]);
    }

    #[test]
    fn test_concurrent_writes() {
        let fb = std::sync::Arc::new(Framebuffer::new(16, 16));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let fb = std::sync::Arc::clone(&fb);
                std::thread::spawn(move || {
                    for y in (t * 4)..(t * 4 + 4) {
                        for x in 0..16 {
                            fb.set(x, y, Srgb(Vec3::splat(t as f32 / 4.0)));
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(fb.get(5, 13).0, Vec3::splat(0.75));
        assert_eq!(fb.get(0, 0).0, Vec3::ZERO);
    }

    #[test]
    fn test_save_png() {
        let fb = Framebuffer::new(3, 2);
        fb.set(1, 0, Srgb(Vec3::ONE));
        let path = std::env::temp_dir().join(format!("prism_fb_{}.png", std::process::id()));

        fb.save_png(&path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgb8();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.dimensions(), (3, 2));
        assert_eq!(loaded.get_pixel(1, 1).0, [255, 255, 255]);
        assert_eq!(loaded.as_raw(), &fb.to_rgb8());
    }
}
