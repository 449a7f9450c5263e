//! Tile partitioning for the render scheduler.
//!
//! The image is cut into square tiles that workers claim one at a time. Tiles
//! are generated row by row starting at framebuffer row 0 (the bottom of the
//! image).

/// A rectangular region of the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Column of the tile's first pixel
    pub x: u32,
    /// Row of the tile's first pixel
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Tile {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the total number of pixels in this tile.
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Pixel coordinates covered by the tile, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> {
        let (x0, width) = (self.x, self.width);
        (self.y..self.y + self.height).flat_map(move |j| (x0..x0 + width).map(move |i| (i, j)))
    }
}

/// Cover a `width` x `height` image with tiles of edge `tile_size`.
///
/// Tiles on the right and top borders are clipped to the image. A zero
/// `tile_size` is treated as 1.
pub fn generate_tiles(width: u32, height: u32, tile_size: u32) -> Vec<Tile> {
    let tile_size = tile_size.max(1);
    let mut tiles = Vec::new();

    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let tw = tile_size.min(width - x);
            let th = tile_size.min(height - y);
            tiles.push(Tile::new(x, y, tw, th));
            x += tile_size;
        }
        y += tile_size;
    }

    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_tiles_exact_fit() {
        let tiles = generate_tiles(128, 128, 64);
        assert_eq!(tiles.len(), 4);

        let total_pixels: u32 = tiles.iter().map(|t| t.pixel_count()).sum();
        assert_eq!(total_pixels, 128 * 128);
    }

    #[test]
    fn test_generate_tiles_partial_fit() {
        let tiles = generate_tiles(100, 70, 64);
        assert_eq!(tiles.len(), 4);
        assert_eq!(tiles[1], Tile::new(64, 0, 36, 64));
        assert_eq!(tiles[3], Tile::new(64, 64, 36, 6));

        let total_pixels: u32 = tiles.iter().map(|t| t.pixel_count()).sum();
        assert_eq!(total_pixels, 100 * 70);
    }

    #[test]
    fn test_row_major_order() {
        let tiles = generate_tiles(96, 64, 32);

        let origins: Vec<_> = tiles.iter().map(|t| (t.x, t.y)).collect();
        assert_eq!(
            origins,
            vec![(0, 0), (32, 0), (64, 0), (0, 32), (32, 32), (64, 32)]
        );
    }

    #[test]
    fn test_every_pixel_covered_once() {
        let (w, h) = (37, 23);
        let mut seen = vec![0u8; (w * h) as usize];
        for tile in generate_tiles(w, h, 8) {
            for (i, j) in tile.pixels() {
                seen[(j * w + i) as usize] += 1;
            }
        }

        assert!(seen.iter().all(|&n| n == 1));
    }

    #[test]
    fn test_zero_tile_size() {
        let tiles = generate_tiles(3, 2, 0);
        assert_eq!(tiles.len(), 6);
    }

    #[test]
    fn test_empty_image() {
        assert!(generate_tiles(0, 10, 32).is_empty());
    }
}
