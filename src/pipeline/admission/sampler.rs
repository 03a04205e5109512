//! Bounded grid sampling of decoded rasters.
//!
//! The grid has roughly 20 steps per axis whatever the resolution, walked
//! row-major from the origin and capped at 500 pixels, so a 40-megapixel scan
//! costs the same as a thumbnail.

use image::{DynamicImage, GenericImageView, RgbImage};

/// Hard cap on sampled pixels.
pub const MAX_SAMPLES: usize = 500;

/// Target number of grid steps along each axis.
pub const GRID_DIVISIONS: u32 = 20;

/// Ordered `(r, g, b)` triples drawn from one image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelSample {
    pixels: Vec<[u8; 3]>,
}

impl PixelSample {
    pub fn from_pixels(pixels: Vec<[u8; 3]>) -> Self {
        Self { pixels }
    }

    pub fn pixels(&self) -> &[[u8; 3]] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Stride along one axis: `max(1, extent / 20)`.
pub fn grid_stride(extent: u32) -> u32 {
    (extent / GRID_DIVISIONS).max(1)
}

/// Walk the sampling grid over a `width` x `height` raster, reading each
/// visited pixel through `pixel_at(x, y)`.
pub fn sample_grid<F>(width: u32, height: u32, pixel_at: F) -> PixelSample
where
    F: Fn(u32, u32) -> [u8; 3],
{
    let row_stride = grid_stride(height) as usize;
    let col_stride = grid_stride(width) as usize;
    let mut pixels = Vec::with_capacity(MAX_SAMPLES);

    'rows: for y in (0..height).step_by(row_stride) {
        for x in (0..width).step_by(col_stride) {
            pixels.push(pixel_at(x, y));
            if pixels.len() >= MAX_SAMPLES {
                break 'rows;
            }
        }
    }

    PixelSample { pixels }
}

/// Sample a decoded image of any color type. Alpha is ignored.
pub fn sample_image(image: &DynamicImage) -> PixelSample {
    let (width, height) = image.dimensions();
    sample_grid(width, height, |x, y| {
        let [r, g, b, _] = image.get_pixel(x, y).0;
        [r, g, b]
    })
}

/// Sample an RGB buffer.
pub fn sample_rgb(image: &RgbImage) -> PixelSample {
    sample_grid(image.width(), image.height(), |x, y| image.get_pixel(x, y).0)
}
