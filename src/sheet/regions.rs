//! Region cropping and fill measurement over binary sheet images.

use crate::config::Rect;
use crate::sheet::preprocess::BinaryImage;
use image::imageops;

/// Crops a rectangular sub-image, clamped to the image bounds.
///
/// An undersized scan produces a truncated region (possibly zero-sized)
/// rather than an error.
pub fn crop(img: &BinaryImage, region: &Rect) -> BinaryImage {
    let (w, h) = img.dimensions();

    let left = region.left.min(w);
    let top = region.top.min(h);
    let width = region.width.min(w - left);
    let height = region.height.min(h - top);

    imageops::crop_imm(img, left, top, width, height).to_image()
}

/// Fraction of foreground (255) pixels in a region, 0.0 for an empty region.
pub fn fill_fraction(img: &BinaryImage) -> f32 {
    let count = (img.width() * img.height()) as f32;
    if count == 0.0 {
        return 0.0;
    }
    let filled = img.pixels().filter(|p| p[0] == 255).count() as f32;
    filled / count
}

/// A square of the given half-size centered on (cx, cy). The square is
/// shifted rather than truncated when the center sits near the top or
/// left edge; crop() clamps the rest.
pub fn centered_square(cx: u32, cy: u32, half: u32) -> Rect {
    Rect {
        top: cy.saturating_sub(half),
        left: cx.saturating_sub(half),
        width: half * 2,
        height: half * 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    fn binary(w: u32, h: u32) -> BinaryImage {
        ImageBuffer::from_pixel(w, h, Luma([0]))
    }

    #[test]
    fn test_crop_inside_bounds() {
        let mut img = binary(100, 100);
        img.put_pixel(20, 30, Luma([255]));

        let region = Rect { top: 30, left: 20, width: 10, height: 10 };
        let cropped = crop(&img, &region);

        assert_eq!(cropped.dimensions(), (10, 10));
        assert_eq!(cropped.get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_crop_clamps_to_overlap() {
        let img = binary(100, 100);
        let region = Rect { top: 90, left: 95, width: 50, height: 50 };
        let cropped = crop(&img, &region);

        // Only the valid overlap survives
        assert_eq!(cropped.dimensions(), (5, 10));
    }

    #[test]
    fn test_crop_fully_outside_is_empty() {
        let img = binary(50, 50);
        let region = Rect { top: 200, left: 200, width: 10, height: 10 };
        let cropped = crop(&img, &region);

        assert_eq!(cropped.dimensions(), (0, 0));
    }

    #[test]
    fn test_fill_fraction() {
        let mut img = binary(10, 10);
        for x in 0..5 {
            for y in 0..10 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        assert!((fill_fraction(&img) - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_fill_fraction_empty_region() {
        let img = binary(0, 0);
        assert_eq!(fill_fraction(&img), 0.0);
    }

    #[test]
    fn test_centered_square() {
        let rect = centered_square(100, 50, 15);
        assert_eq!(rect, Rect { top: 35, left: 85, width: 30, height: 30 });
    }

    #[test]
    fn test_centered_square_near_origin() {
        // Center closer to the edge than the half-size must not underflow
        let rect = centered_square(5, 5, 15);
        assert_eq!(rect.top, 0);
        assert_eq!(rect.left, 0);
    }
}
