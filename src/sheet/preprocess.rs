//! Sheet preprocessing: grayscale, blur, polarity detection, and adaptive
//! thresholding into a binary image.
//!
//! The output convention is that marked (ink) pixels are foreground (255)
//! and paper is background (0), regardless of whether the scanned form was
//! light-on-dark or dark-on-light.

use image::{DynamicImage, GrayImage, ImageBuffer, Luma};

/// Binary image: foreground 255, background 0.
pub type BinaryImage = ImageBuffer<Luma<u8>, Vec<u8>>;

/// Window size for the adaptive threshold neighborhood mean.
const ADAPTIVE_BLOCK: u32 = 11;
/// Offset subtracted from the neighborhood mean.
const ADAPTIVE_C: i32 = 2;
/// Mean luminance below this midpoint means a dark-background form.
const POLARITY_MIDPOINT: f64 = 127.0;

/// Runs the full preprocessing pipeline on a decoded sheet image.
pub fn preprocess(img: &DynamicImage) -> BinaryImage {
    let gray = img.to_luma8();
    let dark_form = is_dark_form(&gray);
    let blurred = box_blur(&gray);
    adaptive_threshold(&blurred, dark_form)
}

/// Mean luminance of a grayscale image, 0.0 for an empty image.
pub fn mean_luminance(img: &GrayImage) -> f64 {
    let count = (img.width() * img.height()) as f64;
    if count == 0.0 {
        return 0.0;
    }
    let total: f64 = img.pixels().map(|p| p[0] as f64).sum();
    total / count
}

/// True when the form has a dark background (mean luminance below the
/// midpoint), in which case the threshold polarity is inverted.
pub fn is_dark_form(img: &GrayImage) -> bool {
    mean_luminance(img) < POLARITY_MIDPOINT
}

/// 3x3 mean blur to suppress sensor noise before thresholding.
///
/// Border pixels average over the in-bounds part of the window.
pub fn box_blur(img: &GrayImage) -> GrayImage {
    let (w, h) = img.dimensions();
    let mut out = ImageBuffer::new(w, h);

    for y in 0..h {
        for x in 0..w {
            let mut sum = 0u32;
            let mut count = 0u32;
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    if nx >= 0 && ny >= 0 && nx < w as i64 && ny < h as i64 {
                        sum += img.get_pixel(nx as u32, ny as u32)[0] as u32;
                        count += 1;
                    }
                }
            }
            out.put_pixel(x, y, Luma([(sum / count) as u8]));
        }
    }

    out
}

/// Adaptive mean thresholding.
///
/// Each pixel is compared against the mean of its surrounding
/// ADAPTIVE_BLOCK window (clamped at the borders), minus ADAPTIVE_C.
/// On a light form, ink is darker than its neighborhood and becomes
/// foreground; on a dark form the comparison is inverted so marks still
/// land on 255.
pub fn adaptive_threshold(img: &GrayImage, dark_form: bool) -> BinaryImage {
    let (w, h) = img.dimensions();
    let mut out = ImageBuffer::new(w, h);
    if w == 0 || h == 0 {
        return out;
    }

    let integral = integral_image(img);
    let half = (ADAPTIVE_BLOCK / 2) as i64;

    for y in 0..h {
        for x in 0..w {
            let x0 = (x as i64 - half).max(0) as u32;
            let y0 = (y as i64 - half).max(0) as u32;
            let x1 = (x as i64 + half).min(w as i64 - 1) as u32;
            let y1 = (y as i64 + half).min(h as i64 - 1) as u32;

            let area = ((x1 - x0 + 1) * (y1 - y0 + 1)) as i64;
            let sum = window_sum(&integral, w, x0, y0, x1, y1);
            let mean = (sum / area) as i32;

            let pixel = img.get_pixel(x, y)[0] as i32;
            let marked = if dark_form {
                pixel > mean + ADAPTIVE_C
            } else {
                pixel < mean - ADAPTIVE_C
            };

            out.put_pixel(x, y, Luma([if marked { 255 } else { 0 }]));
        }
    }

    out
}

/// Summed-area table with a zero row/column prefix, (w+1) x (h+1).
fn integral_image(img: &GrayImage) -> Vec<i64> {
    let (w, h) = img.dimensions();
    let stride = (w + 1) as usize;
    let mut table = vec![0i64; stride * (h + 1) as usize];

    for y in 0..h as usize {
        let mut row_sum = 0i64;
        for x in 0..w as usize {
            row_sum += img.get_pixel(x as u32, y as u32)[0] as i64;
            table[(y + 1) * stride + (x + 1)] = table[y * stride + (x + 1)] + row_sum;
        }
    }

    table
}

/// Sum of the inclusive window [x0..=x1] x [y0..=y1] from the integral table.
fn window_sum(integral: &[i64], img_width: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> i64 {
    let stride = (img_width + 1) as usize;
    let (x0, y0, x1, y1) = (x0 as usize, y0 as usize, x1 as usize + 1, y1 as usize + 1);
    integral[y1 * stride + x1] - integral[y0 * stride + x1] - integral[y1 * stride + x0]
        + integral[y0 * stride + x0]
}
