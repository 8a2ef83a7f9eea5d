//! Student name and class extraction.
//!
//! OCR runs over the name and class crops of the preprocessed image. A
//! failed or implausible class read falls back to the checkbox-fill scan;
//! anything still undetected becomes "Unknown".

pub mod engine;

use crate::config::{Rect, SheetConfig};
use crate::sheet::marks::detect_class_checkbox;
use crate::sheet::preprocess::BinaryImage;
use crate::sheet::regions::crop;
use image::{ImageBuffer, Luma};
use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;

/// Class OCR results longer than this are treated as misreads and trigger
/// the checkbox fallback.
const MAX_CLASS_LEN: usize = 5;

const UNKNOWN: &str = "Unknown";

/// Detected student identity fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentInfo {
    pub name: String,
    pub class: String,
}

/// Extracts student name and class from the preprocessed sheet.
pub fn extract_student_info(binary: &BinaryImage, config: &SheetConfig) -> StudentInfo {
    let name = read_region_text(binary, &config.name_region, config);
    let mut class = read_region_text(binary, &config.class_region, config);

    if class.is_empty() || class.chars().count() > MAX_CLASS_LEN {
        class = detect_class_checkbox(binary, config).unwrap_or_default();
    }

    StudentInfo {
        name: if name.is_empty() { UNKNOWN.to_string() } else { name },
        class: if class.is_empty() { UNKNOWN.to_string() } else { class },
    }
}

/// OCRs one region of the binary image. Errors degrade to an empty string
/// so a broken tesseract install never fails the pipeline.
fn read_region_text(binary: &BinaryImage, region: &Rect, config: &SheetConfig) -> String {
    let cropped = crop(binary, region);
    if cropped.width() == 0 || cropped.height() == 0 {
        return String::new();
    }

    // Tesseract expects dark text on a light background; the binary image
    // has foreground ink at 255.
    let inverted: ImageBuffer<Luma<u8>, Vec<u8>> =
        ImageBuffer::from_fn(cropped.width(), cropped.height(), |x, y| {
            Luma([255 - cropped.get_pixel(x, y)[0]])
        });

    match engine::recognize_text(&inverted, config.tesseract_cmd.as_deref()) {
        Ok(text) => clean_text(&text),
        Err(e) => {
            warn!("OCR failed: {}", e);
            String::new()
        }
    }
}

/// Strips OCR noise characters and collapses whitespace.
pub fn clean_text(text: &str) -> String {
    static NOISE: OnceLock<Regex> = OnceLock::new();
    let noise = NOISE.get_or_init(|| Regex::new(r"[^A-Za-z0-9 \-'.]").unwrap());

    let stripped = noise.replace_all(text, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
