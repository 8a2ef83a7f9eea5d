//! Tesseract invocation.
//!
//! Shells out to the tesseract executable: the crop is saved to a temp PNG,
//! recognized with `--psm 6` (single uniform block of text), and the plain
//! stdout text is returned.

use anyhow::{Context, Result, anyhow};
use image::{ImageBuffer, Luma};
use std::process::Command;
use tempfile::NamedTempFile;

/// OCR language passed to tesseract.
const OCR_LANGUAGE: &str = "eng";

/// Runs tesseract over a grayscale region and returns the raw text.
///
/// `tesseract_cmd` overrides the executable; None means resolve from PATH.
pub fn recognize_text(
    img: &ImageBuffer<Luma<u8>, Vec<u8>>,
    tesseract_cmd: Option<&str>,
) -> Result<String> {
    let temp_input = NamedTempFile::with_suffix(".png")
        .context("Failed to create temp file for OCR input")?;
    img.save(temp_input.path())
        .context("Failed to save OCR input image")?;

    let exe = tesseract_cmd.unwrap_or("tesseract");
    let output = Command::new(exe)
        .arg(temp_input.path())
        .arg("stdout")
        .arg("-l")
        .arg(OCR_LANGUAGE)
        .arg("--psm")
        .arg("6")
        .output()
        .context(format!("Failed to run tesseract ({})", exe))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("Tesseract failed: {}", stderr));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
