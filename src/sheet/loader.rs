//! Sheet loading: raster images directly, PDFs via pdftoppm.

use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use std::path::Path;
use std::process::Command;

/// File extensions accepted for grading input.
const SUPPORTED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "pdf"];

/// Render resolution for PDF pages, in DPI.
const PDF_RENDER_DPI: &str = "150";

/// True if the path has a supported image or PDF extension.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Loads a scanned sheet. For PDFs only the first page is used.
///
/// Fails if the file cannot be decoded or decodes to an empty raster;
/// the caller decides whether to abort or skip the sheet.
pub fn load_sheet(path: &Path) -> Result<DynamicImage> {
    let img = if is_pdf(path) {
        render_pdf_first_page(path)?
    } else {
        image::open(path).context(format!("Could not load image from {}", path.display()))?
    };

    if img.width() == 0 || img.height() == 0 {
        return Err(anyhow!("Empty image in {}", path.display()));
    }

    Ok(img)
}

/// Renders the first page of a PDF to a raster by shelling out to pdftoppm.
fn render_pdf_first_page(path: &Path) -> Result<DynamicImage> {
    let dir = tempfile::tempdir().context("Failed to create temp dir for PDF rendering")?;
    let prefix = dir.path().join("page");

    let output = Command::new("pdftoppm")
        .arg("-png")
        .arg("-r")
        .arg(PDF_RENDER_DPI)
        .arg("-f")
        .arg("1")
        .arg("-l")
        .arg("1")
        .arg(path)
        .arg(&prefix)
        .output()
        .context("Failed to run pdftoppm (is poppler installed?)")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("pdftoppm failed for {}: {}", path.display(), stderr));
    }

    // pdftoppm pads the page number depending on the page count, so scan
    // the temp dir for the rendered file instead of guessing the name.
    let mut rendered: Vec<_> = std::fs::read_dir(dir.path())
        .context("Failed to read PDF render output dir")?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("png"))
        .collect();
    rendered.sort();

    let page = rendered
        .first()
        .ok_or_else(|| anyhow!("pdftoppm produced no output for {}", path.display()))?;

    image::open(page).context(format!("Could not decode rendered page of {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};
    use tempfile::tempdir;

    #[test]
    fn test_is_supported() {
        assert!(is_supported(Path::new("scan.png")));
        assert!(is_supported(Path::new("scan.JPG")));
        assert!(is_supported(Path::new("scan.jpeg")));
        assert!(is_supported(Path::new("exam.pdf")));
        assert!(!is_supported(Path::new("notes.txt")));
        assert!(!is_supported(Path::new("no_extension")));
    }

    #[test]
    fn test_load_sheet_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sheet.png");
        let img: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::from_pixel(50, 60, Luma([200]));
        img.save(&path).unwrap();

        let loaded = load_sheet(&path).unwrap();
        assert_eq!(loaded.width(), 50);
        assert_eq!(loaded.height(), 60);
    }

    #[test]
    fn test_load_sheet_missing_file_errors() {
        assert!(load_sheet(Path::new("does_not_exist.png")).is_err());
    }

    #[test]
    fn test_load_sheet_undecodable_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"not a png").unwrap();

        assert!(load_sheet(&path).is_err());
    }
}
