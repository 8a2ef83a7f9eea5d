//! Scanned-sheet processing pipeline.
//!
//! One-directional flow: load -> preprocess -> detect marks and student
//! info. Each sheet is processed independently; there is no state between
//! sheets.

pub mod loader;
pub mod marks;
pub mod preprocess;
pub mod regions;

use crate::config::SheetConfig;
use crate::model::SheetReading;
use crate::ocr;
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Runs the full detection pipeline on one sheet file.
///
/// Load and decode errors abort this sheet; OCR failures degrade to
/// "Unknown" name/class without failing the pipeline.
pub fn read_sheet(path: &Path, config: &SheetConfig) -> Result<SheetReading> {
    let img = loader::load_sheet(path)?;
    let binary = preprocess::preprocess(&img);

    let answers = marks::detect_answers(&binary, config);
    let info = ocr::extract_student_info(&binary, config);

    info!(
        "{}: {} / {}, {} answers detected",
        path.display(),
        info.name,
        info.class,
        answers.len()
    );

    Ok(SheetReading {
        student_name: info.name,
        class_name: info.class,
        answers,
    })
}
