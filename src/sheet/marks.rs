//! Bubble mark detection over the preprocessed binary image.

use crate::config::SheetConfig;
use crate::sheet::preprocess::BinaryImage;
use crate::sheet::regions::{centered_square, crop, fill_fraction};
use std::collections::BTreeMap;
use tracing::debug;

/// Half-size of the square sampled around each class checkbox center.
const CHECKBOX_HALF: u32 = 10;

/// Scans the fixed answer grid and returns the detected option per question.
///
/// For question q (1-based) the row sits at grid_top + (q-1) * row_spacing;
/// option i (0-based) sits at grid_left + (i+1) * col_spacing. A square of
/// half-size mark_box_half is sampled at each position and the option with
/// the highest fill fraction wins, provided it exceeds mark_threshold.
/// Ties resolve to the first option in configured order (strict `>`
/// comparison). Questions with no bubble over the threshold are left out of
/// the map; a completely blank sheet yields an empty map.
pub fn detect_answers(binary: &BinaryImage, config: &SheetConfig) -> BTreeMap<String, char> {
    let mut answers = BTreeMap::new();

    for q in 1..=config.num_questions {
        let row = config.grid_top + (q - 1) * config.row_spacing;

        let mut selected = None;
        let mut best_fill = config.mark_threshold;

        for (i, &option) in config.options.iter().enumerate() {
            let col = config.grid_left + (i as u32 + 1) * config.col_spacing;
            let region = centered_square(col, row, config.mark_box_half);
            let fill = fill_fraction(&crop(binary, &region));

            if fill > best_fill {
                best_fill = fill;
                selected = Some(option);
            }
        }

        if let Some(option) = selected {
            debug!("question {}: {} (fill {:.2})", q, option, best_fill);
            answers.insert(q.to_string(), option);
        }
    }

    answers
}

/// Scans the class checkboxes and returns the label of the most-filled box,
/// if any exceeds checkbox_threshold. Used as a fallback when class OCR
/// fails; the acceptance threshold is higher than for answer bubbles since
/// checkboxes carry a printed outline.
pub fn detect_class_checkbox(binary: &BinaryImage, config: &SheetConfig) -> Option<String> {
    let area = crop(binary, &config.checkbox_region);

    let mut selected = None;
    let mut best_fill = config.checkbox_threshold;

    for checkbox in &config.class_checkboxes {
        let region = centered_square(checkbox.x, checkbox.y, CHECKBOX_HALF);
        let fill = fill_fraction(&crop(&area, &region));

        if fill > best_fill {
            best_fill = fill;
            selected = Some(checkbox.label.clone());
        }
    }

    selected
}
