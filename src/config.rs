//! Sheet template configuration.
//!
//! All detection geometry is calibrated against one fixed form template and
//! loaded from sheet_config.json. Missing file or unknown fields fall back
//! to the built-in defaults so the tool works out of the box with the
//! standard 16-question form.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// A rectangle in absolute pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub top: u32,
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

/// A labeled checkbox center, relative to the top-left corner of the
/// class checkbox region.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCheckbox {
    pub label: String,
    pub x: u32,
    pub y: u32,
}

/// One row of the grade boundary table: the minimum percentage that earns
/// the letter grade.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradeBoundary {
    pub grade: String,
    pub min_percentage: f64,
}

/// Complete form template and detection configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    /// Free-text student name field.
    pub name_region: Rect,
    /// Free-text class field. OCR on this region falls back to the
    /// checkbox scan when the result is empty or implausibly long.
    pub class_region: Rect,
    /// Region containing the class checkboxes.
    pub checkbox_region: Rect,
    /// Checkbox centers inside checkbox_region.
    pub class_checkboxes: Vec<ClassCheckbox>,

    /// Row position of the first answer row.
    pub grid_top: u32,
    /// Column position of the answer grid origin.
    pub grid_left: u32,
    /// Vertical spacing between question rows.
    pub row_spacing: u32,
    /// Horizontal spacing between option columns.
    pub col_spacing: u32,
    /// Half-size of the square sampled around each bubble center.
    pub mark_box_half: u32,

    pub num_questions: u32,
    /// Option alphabet, in tie-break order.
    pub options: Vec<char>,

    /// Minimum fill fraction for an answer bubble to count as marked.
    pub mark_threshold: f32,
    /// Minimum fill fraction for a class checkbox to count as marked.
    pub checkbox_threshold: f32,

    /// Letter grade table, evaluated from the highest boundary downward.
    pub grade_boundaries: Vec<GradeBoundary>,

    /// Override for the tesseract executable. None means use PATH.
    pub tesseract_cmd: Option<String>,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            name_region: Rect { top: 120, left: 550, width: 300, height: 40 },
            class_region: Rect { top: 120, left: 120, width: 300, height: 40 },
            checkbox_region: Rect { top: 120, left: 120, width: 400, height: 40 },
            class_checkboxes: default_class_checkboxes(),
            grid_top: 440,
            grid_left: 120,
            row_spacing: 40,
            col_spacing: 100,
            mark_box_half: 15,
            num_questions: 16,
            options: vec!['A', 'B', 'C', 'D'],
            mark_threshold: 0.10,
            checkbox_threshold: 0.30,
            grade_boundaries: default_grade_boundaries(),
            tesseract_cmd: None,
        }
    }
}

fn default_class_checkboxes() -> Vec<ClassCheckbox> {
    [("G", 30), ("O", 100), ("S", 170), ("F", 240), ("R", 310), ("D", 380)]
        .into_iter()
        .map(|(label, x)| ClassCheckbox {
            label: label.to_string(),
            x,
            y: 20,
        })
        .collect()
}

fn default_grade_boundaries() -> Vec<GradeBoundary> {
    [("A", 85.0), ("B", 70.0), ("C", 55.0), ("D", 40.0), ("E", 20.0), ("F", 0.0)]
        .into_iter()
        .map(|(grade, min_percentage)| GradeBoundary {
            grade: grade.to_string(),
            min_percentage,
        })
        .collect()
}

impl SheetConfig {
    /// Loads configuration from a JSON file, or returns defaults if the
    /// file is missing or malformed.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str(&contents) {
                    Ok(config) => return config,
                    Err(e) => {
                        warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                }
            }
        }
        Self::default()
    }

    /// Writes the default configuration to a file for calibration reference.
    pub fn save_default(path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&Self::default())?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = SheetConfig::default();
        assert_eq!(config.num_questions, 16);
        assert_eq!(config.options, vec!['A', 'B', 'C', 'D']);
        assert!((config.mark_threshold - 0.10).abs() < f32::EPSILON);
        assert!((config.checkbox_threshold - 0.30).abs() < f32::EPSILON);
        assert_eq!(config.class_checkboxes.len(), 6);
        assert_eq!(config.grade_boundaries[0].grade, "A");
        assert_eq!(config.grade_boundaries.last().unwrap().grade, "F");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = SheetConfig::load(Path::new("no_such_config.json"));
        assert_eq!(config.num_questions, 16);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"num_questions": 20, "mark_threshold": 0.25}}"#).unwrap();

        let config = SheetConfig::load(file.path());
        assert_eq!(config.num_questions, 20);
        assert!((config.mark_threshold - 0.25).abs() < f32::EPSILON);
        // Untouched fields keep their defaults
        assert_eq!(config.grid_top, 440);
        assert_eq!(config.options, vec!['A', 'B', 'C', 'D']);
    }

    #[test]
    fn test_load_malformed_config_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let config = SheetConfig::load(file.path());
        assert_eq!(config.num_questions, 16);
    }

    #[test]
    fn test_config_round_trip() {
        let config = SheetConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: SheetConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.grid_left, config.grid_left);
        assert_eq!(back.class_checkboxes, config.class_checkboxes);
    }
}
