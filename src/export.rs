//! Result and statistics export: flat CSV and raw JSON.

use crate::model::ExamResult;
use crate::stats::ExamStatistics;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

const CSV_HEADER: &str = "filename,student_name,class,score,total,percentage,processed_at";

/// Writes one CSV row per result.
pub fn export_csv(results: &[ExamResult], path: &Path) -> Result<()> {
    let mut file = File::create(path)
        .context(format!("Failed to create CSV file {}", path.display()))?;

    writeln!(file, "{}", CSV_HEADER).context("Failed to write CSV header")?;

    for result in results {
        writeln!(
            file,
            "{},{},{},{},{},{:.1},{}",
            csv_field(&result.filename),
            csv_field(&result.student_name),
            csv_field(&result.class_name),
            result.score,
            result.total,
            result.percentage(),
            result.processed_at,
        )
        .context("Failed to write CSV row")?;
    }

    Ok(())
}

/// Quotes a field when it contains a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Raw JSON passthrough of the result store.
pub fn export_json(results: &[ExamResult], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(results).context("Failed to serialize results")?;
    std::fs::write(path, json)
        .context(format!("Failed to write JSON file {}", path.display()))?;
    Ok(())
}

/// Pretty-printed statistics JSON.
pub fn export_statistics(stats: &ExamStatistics, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(stats).context("Failed to serialize statistics")?;
    std::fs::write(path, json)
        .context(format!("Failed to write statistics file {}", path.display()))?;
    Ok(())
}
