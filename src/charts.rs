//! Chart generation using plotters.
//!
//! Renders a score-distribution histogram and a per-question performance
//! chart with difficulty-colored bars.

use crate::stats::{EASY_MIN_PERCENT, ExamStatistics, MEDIUM_MIN_PERCENT};
use anyhow::{Context, Result};
use plotters::prelude::*;
use std::path::{Path, PathBuf};

const CHART_WIDTH: u32 = 900;
const CHART_HEIGHT: u32 = 600;

const EASY_COLOR: RGBColor = RGBColor(46, 160, 67);
const MEDIUM_COLOR: RGBColor = RGBColor(230, 126, 34);
const HARD_COLOR: RGBColor = RGBColor(202, 52, 52);
const BAR_COLOR: RGBColor = RGBColor(93, 143, 218);

/// Generates both charts into the output directory and returns their paths.
pub fn generate_charts(stats: &ExamStatistics, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .context(format!("Failed to create chart dir {}", output_dir.display()))?;

    let score_path = output_dir.join("score_distribution.png");
    generate_score_distribution(stats, &score_path)?;

    let question_path = output_dir.join("question_performance.png");
    generate_question_performance(stats, &question_path)?;

    Ok(vec![score_path, question_path])
}

/// Bar chart of how many students achieved each score.
pub fn generate_score_distribution(stats: &ExamStatistics, output_path: &Path) -> Result<()> {
    let root = BitMapBackend::new(output_path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).context("Failed to fill chart background")?;

    let max_score = stats.score_distribution.keys().max().copied().unwrap_or(0);
    let max_count = stats.score_distribution.values().max().copied().unwrap_or(1);

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Score Distribution (n = {})", stats.num_students),
            ("sans-serif", 28),
        )
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(max_score as f64 + 0.5), 0u32..(max_count + 1))
        .context("Failed to build score distribution chart")?;

    chart
        .configure_mesh()
        .x_desc("Score")
        .y_desc("Number of Students")
        .x_label_formatter(&|x| format!("{:.0}", x))
        .draw()
        .context("Failed to draw mesh")?;

    for (&score, &count) in &stats.score_distribution {
        let x = score as f64;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.4, 0), (x + 0.4, count)],
            BAR_COLOR.filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.4, 0), (x + 0.4, count)],
            BAR_COLOR.stroke_width(1),
        )))?;
    }

    root.present().context("Failed to save score distribution chart")?;
    Ok(())
}

/// Per-question correctness percentages, colored by difficulty bucket,
/// with cut lines at the easy and medium thresholds.
pub fn generate_question_performance(stats: &ExamStatistics, output_path: &Path) -> Result<()> {
    let root = BitMapBackend::new(output_path, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).context("Failed to fill chart background")?;

    // Numeric question order, matching the difficulty listings
    let mut questions: Vec<(&String, f64)> = stats
        .question_stats
        .iter()
        .map(|(q, s)| (q, s.percentage))
        .collect();
    questions.sort_by_key(|(q, _)| q.parse::<u32>().unwrap_or(u32::MAX));

    let n = questions.len().max(1);

    let mut chart = ChartBuilder::on(&root)
        .caption("Performance by Question", ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0.0f64..100.0)
        .context("Failed to build question performance chart")?;

    let labels: Vec<&String> = questions.iter().map(|(q, _)| *q).collect();
    chart
        .configure_mesh()
        .x_desc("Question")
        .y_desc("Percentage Correct (%)")
        .x_labels(n)
        .x_label_formatter(&|x| {
            let idx = x.round() as usize;
            labels.get(idx).map(|q| q.to_string()).unwrap_or_default()
        })
        .draw()
        .context("Failed to draw mesh")?;

    for (i, (_, percentage)) in questions.iter().enumerate() {
        let color = difficulty_color(*percentage);
        let x = i as f64;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - 0.35, 0.0), (x + 0.35, *percentage)],
            color.filled(),
        )))?;
    }

    // Difficulty cut lines
    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(-0.5, EASY_MIN_PERCENT), (n as f64 - 0.5, EASY_MIN_PERCENT)],
            EASY_COLOR.mix(0.6).stroke_width(2),
        )))?
        .label(format!("Easy (>= {:.0}%)", EASY_MIN_PERCENT))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], EASY_COLOR.stroke_width(2)));

    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(-0.5, MEDIUM_MIN_PERCENT), (n as f64 - 0.5, MEDIUM_MIN_PERCENT)],
            MEDIUM_COLOR.mix(0.6).stroke_width(2),
        )))?
        .label(format!("Medium (>= {:.0}%)", MEDIUM_MIN_PERCENT))
        .legend(|(x, y)| {
            PathElement::new(vec![(x, y), (x + 20, y)], MEDIUM_COLOR.stroke_width(2))
        });

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .context("Failed to draw legend")?;

    root.present().context("Failed to save question performance chart")?;
    Ok(())
}

/// Bar color for a question's correctness percentage, matching the
/// difficulty buckets.
fn difficulty_color(percentage: f64) -> RGBColor {
    if percentage >= EASY_MIN_PERCENT {
        EASY_COLOR
    } else if percentage >= MEDIUM_MIN_PERCENT {
        MEDIUM_COLOR
    } else {
        HARD_COLOR
    }
}
