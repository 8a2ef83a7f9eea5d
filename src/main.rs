//! marksheet: optical-mark-recognition exam grader.
//!
//! Processes scanned bubble-sheet exams against a calibrated form template:
//! detects marked answers, grades them against an answer key, stores results
//! in a JSON result store, and produces statistics, charts, and exports.

mod charts;
mod config;
mod export;
mod grading;
mod model;
mod ocr;
mod sheet;
mod stats;
mod store;

use anyhow::{Context, Result, anyhow, bail};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use config::SheetConfig;
use model::{AnswerKey, ExamResult};
use stats::ExamStatistics;
use store::ResultStore;

#[derive(Parser)]
#[command(name = "marksheet")]
#[command(about = "Grade scanned multiple-choice exam sheets")]
struct Cli {
    /// Form template configuration file
    #[arg(long, default_value = "sheet_config.json")]
    config: PathBuf,

    /// Result store file
    #[arg(long, default_value = "results.json")]
    results: PathBuf,

    /// Answer key file
    #[arg(long, default_value = "answer_key.json")]
    key: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process and grade sheet files (or directories of sheets)
    Grade {
        /// Image or PDF files, or directories to scan for them
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Manage the answer key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// List stored results
    List,
    /// Hand-correct a stored result; the record is re-graded in full
    Edit {
        /// Index of the result, as shown by `list`
        #[arg(long)]
        index: usize,
        /// Corrected student name
        #[arg(long)]
        name: Option<String>,
        /// Corrected class label
        #[arg(long)]
        class: Option<String>,
        /// Corrected answers as Q=OPT; use Q=- to mark unanswered
        #[arg(long)]
        answer: Vec<String>,
    },
    /// Print aggregate statistics and write them as JSON
    Stats {
        /// Only include results for this class
        #[arg(long)]
        class: Option<String>,
        /// Statistics JSON output path
        #[arg(long, default_value = "statistics.json")]
        output: PathBuf,
    },
    /// Render score-distribution and question-performance charts
    Charts {
        /// Output directory for PNG files
        #[arg(long, default_value = "charts")]
        output: PathBuf,
    },
    /// Export results as CSV or JSON
    Export {
        #[arg(long, value_enum)]
        format: ExportFormat,
        #[arg(long)]
        output: PathBuf,
    },
    /// Write the default form template configuration for calibration
    InitConfig,
}

#[derive(Subcommand)]
enum KeyAction {
    /// Set answers as Q=OPT pairs, e.g. `key set 1=A 2=B`
    Set {
        #[arg(required = true)]
        pairs: Vec<String>,
    },
    /// Remove questions from the key
    Unset {
        #[arg(required = true)]
        questions: Vec<String>,
    },
    /// Print the current key
    Show,
    /// Remove all answers from the key
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

fn main() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = SheetConfig::load(&cli.config);

    match cli.command {
        Command::Grade { ref inputs } => cmd_grade(&cli.results, &cli.key, &config, inputs),
        Command::Key { ref action } => cmd_key(&cli.key, &config, action),
        Command::List => cmd_list(&cli.results, &config),
        Command::Edit { index, ref name, ref class, ref answer } => cmd_edit(
            &cli.results,
            &cli.key,
            index,
            name.clone(),
            class.clone(),
            answer,
        ),
        Command::Stats { ref class, ref output } => {
            cmd_stats(&cli.results, &config, class.as_deref(), output)
        }
        Command::Charts { ref output } => cmd_charts(&cli.results, &config, output),
        Command::Export { format, ref output } => cmd_export(&cli.results, format, output),
        Command::InitConfig => {
            SheetConfig::save_default(&cli.config)?;
            println!("Wrote default template to {}", cli.config.display());
            Ok(())
        }
    }
}

fn cmd_grade(
    results_path: &Path,
    key_path: &Path,
    config: &SheetConfig,
    inputs: &[PathBuf],
) -> Result<()> {
    let key = store::load_answer_key(key_path)?;
    if key.is_empty() {
        bail!(
            "Answer key {} is empty; set one first with `marksheet key set 1=A 2=B ...`",
            key_path.display()
        );
    }

    let files = collect_input_files(inputs)?;
    if files.is_empty() {
        bail!("No supported sheet files found (png, jpg, jpeg, pdf)");
    }

    let mut result_store = ResultStore::load(results_path)?;
    let mut processed = 0usize;

    for file in &files {
        // One sheet's failure never halts the batch
        match process_one(file, config, &key) {
            Ok(result) => {
                println!(
                    "{}: {} ({}) {}/{}",
                    result.filename,
                    result.student_name,
                    result.class_name,
                    result.score,
                    result.total
                );
                result_store.append(result);
                processed += 1;
            }
            Err(e) => {
                error!("Skipping {}: {:#}", file.display(), e);
            }
        }
    }

    result_store.save()?;
    info!(
        "Processed {} of {} sheets; {} results stored in {}",
        processed,
        files.len(),
        result_store.len(),
        results_path.display()
    );
    Ok(())
}

fn process_one(path: &Path, config: &SheetConfig, key: &AnswerKey) -> Result<ExamResult> {
    let reading = sheet::read_sheet(path, config)?;
    let (score, answers) = grading::grade(&reading.answers, key);

    Ok(ExamResult {
        filename: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        student_name: reading.student_name,
        class_name: reading.class_name,
        answers,
        score,
        total: key.len() as u32,
        processed_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    })
}

/// Expands directories and filters everything down to supported sheet
/// files, sorted for a deterministic processing order.
fn collect_input_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            for entry in std::fs::read_dir(input)
                .context(format!("Failed to read directory {}", input.display()))?
            {
                let path = entry?.path();
                if path.is_file() && sheet::loader::is_supported(&path) {
                    files.push(path);
                }
            }
        } else if sheet::loader::is_supported(input) {
            files.push(input.clone());
        } else {
            warn!("Ignoring unsupported file {}", input.display());
        }
    }

    files.sort();
    Ok(files)
}

fn cmd_key(key_path: &Path, config: &SheetConfig, action: &KeyAction) -> Result<()> {
    match action {
        KeyAction::Set { pairs } => {
            let mut key = store::load_answer_key(key_path)?;
            for pair in pairs {
                let (question, option) = parse_assignment(pair)?;
                let option = option
                    .ok_or_else(|| anyhow!("Answer key entries need an option: {}", pair))?;
                if !config.options.contains(&option) {
                    bail!(
                        "Option {} is not in the configured alphabet {:?}",
                        option,
                        config.options
                    );
                }
                key.set(question, option);
            }
            store::save_answer_key(key_path, &key)?;
            println!("Answer key now has {} questions", key.len());
        }
        KeyAction::Unset { questions } => {
            let mut key = store::load_answer_key(key_path)?;
            for question in questions {
                if key.remove(question).is_none() {
                    warn!("Question {} was not in the key", question);
                }
            }
            store::save_answer_key(key_path, &key)?;
            println!("Answer key now has {} questions", key.len());
        }
        KeyAction::Show => {
            let key = store::load_answer_key(key_path)?;
            if key.is_empty() {
                println!("Answer key is empty");
            }
            for (question, option) in key.iter() {
                println!("{} = {}", question, option);
            }
        }
        KeyAction::Clear => {
            store::save_answer_key(key_path, &AnswerKey::new())?;
            println!("Answer key cleared");
        }
    }
    Ok(())
}

fn cmd_list(results_path: &Path, config: &SheetConfig) -> Result<()> {
    let result_store = ResultStore::load(results_path)?;
    if result_store.is_empty() {
        println!("No results stored");
        return Ok(());
    }

    println!(
        "{:<5} {:<24} {:<20} {:<8} {:>7} {:>9} {:>6}",
        "#", "file", "student", "class", "score", "percent", "grade"
    );
    for (i, result) in result_store.all().iter().enumerate() {
        let percentage = result.percentage();
        let grade = grading::assign_grade(percentage, &config.grade_boundaries);
        println!(
            "{:<5} {:<24} {:<20} {:<8} {:>3}/{:<3} {:>8.1}% {:>6}",
            i,
            result.filename,
            result.student_name,
            result.class_name,
            result.score,
            result.total,
            percentage,
            grade
        );
    }
    Ok(())
}

fn cmd_edit(
    results_path: &Path,
    key_path: &Path,
    index: usize,
    name: Option<String>,
    class: Option<String>,
    answer_args: &[String],
) -> Result<()> {
    let key = store::load_answer_key(key_path)?;
    if key.is_empty() {
        bail!("Answer key {} is empty; cannot re-grade", key_path.display());
    }

    let mut result_store = ResultStore::load(results_path)?;
    let mut result = result_store
        .get(index)
        .ok_or_else(|| anyhow!("No result at index {}", index))?
        .clone();

    if let Some(name) = name {
        result.student_name = name;
    }
    if let Some(class) = class {
        result.class_name = class;
    }

    // Rebuild the detected-answer map from the stored record, apply the
    // edits, then re-grade the whole record against the current key.
    // Partial recomputation is not supported.
    let mut detected: BTreeMap<String, char> = result
        .answers
        .iter()
        .filter_map(|(q, m)| m.detected.map(|d| (q.clone(), d)))
        .collect();

    for arg in answer_args {
        let (question, option) = parse_assignment(arg)?;
        match option {
            Some(option) => {
                detected.insert(question, option);
            }
            None => {
                detected.remove(&question);
            }
        }
    }

    let (score, answers) = grading::grade(&detected, &key);
    result.score = score;
    result.answers = answers;
    result.total = key.len() as u32;

    result_store.update(index, result)?;
    result_store.save()?;
    println!("Result {} updated and re-graded", index);
    Ok(())
}

fn cmd_stats(
    results_path: &Path,
    config: &SheetConfig,
    class: Option<&str>,
    output: &Path,
) -> Result<()> {
    let result_store = ResultStore::load(results_path)?;

    let filtered: Vec<ExamResult> = match class {
        Some(class) => result_store
            .all()
            .iter()
            .filter(|r| r.class_name == class)
            .cloned()
            .collect(),
        None => result_store.all().to_vec(),
    };

    let Some(stats) = ExamStatistics::from_results(&filtered, &config.grade_boundaries) else {
        println!("No results available for analysis");
        return Ok(());
    };

    println!("Students:        {}", stats.num_students);
    println!("Mean score:      {:.2}", stats.mean_score);
    println!("Median score:    {:.2}", stats.median_score);
    println!("Highest/lowest:  {} / {}", stats.highest_score, stats.lowest_score);
    println!("Mean percentage: {:.1}%", stats.mean_percentage);

    println!("Grades:");
    for (grade, count) in &stats.grade_distribution {
        println!("  {}: {}", grade, count);
    }

    println!(
        "Difficulty: {} easy, {} medium, {} hard",
        stats.difficulty.easy.len(),
        stats.difficulty.medium.len(),
        stats.difficulty.hard.len()
    );
    if !stats.difficulty.hard.is_empty() {
        println!("  hard questions: {}", stats.difficulty.hard.join(", "));
    }

    export::export_statistics(&stats, output)?;
    info!("Statistics written to {}", output.display());
    Ok(())
}

fn cmd_charts(results_path: &Path, config: &SheetConfig, output: &Path) -> Result<()> {
    let result_store = ResultStore::load(results_path)?;

    let Some(stats) = ExamStatistics::from_results(result_store.all(), &config.grade_boundaries)
    else {
        println!("No results available for analysis");
        return Ok(());
    };

    let paths = charts::generate_charts(&stats, output)?;
    for path in paths {
        println!("Chart written to {}", path.display());
    }
    Ok(())
}

fn cmd_export(results_path: &Path, format: ExportFormat, output: &Path) -> Result<()> {
    let result_store = ResultStore::load(results_path)?;

    match format {
        ExportFormat::Csv => export::export_csv(result_store.all(), output)?,
        ExportFormat::Json => export::export_json(result_store.all(), output)?,
    }
    println!("Exported {} results to {}", result_store.len(), output.display());
    Ok(())
}

/// Parses a `Q=OPT` argument. `Q=-` yields (Q, None), used by `edit` to
/// mark a question unanswered.
fn parse_assignment(arg: &str) -> Result<(String, Option<char>)> {
    let (question, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected Q=OPT, got {}", arg))?;

    if question.is_empty() || question.parse::<u32>().is_err() {
        bail!("Question must be a positive number: {}", arg);
    }

    if value == "-" {
        return Ok((question.to_string(), None));
    }

    let mut chars = value.chars();
    let (Some(option), None) = (chars.next(), chars.next()) else {
        bail!("Option must be a single character: {}", arg);
    };

    Ok((question.to_string(), Some(option)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("3=B").unwrap(), ("3".to_string(), Some('B')));
        assert_eq!(parse_assignment("12=-").unwrap(), ("12".to_string(), None));
        assert!(parse_assignment("three=B").is_err());
        assert!(parse_assignment("3").is_err());
        assert!(parse_assignment("3=AB").is_err());
        assert!(parse_assignment("=A").is_err());
    }
}
