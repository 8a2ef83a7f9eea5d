//! Aggregate statistics over a set of exam results.
//!
//! Everything here is a derived view: nothing is persisted except through
//! the explicit JSON export.

use crate::config::GradeBoundary;
use crate::grading::{assign_grade, calculate_percentage};
use crate::model::ExamResult;
use serde::Serialize;
use std::collections::BTreeMap;

/// Questions answered correctly by at least this percentage are easy.
pub const EASY_MIN_PERCENT: f64 = 75.0;
/// Questions at or above this (but below easy) are medium; the rest hard.
pub const MEDIUM_MIN_PERCENT: f64 = 40.0;

/// Per-question aggregate over all results that include the question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionStats {
    pub correct: u32,
    /// Number of results containing this question. Totals can differ per
    /// question when results were graded against different keys.
    pub total: u32,
    pub percentage: f64,
    /// How many students picked each option.
    pub choices: BTreeMap<char, u32>,
}

/// Question identifiers bucketed by aggregate correctness.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DifficultySplit {
    pub easy: Vec<String>,
    pub medium: Vec<String>,
    pub hard: Vec<String>,
}

/// Derived statistics for a result set.
#[derive(Debug, Clone, Serialize)]
pub struct ExamStatistics {
    pub num_students: usize,
    pub mean_score: f64,
    pub median_score: f64,
    pub highest_score: u32,
    pub lowest_score: u32,
    /// Mean of the per-result percentages. Not the same as
    /// mean_score / mean_total when totals vary across results.
    pub mean_percentage: f64,
    pub grade_distribution: BTreeMap<String, u32>,
    pub score_distribution: BTreeMap<u32, u32>,
    pub question_stats: BTreeMap<String, QuestionStats>,
    pub difficulty: DifficultySplit,
}

impl ExamStatistics {
    /// Computes statistics over a result slice, or None when it is empty.
    pub fn from_results(results: &[ExamResult], boundaries: &[GradeBoundary]) -> Option<Self> {
        if results.is_empty() {
            return None;
        }

        let scores: Vec<u32> = results.iter().map(|r| r.score).collect();
        let percentages: Vec<f64> = results
            .iter()
            .map(|r| calculate_percentage(r.score, r.total))
            .collect();

        let mut grade_distribution: BTreeMap<String, u32> = BTreeMap::new();
        for &p in &percentages {
            *grade_distribution.entry(assign_grade(p, boundaries)).or_insert(0) += 1;
        }

        let mut score_distribution: BTreeMap<u32, u32> = BTreeMap::new();
        for &s in &scores {
            *score_distribution.entry(s).or_insert(0) += 1;
        }

        let question_stats = accumulate_question_stats(results);
        let difficulty = bucket_by_difficulty(&question_stats);

        Some(ExamStatistics {
            num_students: results.len(),
            mean_score: mean(&scores),
            median_score: median(&scores),
            highest_score: scores.iter().copied().max().unwrap_or(0),
            lowest_score: scores.iter().copied().min().unwrap_or(0),
            mean_percentage: percentages.iter().sum::<f64>() / percentages.len() as f64,
            grade_distribution,
            score_distribution,
            question_stats,
            difficulty,
        })
    }
}

/// Accumulates correct/total counts per question across all results that
/// include that question.
fn accumulate_question_stats(results: &[ExamResult]) -> BTreeMap<String, QuestionStats> {
    let mut stats: BTreeMap<String, QuestionStats> = BTreeMap::new();

    for result in results {
        for (question, marked) in &result.answers {
            let entry = stats.entry(question.clone()).or_insert(QuestionStats {
                correct: 0,
                total: 0,
                percentage: 0.0,
                choices: BTreeMap::new(),
            });
            entry.total += 1;
            if marked.is_correct {
                entry.correct += 1;
            }
            if let Some(choice) = marked.detected {
                *entry.choices.entry(choice).or_insert(0) += 1;
            }
        }
    }

    for entry in stats.values_mut() {
        entry.percentage = if entry.total > 0 {
            (entry.correct as f64 / entry.total as f64) * 100.0
        } else {
            0.0
        };
    }

    stats
}

/// Partitions questions into easy/medium/hard by correctness percentage.
/// Each bucket is sorted numerically where identifiers parse as integers.
fn bucket_by_difficulty(stats: &BTreeMap<String, QuestionStats>) -> DifficultySplit {
    let mut split = DifficultySplit::default();

    for (question, s) in stats {
        let bucket = if s.percentage >= EASY_MIN_PERCENT {
            &mut split.easy
        } else if s.percentage >= MEDIUM_MIN_PERCENT {
            &mut split.medium
        } else {
            &mut split.hard
        };
        bucket.push(question.clone());
    }

    for bucket in [&mut split.easy, &mut split.medium, &mut split.hard] {
        bucket.sort_by_key(|q| q.parse::<u32>().unwrap_or(u32::MAX));
    }

    split
}

fn mean(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|&v| v as u64).sum::<u64>() as f64 / values.len() as f64
}

/// Median of the values: middle element, or the average of the two middle
/// elements for an even count.
fn median(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] as f64 + sorted[n / 2] as f64) / 2.0
    } else {
        sorted[n / 2] as f64
    }
}
