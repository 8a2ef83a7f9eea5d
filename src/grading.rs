//! Grading: answer comparison, percentages, and letter grades.

use crate::config::GradeBoundary;
use crate::model::{AnswerKey, MarkedAnswer};
use std::collections::BTreeMap;

/// Grades a set of detected answers against the answer key.
///
/// The key is authoritative for the question universe: every question in the
/// key produces a [`MarkedAnswer`], whether or not the sheet had a detectable
/// mark for it. Detected answers for questions not in the key are ignored.
///
/// Comparison is exact and case-sensitive; an unanswered question never
/// matches. Pure function of its inputs.
pub fn grade(
    detected: &BTreeMap<String, char>,
    key: &AnswerKey,
) -> (u32, BTreeMap<String, MarkedAnswer>) {
    let mut score = 0;
    let mut marked = BTreeMap::new();

    for (question, &correct) in key.iter() {
        let answer = detected.get(question).copied();
        let is_correct = answer == Some(correct);
        if is_correct {
            score += 1;
        }
        marked.insert(
            question.clone(),
            MarkedAnswer {
                detected: answer,
                correct,
                is_correct,
            },
        );
    }

    (score, marked)
}

/// Score as a percentage of the total. A zero total yields 0.0.
pub fn calculate_percentage(score: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (score as f64 / total as f64) * 100.0
}

/// Assigns a letter grade from the boundary table.
///
/// Boundaries are evaluated from the highest minimum percentage downward;
/// the first boundary the percentage meets or exceeds wins. A percentage
/// below every boundary maps to the lowest defined grade.
pub fn assign_grade(percentage: f64, boundaries: &[GradeBoundary]) -> String {
    let mut sorted: Vec<&GradeBoundary> = boundaries.iter().collect();
    sorted.sort_by(|a, b| b.min_percentage.total_cmp(&a.min_percentage));

    for boundary in &sorted {
        if percentage >= boundary.min_percentage {
            return boundary.grade.clone();
        }
    }

    sorted
        .last()
        .map(|b| b.grade.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundaries() -> Vec<GradeBoundary> {
        crate::config::SheetConfig::default().grade_boundaries
    }

    fn key(entries: &[(&str, char)]) -> AnswerKey {
        let mut key = AnswerKey::new();
        for &(q, opt) in entries {
            key.set(q, opt);
        }
        key
    }

    #[test]
    fn test_grade_counts_exact_matches() {
        let key = key(&[("1", 'A'), ("2", 'B'), ("3", 'C')]);
        let detected = BTreeMap::from([
            ("1".to_string(), 'A'),
            ("2".to_string(), 'C'),
            ("3".to_string(), 'C'),
        ]);

        let (score, marked) = grade(&detected, &key);
        assert_eq!(score, 2);
        assert_eq!(marked.len(), 3);
        assert!(marked["1"].is_correct);
        assert!(!marked["2"].is_correct);
        assert_eq!(marked["2"].detected, Some('C'));
        assert_eq!(marked["2"].correct, 'B');
        assert!(marked["3"].is_correct);
    }

    #[test]
    fn test_grade_blank_submission_scores_zero() {
        let key = key(&[("1", 'A'), ("2", 'B')]);
        let detected = BTreeMap::new();

        let (score, marked) = grade(&detected, &key);
        assert_eq!(score, 0);
        assert_eq!(marked.len(), 2);
        assert_eq!(marked["1"].detected, None);
        assert!(!marked["1"].is_correct);
    }

    #[test]
    fn test_grade_key_is_authoritative() {
        // Detected answers outside the key's question universe are ignored.
        let key = key(&[("1", 'A')]);
        let detected = BTreeMap::from([
            ("1".to_string(), 'A'),
            ("99".to_string(), 'D'),
        ]);

        let (score, marked) = grade(&detected, &key);
        assert_eq!(score, 1);
        assert_eq!(marked.len(), 1);
        assert!(!marked.contains_key("99"));
    }

    #[test]
    fn test_grade_is_case_sensitive() {
        let key = key(&[("1", 'A')]);
        let detected = BTreeMap::from([("1".to_string(), 'a')]);

        let (score, _) = grade(&detected, &key);
        assert_eq!(score, 0);
    }

    #[test]
    fn test_grade_is_pure() {
        let key = key(&[("1", 'A'), ("2", 'B')]);
        let detected = BTreeMap::from([("1".to_string(), 'A')]);

        let first = grade(&detected, &key);
        let second = grade(&detected, &key);
        assert_eq!(first, second);
    }

    #[test]
    fn test_grade_score_bounded_by_key_size() {
        let key = key(&[("1", 'A'), ("2", 'B')]);
        let detected = BTreeMap::from([
            ("1".to_string(), 'A'),
            ("2".to_string(), 'B'),
        ]);

        let (score, _) = grade(&detected, &key);
        assert_eq!(score, 2);
        assert!(score <= key.len() as u32);
    }

    #[test]
    fn test_calculate_percentage() {
        assert!((calculate_percentage(0, 16) - 0.0).abs() < f64::EPSILON);
        assert!((calculate_percentage(16, 16) - 100.0).abs() < f64::EPSILON);
        assert!((calculate_percentage(8, 16) - 50.0).abs() < f64::EPSILON);
        assert!((calculate_percentage(5, 0) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_assign_grade_boundaries() {
        let b = boundaries();
        assert_eq!(assign_grade(100.0, &b), "A");
        assert_eq!(assign_grade(85.0, &b), "A");
        assert_eq!(assign_grade(84.999, &b), "B");
        assert_eq!(assign_grade(70.0, &b), "B");
        assert_eq!(assign_grade(55.0, &b), "C");
        assert_eq!(assign_grade(40.0, &b), "D");
        assert_eq!(assign_grade(20.0, &b), "E");
        assert_eq!(assign_grade(0.0, &b), "F");
    }

    #[test]
    fn test_assign_grade_below_all_boundaries_is_lowest() {
        let b = vec![
            GradeBoundary { grade: "Pass".to_string(), min_percentage: 50.0 },
            GradeBoundary { grade: "Fail".to_string(), min_percentage: 10.0 },
        ];
        assert_eq!(assign_grade(5.0, &b), "Fail");
    }

    #[test]
    fn test_assign_grade_is_monotone() {
        let b = boundaries();
        let rank = |g: &str| b.iter().position(|x| x.grade == g).unwrap();

        let mut prev_rank = rank(&assign_grade(0.0, &b));
        for step in 1..=1000 {
            let p = step as f64 / 10.0;
            let r = rank(&assign_grade(p, &b));
            // Higher percentage must never produce a lower grade
            assert!(r <= prev_rank, "grade dropped at {}%", p);
            prev_rank = r;
        }
    }
}
