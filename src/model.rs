//! Data types shared across the grading pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Authoritative mapping from question number (stringified, 1-based) to the
/// correct option letter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerKey {
    answers: BTreeMap<String, char>,
}

impl AnswerKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the correct option for a question.
    pub fn set(&mut self, question: impl Into<String>, option: char) {
        self.answers.insert(question.into(), option);
    }

    pub fn get(&self, question: &str) -> Option<char> {
        self.answers.get(question).copied()
    }

    pub fn remove(&mut self, question: &str) -> Option<char> {
        self.answers.remove(question)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &char)> {
        self.answers.iter()
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

/// One graded question: what the student marked, what was correct, and
/// whether they match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkedAnswer {
    /// Detected option, or None when the question was left unanswered.
    pub detected: Option<char>,
    pub correct: char,
    pub is_correct: bool,
}

/// Raw detection output for one sheet, before grading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetReading {
    pub student_name: String,
    pub class_name: String,
    /// Question number to detected option. Unanswered questions are absent.
    pub answers: BTreeMap<String, char>,
}

/// One graded sheet, as stored in the result store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub filename: String,
    pub student_name: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub answers: BTreeMap<String, MarkedAnswer>,
    pub score: u32,
    /// Size of the answer key the sheet was graded against.
    pub total: u32,
    /// Formatted as `%Y-%m-%d %H:%M:%S` at creation time.
    pub processed_at: String,
}

impl ExamResult {
    /// Score as a percentage of the total, 0.0 when the total is zero.
    pub fn percentage(&self) -> f64 {
        crate::grading::calculate_percentage(self.score, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_key_set_get() {
        let mut key = AnswerKey::new();
        key.set("1", 'A');
        key.set("2", 'B');
        key.set("2", 'C'); // overwrite

        assert_eq!(key.get("1"), Some('A'));
        assert_eq!(key.get("2"), Some('C'));
        assert_eq!(key.get("3"), None);
        assert_eq!(key.len(), 2);
    }

    #[test]
    fn test_answer_key_json_shape() {
        let mut key = AnswerKey::new();
        key.set("1", 'A');
        key.set("2", 'B');

        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, r#"{"1":"A","2":"B"}"#);

        let back: AnswerKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_exam_result_percentage() {
        let result = ExamResult {
            filename: "sheet.png".to_string(),
            student_name: "Unknown".to_string(),
            class_name: "G".to_string(),
            answers: BTreeMap::new(),
            score: 8,
            total: 16,
            processed_at: "2026-08-05 10:00:00".to_string(),
        };
        assert!((result.percentage() - 50.0).abs() < f64::EPSILON);
    }
}
