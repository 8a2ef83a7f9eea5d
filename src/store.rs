//! Flat-file persistence for results and the answer key.
//!
//! Both stores are single JSON documents rewritten wholesale on save.
//! Single interactive process assumed; there is no locking.

use crate::model::{AnswerKey, ExamResult};
use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};

/// Repository over the JSON result file: an ordered sequence of results,
/// append-only except for in-place edits by index.
#[derive(Debug)]
pub struct ResultStore {
    path: PathBuf,
    results: Vec<ExamResult>,
}

impl ResultStore {
    /// Loads the store, treating a missing file as empty.
    pub fn load(path: &Path) -> Result<Self> {
        let results = if path.exists() {
            let contents = fs::read_to_string(path)
                .context(format!("Failed to read result store {}", path.display()))?;
            serde_json::from_str(&contents)
                .context(format!("Failed to parse result store {}", path.display()))?
        } else {
            Vec::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            results,
        })
    }

    pub fn append(&mut self, result: ExamResult) {
        self.results.push(result);
    }

    pub fn get(&self, index: usize) -> Option<&ExamResult> {
        self.results.get(index)
    }

    /// Replaces the result at an existing index.
    pub fn update(&mut self, index: usize, result: ExamResult) -> Result<()> {
        let slot = self
            .results
            .get_mut(index)
            .ok_or_else(|| anyhow!("No result at index {}", index))?;
        *slot = result;
        Ok(())
    }

    pub fn all(&self) -> &[ExamResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Rewrites the whole JSON document.
    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.results)
            .context("Failed to serialize results")?;
        fs::write(&self.path, json)
            .context(format!("Failed to write result store {}", self.path.display()))?;
        Ok(())
    }
}

/// Loads the answer key, treating a missing file as an empty key.
pub fn load_answer_key(path: &Path) -> Result<AnswerKey> {
    if !path.exists() {
        return Ok(AnswerKey::new());
    }
    let contents = fs::read_to_string(path)
        .context(format!("Failed to read answer key {}", path.display()))?;
    serde_json::from_str(&contents)
        .context(format!("Failed to parse answer key {}", path.display()))
}

pub fn save_answer_key(path: &Path, key: &AnswerKey) -> Result<()> {
    let json = serde_json::to_string_pretty(key).context("Failed to serialize answer key")?;
    fs::write(path, json).context(format!("Failed to write answer key {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn sample(name: &str, score: u32) -> ExamResult {
        ExamResult {
            filename: format!("{}.png", name),
            student_name: name.to_string(),
            class_name: "G".to_string(),
            answers: BTreeMap::new(),
            score,
            total: 16,
            processed_at: "2026-08-05 10:00:00".to_string(),
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = ResultStore::load(&dir.path().join("results.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_append_save_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");

        let mut store = ResultStore::load(&path).unwrap();
        store.append(sample("alice", 12));
        store.append(sample("bob", 9));
        store.save().unwrap();

        let reloaded = ResultStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get(0).unwrap().student_name, "alice");
        assert_eq!(reloaded.get(1).unwrap().score, 9);
    }

    #[test]
    fn test_update_in_place() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");

        let mut store = ResultStore::load(&path).unwrap();
        store.append(sample("alice", 12));

        let mut edited = sample("alice", 13);
        edited.class_name = "S".to_string();
        store.update(0, edited).unwrap();

        assert_eq!(store.get(0).unwrap().score, 13);
        assert_eq!(store.get(0).unwrap().class_name, "S");
    }

    #[test]
    fn test_update_out_of_range_errors() {
        let dir = tempdir().unwrap();
        let mut store = ResultStore::load(&dir.path().join("results.json")).unwrap();
        assert!(store.update(3, sample("x", 0)).is_err());
    }

    #[test]
    fn test_answer_key_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("answer_key.json");

        let mut key = AnswerKey::new();
        key.set("1", 'A');
        key.set("2", 'C');
        save_answer_key(&path, &key).unwrap();

        let loaded = load_answer_key(&path).unwrap();
        assert_eq!(loaded, key);
    }

    #[test]
    fn test_missing_answer_key_is_empty() {
        let dir = tempdir().unwrap();
        let key = load_answer_key(&dir.path().join("answer_key.json")).unwrap();
        assert!(key.is_empty());
    }

    #[test]
    fn test_result_json_shape() {
        // Class field serializes under the short name used by the exports
        let json = serde_json::to_string(&sample("alice", 12)).unwrap();
        assert!(json.contains(r#""class":"G""#));
        assert!(json.contains(r#""student_name":"alice""#));
    }
}
