//! Task benchmark harness: loads task definitions from JSON, runs them
//! through an engine, and scores outputs exactly or fuzzily.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::lang::{Engine, Language, Output};

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("failed to read task file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed task file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown task: {0}")]
    UnknownTask(String),
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    strum::Display,
    strum::EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub code: String,
    pub expected_output: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Character-level similarity: twice the longest common subsequence over the
/// combined length. Two empty strings are identical.
pub fn similarity(expected: &str, actual: &str) -> f64 {
    let a: Vec<char> = expected.chars().collect();
    let b: Vec<char> = actual.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            row[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                row[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut row);
    }
    2.0 * prev[b.len()] as f64 / (a.len() + b.len()) as f64
}

/// Fraction of expected lines that appear verbatim in the actual output.
pub fn line_overlap(expected: &str, actual: &str) -> f64 {
    let expected_lines: Vec<&str> = expected.lines().collect();
    if expected_lines.is_empty() {
        return 0.0;
    }
    let actual_lines: HashSet<&str> = actual.lines().collect();
    let matching = expected_lines
        .iter()
        .filter(|line| actual_lines.contains(**line))
        .count();
    matching as f64 / expected_lines.len() as f64
}

/// How outputs are scored: byte-for-byte after trimming, or fuzzily, where
/// either character similarity or line overlap clearing the threshold passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Matcher {
    Exact,
    Fuzzy { threshold: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchMetrics {
    pub passed: bool,
    pub similarity: f64,
    pub line_overlap: f64,
}

impl Matcher {
    pub fn score(&self, expected: &str, actual: &str) -> MatchMetrics {
        let expected = expected.trim();
        let actual = actual.trim();
        let similarity = similarity(expected, actual);
        let line_overlap = line_overlap(expected, actual);
        let passed = match self {
            Matcher::Exact => expected == actual,
            Matcher::Fuzzy { threshold } => {
                similarity >= *threshold || line_overlap >= *threshold
            }
        };
        MatchMetrics {
            passed,
            similarity,
            line_overlap,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub task_id: String,
    pub name: String,
    pub difficulty: Difficulty,
    pub passed: bool,
    pub expected: String,
    pub actual: String,
    pub similarity: f64,
    pub line_overlap: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub accuracy: f64,
    pub details: Vec<TaskReport>,
}

/// A set of benchmark tasks for one language.
#[derive(Debug, Clone, Default)]
pub struct TaskSuite {
    tasks: Vec<Task>,
}

impl TaskSuite {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TaskError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| TaskError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tasks = serde_json::from_str(&raw).map_err(|source| TaskError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { tasks })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn by_difficulty(&self, difficulty: Difficulty) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.difficulty == difficulty)
            .collect()
    }

    pub fn by_tag(&self, tag: &str) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.tags.iter().any(|t| t == tag))
            .collect()
    }

    /// Runs every task through the engine and scores the rendered output.
    /// A failed run scores against its error message, so a task whose
    /// expected output is an error still passes.
    pub fn evaluate(
        &self,
        engine: &mut Engine,
        language: Language,
        matcher: Matcher,
    ) -> SuiteReport {
        let mut details = Vec::with_capacity(self.tasks.len());
        for task in &self.tasks {
            let actual = match engine.run(language, &task.code) {
                Ok(output) => render(&output),
                Err(err) => format!("Error: {}", err),
            };
            let metrics = matcher.score(&task.expected_output, &actual);
            info!(
                task_id = %task.id,
                passed = metrics.passed,
                similarity = metrics.similarity,
                "task evaluated"
            );
            details.push(TaskReport {
                task_id: task.id.clone(),
                name: task.name.clone(),
                difficulty: task.difficulty,
                passed: metrics.passed,
                expected: task.expected_output.clone(),
                actual,
                similarity: metrics.similarity,
                line_overlap: metrics.line_overlap,
            });
        }
        let passed = details.iter().filter(|report| report.passed).count();
        let accuracy = if details.is_empty() {
            0.0
        } else {
            (passed as f64 / details.len() as f64 * 1000.0).round() / 1000.0
        };
        SuiteReport { accuracy, details }
    }
}

fn render(output: &Output) -> String {
    match output {
        Output::Text(text) => text.clone(),
        Output::Shapes(shapes) => shapes
            .iter()
            .map(|shape| shape.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
