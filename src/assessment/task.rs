#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{fmt::Display, ops::RangeInclusive, str::FromStr};

use serde::{Deserialize, Serialize};

/// Which writing exercise an essay answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Report or letter describing a chart, process or situation.
    Task1,
    /// Discursive essay on a prompt.
    Task2,
}

impl TaskKind {
    /// Word-count interval the backend is told is optimal.
    pub fn optimal_range(self) -> RangeInclusive<usize> {
        match self {
            TaskKind::Task1 => 150..=200,
            TaskKind::Task2 => 250..=300,
        }
    }

    /// Long human label used in prompts.
    pub fn label(self) -> &'static str {
        match self {
            TaskKind::Task1 => "Task 1 (Report/Letter)",
            TaskKind::Task2 => "Task 2 (Essay)",
        }
    }

    /// `(severe_below, short_below, long_above)` penalty thresholds.
    fn thresholds(self) -> (usize, usize, usize) {
        match self {
            TaskKind::Task1 => (100, 150, 250),
            TaskKind::Task2 => (200, 250, 350),
        }
    }
}

impl Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Task1 => write!(f, "task1"),
            TaskKind::Task2 => write!(f, "task2"),
        }
    }
}

/// Error returned when parsing an unknown task kind.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown task kind `{0}`, expected `task1` or `task2`")]
pub struct UnknownTaskKind(pub String);

impl FromStr for TaskKind {
    type Err = UnknownTaskKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "task1" | "1" => Ok(TaskKind::Task1),
            "task2" | "2" => Ok(TaskKind::Task2),
            other => Err(UnknownTaskKind(other.to_string())),
        }
    }
}

/// An exercise: the kind of task and the prompt the student answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EssayTask {
    /// Task kind, which fixes the word-count band.
    kind:   TaskKind,
    /// Free-text prompt shown to the student.
    prompt: String,
}

impl EssayTask {
    /// Creates a new task.
    pub fn new(kind: TaskKind, prompt: impl Into<String>) -> Self {
        Self {
            kind,
            prompt: prompt.into(),
        }
    }

    /// Returns the task kind.
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Returns the prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Returns the optimal word-count interval for this task.
    pub fn optimal_range(&self) -> RangeInclusive<usize> {
        self.kind.optimal_range()
    }
}

/// Where a word count sits relative to the task's length expectations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WordCountStatus {
    /// Within the acceptable range.
    #[serde(rename = "Optimal")]
    Optimal,
    /// Below the optimal range; a penalty applies.
    #[serde(rename = "Too Short (Penalty Applied)")]
    TooShortPenalized,
    /// Far below the optimal range.
    #[serde(rename = "Severely Under Length")]
    SeverelyUnderLength,
    /// Well above the optimal range; a penalty applies.
    #[serde(rename = "Too Long (Penalty Applied)")]
    TooLongPenalized,
}

impl Display for WordCountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WordCountStatus::Optimal => "Optimal",
            WordCountStatus::TooShortPenalized => "Too Short (Penalty Applied)",
            WordCountStatus::SeverelyUnderLength => "Severely Under Length",
            WordCountStatus::TooLongPenalized => "Too Long (Penalty Applied)",
        };
        f.write_str(label)
    }
}

/// Counts whitespace-delimited tokens, ignoring empty ones.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Derives the word-count status for `word_count` words written for `kind`.
pub fn word_count_status(kind: TaskKind, word_count: usize) -> WordCountStatus {
    let (severe_below, short_below, long_above) = kind.thresholds();
    if word_count < severe_below {
        WordCountStatus::SeverelyUnderLength
    } else if word_count < short_below {
        WordCountStatus::TooShortPenalized
    } else if word_count > long_above {
        WordCountStatus::TooLongPenalized
    } else {
        WordCountStatus::Optimal
    }
}
