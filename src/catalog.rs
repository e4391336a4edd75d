#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::sync::LazyLock;

use serde::Deserialize;

use crate::assessment::{EssayTask, TaskKind};

/// How hard a practice task is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Straightforward data or topic.
    Easy,
    /// Typical exam difficulty.
    Medium,
    /// Unfamiliar format or abstract topic.
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        })
    }
}

/// A practice prompt from the built-in bank.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogEntry {
    /// Stable identifier, e.g. `t2-gen-1`.
    pub id:         String,
    /// Task 1 or Task 2.
    pub kind:       TaskKind,
    /// Chart type or essay theme.
    pub category:   String,
    /// Short title.
    pub title:      String,
    /// Prompt text shown to the writer.
    pub prompt:     String,
    /// Difficulty rating.
    pub difficulty: Difficulty,
    /// Planning hints.
    #[serde(default)]
    pub tips:       Vec<String>,
}

impl CatalogEntry {
    /// The gradable task for this entry.
    pub fn task(&self) -> EssayTask {
        EssayTask::new(self.kind, self.prompt.clone())
    }
}

/// Built-in bank, parsed once.
static CATALOG: LazyLock<Vec<CatalogEntry>> = LazyLock::new(|| {
    serde_json::from_str(include_str!("data/catalog.json"))
        .expect("embedded task catalog is valid JSON")
});

/// Every built-in task, Task 1 entries first.
pub fn all() -> &'static [CatalogEntry] {
    &CATALOG
}

/// Built-in tasks of one kind.
pub fn of_kind(kind: TaskKind) -> impl Iterator<Item = &'static CatalogEntry> {
    all().iter().filter(move |entry| entry.kind == kind)
}

/// Looks up a built-in task by id.
pub fn find(id: &str) -> Option<&'static CatalogEntry> {
    all().iter().find(|entry| entry.id == id)
}
