use anyhow::Context;
use std::path::PathBuf;

/// Directory layout of a quiz workspace:
///
/// ```text
/// <root>/quizzes/<grade>/<subject>.csv   (or quizzes/<subject>.csv)
/// <root>/study_mode/flashcards.csv
/// <root>/study_mode/notes.txt
/// <root>/data/scores.db
/// ```
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn quizzes_dir(&self) -> PathBuf {
        self.root.join("quizzes")
    }

    pub fn study_dir(&self) -> PathBuf {
        self.root.join("study_mode")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join("scores.db")
    }

    pub fn ensure_dirs(&self) -> anyhow::Result<()> {
        for dir in [self.quizzes_dir(), self.study_dir(), self.data_dir()] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create directory {}", dir.to_string_lossy()))?;
        }
        Ok(())
    }
}
