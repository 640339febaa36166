use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::questions::{normalize_subject, SourceError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flashcard {
    pub term: String,
    pub definition: String,
}

pub struct StudyMaterials {
    root: PathBuf,
}

impl StudyMaterials {
    pub fn new(study_dir: &Path) -> Self {
        Self {
            root: study_dir.to_path_buf(),
        }
    }

    /// `<root>/<subject>/<file>` when present, else `<root>/<file>`.
    fn resolve(&self, subject: Option<&str>, file: &str) -> Result<PathBuf, SourceError> {
        if let Some(raw) = subject {
            let subject = normalize_subject(raw)?;
            let p = self.root.join(subject).join(file);
            if p.is_file() {
                return Ok(p);
            }
        }
        Ok(self.root.join(file))
    }

    /// A missing or unreadable file gives an empty deck.
    pub fn flashcards(&self, subject: Option<&str>) -> Result<Vec<Flashcard>, SourceError> {
        let path = self.resolve(subject, "flashcards.csv")?;
        if !path.is_file() {
            return Ok(Vec::new());
        }
        match read_flashcards(&path) {
            Ok(cards) => Ok(cards),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read flashcards");
                Ok(Vec::new())
            }
        }
    }

    pub fn notes(&self, subject: Option<&str>) -> Result<String, SourceError> {
        let path = self.resolve(subject, "notes.txt")?;
        if !path.is_file() {
            return Err(SourceError::NotFound(match subject {
                Some(s) => format!("notes for {}", s.trim()),
                None => "notes".to_string(),
            }));
        }
        std::fs::read_to_string(&path).map_err(|e| SourceError::Io { path, source: e })
    }
}

fn read_flashcards(path: &Path) -> Result<Vec<Flashcard>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = reader.headers()?.clone();
    let col = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
    };
    let (Some(term_col), Some(def_col)) = (col("term"), col("definition")) else {
        warn!(path = %path.display(), "flashcards file needs term and definition columns");
        return Ok(Vec::new());
    };

    let mut cards = Vec::new();
    for rec in reader.records() {
        let Ok(rec) = rec else {
            continue;
        };
        let term = rec.get(term_col).unwrap_or("").to_string();
        if term.is_empty() {
            continue;
        }
        cards.push(Flashcard {
            term,
            definition: rec.get(def_col).unwrap_or("").to_string(),
        });
    }
    Ok(cards)
}
