use anyhow::Context;
use std::path::Path;

use crate::db::{StoredResult, TIMESTAMP_FORMAT};

pub const EXPORT_HEADERS: [&str; 7] = [
    "Student Name",
    "Grade",
    "Subject",
    "Score",
    "Total Questions",
    "Percentage",
    "Date",
];

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub written: bool,
    pub row_count: usize,
}

/// Writes rows in the order given. An empty history writes no file.
pub fn export_results(results: &[StoredResult], out_path: &Path) -> anyhow::Result<ExportSummary> {
    if results.is_empty() {
        return Ok(ExportSummary {
            written: false,
            row_count: 0,
        });
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let mut w = csv::Writer::from_path(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    w.write_record(EXPORT_HEADERS)
        .context("failed to write header row")?;
    for r in results {
        let rec = &r.record;
        w.write_record([
            rec.student_name.clone(),
            rec.grade.clone(),
            rec.subject.clone(),
            rec.score.to_string(),
            rec.total_questions.to_string(),
            format!("{:.1}%", rec.percentage()),
            rec.taken_at.format(TIMESTAMP_FORMAT).to_string(),
        ])
        .with_context(|| format!("failed to write result {}", r.id))?;
    }
    w.flush().context("failed to flush export")?;

    Ok(ExportSummary {
        written: true,
        row_count: results.len(),
    })
}
