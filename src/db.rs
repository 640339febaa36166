use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;
use tracing::warn;

use crate::quiz::{ResultRecord, WrongAnswer};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResult {
    pub id: i64,
    #[serde(flatten)]
    pub record: ResultRecord,
}

pub fn open_db(db_path: &Path) -> anyhow::Result<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS quiz_results(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_name TEXT NOT NULL,
            grade TEXT NOT NULL,
            subject TEXT NOT NULL,
            score INTEGER NOT NULL,
            total_questions INTEGER NOT NULL,
            date_taken TEXT NOT NULL,
            wrong_answers TEXT NOT NULL DEFAULT ''
        )",
        [],
    )?;

    // Databases from before wrong answers were kept lack the column.
    ensure_quiz_results_wrong_answers(&conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_quiz_results_date ON quiz_results(date_taken)",
        [],
    )?;

    Ok(conn)
}

fn ensure_quiz_results_wrong_answers(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "quiz_results", "wrong_answers")? {
        return Ok(());
    }
    conn.execute(
        "ALTER TABLE quiz_results ADD COLUMN wrong_answers TEXT NOT NULL DEFAULT ''",
        [],
    )?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn append_result(conn: &Connection, record: &ResultRecord) -> anyhow::Result<i64> {
    let wrong = serde_json::to_string(&record.wrong_answers)?;
    conn.execute(
        "INSERT INTO quiz_results(
            student_name, grade, subject, score, total_questions, date_taken, wrong_answers
         ) VALUES(?, ?, ?, ?, ?, ?, ?)",
        (
            &record.student_name,
            &record.grade,
            &record.subject,
            record.score,
            record.total_questions,
            record.taken_at.format(TIMESTAMP_FORMAT).to_string(),
            &wrong,
        ),
    )?;
    Ok(conn.last_insert_rowid())
}

/// Newest first.
pub fn list_results(conn: &Connection) -> anyhow::Result<Vec<StoredResult>> {
    let mut stmt = conn.prepare(
        "SELECT id, student_name, grade, subject, score, total_questions, date_taken, wrong_answers
         FROM quiz_results
         ORDER BY date_taken DESC, id DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(rows.len());
    for (id, student_name, grade, subject, score, total, date_taken, wrong) in rows {
        let Some(taken_at) = parse_timestamp(&date_taken) else {
            warn!(id, date_taken = %date_taken, "skipping result with unreadable date");
            continue;
        };
        out.push(StoredResult {
            id,
            record: ResultRecord {
                student_name,
                grade,
                subject,
                score: score.max(0) as u32,
                total_questions: total.max(0) as u32,
                wrong_answers: decode_wrong_answers(id, wrong.as_deref().unwrap_or("")),
                taken_at,
            },
        });
    }
    Ok(out)
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT).ok()
}

fn decode_wrong_answers(id: i64, text: &str) -> Vec<WrongAnswer> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!(id, error = %e, "ignoring malformed wrong_answers");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::Letter;
    use chrono::NaiveDate;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_db(prefix: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!(
                "{}-{}",
                prefix,
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .expect("clock")
                    .as_nanos()
            ))
            .join("scores.db")
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .expect("timestamp")
    }

    fn record(name: &str, score: u32, taken_at: NaiveDateTime) -> ResultRecord {
        ResultRecord {
            student_name: name.to_string(),
            grade: "Grade 6".to_string(),
            subject: "science".to_string(),
            score,
            total_questions: 3,
            wrong_answers: Vec::new(),
            taken_at,
        }
    }

    #[test]
    fn append_then_list_roundtrips_fields() {
        let path = temp_db("quizd-db-roundtrip");
        let conn = open_db(&path).expect("open");

        let mut rec = record("Baraka", 2, at(9, 30));
        rec.wrong_answers.push(WrongAnswer {
            question_text: "Which organ pumps blood?".to_string(),
            selected_letter: Letter::A,
            selected_text: "Lungs".to_string(),
            correct_letter: Letter::C,
            correct_text: "Heart".to_string(),
        });
        let id = append_result(&conn, &rec).expect("append");

        let listed = list_results(&conn).expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].record, rec);

        let _ = std::fs::remove_dir_all(path.parent().expect("dir"));
    }

    #[test]
    fn list_is_newest_first() {
        let path = temp_db("quizd-db-order");
        let conn = open_db(&path).expect("open");
        append_result(&conn, &record("early", 1, at(8, 0))).expect("append");
        append_result(&conn, &record("late", 2, at(15, 0))).expect("append");
        append_result(&conn, &record("middle", 3, at(11, 0))).expect("append");

        let names = list_results(&conn)
            .expect("list")
            .into_iter()
            .map(|r| r.record.student_name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["late", "middle", "early"]);

        let _ = std::fs::remove_dir_all(path.parent().expect("dir"));
    }

    #[test]
    fn malformed_wrong_answers_decode_empty() {
        assert!(decode_wrong_answers(1, "").is_empty());
        assert!(decode_wrong_answers(1, "[{'q': 1}]").is_empty());
    }
}
