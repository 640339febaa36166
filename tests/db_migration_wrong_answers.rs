use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar(envs: &[(&str, &str)]) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_quizd");
    let mut cmd = Command::new(exe);
    cmd.env_remove("QUIZD_WORKSPACE")
        .env_remove("QUIZD_SAMPLE_SIZE")
        .env_remove("QUIZD_SEED_SAMPLES")
        .env_remove("QUIZD_GRADES");
    for (k, v) in envs {
        cmd.env(k, v);
    }
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn quizd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

#[allow(dead_code)]
fn error_code(value: &serde_json::Value) -> &str {
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false), "{}", value);
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

#[test]
fn old_database_gains_wrong_answers_column() {
    let workspace = temp_dir("quizd-migration");
    let data = workspace.join("data");
    std::fs::create_dir_all(&data).expect("create data dir");
    let db_path = data.join("scores.db");
    {
        let conn = rusqlite::Connection::open(&db_path).expect("open old db");
        conn.execute(
            "CREATE TABLE quiz_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                student_name TEXT NOT NULL,
                grade TEXT NOT NULL,
                subject TEXT NOT NULL,
                score INTEGER NOT NULL,
                total_questions INTEGER NOT NULL,
                date_taken TEXT NOT NULL
            )",
            [],
        )
        .expect("create old table");
        conn.execute(
            "INSERT INTO quiz_results(student_name, grade, subject, score, total_questions, date_taken)
             VALUES('Wekesa', 'Grade 8', 'english', 7, 10, '2025-11-03 14:05:09')",
            [],
        )
        .expect("insert old row");
    }

    let (mut child, mut stdin, mut reader) = spawn_sidecar(&[]);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let listed = request_ok(&mut stdin, &mut reader, "2", "results.list", json!({}));
    let rows = listed["results"].as_array().expect("results");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["studentName"], "Wekesa");
    assert_eq!(rows[0]["score"], 7);
    assert_eq!(rows[0]["totalQuestions"], 10);
    assert_eq!(rows[0]["percentage"], 70.0);
    assert_eq!(rows[0]["wrongAnswers"], json!([]));
    assert_eq!(rows[0]["takenAt"], "2025-11-03T14:05:09");
    drop(stdin);
    let _ = child.wait();

    let conn = rusqlite::Connection::open(&db_path).expect("reopen db");
    let wrong: String = conn
        .query_row("SELECT wrong_answers FROM quiz_results WHERE id = 1", [], |r| r.get(0))
        .expect("wrong_answers column");
    assert_eq!(wrong, "");

    let _ = std::fs::remove_dir_all(workspace);
}
