use rusqlite::Connection;
use serde_json::Value;

use super::error::HandlerErr;
use super::types::AppState;
use crate::student::Student;
use crate::workspace::Workspace;

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

/// Absent, null and blank all read as `None`.
pub fn get_optional_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
}

pub fn require_workspace(state: &AppState) -> Result<Workspace, HandlerErr> {
    state
        .workspace
        .as_ref()
        .map(|p| Workspace::new(p.clone()))
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn require_db(state: &AppState) -> Result<&Connection, HandlerErr> {
    state
        .db
        .as_ref()
        .ok_or_else(|| HandlerErr::new("no_workspace", "select a workspace first"))
}

pub fn require_student(state: &AppState) -> Result<&Student, HandlerErr> {
    state
        .student
        .as_ref()
        .ok_or_else(|| HandlerErr::new("not_logged_in", "log in first"))
}
