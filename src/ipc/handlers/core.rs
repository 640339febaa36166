use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::workspace::Workspace;
use serde_json::json;
use std::path::Path;
use tracing::info;

/// Creates the workspace layout and opens its score database. Any session
/// from a previous workspace is dropped.
pub fn open_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<()> {
    let ws = Workspace::new(path);
    ws.ensure_dirs()?;
    let conn = db::open_db(&ws.db_path())?;
    state.workspace = Some(path.to_path_buf());
    state.db = Some(conn);
    state.session = None;
    info!(workspace = %path.display(), "workspace opened");
    Ok(())
}

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(path) = req.params.get("path").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };
    let path = Path::new(path);

    match open_workspace(state, path) {
        Ok(()) => {
            let ws = Workspace::new(path);
            ok(
                &req.id,
                json!({
                    "workspacePath": path.to_string_lossy(),
                    "quizzesPath": ws.quizzes_dir().to_string_lossy(),
                    "studyPath": ws.study_dir().to_string_lossy(),
                    "dbPath": ws.db_path().to_string_lossy(),
                }),
            )
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
