use crate::db;
use crate::export;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_required_str, require_db};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

fn handle_results_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state) {
        Ok(c) => c,
        Err(e) => return e.response(&req.id),
    };
    let results = match db::list_results(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = results
        .iter()
        .map(|r| {
            let mut v = json!(r);
            v["percentage"] = json!(r.record.percentage());
            v
        })
        .collect::<Vec<_>>();
    ok(&req.id, json!({ "results": rows }))
}

fn handle_results_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match require_db(state) {
        Ok(c) => c,
        Err(e) => return e.response(&req.id),
    };
    let out_path = match get_required_str(&req.params, "outPath") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e.response(&req.id),
    };
    let results = match db::list_results(conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    match export::export_results(&results, &out_path) {
        Ok(summary) => {
            if summary.written {
                info!(path = %out_path.display(), rows = summary.row_count, "results exported");
            }
            ok(
                &req.id,
                json!({
                    "written": summary.written,
                    "rowCount": summary.row_count,
                    "path": out_path.to_string_lossy(),
                }),
            )
        }
        Err(e) => {
            warn!(path = %out_path.display(), error = %e, "export failed");
            err(
                &req.id,
                "export_failed",
                format!("{e:#}"),
                Some(json!({ "path": out_path.to_string_lossy() })),
            )
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "results.list" => Some(handle_results_list(state, req)),
        "results.export" => Some(handle_results_export(state, req)),
        _ => None,
    }
}
