use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::helpers::{get_required_str, require_workspace};
use crate::ipc::types::{AppState, Request};
use crate::questions::{QuestionBank, SUBJECTS};
use crate::student;
use serde_json::json;
use tracing::info;

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = req.params.get("name").and_then(|v| v.as_str()).unwrap_or("");
    let grade = req.params.get("grade").and_then(|v| v.as_str()).unwrap_or("");

    let student = match student::login(name, grade, &state.config.grades) {
        Ok(s) => s,
        Err(e) => return HandlerErr::from(e).response(&req.id),
    };
    if state.session.take().is_some() {
        info!("login abandoned the quiz in progress");
    }
    info!(grade = %student.grade, "student logged in");
    let resp = ok(&req.id, json!({ "student": &student }));
    state.student = Some(student);
    resp
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let was_logged_in = state.student.take().is_some();
    state.session = None;
    ok(&req.id, json!({ "loggedOut": was_logged_in }))
}

fn handle_current(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "student": state.student.as_ref(),
            "grades": &state.config.grades,
        }),
    )
}

fn handle_subjects_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let ws = match require_workspace(state) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    // Availability is per grade; an explicit grade param wins over the login.
    let grade = match get_required_str(&req.params, "grade") {
        Ok(g) => Some(g),
        Err(_) => state.student.as_ref().map(|s| s.grade.clone()),
    };
    let Some(grade) = grade else {
        return err(&req.id, "not_logged_in", "log in or pass params.grade", None);
    };

    let bank = QuestionBank::new(&ws.quizzes_dir());
    let subjects = SUBJECTS
        .iter()
        .map(|s| {
            json!({
                "id": s.id,
                "title": s.title,
                "available": bank.locate(&grade, s.id).is_some(),
            })
        })
        .collect::<Vec<_>>();
    ok(&req.id, json!({ "grade": grade, "subjects": subjects }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "student.login" => Some(handle_login(state, req)),
        "student.logout" => Some(handle_logout(state, req)),
        "student.current" => Some(handle_current(state, req)),
        "subjects.list" => Some(handle_subjects_list(state, req)),
        _ => None,
    }
}
