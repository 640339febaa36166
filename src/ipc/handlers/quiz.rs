use crate::db;
use crate::ipc::error::{err, ok, HandlerErr};
use crate::ipc::helpers::{get_optional_str, get_required_str, require_student, require_workspace};
use crate::ipc::types::{AppState, Request};
use crate::questions::{normalize_subject, QuestionBank};
use crate::quiz::QuizSession;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// The in-flight session, checked against `params.sessionId` when the shell
/// sends one.
fn active_session<'a>(
    state: &'a mut AppState,
    params: &Value,
) -> Result<&'a mut QuizSession, HandlerErr> {
    let Some(session) = state.session.as_mut() else {
        return Err(HandlerErr::new("no_session", "no quiz in progress"));
    };
    if let Some(id) = get_optional_str(params, "sessionId") {
        if id != session.id() {
            return Err(HandlerErr::new(
                "no_session",
                format!("quiz {} is no longer active", id),
            ));
        }
    }
    Ok(session)
}

fn progress(session: &QuizSession) -> Value {
    json!({
        "sessionId": session.id(),
        "subject": session.subject(),
        "position": session.position(),
        "answered": session.answered(),
        "total": session.total(),
        "complete": session.is_complete(),
        "question": session.current(),
    })
}

fn handle_start(state: &mut AppState, req: &Request) -> Value {
    let ws = match require_workspace(state) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let student = match require_student(state) {
        Ok(s) => s.clone(),
        Err(e) => return e.response(&req.id),
    };
    let subject = match get_required_str(&req.params, "subject")
        .and_then(|s| normalize_subject(&s).map_err(HandlerErr::from))
    {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let sample_size = match req.params.get("sampleSize") {
        None | Some(Value::Null) => state.config.sample_size,
        Some(v) => match v.as_u64() {
            Some(n) => n as usize,
            None => return err(&req.id, "bad_params", "sampleSize must be a non-negative integer", None),
        },
    };

    let bank = QuestionBank::new(&ws.quizzes_dir());
    let pool = match bank.load_or_seed(&student.grade, &subject, state.config.seed_samples) {
        Ok(p) => p,
        Err(e) => return HandlerErr::from(e).response(&req.id),
    };
    let session = match QuizSession::start(&student, &subject, &pool.questions, sample_size) {
        Ok(s) => s,
        Err(e) => {
            let mut he = HandlerErr::from(e);
            he.details = Some(json!({ "path": pool.path.to_string_lossy() }));
            return he.response(&req.id);
        }
    };
    info!(
        subject = %subject,
        grade = %student.grade,
        pool = pool.questions.len(),
        total = session.total(),
        "quiz started"
    );

    let mut result = progress(&session);
    result["seeded"] = json!(pool.seeded);
    state.session = Some(session);
    ok(&req.id, result)
}

fn handle_current(state: &mut AppState, req: &Request) -> Value {
    match active_session(state, &req.params) {
        Ok(session) => ok(&req.id, progress(session)),
        Err(e) => e.response(&req.id),
    }
}

fn handle_answer(state: &mut AppState, req: &Request) -> Value {
    let session = match active_session(state, &req.params) {
        Ok(s) => s,
        Err(e) => return e.response(&req.id),
    };
    match session.submit_answer(get_optional_str(&req.params, "letter")) {
        Ok(sub) => {
            debug!(
                position = session.position(),
                correct = sub.correct,
                replaced = sub.replaced,
                "answer accepted"
            );
            let mut result = progress(session);
            result["accepted"] = json!(true);
            result["replaced"] = json!(sub.replaced);
            ok(&req.id, result)
        }
        Err(e) => HandlerErr::from(e).response(&req.id),
    }
}

fn handle_previous(state: &mut AppState, req: &Request) -> Value {
    let session = match active_session(state, &req.params) {
        Ok(s) => s,
        Err(e) => return e.response(&req.id),
    };
    let moved = session.previous();
    let mut result = progress(session);
    result["moved"] = json!(moved);
    ok(&req.id, result)
}

fn handle_finish(state: &mut AppState, req: &Request) -> Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let session = match state.session.as_mut() {
        Some(s) => s,
        None => return err(&req.id, "no_session", "no quiz in progress", None),
    };
    if let Some(id) = get_optional_str(&req.params, "sessionId") {
        if id != session.id() {
            return err(&req.id, "no_session", format!("quiz {} is no longer active", id), None);
        }
    }

    let record = match session.finish(get_optional_str(&req.params, "letter")) {
        Ok(r) => r,
        Err(e) => return HandlerErr::from(e).response(&req.id),
    };
    // The session stays (complete) until the insert succeeds so finish can be retried.
    let result_id = match db::append_result(conn, &record) {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "failed to save quiz result");
            return err(
                &req.id,
                "db_insert_failed",
                e.to_string(),
                Some(json!({ "table": "quiz_results" })),
            );
        }
    };
    state.session = None;
    info!(
        result_id,
        subject = %record.subject,
        score = record.score,
        total = record.total_questions,
        "quiz finished"
    );

    ok(
        &req.id,
        json!({
            "resultId": result_id,
            "record": &record,
            "percentage": record.percentage(),
            "feedback": record.feedback(),
        }),
    )
}

fn handle_abandon(state: &mut AppState, req: &Request) -> Value {
    let abandoned = state.session.take().is_some();
    ok(&req.id, json!({ "abandoned": abandoned }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "quiz.start" => Some(handle_start(state, req)),
        "quiz.current" => Some(handle_current(state, req)),
        "quiz.answer" => Some(handle_answer(state, req)),
        "quiz.previous" => Some(handle_previous(state, req)),
        "quiz.finish" => Some(handle_finish(state, req)),
        "quiz.abandon" => Some(handle_abandon(state, req)),
        _ => None,
    }
}
