use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{get_optional_str, require_workspace};
use crate::ipc::types::{AppState, Request};
use crate::study::StudyMaterials;
use serde_json::json;

fn study_materials(state: &AppState) -> Result<StudyMaterials, HandlerErr> {
    let ws = require_workspace(state)?;
    Ok(StudyMaterials::new(&ws.study_dir()))
}

fn handle_flashcards(state: &mut AppState, req: &Request) -> serde_json::Value {
    let study = match study_materials(state) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    match study.flashcards(get_optional_str(&req.params, "subject")) {
        Ok(cards) => ok(&req.id, json!({ "flashcards": cards })),
        Err(e) => HandlerErr::from(e).response(&req.id),
    }
}

fn handle_notes(state: &mut AppState, req: &Request) -> serde_json::Value {
    let study = match study_materials(state) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    match study.notes(get_optional_str(&req.params, "subject")) {
        Ok(text) => ok(&req.id, json!({ "text": text })),
        Err(e) => HandlerErr::from(e).response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "study.flashcards" => Some(handle_flashcards(state, req)),
        "study.notes" => Some(handle_notes(state, req)),
        _ => None,
    }
}
