use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::students::{self, NewStudent};

fn handle_students_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return ok(&req.id, json!({ "students": [] }));
    };

    let query = req
        .params
        .get("query")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    match students::search_students(store, query) {
        Ok(list) => ok(&req.id, json!({ "students": list })),
        Err(e) => err(&req.id, "store_failed", e.to_string(), None),
    }
}

fn handle_students_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let new: NewStudent = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    if new.name.trim().is_empty() {
        return err(&req.id, "bad_params", "name must not be empty", None);
    }

    match students::add_student(store, new) {
        Ok(student) => ok(&req.id, json!({ "student": student })),
        Err(e) => err(&req.id, "store_failed", e.to_string(), None),
    }
}

fn handle_students_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };

    match students::get_student_by_id(store, student_id) {
        Ok(Some(student)) => ok(&req.id, json!({ "student": student })),
        Ok(None) => err(&req.id, "not_found", "student not found", None),
        Err(e) => err(&req.id, "store_failed", e.to_string(), None),
    }
}

fn handle_students_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    let Some(patch) = req.params.get("patch").filter(|p| p.is_object()) else {
        return err(&req.id, "bad_params", "missing patch object", None);
    };

    match students::update_student(store, student_id, patch) {
        Ok(Some(student)) => ok(&req.id, json!({ "student": student })),
        Ok(None) => err(&req.id, "not_found", "student not found", None),
        Err(e) => err(&req.id, "bad_params", e.to_string(), None),
    }
}

fn handle_students_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };

    match students::delete_student(store, student_id) {
        Ok(true) => ok(&req.id, json!({ "deleted": true })),
        Ok(false) => err(&req.id, "not_found", "student not found", None),
        Err(e) => err(&req.id, "store_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.list" => Some(handle_students_list(state, req)),
        "students.create" => Some(handle_students_create(state, req)),
        "students.get" => Some(handle_students_get(state, req)),
        "students.update" => Some(handle_students_update(state, req)),
        "students.delete" => Some(handle_students_delete(state, req)),
        _ => None,
    }
}
