use serde_json::json;
use std::collections::HashMap;

use crate::classes::{self, NewClass};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::students;

fn handle_classes_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return ok(&req.id, json!({ "classes": [] }));
    };

    let class_list = match classes::all_classes(store) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "store_failed", e.to_string(), None),
    };

    // Include enrollment counts so the UI can show a useful dashboard.
    // One directory scan instead of a count query per class.
    let mut counts: HashMap<String, usize> = HashMap::new();
    match students::all_students(store) {
        Ok(list) => {
            for s in list {
                if let Some(class_id) = s.class_id {
                    *counts.entry(class_id).or_default() += 1;
                }
            }
        }
        Err(e) => return err(&req.id, "store_failed", e.to_string(), None),
    }

    let rows: Vec<serde_json::Value> = class_list
        .into_iter()
        .map(|c| {
            let count = counts.get(&c.id).copied().unwrap_or(0);
            let mut row = json!(c);
            row["studentCount"] = json!(count);
            row
        })
        .collect();

    ok(&req.id, json!({ "classes": rows }))
}

fn handle_classes_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let new: NewClass = match serde_json::from_value(req.params.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    if new.name.trim().is_empty() {
        return err(&req.id, "bad_params", "name must not be empty", None);
    }
    if new.capacity == 0 {
        return err(&req.id, "bad_params", "capacity must be positive", None);
    }

    match classes::add_class(store, new) {
        Ok(class) => ok(&req.id, json!({ "class": class })),
        Err(e) => err(&req.id, "store_failed", e.to_string(), None),
    }
}

fn handle_classes_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(class_id) = req.params.get("classId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing classId", None);
    };

    match classes::get_class_by_id(store, class_id) {
        Ok(Some(class)) => ok(&req.id, json!({ "class": class })),
        Ok(None) => err(&req.id, "not_found", "class not found", None),
        Err(e) => err(&req.id, "store_failed", e.to_string(), None),
    }
}

fn handle_classes_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(class_id) = req.params.get("classId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing classId", None);
    };
    let Some(patch) = req.params.get("patch").filter(|p| p.is_object()) else {
        return err(&req.id, "bad_params", "missing patch object", None);
    };

    if let Some(name) = patch.get("name") {
        if name.as_str().map_or(true, |n| n.trim().is_empty()) {
            return err(&req.id, "bad_params", "name must not be empty", None);
        }
    }
    if let Some(capacity) = patch.get("capacity") {
        if capacity.as_u64().map_or(true, |c| c == 0) {
            return err(&req.id, "bad_params", "capacity must be positive", None);
        }
    }

    match classes::update_class(store, class_id, patch) {
        Ok(Some(class)) => ok(&req.id, json!({ "class": class })),
        Ok(None) => err(&req.id, "not_found", "class not found", None),
        Err(e) => err(&req.id, "bad_params", e.to_string(), None),
    }
}

fn handle_classes_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(class_id) = req.params.get("classId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing classId", None);
    };

    // Deletion is refused while any student still references the class.
    let enrolled = match classes::count_students_by_class(store, class_id) {
        Ok(n) => n,
        Err(e) => return err(&req.id, "store_failed", e.to_string(), None),
    };
    if enrolled > 0 {
        return err(
            &req.id,
            "class_in_use",
            "class still has enrolled students",
            Some(json!({ "studentCount": enrolled })),
        );
    }

    match classes::delete_class(store, class_id) {
        Ok(true) => ok(&req.id, json!({ "deleted": true })),
        Ok(false) => err(&req.id, "not_found", "class not found", None),
        Err(e) => err(&req.id, "store_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "classes.list" => Some(handle_classes_list(state, req)),
        "classes.create" => Some(handle_classes_create(state, req)),
        "classes.get" => Some(handle_classes_get(state, req)),
        "classes.update" => Some(handle_classes_update(state, req)),
        "classes.delete" => Some(handle_classes_delete(state, req)),
        _ => None,
    }
}
