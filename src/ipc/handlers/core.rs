use serde_json::json;
use std::path::PathBuf;

use crate::fees;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::seed;
use crate::store::Store;

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
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match Store::open(&path) {
        Ok(store) => {
            // Compensating cleanup for a crash mid student delete: fee
            // entries whose student is gone are dropped on every open.
            let orphans_removed = match fees::sweep_orphans(&store) {
                Ok(n) => n,
                Err(e) => return err(&req.id, "store_failed", e.to_string(), None),
            };

            state.workspace = Some(path.clone());
            state.store = Some(store);
            ok(
                &req.id,
                json!({
                    "workspacePath": path.to_string_lossy(),
                    "orphanedFeeEntriesRemoved": orphans_removed
                }),
            )
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

fn handle_seed_sample(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    match seed::seed_sample_data(store) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "classesSeeded": summary.classes_seeded,
                "studentsSeeded": summary.students_seeded
            }),
        ),
        Err(e) => err(&req.id, "store_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "workspace.seedSample" => Some(handle_seed_sample(state, req)),
        _ => None,
    }
}
