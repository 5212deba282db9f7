use serde_json::json;

use crate::fees;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::Store;

fn require_student_id<'a>(req: &'a Request) -> Result<&'a str, serde_json::Value> {
    req.params
        .get("studentId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| err(&req.id, "bad_params", "missing studentId", None))
}

/// Amount/date validation lives here at the caller boundary; the ledger
/// functions themselves accept whatever they are handed.
fn require_positive_amount(req: &Request) -> Result<f64, serde_json::Value> {
    match req.params.get("amount").and_then(|v| v.as_f64()) {
        Some(v) if v > 0.0 => Ok(v),
        _ => Err(err(&req.id, "bad_params", "amount must be positive", None)),
    }
}

fn handle_fees_get(store: &Store, req: &Request) -> serde_json::Value {
    let student_id = match require_student_id(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match fees::get_entry_by_student(store, student_id) {
        Ok(entry) => ok(&req.id, json!({ "entry": entry })),
        Err(e) => err(&req.id, "store_failed", e.to_string(), None),
    }
}

fn handle_fees_init(store: &Store, req: &Request) -> serde_json::Value {
    let student_id = match require_student_id(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match fees::initialize_entry(store, student_id) {
        Ok(entry) => ok(&req.id, json!({ "entry": entry })),
        Err(e) => err(&req.id, "store_failed", e.to_string(), None),
    }
}

fn handle_fees_update(store: &Store, req: &Request) -> serde_json::Value {
    let student_id = match require_student_id(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(patch) = req.params.get("patch").filter(|p| p.is_object()) else {
        return err(&req.id, "bad_params", "missing patch object", None);
    };
    match fees::update_entry(store, student_id, patch) {
        Ok(entry) => ok(&req.id, json!({ "entry": entry })),
        Err(e) => err(&req.id, "bad_params", e.to_string(), None),
    }
}

fn handle_fees_add_monthly(store: &Store, req: &Request) -> serde_json::Value {
    let student_id = match require_student_id(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let month = match req.params.get("month").and_then(|v| v.as_str()) {
        Some(m) if !m.trim().is_empty() => m,
        _ => return err(&req.id, "bad_params", "missing month", None),
    };
    let amount = match require_positive_amount(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match fees::add_monthly_fee(store, student_id, month, amount) {
        Ok(Some(fee)) => ok(&req.id, json!({ "monthlyFee": fee })),
        Ok(None) => err(&req.id, "not_found", "no fee entry for student", None),
        Err(e) => err(&req.id, "store_failed", e.to_string(), None),
    }
}

fn handle_fees_remove_monthly(store: &Store, req: &Request) -> serde_json::Value {
    let student_id = match require_student_id(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(fee_id) = req.params.get("feeId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing feeId", None);
    };

    let entry = match fees::get_entry_by_student(store, student_id) {
        Ok(Some(e)) => e,
        Ok(None) => return err(&req.id, "not_found", "no fee entry for student", None),
        Err(e) => return err(&req.id, "store_failed", e.to_string(), None),
    };

    // Removal is filter-and-save of the surviving collection; an unknown id
    // is a no-op.
    let before = entry.monthly_fees.len();
    let kept: Vec<_> = entry
        .monthly_fees
        .into_iter()
        .filter(|f| f.id != fee_id)
        .collect();
    let removed = kept.len() < before;
    match fees::update_entry(store, student_id, &json!({ "monthlyFees": kept })) {
        Ok(_) => ok(&req.id, json!({ "removed": removed })),
        Err(e) => err(&req.id, "store_failed", e.to_string(), None),
    }
}

fn handle_fees_add_deposit(store: &Store, req: &Request) -> serde_json::Value {
    let student_id = match require_student_id(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let amount = match require_positive_amount(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let date = match req.params.get("date").and_then(|v| v.as_str()) {
        Some(d) if !d.trim().is_empty() => d,
        _ => return err(&req.id, "bad_params", "missing date", None),
    };
    let remarks = req
        .params
        .get("remarks")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    match fees::add_deposit(store, student_id, amount, date, remarks) {
        Ok(Some(deposit)) => ok(&req.id, json!({ "deposit": deposit })),
        Ok(None) => err(&req.id, "not_found", "no fee entry for student", None),
        Err(e) => err(&req.id, "store_failed", e.to_string(), None),
    }
}

fn handle_fees_remove_deposit(store: &Store, req: &Request) -> serde_json::Value {
    let student_id = match require_student_id(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(deposit_id) = req.params.get("depositId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing depositId", None);
    };

    let entry = match fees::get_entry_by_student(store, student_id) {
        Ok(Some(e)) => e,
        Ok(None) => return err(&req.id, "not_found", "no fee entry for student", None),
        Err(e) => return err(&req.id, "store_failed", e.to_string(), None),
    };

    let before = entry.deposits.len();
    let kept: Vec<_> = entry
        .deposits
        .into_iter()
        .filter(|d| d.id != deposit_id)
        .collect();
    let removed = kept.len() < before;
    match fees::update_entry(store, student_id, &json!({ "deposits": kept })) {
        Ok(_) => ok(&req.id, json!({ "removed": removed })),
        Err(e) => err(&req.id, "store_failed", e.to_string(), None),
    }
}

fn handle_fees_toggle_paid(store: &Store, req: &Request) -> serde_json::Value {
    let student_id = match require_student_id(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(fee_id) = req.params.get("feeId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing feeId", None);
    };

    match fees::toggle_paid(store, student_id, fee_id) {
        Ok(Some(paid)) => ok(&req.id, json!({ "paid": paid })),
        Ok(None) => err(&req.id, "not_found", "monthly fee not found", None),
        Err(e) => err(&req.id, "store_failed", e.to_string(), None),
    }
}

fn handle_fees_summary(store: &Store, req: &Request) -> serde_json::Value {
    let student_id = match require_student_id(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let entry = match fees::get_entry_by_student(store, student_id) {
        Ok(Some(e)) => e,
        Ok(None) => return err(&req.id, "not_found", "no fee entry for student", None),
        Err(e) => return err(&req.id, "store_failed", e.to_string(), None),
    };
    ok(&req.id, json!(fees::totals(&entry)))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let handler = match req.method.as_str() {
        "fees.get" => handle_fees_get,
        "fees.init" => handle_fees_init,
        "fees.update" => handle_fees_update,
        "fees.addMonthlyFee" => handle_fees_add_monthly,
        "fees.removeMonthlyFee" => handle_fees_remove_monthly,
        "fees.addDeposit" => handle_fees_add_deposit,
        "fees.removeDeposit" => handle_fees_remove_deposit,
        "fees.togglePaid" => handle_fees_toggle_paid,
        "fees.summary" => handle_fees_summary,
        _ => return None,
    };

    let Some(store) = state.store.as_ref() else {
        return Some(err(&req.id, "no_workspace", "select a workspace first", None));
    };
    Some(handler(store, req))
}
