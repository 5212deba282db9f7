use serde_json::json;

use crate::classes;
use crate::fees;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::receipt::{render_receipt, ReceiptContext, SchoolProfile};
use crate::students;

fn handle_receipt_render(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(store) = state.store.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(student_id) = req.params.get("studentId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing studentId", None);
    };
    let Some(deposit_id) = req.params.get("depositId").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing depositId", None);
    };

    let student = match students::get_student_by_id(store, student_id) {
        Ok(Some(s)) => s,
        Ok(None) => return err(&req.id, "not_found", "student not found", None),
        Err(e) => return err(&req.id, "store_failed", e.to_string(), None),
    };
    let entry = match fees::get_entry_by_student(store, student_id) {
        Ok(Some(e)) => e,
        Ok(None) => return err(&req.id, "not_found", "no fee entry for student", None),
        Err(e) => return err(&req.id, "store_failed", e.to_string(), None),
    };
    let Some(deposit) = entry.deposits.iter().find(|d| d.id == deposit_id).cloned() else {
        return err(&req.id, "not_found", "deposit not found", None);
    };

    let class_name = match &student.class_id {
        Some(class_id) => match classes::get_class_by_id(store, class_id) {
            Ok(found) => found.map(|c| c.name),
            Err(e) => return err(&req.id, "store_failed", e.to_string(), None),
        },
        None => None,
    };

    let school: SchoolProfile = match req.params.get("school") {
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(s) => s,
            Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
        },
        None => SchoolProfile::default(),
    };

    let text_param = |key: &str| {
        req.params
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    };
    let session_period = text_param("sessionPeriod");
    let fee_period = text_param("feePeriod");
    let number_of_months = text_param("numberOfMonths");

    let rendered = render_receipt(&ReceiptContext {
        student: &student,
        entry: &entry,
        class_name: class_name.as_deref(),
        deposit_amount: deposit.amount,
        deposit_date: &deposit.date,
        session_period: &session_period,
        fee_period: &fee_period,
        number_of_months: &number_of_months,
        school: &school,
    });

    ok(
        &req.id,
        json!({
            "html": rendered.html,
            "amountInWords": rendered.amount_in_words,
            "totals": rendered.totals
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "receipt.render" => Some(handle_receipt_render(state, req)),
        _ => None,
    }
}
