use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::ids;
use crate::store::{merge_record, Store, FEE_ENTRIES_KEY, STUDENTS_KEY};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyFee {
    pub id: String,
    /// Year-month key (`YYYY-MM`), unique within the entry.
    pub month: String,
    pub amount: f64,
    pub paid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deposit {
    pub id: String,
    pub amount: f64,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// Per-student fee ledger: one-time fees plus monthly and deposit line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeEntry {
    pub id: String,
    pub student_id: String,
    pub registration_fee: f64,
    pub admission_fee: f64,
    pub annual_charges: f64,
    #[serde(default)]
    pub monthly_fees: Vec<MonthlyFee>,
    #[serde(default)]
    pub deposits: Vec<Deposit>,
}

/// Derived amounts, recomputed on demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_one_time_fees: f64,
    pub total_monthly_fees: f64,
    pub grand_total: f64,
    pub total_deposits: f64,
    /// Grand total minus deposits; negative means overpayment.
    pub dues: f64,
}

/// Pure aggregation over a ledger snapshot. The paid flag on monthly fees is
/// deliberately not consulted: dues tracks deposits against the grand total.
pub fn totals(entry: &FeeEntry) -> Totals {
    let total_one_time_fees = entry.registration_fee + entry.admission_fee + entry.annual_charges;
    let total_monthly_fees: f64 = entry.monthly_fees.iter().map(|f| f.amount).sum();
    let grand_total = total_one_time_fees + total_monthly_fees;
    let total_deposits: f64 = entry.deposits.iter().map(|d| d.amount).sum();
    Totals {
        total_one_time_fees,
        total_monthly_fees,
        grand_total,
        total_deposits,
        dues: grand_total - total_deposits,
    }
}

fn all_entries(store: &Store) -> anyhow::Result<Vec<FeeEntry>> {
    store.load_collection(FEE_ENTRIES_KEY)
}

pub fn get_entry_by_student(store: &Store, student_id: &str) -> anyhow::Result<Option<FeeEntry>> {
    Ok(all_entries(store)?
        .into_iter()
        .find(|e| e.student_id == student_id))
}

/// Idempotent: returns the existing entry if one exists, otherwise creates a
/// zeroed one.
pub fn initialize_entry(store: &Store, student_id: &str) -> anyhow::Result<FeeEntry> {
    let mut entries = all_entries(store)?;
    if let Some(existing) = entries.iter().find(|e| e.student_id == student_id) {
        return Ok(existing.clone());
    }

    let entry = FeeEntry {
        id: ids::new_id(),
        student_id: student_id.to_string(),
        registration_fee: 0.0,
        admission_fee: 0.0,
        annual_charges: 0.0,
        monthly_fees: Vec::new(),
        deposits: Vec::new(),
    };
    entries.push(entry.clone());
    store.save_collection(FEE_ENTRIES_KEY, &entries)?;
    Ok(entry)
}

/// Merges partial top-level fields (one-time amounts, or a wholesale
/// replacement of the monthly-fee/deposit collections). Lazily initializes
/// the entry when the student has none yet.
pub fn update_entry(
    store: &Store,
    student_id: &str,
    patch: &serde_json::Value,
) -> anyhow::Result<FeeEntry> {
    initialize_entry(store, student_id)?;

    let mut entries = all_entries(store)?;
    let idx = entries
        .iter()
        .position(|e| e.student_id == student_id)
        .context("fee entry missing after initialization")?;

    let mut updated: FeeEntry = merge_record(&entries[idx], patch)?;
    updated.id = entries[idx].id.clone();
    updated.student_id = student_id.to_string();
    entries[idx] = updated.clone();
    store.save_collection(FEE_ENTRIES_KEY, &entries)?;
    Ok(updated)
}

/// Adding a fee for a month that already has a line item overwrites its
/// amount in place, keeping the item's id and paid flag. Returns None when
/// the student has no entry.
pub fn add_monthly_fee(
    store: &Store,
    student_id: &str,
    month: &str,
    amount: f64,
) -> anyhow::Result<Option<MonthlyFee>> {
    let mut entries = all_entries(store)?;
    let Some(entry) = entries.iter_mut().find(|e| e.student_id == student_id) else {
        return Ok(None);
    };

    let fee = if let Some(existing) = entry.monthly_fees.iter_mut().find(|f| f.month == month) {
        existing.amount = amount;
        existing.clone()
    } else {
        let fee = MonthlyFee {
            id: ids::new_id(),
            month: month.to_string(),
            amount,
            paid: false,
        };
        entry.monthly_fees.push(fee.clone());
        fee
    };

    store.save_collection(FEE_ENTRIES_KEY, &entries)?;
    Ok(Some(fee))
}

/// Always appends; deposits are never de-duplicated by date. Returns None
/// when the student has no entry.
pub fn add_deposit(
    store: &Store,
    student_id: &str,
    amount: f64,
    date: &str,
    remarks: Option<String>,
) -> anyhow::Result<Option<Deposit>> {
    let mut entries = all_entries(store)?;
    let Some(entry) = entries.iter_mut().find(|e| e.student_id == student_id) else {
        return Ok(None);
    };

    let deposit = Deposit {
        id: ids::new_id(),
        amount,
        date: date.to_string(),
        remarks,
    };
    entry.deposits.push(deposit.clone());
    store.save_collection(FEE_ENTRIES_KEY, &entries)?;
    Ok(Some(deposit))
}

/// Flips the paid flag on the matching monthly fee and returns the new
/// state; None when the entry or line item is unknown.
pub fn toggle_paid(store: &Store, student_id: &str, fee_id: &str) -> anyhow::Result<Option<bool>> {
    let mut entries = all_entries(store)?;
    let Some(entry) = entries.iter_mut().find(|e| e.student_id == student_id) else {
        return Ok(None);
    };
    let Some(fee) = entry.monthly_fees.iter_mut().find(|f| f.id == fee_id) else {
        return Ok(None);
    };

    fee.paid = !fee.paid;
    let paid = fee.paid;
    store.save_collection(FEE_ENTRIES_KEY, &entries)?;
    Ok(Some(paid))
}

pub fn delete_entry_for_student(store: &Store, student_id: &str) -> anyhow::Result<bool> {
    let entries = all_entries(store)?;
    if !entries.iter().any(|e| e.student_id == student_id) {
        return Ok(false);
    }
    let remaining: Vec<FeeEntry> = entries
        .into_iter()
        .filter(|e| e.student_id != student_id)
        .collect();
    store.save_collection(FEE_ENTRIES_KEY, &remaining)?;
    Ok(true)
}

/// Removes fee entries whose owning student no longer exists. Run at
/// workspace open: a crash between the two writes of a student delete can
/// leave one behind, and there is no transaction spanning the collections.
pub fn sweep_orphans(store: &Store) -> anyhow::Result<usize> {
    // Raw id scan; avoids the students module so the sweep stays usable
    // before any directory call.
    let students: Vec<serde_json::Value> = store.load_collection(STUDENTS_KEY)?;
    let live: HashSet<String> = students
        .iter()
        .filter_map(|s| s.get("id").and_then(|v| v.as_str()).map(str::to_string))
        .collect();

    let entries = all_entries(store)?;
    let before = entries.len();
    let kept: Vec<FeeEntry> = entries
        .into_iter()
        .filter(|e| live.contains(&e.student_id))
        .collect();
    let removed = before - kept.len();
    if removed > 0 {
        store.save_collection(FEE_ENTRIES_KEY, &kept)?;
    }
    Ok(removed)
}
