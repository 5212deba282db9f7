use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::fmt::Write;

use crate::fees::{self, FeeEntry, Totals};
use crate::students::Student;
use crate::words::number_to_words;

/// School letterhead for the receipt. Fixed defaults, overridable per call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolProfile {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_phone")]
    pub phone: String,
    #[serde(default = "default_email")]
    pub email: String,
}

fn default_name() -> String {
    "Sunrise Kindergarten".to_string()
}
fn default_address() -> String {
    "12 School Lane".to_string()
}
fn default_phone() -> String {
    "Tel.: 000-000-0000".to_string()
}
fn default_email() -> String {
    "office@sunrise-kindergarten.example".to_string()
}

impl Default for SchoolProfile {
    fn default() -> Self {
        SchoolProfile {
            name: default_name(),
            address: default_address(),
            phone: default_phone(),
            email: default_email(),
        }
    }
}

pub struct ReceiptContext<'a> {
    pub student: &'a Student,
    pub entry: &'a FeeEntry,
    /// Class name resolved by the student's class id; "-" when unenrolled.
    pub class_name: Option<&'a str>,
    pub deposit_amount: f64,
    pub deposit_date: &'a str,
    pub session_period: &'a str,
    pub fee_period: &'a str,
    pub number_of_months: &'a str,
    pub school: &'a SchoolProfile,
}

pub struct RenderedReceipt {
    pub html: String,
    pub amount_in_words: String,
    pub totals: Totals,
}

const RECEIPT_STYLE: &str = "\
body { font-family: Arial, sans-serif; }\n\
table { width: 100%; border-collapse: collapse; margin-bottom: 20px; }\n\
th, td { border: 1px solid #000; padding: 8px; }\n\
th { text-align: left; }\n\
.header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 20px; }\n\
.title { text-align: center; font-weight: bold; margin: 10px 0; }\n\
.school-info { margin-bottom: 10px; }\n\
.signature { text-align: right; margin-top: 30px; }\n\
.payment-method { margin-top: 20px; }\n\
@media print { @page { size: auto; margin: 10mm; } }";

/// Renders the fixed-layout printable receipt as a self-contained HTML
/// document. The open-window-and-print sink is an external collaborator;
/// this function only builds the document.
pub fn render_receipt(ctx: &ReceiptContext) -> RenderedReceipt {
    let totals = fees::totals(ctx.entry);
    let amount_in_words = number_to_words(ctx.deposit_amount.trunc() as i64);

    let (first_name, last_name) = split_name(&ctx.student.name);
    let dues_cell = if totals.dues > 0.0 {
        money(totals.dues)
    } else {
        "-".to_string()
    };
    let amount_due = if totals.dues > 0.0 {
        money(totals.dues)
    } else {
        "Nil".to_string()
    };

    let mut body = String::new();
    let _ = write!(
        body,
        "<div class=\"header\">\n\
         <div class=\"school-info\">\n\
         <div><strong>{name}</strong></div>\n\
         <div>{address}</div>\n\
         <div>{phone}</div>\n\
         <div>Email: {email}</div>\n\
         </div>\n\
         </div>\n\
         <div class=\"title\">FEE RECEIPT</div>\n",
        name = esc(&ctx.school.name),
        address = esc(&ctx.school.address),
        phone = esc(&ctx.school.phone),
        email = esc(&ctx.school.email),
    );

    let _ = write!(
        body,
        "<table><tbody>\n\
         <tr><td>First Name</td><td>{first}</td><td>Last Name</td><td>{last}</td></tr>\n\
         <tr><td>Father's Name</td><td>{father}</td><td>Mother's Name</td><td>{mother}</td></tr>\n\
         <tr><td>Grade</td><td>{grade}</td><td>Date Of Birth</td><td>{dob}</td></tr>\n\
         <tr><td>Session Period</td><td>{session}</td><td>Date Of Receipt</td><td>{receipt_date}</td></tr>\n\
         <tr><td>Fee Period</td><td>{fee_period}</td><td>No. Of Months</td><td>{months}</td></tr>\n\
         </tbody></table>\n",
        first = esc(first_name),
        last = esc(last_name),
        father = esc(ctx.student.father_name.as_deref().unwrap_or("-")),
        mother = esc(ctx.student.mother_name.as_deref().unwrap_or("-")),
        grade = esc(ctx.class_name.unwrap_or("-")),
        dob = esc(&ordinal_date(&ctx.student.date_of_birth)),
        session = esc(ctx.session_period),
        receipt_date = esc(&ordinal_date(ctx.deposit_date)),
        fee_period = esc(ctx.fee_period),
        months = esc(ctx.number_of_months),
    );

    let _ = write!(
        body,
        "<table>\n\
         <thead><tr><th>Particulars</th><th>Amount</th><th>Date</th><th>Deposited</th></tr></thead>\n\
         <tbody>\n\
         <tr><td>Tuition Fee</td><td>{monthly}</td><td>{date}</td><td>{deposited}</td></tr>\n\
         <tr><td>Any Due</td><td>{dues_cell}</td><td></td><td></td></tr>\n\
         <tr><td>Total</td><td>{grand}</td><td></td><td>{deposited}</td></tr>\n\
         <tr><td colspan=\"4\">Total Amount Paid: {deposited}</td></tr>\n\
         <tr><td colspan=\"4\">Amount Due: {amount_due}</td></tr>\n\
         <tr><td colspan=\"4\">Received with thanks Rs. {words} Only</td></tr>\n\
         </tbody></table>\n\
         <div class=\"payment-method\">Cheque &#9633; &nbsp; UPI &#9633; &nbsp; Cash &#9633;</div>\n\
         <div class=\"signature\">Signature/Stamp</div>\n",
        monthly = money(totals.total_monthly_fees),
        date = esc(&slash_date(ctx.deposit_date)),
        deposited = money(ctx.deposit_amount),
        dues_cell = dues_cell,
        grand = money(totals.grand_total),
        amount_due = amount_due,
        words = esc(&amount_in_words),
    );

    let html = format!(
        "<html>\n<head>\n<title>Fee Receipt</title>\n<style>\n{RECEIPT_STYLE}\n</style>\n</head>\n<body>\n{body}</body>\n</html>\n"
    );

    RenderedReceipt {
        html,
        amount_in_words,
        totals,
    }
}

fn split_name(name: &str) -> (&str, &str) {
    match name.split_once(' ') {
        Some((first, last)) => (first, last),
        None => (name, ""),
    }
}

fn money(v: f64) -> String {
    format!("{v:.2}")
}

/// "2019-03-15" -> "15th March 2019"; unparseable input is shown verbatim.
fn ordinal_date(s: &str) -> String {
    let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") else {
        return s.to_string();
    };
    let day = date.day();
    let suffix = match day {
        11..=13 => "th",
        d if d % 10 == 1 => "st",
        d if d % 10 == 2 => "nd",
        d if d % 10 == 3 => "rd",
        _ => "th",
    };
    format!("{day}{suffix} {}", date.format("%B %Y"))
}

/// "2019-03-15" -> "15/03/2019"; unparseable input is shown verbatim.
fn slash_date(s: &str) -> String {
    match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Ok(date) => date.format("%d/%m/%Y").to_string(),
        Err(_) => s.to_string(),
    }
}

fn esc(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
