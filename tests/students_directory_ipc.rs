use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rosterd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rosterd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn request_err_code(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> String {
    let value = request(stdin, reader, id, method, params);
    assert!(
        !value.get("ok").and_then(|v| v.as_bool()).unwrap_or(true),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .expect("error code")
        .to_string()
}

#[test]
fn create_get_update_delete_with_ledger_cascade() {
    let workspace = temp_dir("rosterd-students");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let created = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "students.create",
        json!({
            "name": "Ethan Parker",
            "contactNumber": "555-123-4567",
            "dateOfBirth": "2019-03-15",
            "fatherName": "James Parker",
            "notes": "Allergic to peanuts"
        }),
    );
    let student_id = created
        .pointer("/student/id")
        .and_then(|v| v.as_str())
        .expect("student id")
        .to_string();
    assert_eq!(student_id.len(), 7);

    // Creation initializes the fee ledger alongside the record.
    let entry = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "fees.get",
        json!({ "studentId": student_id }),
    );
    assert_eq!(
        entry.pointer("/entry/studentId").and_then(|v| v.as_str()),
        Some(student_id.as_str())
    );
    assert_eq!(
        entry.pointer("/entry/registrationFee").and_then(|v| v.as_f64()),
        Some(0.0)
    );

    let fetched = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.get",
        json!({ "studentId": student_id }),
    );
    assert_eq!(
        fetched.pointer("/student/name").and_then(|v| v.as_str()),
        Some("Ethan Parker")
    );

    // Partial merge: untouched fields survive the patch.
    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "students.update",
        json!({
            "studentId": student_id,
            "patch": { "contactNumber": "555-999-0000" }
        }),
    );
    assert_eq!(
        updated.pointer("/student/contactNumber").and_then(|v| v.as_str()),
        Some("555-999-0000")
    );
    assert_eq!(
        updated.pointer("/student/fatherName").and_then(|v| v.as_str()),
        Some("James Parker")
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "students.delete",
        json!({ "studentId": student_id }),
    );

    // Cascade removed the ledger too.
    let entry_after = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "fees.get",
        json!({ "studentId": student_id }),
    );
    assert!(entry_after.get("entry").map(|v| v.is_null()).unwrap_or(false));

    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "8",
        "students.delete",
        json!({ "studentId": student_id }),
    );
    assert_eq!(code, "not_found");
}

#[test]
fn list_filters_by_substring_query() {
    let workspace = temp_dir("rosterd-students-search");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let class = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "classes.create",
        json!({ "name": "Sunflower", "capacity": 20 }),
    );
    let class_id = class
        .pointer("/class/id")
        .and_then(|v| v.as_str())
        .expect("class id")
        .to_string();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.create",
        json!({
            "name": "Ethan Parker",
            "contactNumber": "555-123-4567",
            "dateOfBirth": "2019-03-15",
            "motherName": "Sarah Parker",
            "classId": class_id
        }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.create",
        json!({
            "name": "Sophia Rodriguez",
            "contactNumber": "555-234-5678",
            "dateOfBirth": "2018-11-22"
        }),
    );

    let names = |result: &serde_json::Value| -> Vec<String> {
        result
            .get("students")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default()
            .iter()
            .filter_map(|s| s.get("name").and_then(|v| v.as_str()).map(String::from))
            .collect()
    };

    // Blank query returns the whole directory.
    let all = request_ok(&mut stdin, &mut reader, "5", "students.list", json!({ "query": "  " }));
    assert_eq!(names(&all).len(), 2);

    let by_mother = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "students.list",
        json!({ "query": "sarah" }),
    );
    assert_eq!(names(&by_mother), vec!["Ethan Parker"]);

    let by_class = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "students.list",
        json!({ "query": "SUNFLOWER" }),
    );
    assert_eq!(names(&by_class), vec!["Ethan Parker"]);

    let by_contact = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "students.list",
        json!({ "query": "234-5678" }),
    );
    assert_eq!(names(&by_contact), vec!["Sophia Rodriguez"]);

    let none = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "students.list",
        json!({ "query": "nobody" }),
    );
    assert!(names(&none).is_empty());
}

#[test]
fn mutations_require_a_workspace() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let code = request_err_code(
        &mut stdin,
        &mut reader,
        "1",
        "students.create",
        json!({
            "name": "Ethan Parker",
            "contactNumber": "555-123-4567",
            "dateOfBirth": "2019-03-15"
        }),
    );
    assert_eq!(code, "no_workspace");
}
