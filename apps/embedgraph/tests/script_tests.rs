//! Integration tests for the script runner and CLI commands.

use embedgraph::AppError;
use embedgraph::cli::{cmd_check, cmd_run};
use serde_json::{Value, json};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

fn write_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write");
    file
}

fn run(script: &Value, config: Option<&Path>) -> Result<Vec<Value>, AppError> {
    let file = write_file(&script.to_string());
    let mut out = Vec::new();
    cmd_run(file.path(), config, false, false, &mut out)?;

    Ok(String::from_utf8(out)
        .expect("utf8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect())
}

fn employee(title: &str, department: &str, is_manager: bool) -> Value {
    json!({
        "$type": "embedgraph.Employee",
        "Title": title,
        "Department": department,
        "IsManager": is_manager
    })
}

fn key(id: &str) -> Value {
    json!({"namespace": "Employee", "id": id})
}

fn result_ids(outcome: &Value) -> Vec<String> {
    let mut ids: Vec<String> = outcome["result"]["value"]
        .as_array()
        .expect("node list")
        .iter()
        .map(|node| node["key"]["id"].as_str().expect("id").to_string())
        .collect();
    ids.sort();
    ids
}

// =============================================================================
// EMPLOYEE SCENARIO
// =============================================================================

#[test]
fn employee_search_scenario() {
    let script = json!([
        {"op": "upsert", "namespace": "Employee", "id": "123",
         "payload": employee("Senior Manager", "A-12", true)},
        {"op": "upsert", "namespace": "Employee", "id": "124",
         "payload": employee("Senior Manager", "R-17", true)},
        {"op": "upsert", "id": "125",
         "payload": employee("Senior Developer", "R-17", false)},
        {"op": "search", "namespace": "Employee", "filter": {"Title": "Senior Manager"}},
        {"op": "search", "namespace": "Employee",
         "filter": {"Title": "Senior Manager", "Department": "A-12"}},
        {"op": "search", "namespace": "Employee",
         "filter": {"Title": "Senior Manager", "Department": "A-13"}},
        {"op": "search", "namespace": "embedgraph.Employee", "filter": {"IsManager": false}},
        {"op": "delete", "namespace": "Employee", "id": "123"},
        {"op": "search", "namespace": "Employee", "filter": {"IsManager": true}},
        {"op": "get", "namespace": "Employee", "id": "123"}
    ]);

    let outcomes = run(&script, None).expect("run");
    assert_eq!(outcomes.len(), 10);
    assert!(outcomes.iter().all(|o| o["ok"] == json!(true)));

    assert_eq!(
        outcomes[2]["result"]["value"]["key"]["namespace"],
        json!("embedgraph.Employee")
    );
    assert_eq!(result_ids(&outcomes[3]), vec!["123", "124"]);
    assert_eq!(result_ids(&outcomes[4]), vec!["123"]);
    assert!(result_ids(&outcomes[5]).is_empty());
    assert_eq!(result_ids(&outcomes[6]), vec!["125"]);
    assert_eq!(result_ids(&outcomes[8]), vec!["124"]);
    assert_eq!(outcomes[9]["result"], json!({"kind": "node", "value": null}));
}

#[test]
fn update_replaces_payload_and_index() {
    let script = json!([
        {"op": "upsert", "namespace": "Employee", "id": "234",
         "payload": employee("Senior Engineer", "", false)},
        {"op": "upsert", "namespace": "Employee", "id": "234",
         "payload": employee("Manager", "", true)},
        {"op": "search", "namespace": "Employee", "filter": {"Title": "Manager"}},
        {"op": "search", "namespace": "Employee", "filter": {"Title": "Senior Engineer"}},
        {"op": "metrics"}
    ]);

    let outcomes = run(&script, None).expect("run");
    assert_eq!(result_ids(&outcomes[2]), vec!["234"]);
    assert!(result_ids(&outcomes[3]).is_empty());

    let metrics = &outcomes[4]["result"]["value"];
    assert_eq!(metrics["node_count"], json!(1));
    assert_eq!(metrics["index"]["retracted_entries"], json!(2));
}

// =============================================================================
// EDGES
// =============================================================================

#[test]
fn edge_lifecycle_and_dangling_traversal() {
    let script = json!([
        {"op": "add_edge", "relation": "manage", "from": key("123"), "to": key("456")},
        {"op": "upsert", "namespace": "Employee", "id": "123",
         "payload": employee("Senior Manager", "", true)},
        {"op": "add_edge", "relation": "manage", "from": key("123"), "to": key("456")},
        {"op": "upsert", "namespace": "Employee", "id": "456",
         "payload": employee("Senior Engineer", "", false)},
        {"op": "add_edge", "relation": "manage", "from": key("123"), "to": key("456")},
        {"op": "exists", "relation": "manage", "from": key("123"), "to": key("456")},
        {"op": "traverse", "relation": "manage", "from": key("123")},
        {"op": "sources", "relation": "manage", "to": key("456")},
        {"op": "delete", "namespace": "Employee", "id": "456"},
        {"op": "traverse", "relation": "manage", "from": key("123"), "depth": 3},
        {"op": "delete_edge", "relation": "manage", "from": key("123"), "to": key("456")},
        {"op": "exists", "relation": "manage", "from": key("123"), "to": key("456")},
        {"op": "compact"}
    ]);

    let outcomes = run(&script, None).expect("run");

    assert_eq!(outcomes[0]["ok"], json!(false));
    assert_eq!(
        outcomes[0]["error"],
        json!("edge source node not found: Employee:123")
    );
    assert_eq!(
        outcomes[2]["error"],
        json!("edge target node not found: Employee:456")
    );
    assert_eq!(outcomes[4]["ok"], json!(true));
    assert_eq!(outcomes[5]["result"], json!({"kind": "exists", "value": true}));
    assert_eq!(result_ids(&outcomes[6]), vec!["456"]);
    assert_eq!(result_ids(&outcomes[7]), vec!["123"]);
    assert!(result_ids(&outcomes[9]).is_empty());
    assert_eq!(outcomes[11]["result"]["value"], json!(false));
    assert_eq!(outcomes[12]["result"]["kind"], json!("compacted"));
    assert_eq!(outcomes[12]["result"]["value"]["edges"], json!(1));
}

// =============================================================================
// CONFIG
// =============================================================================

#[test]
fn config_restricts_indexed_fields() {
    let config = write_file("[namespaces.Employee]\nindex = [\"Title\"]\n");
    let script = json!([
        {"op": "upsert", "namespace": "Employee", "id": "1",
         "payload": employee("Manager", "A-12", true)},
        {"op": "search", "namespace": "Employee", "filter": {"Title": "Manager"}},
        {"op": "search", "namespace": "Employee", "filter": {"IsManager": true}}
    ]);

    let outcomes = run(&script, Some(config.path())).expect("run");
    assert_eq!(result_ids(&outcomes[1]), vec!["1"]);
    assert!(result_ids(&outcomes[2]).is_empty());
}

#[test]
fn bad_config_fails_before_running() {
    let config = write_file("[namespaces.Employee]\nindex = 3\n");
    let err = run(&json!([]), Some(config.path())).expect_err("bad config");
    assert!(matches!(err, AppError::Config { .. }));
}

// =============================================================================
// CHECK / ERRORS
// =============================================================================

#[test]
fn check_counts_steps_without_running() {
    let script = write_file(
        &json!([
            {"op": "upsert", "namespace": "Employee", "id": "1", "payload": {}},
            {"op": "get", "namespace": "Employee", "id": "1"},
            {"op": "metrics"},
            {"op": "compact"}
        ])
        .to_string(),
    );

    let mut out = Vec::new();
    cmd_check(script.path(), false, &mut out).expect("check");

    let report: Value = serde_json::from_slice(&out).expect("json");
    assert_eq!(report["file"], json!(script.path().display().to_string()));
    assert_eq!(report["steps"], json!(4));
    assert_eq!(report["mutations"], json!(2));
    assert_eq!(report["queries"], json!(2));
}

#[test]
fn malformed_script_is_rejected() {
    let script = write_file(r#"[{"op": "upsert", "namespace": "Employee"}]"#);
    let mut out = Vec::new();

    let err = cmd_check(script.path(), false, &mut out).expect_err("missing fields");
    assert!(matches!(err, AppError::Json(_)));
    assert!(out.is_empty());
}

#[test]
fn fail_fast_returns_store_error() {
    let script = write_file(
        &json!([
            {"op": "upsert", "namespace": "Fool", "id": "1", "payload": "not a record"}
        ])
        .to_string(),
    );
    let mut out = Vec::new();

    let err = cmd_run(script.path(), None, true, false, &mut out).expect_err("fail fast");
    assert_eq!(err.to_string(), "payload is not a record (got string)");

    let line: Value = serde_json::from_slice(&out).expect("json");
    assert_eq!(line["ok"], json!(false));
    assert_eq!(line["error"], json!("payload is not a record (got string)"));
}

#[test]
fn fail_fast_prints_outcomes_before_stopping() {
    let script = write_file(
        &json!([
            {"op": "upsert", "namespace": "Employee", "id": "1",
             "payload": employee("Manager", "A-12", true)},
            {"op": "add_edge", "relation": "manage", "from": key("1"), "to": key("9")},
            {"op": "upsert", "namespace": "Employee", "id": "2",
             "payload": employee("Developer", "A-12", false)}
        ])
        .to_string(),
    );
    let mut out = Vec::new();

    let err = cmd_run(script.path(), None, true, false, &mut out).expect_err("fail fast");
    assert_eq!(err.to_string(), "edge target node not found: Employee:9");

    let lines: Vec<Value> = String::from_utf8(out)
        .expect("utf8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["step"], json!(0));
    assert_eq!(lines[0]["op"], json!("upsert"));
    assert_eq!(lines[0]["ok"], json!(true));
    assert_eq!(lines[1]["step"], json!(1));
    assert_eq!(lines[1]["ok"], json!(false));
}

#[test]
fn missing_script_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut out = Vec::new();
    let err = cmd_check(&dir.path().join("nope.json"), false, &mut out).expect_err("missing");
    assert!(matches!(err, AppError::Io { .. }));
}
