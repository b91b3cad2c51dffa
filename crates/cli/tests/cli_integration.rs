use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const SCHEMA: &str = r#"{
    "name": "tool",
    "version": "1.0.0",
    "args": [
        { "name": "output", "long": "output", "kind": "value", "default-value": "text", "persistent": true },
        { "name": "json", "long": "json" },
        { "name": "yaml", "long": "yaml" }
    ],
    "mutually-exclusive": [["json", "yaml"]],
    "subcommands": [
        {
            "name": "search",
            "args": [ { "name": "query", "positional": true, "required": true } ]
        }
    ]
}"#;

fn make_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before UNIX_EPOCH")
        .as_nanos();
    let pid = std::process::id();
    let dir = std::env::temp_dir().join(format!("argtree-integ-{prefix}-{pid}-{nanos}"));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

fn write_schema(dir: &Path, json: &str) -> PathBuf {
    let path = dir.join("schema.json");
    fs::write(&path, json).expect("failed to write schema");
    path
}

fn argtree() -> Command {
    Command::new(env!("CARGO_BIN_EXE_argtree"))
}

fn stdout_json(out: &Output) -> serde_json::Value {
    serde_json::from_slice(&out.stdout).unwrap_or_else(|err| {
        panic!(
            "stdout is not JSON ({err}):\n{}",
            String::from_utf8_lossy(&out.stdout)
        )
    })
}

#[test]
fn help_works() {
    let out = argtree()
        .arg("--help")
        .output()
        .expect("failed to run argtree --help");
    assert!(
        out.status.success(),
        "argtree --help failed:\nstatus: {}\nstderr:\n{}",
        out.status,
        String::from_utf8_lossy(&out.stderr),
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.contains("check") && stdout.contains("parse") && stdout.contains("inspect"),
        "unexpected help output:\n{stdout}"
    );
}

#[test]
fn check_accepts_valid_schema() {
    let dir = make_temp_dir("check-ok");
    let schema = write_schema(&dir, SCHEMA);

    let out = argtree()
        .arg("check")
        .arg(&schema)
        .arg("--json")
        .output()
        .expect("failed to run argtree check");
    assert!(
        out.status.success(),
        "argtree check failed:\nstatus: {}\nstderr:\n{}",
        out.status,
        String::from_utf8_lossy(&out.stderr),
    );
    let report = stdout_json(&out);
    assert_eq!(report["commands"], 2);
    assert_eq!(report["args"], 4);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn check_rejects_conflicting_names() {
    let dir = make_temp_dir("check-conflict");
    let schema = write_schema(
        &dir,
        r#"{
            "name": "tool",
            "args": [
                { "name": "all", "long": "all" },
                { "name": "any", "long": "all" }
            ]
        }"#,
    );

    let out = argtree()
        .arg("check")
        .arg(&schema)
        .output()
        .expect("failed to run argtree check");
    assert!(!out.status.success(), "check unexpectedly succeeded");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("invalid command definition") && stderr.contains("--all"),
        "unexpected stderr:\n{stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn parse_prints_result_tree() {
    let dir = make_temp_dir("parse-ok");
    let schema = write_schema(&dir, SCHEMA);

    let out = argtree()
        .arg("parse")
        .arg(&schema)
        .args(["--", "--output", "json", "search", "rust"])
        .output()
        .expect("failed to run argtree parse");
    assert!(
        out.status.success(),
        "argtree parse failed:\nstatus: {}\nstderr:\n{}",
        out.status,
        String::from_utf8_lossy(&out.stderr),
    );
    let report = stdout_json(&out);
    assert_eq!(report["status"], "parsed");
    let root = &report["result"];
    assert_eq!(root["values"]["output"], "json");
    assert_eq!(root["subcommand"]["name"], "search");
    let child = &root["subcommand"]["result"];
    assert_eq!(child["values"]["output"], "json");
    assert_eq!(child["values"]["query"], "rust");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn parse_reports_errors_with_exit_code() {
    let dir = make_temp_dir("parse-err");
    let schema = write_schema(&dir, SCHEMA);

    let out = argtree()
        .arg("parse")
        .arg(&schema)
        .args(["--", "--json", "--yaml"])
        .output()
        .expect("failed to run argtree parse");
    assert_eq!(out.status.code(), Some(2), "unexpected status: {}", out.status);
    let report = stdout_json(&out);
    assert_eq!(report["status"], "error");
    assert_eq!(report["error"]["code"], "mutually-exclusive");
    assert_eq!(report["error"]["names"], serde_json::json!(["json", "yaml"]));
    assert_eq!(report["error"]["path"], serde_json::json!(["tool"]));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn parse_reports_help_path() {
    let dir = make_temp_dir("parse-help");
    let schema = write_schema(&dir, SCHEMA);

    let out = argtree()
        .arg("parse")
        .arg(&schema)
        .args(["--", "help", "search"])
        .output()
        .expect("failed to run argtree parse");
    assert!(out.status.success(), "unexpected status: {}", out.status);
    let report = stdout_json(&out);
    assert_eq!(report["status"], "help");
    assert_eq!(report["path"], serde_json::json!(["tool", "search"]));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn inspect_shows_inherited_args() {
    let dir = make_temp_dir("inspect");
    let schema = write_schema(&dir, SCHEMA);

    let out = argtree()
        .arg("inspect")
        .arg(&schema)
        .output()
        .expect("failed to run argtree inspect");
    assert!(
        out.status.success(),
        "argtree inspect failed:\nstatus: {}\nstderr:\n{}",
        out.status,
        String::from_utf8_lossy(&out.stderr),
    );
    let snapshot = stdout_json(&out);
    assert_eq!(snapshot["name"], "tool");
    assert_eq!(
        snapshot["subcommands"][0]["inherited-args"],
        serde_json::json!(["output"])
    );

    let _ = fs::remove_dir_all(&dir);
}
