use std::path::Path;
use std::process::{Command, Output};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/lsp.json");

fn json_msggen(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_json-msggen"))
        .args(args)
        .env_remove("JSON_MSGGEN_LOG")
        .output()
        .expect("failed to run json-msggen")
}

#[test]
fn generate_writes_both_streams() {
    let dir = tempfile::tempdir().unwrap();
    let decls = dir.path().join("out/decls.rs");
    let defs = dir.path().join("out/defs.rs");
    let output = json_msggen(&[
        "generate",
        "-i",
        FIXTURE,
        "--declarations",
        decls.to_str().unwrap(),
        "--definitions",
        defs.to_str().unwrap(),
        "--runtime-path",
        "crate::runtime",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let decls = std::fs::read_to_string(&decls).unwrap();
    let defs = std::fs::read_to_string(&defs).unwrap();
    assert!(decls.contains("use crate::runtime::*;"));
    assert!(decls.contains("pub struct Position {"));
    assert!(defs.contains("impl Position {"));
}

#[test]
fn generate_to_stdout_is_deterministic() {
    let first = json_msggen(&["generate", "-i", FIXTURE]);
    let second = json_msggen(&["generate", "-i", FIXTURE]);
    assert!(first.status.success());
    assert!(!first.stdout.is_empty());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn check_accepts_the_fixture() {
    let output = json_msggen(&["check", "-i", FIXTURE]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
}

#[test]
fn check_rejects_a_broken_sample() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    write(
        &path,
        r#"{"types": [{"kind": "object", "name": "P", "fields": [{"name": "x", "type": "int"}]}],
            "samples": [{"type": "P", "value": {"x": "one"}}]}"#,
    );
    let output = json_msggen(&["check", "-i", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("1 of 1 samples failed"));
}

#[test]
fn invalid_schemas_fail_with_a_message() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    write(
        &path,
        r#"{"types": [{"kind": "object", "name": "P", "fields": [
            {"name": "v", "type": {"variant": {"alternatives": ["int", "int"]}}}]}]}"#,
    );
    let output = json_msggen(&["generate", "-i", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot discriminate"));
}

#[test]
fn decode_prints_the_re_encoded_value() {
    let dir = tempfile::tempdir().unwrap();
    let value = dir.path().join("value.json");
    write(&value, r#"{"line": 3, "character": 4, "ignored": true}"#);
    let output = json_msggen(&["decode", "-i", FIXTURE, "--type", "Position", "--value", value.to_str().unwrap()]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let printed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(printed, serde_json::json!({"line": 3, "character": 4}));
}

fn write(path: &Path, contents: &str) {
    std::fs::write(path, contents).unwrap();
}
