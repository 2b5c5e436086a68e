//! Integration tests for `yy parse`.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::tempdir;

fn cargo_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO"));
    cmd.args(["run", "-p", "yy-cli", "--bin", "yy", "--"]);
    cmd
}

const PATTERNS: &str = r#"{
    "literals": "=+;",
    "tokens": [
        {"name": "NUM", "pattern": "[0-9]+"},
        {"name": "IDENT", "pattern": "[a-z]+"}
    ],
    "ignore": ["[ \n]+"]
}"#;

const GRAMMAR: &str = r#"{
    "elements": [
        {"name": "Program", "rules": [["Program", "Statement"], ["Statement"]]},
        {"name": "Statement", "rules": [["IDENT", "'='", "Expr", "';'"]]},
        {"name": "Expr", "nest": true, "collapse": true,
         "rules": [["Expr", "'+'", "Atom"], ["Atom"]]},
        {"name": "Atom", "rules": [["NUM"], ["IDENT"]]}
    ]
}"#;

fn parse(dir: &Path, source: &str, extra: &[&str]) -> Output {
    std::fs::write(dir.join("patterns.json"), PATTERNS).unwrap();
    std::fs::write(dir.join("grammar.json"), GRAMMAR).unwrap();
    std::fs::write(dir.join("input.txt"), source).unwrap();

    cargo_bin()
        .args(extra)
        .args(["parse", "input.txt", "-p", "patterns.json", "-g", "grammar.json", "--cwd"])
        .arg(dir)
        .output()
        .expect("Failed to run parse command")
}

#[test]
fn test_parse_json_tree() {
    let dir = tempdir().unwrap();
    let output = parse(dir.path(), "x = 1 + 22;\ny = x;\n", &["--json"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let tree: serde_json::Value =
        serde_json::from_str(&stdout).expect("stdout should be valid JSON");

    assert_eq!(tree["element"], "Program");
    let statements = tree["children"].as_array().unwrap();
    assert_eq!(statements.len(), 2);

    let first = &statements[0];
    assert_eq!(first["element"], "Statement");
    assert_eq!(first["rule"], 0);
    let texts: Vec<_> = first["tokens"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["text"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(texts, vec!["x", "=", ";"]);

    // `1 + 22` nests into one Expr over two Atoms.
    let expr = &first["children"][0];
    assert_eq!(expr["element"], "Expr");
    assert_eq!(expr["tokens"][0]["text"], "+");
    assert_eq!(expr["children"][0]["element"], "Atom");
    assert_eq!(expr["children"][1]["tokens"][0]["text"], "22");

    // A lone Atom collapses through Expr.
    let second = &statements[1];
    assert_eq!(second["children"][0]["element"], "Atom");
    assert_eq!(second["children"][0]["rule"], 1);
}

#[test]
fn test_parse_human_tree() {
    let dir = tempdir().unwrap();
    let output = parse(dir.path(), "x = 1 + 22;", &[]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "Program (rule 1)");
    assert_eq!(lines[1], "  Statement (rule 0)");
    assert_eq!(lines[2], r#"    IDENT "x" 1:0"#);
    assert_eq!(lines[3], r#"    '=' "=" 1:2"#);
    assert_eq!(lines[4], "    Expr (rule 0)");
    assert!(stdout.contains(r#"NUM "22" 1:8"#), "stdout: {stdout}");
    assert_eq!(lines.last().copied(), Some(r#"    ';' ";" 1:10"#));
}

#[test]
fn test_parse_start_override() {
    let dir = tempdir().unwrap();
    let output = parse(dir.path(), "1 + 2 + 3", &["--json"]);
    assert!(!output.status.success());

    let output = cargo_bin()
        .args([
            "--json", "parse", "input.txt", "-p", "patterns.json", "-g", "grammar.json",
            "--start", "Expr", "--cwd",
        ])
        .arg(dir.path())
        .output()
        .expect("Failed to run parse command");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let tree: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    // Left recursion nests to the left: (1 + 2) + 3.
    assert_eq!(tree["element"], "Expr");
    assert_eq!(tree["children"][0]["element"], "Expr");
    assert_eq!(tree["children"][1]["tokens"][0]["text"], "3");
}

#[test]
fn test_parse_reports_invalid_sequence() {
    let dir = tempdir().unwrap();
    let output = parse(dir.path(), "x = ;", &[]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("input.txt:1:4:"), "stderr: {stderr}");
    assert!(stderr.contains("invalid"), "stderr: {stderr}");
}

#[test]
fn test_parse_unknown_symbol_in_grammar() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("patterns.json"), PATTERNS).unwrap();
    std::fs::write(
        dir.path().join("grammar.json"),
        r#"{"elements": [{"name": "A", "rules": [["STRING"]]}]}"#,
    )
    .unwrap();
    std::fs::write(dir.path().join("input.txt"), "x").unwrap();

    let output = cargo_bin()
        .args(["parse", "input.txt", "-p", "patterns.json", "-g", "grammar.json", "--cwd"])
        .arg(dir.path())
        .output()
        .expect("Failed to run parse command");
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown symbol `STRING`"), "stderr: {stderr}");
}
