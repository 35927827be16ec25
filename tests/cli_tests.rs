// tests/cli_tests.rs
//
// End-to-end runs of the `descent` binary. Requires assert_cmd, predicates
// and tempfile in [dev-dependencies].

mod common;

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use common::{EXPRESSIONS, G1};
use predicates::{prelude::PredicateBooleanExt, str::contains};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn descent() -> Command {
    let mut cmd = Command::cargo_bin("descent").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn cli_parse_accepts_and_prints_tree() {
    let dir = TempDir::new().unwrap();
    let grammar = write(&dir, "g1.txt", G1);
    let tokens = write(&dir, "seq.txt", "a\nb\n");

    descent()
        .arg("parse")
        .arg(&grammar)
        .arg(&tokens)
        .assert()
        .success()
        .stdout(
            contains("Sequence [a, b] is accepted!")
                .and(contains("└── A [3]"))
                .and(contains("production")),
        );
}

#[test]
fn cli_parse_rejection_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let grammar = write(&dir, "g1.txt", G1);
    let tokens = write(&dir, "seq.txt", "a\n");

    descent()
        .arg("parse")
        .arg(&grammar)
        .arg(&tokens)
        .assert()
        .success()
        .stdout(contains("Sequence [a] is rejected at index 1!"));
}

#[test]
fn cli_parse_writes_trace_file() {
    let dir = TempDir::new().unwrap();
    let grammar = write(&dir, "g1.txt", G1);
    let tokens = write(&dir, "seq.txt", "a b b");
    let trace = dir.path().join("out.txt");

    descent()
        .arg("parse")
        .arg(&grammar)
        .arg(&tokens)
        .args(["--format", "words", "--trace"])
        .arg(&trace)
        .assert()
        .success();

    let log = fs::read_to_string(&trace).unwrap();
    assert!(log.starts_with("--------------\nexpand\nState: q Index: 0\n"));
    assert!(log.contains("momentary insuccess"));
    assert!(log.ends_with("Sequence [a, b, b] is accepted!\n"));
}

#[test]
fn cli_parse_reads_pif_and_prints_json() {
    let dir = TempDir::new().unwrap();
    let grammar = write(&dir, "expr.txt", EXPRESSIONS);
    let pif = write(&dir, "PIF.out", "('id', (0, 0))\n('*', -1)\n('id', (0, 1))\n");

    let output = descent()
        .arg("parse")
        .arg(&grammar)
        .arg(&pif)
        .args(["--format", "pif", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["accepted"], true);
    assert_eq!(value["tokens"], serde_json::json!(["id", "*", "id"]));
    assert_eq!(value["tree"]["nodes"][0]["symbol"], "expr");
}

#[test]
fn cli_parse_long_chain_as_json() {
    let dir = TempDir::new().unwrap();
    let grammar = write(&dir, "g1.txt", G1);
    let tokens = write(&dir, "seq.txt", &format!("a\n{}", "b\n".repeat(6_000)));

    let output = descent()
        .arg("parse")
        .arg(&grammar)
        .arg(&tokens)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["accepted"], true);
    assert_eq!(value["tree"]["nodes"].as_array().unwrap().len(), 2 * 6_001);
}

#[test]
fn cli_tree_depth_limit_still_reports_acceptance() {
    let dir = TempDir::new().unwrap();
    let grammar = write(&dir, "g1.txt", G1);
    let tokens = write(&dir, "seq.txt", "a\nb\nb\nb\n");
    let config = write(&dir, "descent.yaml", "max_tree_depth: 2\n");

    descent()
        .arg("--config")
        .arg(&config)
        .arg("parse")
        .arg(&grammar)
        .arg(&tokens)
        .assert()
        .success()
        .stdout(
            contains("Sequence [a, b, b, b] is accepted!")
                .and(contains("No parse tree: parse tree is deeper than the configured limit of 2")),
        );
}

#[test]
fn cli_step_limit_fails_with_diagnostic() {
    let dir = TempDir::new().unwrap();
    let grammar = write(&dir, "left.txt", "N = { S }\nE = { a }\nS = S\nS -> S $ a | a\n");
    let tokens = write(&dir, "seq.txt", "a\na\n");

    descent()
        .arg("parse")
        .arg(&grammar)
        .arg(&tokens)
        .args(["--max-steps", "200"])
        .assert()
        .failure()
        .stderr(contains("descent::parser::step_limit").or(contains("200 steps")));
}

#[test]
fn cli_config_file_sets_step_budget() {
    let dir = TempDir::new().unwrap();
    let grammar = write(&dir, "left.txt", "N = { S }\nE = { a }\nS = S\nS -> S $ a | a\n");
    let tokens = write(&dir, "seq.txt", "a\n");
    let config = write(&dir, "descent.yaml", "max_steps: 50\n");

    descent()
        .arg("--config")
        .arg(&config)
        .arg("parse")
        .arg(&grammar)
        .arg(&tokens)
        .assert()
        .failure()
        .stderr(contains("50"));
}

#[test]
fn cli_grammar_lists_alternatives() {
    let dir = TempDir::new().unwrap();
    let grammar = write(&dir, "g1.txt", G1);

    descent()
        .arg("grammar")
        .arg(&grammar)
        .args(["--productions-for", "A"])
        .assert()
        .success()
        .stdout("A -> b A [2]\nA -> b [3]\n");

    descent()
        .arg("grammar")
        .arg(&grammar)
        .args(["--productions-for", "a"])
        .assert()
        .failure()
        .stderr(contains("undefined_nonterminal").or(contains("not a nonterminal")));
}

#[test]
fn cli_check_reports_errors_and_warnings() {
    let dir = TempDir::new().unwrap();
    let good = write(&dir, "good.txt", "N = { S, X }\nE = { a }\nS = S\nS -> a\n");
    let bad = write(&dir, "bad.txt", "N = { S }\nE = { a }\nS = S\nS -> a $ q\n");

    descent()
        .arg("check")
        .arg(&good)
        .assert()
        .success()
        .stdout(contains("warning: nonterminal 'X'").and(contains("grammar is valid")));

    descent()
        .arg("check")
        .arg(&bad)
        .assert()
        .failure()
        .stdout(contains("error: production of 'S' uses undeclared symbol 'q'"));
}

#[test]
fn cli_syntax_error_is_rendered_with_miette() {
    let dir = TempDir::new().unwrap();
    let grammar = write(&dir, "broken.txt", "N = { S }\nS = S\n");
    let tokens = write(&dir, "seq.txt", "a\n");

    descent()
        .arg("parse")
        .arg(&grammar)
        .arg(&tokens)
        .assert()
        .failure()
        .stderr(contains("descent::grammar::syntax").or(contains("help:")));
}
