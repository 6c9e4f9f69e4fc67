//! Integration tests for the sv-cli binary commands.
#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const BOARD: &str = r#"{
    "squad-a": {
        "name": "Tactical Squad",
        "owner": "p1",
        "keywords": "Infantry",
        "stats": {"t": 4, "sv": "3+", "w": 2},
        "models": [{"id": "a1"}, {"id": "a2"}],
        "flags": {"remained_stationary": true}
    },
    "squad-b": {
        "name": "Boyz",
        "owner": "p2",
        "keywords": ["Infantry"],
        "stats": {"t": 5, "sv": "5+", "w": 1},
        "models": [{"id": "b1"}, {"id": "b2"}, {"id": "b3"}, {"id": "boss", "keywords": "Infantry, Character", "wounds": 3}],
        "weapons": [{"id": "choppa", "range": "melee", "a": 3, "ws": "3+", "s": 4, "ap": 1, "d": 1}]
    }
}"#;

const CATALOG: &str = r#"[
    {"id": "bolter", "name": "Bolt rifle", "range": "24\"", "attacks": 2, "bs": "3+", "s": 4, "ap": -1, "d": 1, "keywords": "Heavy, Assault"},
    {"id": "flamer", "name": "Flamer", "range": 12, "attacks": "D6", "bs": "N/A", "s": 4, "ap": 0, "d": 1, "abilities": "Torrent, Ignores Cover"}
]"#;

const ACTION: &str = r#"{
    "actor_unit_id": "squad-a",
    "assignments": [
        {"target_unit_id": "squad-b", "weapon_id": "bolter", "model_ids": ["a1", "a2"]}
    ]
}"#;

/// Create a temp directory holding board, catalog and action files.
fn fixture(action: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("board.json"), BOARD).unwrap();
    fs::write(dir.path().join("catalog.json"), CATALOG).unwrap();
    fs::write(dir.path().join("action.json"), action).unwrap();
    dir
}

fn salvo() -> Command {
    Command::cargo_bin("salvo").unwrap()
}

fn with_files(cmd: &mut Command, dir: &TempDir) {
    cmd.arg("--board")
        .arg(dir.path().join("board.json"))
        .arg("--catalog")
        .arg(dir.path().join("catalog.json"))
        .arg("--action")
        .arg(dir.path().join("action.json"));
}

// ---------------------------------------------------------------------------
// resolve
// ---------------------------------------------------------------------------

#[test]
fn resolve_prints_summary_table() {
    let dir = fixture(ACTION);
    let mut cmd = salvo();
    cmd.arg("resolve");
    with_files(&mut cmd, &dir);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Resolution"))
        .stdout(predicate::str::contains("bolter"))
        .stdout(predicate::str::contains("4 attacks"));
}

#[test]
fn resolve_json_is_machine_readable() {
    let dir = fixture(ACTION);
    let mut cmd = salvo();
    cmd.args(["resolve", "--json", "--seed", "7"]);
    with_files(&mut cmd, &dir);
    let output = cmd.assert().success().get_output().stdout.clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["success"], true);
    assert_eq!(value["summary"]["attacks"], 4);
    let stages: Vec<&str> = value["log"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["stage"].as_str().unwrap())
        .collect();
    assert_eq!(&stages[..2], &["attacks", "hit"]);
}

#[test]
fn resolve_same_seed_same_output() {
    let dir = fixture(ACTION);
    let run = || {
        let mut cmd = salvo();
        cmd.args(["resolve", "--json", "--seed", "1234"]);
        with_files(&mut cmd, &dir);
        cmd.assert().success().get_output().stdout.clone()
    };
    assert_eq!(run(), run());
}

#[test]
fn resolve_verbose_shows_roll_log() {
    let dir = fixture(ACTION);
    let mut cmd = salvo();
    cmd.args(["resolve", "--verbose"]);
    with_files(&mut cmd, &dir);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Roll Log"))
        .stdout(predicate::str::contains("#0 hit bolter vs squad-b 3+ (+1)"));
}

#[test]
fn resolve_unknown_weapon_fails() {
    let dir = fixture(
        r#"{"actor_unit_id": "squad-a", "assignments": [
            {"target_unit_id": "squad-b", "weapon_id": "lascannon", "model_ids": ["a1"]}
        ]}"#,
    );
    let mut cmd = salvo();
    cmd.arg("resolve");
    with_files(&mut cmd, &dir);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("weapon not found: lascannon"));
}

#[test]
fn resolve_empty_model_list_is_a_no_op() {
    let dir = fixture(
        r#"{"actor_unit_id": "squad-a", "assignments": [
            {"target_unit_id": "squad-b", "weapon_id": "flamer", "model_ids": []}
        ]}"#,
    );
    let mut cmd = salvo();
    cmd.args(["resolve", "--json"]);
    with_files(&mut cmd, &dir);
    let output = cmd.assert().success().get_output().stdout.clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["log"].as_array().unwrap().len(), 0);
    assert_eq!(value["summary"]["damage_applied"], 0);
}

#[test]
fn resolve_missing_board_fails() {
    salvo()
        .args(["resolve", "--board", "/nonexistent/board.json", "--action", "/nonexistent/a.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

// ---------------------------------------------------------------------------
// estimate
// ---------------------------------------------------------------------------

#[test]
fn estimate_prints_expected_damage() {
    let dir = fixture(ACTION);
    let mut cmd = salvo();
    cmd.arg("estimate");
    with_files(&mut cmd, &dir);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Expected damage"))
        .stdout(predicate::str::contains("4.00"));
}

#[test]
fn estimate_json() {
    let dir = fixture(ACTION);
    let mut cmd = salvo();
    cmd.args(["estimate", "--json"]);
    with_files(&mut cmd, &dir);
    let output = cmd.assert().success().get_output().stdout.clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 1);
    assert_eq!(value[0]["attacks"], 4.0);
}

// ---------------------------------------------------------------------------
// weapons
// ---------------------------------------------------------------------------

#[test]
fn weapons_lists_catalog_and_board() {
    let dir = fixture(ACTION);
    salvo()
        .arg("weapons")
        .arg("--catalog")
        .arg(dir.path().join("catalog.json"))
        .arg("--board")
        .arg(dir.path().join("board.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Bolt rifle"))
        .stdout(predicate::str::contains("Torrent"))
        .stdout(predicate::str::contains("choppa"))
        .stdout(predicate::str::contains("3 weapons"));
}

#[test]
fn weapons_without_catalog() {
    salvo()
        .arg("weapons")
        .assert()
        .success()
        .stdout(predicate::str::contains("No weapons found"));
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_valid_files() {
    let dir = fixture(ACTION);
    let mut cmd = salvo();
    cmd.arg("check");
    with_files(&mut cmd, &dir);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("All checks passed"))
        .stdout(predicate::str::contains("2 units, 6 models"));
}

#[test]
fn check_rejects_bad_action() {
    let dir = fixture(
        r#"{"actor_unit_id": "squad-a", "assignments": [
            {"target_unit_id": "squad-b", "weapon_id": "bolter", "model_ids": ["a1", "a1"]}
        ]}"#,
    );
    let mut cmd = salvo();
    cmd.arg("check");
    with_files(&mut cmd, &dir);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("listed twice"));
}

#[test]
fn check_rejects_malformed_board() {
    let dir = fixture(ACTION);
    fs::write(dir.path().join("board.json"), r#"{"u": {"stats": {"t": "tough"}}}"#).unwrap();
    salvo()
        .arg("check")
        .arg("--board")
        .arg(dir.path().join("board.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("board.json"));
}
