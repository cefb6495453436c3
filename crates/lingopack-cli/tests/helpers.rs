use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;

pub fn bin_cmd() -> Command {
    Command::cargo_bin("lingopack").expect("lingopack built")
}

/// Last non-empty stdout line, where the JSON envelope lands.
pub fn last_json_line(stdout: &[u8]) -> serde_json::Value {
    let out = String::from_utf8_lossy(stdout).to_string();
    let line = out
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .expect("have json line");
    serde_json::from_str(line).expect("json envelope")
}

pub fn init_project(db: &Path, source: &str, targets: &str) {
    bin_cmd()
        .args(["--db"])
        .arg(db)
        .args(["init-project", "--project", "1", "--source", source, "--targets", targets])
        .assert()
        .success();
}

pub fn import_file(db: &Path, dir: &Path, locale: &str, raw: &str) -> serde_json::Value {
    let pack = dir.join(format!("{locale}-in.json"));
    std::fs::write(&pack, raw).expect("write pack");
    let assert = bin_cmd()
        .args(["--no-color", "--db"])
        .arg(db)
        .args(["import", "--project", "1", "--locale", locale, "--file"])
        .arg(&pack)
        .args(["--format", "json"])
        .assert()
        .success();
    last_json_line(&assert.get_output().stdout)
}
