mod helpers;

use assert_cmd::prelude::*;
use helpers::{bin_cmd, import_file, init_project, last_json_line};

#[test]
fn source_import_reports_added_keys() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let db = tmp.path().join("catalog.db");
    init_project(&db, "zh-CN", "en-US");

    let envelope = import_file(&db, tmp.path(), "zh-CN", r#"{"common":{"save":"保存"},"title":"标题"}"#);
    assert_eq!(envelope["ok"], true);
    let data = &envelope["data"];
    assert_eq!(data["kind"], "source");
    assert_eq!(data["shape"], "tree");
    assert_eq!(data["summary"]["added"], 2);
    assert_eq!(data["summary"]["added_keys"][0], "common.save");
}

#[test]
fn target_import_counts_ignored_and_skipped_empty() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let db = tmp.path().join("catalog.db");
    init_project(&db, "zh-CN", "en-US");
    import_file(&db, tmp.path(), "zh-CN", r#"{"a":"甲","b":"乙"}"#);

    let envelope = import_file(
        &db,
        tmp.path(),
        "en-US",
        r#"{"a":"alpha","b":"","ghost":"x"}"#,
    );
    let data = &envelope["data"];
    assert_eq!(data["kind"], "target");
    assert_eq!(data["summary"]["updated"], 1);
    assert_eq!(data["summary"]["skipped_empty"], 1);
    assert_eq!(data["summary"]["ignored"], 1);
    assert_eq!(data["summary"]["ignored_keys"][0], "ghost");
}

#[test]
fn unknown_locale_yields_error_envelope_and_nonzero_exit() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let db = tmp.path().join("catalog.db");
    init_project(&db, "zh-CN", "en-US");
    let pack = tmp.path().join("fr.json");
    std::fs::write(&pack, r#"{"a":"x"}"#).unwrap();

    let assert = bin_cmd()
        .args(["--no-color", "--db"])
        .arg(&db)
        .args(["import", "--project", "1", "--locale", "fr-FR", "--file"])
        .arg(&pack)
        .args(["--format", "json"])
        .assert()
        .failure();
    let envelope = last_json_line(&assert.get_output().stdout);
    assert_eq!(envelope["ok"], false);
    assert_eq!(envelope["error"]["kind"], "validation");
}

#[test]
fn import_without_project_fails() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let db = tmp.path().join("catalog.db");
    let pack = tmp.path().join("in.json");
    std::fs::write(&pack, r#"{"a":"x"}"#).unwrap();

    bin_cmd()
        .args(["--no-color", "--db"])
        .arg(&db)
        .args(["import", "--project", "7", "--locale", "zh-CN", "--file"])
        .arg(&pack)
        .assert()
        .failure();
}

#[test]
fn history_lists_uploads_newest_first() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let db = tmp.path().join("catalog.db");
    init_project(&db, "zh-CN", "en-US");
    import_file(&db, tmp.path(), "zh-CN", r#"{"a":"甲"}"#);
    import_file(&db, tmp.path(), "en-US", r#"{"a":"alpha"}"#);

    let assert = bin_cmd()
        .args(["--no-color", "--db"])
        .arg(&db)
        .args(["history", "--project", "1", "--format", "json"])
        .assert()
        .success();
    let envelope = last_json_line(&assert.get_output().stdout);
    assert_eq!(envelope["ok"], true);
    let uploads = envelope["data"].as_array().expect("upload array");
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0]["kind"], "target");
    assert_eq!(uploads[1]["kind"], "source");
}

#[test]
fn review_approves_a_translation() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let db = tmp.path().join("catalog.db");
    init_project(&db, "zh-CN", "en-US");
    import_file(&db, tmp.path(), "zh-CN", r#"{"a":"甲"}"#);
    import_file(&db, tmp.path(), "en-US", r#"{"a":"alpha"}"#);

    let assert = bin_cmd()
        .args(["--no-color", "--db"])
        .arg(&db)
        .args([
            "review", "--project", "1", "--key", "a", "--locale", "en-US", "--status",
            "approved", "--format", "json",
        ])
        .assert()
        .success();
    let envelope = last_json_line(&assert.get_output().stdout);
    assert_eq!(envelope["ok"], true);
    assert_eq!(envelope["data"]["status"], "approved");
}
