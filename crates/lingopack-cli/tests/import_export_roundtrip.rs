mod helpers;

use assert_cmd::prelude::*;
use helpers::{bin_cmd, import_file, init_project, last_json_line};

#[test]
fn tree_pack_survives_an_import_export_cycle() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let db = tmp.path().join("catalog.db");
    init_project(&db, "zh-CN", "en-US");
    import_file(
        &db,
        tmp.path(),
        "zh-CN",
        r#"{"menu":{"save":"保存","exit":"退出"},"title":"标题"}"#,
    );
    import_file(&db, tmp.path(), "en-US", r#"{"menu":{"save":"Save"}}"#);

    let out = tmp.path().join("en-US.json");
    let assert = bin_cmd()
        .args(["--no-color", "--db"])
        .arg(&db)
        .args(["export", "--project", "1", "--locale", "en-US", "--fill", "fallback", "--out"])
        .arg(&out)
        .args(["--format", "json"])
        .assert()
        .success();
    let envelope = last_json_line(&assert.get_output().stdout);
    assert_eq!(envelope["ok"], true);
    assert_eq!(envelope["data"]["file_name"], "project-1.en-US.json");

    let content = std::fs::read_to_string(&out).expect("exported pack");
    let pack: serde_json::Value = serde_json::from_str(&content).expect("valid json");
    assert_eq!(pack["menu"]["save"], "Save");
    // untranslated keys fall back to the source text
    assert_eq!(pack["menu"]["exit"], "退出");
    assert_eq!(pack["title"], "标题");
}

#[test]
fn bundle_export_writes_a_zip_with_every_locale() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let db = tmp.path().join("catalog.db");
    init_project(&db, "zh-CN", "en-US");
    import_file(&db, tmp.path(), "zh-CN", r#"{"a":"甲"}"#);

    let out = tmp.path().join("packs.zip");
    bin_cmd()
        .args(["--no-color", "--db"])
        .arg(&db)
        .args(["export-bundle", "--project", "1", "--out"])
        .arg(&out)
        .assert()
        .success();

    let bytes = std::fs::read(&out).expect("bundle written");
    // zip local-file-header magic
    assert_eq!(&bytes[..4], b"PK\x03\x04");
}

#[test]
fn strict_project_blocks_unapproved_target_export() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let db = tmp.path().join("catalog.db");
    bin_cmd()
        .args(["--db"])
        .arg(&db)
        .args([
            "init-project", "--project", "1", "--source", "zh-CN", "--targets", "en-US",
            "--strict",
        ])
        .assert()
        .success();
    import_file(&db, tmp.path(), "zh-CN", r#"{"a":"甲"}"#);
    import_file(&db, tmp.path(), "en-US", r#"{"a":"alpha"}"#);

    let out = tmp.path().join("en-US.json");
    let assert = bin_cmd()
        .args(["--no-color", "--db"])
        .arg(&db)
        .args(["export", "--project", "1", "--locale", "en-US", "--out"])
        .arg(&out)
        .args(["--format", "json"])
        .assert()
        .failure();
    let envelope = last_json_line(&assert.get_output().stdout);
    assert_eq!(envelope["ok"], false);
    assert_eq!(envelope["error"]["kind"], "quality_gate");
    assert!(!out.exists());
}
