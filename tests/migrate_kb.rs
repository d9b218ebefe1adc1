use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU64, Ordering};

fn webdoctor_cmd(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_webdoctor"));
    cmd.arg("--root");
    cmd.arg(root);
    cmd.env_remove("WEBDOCTOR_CONFIG");
    cmd.env_remove("WEBDOCTOR_UI_COLOR");
    cmd.env_remove("WEBDOCTOR_UI_MAX_TABLE_ROWS");
    cmd.env_remove("WEBDOCTOR_CHECK_SOURCE_DIRS");
    cmd.env_remove("WEBDOCTOR_CHECK_EXCLUDE");
    cmd.env_remove("WEBDOCTOR_CHECK_REPORT_FILE");
    cmd.env_remove("WEBDOCTOR_REPORT_MAX_STDOUT_LINES");
    cmd.env_remove("WEBDOCTOR_MIGRATE_SOURCE_DIR");
    cmd
}

fn run(root: &Path, args: &[&str]) -> Output {
    webdoctor_cmd(root).args(args).output().expect("run webdoctor")
}

fn make_temp_root() -> PathBuf {
    static ROOT_SEQ: AtomicU64 = AtomicU64::new(0);
    let seq = ROOT_SEQ.fetch_add(1, Ordering::Relaxed);
    let root = std::env::temp_dir().join(format!(
        "webdoctor-migrate-test-{}-{seq}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&root);
    std::fs::create_dir_all(&root).expect("create root");
    root
}

fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdirs");
    }
    std::fs::write(path, bytes).expect("write");
}

fn seed_source(root: &Path) {
    write_file(
        &root.join("kb/registry.json"),
        br#"{"companies": {"a": {"id": "acme"}, "b": {"id": "globex"}}}"#,
    );
    write_file(&root.join("kb/acme/knowledge/faq.json"), br#"{"q": []}"#);
    write_file(
        &root.join("kb/acme/knowledge/products.json"),
        br#"{"items": [1, 2]}"#,
    );
    write_file(&root.join("kb/globex/knowledge/faq.json"), br#"{"q": []}"#);
}

#[test]
fn migrate_copies_validates_and_writes_manifests() {
    let root = make_temp_root();
    seed_source(&root);

    let out = run(&root, &["migrate", "--source", "kb"]);
    assert!(
        out.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );

    for mirror in ["projects", "public/projects"] {
        assert!(root.join(mirror).join("acme/knowledge/faq.json").exists());
        assert!(
            root.join(mirror)
                .join("acme/knowledge/products.json")
                .exists()
        );
        assert!(root.join(mirror).join("globex/knowledge/faq.json").exists());
        assert!(
            root.join(mirror)
                .join("acme/knowledge/_manifest.json")
                .exists()
        );
    }

    let manifest: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(root.join("projects/acme/knowledge/_manifest.json"))
            .expect("read manifest"),
    )
    .expect("parse manifest");
    assert_eq!(manifest["version"], "1.0.0");
    assert_eq!(
        manifest["files"],
        serde_json::json!(["faq.json", "products.json"])
    );

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn rerun_backs_up_the_existing_target() {
    let root = make_temp_root();
    seed_source(&root);

    let first = run(&root, &["migrate", "--source", "kb"]);
    assert!(first.status.success());

    let second = run(&root, &["migrate", "--source", "kb", "--json"]);
    assert!(second.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&second.stdout).expect("stdout is JSON");
    let backup = report["backup_path"].as_str().expect("backup path");
    assert!(PathBuf::from(backup).join("acme/knowledge/faq.json").exists());

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn invalid_json_is_reported_and_fails_the_run() {
    let root = make_temp_root();
    seed_source(&root);
    write_file(&root.join("kb/acme/knowledge/broken.json"), b"{not json");

    let out = run(&root, &["migrate", "--source", "kb", "--json"]);
    assert_eq!(out.status.code(), Some(30));

    let report: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("stdout is JSON");
    assert_eq!(report["total_errors"], 1);
    // Valid files still landed.
    assert!(root.join("projects/acme/knowledge/faq.json").exists());
    let acme = report["projects"]
        .as_array()
        .expect("projects")
        .iter()
        .find(|p| p["project"] == "acme")
        .expect("acme entry");
    assert!(
        acme["errors"][0]
            .as_str()
            .expect("error string")
            .starts_with("broken.json:")
    );

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn directory_scan_is_the_registry_fallback() {
    let root = make_temp_root();
    // No registry.json at all.
    write_file(&root.join("kb/acme/knowledge/faq.json"), br#"{"q": []}"#);
    std::fs::create_dir_all(root.join("kb/templates/knowledge")).expect("mkdirs");

    let out = run(&root, &["migrate", "--source", "kb", "--json"]);
    assert!(
        out.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).expect("stdout is JSON");
    let projects = report["projects"].as_array().expect("projects");
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["project"], "acme");

    let _ = std::fs::remove_dir_all(&root);
}
