use std::path::{Path, PathBuf};
use std::process::Command;
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

fn make_temp_root() -> PathBuf {
    static ROOT_SEQ: AtomicU64 = AtomicU64::new(0);

    let seq = ROOT_SEQ.fetch_add(1, Ordering::Relaxed);
    let root = std::env::temp_dir().join(format!(
        "webdoctor-timeout-test-{}-{seq}",
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

fn write_fake_tool(bin_dir: &Path, name: &str, script: &str) {
    use std::os::unix::fs::PermissionsExt;

    let path = bin_dir.join(name);
    write_file(&path, script.as_bytes());
    let mut perms = std::fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod");
}

#[test]
fn timeout_is_shared_across_external_commands() {
    use std::time::{Duration, Instant};

    let root = make_temp_root();
    let bin_dir = root.join("fakebin");
    std::fs::create_dir_all(&bin_dir).expect("mkdir fakebin");
    write_file(
        &root.join("package.json"),
        br#"{"dependencies": {}, "devDependencies": {}}"#,
    );

    // Every external tool hangs far past the overall budget.
    write_fake_tool(&bin_dir, "npx", "#!/bin/sh\nsleep 30\nexit 0\n");
    write_fake_tool(&bin_dir, "npm", "#!/bin/sh\nsleep 30\nexit 0\n");

    let path = format!(
        "{}:{}",
        bin_dir.display(),
        std::env::var("PATH").unwrap_or_default()
    );

    let start = Instant::now();
    let out = {
        let mut cmd = webdoctor_cmd(&root);
        cmd.env("PATH", path);
        cmd.args(["--timeout", "2", "check", "--json"]);
        cmd.output().expect("run webdoctor")
    };
    let elapsed = start.elapsed();
    assert!(
        elapsed < Duration::from_secs(10),
        "check took too long: elapsed={elapsed:?}\nstderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert!(
        out.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );

    // Timed-out tools downgrade to unknown; the report still exists.
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).expect("stdout is JSON");
    let results = report["results"].as_array().expect("results");
    let types = results
        .iter()
        .find(|r| r["kind"] == "types")
        .expect("types result");
    assert_eq!(types["status"], "unknown");
    assert_eq!(report["summary"]["overall_status"], "pass");
    assert!(root.join("CODE_HEALTH_REPORT.md").exists());

    let _ = std::fs::remove_dir_all(&root);
}
