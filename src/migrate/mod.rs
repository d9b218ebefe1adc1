use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::config::MigrateConfig;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectMigration {
    pub project: String,
    pub copied: Vec<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<String>,
    pub projects: Vec<ProjectMigration>,
    pub total_copied: u64,
    pub total_errors: u64,
    pub notes: Vec<String>,
}

/// One-shot knowledge-base migration: back up the existing target tree,
/// copy every project's `knowledge/*.json` into the target and public
/// mirrors, validate each copy parses as JSON, and write a `_manifest.json`
/// per project. Per-file failures are recorded, never fatal; only a
/// missing source tree aborts.
pub fn run(project_root: &Path, cfg: &MigrateConfig) -> Result<MigrationReport> {
    let source = resolve(project_root, &cfg.source_dir);
    let target = resolve(project_root, &cfg.target_dir);
    let public = resolve(project_root, &cfg.public_dir);
    let backup_root = resolve(project_root, &cfg.backup_dir);

    if !source.is_dir() {
        return Err(crate::exit::migration_failed(format!(
            "source knowledge tree does not exist: {}",
            source.display()
        )));
    }

    let mut notes = Vec::new();
    let backup_path = match backup_existing(&target, &backup_root) {
        Ok(path) => path.map(|p| p.display().to_string()),
        Err(err) => {
            notes.push(format!("backup failed: {err:#}"));
            None
        }
    };

    let projects = match projects_from_registry(&source) {
        Some(projects) if !projects.is_empty() => projects,
        _ => {
            notes.push("registry.json missing or unreadable, scanning directories".to_string());
            scan_source_projects(&source)
        }
    };
    if projects.is_empty() {
        return Err(crate::exit::migration_failed(format!(
            "no projects found under {}",
            source.display()
        )));
    }

    let mut results = Vec::new();
    let mut total_copied: u64 = 0;
    let mut total_errors: u64 = 0;
    for project in projects {
        let mut result = migrate_project(&source, &target, &public, &project);
        if let Err(err) = write_manifests(&target, &public, &project) {
            result.errors.push(format!("manifest: {err:#}"));
        }
        total_copied = total_copied.saturating_add(result.copied.len() as u64);
        total_errors = total_errors.saturating_add(result.errors.len() as u64);
        results.push(result);
    }

    Ok(MigrationReport {
        backup_path,
        projects: results,
        total_copied,
        total_errors,
        notes,
    })
}

fn resolve(project_root: &Path, dir: &str) -> PathBuf {
    let path = PathBuf::from(dir);
    if path.is_absolute() {
        path
    } else {
        project_root.join(path)
    }
}

/// Copy the whole existing target tree aside before writing into it.
fn backup_existing(target: &Path, backup_root: &Path) -> Result<Option<PathBuf>> {
    if !target.exists() {
        return Ok(None);
    }

    let stamp = OffsetDateTime::now_utc()
        .format(format_description!(
            "[year][month][day]_[hour][minute][second]"
        ))
        .context("failed to format backup timestamp")?;
    let backup_path = backup_root.join(format!("knowledge_backup_{stamp}"));
    if backup_path.exists() {
        std::fs::remove_dir_all(&backup_path)
            .with_context(|| format!("failed to clear {}", backup_path.display()))?;
    }
    copy_dir_all(target, &backup_path)
        .with_context(|| format!("failed to back up {}", target.display()))?;
    Ok(Some(backup_path))
}

fn copy_dir_all(from: &Path, to: &Path) -> Result<()> {
    std::fs::create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let dest = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &dest)?;
        } else {
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

/// Project ids from the source registry; `None` means fall back to a
/// directory scan.
fn projects_from_registry(source: &Path) -> Option<Vec<String>> {
    #[derive(Debug, Deserialize)]
    struct Registry {
        #[serde(default)]
        companies: std::collections::HashMap<String, Company>,
    }

    #[derive(Debug, Deserialize)]
    struct Company {
        id: String,
    }

    let s = std::fs::read_to_string(source.join("registry.json")).ok()?;
    let registry: Registry = serde_json::from_str(&s).ok()?;
    let mut projects: Vec<String> = registry.companies.into_values().map(|c| c.id).collect();
    projects.sort();
    projects.dedup();
    Some(projects)
}

fn scan_source_projects(source: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(source) else {
        return Vec::new();
    };
    let mut projects: Vec<String> = entries
        .flatten()
        .filter(|e| e.path().join("knowledge").is_dir())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name != "templates" && name != "archived")
        .collect();
    projects.sort();
    projects
}

fn migrate_project(
    source: &Path,
    target: &Path,
    public: &Path,
    project: &str,
) -> ProjectMigration {
    let mut result = ProjectMigration {
        project: project.to_string(),
        copied: Vec::new(),
        errors: Vec::new(),
    };

    let source_kb = source.join(project).join("knowledge");
    if !source_kb.is_dir() {
        result
            .errors
            .push(format!("source knowledge dir missing: {}", source_kb.display()));
        return result;
    }

    let target_kb = target.join(project).join("knowledge");
    let public_kb = public.join(project).join("knowledge");
    for dir in [&target_kb, &public_kb] {
        if let Err(err) = std::fs::create_dir_all(dir) {
            result
                .errors
                .push(format!("failed to create {}: {err}", dir.display()));
            return result;
        }
    }

    for file in json_files(&source_kb) {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let copy = (|| -> Result<()> {
            std::fs::copy(&file, target_kb.join(&name))?;
            std::fs::copy(&file, public_kb.join(&name))?;
            Ok(())
        })();
        if let Err(err) = copy {
            result.errors.push(format!("{name}: {err}"));
            continue;
        }

        match validate_json(&target_kb.join(&name)) {
            Ok(()) => result.copied.push(name),
            Err(err) => result.errors.push(format!("{name}: {err}")),
        }
    }

    result
}

fn json_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "json"))
        .collect();
    files.sort();
    files
}

/// Copied files must parse; syntax errors are migration errors.
fn validate_json(path: &Path) -> Result<()> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str::<serde_json::Value>(&s)
        .with_context(|| "invalid JSON".to_string())?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct Manifest {
    version: String,
    last_updated: String,
    files: Vec<String>,
}

/// `_manifest.json` lists the project's knowledge files, excluding the
/// underscore-prefixed bookkeeping files, in both mirrors.
fn write_manifests(target: &Path, public: &Path, project: &str) -> Result<()> {
    let target_kb = target.join(project).join("knowledge");
    if !target_kb.is_dir() {
        return Ok(());
    }

    let files: Vec<String> = json_files(&target_kb)
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .filter(|name| !name.starts_with('_'))
        .collect();

    let last_updated = OffsetDateTime::now_utc()
        .format(format_description!("[year]-[month]-[day]"))
        .context("failed to format manifest date")?;
    let manifest = Manifest {
        version: "1.0.0".to_string(),
        last_updated,
        files,
    };
    let body = serde_json::to_string_pretty(&manifest)?;

    let manifest_path = target_kb.join("_manifest.json");
    std::fs::write(&manifest_path, &body)
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    let public_kb = public.join(project).join("knowledge");
    if public_kb.is_dir() {
        let public_manifest = public_kb.join("_manifest.json");
        std::fs::write(&public_manifest, &body)
            .with_context(|| format!("failed to write {}", public_manifest.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_temp_root(tag: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!(
            "webdoctor-migrate-{tag}-{}",
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

    #[test]
    fn registry_ids_win_over_directory_names() {
        let root = make_temp_root("registry");
        let source = root.join("kb");
        write_file(
            &source.join("registry.json"),
            br#"{"companies": {"a": {"id": "acme"}, "b": {"id": "globex"}}}"#,
        );
        std::fs::create_dir_all(source.join("other/knowledge")).expect("mkdirs");

        let projects = projects_from_registry(&source).expect("registry");
        assert_eq!(projects, vec!["acme".to_string(), "globex".to_string()]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn directory_scan_skips_templates_and_archived() {
        let root = make_temp_root("scan");
        let source = root.join("kb");
        for name in ["acme", "templates", "archived", "plain-dir"] {
            std::fs::create_dir_all(source.join(name).join("knowledge")).expect("mkdirs");
        }
        std::fs::create_dir_all(source.join("no-knowledge")).expect("mkdirs");

        let projects = scan_source_projects(&source);
        assert_eq!(projects, vec!["acme".to_string(), "plain-dir".to_string()]);

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn invalid_json_is_recorded_but_does_not_abort() {
        let root = make_temp_root("invalid");
        let source = root.join("kb");
        write_file(&source.join("acme/knowledge/good.json"), br#"{"ok": true}"#);
        write_file(&source.join("acme/knowledge/bad.json"), b"{not json");

        let result = migrate_project(&source, &root.join("projects"), &root.join("public"), "acme");
        assert_eq!(result.copied, vec!["good.json".to_string()]);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("bad.json:"));
        // The broken file was still copied; only validation flagged it.
        assert!(root.join("projects/acme/knowledge/bad.json").exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn manifest_excludes_underscore_files() {
        let root = make_temp_root("manifest");
        let target = root.join("projects");
        let public = root.join("public");
        write_file(&target.join("acme/knowledge/faq.json"), b"{}");
        write_file(&target.join("acme/knowledge/_manifest.json"), b"{}");
        std::fs::create_dir_all(public.join("acme/knowledge")).expect("mkdirs");

        write_manifests(&target, &public, "acme").expect("manifests");

        let body =
            std::fs::read_to_string(target.join("acme/knowledge/_manifest.json")).expect("read");
        let manifest: serde_json::Value = serde_json::from_str(&body).expect("parse");
        assert_eq!(manifest["version"], "1.0.0");
        assert_eq!(manifest["files"], serde_json::json!(["faq.json"]));
        assert!(public.join("acme/knowledge/_manifest.json").exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn full_run_backs_up_and_mirrors() {
        let root = make_temp_root("full");
        let cfg = MigrateConfig {
            source_dir: "kb".to_string(),
            target_dir: "projects".to_string(),
            public_dir: "public/projects".to_string(),
            backup_dir: "projects_backup".to_string(),
        };
        write_file(
            &root.join("kb/registry.json"),
            br#"{"companies": {"a": {"id": "acme"}}}"#,
        );
        write_file(&root.join("kb/acme/knowledge/faq.json"), br#"{"q": []}"#);
        // Pre-existing target content that must end up in the backup.
        write_file(&root.join("projects/acme/knowledge/old.json"), b"{}");

        let report = run(&root, &cfg).expect("run");
        assert_eq!(report.total_copied, 1);
        assert_eq!(report.total_errors, 0);
        assert!(report.backup_path.is_some());
        assert!(root.join("projects/acme/knowledge/faq.json").exists());
        assert!(root.join("public/projects/acme/knowledge/faq.json").exists());
        assert!(root.join("projects/acme/knowledge/_manifest.json").exists());

        let backup = PathBuf::from(report.backup_path.expect("backup path"));
        assert!(backup.join("acme/knowledge/old.json").exists());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_source_is_fatal() {
        let root = make_temp_root("missing");
        let cfg = MigrateConfig {
            source_dir: "nope".to_string(),
            target_dir: "projects".to_string(),
            public_dir: "public/projects".to_string(),
            backup_dir: "projects_backup".to_string(),
        };
        assert!(run(&root, &cfg).is_err());
        let _ = std::fs::remove_dir_all(&root);
    }
}
