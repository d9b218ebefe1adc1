use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::checks::{BUDGET_EXHAUSTED, CheckContext};
use crate::core::{CheckKind, CheckResult, DependencyOverview, Issue, Vulnerability};
use crate::process;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManifestCounts {
    pub runtime: u64,
    pub dev: u64,
}

/// Read the package manifest. A missing or unreadable manifest is fatal
/// for the dependency checks only; the caller downgrades both of them and
/// the pipeline continues.
pub fn read_manifest_counts(project_root: &Path) -> Result<ManifestCounts> {
    #[derive(Debug, Deserialize)]
    struct Manifest {
        #[serde(default)]
        dependencies: HashMap<String, Value>,
        #[serde(rename = "devDependencies", default)]
        dev_dependencies: HashMap<String, Value>,
    }

    let path = project_root.join("package.json");
    let s = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read manifest: {}", path.display()))?;
    let manifest: Manifest = serde_json::from_str(&s)
        .with_context(|| format!("failed to parse manifest: {}", path.display()))?;
    Ok(ManifestCounts {
        runtime: manifest.dependencies.len() as u64,
        dev: manifest.dev_dependencies.len() as u64,
    })
}

/// Invoke the unused/missing-dependency detector requesting JSON. Stricter
/// than the lint runner: this tool's JSON is reliable, so any parse failure
/// reports zero findings instead of guessing from free text.
pub fn dependency_usage(ctx: &CheckContext) -> CheckResult {
    let cmd_timeout = ctx.command_timeout();
    if cmd_timeout == Duration::from_secs(0) {
        return CheckResult::unknown(CheckKind::DependencyUsage, BUDGET_EXHAUSTED);
    }

    let output = match process::run_command(
        "npx",
        &["depcheck", "--json"],
        &ctx.project_root,
        cmd_timeout,
    ) {
        Ok(output) => output,
        Err(err) => {
            return CheckResult::unknown(
                CheckKind::DependencyUsage,
                format!("depcheck not run: {err}"),
            );
        }
    };

    match parse_depcheck(&output.stdout) {
        Some(issues) => CheckResult::from_issues(CheckKind::DependencyUsage, issues),
        None => CheckResult::passed(CheckKind::DependencyUsage)
            .with_note("depcheck output was not valid JSON, reporting no findings"),
    }
}

fn parse_depcheck(stdout: &str) -> Option<Vec<Issue>> {
    #[derive(Debug, Deserialize)]
    struct Depcheck {
        #[serde(default)]
        dependencies: Vec<String>,
        #[serde(rename = "devDependencies", default)]
        dev_dependencies: Vec<String>,
        #[serde(default)]
        missing: HashMap<String, Vec<String>>,
    }

    let parsed: Depcheck = serde_json::from_str(stdout.trim()).ok()?;
    let mut issues = Vec::new();
    for name in parsed.dependencies {
        issues.push(Issue::warning(
            CheckKind::DependencyUsage,
            format!("unused dependency `{name}`"),
        ));
    }
    for name in parsed.dev_dependencies {
        issues.push(Issue::warning(
            CheckKind::DependencyUsage,
            format!("unused devDependency `{name}`"),
        ));
    }
    let mut missing: Vec<(String, Vec<String>)> = parsed.missing.into_iter().collect();
    missing.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, users) in missing {
        let mut issue = Issue::warning(
            CheckKind::DependencyUsage,
            format!("missing dependency `{name}` (used in {} files)", users.len()),
        );
        if let Some(first) = users.first() {
            issue = issue.at(first.clone(), None, None);
        }
        issues.push(issue);
    }
    Some(issues)
}

#[derive(Debug, Clone)]
pub struct DependenciesOutput {
    pub result: CheckResult,
    pub overview: DependencyOverview,
}

/// The manifest-level check: declared counts plus the optional outdated
/// and audit queries. Both queries tolerate empty or non-JSON output.
pub fn dependencies(ctx: &CheckContext, counts: ManifestCounts) -> DependenciesOutput {
    let mut overview = DependencyOverview {
        runtime_count: counts.runtime,
        dev_count: counts.dev,
        outdated: Vec::new(),
        vulnerabilities: Vec::new(),
    };
    let mut notes = Vec::new();

    let cmd_timeout = ctx.command_timeout();
    if cmd_timeout == Duration::from_secs(0) {
        let mut result = CheckResult::unknown(CheckKind::Dependencies, BUDGET_EXHAUSTED);
        result.notes.extend(notes);
        return DependenciesOutput { result, overview };
    }

    match process::run_command(
        "npm",
        &["outdated", "--json"],
        &ctx.project_root,
        cmd_timeout,
    ) {
        // npm outdated exits non-zero when anything is outdated, so the
        // payload is parsed regardless of the exit code.
        Ok(output) => {
            overview.outdated = parse_outdated(&output.stdout);
        }
        Err(err) => notes.push(format!("npm outdated not run: {err}")),
    }

    let cmd_timeout = ctx.command_timeout();
    if cmd_timeout > Duration::from_secs(0) {
        match process::run_command("npm", &["audit", "--json"], &ctx.project_root, cmd_timeout) {
            Ok(output) => {
                overview.vulnerabilities = parse_audit(&output.stdout);
            }
            Err(err) => notes.push(format!("npm audit not run: {err}")),
        }
    } else {
        notes.push(format!("npm audit {BUDGET_EXHAUSTED}"));
    }

    let mut issues = Vec::new();
    for name in &overview.outdated {
        issues.push(Issue::warning(
            CheckKind::Dependencies,
            format!("outdated dependency `{name}`"),
        ));
    }
    for vuln in &overview.vulnerabilities {
        let mut message = format!(
            "vulnerable dependency `{}` ({} severity)",
            vuln.id, vuln.severity
        );
        if let Some(title) = &vuln.title {
            message.push_str(&format!(": {title}"));
        }
        issues.push(Issue::warning(CheckKind::Dependencies, message));
    }

    let mut result = CheckResult::from_issues(CheckKind::Dependencies, issues);
    result.notes.extend(notes);
    DependenciesOutput { result, overview }
}

fn parse_outdated(stdout: &str) -> Vec<String> {
    let Ok(map) = serde_json::from_str::<HashMap<String, Value>>(stdout.trim()) else {
        return Vec::new();
    };
    let mut names: Vec<String> = map.into_keys().collect();
    names.sort();
    names
}

fn parse_audit(stdout: &str) -> Vec<Vulnerability> {
    let Ok(root) = serde_json::from_str::<Value>(stdout.trim()) else {
        return Vec::new();
    };
    let Some(map) = root.get("vulnerabilities").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut vulnerabilities = Vec::new();
    for (name, entry) in map {
        let Some(severity) = entry.get("severity").and_then(Value::as_str) else {
            continue;
        };
        let title = entry
            .get("via")
            .and_then(Value::as_array)
            .and_then(|via| {
                via.iter()
                    .find_map(|v| v.get("title").and_then(Value::as_str))
            })
            .map(str::to_string);
        vulnerabilities.push(Vulnerability {
            id: name.clone(),
            severity: severity.to_string(),
            title,
        });
    }
    vulnerabilities.sort_by(|a, b| a.id.cmp(&b.id));
    vulnerabilities
}
