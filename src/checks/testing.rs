use std::path::Path;
use std::time::Duration;

use globset::{Glob, GlobSetBuilder};
use walkdir::WalkDir;

use crate::checks::{BUDGET_EXHAUSTED, CheckContext};
use crate::core::{CheckKind, CheckResult, CheckStatus, Issue, TestingOverview};
use crate::process;

/// Directories searched for test files, relative to the project root.
const TEST_DIRS: &[&str] = &["tests", "lib/__tests__", "src/__tests__"];

/// Naming conventions that mark a file as a test anywhere in the tree.
const TEST_GLOBS: &[&str] = &[
    "**/*.test.ts",
    "**/*.test.tsx",
    "**/*.spec.ts",
    "**/*.spec.tsx",
];

#[derive(Debug, Clone)]
pub struct TestingOutput {
    pub result: CheckResult,
    pub overview: TestingOverview,
}

/// Discover test files by convention and optionally run the suite.
/// A suite that fails to execute records `unknown` and never aborts
/// report generation.
pub fn testing(ctx: &CheckContext, source_dirs: &[String]) -> TestingOutput {
    let test_files = discover_test_files(&ctx.project_root, source_dirs);

    let (run_status, note) = run_suite(ctx);

    let mut result = match run_status {
        CheckStatus::Fail => CheckResult::from_issues(
            CheckKind::Tests,
            vec![Issue::warning(CheckKind::Tests, "test suite failed")],
        ),
        _ => CheckResult::passed(CheckKind::Tests),
    };
    if run_status == CheckStatus::Unknown {
        result.status = CheckStatus::Unknown;
    }
    if let Some(note) = note {
        result.notes.push(note);
    }
    result
        .notes
        .push(format!("{} test files discovered", test_files.len()));

    TestingOutput {
        result,
        overview: TestingOverview {
            test_files,
            run_status,
        },
    }
}

fn run_suite(ctx: &CheckContext) -> (CheckStatus, Option<String>) {
    let cmd_timeout = ctx.command_timeout();
    if cmd_timeout == Duration::from_secs(0) {
        return (CheckStatus::Unknown, Some(BUDGET_EXHAUSTED.to_string()));
    }

    match process::run_command(
        "npm",
        &["test", "--", "--passWithNoTests"],
        &ctx.project_root,
        cmd_timeout,
    ) {
        Ok(output) if output.exit_code == 0 => (CheckStatus::Pass, None),
        Ok(output) => (
            CheckStatus::Fail,
            Some(format!("npm test exited with code {}", output.exit_code)),
        ),
        Err(err) => (CheckStatus::Unknown, Some(format!("npm test not run: {err}"))),
    }
}

/// Glob the fixed locations and conventions, then dedupe.
pub fn discover_test_files(project_root: &Path, source_dirs: &[String]) -> Vec<String> {
    let mut builder = GlobSetBuilder::new();
    for pat in TEST_GLOBS {
        if let Ok(glob) = Glob::new(pat) {
            builder.add(glob);
        }
    }
    let Ok(glob_set) = builder.build() else {
        return Vec::new();
    };

    let mut roots: Vec<String> = TEST_DIRS.iter().map(|d| (*d).to_string()).collect();
    roots.extend(source_dirs.iter().cloned());

    let mut files = Vec::new();
    for dir in &roots {
        let root = project_root.join(dir);
        if !root.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&root).follow_links(false).into_iter().flatten() {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let in_test_dir = TEST_DIRS.iter().any(|d| dir == d);
            if in_test_dir || glob_set.is_match(path) {
                let rel = path
                    .strip_prefix(project_root)
                    .unwrap_or(path)
                    .display()
                    .to_string();
                files.push(rel);
            }
        }
    }

    files.sort();
    files.dedup();
    files
}
