use std::time::Duration;

use crate::checks::{BUDGET_EXHAUSTED, CheckContext};
use crate::core::{CheckKind, CheckResult, Issue};
use crate::process;

/// Invoke the unused-export detector and parse its line-oriented output.
pub fn dead_code(ctx: &CheckContext) -> CheckResult {
    let cmd_timeout = ctx.command_timeout();
    if cmd_timeout == Duration::from_secs(0) {
        return CheckResult::unknown(CheckKind::DeadCode, BUDGET_EXHAUSTED);
    }

    let output = match process::run_command(
        "npx",
        &["ts-prune"],
        &ctx.project_root,
        cmd_timeout,
    ) {
        Ok(output) => output,
        Err(err) => return CheckResult::unknown(CheckKind::DeadCode, format!("ts-prune not run: {err}")),
    };

    CheckResult::from_issues(CheckKind::DeadCode, parse_output(&output.stdout))
}

/// Expected shape is `path:line - exportName`. Lines that don't match are
/// kept as best-effort partial entries rather than dropped silently.
fn parse_output(stdout: &str) -> Vec<Issue> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match split_line(line) {
            Some((file, line_no, export)) => {
                Issue::warning(CheckKind::DeadCode, format!("unused export `{export}`"))
                    .at(file, Some(line_no), None)
            }
            None => Issue::warning(CheckKind::DeadCode, line),
        })
        .collect()
}

fn split_line(line: &str) -> Option<(String, u32, String)> {
    let (location, export) = line.split_once(" - ")?;
    let export = export.trim();
    if export.is_empty() {
        return None;
    }
    let (file, line_no) = location.rsplit_once(':')?;
    let line_no = line_no.trim().parse::<u32>().ok()?;
    if file.trim().is_empty() {
        return None;
    }
    Some((file.trim().to_string(), line_no, export.to_string()))
}
