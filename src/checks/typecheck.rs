use std::time::Duration;

use crate::checks::{BUDGET_EXHAUSTED, CheckContext};
use crate::core::{CheckKind, CheckResult, Issue, Severity};
use crate::process;

#[derive(Debug, Clone)]
pub struct TypeCheckOutput {
    pub result: CheckResult,
    /// Raw compiler output kept for the unused-imports derivation.
    pub raw: String,
}

impl TypeCheckOutput {
    fn not_run(note: impl Into<String>) -> Self {
        Self {
            result: CheckResult::unknown(CheckKind::Types, note),
            raw: String::new(),
        }
    }
}

/// Invoke the compiler in no-emit mode and classify its diagnostics.
/// A failed or timed-out invocation downgrades to `unknown`; it never
/// aborts the pipeline.
pub fn type_check(ctx: &CheckContext) -> TypeCheckOutput {
    let cmd_timeout = ctx.command_timeout();
    if cmd_timeout == Duration::from_secs(0) {
        return TypeCheckOutput::not_run(BUDGET_EXHAUSTED);
    }

    let output = match process::run_command(
        "npx",
        &["tsc", "--noEmit", "--pretty", "false"],
        &ctx.project_root,
        cmd_timeout,
    ) {
        Ok(output) => output,
        Err(err) => return TypeCheckOutput::not_run(format!("tsc not run: {err}")),
    };

    let raw = format!("{}{}", output.stderr, output.stdout);
    if output.exit_code == 0 {
        return TypeCheckOutput {
            result: CheckResult::passed(CheckKind::Types),
            raw,
        };
    }

    let mut issues = Vec::new();
    for line in raw.lines() {
        if line.contains("error TS") {
            issues.push(diagnostic_issue(line, Severity::Error));
        } else if line.contains("warning TS") {
            issues.push(diagnostic_issue(line, Severity::Warning));
        }
    }

    if issues.is_empty() {
        // Non-zero exit with nothing classifiable: one unclassified error.
        issues.push(Issue::error(
            CheckKind::Types,
            format!(
                "type checker exited with code {} and produced no diagnostics",
                output.exit_code
            ),
        ));
    }

    TypeCheckOutput {
        result: CheckResult::from_issues(CheckKind::Types, issues),
        raw,
    }
}

/// Derive the unused-imports check from the compiler's already-collected
/// output. Pure; never re-invokes the compiler.
pub fn unused_imports(raw: &str) -> CheckResult {
    let issues: Vec<Issue> = raw
        .lines()
        .filter(|line| {
            line.contains("is declared but its value is never read")
                || line.contains("is declared but never used")
        })
        .map(|line| {
            let mut issue = diagnostic_issue(line, Severity::Warning);
            issue.check = CheckKind::UnusedImports;
            issue
        })
        .collect();
    CheckResult::from_issues(CheckKind::UnusedImports, issues)
}

/// Parse one `path(line,col): level TSnnnn: message` diagnostic. Lines
/// that don't match the location prefix keep the whole line as message.
fn diagnostic_issue(line: &str, severity: Severity) -> Issue {
    let line = line.trim();
    if let Some((file, rest_line, col, message, code)) = split_diagnostic(line) {
        return Issue::new(CheckKind::Types, severity, message)
            .at(file, Some(rest_line), col)
            .with_rule(code);
    }
    Issue::new(CheckKind::Types, severity, line)
}

fn split_diagnostic(line: &str) -> Option<(String, u32, Option<u32>, String, String)> {
    let open = line.find('(')?;
    let close = line[open..].find(')')? + open;
    let file = line[..open].to_string();
    if file.is_empty() || file.contains(' ') {
        return None;
    }

    let loc = &line[open + 1..close];
    let mut parts = loc.split(',');
    let row = parts.next()?.trim().parse::<u32>().ok()?;
    let col = parts.next().and_then(|c| c.trim().parse::<u32>().ok());

    let rest = line[close + 1..].trim_start_matches(':').trim();
    let code_start = rest.find("TS")?;
    let after = &rest[code_start..];
    let code: String = after
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    let message = after[code.len()..].trim_start_matches(':').trim().to_string();
    if message.is_empty() {
        return None;
    }
    Some((file, row, col, message, code))
}
