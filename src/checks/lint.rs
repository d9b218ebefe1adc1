use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;

use crate::checks::{BUDGET_EXHAUSTED, CheckContext};
use crate::core::{CheckKind, CheckResult, Issue, Severity};
use crate::process;

/// Rule-name substrings that route a lint finding into the complexity
/// sub-check.
const COMPLEXITY_RULES: &[&str] = &[
    "complexity",
    "max-depth",
    "max-lines",
    "max-lines-per-function",
    "max-nested-callbacks",
    "max-params",
];

#[derive(Debug, Clone)]
pub struct LintOutput {
    pub result: CheckResult,
    /// The full parsed list, uncapped, kept for the complexity derivation.
    pub all_issues: Vec<Issue>,
}

impl LintOutput {
    fn not_run(note: impl Into<String>) -> Self {
        Self {
            result: CheckResult::unknown(CheckKind::Lint, note),
            all_issues: Vec::new(),
        }
    }
}

/// Invoke the linter requesting JSON and decode by trial: the record-list
/// shape, then the object-keyed-by-path shape, then a textual fallback.
/// Never raises on malformed output.
pub fn lint(ctx: &CheckContext) -> LintOutput {
    let cmd_timeout = ctx.command_timeout();
    if cmd_timeout == Duration::from_secs(0) {
        return LintOutput::not_run(BUDGET_EXHAUSTED);
    }

    let output = match process::run_command(
        "npx",
        &["eslint", ".", "--format", "json"],
        &ctx.project_root,
        cmd_timeout,
    ) {
        Ok(output) => output,
        Err(err) => return LintOutput::not_run(format!("eslint not run: {err}")),
    };

    if output.exit_code == 0 {
        return LintOutput {
            result: CheckResult::passed(CheckKind::Lint),
            all_issues: Vec::new(),
        };
    }

    let payload = if output.stdout.trim().is_empty() {
        output.stderr.clone()
    } else {
        output.stdout.clone()
    };

    if payload.trim().is_empty() {
        // Fail closed: the linter reported failure but said nothing.
        return LintOutput {
            result: CheckResult::fail_closed(
                CheckKind::Lint,
                format!("eslint exited with code {} and empty output", output.exit_code),
            ),
            all_issues: Vec::new(),
        };
    }

    let (issues, note) = parse_lint_payload(&payload);
    let mut result = CheckResult::from_issues(CheckKind::Lint, issues.clone());
    if let Some(note) = note {
        result.notes.push(note);
    }
    LintOutput {
        result,
        all_issues: issues,
    }
}

/// Filter the lint runner's already-collected issues into the complexity
/// sub-check. Pure derivation; never triggers a second lint invocation.
pub fn complexity(lint_issues: &[Issue]) -> CheckResult {
    let issues: Vec<Issue> = lint_issues
        .iter()
        .filter(|issue| {
            issue
                .rule
                .as_deref()
                .is_some_and(|rule| COMPLEXITY_RULES.iter().any(|c| rule.contains(c)))
        })
        .map(|issue| {
            let mut issue = issue.clone();
            issue.check = CheckKind::Complexity;
            issue.severity = Severity::Warning;
            issue
        })
        .collect();
    CheckResult::from_issues(CheckKind::Complexity, issues)
}

fn parse_lint_payload(payload: &str) -> (Vec<Issue>, Option<String>) {
    if let Some(issues) = decode_record_list(payload) {
        return (issues, None);
    }
    if let Some(issues) = decode_path_object(payload) {
        return (issues, None);
    }
    (
        scan_text_lines(payload),
        Some("eslint JSON parse failed, fell back to text scan".to_string()),
    )
}

/// Modern shape: `[{filePath, messages: [...]}, ...]`.
#[derive(Debug, Deserialize)]
struct FileRecord {
    #[serde(rename = "filePath")]
    file_path: String,
    messages: Vec<LintMessage>,
}

/// `severity` is 2 for errors, 1 for warnings.
#[derive(Debug, Deserialize)]
struct LintMessage {
    #[serde(rename = "ruleId")]
    rule_id: Option<String>,
    severity: Option<u8>,
    message: String,
    line: Option<u32>,
    column: Option<u32>,
}

fn message_issue(file: &str, msg: LintMessage) -> Issue {
    let severity = match msg.severity {
        Some(2) => Severity::Error,
        Some(1) => Severity::Warning,
        _ => Severity::Warning,
    };
    let mut issue =
        Issue::new(CheckKind::Lint, severity, msg.message).at(file, msg.line, msg.column);
    if let Some(rule) = msg.rule_id {
        issue = issue.with_rule(rule);
    }
    issue
}

fn decode_record_list(payload: &str) -> Option<Vec<Issue>> {
    let records: Vec<FileRecord> = serde_json::from_str(payload).ok()?;
    let mut issues = Vec::new();
    for record in records {
        for msg in record.messages {
            issues.push(message_issue(&record.file_path, msg));
        }
    }
    Some(issues)
}

/// Historical shape: `{ "<path>": [ {message, ...}, ... ], ... }`.
fn decode_path_object(payload: &str) -> Option<Vec<Issue>> {
    let map: HashMap<String, Vec<LintMessage>> = serde_json::from_str(payload).ok()?;
    let mut files: Vec<(String, Vec<LintMessage>)> = map.into_iter().collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));
    let mut issues = Vec::new();
    for (file, messages) in files {
        for msg in messages {
            issues.push(message_issue(&file, msg));
        }
    }
    Some(issues)
}

/// Last resort: keep lines that carry an error/warning token.
fn scan_text_lines(payload: &str) -> Vec<Issue> {
    payload
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let lower = line.to_ascii_lowercase();
            if lower.contains("error") {
                Some(Issue::error(CheckKind::Lint, line))
            } else if lower.contains("warning") {
                Some(Issue::warning(CheckKind::Lint, line))
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CheckStatus;

    #[test]
    fn record_list_shape_counts_match_the_payload() {
        let payload = r#"[
            {"filePath": "app/a.ts", "messages": [
                {"ruleId": "no-unused-vars", "severity": 2, "message": "x is unused", "line": 1, "column": 7},
                {"ruleId": "complexity", "severity": 1, "message": "too complex", "line": 10, "column": 1}
            ]},
            {"filePath": "app/b.ts", "messages": []},
            {"filePath": "app/c.ts", "messages": [
                {"ruleId": null, "severity": 1, "message": "style", "line": 2, "column": 2}
            ]}
        ]"#;
        let (issues, note) = parse_lint_payload(payload);
        assert!(note.is_none());
        assert_eq!(issues.len(), 3);
        let result = CheckResult::from_issues(CheckKind::Lint, issues);
        assert_eq!(result.counts.errors, 1);
        assert_eq!(result.counts.warnings, 2);
    }

    #[test]
    fn path_object_shape_is_decoded_deterministically() {
        let payload = r#"{
            "app/b.ts": [{"severity": 1, "message": "w1"}],
            "app/a.ts": [{"severity": 2, "message": "e1"}, {"severity": 1, "message": "w2"}]
        }"#;
        let (issues, note) = parse_lint_payload(payload);
        assert!(note.is_none());
        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0].file.as_deref(), Some("app/a.ts"));
    }

    #[test]
    fn garbage_payload_falls_back_to_text_scan() {
        let payload = "app/a.ts:1:1 Error - something broke\nplain chatter\nWarning: style nit\n";
        let (issues, note) = parse_lint_payload(payload);
        assert!(note.is_some());
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[1].severity, Severity::Warning);
    }

    #[test]
    fn complexity_filters_by_rule_substring() {
        let lint_issues = vec![
            Issue::warning(CheckKind::Lint, "too complex").with_rule("complexity"),
            Issue::error(CheckKind::Lint, "too deep").with_rule("max-depth"),
            Issue::warning(CheckKind::Lint, "long fn").with_rule("max-lines-per-function"),
            Issue::warning(CheckKind::Lint, "unused").with_rule("no-unused-vars"),
            Issue::warning(CheckKind::Lint, "no rule id"),
        ];
        let result = complexity(&lint_issues);
        assert_eq!(result.counts.total(), 3);
        assert!(result.issues.iter().all(|i| i.check == CheckKind::Complexity));
        assert!(result.issues.iter().all(|i| i.severity == Severity::Warning));
    }

    #[test]
    fn complexity_of_no_lint_findings_passes() {
        let result = complexity(&[]);
        assert_eq!(result.status, CheckStatus::Pass);
    }
}
