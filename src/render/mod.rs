use std::fmt::Write as _;

use crate::core::{CheckKind, CheckResult, CheckStatus, HealthReport};

/// Example rows shown per section; counts always cover the full totals.
const MAX_SECTION_EXAMPLES: usize = 20;

fn status_upper(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Warn => "WARN",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Unknown => "UNKNOWN",
    }
}

/// Render the whole report as Markdown. Pure function of the report:
/// rendering the same report twice yields byte-identical output, and the
/// document is well-formed even when every check found nothing.
pub fn render_markdown(report: &HealthReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Code Health Report");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Tool version: {}", report.tool_version);
    let _ = writeln!(out, "- Generated: {}", report.generated_at);
    let _ = writeln!(out, "- Project: `{}`", report.project_root);

    render_summary(&mut out, report);

    render_check_section(&mut out, report, CheckKind::Types, "Type Check");
    render_check_section(&mut out, report, CheckKind::Lint, "Lint");
    render_code_quality(&mut out, report);
    render_check_section(&mut out, report, CheckKind::DeadCode, "Dead Code");
    render_dependencies(&mut out, report);
    render_check_section(&mut out, report, CheckKind::Security, "Security");
    render_tests(&mut out, report);
    render_plans(&mut out, report);

    let _ = writeln!(out);
    let _ = writeln!(out, "---");
    let _ = writeln!(out);
    let _ = writeln!(out, "*Generated by webdoctor {} at {}*", report.tool_version, report.generated_at);

    out
}

fn render_summary(out: &mut String, report: &HealthReport) {
    let summary = &report.summary;
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "## Overall Status: {}",
        summary.overall_status.as_str().to_ascii_uppercase()
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "- Issues found: {}", summary.issues_found);
    let _ = writeln!(out, "- Critical: {}", summary.critical_issues.len());
    let _ = writeln!(out, "- Warnings: {}", summary.warnings.len());

    if !summary.critical_issues.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "### Critical Issues");
        let _ = writeln!(out);
        for issue in &summary.critical_issues {
            let _ = writeln!(out, "- {issue}");
        }
    }
    if !summary.warnings.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "### Warnings");
        let _ = writeln!(out);
        for warning in &summary.warnings {
            let _ = writeln!(out, "- {warning}");
        }
    }
}

fn find(report: &HealthReport, kind: CheckKind) -> Option<&CheckResult> {
    report.results.iter().find(|r| r.kind == kind)
}

fn render_result_body(out: &mut String, result: &CheckResult) {
    let _ = writeln!(out);
    let _ = writeln!(out, "**Status**: {}", status_upper(result.status));
    let _ = writeln!(out);
    let _ = writeln!(out, "- Errors: {}", result.counts.errors);
    let _ = writeln!(out, "- Warnings: {}", result.counts.warnings);
    for note in &result.notes {
        let _ = writeln!(out, "- Note: {note}");
    }

    if result.issues.is_empty() {
        if result.counts.total() == 0 {
            let _ = writeln!(out);
            let _ = writeln!(out, "_No issues found._");
        }
        return;
    }

    let shown = result.issues.len().min(MAX_SECTION_EXAMPLES);
    let _ = writeln!(out);
    if result.counts.total() as usize > shown {
        let _ = writeln!(out, "Examples ({} of {}):", shown, result.counts.total());
    } else {
        let _ = writeln!(out, "Examples:");
    }
    let _ = writeln!(out);
    for issue in result.issues.iter().take(shown) {
        let _ = writeln!(out, "- `{}`", issue.display_line());
    }
}

fn render_check_section(out: &mut String, report: &HealthReport, kind: CheckKind, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "## {title}");
    match find(report, kind) {
        Some(result) => render_result_body(out, result),
        None => {
            let _ = writeln!(out);
            let _ = writeln!(out, "_Check did not run._");
        }
    }
}

fn render_code_quality(out: &mut String, report: &HealthReport) {
    let analysis = &report.analysis;
    let _ = writeln!(out);
    let _ = writeln!(out, "## Code Quality");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Files analyzed: {}", analysis.files_analyzed);
    let _ = writeln!(out, "- Average complexity: {}", analysis.average_complexity);
    let _ = writeln!(out, "- Large files (>50 KiB): {}", analysis.large_file_count);
    let _ = writeln!(
        out,
        "- Complex files (score >30): {}",
        analysis.complex_file_count
    );

    if !analysis.large_files.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "### Large Files");
        let _ = writeln!(out);
        for entry in &analysis.large_files {
            let _ = writeln!(
                out,
                "- `{}` ({})",
                entry.path,
                crate::ui::format_bytes(entry.size_bytes)
            );
        }
    }
    if !analysis.complex_files.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "### Complex Files");
        let _ = writeln!(out);
        for entry in &analysis.complex_files {
            let _ = writeln!(out, "- `{}` (score: {})", entry.path, entry.score);
        }
    }

    if let Some(result) = find(report, CheckKind::Files) {
        if !result.issues.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "### File Findings");
            let _ = writeln!(out);
            for issue in result.issues.iter().take(MAX_SECTION_EXAMPLES) {
                let _ = writeln!(out, "- `{}`", issue.display_line());
            }
        }
    }

    if let Some(result) = find(report, CheckKind::UnusedImports) {
        let _ = writeln!(out);
        let _ = writeln!(out, "### Unused Imports ({})", result.counts.total());
        if result.issues.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "_No issues found._");
        } else {
            let _ = writeln!(out);
            for issue in result.issues.iter().take(MAX_SECTION_EXAMPLES) {
                let _ = writeln!(out, "- `{}`", issue.display_line());
            }
        }
    }

    if let Some(result) = find(report, CheckKind::Complexity) {
        let _ = writeln!(out);
        let _ = writeln!(out, "### Complexity Findings ({})", result.counts.total());
        if result.issues.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "_No issues found._");
        } else {
            let _ = writeln!(out);
            for issue in result.issues.iter().take(MAX_SECTION_EXAMPLES) {
                let _ = writeln!(out, "- `{}`", issue.display_line());
            }
        }
    }
}

fn render_dependencies(out: &mut String, report: &HealthReport) {
    let deps = &report.dependencies;
    let _ = writeln!(out);
    let _ = writeln!(out, "## Dependencies");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Runtime dependencies: {}", deps.runtime_count);
    let _ = writeln!(out, "- Dev dependencies: {}", deps.dev_count);
    let _ = writeln!(out, "- Outdated: {}", deps.outdated.len());
    let _ = writeln!(out, "- Vulnerabilities: {}", deps.vulnerabilities.len());

    if let Some(result) = find(report, CheckKind::Dependencies) {
        for note in &result.notes {
            let _ = writeln!(out, "- Note: {note}");
        }
    }

    if !deps.vulnerabilities.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "### Vulnerabilities");
        let _ = writeln!(out);
        for vuln in deps.vulnerabilities.iter().take(MAX_SECTION_EXAMPLES) {
            match &vuln.title {
                Some(title) => {
                    let _ = writeln!(out, "- **{}** ({}): {title}", vuln.id, vuln.severity);
                }
                None => {
                    let _ = writeln!(out, "- **{}** ({})", vuln.id, vuln.severity);
                }
            }
        }
    }
    if !deps.outdated.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "### Outdated Packages");
        let _ = writeln!(out);
        for name in deps.outdated.iter().take(MAX_SECTION_EXAMPLES) {
            let _ = writeln!(out, "- `{name}`");
        }
    }

    if let Some(result) = find(report, CheckKind::DependencyUsage) {
        let _ = writeln!(out);
        let _ = writeln!(out, "### Dependency Usage ({})", result.counts.total());
        if result.issues.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "_No issues found._");
        } else {
            let _ = writeln!(out);
            for issue in result.issues.iter().take(MAX_SECTION_EXAMPLES) {
                let _ = writeln!(out, "- `{}`", issue.display_line());
            }
        }
    }
}

fn render_tests(out: &mut String, report: &HealthReport) {
    let testing = &report.testing;
    let _ = writeln!(out);
    let _ = writeln!(out, "## Tests");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Test files: {}", testing.test_files.len());
    let _ = writeln!(out, "- Run status: {}", status_upper(testing.run_status));
    if let Some(result) = find(report, CheckKind::Tests) {
        for note in &result.notes {
            let _ = writeln!(out, "- Note: {note}");
        }
    }
    if !testing.test_files.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "### Test Files");
        let _ = writeln!(out);
        for file in testing.test_files.iter().take(MAX_SECTION_EXAMPLES) {
            let _ = writeln!(out, "- `{file}`");
        }
    }
}

fn render_plans(out: &mut String, report: &HealthReport) {
    let _ = writeln!(out);
    let _ = writeln!(out, "## Remediation Plan");
    if report.plans.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "_Nothing to do — no findings needed remediation._");
        return;
    }

    for plan in &report.plans {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "### [{}] {} ({} items, ~{} min)",
            plan.priority, plan.title, plan.affected, plan.estimate_minutes
        );
        let _ = writeln!(out);
        for (idx, step) in plan.steps.iter().enumerate() {
            let _ = writeln!(out, "{}. {step}", idx + 1);
        }
        if !plan.examples.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Examples:");
            let _ = writeln!(out);
            for example in &plan.examples {
                let _ = writeln!(out, "- `{example}`");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        AnalysisSummary, CheckResult, DependencyOverview, Issue, Summary, TestingOverview,
        derive_plans,
    };

    fn empty_report() -> HealthReport {
        let results = vec![
            CheckResult::passed(CheckKind::Types),
            CheckResult::passed(CheckKind::UnusedImports),
            CheckResult::passed(CheckKind::Lint),
            CheckResult::passed(CheckKind::Complexity),
            CheckResult::passed(CheckKind::DeadCode),
            CheckResult::passed(CheckKind::DependencyUsage),
            CheckResult::passed(CheckKind::Dependencies),
            CheckResult::passed(CheckKind::Files),
            CheckResult::passed(CheckKind::Security),
            CheckResult::passed(CheckKind::Tests),
        ];
        HealthReport {
            schema_version: "1.0".to_string(),
            tool_version: "0.1.0".to_string(),
            generated_at: "2026-01-01T00:00:00Z".to_string(),
            project_root: "/tmp/project".to_string(),
            summary: Summary::fold(&results),
            plans: derive_plans(&results),
            results,
            analysis: AnalysisSummary::default(),
            dependencies: DependencyOverview::default(),
            testing: TestingOverview::default(),
        }
    }

    #[test]
    fn rendering_is_idempotent() {
        let report = empty_report();
        let first = render_markdown(&report);
        let second = render_markdown(&report);
        assert_eq!(first, second);
    }

    #[test]
    fn zero_findings_render_no_issue_leaves() {
        let markdown = render_markdown(&empty_report());
        assert!(markdown.contains("## Overall Status: PASS"));
        assert!(markdown.contains("_No issues found._"));
        assert!(markdown.contains("_Nothing to do — no findings needed remediation._"));
        assert!(!markdown.contains("### Critical Issues"));
    }

    #[test]
    fn failing_report_renders_criticals_and_plan() {
        let mut report = empty_report();
        report.results[0] = CheckResult::from_issues(
            CheckKind::Types,
            vec![
                Issue::error(CheckKind::Types, "Cannot find name 'x'.").at(
                    "app/page.tsx",
                    Some(3),
                    Some(1),
                ),
            ],
        );
        report.summary = Summary::fold(&report.results);
        report.plans = derive_plans(&report.results);

        let markdown = render_markdown(&report);
        assert!(markdown.contains("## Overall Status: FAIL"));
        assert!(markdown.contains("- TypeScript: 1"));
        assert!(markdown.contains("`app/page.tsx:3 - Cannot find name 'x'.`"));
        assert!(markdown.contains("### [P0] Fix TypeScript compile errors (1 items, ~10 min)"));
    }

    #[test]
    fn example_lists_are_capped_at_twenty() {
        let mut report = empty_report();
        report.results[2] = CheckResult::from_issues(
            CheckKind::Lint,
            (0..60)
                .map(|i| Issue::warning(CheckKind::Lint, format!("finding {i}")))
                .collect(),
        );
        report.summary = Summary::fold(&report.results);

        let markdown = render_markdown(&report);
        assert!(markdown.contains("Examples (20 of 60):"));
        assert!(markdown.contains("- `finding 19`"));
        assert!(!markdown.contains("- `finding 20`"));
    }
}
