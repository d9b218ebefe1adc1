use anyhow::Error;
use std::io::{self, Write};
use unicode_width::UnicodeWidthChar;

use crate::core::{CheckResult, CheckStatus, HealthReport, OverallStatus};
use crate::migrate::MigrationReport;

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub color: bool,
    pub stdout_is_tty: bool,
    pub max_table_rows: usize,
    pub quiet: bool,
    pub verbose: bool,
}

pub fn eprintln_error(err: &Error) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "error:");
    let _ = writeln!(stderr, "  {err}");

    let mut causes = err.chain().skip(1).peekable();
    if causes.peek().is_some() {
        let _ = writeln!(stderr, "caused by:");
        for cause in causes {
            let _ = writeln!(stderr, "  - {cause}");
        }
    }

    let _ = writeln!(stderr, "next:");
    let _ = writeln!(stderr, "  - re-run with `--verbose` for more detail");
    let _ = writeln!(
        stderr,
        "  - see `webdoctor --help` for the available commands and options"
    );
}

/// Terminal summary printed after a check run: one table row per check,
/// then the critical/warning rollup.
pub fn print_check_summary(report: &HealthReport, cfg: &UiConfig) {
    if cfg.quiet {
        return;
    }

    let mut out = io::stdout().lock();
    let status = match report.summary.overall_status {
        OverallStatus::Pass => format_status(CheckStatus::Pass, cfg.color),
        OverallStatus::Fail => format_status(CheckStatus::Fail, cfg.color),
    };
    let _ = writeln!(
        out,
        "overall: {status}  issues={}  critical={}  warnings={}",
        report.summary.issues_found,
        report.summary.critical_issues.len(),
        report.summary.warnings.len()
    );

    let _ = writeln!(out);
    print_results_table(&mut out, &report.results, cfg);

    if !report.summary.critical_issues.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "critical:");
        for issue in &report.summary.critical_issues {
            let _ = writeln!(out, "- {issue}");
        }
    }
    if cfg.verbose && !report.summary.warnings.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "warnings:");
        for warning in &report.summary.warnings {
            let _ = writeln!(out, "- {warning}");
        }
    }
}

pub fn print_migration_summary(report: &MigrationReport, cfg: &UiConfig) {
    if cfg.quiet {
        return;
    }

    let mut out = io::stdout().lock();
    for note in &report.notes {
        let _ = writeln!(out, "note: {note}");
    }
    if let Some(backup) = &report.backup_path {
        let _ = writeln!(out, "backup: {backup}");
    }
    let _ = writeln!(
        out,
        "migrated: {} files across {} projects ({} errors)",
        report.total_copied,
        report.projects.len(),
        report.total_errors
    );

    for project in &report.projects {
        let marker = if project.errors.is_empty() { "ok" } else { "!!" };
        let _ = writeln!(
            out,
            "[{marker}] {}: {} files",
            project.project,
            project.copied.len()
        );
        if cfg.verbose {
            for file in &project.copied {
                let _ = writeln!(out, "  - {file}");
            }
        }
        for error in &project.errors {
            let _ = writeln!(out, "  - error: {error}");
        }
    }
}

fn print_results_table(out: &mut dyn Write, results: &[CheckResult], cfg: &UiConfig) {
    let label_check = "check";
    let label_status = "status";
    let label_errors = "errors";
    let label_warnings = "warnings";

    let rows = results.len().min(cfg.max_table_rows.max(1));

    let check_w = results
        .iter()
        .take(rows)
        .map(|r| visible_width_ansi(r.kind.label()))
        .max()
        .unwrap_or(0)
        .max(visible_width_ansi(label_check));
    let status_w = visible_width_ansi(label_status).max(7);
    let errors_w = visible_width_ansi(label_errors);
    let warnings_w = visible_width_ansi(label_warnings);

    let _ = writeln!(
        out,
        "{}  {}  {}  {}",
        pad_end_display(label_check, check_w),
        pad_end_display(label_status, status_w),
        pad_start_display(label_errors, errors_w),
        pad_start_display(label_warnings, warnings_w)
    );
    let _ = writeln!(
        out,
        "{}  {}  {}  {}",
        "-".repeat(check_w),
        "-".repeat(status_w),
        "-".repeat(errors_w),
        "-".repeat(warnings_w)
    );

    for result in results.iter().take(rows) {
        let _ = writeln!(
            out,
            "{}  {}  {}  {}",
            pad_end_display(result.kind.label(), check_w),
            pad_end_ansi(&format_status(result.status, cfg.color), status_w),
            pad_start_display(&result.counts.errors.to_string(), errors_w),
            pad_start_display(&result.counts.warnings.to_string(), warnings_w)
        );
    }
}

fn format_status(status: CheckStatus, color: bool) -> String {
    let s = status.as_str();
    if !color {
        return s.to_string();
    }

    let code = match status {
        CheckStatus::Pass => "32",
        CheckStatus::Warn => "33",
        CheckStatus::Fail => "31",
        CheckStatus::Unknown => "90",
    };
    format!("\x1b[{code}m{s}\x1b[0m")
}

fn pad_end_ansi(s: &str, width: usize) -> String {
    let w = visible_width_ansi(s);
    if w >= width {
        return s.to_string();
    }
    format!("{s}{}", " ".repeat(width - w))
}

fn pad_end_display(s: &str, width: usize) -> String {
    let w = visible_width_ansi(s);
    if w >= width {
        return s.to_string();
    }
    format!("{s}{}", " ".repeat(width - w))
}

fn pad_start_display(s: &str, width: usize) -> String {
    let w = visible_width_ansi(s);
    if w >= width {
        return s.to_string();
    }
    format!("{}{}", " ".repeat(width - w), s)
}

fn visible_width_ansi(s: &str) -> usize {
    let mut width: usize = 0;
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            let _ = chars.next();
            for ch2 in chars.by_ref() {
                if ch2 == 'm' {
                    break;
                }
            }
            continue;
        }
        width = width.saturating_add(UnicodeWidthChar::width(ch).unwrap_or(0));
    }
    width
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        return format!("{bytes} B");
    }
    if b < MB {
        return format!("{:.1} KiB", b / KB);
    }
    if b < GB {
        return format!("{:.1} MiB", b / MB);
    }
    format!("{:.1} GiB", b / GB)
}
