use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use walkdir::WalkDir;

use crate::core::{
    AnalysisSummary, CheckKind, CheckResult, FileMetrics, FileScoreEntry, FileSizeEntry, Issue,
};

/// Extensions the analyzers treat as source files.
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

/// Flag thresholds. A file above `OVERSIZED_BYTES` is flagged outright;
/// the large/complex example lists use the lower listing thresholds.
const OVERSIZED_BYTES: u64 = 100 * 1024;
const LARGE_LIST_BYTES: u64 = 50 * 1024;
const COMPLEX_LIST_SCORE: u64 = 30;
const COMPLEX_ISSUE_SCORE: u64 = 50;
const DEEP_NESTING: u64 = 5;
const MAX_LISTED_FILES: usize = 10;

#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub result: CheckResult,
    pub summary: AnalysisSummary,
}

pub fn validate_excludes(excludes: &[String]) -> Result<()> {
    let _ = build_exclude_set(excludes)?;
    Ok(())
}

fn build_exclude_set(excludes: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in excludes {
        builder.add(Glob::new(pat).with_context(|| format!("invalid exclude glob: {pat}"))?);
    }
    Ok(builder.build()?)
}

/// Every source file under the configured project-relative directories,
/// excludes applied, sorted for deterministic downstream output. Walk
/// errors are counted, not fatal.
pub fn source_files(
    project_root: &Path,
    source_dirs: &[String],
    excludes: &[String],
) -> Result<(Vec<PathBuf>, u64)> {
    let exclude_set = build_exclude_set(excludes)?;
    let mut files = Vec::new();
    let mut errors: u64 = 0;

    for dir in source_dirs {
        let root = project_root.join(dir);
        if !root.is_dir() {
            continue;
        }
        let walker = WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !exclude_set.is_match(e.path()));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => {
                    errors = errors.saturating_add(1);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let ext = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("");
            if SOURCE_EXTENSIONS.contains(&ext) {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    files.dedup();
    Ok((files, errors))
}

/// Peak `{`/`}` nesting depth. The running depth is clamped at zero on
/// unmatched closers, so the result is the maximum prefix balance.
pub fn max_brace_depth(content: &str) -> u64 {
    let mut depth: u64 = 0;
    let mut max_depth: u64 = 0;
    for ch in content.chars() {
        match ch {
            '{' => {
                depth = depth.saturating_add(1);
                max_depth = max_depth.max(depth);
            }
            '}' => {
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
    }
    max_depth
}

/// Per-line textual classification plus declaration counting by pattern.
/// Deliberately shallow: this is an estimate, not a parser.
pub fn file_metrics(rel_path: &str, content: &str, size_bytes: u64) -> FileMetrics {
    let mut total_lines: u64 = 0;
    let mut code_lines: u64 = 0;
    let mut comment_lines: u64 = 0;
    let mut blank_lines: u64 = 0;

    for line in content.lines() {
        total_lines = total_lines.saturating_add(1);
        let trimmed = line.trim();
        if trimmed.is_empty() {
            blank_lines = blank_lines.saturating_add(1);
        } else if !trimmed.starts_with("//") && !trimmed.starts_with("/*") {
            code_lines = code_lines.saturating_add(1);
        }
        if line.contains("//") || line.contains("/*") || line.contains("*/") {
            comment_lines = comment_lines.saturating_add(1);
        }
    }

    let functions = count_matches(content, r"(?:function|const|let|var)\s+\w+\s*[=:]");
    let classes = count_matches(content, r"class\s+\w+");
    let imports = count_matches(content, r"(?m)^import\s");
    let exports = count_matches(content, r"(?m)^export\s");
    let max_nesting_depth = max_brace_depth(content);

    let complexity_score = functions
        .saturating_mul(2)
        .saturating_add(classes.saturating_mul(3))
        .saturating_add(max_nesting_depth.saturating_mul(2));

    FileMetrics {
        path: rel_path.to_string(),
        total_lines,
        code_lines,
        comment_lines,
        blank_lines,
        functions,
        classes,
        imports,
        exports,
        max_nesting_depth,
        size_bytes,
        complexity_score,
        oversized: size_bytes > OVERSIZED_BYTES,
    }
}

fn count_matches(content: &str, pattern: &str) -> u64 {
    match Regex::new(pattern) {
        Ok(re) => re.find_iter(content).count() as u64,
        Err(_) => 0,
    }
}

/// Walk the source tree and fold per-file metrics into the analysis
/// summary and a `CheckResult`. Unreadable files are skipped; the batch
/// always completes.
pub fn analyze_project(
    project_root: &Path,
    source_dirs: &[String],
    excludes: &[String],
) -> Result<AnalysisOutput> {
    let (files, walk_errors) = source_files(project_root, source_dirs, excludes)?;

    let mut metrics = Vec::new();
    let mut skipped: u64 = 0;
    for path in &files {
        let Ok(content) = std::fs::read_to_string(path) else {
            skipped = skipped.saturating_add(1);
            continue;
        };
        let size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let rel = path
            .strip_prefix(project_root)
            .unwrap_or(path)
            .display()
            .to_string();
        metrics.push(file_metrics(&rel, &content, size_bytes));
    }

    let mut issues = Vec::new();
    for m in &metrics {
        if m.complexity_score > COMPLEX_ISSUE_SCORE {
            issues.push(
                Issue::warning(
                    CheckKind::Files,
                    format!("high complexity (score {})", m.complexity_score),
                )
                .at(m.path.clone(), None, None),
            );
        }
        if m.max_nesting_depth > DEEP_NESTING {
            issues.push(
                Issue::warning(
                    CheckKind::Files,
                    format!("nesting too deep (depth {})", m.max_nesting_depth),
                )
                .at(m.path.clone(), None, None),
            );
        }
        if m.oversized {
            issues.push(
                Issue::warning(
                    CheckKind::Files,
                    format!("file too large ({})", crate::ui::format_bytes(m.size_bytes)),
                )
                .at(m.path.clone(), None, None),
            );
        }
    }

    let files_analyzed = metrics.len() as u64;
    let average_complexity = if metrics.is_empty() {
        0.0
    } else {
        let total: u64 = metrics.iter().map(|m| m.complexity_score).sum();
        round2(total as f64 / files_analyzed as f64)
    };

    let mut large: Vec<&FileMetrics> = metrics
        .iter()
        .filter(|m| m.size_bytes > LARGE_LIST_BYTES)
        .collect();
    large.sort_by_key(|m| std::cmp::Reverse(m.size_bytes));
    let mut complex: Vec<&FileMetrics> = metrics
        .iter()
        .filter(|m| m.complexity_score > COMPLEX_LIST_SCORE)
        .collect();
    complex.sort_by_key(|m| std::cmp::Reverse(m.complexity_score));

    let summary = AnalysisSummary {
        files_analyzed,
        skipped_files: skipped.saturating_add(walk_errors),
        average_complexity,
        large_file_count: large.len() as u64,
        complex_file_count: complex.len() as u64,
        large_files: large
            .iter()
            .take(MAX_LISTED_FILES)
            .map(|m| FileSizeEntry {
                path: m.path.clone(),
                size_bytes: m.size_bytes,
            })
            .collect(),
        complex_files: complex
            .iter()
            .take(MAX_LISTED_FILES)
            .map(|m| FileScoreEntry {
                path: m.path.clone(),
                score: m.complexity_score,
            })
            .collect(),
    };

    let mut result = CheckResult::from_issues(CheckKind::Files, issues);
    if summary.skipped_files > 0 {
        result
            .notes
            .push(format!("skipped {} unreadable entries", summary.skipped_files));
    }

    Ok(AnalysisOutput { result, summary })
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
