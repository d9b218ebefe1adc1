use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{CheckKind, Issue, Severity};

/// Cap on stored example issues per check. Counts always reflect the
/// full total even when the stored list is truncated.
pub const MAX_ISSUES_PER_CHECK: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Unknown,
}

impl CheckStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckCounts {
    pub errors: u64,
    pub warnings: u64,
    pub infos: u64,
}

impl CheckCounts {
    pub fn total(self) -> u64 {
        self.errors
            .saturating_add(self.warnings)
            .saturating_add(self.infos)
    }

    /// Status derived solely from the counts.
    pub fn status(self) -> CheckStatus {
        if self.errors > 0 {
            CheckStatus::Fail
        } else if self.warnings > 0 {
            CheckStatus::Warn
        } else {
            CheckStatus::Pass
        }
    }
}

/// Per-check outcome. The stored issue list is bounded; `counts` covers
/// everything that was parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub kind: CheckKind,
    pub status: CheckStatus,
    pub counts: CheckCounts,
    pub issues: Vec<Issue>,
    pub notes: Vec<String>,
}

impl CheckResult {
    /// Normal constructor: counts the full issue list, derives the status
    /// from those counts, and truncates the stored examples.
    pub fn from_issues(kind: CheckKind, mut issues: Vec<Issue>) -> Self {
        let mut counts = CheckCounts::default();
        for issue in &issues {
            match issue.severity {
                Severity::Error => counts.errors = counts.errors.saturating_add(1),
                Severity::Warning => counts.warnings = counts.warnings.saturating_add(1),
                Severity::Info => counts.infos = counts.infos.saturating_add(1),
            }
        }
        issues.truncate(MAX_ISSUES_PER_CHECK);
        Self {
            kind,
            status: counts.status(),
            counts,
            issues,
            notes: Vec::new(),
        }
    }

    pub fn passed(kind: CheckKind) -> Self {
        Self::from_issues(kind, Vec::new())
    }

    /// Fail-closed on an ambiguous external failure: the tool reported
    /// failure but produced nothing classifiable. Zero issues, status
    /// `fail`, with the reason recorded as a note.
    pub fn fail_closed(kind: CheckKind, note: impl Into<String>) -> Self {
        let mut result = Self::from_issues(kind, Vec::new());
        result.status = CheckStatus::Fail;
        result.notes.push(note.into());
        result
    }

    /// The tool could not be invoked at all (not found, timed out,
    /// budget exhausted). Never aborts the pipeline.
    pub fn unknown(kind: CheckKind, note: impl Into<String>) -> Self {
        let mut result = Self::from_issues(kind, Vec::new());
        result.status = CheckStatus::Unknown;
        result.notes.push(note.into());
        result
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_derives_from_counts() {
        let issues = vec![
            Issue::error(CheckKind::Types, "e1"),
            Issue::warning(CheckKind::Types, "w1"),
        ];
        let result = CheckResult::from_issues(CheckKind::Types, issues);
        assert_eq!(result.status, CheckStatus::Fail);
        assert_eq!(result.counts.errors, 1);
        assert_eq!(result.counts.warnings, 1);

        let warn_only =
            CheckResult::from_issues(CheckKind::Lint, vec![Issue::warning(CheckKind::Lint, "w")]);
        assert_eq!(warn_only.status, CheckStatus::Warn);

        assert_eq!(CheckResult::passed(CheckKind::Lint).status, CheckStatus::Pass);
    }

    #[test]
    fn issue_list_is_capped_but_counts_are_not() {
        let issues: Vec<Issue> = (0..200)
            .map(|i| Issue::error(CheckKind::Lint, format!("issue {i}")))
            .collect();
        let result = CheckResult::from_issues(CheckKind::Lint, issues);
        assert_eq!(result.issues.len(), MAX_ISSUES_PER_CHECK);
        assert_eq!(result.counts.errors, 200);
    }

    #[test]
    fn fail_closed_has_zero_counts_and_fail_status() {
        let result = CheckResult::fail_closed(CheckKind::Lint, "empty output, exit 1");
        assert_eq!(result.status, CheckStatus::Fail);
        assert_eq!(result.counts.total(), 0);
        assert_eq!(result.notes.len(), 1);
    }
}
