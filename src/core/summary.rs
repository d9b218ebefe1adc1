use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{CheckKind, CheckResult, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Pass,
    Fail,
}

impl OverallStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            OverallStatus::Pass => "pass",
            OverallStatus::Fail => "fail",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Critical,
    Warning,
    Ignored,
}

/// The declarative criticality table. Critical findings force the overall
/// status to `fail`; warnings only add to the issue count. This mapping is
/// fixed configuration, not something inferred per run.
pub const fn tier(kind: CheckKind, severity: Severity) -> Tier {
    match (kind, severity) {
        (CheckKind::Types, Severity::Error) => Tier::Critical,
        (CheckKind::Lint, Severity::Error) => Tier::Critical,
        (CheckKind::Security, _) => Tier::Critical,
        (_, Severity::Info) => Tier::Ignored,
        _ => Tier::Warning,
    }
}

/// Derived aggregate over every check. Computed once after all checks
/// complete; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub overall_status: OverallStatus,
    pub issues_found: u64,
    pub critical_issues: Vec<String>,
    pub warnings: Vec<String>,
}

impl Summary {
    /// Fold the full set of results through the criticality table. Every
    /// counted finding contributes here; no check is consulted twice and
    /// none can contribute silently.
    pub fn fold(results: &[CheckResult]) -> Self {
        let mut issues_found: u64 = 0;
        let mut critical_issues = Vec::new();
        let mut warnings = Vec::new();

        for result in results {
            let mut critical: u64 = 0;
            let mut warning: u64 = 0;
            for (severity, count) in [
                (Severity::Error, result.counts.errors),
                (Severity::Warning, result.counts.warnings),
                (Severity::Info, result.counts.infos),
            ] {
                match tier(result.kind, severity) {
                    Tier::Critical => critical = critical.saturating_add(count),
                    Tier::Warning => warning = warning.saturating_add(count),
                    Tier::Ignored => {}
                }
            }

            issues_found = issues_found.saturating_add(critical).saturating_add(warning);
            if critical > 0 {
                critical_issues.push(format!("{}: {critical}", result.kind.label()));
            }
            if warning > 0 {
                warnings.push(format!("{}: {warning}", result.kind.label()));
            }
        }

        let overall_status = if critical_issues.is_empty() {
            OverallStatus::Pass
        } else {
            OverallStatus::Fail
        };

        Self {
            overall_status,
            issues_found,
            critical_issues,
            warnings,
        }
    }
}
