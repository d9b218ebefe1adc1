use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{CheckKind, CheckResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    P0,
    P1,
    P2,
}

impl Priority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::P0 => "P0",
            Priority::P1 => "P1",
            Priority::P2 => "P2",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Priority::P0 => "critical",
            Priority::P1 => "important",
            Priority::P2 => "optimization",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remediation entry. Derived purely from the run's results; exists
/// only for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationPlan {
    pub priority: Priority,
    pub title: String,
    pub affected: u64,
    pub steps: Vec<String>,
    pub estimate_minutes: u64,
    pub examples: Vec<String>,
}

const MAX_EXAMPLES: usize = 5;

struct Rule {
    kind: CheckKind,
    priority: Priority,
    title: &'static str,
    minutes_per_item: u64,
    steps: &'static [&'static str],
}

/// The fixed check-finding → remediation table. Order here is the render
/// order within a priority tier.
const RULES: &[Rule] = &[
    Rule {
        kind: CheckKind::Types,
        priority: Priority::P0,
        title: "Fix TypeScript compile errors",
        minutes_per_item: 10,
        steps: &[
            "Run `npx tsc --noEmit` locally and work through the diagnostics file by file",
            "Fix missing types and incorrect signatures before touching call sites",
            "Re-run the type check until it exits cleanly",
        ],
    },
    Rule {
        kind: CheckKind::Security,
        priority: Priority::P0,
        title: "Remove hardcoded secrets",
        minutes_per_item: 15,
        steps: &[
            "Move each flagged value into an environment variable",
            "Rotate any credential that was committed",
            "Add the flagged patterns to code review checklists",
        ],
    },
    Rule {
        kind: CheckKind::Lint,
        priority: Priority::P1,
        title: "Fix lint findings",
        minutes_per_item: 3,
        steps: &[
            "Run `npx eslint . --fix` for the auto-fixable rules",
            "Resolve the remaining findings by hand",
        ],
    },
    Rule {
        kind: CheckKind::UnusedImports,
        priority: Priority::P1,
        title: "Clean up unused imports",
        minutes_per_item: 2,
        steps: &[
            "Delete the unused imports reported by the compiler",
            "Enable an editor-on-save organize-imports step to keep them out",
        ],
    },
    Rule {
        kind: CheckKind::Tests,
        priority: Priority::P1,
        title: "Repair the test suite",
        minutes_per_item: 20,
        steps: &[
            "Run `npm test` locally and fix the failing cases",
            "Add coverage for the modules flagged elsewhere in this report",
        ],
    },
    Rule {
        kind: CheckKind::Dependencies,
        priority: Priority::P1,
        title: "Update vulnerable or stale dependencies",
        minutes_per_item: 20,
        steps: &[
            "Upgrade packages with known vulnerabilities first (`npm audit`)",
            "Walk the outdated list and upgrade in small batches",
        ],
    },
    Rule {
        kind: CheckKind::DeadCode,
        priority: Priority::P2,
        title: "Delete dead exports",
        minutes_per_item: 5,
        steps: &[
            "Confirm each flagged export has no dynamic users",
            "Delete the export and its now-unreferenced code",
        ],
    },
    Rule {
        kind: CheckKind::DependencyUsage,
        priority: Priority::P2,
        title: "Prune unused and undeclared dependencies",
        minutes_per_item: 5,
        steps: &[
            "Remove unused packages from the manifest",
            "Declare packages that are imported but missing",
        ],
    },
    Rule {
        kind: CheckKind::Complexity,
        priority: Priority::P2,
        title: "Reduce complexity hotspots",
        minutes_per_item: 30,
        steps: &[
            "Split the flagged functions along their branching structure",
            "Extract deeply nested blocks into named helpers",
        ],
    },
    Rule {
        kind: CheckKind::Files,
        priority: Priority::P2,
        title: "Break up oversized files",
        minutes_per_item: 30,
        steps: &[
            "Split the largest files listed below along module boundaries",
            "Keep new files under the size threshold",
        ],
    },
];

/// Synthesize the remediation plan from the run's results. One entry per
/// table rule that has findings, ordered by priority tier then table order.
pub fn derive_plans(results: &[CheckResult]) -> Vec<RemediationPlan> {
    let mut plans = Vec::new();

    for rule in RULES {
        let Some(result) = results.iter().find(|r| r.kind == rule.kind) else {
            continue;
        };
        let affected = result.counts.errors.saturating_add(result.counts.warnings);
        if affected == 0 {
            continue;
        }

        let mut examples: Vec<String> = result
            .issues
            .iter()
            .filter_map(|i| i.file.clone())
            .collect();
        examples.sort();
        examples.dedup();
        examples.truncate(MAX_EXAMPLES);

        plans.push(RemediationPlan {
            priority: rule.priority,
            title: rule.title.to_string(),
            affected,
            steps: rule.steps.iter().map(|s| (*s).to_string()).collect(),
            estimate_minutes: rule.minutes_per_item.saturating_mul(affected),
            examples,
        });
    }

    plans.sort_by_key(|p| p.priority);
    plans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Issue;

    #[test]
    fn clean_results_produce_no_plans() {
        let results = vec![
            CheckResult::passed(CheckKind::Types),
            CheckResult::passed(CheckKind::Lint),
        ];
        assert!(derive_plans(&results).is_empty());
    }

    #[test]
    fn estimate_is_a_multiple_of_the_finding_count() {
        let results = vec![CheckResult::from_issues(
            CheckKind::Types,
            (0..4)
                .map(|i| Issue::error(CheckKind::Types, format!("e{i}")))
                .collect(),
        )];
        let plans = derive_plans(&results);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].priority, Priority::P0);
        assert_eq!(plans[0].affected, 4);
        assert_eq!(plans[0].estimate_minutes, 40);
    }

    #[test]
    fn plans_are_ordered_by_priority() {
        let results = vec![
            CheckResult::from_issues(
                CheckKind::DeadCode,
                vec![Issue::warning(CheckKind::DeadCode, "unused")],
            ),
            CheckResult::from_issues(
                CheckKind::Security,
                vec![Issue::error(CheckKind::Security, "token")],
            ),
            CheckResult::from_issues(
                CheckKind::UnusedImports,
                vec![Issue::warning(CheckKind::UnusedImports, "unused import")],
            ),
        ];
        let plans = derive_plans(&results);
        let priorities: Vec<Priority> = plans.iter().map(|p| p.priority).collect();
        assert_eq!(priorities, vec![Priority::P0, Priority::P1, Priority::P2]);
    }

    #[test]
    fn examples_come_from_issue_files() {
        let results = vec![CheckResult::from_issues(
            CheckKind::Security,
            vec![
                Issue::error(CheckKind::Security, "hardcoded token").at("lib/auth.ts", Some(3), None),
                Issue::error(CheckKind::Security, "hardcoded key").at("lib/auth.ts", Some(9), None),
            ],
        )];
        let plans = derive_plans(&results);
        assert_eq!(plans[0].examples, vec!["lib/auth.ts".to_string()]);
    }
}
