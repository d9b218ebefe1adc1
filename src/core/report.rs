use serde::{Deserialize, Serialize};

use crate::core::{
    AnalysisSummary, CheckResult, CheckStatus, DependencyOverview, RemediationPlan, Summary,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestingOverview {
    pub test_files: Vec<String>,
    pub run_status: CheckStatus,
}

impl Default for TestingOverview {
    fn default() -> Self {
        Self {
            test_files: Vec::new(),
            run_status: CheckStatus::Unknown,
        }
    }
}

/// The whole run, in the order the checks executed. Built once by the
/// engine after every check has returned; rendering never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub schema_version: String,
    pub tool_version: String,
    pub generated_at: String,
    pub project_root: String,
    pub summary: Summary,
    pub results: Vec<CheckResult>,
    pub analysis: AnalysisSummary,
    pub dependencies: DependencyOverview,
    pub testing: TestingOverview,
    pub plans: Vec<RemediationPlan>,
}
