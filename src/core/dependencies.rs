use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: String,
    pub severity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Manifest counts plus the optional outdated/audit query results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyOverview {
    pub runtime_count: u64,
    pub dev_count: u64,
    pub outdated: Vec<String>,
    pub vulnerabilities: Vec<Vulnerability>,
}
