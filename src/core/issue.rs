use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Types,
    UnusedImports,
    Lint,
    Complexity,
    DeadCode,
    DependencyUsage,
    Dependencies,
    Files,
    Security,
    Tests,
}

impl CheckKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            CheckKind::Types => "types",
            CheckKind::UnusedImports => "unused_imports",
            CheckKind::Lint => "lint",
            CheckKind::Complexity => "complexity",
            CheckKind::DeadCode => "dead_code",
            CheckKind::DependencyUsage => "dependency_usage",
            CheckKind::Dependencies => "dependencies",
            CheckKind::Files => "files",
            CheckKind::Security => "security",
            CheckKind::Tests => "tests",
        }
    }

    /// Human label used in the terminal table and the Markdown report.
    pub const fn label(self) -> &'static str {
        match self {
            CheckKind::Types => "TypeScript",
            CheckKind::UnusedImports => "Unused imports",
            CheckKind::Lint => "ESLint",
            CheckKind::Complexity => "Complexity",
            CheckKind::DeadCode => "Dead code",
            CheckKind::DependencyUsage => "Dependency usage",
            CheckKind::Dependencies => "Dependencies",
            CheckKind::Files => "File analysis",
            CheckKind::Security => "Security",
            CheckKind::Tests => "Tests",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized finding surfaced by a check. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub check: CheckKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl Issue {
    pub fn new(check: CheckKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            check,
            file: None,
            line: None,
            column: None,
            severity,
            message: message.into(),
            rule: None,
        }
    }

    pub fn error(check: CheckKind, message: impl Into<String>) -> Self {
        Self::new(check, Severity::Error, message)
    }

    pub fn warning(check: CheckKind, message: impl Into<String>) -> Self {
        Self::new(check, Severity::Warning, message)
    }

    pub fn at(mut self, file: impl Into<String>, line: Option<u32>, column: Option<u32>) -> Self {
        self.file = Some(file.into());
        self.line = line;
        self.column = column;
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// `path:line - message`, the shape used for example lists in reports.
    pub fn display_line(&self) -> String {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => format!("{file}:{line} - {}", self.message),
            (Some(file), None) => format!("{file} - {}", self.message),
            _ => self.message.clone(),
        }
    }
}
