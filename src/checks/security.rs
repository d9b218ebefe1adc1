use std::path::Path;

use anyhow::Result;
use regex::Regex;

use crate::analyze;
use crate::core::{CheckKind, CheckResult, Issue};

/// Assignment patterns that usually mean a credential was committed.
const SECRET_PATTERNS: &[(&str, &str)] = &[
    (r#"(?i)password\s*[:=]\s*["'][^"']+["']"#, "hardcoded-password"),
    (r#"(?i)api[_-]?key\s*[:=]\s*["'][^"']+["']"#, "hardcoded-api-key"),
    (r#"(?i)secret\s*[:=]\s*["'][^"']+["']"#, "hardcoded-secret"),
    (r#"(?i)token\s*[:=]\s*["'][^"']+["']"#, "hardcoded-token"),
];

/// Scan the source tree line by line for likely hardcoded secrets.
/// Matches carrying an obvious placeholder marker are excluded. Unreadable
/// files are skipped; the scan always completes.
pub fn security_scan(
    project_root: &Path,
    source_dirs: &[String],
    excludes: &[String],
) -> Result<CheckResult> {
    let patterns: Vec<(Regex, &str)> = SECRET_PATTERNS
        .iter()
        .filter_map(|(pattern, category)| Regex::new(pattern).ok().map(|re| (re, *category)))
        .collect();

    let (files, _) = analyze::source_files(project_root, source_dirs, excludes)?;

    let mut issues = Vec::new();
    for path in &files {
        if path.components().any(|c| c.as_os_str() == "__tests__") {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(path) else {
            continue;
        };
        let rel = path
            .strip_prefix(project_root)
            .unwrap_or(path)
            .display()
            .to_string();
        issues.extend(scan_content(&rel, &content, &patterns));
    }

    Ok(CheckResult::from_issues(CheckKind::Security, issues))
}

fn scan_content(rel_path: &str, content: &str, patterns: &[(Regex, &str)]) -> Vec<Issue> {
    let mut issues = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        for (re, category) in patterns {
            let Some(matched) = re.find(line) else {
                continue;
            };
            if is_placeholder(matched.as_str()) {
                continue;
            }
            issues.push(
                Issue::error(CheckKind::Security, format!("likely {category}"))
                    .at(rel_path, Some(idx as u32 + 1), None)
                    .with_rule(*category),
            );
        }
    }
    issues
}

fn is_placeholder(matched: &str) -> bool {
    matched.to_ascii_lowercase().contains("example") || matched.contains("TODO")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> Vec<(Regex, &'static str)> {
        SECRET_PATTERNS
            .iter()
            .map(|(p, c)| (Regex::new(p).expect("pattern"), *c))
            .collect()
    }

    #[test]
    fn placeholder_values_are_excluded() {
        let content = "const password = \"example123\"\nconst apiKey = \"sk-real-secret\"\n";
        let issues = scan_content("lib/auth.ts", content, &patterns());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].line, Some(2));
        assert_eq!(issues[0].rule.as_deref(), Some("hardcoded-api-key"));
    }

    #[test]
    fn todo_marked_lines_are_excluded() {
        let content = "const token = \"TODO: replace\"\n";
        assert!(scan_content("a.ts", content, &patterns()).is_empty());
    }

    #[test]
    fn each_category_matches_its_assignment_shape() {
        let content = "\
const password = 'hunter2'
const API_KEY: \"abc-123\"
secret = \"sssh\"
let authToken = 'tkn'
const safe = process.env.SECRET
";
        let issues = scan_content("a.ts", content, &patterns());
        let categories: Vec<&str> = issues.iter().filter_map(|i| i.rule.as_deref()).collect();
        assert_eq!(
            categories,
            vec![
                "hardcoded-password",
                "hardcoded-api-key",
                "hardcoded-secret",
                "hardcoded-token",
            ]
        );
    }

    #[test]
    fn clean_content_has_no_findings() {
        let content = "const user = load()\nconst key = process.env.API_KEY\n";
        assert!(scan_content("a.ts", content, &patterns()).is_empty());
    }
}
