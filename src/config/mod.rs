use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub ui: UiConfig,
    pub check: CheckConfig,
    pub report: ReportConfig,
    pub migrate: MigrateConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UiConfig {
    pub color: bool,
    pub max_table_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckConfig {
    /// Project-relative directories the analyzers walk.
    pub source_dirs: Vec<String>,
    pub exclude: Vec<String>,
    /// Project-relative path the Markdown report is written to.
    pub report_file: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportConfig {
    /// 0 means echo the full document to stdout.
    pub max_stdout_lines: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrateConfig {
    /// Source knowledge tree, resolved against the project root.
    pub source_dir: String,
    pub target_dir: String,
    pub public_dir: String,
    pub backup_dir: String,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            ui: UiConfig {
                color: true,
                max_table_rows: 20,
            },
            check: CheckConfig {
                source_dirs: vec![
                    "app".to_string(),
                    "src".to_string(),
                    "lib".to_string(),
                    "components".to_string(),
                    "types".to_string(),
                ],
                exclude: vec![
                    "**/node_modules/**".to_string(),
                    "**/.next/**".to_string(),
                    "**/dist/**".to_string(),
                    "**/build/**".to_string(),
                    "**/.git/**".to_string(),
                ],
                report_file: "CODE_HEALTH_REPORT.md".to_string(),
            },
            report: ReportConfig {
                max_stdout_lines: 0,
            },
            migrate: MigrateConfig {
                source_dir: "../chatbot-service/projects".to_string(),
                target_dir: "projects".to_string(),
                public_dir: "public/projects".to_string(),
                backup_dir: "projects_backup".to_string(),
            },
            config_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    ui: Option<RawUiConfig>,
    check: Option<RawCheckConfig>,
    report: Option<RawReportConfig>,
    migrate: Option<RawMigrateConfig>,
}

#[derive(Debug, Deserialize)]
struct RawUiConfig {
    color: Option<bool>,
    max_table_rows: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawCheckConfig {
    source_dirs: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    report_file: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawReportConfig {
    max_stdout_lines: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawMigrateConfig {
    source_dir: Option<String>,
    target_dir: Option<String>,
    public_dir: Option<String>,
    backup_dir: Option<String>,
}

pub fn default_config_path(project_root: &Path) -> PathBuf {
    project_root.join("webdoctor.toml")
}

pub fn load(config_path: Option<&Path>, project_root: &Path) -> Result<EffectiveConfig> {
    let mut cfg = EffectiveConfig::default();

    let path = config_path
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| default_config_path(project_root));

    if path.exists() {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let raw: RawConfig = toml::from_str(&s).context("failed to parse config file (TOML)")?;
        apply_raw_config(&mut cfg, raw);
        cfg.config_path = Some(path.display().to_string());
    }

    apply_env_overrides(&mut cfg)?;

    Ok(cfg)
}

fn apply_raw_config(cfg: &mut EffectiveConfig, raw: RawConfig) {
    if let Some(ui) = raw.ui {
        if let Some(color) = ui.color {
            cfg.ui.color = color;
        }
        if let Some(max_table_rows) = ui.max_table_rows {
            cfg.ui.max_table_rows = max_table_rows;
        }
    }

    if let Some(check) = raw.check {
        if let Some(source_dirs) = check.source_dirs {
            cfg.check.source_dirs = source_dirs;
        }
        if let Some(exclude) = check.exclude {
            cfg.check.exclude = exclude;
        }
        if let Some(report_file) = check.report_file {
            cfg.check.report_file = report_file;
        }
    }

    if let Some(report) = raw.report {
        if let Some(max_stdout_lines) = report.max_stdout_lines {
            cfg.report.max_stdout_lines = max_stdout_lines;
        }
    }

    if let Some(migrate) = raw.migrate {
        if let Some(source_dir) = migrate.source_dir {
            cfg.migrate.source_dir = source_dir;
        }
        if let Some(target_dir) = migrate.target_dir {
            cfg.migrate.target_dir = target_dir;
        }
        if let Some(public_dir) = migrate.public_dir {
            cfg.migrate.public_dir = public_dir;
        }
        if let Some(backup_dir) = migrate.backup_dir {
            cfg.migrate.backup_dir = backup_dir;
        }
    }
}

fn apply_env_overrides(cfg: &mut EffectiveConfig) -> Result<()> {
    if let Ok(v) = std::env::var("WEBDOCTOR_UI_COLOR") {
        cfg.ui.color = parse_bool(&v).with_context(|| "WEBDOCTOR_UI_COLOR")?;
    }
    if let Ok(v) = std::env::var("WEBDOCTOR_UI_MAX_TABLE_ROWS") {
        cfg.ui.max_table_rows = v
            .trim()
            .parse::<usize>()
            .with_context(|| "WEBDOCTOR_UI_MAX_TABLE_ROWS")?;
    }
    if let Ok(v) = std::env::var("WEBDOCTOR_CHECK_SOURCE_DIRS") {
        let parts = split_list(&v);
        if !parts.is_empty() {
            cfg.check.source_dirs = parts;
        }
    }
    if let Ok(v) = std::env::var("WEBDOCTOR_CHECK_EXCLUDE") {
        let parts = split_list(&v);
        if !parts.is_empty() {
            cfg.check.exclude = parts;
        }
    }
    if let Ok(v) = std::env::var("WEBDOCTOR_CHECK_REPORT_FILE") {
        let v = v.trim();
        if !v.is_empty() {
            cfg.check.report_file = v.to_string();
        }
    }
    if let Ok(v) = std::env::var("WEBDOCTOR_REPORT_MAX_STDOUT_LINES") {
        cfg.report.max_stdout_lines = v
            .trim()
            .parse::<usize>()
            .with_context(|| "WEBDOCTOR_REPORT_MAX_STDOUT_LINES")?;
    }
    if let Ok(v) = std::env::var("WEBDOCTOR_MIGRATE_SOURCE_DIR") {
        let v = v.trim();
        if !v.is_empty() {
            cfg.migrate.source_dir = v.to_string();
        }
    }

    Ok(())
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn parse_bool(s: &str) -> Result<bool> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow::anyhow!(
            "invalid boolean: {s} (use true|false|1|0|yes|no|on|off)"
        )),
    }
}
