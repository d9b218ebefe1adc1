use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::checks::{self, CheckContext};
use crate::config::CheckConfig;
use crate::core::{CheckKind, CheckResult, HealthReport, Summary, derive_plans};

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Wall-clock budget for the whole run; each external call gets
    /// whatever remains, bounded by its per-tool cap.
    pub timeout: Duration,
    pub show_progress: bool,
}

#[derive(Clone)]
pub struct Engine {
    opts: EngineOptions,
    project_root: PathBuf,
    check_cfg: CheckConfig,
}

impl Engine {
    pub fn new(project_root: PathBuf, check_cfg: CheckConfig, opts: EngineOptions) -> Result<Self> {
        if !project_root.is_dir() {
            return Err(crate::exit::invalid_args(format!(
                "project root is not a directory: {}",
                project_root.display()
            )));
        }
        Ok(Self {
            opts,
            project_root,
            check_cfg,
        })
    }

    pub fn report_path(&self) -> PathBuf {
        self.project_root.join(&self.check_cfg.report_file)
    }

    /// Run every check in the fixed order and fold the results into one
    /// report. Individual check failures are downgraded inside the
    /// runners; only environment-level errors (unwalkable source tree)
    /// surface here.
    pub fn check(&self) -> Result<HealthReport> {
        let deadline = Instant::now() + self.opts.timeout;
        let ctx = |timeout: Duration| CheckContext {
            project_root: self.project_root.clone(),
            timeout: std::cmp::min(timeout, self.opts.timeout),
            deadline: Some(deadline),
        };

        use std::io::IsTerminal;
        let progress_enabled = self.opts.show_progress && std::io::stderr().is_terminal();
        let pb = if progress_enabled {
            let pb = indicatif::ProgressBar::new_spinner();
            pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
            pb.enable_steady_tick(Duration::from_millis(120));
            Some(pb)
        } else {
            None
        };
        let progress = |message: &str| {
            if let Some(pb) = &pb {
                pb.set_message(message.to_string());
            }
        };

        let mut results: Vec<CheckResult> = Vec::new();

        progress("type check");
        let typecheck = checks::typecheck::type_check(&ctx(checks::TYPECHECK_TIMEOUT));
        let unused = checks::typecheck::unused_imports(&typecheck.raw);
        results.push(typecheck.result);
        results.push(unused);

        progress("lint");
        let lint = checks::lint::lint(&ctx(checks::LINT_TIMEOUT));
        let complexity = checks::lint::complexity(&lint.all_issues);
        results.push(lint.result);
        results.push(complexity);

        progress("dead code");
        results.push(checks::deadcode::dead_code(&ctx(checks::DEADCODE_TIMEOUT)));

        progress("dependencies");
        let (usage, deps) = match checks::deps::read_manifest_counts(&self.project_root) {
            Ok(counts) => {
                let usage = checks::deps::dependency_usage(&ctx(checks::DEPCHECK_TIMEOUT));
                let deps = checks::deps::dependencies(&ctx(checks::NPM_QUERY_TIMEOUT), counts);
                (usage, deps)
            }
            Err(err) => {
                // Fatal for the dependency checks only; the rest of the
                // run proceeds and the failure stays visible.
                let note = format!("{err:#}");
                (
                    CheckResult::fail_closed(CheckKind::DependencyUsage, note.clone()),
                    checks::deps::DependenciesOutput {
                        result: CheckResult::fail_closed(CheckKind::Dependencies, note),
                        overview: Default::default(),
                    },
                )
            }
        };
        results.push(usage);
        results.push(deps.result);

        progress("file analysis");
        let analysis = crate::analyze::analyze_project(
            &self.project_root,
            &self.check_cfg.source_dirs,
            &self.check_cfg.exclude,
        )?;
        results.push(analysis.result);

        progress("security scan");
        let security = checks::security::security_scan(
            &self.project_root,
            &self.check_cfg.source_dirs,
            &self.check_cfg.exclude,
        )?;
        results.push(security);

        progress("tests");
        let testing = checks::testing::testing(
            &ctx(checks::TEST_RUN_TIMEOUT),
            &self.check_cfg.source_dirs,
        );
        results.push(testing.result);

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        let summary = Summary::fold(&results);
        let plans = derive_plans(&results);
        let generated_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "unknown".to_string());

        Ok(HealthReport {
            schema_version: "1.0".to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at,
            project_root: self.project_root.display().to_string(),
            summary,
            results,
            analysis: analysis.summary,
            dependencies: deps.overview,
            testing: testing.overview,
            plans,
        })
    }
}
