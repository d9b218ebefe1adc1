use std::io;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};

use crate::engine::{Engine, EngineOptions};
use crate::ui::UiConfig;

#[derive(Debug, Parser)]
#[command(
    name = "webdoctor",
    version,
    about = "Run code-health checks against a web-app project and aggregate the results into a Markdown report"
)]
pub struct Cli {
    #[arg(long, global = true)]
    pub json: bool,
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
    #[arg(long, global = true)]
    pub verbose: bool,
    #[arg(long, global = true)]
    pub quiet: bool,
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Project root; defaults to the current directory.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
    /// Overall wall-clock budget for external tools, in seconds.
    #[arg(long, default_value_t = 600, global = true)]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run every check, write the report file, and echo the report.
    Check(CheckArgs),
    /// Run every check and print the report to stdout without writing it.
    Report(ReportArgs),
    /// Migrate the knowledge base into this project and its public mirror.
    Migrate(MigrateArgs),
    Config(ConfigArgs),
    Completion(CompletionArgs),
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Skip writing the report file; only echo the report.
    #[arg(long)]
    pub no_write: bool,
}

#[derive(Debug, Args)]
pub struct ReportArgs {}

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Override the configured source knowledge tree.
    #[arg(long)]
    pub source: Option<String>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub show: bool,
}

#[derive(Debug, Args)]
pub struct CompletionArgs {
    pub shell: String,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let stdout_is_tty = io::stdout().is_terminal();
    let stderr_is_tty = io::stderr().is_terminal();

    let project_root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("failed to resolve the current directory")?,
    };

    let env_config_path = std::env::var_os("WEBDOCTOR_CONFIG").map(PathBuf::from);
    let cfg = crate::config::load(
        cli.config.as_deref().or(env_config_path.as_deref()),
        &project_root,
    )
    .map_err(crate::exit::invalid_args_err)?;

    let color = stdout_is_tty && cfg.ui.color && !cli.no_color;
    let ui_cfg = UiConfig {
        color,
        stdout_is_tty,
        max_table_rows: cfg.ui.max_table_rows,
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Check(args) => {
            let engine = Engine::new(
                project_root,
                cfg.check.clone(),
                EngineOptions {
                    timeout: Duration::from_secs(cli.timeout),
                    show_progress: stderr_is_tty && !cli.quiet && !cli.json,
                },
            )?;
            let report = engine.check()?;
            let markdown = crate::render::render_markdown(&report);

            if !args.no_write {
                let path = engine.report_path();
                std::fs::write(&path, &markdown)
                    .with_context(|| format!("failed to write report: {}", path.display()))?;
                if !cli.quiet {
                    eprintln!("report written to: {}", path.display());
                }
            }

            if cli.json {
                write_json(&report)?;
            } else if ui_cfg.stdout_is_tty {
                crate::ui::print_check_summary(&report, &ui_cfg);
            } else if !cli.quiet {
                write_stdout(truncated(&markdown, cfg.report.max_stdout_lines).as_bytes())?;
            }
        }
        Commands::Report(_args) => {
            let engine = Engine::new(
                project_root,
                cfg.check.clone(),
                EngineOptions {
                    timeout: Duration::from_secs(cli.timeout),
                    show_progress: stderr_is_tty && !cli.quiet && !cli.json,
                },
            )?;
            let report = engine.check()?;
            if cli.json {
                write_json(&report)?;
            } else {
                let markdown = crate::render::render_markdown(&report);
                write_stdout(markdown.as_bytes())?;
            }
        }
        Commands::Migrate(args) => {
            let mut migrate_cfg = cfg.migrate.clone();
            if let Some(source) = args.source {
                migrate_cfg.source_dir = source;
            }

            let report = crate::migrate::run(&project_root, &migrate_cfg)?;
            if cli.json {
                let buf = serde_json::to_vec_pretty(&report)?;
                write_stdout(&buf)?;
                write_stdout(b"\n")?;
            } else {
                crate::ui::print_migration_summary(&report, &ui_cfg);
            }

            if report.total_errors > 0 {
                return Err(crate::exit::migration_failed(format!(
                    "{} files failed to migrate",
                    report.total_errors
                )));
            }
        }
        Commands::Config(args) => {
            if args.show {
                if cli.json {
                    let stdout = io::stdout();
                    serde_json::to_writer_pretty(stdout.lock(), &cfg)?;
                } else {
                    println!("{}", toml::to_string_pretty(&cfg)?);
                }
            } else if !ui_cfg.quiet {
                eprintln!("config: use `webdoctor config --show`");
            }
        }
        Commands::Completion(args) => {
            let shell = parse_shell(&args.shell)?;
            let mut cmd = Cli::command();
            let mut out = io::stdout().lock();
            clap_complete::generate(shell, &mut cmd, "webdoctor", &mut out);
        }
    }

    Ok(())
}

fn write_json(report: &crate::core::HealthReport) -> Result<()> {
    let buf = serde_json::to_vec_pretty(report)?;
    write_stdout(&buf)?;
    write_stdout(b"\n")
}

fn write_stdout(bytes: &[u8]) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    match stdout.write_all(bytes) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err.into()),
    }
}

/// Bound the stdout echo for terminal display; 0 means no bound.
fn truncated(markdown: &str, max_lines: usize) -> String {
    if max_lines == 0 {
        return markdown.to_string();
    }
    let total = markdown.lines().count();
    if total <= max_lines {
        return markdown.to_string();
    }
    let mut out: String = markdown
        .lines()
        .take(max_lines)
        .map(|l| format!("{l}\n"))
        .collect();
    out.push_str(&format!("... ({} more lines)\n", total - max_lines));
    out
}

fn parse_shell(s: &str) -> Result<clap_complete::Shell> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "bash" => Ok(clap_complete::Shell::Bash),
        "zsh" => Ok(clap_complete::Shell::Zsh),
        "fish" => Ok(clap_complete::Shell::Fish),
        other => Err(crate::exit::invalid_args(format!(
            "unsupported shell: {other} (use bash|zsh|fish)"
        ))),
    }
}
