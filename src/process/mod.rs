use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use wait_timeout::ChildExt;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Run an external tool with stdout/stderr captured, killing it when the
/// timeout elapses. The child never inherits stdin.
pub fn run_command(
    cmd: &str,
    args: &[&str],
    cwd: &Path,
    timeout: Duration,
) -> Result<CommandOutput> {
    let mut command = Command::new(cmd);
    command
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command
        .spawn()
        .with_context(|| format!("failed to spawn: {cmd}"))?;

    let status = match child
        .wait_timeout(timeout)
        .with_context(|| format!("failed to wait for: {cmd}"))?
    {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(anyhow!("timed out after {timeout:?}: {cmd}"));
        }
    };

    let mut stdout = String::new();
    if let Some(mut out) = child.stdout.take() {
        let _ = out.read_to_string(&mut stdout);
    }
    let mut stderr = String::new();
    if let Some(mut err) = child.stderr.take() {
        let _ = err.read_to_string(&mut stderr);
    }

    Ok(CommandOutput {
        exit_code: status.code().unwrap_or(-1),
        stdout,
        stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_and_exit_code() {
        let out = run_command(
            "sh",
            &["-c", "echo hello; exit 3"],
            Path::new("."),
            Duration::from_secs(5),
        )
        .expect("run sh");
        assert_eq!(out.exit_code, 3);
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[test]
    fn missing_binary_is_an_error_not_a_panic() {
        let err = run_command(
            "webdoctor-no-such-tool",
            &[],
            Path::new("."),
            Duration::from_secs(1),
        );
        assert!(err.is_err());
    }

    #[test]
    fn timeout_kills_the_child() {
        let err = run_command(
            "sh",
            &["-c", "sleep 5"],
            Path::new("."),
            Duration::from_millis(100),
        );
        assert!(err.is_err());
    }
}
