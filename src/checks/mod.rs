use std::path::PathBuf;
use std::time::{Duration, Instant};

pub mod deadcode;
pub mod deps;
pub mod lint;
pub mod security;
pub mod testing;
pub mod typecheck;

/// Per-tool timeout caps. The effective timeout for a call is the cap
/// bounded by whatever remains of the run's overall deadline.
pub const TYPECHECK_TIMEOUT: Duration = Duration::from_secs(120);
pub const LINT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEADCODE_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEPCHECK_TIMEOUT: Duration = Duration::from_secs(120);
pub const NPM_QUERY_TIMEOUT: Duration = Duration::from_secs(60);
pub const TEST_RUN_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct CheckContext {
    pub project_root: PathBuf,
    pub timeout: Duration,
    pub deadline: Option<Instant>,
}

impl CheckContext {
    pub fn command_timeout(&self) -> Duration {
        let Some(deadline) = self.deadline else {
            return self.timeout;
        };
        let remaining = deadline.saturating_duration_since(Instant::now());
        std::cmp::min(self.timeout, remaining)
    }
}

/// Shared note text for a check whose slot in the overall deadline was
/// already consumed before the tool could be invoked.
pub(crate) const BUDGET_EXHAUSTED: &str = "not run: timeout budget exhausted";
