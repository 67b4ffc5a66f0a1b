//! Execution gateway: stage source text, run the checker on it, classify
//! the outcome.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{config::Config, messages::Messages};

pub mod checker;
pub mod classify;
pub mod workspace;

pub use checker::Checker;
pub use classify::classify;
pub use workspace::{Workspace, WorkspaceAllocator};

/// Body of `POST /api/execute`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub code: String,
}

/// Response contract of `POST /api/execute`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub output: String,
    pub errors: String,
}

/// Raw result of one checker run. Exactly one variant describes a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The process ran to completion. `exit_code` is `None` when it was
    /// terminated by a signal.
    Completed {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    TimedOut {
        limit: Duration,
    },
    ToolMissing {
        program: String,
    },
    Failed {
        message: String,
    },
}

impl ProcessOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Completed { exit_code: Some(0), .. } => "passed",
            Self::Completed { .. } => "rejected",
            Self::TimedOut { .. } => "timed_out",
            Self::ToolMissing { .. } => "tool_missing",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Composition root of the execution path. Stateless apart from its
/// configuration, so one instance serves concurrent requests.
#[derive(Debug, Clone)]
pub struct Gateway {
    allocator: WorkspaceAllocator,
    checker: Checker,
    messages: Messages,
}

impl Gateway {
    pub fn new(allocator: WorkspaceAllocator, checker: Checker, messages: Messages) -> Self {
        Self {
            allocator,
            checker,
            messages,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            WorkspaceAllocator::new(cfg.workspace_dir()),
            Checker::new(cfg.checker_program(), cfg.checker_timeout()),
            Messages::new(cfg.locale()),
        )
    }

    pub fn checker(&self) -> &Checker {
        &self.checker
    }

    /// Check `request.code` and report the result. Never fails: every fault
    /// is folded into the returned `ExecutionResult`.
    ///
    /// Dropping the returned future kills the checker and removes the
    /// workspace file.
    pub async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        let started = Instant::now();
        let outcome = self.run(&request.code).await;
        info!(
            outcome = outcome.kind(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            bytes = request.code.len(),
            "checked source"
        );
        classify(&outcome, &self.messages)
    }

    async fn run(&self, source: &str) -> ProcessOutcome {
        let workspace = match self.allocator.acquire(source) {
            Ok(ws) => ws,
            Err(e) => {
                return ProcessOutcome::Failed {
                    message: e.to_string(),
                }
            }
        };
        let outcome = self.checker.run(workspace.path()).await;
        workspace.release();
        outcome
    }
}
