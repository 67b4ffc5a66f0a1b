//! Pure mapping from a checker outcome to the response contract.

use super::{ExecutionResult, ProcessOutcome};
use crate::messages::Messages;

pub fn classify(outcome: &ProcessOutcome, messages: &Messages) -> ExecutionResult {
    match outcome {
        ProcessOutcome::TimedOut { limit } => failure(messages.timed_out(*limit)),
        ProcessOutcome::ToolMissing { .. } => failure(messages.tool_missing()),
        ProcessOutcome::Failed { message } => failure(messages.execution_error(message)),
        ProcessOutcome::Completed {
            exit_code,
            stdout,
            stderr,
        } => {
            let success = *exit_code == Some(0);
            // Warnings printed on stderr by a passing run stay in `output` only.
            ExecutionResult {
                success,
                output: format!("{}{}", stdout, stderr),
                errors: if success { String::new() } else { stderr.clone() },
            }
        }
    }
}

fn failure(errors: String) -> ExecutionResult {
    ExecutionResult {
        success: false,
        output: String::new(),
        errors,
    }
}
