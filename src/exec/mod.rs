// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the supervised command
//! using `tokio::process::Command` and for re-running it when it fails.
//!
//! - [`backend`] provides the `CommandRunner` trait the retry controller
//!   talks to, plus the types describing one attempt.
//! - [`runner`] holds `ProcessRunner`, the production implementation that
//!   spawns the child, tees its output and captures it in bounded buffers.
//! - [`retry`] re-invokes a runner with exponential backoff.

pub mod backend;
pub mod retry;
pub mod runner;

pub use backend::{CommandRunner, ExecutionOutcome, JobCommand, RunFuture};
pub use retry::{RetryBudget, RetryDecision, RetryPolicy, RetryResult, run_with_retries};
pub use runner::ProcessRunner;
