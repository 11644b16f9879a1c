// src/exec/backend.rs

//! Pluggable command runner abstraction.
//!
//! The retry controller talks to a `CommandRunner` instead of spawning
//! processes directly. Production code uses [`super::ProcessRunner`]; tests
//! can provide a runner that replays scripted outcomes without touching the
//! OS.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::errors::{KristyError, Result};
use crate::types::{ExitClass, INTERNAL_ERROR_CODE};

/// Program path plus arguments. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCommand {
    parts: Vec<String>,
}

impl JobCommand {
    pub fn new<I, S>(parts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parts: Vec<String> = parts.into_iter().map(Into::into).collect();
        if parts.is_empty() || parts[0].is_empty() {
            return Err(KristyError::ConfigError(
                "no command given to babysit".to_string(),
            ));
        }
        Ok(Self { parts })
    }

    pub fn program(&self) -> &str {
        &self.parts[0]
    }

    pub fn args(&self) -> &[String] {
        &self.parts[1..]
    }
}

impl fmt::Display for JobCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.parts.join(" "))
    }
}

/// Result of a single attempt at running the command.
///
/// `stdout` / `stderr` hold whatever the bounded capture retained, even when
/// the attempt failed or was cancelled. `error` is `None` exactly when
/// `class` is `Success`.
#[derive(Debug)]
pub struct ExecutionOutcome {
    pub class: ExitClass,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub error: Option<KristyError>,
}

impl ExecutionOutcome {
    /// Outcome of a child that ran to completion (successfully or not).
    pub fn finished(class: ExitClass, stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
        let error = if class.is_success() {
            None
        } else {
            Some(KristyError::RunFailure(class))
        };
        Self {
            class,
            stdout,
            stderr,
            error,
        }
    }

    /// The process could not be spawned.
    pub fn not_started(err: std::io::Error) -> Self {
        Self {
            class: ExitClass::NotStarted,
            stdout: Vec::new(),
            stderr: Vec::new(),
            error: Some(KristyError::StartFailure(err)),
        }
    }

    /// The child started but waiting on it failed.
    pub fn wait_failed(err: std::io::Error, stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
        Self {
            class: ExitClass::Failed(INTERNAL_ERROR_CODE),
            stdout,
            stderr,
            error: Some(KristyError::WaitFailure(err)),
        }
    }

    pub fn is_success(&self) -> bool {
        self.class.is_success()
    }
}

pub type RunFuture<'a> = Pin<Box<dyn Future<Output = ExecutionOutcome> + Send + 'a>>;

/// Trait abstracting how one attempt of the command is executed.
pub trait CommandRunner: Send + Sync {
    /// Run the command once to completion.
    ///
    /// Cancelling `cancel` must stop the attempt promptly while still
    /// returning whatever output was captured.
    fn run<'a>(&'a self, command: &'a JobCommand, cancel: &'a CancellationToken) -> RunFuture<'a>;
}
