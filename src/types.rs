// src/types.rs

use std::fmt;
use std::process::ExitStatus;

/// Exit code used when the supervised command never ran (or could not be
/// waited on).
pub const INTERNAL_ERROR_CODE: i32 = 1;

/// How a single attempt of the supervised command ended.
///
/// - `Success`: exited with status 0.
/// - `Failed(code)`: exited on its own with a nonzero status.
/// - `Signaled(signo)`: terminated by a signal (including our own kill on
///   cancellation).
/// - `NotStarted`: the process could not be spawned at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    Success,
    Failed(i32),
    Signaled(i32),
    NotStarted,
}

impl ExitClass {
    /// Classify a finished child's exit status.
    pub fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            return ExitClass::Success;
        }
        if let Some(code) = status.code() {
            return ExitClass::Failed(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signo) = status.signal() {
                return ExitClass::Signaled(signo);
            }
        }
        ExitClass::Failed(INTERNAL_ERROR_CODE)
    }

    /// Numeric status reported to the monitoring endpoint and used as our
    /// own exit code.
    pub fn code(self) -> i32 {
        match self {
            ExitClass::Success => 0,
            ExitClass::Failed(code) => code,
            ExitClass::Signaled(signo) => 128 + signo,
            ExitClass::NotStarted => INTERNAL_ERROR_CODE,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitClass::Success)
    }

    /// Whether another attempt could plausibly change the outcome.
    pub fn is_retryable(self) -> bool {
        matches!(self, ExitClass::Failed(_) | ExitClass::Signaled(_))
    }
}

impl fmt::Display for ExitClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitClass::Success => write!(f, "exit status 0"),
            ExitClass::Failed(code) => write!(f, "exit status {code}"),
            ExitClass::Signaled(signo) => write!(f, "terminated by signal {signo}"),
            ExitClass::NotStarted => write!(f, "not started"),
        }
    }
}

/// Remote endpoint a delivery was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// `POST <ping>/<id>/start`
    MonitorStart,
    /// `POST <ping>/<id>/<code>`
    MonitorStatus,
    /// Chat webhook used when the monitor could not be told.
    Alert,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let note = match self {
            Channel::MonitorStart => "problem sending start signal to Healthchecks.io",
            Channel::MonitorStatus => "problem sending status to Healthchecks.io",
            Channel::Alert => "problem posting alert to Slack",
        };
        f.write_str(note)
    }
}

/// Where a failure collected by the aggregator came from.
///
/// The declaration order is the order failures are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FailureSource {
    Execution,
    StartSignal,
    StatusReport,
    FallbackAlert,
}

impl fmt::Display for FailureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureSource::Execution => "command",
            FailureSource::StartSignal => "start signal",
            FailureSource::StatusReport => "status report",
            FailureSource::FallbackAlert => "fallback alert",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_shell_conventions() {
        assert_eq!(ExitClass::Success.code(), 0);
        assert_eq!(ExitClass::Failed(2).code(), 2);
        assert_eq!(ExitClass::Signaled(9).code(), 137);
        assert_eq!(ExitClass::NotStarted.code(), INTERNAL_ERROR_CODE);
    }

    #[test]
    fn only_ran_and_failed_is_retryable() {
        assert!(!ExitClass::Success.is_retryable());
        assert!(!ExitClass::NotStarted.is_retryable());
        assert!(ExitClass::Failed(1).is_retryable());
        assert!(ExitClass::Signaled(15).is_retryable());
    }
}
