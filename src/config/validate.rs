// src/config/validate.rs

use crate::capture::DEFAULT_CAPACITY;
use crate::config::model::{AppConfig, CaptureSettings, RawConfigFile};
use crate::engine::JobSpec;
use crate::errors::{KristyError, Result};
use crate::exec::{JobCommand, RetryPolicy};
use crate::notify::DEFAULT_TIMEOUT;
use crate::notify::healthchecks::DEFAULT_PING_URL;
use crate::report::{ALERT_LIMIT, MONITOR_LIMIT, SCAFFOLD_LEN};

impl AppConfig {
    /// Apply defaults to a merged raw config and validate the result.
    pub fn from_raw(raw: RawConfigFile, command: Vec<String>) -> Result<Self> {
        let command = JobCommand::new(command)?;

        let healthcheck = required(raw.monitor.healthcheck, "healthcheck")?;
        let slack = required(raw.alert.slack, "slack")?;

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            retries: raw.retry.retries.unwrap_or(defaults.retries),
            base_delay: raw.retry.base_delay.unwrap_or(defaults.base_delay),
            factor: raw.retry.factor.unwrap_or(defaults.factor),
        };
        validate_retry(&retry)?;

        let capture = CaptureSettings {
            buffer_size: raw.capture.buffer_size.unwrap_or(DEFAULT_CAPACITY),
            report_limit: raw.capture.report_limit.unwrap_or(MONITOR_LIMIT),
            alert_limit: raw.capture.alert_limit.unwrap_or(ALERT_LIMIT),
        };
        validate_capture(&capture)?;

        let name = match raw.job.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => command.program().to_string(),
        };

        Ok(AppConfig {
            healthcheck,
            slack,
            ping_url: raw
                .monitor
                .ping_url
                .unwrap_or_else(|| DEFAULT_PING_URL.to_string()),
            timeout: raw.monitor.timeout.unwrap_or(DEFAULT_TIMEOUT),
            capture,
            job: JobSpec {
                name,
                command,
                retry,
                report_limit: capture.report_limit,
                alert_limit: capture.alert_limit,
            },
        })
    }
}

fn required(value: Option<String>, flag: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() && v != "-" => Ok(v),
        _ => Err(KristyError::ConfigError(format!(
            "missing required flag --{flag} (or KRISTY_{} / config file)",
            flag.to_uppercase()
        ))),
    }
}

fn validate_retry(retry: &RetryPolicy) -> Result<()> {
    if retry.factor == 0 {
        return Err(KristyError::ConfigError(
            "retry.factor must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_capture(capture: &CaptureSettings) -> Result<()> {
    if capture.buffer_size == 0 {
        return Err(KristyError::ConfigError(
            "capture.buffer_size must be greater than 0".to_string(),
        ));
    }
    for (name, limit) in [
        ("report_limit", capture.report_limit),
        ("alert_limit", capture.alert_limit),
    ] {
        if limit < SCAFFOLD_LEN {
            return Err(KristyError::ConfigError(format!(
                "capture.{name} must be at least {SCAFFOLD_LEN} bytes (got {limit})"
            )));
        }
    }
    Ok(())
}
