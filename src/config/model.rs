// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::engine::JobSpec;

/// Configuration as read from a TOML file (or built from CLI flags).
///
/// ```toml
/// [monitor]
/// healthcheck = "5e0c2c6e-..."
/// ping_url = "https://hc-ping.com"
/// timeout = "10s"
///
/// [alert]
/// slack = "https://hooks.slack.com/services/..."
///
/// [retry]
/// retries = 2
/// base_delay = "1s"
/// factor = 3
///
/// [capture]
/// buffer_size = 655360
/// report_limit = 10240
/// alert_limit = 40960
///
/// [job]
/// name = "nightly-backup"
/// ```
///
/// Every field is optional; missing values fall back to the next layer and
/// finally to built-in defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub monitor: MonitorSection,

    #[serde(default)]
    pub alert: AlertSection,

    #[serde(default)]
    pub retry: RetrySection,

    #[serde(default)]
    pub capture: CaptureSection,

    #[serde(default)]
    pub job: JobSection,
}

/// `[monitor]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MonitorSection {
    /// Check id (UUID) of the job on the monitoring service.
    pub healthcheck: Option<String>,

    /// Base URL of the ping API.
    pub ping_url: Option<String>,

    /// Timeout for each HTTP request.
    #[serde(default, deserialize_with = "crate::config::duration::deserialize_opt")]
    pub timeout: Option<Duration>,
}

/// `[alert]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AlertSection {
    /// Slack incoming-webhook URL.
    pub slack: Option<String>,
}

/// `[retry]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    pub retries: Option<u32>,

    #[serde(default, deserialize_with = "crate::config::duration::deserialize_opt")]
    pub base_delay: Option<Duration>,

    pub factor: Option<u32>,
}

/// `[capture]` section. Sizes are in bytes.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CaptureSection {
    /// Retention per output stream.
    pub buffer_size: Option<usize>,

    /// Ceiling for the status body sent to the monitor.
    pub report_limit: Option<usize>,

    /// Ceiling for the output included in a fallback alert.
    pub alert_limit: Option<usize>,
}

/// `[job]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JobSection {
    /// Name used in alerts; defaults to the program path.
    pub name: Option<String>,
}

impl RawConfigFile {
    /// Layer `top` over `self`: any value set in `top` wins.
    pub fn overlay(self, top: RawConfigFile) -> RawConfigFile {
        RawConfigFile {
            monitor: MonitorSection {
                healthcheck: top.monitor.healthcheck.or(self.monitor.healthcheck),
                ping_url: top.monitor.ping_url.or(self.monitor.ping_url),
                timeout: top.monitor.timeout.or(self.monitor.timeout),
            },
            alert: AlertSection {
                slack: top.alert.slack.or(self.alert.slack),
            },
            retry: RetrySection {
                retries: top.retry.retries.or(self.retry.retries),
                base_delay: top.retry.base_delay.or(self.retry.base_delay),
                factor: top.retry.factor.or(self.retry.factor),
            },
            capture: CaptureSection {
                buffer_size: top.capture.buffer_size.or(self.capture.buffer_size),
                report_limit: top.capture.report_limit.or(self.capture.report_limit),
                alert_limit: top.capture.alert_limit.or(self.capture.alert_limit),
            },
            job: JobSection {
                name: top.job.name.or(self.job.name),
            },
        }
    }
}

/// Output capture sizes after defaults are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    pub buffer_size: usize,
    pub report_limit: usize,
    pub alert_limit: usize,
}

/// Fully resolved configuration for one run.
///
/// Built once at startup (see [`crate::config::resolve`]) and passed by
/// reference from then on.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub healthcheck: String,
    pub slack: String,
    pub ping_url: String,
    pub timeout: Duration,
    pub capture: CaptureSettings,
    pub job: JobSpec,
}
