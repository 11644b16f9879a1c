// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every option can also be given as a `KRISTY_`-prefixed environment
//! variable; flags win over env vars, which win over the config file.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::{
    AlertSection, JobSection, MonitorSection, RawConfigFile, RetrySection, parse_duration,
};

const LONG_ABOUT: &str = "\
Kristy tells Healthchecks.io how your cron jobs are doing. If it can't reach
Healthchecks.io, it falls back to warning Slack that something went wrong.

Options may also be passed as environment variables prefixed with KRISTY_.";

/// Command-line arguments for `kristy`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "kristy",
    version,
    about = "kristy - a baby-sitter for your cron jobs",
    long_about = LONG_ABOUT,
    override_usage = "kristy [OPTIONS] <COMMAND>..."
)]
pub struct CliArgs {
    /// UUID of the job on Healthchecks.io.
    #[arg(long, value_name = "UUID", env = "KRISTY_HEALTHCHECK")]
    pub healthcheck: Option<String>,

    /// Slack incoming-webhook URL for fallback alerts.
    #[arg(long, value_name = "URL", env = "KRISTY_SLACK")]
    pub slack: Option<String>,

    /// Timeout for each HTTP request (e.g. 10s, 500ms). Default: 10s.
    #[arg(long, value_name = "DURATION", env = "KRISTY_TIMEOUT", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// How many times to retry a failed command. Default: 0.
    #[arg(long, value_name = "N", env = "KRISTY_RETRIES")]
    pub retries: Option<u32>,

    /// Base URL of the ping API. Default: https://hc-ping.com
    #[arg(long, value_name = "URL", env = "KRISTY_PING_URL")]
    pub ping_url: Option<String>,

    /// Job name used in alerts. Default: the program being run.
    #[arg(long, value_name = "NAME", env = "KRISTY_NAME")]
    pub name: Option<String>,

    /// Optional TOML config file.
    #[arg(long, value_name = "PATH", env = "KRISTY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Don't log debug output; only errors.
    #[arg(long, env = "KRISTY_SILENT")]
    pub silent: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `KRISTY_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// The command to babysit, followed by its arguments.
    #[arg(
        value_name = "COMMAND",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

impl CliArgs {
    /// Flag / env values as a config layer to put over the config file.
    pub fn overrides(&self) -> RawConfigFile {
        RawConfigFile {
            monitor: MonitorSection {
                healthcheck: self.healthcheck.clone(),
                ping_url: self.ping_url.clone(),
                timeout: self.timeout,
            },
            alert: AlertSection {
                slack: self.slack.clone(),
            },
            retry: RetrySection {
                retries: self.retries,
                ..Default::default()
            },
            job: JobSection {
                name: self.name.clone(),
            },
            ..Default::default()
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::try_parse()`.
pub fn parse() -> Result<CliArgs, clap::Error> {
    CliArgs::try_parse()
}
