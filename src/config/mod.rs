// src/config/mod.rs

//! Configuration: optional TOML file, overridden by env vars and CLI flags.
//!
//! - [`model`] holds the raw (all-optional) file model and the resolved
//!   [`AppConfig`].
//! - [`loader`] reads the file and layers the overrides on top.
//! - [`validate`] turns the merged raw config into an `AppConfig`.
//! - [`duration`] parses `"10s"`-style durations.

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{load_from_path, load_optional, resolve};
pub use model::{
    AlertSection, AppConfig, CaptureSection, CaptureSettings, JobSection, MonitorSection,
    RawConfigFile, RetrySection,
};
