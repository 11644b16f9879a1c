// src/engine/mod.rs

//! Orchestration engine for kristy.
//!
//! This module ties together:
//! - the retry controller driving the command,
//! - the monitor and fallback alert clients,
//! - the merging of every failure into one outcome.
//!
//! The run sequence lives in [`orchestrator`]; failure merging in
//! [`aggregate`].

pub mod aggregate;
pub mod orchestrator;

pub use aggregate::{AggregateError, Failure};
pub use orchestrator::{JobSpec, Orchestrator};
pub use crate::types::FailureSource;
