// src/errors.rs

//! Crate-wide error type.
//!
//! `StartFailure` (never ran) and `RunFailure` (ran and failed) are kept apart
//! so callers can tell them apart; delivery problems carry the channel they
//! happened on.

use thiserror::Error;

use crate::notify::DeliveryError;
use crate::types::{Channel, ExitClass, INTERNAL_ERROR_CODE};

#[derive(Error, Debug)]
pub enum KristyError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("could not start process: {0}")]
    StartFailure(#[source] std::io::Error),

    #[error("process failed: {0}")]
    RunFailure(ExitClass),

    #[error("process failed: waiting for child: {0}")]
    WaitFailure(#[source] std::io::Error),

    #[error("{channel}: {source}")]
    Delivery {
        channel: Channel,
        #[source]
        source: DeliveryError,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KristyError {
    pub fn delivery(channel: Channel, source: DeliveryError) -> Self {
        KristyError::Delivery { channel, source }
    }

    /// Exit code implied by this error when it describes the command itself.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            KristyError::RunFailure(class) => Some(class.code()),
            KristyError::StartFailure(_) | KristyError::WaitFailure(_) => {
                Some(INTERNAL_ERROR_CODE)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, KristyError>;
