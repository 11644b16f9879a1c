// src/engine/aggregate.rs

//! Merging failures from every part of a run into one reported error.

use std::fmt;

use crate::errors::KristyError;
use crate::types::FailureSource;

/// One failure and where it came from.
#[derive(Debug)]
pub struct Failure {
    pub source: FailureSource,
    pub error: KristyError,
}

/// All failures of a run, in the order they were supplied.
///
/// Never empty: [`AggregateError::merge`] returns `None` instead.
#[derive(Debug)]
pub struct AggregateError {
    failures: Vec<Failure>,
}

impl AggregateError {
    /// Collect the present failures; `None` if every entry is absent.
    pub fn merge<I>(parts: I) -> Option<Self>
    where
        I: IntoIterator<Item = (FailureSource, Option<KristyError>)>,
    {
        let failures: Vec<Failure> = parts
            .into_iter()
            .filter_map(|(source, error)| error.map(|error| Failure { source, error }))
            .collect();

        if failures.is_empty() {
            None
        } else {
            Some(Self { failures })
        }
    }

    /// Like [`merge`](Self::merge), but as a `Result`.
    pub fn check<I>(parts: I) -> Result<(), Self>
    where
        I: IntoIterator<Item = (FailureSource, Option<KristyError>)>,
    {
        match Self::merge(parts) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn sources(&self) -> impl Iterator<Item = FailureSource> + '_ {
        self.failures.iter().map(|f| f.source)
    }

    pub fn has(&self, source: FailureSource) -> bool {
        self.sources().any(|s| s == source)
    }

    /// The exit code of the command itself.
    ///
    /// Notification failures never change it: if the command succeeded and
    /// only delivery failed, this is 0.
    pub fn exit_code(&self) -> i32 {
        self.failures
            .iter()
            .filter(|f| f.source == FailureSource::Execution)
            .find_map(|f| f.error.exit_code())
            .unwrap_or(0)
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|f| &f.error as &(dyn std::error::Error + 'static))
    }
}
