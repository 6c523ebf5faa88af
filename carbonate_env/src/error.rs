//! Error types for the carbonate simulator.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, CarbonateError>;

/// Errors that can occur while loading inputs, building or running a model.
#[derive(Debug, Error)]
pub enum CarbonateError {
    /// Missing or malformed configuration field (fatal before any state is built)
    #[error("Config error in `{field}`: {message}")]
    Config { field: String, message: String },

    /// A row of a delimited input could not be parsed
    #[error("Format error in {origin} line {line}: {message} (row: {row:?})")]
    Format {
        origin: String,
        line: usize,
        row: String,
        message: String,
    },

    /// Dense field shape differs from the declared grid
    #[error("Dimension mismatch for {what}: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        what: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// A construction parameter is outside its valid domain
    #[error("Invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    /// Requested chron count does not fit in the stratigraphic column
    #[error("Capacity exceeded: {requested} chrons requested, column holds {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },

    /// Sea-level query outside the sampled curve with extrapolation rejected
    #[error("Time {time} outside sea-level curve range [{min}, {max}]")]
    OutOfRange { time: f64, min: f64, max: f64 },

    /// Operation not valid in the engine's current state
    #[error("Invalid state: {operation} requires {expected}, engine is {actual}")]
    InvalidState {
        operation: &'static str,
        expected: &'static str,
        actual: String,
    },

    /// Filesystem access failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CarbonateError {
    /// Creates a configuration error for a field.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a format error for a row of a delimited input.
    pub fn format(
        origin: impl Into<String>,
        line: usize,
        row: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Format {
            origin: origin.into(),
            line,
            row: row.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid-parameter error.
    pub fn invalid(
        name: impl Into<String>,
        value: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
