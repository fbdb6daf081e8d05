//! Error handling for batch lookup operations.
//!
//! This module defines one error type covering every way a run can fail,
//! from fatal setup problems (bad configuration, unwritable output) down to
//! per-file and per-hostname failures that are handled locally.

use std::fmt;
use std::time::Duration;

/// Main error type for lookup operations.
///
/// Only `ConfigError`, `OutputFile` and `Internal` abort a run. The other
/// variants describe failures that stay inside one worker and surface in
/// the run report, the log or the output file.
#[derive(Debug, Clone)]
pub enum LookupError {
    /// Invalid settings (capacity, thread count, marker, timeout, ...)
    ConfigError {
        message: String,
    },

    /// The shared output file cannot be opened or flushed
    OutputFile {
        path: String,
        message: String,
    },

    /// One input file cannot be opened or read
    InputFile {
        path: String,
        message: String,
    },

    /// Config files and other auxiliary files
    FileError {
        path: String,
        message: String,
    },

    /// A single lookup ran past its deadline
    Timeout {
        hostname: String,
        duration: Duration,
    },

    /// A single lookup failed for a reason other than "no such host"
    ResolutionFailed {
        hostname: String,
        message: String,
    },

    /// Generic internal errors that don't fit other categories
    Internal {
        message: String,
    },
}

impl LookupError {
    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new output file error.
    pub fn output_file<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::OutputFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new input file error.
    pub fn input_file<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::InputFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new lookup timeout error.
    pub fn timeout<H: Into<String>>(hostname: H, duration: Duration) -> Self {
        Self::Timeout {
            hostname: hostname.into(),
            duration,
        }
    }

    /// Create a new resolution failure.
    pub fn resolution<H: Into<String>, M: Into<String>>(hostname: H, message: M) -> Self {
        Self::ResolutionFailed {
            hostname: hostname.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error stops the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigError { .. } | Self::OutputFile { .. } | Self::Internal { .. }
        )
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::OutputFile { path, message } => {
                write!(f, "Output file error at '{}': {}", path, message)
            }
            Self::InputFile { path, message } => {
                write!(f, "Input file error at '{}': {}", path, message)
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Timeout { hostname, duration } => {
                write!(f, "Timeout after {:?} resolving '{}'", duration, hostname)
            }
            Self::ResolutionFailed { hostname, message } => {
                write!(f, "Resolution failed for '{}': {}", hostname, message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for LookupError {}

impl From<std::io::Error> for LookupError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<toml::de::Error> for LookupError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}
