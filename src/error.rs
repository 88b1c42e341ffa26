//! Error types.
//!
//! Only [`Error`] is fatal: it covers start-up failures that stop the process
//! before the sampling loop runs. The per-field errors are caught inside the
//! sampler and turned into `unknown` fields.

use std::path::PathBuf;

use thiserror::Error;

/// Start-up failures. Any of these ends the process with exit code 1.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no network interfaces found on this host")]
    NoInterfaces,

    #[error("cannot open log file {}: {source}", .path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("required command `{0}` was not found on PATH")]
    MissingCapability(&'static str),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Public IP lookup failure.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("lookup service answered with HTTP {0}")]
    Status(u16),

    #[error("lookup service returned a body that is not an IP address: {0:?}")]
    InvalidBody(String),
}

/// Reachability probe failure.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("probe did not finish within {0} ms")]
    Timeout(u64),
}

/// A log line that does not follow the fixed record format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected 7 fields, found {0}")]
    FieldCount(usize),

    #[error("field {index} should start with `{expected}`")]
    Label { index: usize, expected: &'static str },

    #[error("invalid timestamp {0:?}")]
    Timestamp(String),

    #[error("invalid IP address {0:?}")]
    Ip(String),

    #[error("invalid status {0:?}")]
    Status(String),

    #[error("invalid latency {0:?}")]
    Latency(String),
}
