//! Error taxonomy for the distributor core.
//!
//! Fatal errors (configuration) abort startup; all other errors are local to
//! a single request or dispatch attempt and are reflected only through
//! counters and health-state transitions (see `health` and `counters`).

use thiserror::Error;

/// Errors that can occur while building the process configuration.
///
/// Any of these is fatal at startup — the process refuses to start rather
/// than run with a partially-valid analyzer set.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ANALYZERS_CONFIG record {0:?} has no weight (expected id:endpoint:weight)")]
    MissingWeight(String),

    #[error("ANALYZERS_CONFIG record {0:?} has an empty id or endpoint")]
    EmptyField(String),

    #[error("analyzer {id:?} has invalid weight {raw:?}: must be a finite number in (0, 1]")]
    InvalidWeight { id: String, raw: String },

    #[error("ANALYZERS_CONFIG declares duplicate analyzer id {0:?}")]
    DuplicateId(String),

    #[error("environment variable {name} has invalid value {value:?}: {reason}")]
    InvalidTunable {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors surfaced by the ingest boundary.
///
/// These never propagate past the HTTP handler; they are mapped directly to
/// a 4xx response and otherwise have no effect on the core's counters.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed request body: {0}")]
    MalformedJson(String),

    #[error("packet has no messages")]
    EmptyMessages,
}
