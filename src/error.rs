//! Error types shared across the fleetroute service.
//!
//! Library-level code raises typed errors; `anyhow` is reserved for the
//! CLI/server bootstrap. Every variant maps to one HTTP status so the API
//! layer never has to guess.

use thiserror::Error;

/// Main error type for fleetroute operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad request payload: missing field, mismatched array sizes, illegal
    /// time-window order, ambiguous coordinates.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unknown dataset, instance file, or other filesystem resource.
    #[error("not found: {0}")]
    NotFound(String),

    /// Unknown adapter or solver name (registry lookup failure).
    #[error("unknown plugin: {0}")]
    UnknownPlugin(String),

    /// An upstream distance-matrix provider failed (timeout, non-2xx,
    /// unparseable body). The upstream status text is preserved.
    #[error("matrix provider failure: {0}")]
    MatrixProvider(String),

    /// The normalized instance violates a hard precondition (capacity sum,
    /// reachability) before any engine runs.
    #[error("infeasible instance: {0}")]
    Infeasible(String),

    /// Backend-specific engine failure, including converted panics.
    #[error("engine '{engine}' failed: {detail}")]
    EngineInternal { engine: String, detail: String },

    /// The engine stopped before reaching an integer-feasible solution.
    #[error("engine '{engine}' stopped early: {detail}. Try increasing time_limit")]
    EngineStopped { engine: String, detail: String },

    /// File I/O while reading benchmark instances.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status code this error surfaces as: 400 bad input / unknown
    /// plugin, 404 filesystem, 502 upstream, 500 everything else.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidInput(_) | Error::UnknownPlugin(_) => 400,
            Error::NotFound(_) => 404,
            Error::MatrixProvider(_) => 502,
            Error::Infeasible(_)
            | Error::EngineInternal { .. }
            | Error::EngineStopped { .. }
            | Error::Io(_) => 500,
        }
    }
}

/// Convenience result type for fleetroute operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_error_kind() {
        assert_eq!(Error::InvalidInput("x".into()).status_code(), 400);
        assert_eq!(Error::UnknownPlugin("nope".into()).status_code(), 400);
        assert_eq!(Error::NotFound("ds".into()).status_code(), 404);
        assert_eq!(Error::MatrixProvider("504".into()).status_code(), 502);
        assert_eq!(Error::Infeasible("demand".into()).status_code(), 500);
        assert_eq!(
            Error::EngineStopped {
                engine: "milp".into(),
                detail: "no incumbent".into()
            }
            .status_code(),
            500
        );
    }

    #[test]
    fn engine_stopped_message_carries_a_remediation_hint() {
        let err = Error::EngineStopped {
            engine: "milp".into(),
            detail: "stopped at time limit".into(),
        };
        assert!(err.to_string().contains("time_limit"));
    }
}
