//! Error types for beam-training operations
//!
//! Errors fall into a small taxonomy:
//! - **Protocol** violations: a collaborator delivered a signal for a link that
//!   never started training, or in a phase that cannot accept it. Fatal.
//! - **Contract** violations: a caller broke a precondition of a pure function
//!   (e.g. a minimum over zero streams). Fatal.
//! - **Validation** / **Config**: bad input values or run configuration.
//! - **External**: trace output and scenario I/O.
//!
//! Degenerate measurement sets (empty feedback maps, fewer than K valid
//! combinations) are not errors; the reducer returns a shorter list.
//!
//! # Example
//!
//! ```rust
//! use beamtrain_core::error::{BeamError, ErrorCategory};
//!
//! let err = BeamError::UnknownLink { src: 2, dst: 1 };
//! assert_eq!(err.category(), ErrorCategory::Protocol);
//! assert!(err.is_fatal());
//! assert_eq!(err.error_code(), "UNKNOWN_LINK");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for beam-training operations
pub type Result<T> = std::result::Result<T, BeamError>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A collaborator signal violated the phase protocol
    Protocol,
    /// A caller violated a function precondition
    Contract,
    /// Input value out of range
    Validation,
    /// Run configuration rejected
    Config,
    /// Trace output or scenario I/O failed
    External,
    /// Internal error
    Internal,
}

/// Errors that can occur while coordinating beam training
#[derive(Error, Debug)]
pub enum BeamError {
    // ═══════════════════════════════════════════════════════════════════════
    // Protocol violations (fatal: the collaborator broke its contract)
    // ═══════════════════════════════════════════════════════════════════════

    /// A phase signal arrived for a station pair that never started training
    #[error("No training state for link {src} -> {dst}. Phase signals are only valid after a sector sweep completed for the pair.")]
    UnknownLink { src: u32, dst: u32 },

    /// A signal named a station that is not part of the run
    #[error("Unknown station {station}. Register every station before dispatching signals.")]
    UnknownStation { station: u32 },

    /// A signal arrived while the link was in a phase that cannot accept it
    #[error("Out-of-order signal '{signal}' for link {src} -> {dst} in phase {phase}")]
    OutOfOrderSignal {
        src: u32,
        dst: u32,
        signal: String,
        phase: String,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Contract violations
    // ═══════════════════════════════════════════════════════════════════════

    /// Minimum-stream SNR requested for a combination with no streams
    #[error("Minimum-stream SNR over zero streams is undefined")]
    EmptyStreams,

    /// Antenna counts must both be positive
    #[error("Invalid antenna counts: n_tx={n_tx}, n_rx={n_rx}. Both must be positive.")]
    InvalidAntennaCount { n_tx: u8, n_rx: u8 },

    // ═══════════════════════════════════════════════════════════════════════
    // Validation and configuration
    // ═══════════════════════════════════════════════════════════════════════

    /// SNR ratio was negative or not a number
    #[error("Invalid SNR ratio {value}: must be a finite, non-negative linear ratio")]
    InvalidSnr { value: f64 },

    /// Run configuration rejected
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Scenario description could not be used
    #[error("Invalid scenario: {reason}")]
    ScenarioError { reason: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Infrastructure errors (trace output, serialization)
    // ═══════════════════════════════════════════════════════════════════════

    /// Writing a trace file failed
    #[error("Trace output error at '{path}': {message}")]
    TraceIo { path: String, message: String },

    /// JSON serialization or deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error that shouldn't happen
    #[error("Internal error: {reason}. This is a bug; please report it.")]
    Internal { reason: String },
}

impl BeamError {
    /// Returns true if this error must abort the run
    ///
    /// Protocol and contract violations mean the event stream can no longer
    /// be trusted. I/O and configuration errors are surfaced to the caller,
    /// which decides whether to continue.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Protocol | ErrorCategory::Contract | ErrorCategory::Internal
        )
    }

    /// Returns the error category for grouping
    pub fn category(&self) -> ErrorCategory {
        match self {
            BeamError::UnknownLink { .. }
            | BeamError::UnknownStation { .. }
            | BeamError::OutOfOrderSignal { .. } => ErrorCategory::Protocol,

            BeamError::EmptyStreams | BeamError::InvalidAntennaCount { .. } => {
                ErrorCategory::Contract
            }

            BeamError::InvalidSnr { .. } => ErrorCategory::Validation,

            BeamError::InvalidConfig { .. } | BeamError::ScenarioError { .. } => {
                ErrorCategory::Config
            }

            BeamError::TraceIo { .. } | BeamError::Json(_) => ErrorCategory::External,

            BeamError::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            BeamError::UnknownLink { .. } => "UNKNOWN_LINK",
            BeamError::UnknownStation { .. } => "UNKNOWN_STATION",
            BeamError::OutOfOrderSignal { .. } => "OUT_OF_ORDER_SIGNAL",
            BeamError::EmptyStreams => "EMPTY_STREAMS",
            BeamError::InvalidAntennaCount { .. } => "INVALID_ANTENNA_COUNT",
            BeamError::InvalidSnr { .. } => "INVALID_SNR",
            BeamError::InvalidConfig { .. } => "INVALID_CONFIG",
            BeamError::ScenarioError { .. } => "SCENARIO_ERROR",
            BeamError::TraceIo { .. } => "TRACE_IO",
            BeamError::Json(_) => "JSON_ERROR",
            BeamError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Process exit code the CLI uses for this error
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Protocol | ErrorCategory::Contract => 3,
            ErrorCategory::Validation | ErrorCategory::Config => 2,
            ErrorCategory::External => 4,
            ErrorCategory::Internal => 70,
        }
    }

    pub(crate) fn trace_io(path: &std::path::Path, err: std::io::Error) -> Self {
        BeamError::TraceIo {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_errors_are_fatal() {
        assert!(BeamError::UnknownLink { src: 1, dst: 0 }.is_fatal());
        assert!(BeamError::OutOfOrderSignal {
            src: 1,
            dst: 0,
            signal: "mimo_phase_complete".to_string(),
            phase: "SisoFeedback".to_string(),
        }
        .is_fatal());
        assert!(BeamError::EmptyStreams.is_fatal());
    }

    #[test]
    fn test_external_errors_are_not_fatal() {
        let err = BeamError::TraceIo {
            path: "/nope".to_string(),
            message: "denied".to_string(),
        };
        assert!(!err.is_fatal());
        assert_eq!(err.category(), ErrorCategory::External);
        assert!(!BeamError::InvalidConfig { reason: "x".to_string() }.is_fatal());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(BeamError::EmptyStreams.error_code(), "EMPTY_STREAMS");
        assert_eq!(
            BeamError::InvalidSnr { value: -1.0 }.error_code(),
            "INVALID_SNR"
        );
        assert_eq!(BeamError::UnknownStation { station: 9 }.exit_code(), 3);
    }

    #[test]
    fn test_error_messages_are_helpful() {
        let msg = BeamError::UnknownLink { src: 2, dst: 1 }.to_string();
        assert!(msg.contains("2 -> 1"));
        assert!(msg.contains("sector sweep"));
    }
}
