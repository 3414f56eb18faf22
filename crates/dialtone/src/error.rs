//! CLI error types with miette diagnostics.
//!
//! Maps the pipeline's error taxonomy onto user-facing diagnostics
//! with stable error codes, and onto sysexits-style exit codes.

use miette::Diagnostic;
use thiserror::Error;

use dialtone_config::ConfigError;
use dialtone_core::{CoreError, ReconcileError, StoreError, ValidationError};

/// Process exit codes (BSD sysexits).
pub mod exit_code {
    pub const VALIDATION: i32 = 65; // EX_DATAERR
    pub const SWITCH: i32 = 69; // EX_UNAVAILABLE
    pub const IO: i32 = 74; // EX_IOERR
    pub const CONFIG: i32 = 78; // EX_CONFIG
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    /// A record was rejected before anything touched disk.
    #[error(transparent)]
    #[diagnostic(
        code(dialtone::inventory),
        help("Run: dialtone phone list to inspect the current inventory.")
    )]
    Inventory(#[from] ValidationError),

    /// Durable persistence failed; the previous artifact is intact.
    #[error(transparent)]
    #[diagnostic(code(dialtone::store))]
    Store(#[from] StoreError),

    /// The switch could not be reconciled. Any inventory change this
    /// run made is already saved.
    #[error(transparent)]
    #[diagnostic(
        code(dialtone::switch),
        help("The inventory is saved. Run: dialtone sync once the switch is reachable.")
    )]
    Switch(#[from] ReconcileError),

    #[error("failed to load configuration from {path}")]
    #[diagnostic(
        code(dialtone::config),
        help("Check the file (and any DIALTONE_* environment overrides) and try again.")
    )]
    Config {
        path: String,
        #[source]
        source: ConfigError,
    },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Inventory(_) => exit_code::VALIDATION,
            Self::Store(_) => exit_code::IO,
            Self::Switch(_) => exit_code::SWITCH,
            Self::Config { .. } => exit_code::CONFIG,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(source) => Self::Inventory(source),
            CoreError::Store(source) => Self::Store(source),
            CoreError::Reconcile(source) => Self::Switch(source),
        }
    }
}
