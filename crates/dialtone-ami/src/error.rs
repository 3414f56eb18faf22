use thiserror::Error;

/// Top-level error type for the `dialtone-ami` crate.
///
/// Covers every failure mode of a manager session: connecting, the
/// greeting/login exchange, and action round-trips. `dialtone-core`
/// maps these into reconciliation outcomes.
#[derive(Debug, Error)]
pub enum Error {
    // ── Connection ──────────────────────────────────────────────────
    /// TCP connect to the manager port failed.
    #[error("Connection to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// I/O error on an established manager connection.
    #[error("Manager connection I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The switch closed the connection mid-exchange.
    #[error("Connection closed by the switch")]
    ConnectionClosed,

    // ── Protocol ────────────────────────────────────────────────────
    /// The peer did not speak the expected manager protocol.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (wrong username/secret, or insufficient privileges).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Actions ─────────────────────────────────────────────────────
    /// No correlated response arrived before the per-action deadline.
    #[error("{action} timed out after {timeout_secs}s")]
    Timeout { action: String, timeout_secs: u64 },

    /// The switch answered the action with `Response: Error`.
    #[error("{action} rejected by the switch: {message}")]
    ActionFailed { action: String, message: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Io(_) | Self::ConnectionClosed | Self::Timeout { .. }
        )
    }

    /// Returns `true` if this error means the credentials were rejected.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}
