// Error taxonomy for the provisioning core.
//
// One enum per pipeline stage: `ValidationError` rejects a record
// before anything touches disk, `StoreError` covers durable
// persistence, and `ReconcileError` is the summarized terminal failure
// of a switch reload. `CoreError` is the union the `Provisioner`
// facade returns; the CLI maps its variants to exit codes.

use std::path::PathBuf;

use thiserror::Error;

use crate::asterisk::ReconcileState;
use crate::model::MacAddr;

/// A record rejected before any write.
///
/// Messages are field-level and name the offending device so the
/// operator can fix the record from the error text alone.
#[derive(Debug, Error)]
pub enum ValidationError {
    // ── Field shape ─────────────────────────────────────────────────
    /// Input did not reduce to 12 hex digits.
    #[error("{input:?} is not a valid MAC address (expected 12 hex digits; `:`, `-` and `.` separators allowed)")]
    InvalidMac { input: String },

    /// A vendor-table prefix did not reduce to 6 hex digits.
    #[error("{input:?} is not a valid OUI prefix (expected 6 hex digits)")]
    InvalidOui { input: String },

    /// A required device field is empty.
    #[error("phone {mac}: {field} must not be empty")]
    MissingField { mac: MacAddr, field: &'static str },

    /// Extensions must be dialable, so digits only.
    #[error("phone {mac}: extension {extension:?} must contain only digits")]
    InvalidExtension { mac: MacAddr, extension: String },

    // ── Referential ─────────────────────────────────────────────────
    /// The MAC is already taken by another device.
    #[error("a phone with MAC {mac} already exists (extension {extension})")]
    DuplicateMac { mac: MacAddr, extension: String },

    /// No device with this MAC in the inventory.
    #[error("no phone with MAC {mac}")]
    NotFound { mac: MacAddr },

    /// No phonebook entry at this 1-based index.
    #[error("no phonebook entry with index {index}")]
    PhonebookEntryNotFound { index: usize },

    /// Phonebook entries need both a name and a number.
    #[error("phonebook entry: {field} must not be empty")]
    EmptyPhonebookField { field: &'static str },

    // ── Vendor dispatch ─────────────────────────────────────────────
    /// Device config rendering refuses to guess a format.
    #[error("phone {mac}: cannot render device config for unrecognized vendor (model {model:?})")]
    UnknownVendor { mac: MacAddr, model: String },

    /// Phonebook rendering refuses to guess a format.
    #[error("phonebook rendering requires a recognized vendor")]
    UnknownPhonebookVendor,

    // ── Document parsing ────────────────────────────────────────────
    /// The artifact is not parseable YAML of the expected shape.
    #[error("malformed inventory document: {0}")]
    Document(#[from] serde_yaml::Error),
}

/// Durable persistence failure.
///
/// Every variant leaves the previously committed artifact intact; the
/// write discipline is backup, temp file, fsync, rename.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot back up {path}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact parsed from disk failed validation.
    #[error("{path} is not a valid inventory artifact: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    #[error("cannot serialize inventory: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Terminal outcome of a failed reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Generated config could not be written. The switch was never
    /// contacted; a reload must not run against a partial config.
    #[error("cannot write switch config {path}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The connect-auth-reload sequence failed on every attempt.
    #[error("switch reload failed after {attempts} attempt(s): {source}")]
    ReloadFailed {
        attempts: u32,
        final_state: ReconcileState,
        #[source]
        source: dialtone_ami::Error,
    },
}

/// Union error returned by the `Provisioner` facade.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}
