// Runtime configuration for the provisioning pipeline.
//
// These types say where the inventory lives and how to reach the
// switch. Built by the CLI from operator config and handed to
// `Provisioner::open` — the core never reads config files itself.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// Where the inventory artifacts live and how many backups to keep.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Primary artifact: devices, global settings, phonebook.
    pub phones_path: PathBuf,
    /// Optional secrets artifact. When set, device credentials are
    /// kept here and stripped from the primary artifact on save.
    pub secrets_path: Option<PathBuf>,
    /// Timestamped backups retained per artifact.
    pub backup_count: usize,
}

/// Switch integration: generated-file targets, the manager endpoint,
/// and the retry policy.
#[derive(Debug, Clone)]
pub struct SwitchConfig {
    /// When false, config files are still written but the switch is
    /// never contacted.
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub secret: SecretString,
    /// Target path for the generated endpoint definitions.
    pub pjsip_path: PathBuf,
    /// Target path for the generated dialplan.
    pub extensions_path: PathBuf,
    pub dialplan_context: String,
    pub dial_timeout_secs: u32,
    /// When true, a failed reload fails the whole mutation. When
    /// false, the mutation succeeds and the out-of-sync flag is set.
    pub fail_on_switch_error: bool,
    /// Connect-auth-reload attempts before giving up.
    pub retry_attempts: u32,
    /// Pause between attempts.
    pub retry_delay: Duration,
    /// Deadline for each protocol step (connect, greeting, action).
    pub action_timeout: Duration,
}
