//! Operator configuration for the dialtone CLI.
//!
//! TOML file + `DIALTONE_`-prefixed environment overrides, translated
//! into the `dialtone_core` pipeline configs. The AMI secret is wrapped
//! in a `SecretString` during translation and is never logged or
//! written back out.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dialtone_core::{OuiTable, StoreConfig, SwitchConfig, Vendor};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error(
        "asterisk.secret is required when asterisk.enabled is true \
         (set it in the config file or via DIALTONE_ASTERISK__SECRET)"
    )]
    NoSecret,

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level operator configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Inventory artifact locations and retention.
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Switch integration settings.
    #[serde(default)]
    pub asterisk: AsteriskConfig,

    /// Vendor OUI table: `vendors.<name> = ["001565", …]`. An entry
    /// replaces that vendor's default prefix list wholesale.
    #[serde(default = "default_vendors")]
    pub vendors: HashMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inventory: InventoryConfig::default(),
            asterisk: AsteriskConfig::default(),
            vendors: default_vendors(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct InventoryConfig {
    /// Main inventory artifact. Relative paths resolve against the
    /// config file's directory.
    #[serde(default = "default_phones_path")]
    pub phones_path: PathBuf,

    /// Separate credential artifact. When unset, device passwords stay
    /// inline in the main artifact.
    pub secrets_path: Option<PathBuf>,

    /// Timestamped backups kept per artifact.
    #[serde(default = "default_backup_count")]
    pub backup_count: usize,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            phones_path: default_phones_path(),
            secrets_path: None,
            backup_count: default_backup_count(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AsteriskConfig {
    /// When false, generated files are still written but the switch is
    /// never contacted.
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_host")]
    pub host: String,

    /// Manager (AMI) port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Manager username. Required once `enabled` is set.
    #[serde(default)]
    pub username: String,

    /// Manager secret (plaintext here — prefer the
    /// `DIALTONE_ASTERISK__SECRET` environment variable).
    pub secret: Option<String>,

    #[serde(default = "default_pjsip_path")]
    pub pjsip_path: PathBuf,

    #[serde(default = "default_extensions_path")]
    pub extensions_path: PathBuf,

    /// Dialplan context the generated extensions land in.
    #[serde(default = "default_dialplan_context")]
    pub dialplan_context: String,

    /// Ring time per generated Dial() step.
    #[serde(default = "default_dial_timeout")]
    pub dial_timeout_secs: u32,

    /// When true a failed reload fails the inventory mutation; when
    /// false the mutation succeeds and the switch is flagged
    /// out-of-sync.
    #[serde(default)]
    pub fail_on_switch_error: bool,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Per-action AMI deadline (connect, login, each reload).
    #[serde(default = "default_action_timeout")]
    pub action_timeout_secs: u64,
}

impl Default for AsteriskConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_port(),
            username: String::new(),
            secret: None,
            pjsip_path: default_pjsip_path(),
            extensions_path: default_extensions_path(),
            dialplan_context: default_dialplan_context(),
            dial_timeout_secs: default_dial_timeout(),
            fail_on_switch_error: false,
            retry_attempts: default_retry_attempts(),
            retry_delay_secs: default_retry_delay(),
            action_timeout_secs: default_action_timeout(),
        }
    }
}

fn default_phones_path() -> PathBuf {
    PathBuf::from("inventory/phones.yml")
}
fn default_backup_count() -> usize {
    10
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    5038
}
fn default_pjsip_path() -> PathBuf {
    PathBuf::from("/etc/asterisk/pjsip_dialtone.conf")
}
fn default_extensions_path() -> PathBuf {
    PathBuf::from("/etc/asterisk/extensions_dialtone.conf")
}
fn default_dialplan_context() -> String {
    "internal".into()
}
fn default_dial_timeout() -> u32 {
    20
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    2
}
fn default_action_timeout() -> u64 {
    5
}

fn default_vendors() -> HashMap<String, Vec<String>> {
    HashMap::from([
        (
            "yealink".to_string(),
            vec!["001565".to_string(), "805E0C".to_string(), "805EC0".to_string()],
        ),
        (
            "fanvil".to_string(),
            vec!["0C383E".to_string(), "7C2F80".to_string()],
        ),
    ])
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "dialtone", "dialtone").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("dialtone");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load configuration from `path` layered over built-in defaults, with
/// `DIALTONE_`-prefixed environment variables on top
/// (`DIALTONE_ASTERISK__HOST` → `asterisk.host`). A missing file is
/// not an error; the defaults stand.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DIALTONE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Translation to pipeline configs ─────────────────────────────────

impl Config {
    /// Build the persistence config. Relative artifact paths resolve
    /// against `base` (the config file's directory).
    pub fn store_config(&self, base: &Path) -> StoreConfig {
        StoreConfig {
            phones_path: resolve_path(base, &self.inventory.phones_path),
            secrets_path: self
                .inventory
                .secrets_path
                .as_deref()
                .map(|path| resolve_path(base, path)),
            backup_count: self.inventory.backup_count,
        }
    }

    /// Build the switch integration config. Credentials are validated
    /// here so an enabled switch never gets as far as a doomed login.
    pub fn switch_config(&self, base: &Path) -> Result<SwitchConfig, ConfigError> {
        let asterisk = &self.asterisk;
        if asterisk.enabled && asterisk.username.is_empty() {
            return Err(ConfigError::Validation {
                field: "asterisk.username".into(),
                reason: "required when asterisk.enabled is true".into(),
            });
        }
        let secret = match &asterisk.secret {
            Some(secret) => SecretString::from(secret.clone()),
            None if asterisk.enabled => return Err(ConfigError::NoSecret),
            None => SecretString::from(String::new()),
        };

        Ok(SwitchConfig {
            enabled: asterisk.enabled,
            host: asterisk.host.clone(),
            port: asterisk.port,
            username: asterisk.username.clone(),
            secret,
            pjsip_path: resolve_path(base, &asterisk.pjsip_path),
            extensions_path: resolve_path(base, &asterisk.extensions_path),
            dialplan_context: asterisk.dialplan_context.clone(),
            dial_timeout_secs: asterisk.dial_timeout_secs,
            fail_on_switch_error: asterisk.fail_on_switch_error,
            retry_attempts: asterisk.retry_attempts,
            retry_delay: Duration::from_secs(asterisk.retry_delay_secs),
            action_timeout: Duration::from_secs(asterisk.action_timeout_secs),
        })
    }

    /// Build the vendor detection table from the `vendors` section.
    /// Names must be supported vendors; prefixes must be 6 hex digits.
    pub fn oui_table(&self) -> Result<OuiTable, ConfigError> {
        let mut table = OuiTable::empty();
        for (name, prefixes) in &self.vendors {
            let vendor = name
                .parse::<Vendor>()
                .ok()
                .filter(|vendor| *vendor != Vendor::Unknown)
                .ok_or_else(|| ConfigError::Validation {
                    field: format!("vendors.{name}"),
                    reason: "not a supported vendor (expected 'yealink' or 'fanvil')".into(),
                })?;
            for prefix in prefixes {
                table
                    .insert(prefix, vendor)
                    .map_err(|error| ConfigError::Validation {
                        field: format!("vendors.{name}"),
                        reason: error.to_string(),
                    })?;
            }
        }
        Ok(table)
    }
}

fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
