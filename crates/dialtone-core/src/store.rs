// Atomic YAML persistence for inventory artifacts.
//
// Every write follows the same discipline: back up the current file,
// serialize to a temp file in the same directory, fsync, rename over
// the original, prune old backups. Loads fall back to the newest
// valid backup when the primary artifact is corrupt. I/O here is
// synchronous `std::fs`; callers serialize writes behind the
// provisioner's async lock and the artifacts are small.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::inventory::Inventory;

const BACKUP_DIR: &str = ".backups";

/// Durable storage for the phones artifact and the optional secrets
/// artifact.
pub struct InventoryStore {
    config: StoreConfig,
}

impl InventoryStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Load the inventory from disk.
    ///
    /// A missing primary artifact is a first run and yields an empty
    /// inventory. A corrupt primary artifact falls back to the newest
    /// backup that still parses and validates; if none does, the
    /// original error is returned.
    pub fn load(&self) -> Result<Inventory, StoreError> {
        let phones_path = &self.config.phones_path;
        if !phones_path.exists() {
            debug!(path = %phones_path.display(), "no inventory artifact yet, starting empty");
            return Ok(Inventory::default());
        }
        let secrets = self.read_secrets()?;
        match parse_artifact(phones_path, secrets.as_deref()) {
            Ok(inventory) => Ok(inventory),
            Err(error) => self.recover_from_backups(secrets.as_deref(), error),
        }
    }

    /// Durably persist the inventory and, when configured, the split
    /// secrets artifact.
    pub fn save(&self, inventory: &Inventory) -> Result<(), StoreError> {
        let split = self.config.secrets_path.is_some();
        let (phones_yaml, secrets_yaml) = inventory.to_documents(split)?;
        self.write_artifact(&self.config.phones_path, &phones_yaml)?;
        if let (Some(path), Some(yaml)) = (&self.config.secrets_path, secrets_yaml) {
            self.write_artifact(path, &yaml)?;
        }
        Ok(())
    }

    fn read_secrets(&self) -> Result<Option<String>, StoreError> {
        let Some(path) = &self.config.secrets_path else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(path)
            .map(Some)
            .map_err(|source| StoreError::Read {
                path: path.clone(),
                source,
            })
    }

    fn recover_from_backups(
        &self,
        secrets: Option<&str>,
        original: StoreError,
    ) -> Result<Inventory, StoreError> {
        for backup in list_backups(&self.config.phones_path) {
            match parse_artifact(&backup, secrets) {
                Ok(inventory) => {
                    warn!(
                        primary = %self.config.phones_path.display(),
                        backup = %backup.display(),
                        error = %original,
                        "inventory artifact is corrupt, recovered from backup"
                    );
                    return Ok(inventory);
                }
                Err(error) => {
                    debug!(backup = %backup.display(), error = %error, "backup rejected");
                }
            }
        }
        Err(original)
    }

    fn write_artifact(&self, path: &Path, contents: &str) -> Result<(), StoreError> {
        if let Some(parent) = nonempty_parent(path) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_owned(),
                source,
            })?;
        }
        if path.exists() {
            back_up(path)?;
        }
        write_atomic(path, contents).map_err(|source| StoreError::Write {
            path: path.to_owned(),
            source,
        })?;
        self.prune_backups(path);
        debug!(path = %path.display(), bytes = contents.len(), "artifact written");
        Ok(())
    }

    /// Delete backups beyond the retention count, oldest first.
    fn prune_backups(&self, artifact: &Path) {
        for stale in list_backups(artifact).iter().skip(self.config.backup_count) {
            match fs::remove_file(stale) {
                Ok(()) => debug!(backup = %stale.display(), "pruned old backup"),
                Err(error) => {
                    warn!(backup = %stale.display(), error = %error, "could not prune backup");
                }
            }
        }
    }
}

/// Read and validate one artifact (plus optional secrets overlay).
fn parse_artifact(path: &Path, secrets: Option<&str>) -> Result<Inventory, StoreError> {
    let raw = fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_owned(),
        source,
    })?;
    Inventory::from_documents(&raw, secrets).map_err(|source| StoreError::Corrupt {
        path: path.to_owned(),
        source,
    })
}

/// Copy the current file into `.backups/{stem}_{timestamp}{ext}`.
fn back_up(path: &Path) -> Result<PathBuf, StoreError> {
    let dir = backup_dir(path);
    fs::create_dir_all(&dir).map_err(|source| StoreError::Backup {
        path: dir.clone(),
        source,
    })?;
    let (stem, ext) = stem_and_ext(path);
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let backup_path = dir.join(format!("{stem}_{timestamp}{ext}"));
    fs::copy(path, &backup_path).map_err(|source| StoreError::Backup {
        path: path.to_owned(),
        source,
    })?;
    debug!(backup = %backup_path.display(), "backup created");
    Ok(backup_path)
}

/// Backups of `artifact`, newest first by modification time.
///
/// A missing or unreadable backup directory is treated as empty; load
/// recovery and pruning both degrade gracefully.
fn list_backups(artifact: &Path) -> Vec<PathBuf> {
    let (stem, ext) = stem_and_ext(artifact);
    let prefix = format!("{stem}_");
    let Ok(entries) = fs::read_dir(backup_dir(artifact)) else {
        return Vec::new();
    };
    let mut backups: Vec<(std::time::SystemTime, PathBuf)> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(&prefix) || !name.ends_with(&ext) {
                return None;
            }
            let modified = entry.metadata().ok()?.modified().ok()?;
            Some((modified, entry.path()))
        })
        .collect();
    backups.sort_by(|a, b| b.0.cmp(&a.0));
    backups.into_iter().map(|(_, path)| path).collect()
}

/// Write via a sibling temp file, fsync, then rename, so a reader can
/// never observe a half-written artifact. The temp file is removed on
/// failure; the original is only touched by the final rename.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    let written = (|| {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written
}

fn backup_dir(artifact: &Path) -> PathBuf {
    match nonempty_parent(artifact) {
        Some(parent) => parent.join(BACKUP_DIR),
        None => PathBuf::from(BACKUP_DIR),
    }
}

fn nonempty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|parent| !parent.as_os_str().is_empty())
}

fn stem_and_ext(path: &Path) -> (String, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, ext)
}
