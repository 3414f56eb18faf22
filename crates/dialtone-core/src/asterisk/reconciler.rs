// Switch reconciler.
//
// Takes generated config, puts it where the switch reads it, and
// drives the switch to reload. Each run is an explicit state machine
// with a transition log, so retry count, delay, and terminal policy
// are each independently testable. The connect-auth-reload sequence
// retries as a unit; the config write happens once, before any network
// contact, and aborts the run if it fails.

use std::path::Path;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use dialtone_ami::AmiClient;

use crate::asterisk::generator::GeneratedConfig;
use crate::config::SwitchConfig;
use crate::error::ReconcileError;
use crate::store::write_atomic;

/// States a reconciliation run moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ReconcileState {
    Idle,
    ConfigWritten,
    ConnectAttempted,
    Authenticated,
    AuthFailed,
    ReloadSent,
    ReloadConfirmed,
    ReloadTimedOut,
    Done,
    Failed,
}

/// Outcome of a completed reconciliation, with the transition log.
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    pub final_state: ReconcileState,
    /// Connect-auth-reload attempts made; 0 when integration is
    /// disabled and the switch was never contacted.
    pub attempts: u32,
    pub transitions: Vec<ReconcileState>,
}

impl ReconcileReport {
    /// True when the switch acknowledged both reloads during this run.
    pub fn reload_confirmed(&self) -> bool {
        self.transitions.contains(&ReconcileState::ReloadConfirmed)
    }
}

/// Pushes generated config to disk and reloads the switch over AMI.
pub struct Reconciler {
    config: SwitchConfig,
}

impl Reconciler {
    pub fn new(config: SwitchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SwitchConfig {
        &self.config
    }

    /// Write both artifacts and drive the switch through a reload.
    ///
    /// With integration disabled the run completes as `Done` right
    /// after the config write, without touching the network.
    pub async fn reconcile(
        &self,
        generated: &GeneratedConfig,
    ) -> Result<ReconcileReport, ReconcileError> {
        let mut transitions = vec![ReconcileState::Idle];

        write_config(&self.config.pjsip_path, &generated.pjsip)?;
        write_config(&self.config.extensions_path, &generated.extensions)?;
        transitions.push(ReconcileState::ConfigWritten);
        debug!(
            pjsip = %self.config.pjsip_path.display(),
            extensions = %self.config.extensions_path.display(),
            "switch configuration written"
        );

        if !self.config.enabled {
            transitions.push(ReconcileState::Done);
            debug!("switch integration disabled, skipping reload");
            return Ok(ReconcileReport {
                final_state: ReconcileState::Done,
                attempts: 0,
                transitions,
            });
        }

        let attempts_allowed = self.config.retry_attempts.max(1);
        let mut attempt = 0;
        let last_error = loop {
            attempt += 1;
            match self.reload_once(&mut transitions).await {
                Ok(()) => {
                    transitions.push(ReconcileState::Done);
                    info!(attempt, "switch reload confirmed");
                    return Ok(ReconcileReport {
                        final_state: ReconcileState::Done,
                        attempts: attempt,
                        transitions,
                    });
                }
                Err(error) if attempt < attempts_allowed => {
                    warn!(
                        attempt,
                        attempts_allowed,
                        transient = error.is_transient(),
                        error = %error,
                        "switch reload attempt failed, retrying in {}s",
                        self.config.retry_delay.as_secs()
                    );
                    sleep(self.config.retry_delay).await;
                }
                Err(error) => {
                    warn!(
                        attempt,
                        attempts_allowed,
                        transient = error.is_transient(),
                        error = %error,
                        "switch reload attempt failed"
                    );
                    break error;
                }
            }
        };

        transitions.push(ReconcileState::Failed);
        Err(ReconcileError::ReloadFailed {
            attempts: attempt,
            final_state: ReconcileState::Failed,
            source: last_error,
        })
    }

    /// One connect-auth-reload pass. Transition entries are appended
    /// as the pass progresses so a failed run still shows how far it
    /// got.
    async fn reload_once(
        &self,
        transitions: &mut Vec<ReconcileState>,
    ) -> Result<(), dialtone_ami::Error> {
        transitions.push(ReconcileState::ConnectAttempted);
        let mut client = AmiClient::connect(
            &self.config.host,
            self.config.port,
            self.config.action_timeout,
        )
        .await?;
        debug!(protocol = client.protocol_version(), "connected to switch manager");

        match client.login(&self.config.username, &self.config.secret).await {
            Ok(()) => transitions.push(ReconcileState::Authenticated),
            Err(error) => {
                transitions.push(ReconcileState::AuthFailed);
                return Err(error);
            }
        }

        transitions.push(ReconcileState::ReloadSent);
        if let Err(error) = client.pjsip_reload().await {
            transitions.push(ReconcileState::ReloadTimedOut);
            return Err(error);
        }
        if let Err(error) = client.dialplan_reload().await {
            transitions.push(ReconcileState::ReloadTimedOut);
            return Err(error);
        }
        transitions.push(ReconcileState::ReloadConfirmed);

        client.logoff().await;
        Ok(())
    }
}

/// Temp-then-rename write so the switch never reads a partial file.
fn write_config(path: &Path, contents: &str) -> Result<(), ReconcileError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ReconcileError::ConfigWrite {
            path: parent.to_owned(),
            source,
        })?;
    }
    write_atomic(path, contents).map_err(|source| ReconcileError::ConfigWrite {
        path: path.to_owned(),
        source,
    })
}
