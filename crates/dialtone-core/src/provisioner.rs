// Provisioner facade.
//
// Wires store, generator, and reconciler into the mutation pipeline:
// validate → persist → regenerate → reload. One async write lock
// serializes mutations; readers take lock-free snapshots from an
// `ArcSwap` and never wait on a writer longer than the pointer swap.
// The lock is released before any switch traffic so a slow or failing
// reload cannot block the next mutation.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

use crate::asterisk::{GeneratedConfig, GenerationWarning, Generator, Reconciler};
use crate::config::{StoreConfig, SwitchConfig};
use crate::error::{CoreError, ReconcileError, ValidationError};
use crate::inventory::Inventory;
use crate::model::{MacAddr, OuiTable, Phone, PhoneUpdate, PhonebookEntry, SettingsUpdate};
use crate::store::InventoryStore;

/// How a mutation's switch reconciliation ended.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Config written and the switch reloaded (or integration is
    /// disabled and there was nothing to reload).
    Done,
    /// Config written but the switch could not be reloaded. The
    /// inventory change is durable; the switch is flagged out of sync.
    OutOfSync(ReconcileError),
}

/// Result of one pipeline run: the reconcile outcome plus any devices
/// the generator had to skip.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub sync: SyncOutcome,
    pub warnings: Vec<GenerationWarning>,
}

/// Point-in-time system state for the status surface.
#[derive(Debug, Clone)]
pub struct Status {
    pub phone_count: usize,
    pub phonebook_count: usize,
    pub switch_enabled: bool,
    /// Manager endpoint as `host:port`.
    pub switch_target: String,
    pub out_of_sync: bool,
}

/// Cheaply cloneable handle to the provisioning pipeline.
#[derive(Clone)]
pub struct Provisioner {
    inner: Arc<ProvisionerInner>,
}

struct ProvisionerInner {
    store: InventoryStore,
    generator: Generator,
    reconciler: Reconciler,
    snapshot: ArcSwap<Inventory>,
    write_lock: Mutex<()>,
    out_of_sync: watch::Sender<bool>,
}

impl Provisioner {
    /// Load the inventory and assemble the pipeline.
    pub fn open(
        store_config: StoreConfig,
        switch_config: SwitchConfig,
        oui_table: OuiTable,
    ) -> Result<Self, CoreError> {
        let store = InventoryStore::new(store_config);
        let inventory = store.load()?.with_oui_table(oui_table);
        info!(
            phones = inventory.phones().len(),
            phonebook_entries = inventory.phonebook.len(),
            "inventory loaded"
        );
        let generator = Generator::new(
            switch_config.dialplan_context.clone(),
            switch_config.dial_timeout_secs,
        );
        let (out_of_sync, _) = watch::channel(false);
        Ok(Self {
            inner: Arc::new(ProvisionerInner {
                store,
                generator,
                reconciler: Reconciler::new(switch_config),
                snapshot: ArcSwap::from_pointee(inventory),
                write_lock: Mutex::new(()),
                out_of_sync,
            }),
        })
    }

    /// Current inventory snapshot, lock-free.
    pub fn snapshot(&self) -> Arc<Inventory> {
        self.inner.snapshot.load_full()
    }

    /// Observe the out-of-sync flag.
    pub fn out_of_sync(&self) -> watch::Receiver<bool> {
        self.inner.out_of_sync.subscribe()
    }

    pub fn status(&self) -> Status {
        let snapshot = self.snapshot();
        let config = self.inner.reconciler.config();
        Status {
            phone_count: snapshot.phones().len(),
            phonebook_count: snapshot.phonebook.len(),
            switch_enabled: config.enabled,
            switch_target: format!("{}:{}", config.host, config.port),
            out_of_sync: *self.inner.out_of_sync.borrow(),
        }
    }

    // ── Mutation surface ────────────────────────────────────────────

    pub async fn add_phone(&self, phone: Phone) -> Result<PipelineOutcome, CoreError> {
        let mac = phone.mac.clone();
        let snapshot = self.commit(move |inventory| inventory.add_phone(phone)).await?;
        info!(mac = %mac, "phone added");
        self.reconcile(&snapshot).await
    }

    pub async fn update_phone(
        &self,
        mac: &MacAddr,
        update: PhoneUpdate,
    ) -> Result<PipelineOutcome, CoreError> {
        let snapshot = self
            .commit({
                let mac = mac.clone();
                move |inventory| inventory.update_phone(&mac, update)
            })
            .await?;
        info!(mac = %mac, "phone updated");
        self.reconcile(&snapshot).await
    }

    pub async fn remove_phone(&self, mac: &MacAddr) -> Result<PipelineOutcome, CoreError> {
        let snapshot = self
            .commit({
                let mac = mac.clone();
                move |inventory| inventory.remove_phone(&mac).map(drop)
            })
            .await?;
        info!(mac = %mac, "phone removed");
        self.reconcile(&snapshot).await
    }

    pub async fn update_settings(
        &self,
        update: SettingsUpdate,
    ) -> Result<PipelineOutcome, CoreError> {
        let snapshot = self
            .commit(move |inventory| {
                inventory.settings.apply(update);
                Ok(())
            })
            .await?;
        info!("global settings updated");
        self.reconcile(&snapshot).await
    }

    // Phonebook entries feed handset directories, not the switch:
    // persist only, no reconcile.

    pub async fn add_phonebook_entry(&self, entry: PhonebookEntry) -> Result<(), CoreError> {
        self.commit(move |inventory| inventory.add_phonebook_entry(entry))
            .await?;
        info!("phonebook entry added");
        Ok(())
    }

    pub async fn update_phonebook_entry(
        &self,
        index: usize,
        name: Option<String>,
        number: Option<String>,
    ) -> Result<(), CoreError> {
        self.commit(move |inventory| inventory.update_phonebook_entry(index, name, number))
            .await?;
        info!(index, "phonebook entry updated");
        Ok(())
    }

    pub async fn remove_phonebook_entry(&self, index: usize) -> Result<(), CoreError> {
        self.commit(move |inventory| inventory.remove_phonebook_entry(index).map(drop))
            .await?;
        info!(index, "phonebook entry removed");
        Ok(())
    }

    /// Regenerate and push switch config for the current snapshot.
    pub async fn sync(&self) -> Result<PipelineOutcome, CoreError> {
        let snapshot = self.snapshot();
        self.reconcile(&snapshot).await
    }

    /// Render both switch artifacts without writing anything.
    pub fn preview(&self) -> GeneratedConfig {
        self.inner.generator.generate(&self.snapshot())
    }

    /// Render one device's vendor provisioning file without writing
    /// anything.
    pub fn render_device(&self, mac: &MacAddr) -> Result<String, CoreError> {
        let snapshot = self.snapshot();
        let phone = snapshot
            .lookup(mac)
            .ok_or_else(|| ValidationError::NotFound { mac: mac.clone() })?;
        let vendor = snapshot.vendor_of(phone);
        let effective = snapshot.effective_settings(phone);
        Ok(vendor.render_config(&effective)?)
    }

    // ── Pipeline internals ──────────────────────────────────────────

    /// Build, validate, persist, and publish a new snapshot.
    ///
    /// Mutations run against a scratch clone; a validation or store
    /// failure leaves the published snapshot untouched.
    async fn commit<F>(&self, mutate: F) -> Result<Arc<Inventory>, CoreError>
    where
        F: FnOnce(&mut Inventory) -> Result<(), ValidationError> + Send,
    {
        let _guard = self.inner.write_lock.lock().await;
        let current = self.inner.snapshot.load_full();
        let mut next = Inventory::clone(current.as_ref());
        mutate(&mut next)?;
        self.inner.store.save(&next)?;
        let next = Arc::new(next);
        self.inner.snapshot.store(Arc::clone(&next));
        Ok(next)
    }

    /// Generate and reconcile for a snapshot, applying the
    /// `fail_on_switch_error` policy to the outcome.
    async fn reconcile(&self, snapshot: &Inventory) -> Result<PipelineOutcome, CoreError> {
        let generated = self.inner.generator.generate(snapshot);
        for warning in &generated.warnings {
            warn!(
                mac = %warning.mac,
                extension = %warning.extension,
                reason = %warning.reason,
                "device excluded from generated config"
            );
        }

        match self.inner.reconciler.reconcile(&generated).await {
            Ok(report) => {
                if report.reload_confirmed() {
                    self.inner.out_of_sync.send_replace(false);
                }
                Ok(PipelineOutcome {
                    sync: SyncOutcome::Done,
                    warnings: generated.warnings,
                })
            }
            // A config write failure aborted before any switch contact;
            // that is an error regardless of policy.
            Err(error @ ReconcileError::ConfigWrite { .. }) => Err(CoreError::Reconcile(error)),
            Err(error) => {
                self.inner.out_of_sync.send_replace(true);
                if self.inner.reconciler.config().fail_on_switch_error {
                    return Err(CoreError::Reconcile(error));
                }
                warn!(
                    error = %error,
                    "inventory persisted but switch reload failed; switch is out of sync"
                );
                Ok(PipelineOutcome {
                    sync: SyncOutcome::OutOfSync(error),
                    warnings: generated.warnings,
                })
            }
        }
    }
}
