// dialtone-core: inventory model, atomic persistence, switch config
// generation, and AMI reconciliation for the dialtone provisioning
// pipeline.
//
// The `Provisioner` facade is the intended entry point: it owns the
// store, the generator, and the reconciler, and drives the
// validate → persist → regenerate → reload pipeline for every
// mutation. The lower layers are public for direct use and testing.

pub mod asterisk;
pub mod config;
pub mod error;
pub mod inventory;
pub mod model;
pub mod provisioner;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────

pub use asterisk::{
    GeneratedConfig, GenerationWarning, Generator, ReconcileReport, ReconcileState, Reconciler,
};
pub use config::{StoreConfig, SwitchConfig};
pub use error::{CoreError, ReconcileError, StoreError, ValidationError};
pub use inventory::Inventory;
pub use model::{
    DEFAULT_PHONEBOOK_TITLE, EffectiveSettings, GlobalSettings, MacAddr, MacStyle, OuiTable, Phone,
    PhoneUpdate, PhonebookEntry, SettingsUpdate, Transport, Vendor,
};
pub use provisioner::{PipelineOutcome, Provisioner, Status, SyncOutcome};
pub use store::InventoryStore;
