// Domain model: devices, settings, phonebook, vendors.

pub mod mac;
pub mod phone;
pub mod phonebook;
pub mod settings;
pub mod vendor;

pub use mac::{MacAddr, MacStyle};
pub use phone::{Phone, PhoneUpdate};
pub use phonebook::{DEFAULT_PHONEBOOK_TITLE, PhonebookEntry};
pub use settings::{EffectiveSettings, GlobalSettings, SettingsUpdate, Transport};
pub use vendor::{OuiTable, Vendor};
