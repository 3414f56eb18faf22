// The validated, indexed device set.
//
// An `Inventory` is parsed from the YAML artifacts, validated record
// by record, and indexed by canonical hardware address. Once published
// it is treated as an immutable snapshot: writers clone it, mutate the
// clone, and re-index before anyone else can observe the new state.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ValidationError;
use crate::model::{
    EffectiveSettings, GlobalSettings, MacAddr, OuiTable, Phone, PhoneUpdate, PhonebookEntry,
    Vendor,
};

/// Serialized shape of the primary inventory artifact.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct InventoryDoc {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phones: Vec<Phone>,
    #[serde(default)]
    pub settings: GlobalSettings,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phonebook: Vec<PhonebookEntry>,
}

/// Serialized shape of the secrets artifact.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct SecretsDoc {
    /// Extension → SIP credential. A `BTreeMap` keeps the artifact
    /// stably ordered across saves.
    #[serde(default)]
    pub phone_passwords: BTreeMap<String, String>,
}

/// The device set, global settings, phonebook, and the MAC index all
/// provisioning lookups go through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    phones: Vec<Phone>,
    pub settings: GlobalSettings,
    pub phonebook: Vec<PhonebookEntry>,
    oui_table: OuiTable,
    index: HashMap<MacAddr, usize>,
}

impl Inventory {
    /// Parse and validate the raw artifacts into an indexed inventory.
    ///
    /// `secrets_doc` entries are keyed by extension and override any
    /// credential already embedded in the matching device record.
    pub fn from_documents(
        phones_doc: &str,
        secrets_doc: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let doc: InventoryDoc = if phones_doc.trim().is_empty() {
            InventoryDoc::default()
        } else {
            serde_yaml::from_str(phones_doc)?
        };
        let mut inventory = Self {
            phones: doc.phones,
            settings: doc.settings,
            phonebook: doc.phonebook,
            oui_table: OuiTable::default(),
            index: HashMap::new(),
        };
        if let Some(raw) = secrets_doc {
            if !raw.trim().is_empty() {
                let secrets: SecretsDoc = serde_yaml::from_str(raw)?;
                inventory.merge_secrets(&secrets.phone_passwords);
            }
        }
        inventory.reindex()?;
        Ok(inventory)
    }

    /// Serialize back to artifact form.
    ///
    /// With `split_secrets`, credentials are moved into the returned
    /// secrets document and omitted from the primary document. The
    /// secrets map is rebuilt wholesale so renamed extensions do not
    /// leave stale entries behind.
    pub fn to_documents(
        &self,
        split_secrets: bool,
    ) -> Result<(String, Option<String>), serde_yaml::Error> {
        let mut phones = self.phones.clone();
        let secrets_yaml = if split_secrets {
            let mut phone_passwords = BTreeMap::new();
            for phone in &mut phones {
                if let Some(password) = phone.password.take() {
                    if phone_passwords
                        .insert(phone.extension.clone(), password)
                        .is_some()
                    {
                        warn!(
                            extension = %phone.extension,
                            "phones share an extension; only one credential kept in the secrets artifact"
                        );
                    }
                }
            }
            Some(serde_yaml::to_string(&SecretsDoc { phone_passwords })?)
        } else {
            None
        };
        let doc = InventoryDoc {
            phones,
            settings: self.settings.clone(),
            phonebook: self.phonebook.clone(),
        };
        Ok((serde_yaml::to_string(&doc)?, secrets_yaml))
    }

    /// Replace the vendor detection table.
    pub fn with_oui_table(mut self, table: OuiTable) -> Self {
        self.oui_table = table;
        self
    }

    pub fn oui_table(&self) -> &OuiTable {
        &self.oui_table
    }

    pub fn phones(&self) -> &[Phone] {
        &self.phones
    }

    /// Index lookup by canonical hardware address.
    pub fn lookup(&self, mac: &MacAddr) -> Option<&Phone> {
        self.index.get(mac).and_then(|&pos| self.phones.get(pos))
    }

    /// Resolve a device's vendor against this inventory's OUI table.
    pub fn vendor_of(&self, phone: &Phone) -> Vendor {
        Vendor::detect(&phone.mac, &phone.model, &self.oui_table)
    }

    /// Field-by-field merge of global defaults and device overrides.
    pub fn effective_settings(&self, phone: &Phone) -> EffectiveSettings {
        let global = &self.settings;
        EffectiveSettings {
            mac: phone.mac.clone(),
            model: phone.model.clone(),
            extension: phone.extension.clone(),
            display_name: phone.display_name.clone(),
            label: phone.line_label().to_owned(),
            password: phone.password.clone(),
            pbx_server: phone
                .pbx_server
                .clone()
                .unwrap_or_else(|| global.pbx_server.clone()),
            pbx_port: phone.pbx_port.unwrap_or(global.pbx_port),
            transport: phone.transport.unwrap_or(global.transport),
            codecs: phone.codecs.clone().unwrap_or_else(|| global.codecs.clone()),
            ntp_server: global.ntp_server.clone(),
            timezone: global.timezone.clone(),
        }
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Add a device. A MAC already present is rejected.
    pub fn add_phone(&mut self, phone: Phone) -> Result<(), ValidationError> {
        validate_phone(&phone)?;
        if let Some(existing) = self.lookup(&phone.mac) {
            return Err(ValidationError::DuplicateMac {
                mac: phone.mac.clone(),
                extension: existing.extension.clone(),
            });
        }
        self.phones.push(phone);
        self.reindex()
    }

    /// Apply a partial update. Renaming the MAC re-checks uniqueness
    /// against every other device; an unmoved MAC is never a conflict
    /// with itself.
    pub fn update_phone(
        &mut self,
        mac: &MacAddr,
        update: PhoneUpdate,
    ) -> Result<(), ValidationError> {
        let pos = *self
            .index
            .get(mac)
            .ok_or_else(|| ValidationError::NotFound { mac: mac.clone() })?;
        if let Some(new_mac) = update.new_mac.as_ref().filter(|m| *m != mac) {
            if let Some(existing) = self.lookup(new_mac) {
                return Err(ValidationError::DuplicateMac {
                    mac: new_mac.clone(),
                    extension: existing.extension.clone(),
                });
            }
        }
        let Some(current) = self.phones.get(pos) else {
            return Err(ValidationError::NotFound { mac: mac.clone() });
        };
        let mut updated = current.clone();
        updated.apply(update);
        validate_phone(&updated)?;
        if let Some(slot) = self.phones.get_mut(pos) {
            *slot = updated;
        }
        self.reindex()
    }

    /// Remove a device; unknown MAC is `NotFound`.
    pub fn remove_phone(&mut self, mac: &MacAddr) -> Result<Phone, ValidationError> {
        let pos = *self
            .index
            .get(mac)
            .ok_or_else(|| ValidationError::NotFound { mac: mac.clone() })?;
        let removed = self.phones.remove(pos);
        self.reindex()?;
        Ok(removed)
    }

    pub fn add_phonebook_entry(&mut self, entry: PhonebookEntry) -> Result<(), ValidationError> {
        validate_phonebook_entry(&entry)?;
        self.phonebook.push(entry);
        Ok(())
    }

    /// Update the entry at a 1-based index; `None` fields stay as-is.
    pub fn update_phonebook_entry(
        &mut self,
        index: usize,
        name: Option<String>,
        number: Option<String>,
    ) -> Result<(), ValidationError> {
        let pos = self.phonebook_pos(index)?;
        let Some(entry) = self.phonebook.get_mut(pos) else {
            return Err(ValidationError::PhonebookEntryNotFound { index });
        };
        let mut updated = entry.clone();
        if let Some(name) = name {
            updated.name = name;
        }
        if let Some(number) = number {
            updated.number = number;
        }
        validate_phonebook_entry(&updated)?;
        *entry = updated;
        Ok(())
    }

    /// Remove the entry at a 1-based index; later entries shift down.
    pub fn remove_phonebook_entry(
        &mut self,
        index: usize,
    ) -> Result<PhonebookEntry, ValidationError> {
        let pos = self.phonebook_pos(index)?;
        Ok(self.phonebook.remove(pos))
    }

    fn phonebook_pos(&self, index: usize) -> Result<usize, ValidationError> {
        index
            .checked_sub(1)
            .filter(|pos| *pos < self.phonebook.len())
            .ok_or(ValidationError::PhonebookEntryNotFound { index })
    }

    // ── Index maintenance ───────────────────────────────────────────

    /// Rebuild the MAC index from the device list.
    ///
    /// The replacement index is built completely, validating every
    /// record on the way, before it is swapped in: a failed rebuild
    /// leaves the previous index untouched.
    fn reindex(&mut self) -> Result<(), ValidationError> {
        let mut index = HashMap::with_capacity(self.phones.len());
        for (pos, phone) in self.phones.iter().enumerate() {
            validate_phone(phone)?;
            if let Some(prev) = index.insert(phone.mac.clone(), pos) {
                let extension = self
                    .phones
                    .get(prev)
                    .map(|p| p.extension.clone())
                    .unwrap_or_default();
                return Err(ValidationError::DuplicateMac {
                    mac: phone.mac.clone(),
                    extension,
                });
            }
        }
        self.index = index;
        Ok(())
    }

    fn merge_secrets(&mut self, passwords: &BTreeMap<String, String>) {
        for phone in &mut self.phones {
            if let Some(password) = passwords.get(&phone.extension) {
                phone.password = Some(password.clone());
            }
        }
    }
}

/// Field-level validation for a single device record.
fn validate_phone(phone: &Phone) -> Result<(), ValidationError> {
    if phone.extension.is_empty() {
        return Err(ValidationError::MissingField {
            mac: phone.mac.clone(),
            field: "extension",
        });
    }
    if !phone.extension.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidExtension {
            mac: phone.mac.clone(),
            extension: phone.extension.clone(),
        });
    }
    if phone.display_name.trim().is_empty() {
        return Err(ValidationError::MissingField {
            mac: phone.mac.clone(),
            field: "display_name",
        });
    }
    Ok(())
}

fn validate_phonebook_entry(entry: &PhonebookEntry) -> Result<(), ValidationError> {
    if entry.name.trim().is_empty() {
        return Err(ValidationError::EmptyPhonebookField { field: "name" });
    }
    if entry.number.trim().is_empty() {
        return Err(ValidationError::EmptyPhonebookField { field: "number" });
    }
    Ok(())
}
