// Device records as stored in the inventory artifact.

use serde::{Deserialize, Serialize};

use crate::model::mac::MacAddr;
use crate::model::settings::Transport;

/// A provisioned handset.
///
/// Optional fields are per-device overrides of the global settings;
/// `None` means "inherit". The credential may live here or in the
/// secrets artifact — by the time an `Inventory` is built the two are
/// already merged, with the secrets artifact winning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone {
    pub mac: MacAddr,
    pub model: String,
    pub extension: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<Transport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pbx_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pbx_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codecs: Option<Vec<String>>,
}

impl Phone {
    /// Line label shown on the handset; falls back to the display name.
    pub fn line_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.display_name)
    }

    /// Apply a partial update, including a hardware-address rename.
    ///
    /// Uniqueness of a renamed MAC is the inventory's job; this only
    /// moves field values.
    pub(crate) fn apply(&mut self, update: PhoneUpdate) {
        let PhoneUpdate {
            new_mac,
            model,
            extension,
            display_name,
            label,
            password,
            transport,
            pbx_server,
            pbx_port,
            codecs,
        } = update;
        if let Some(mac) = new_mac {
            self.mac = mac;
        }
        if let Some(model) = model {
            self.model = model;
        }
        if let Some(extension) = extension {
            self.extension = extension;
        }
        if let Some(display_name) = display_name {
            self.display_name = display_name;
        }
        if let Some(label) = label {
            self.label = Some(label);
        }
        if let Some(password) = password {
            self.password = Some(password);
        }
        if let Some(transport) = transport {
            self.transport = Some(transport);
        }
        if let Some(pbx_server) = pbx_server {
            self.pbx_server = Some(pbx_server);
        }
        if let Some(pbx_port) = pbx_port {
            self.pbx_port = Some(pbx_port);
        }
        if let Some(codecs) = codecs {
            self.codecs = Some(codecs);
        }
    }
}

/// Partial update for a [`Phone`]; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct PhoneUpdate {
    /// Rename the device to a new hardware address.
    pub new_mac: Option<MacAddr>,
    pub model: Option<String>,
    pub extension: Option<String>,
    pub display_name: Option<String>,
    pub label: Option<String>,
    pub password: Option<String>,
    pub transport: Option<Transport>,
    pub pbx_server: Option<String>,
    pub pbx_port: Option<u16>,
    pub codecs: Option<Vec<String>>,
}
