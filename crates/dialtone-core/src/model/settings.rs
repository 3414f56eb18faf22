// Global settings and the merged per-device view.
//
// Every device's working configuration is `global ⊕ device-overrides`,
// merged field by field: a device that overrides only `transport`
// still inherits every other global field.

use serde::{Deserialize, Serialize};

use crate::model::mac::MacAddr;

/// SIP transport used between handset and switch.
///
/// Stored lowercase in artifacts; uppercase spellings from older
/// artifacts are still accepted on load.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Transport {
    #[default]
    #[serde(alias = "UDP", alias = "Udp")]
    Udp,
    #[serde(alias = "TCP", alias = "Tcp")]
    Tcp,
    #[serde(alias = "TLS", alias = "Tls")]
    Tls,
}

/// Deployment-wide defaults every device inherits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    pub pbx_server: String,
    pub pbx_port: u16,
    pub transport: Transport,
    pub codecs: Vec<String>,
    pub ntp_server: String,
    pub timezone: String,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            pbx_server: "pbx.example.com".to_owned(),
            pbx_port: 5060,
            transport: Transport::Udp,
            codecs: vec!["PCMU".to_owned(), "PCMA".to_owned(), "G722".to_owned()],
            ntp_server: "pool.ntp.org".to_owned(),
            timezone: "America/New_York".to_owned(),
        }
    }
}

impl GlobalSettings {
    /// Apply a partial update; `None` fields stay as they are.
    pub fn apply(&mut self, update: SettingsUpdate) {
        let SettingsUpdate {
            pbx_server,
            pbx_port,
            transport,
            codecs,
            ntp_server,
            timezone,
        } = update;
        if let Some(pbx_server) = pbx_server {
            self.pbx_server = pbx_server;
        }
        if let Some(pbx_port) = pbx_port {
            self.pbx_port = pbx_port;
        }
        if let Some(transport) = transport {
            self.transport = transport;
        }
        if let Some(codecs) = codecs {
            self.codecs = codecs;
        }
        if let Some(ntp_server) = ntp_server {
            self.ntp_server = ntp_server;
        }
        if let Some(timezone) = timezone {
            self.timezone = timezone;
        }
    }
}

/// Partial update for [`GlobalSettings`].
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub pbx_server: Option<String>,
    pub pbx_port: Option<u16>,
    pub transport: Option<Transport>,
    pub codecs: Option<Vec<String>>,
    pub ntp_server: Option<String>,
    pub timezone: Option<String>,
}

/// The fully merged view of one device: global defaults with the
/// device's own overrides applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveSettings {
    pub mac: MacAddr,
    pub model: String,
    pub extension: String,
    pub display_name: String,
    /// Line label shown on the handset; defaults to the display name.
    pub label: String,
    pub password: Option<String>,
    pub pbx_server: String,
    pub pbx_port: u16,
    pub transport: Transport,
    pub codecs: Vec<String>,
    pub ntp_server: String,
    pub timezone: String,
}
