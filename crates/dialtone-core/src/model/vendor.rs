// Vendor detection and per-vendor rendering.
//
// Vendors form a closed set. Detection tries the OUI table first and
// falls back to model-name heuristics; everything else is `Unknown`,
// which rendering rejects instead of guessing a file format.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::error::ValidationError;
use crate::model::mac::MacAddr;
use crate::model::phonebook::PhonebookEntry;
use crate::model::settings::{EffectiveSettings, Transport};

/// Handset vendors with a supported provisioning format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Vendor {
    Yealink,
    Fanvil,
    Unknown,
}

impl Vendor {
    /// Resolve a device's vendor: OUI table first, then model-name
    /// heuristics, else `Unknown`.
    pub fn detect(mac: &MacAddr, model: &str, table: &OuiTable) -> Self {
        if let Some(vendor) = table.vendor_for(&mac.oui()) {
            return vendor;
        }
        Self::from_model(model)
    }

    /// Model-name fallback for devices whose OUI is not registered.
    /// `T54W`-style codes mean Yealink, `X5U`-style codes mean Fanvil.
    fn from_model(model: &str) -> Self {
        let normalized = model.trim().to_ascii_lowercase();
        if normalized.starts_with("yealink") || starts_with_series(&normalized, 't') {
            return Self::Yealink;
        }
        if normalized.starts_with("fanvil") || starts_with_series(&normalized, 'x') {
            return Self::Fanvil;
        }
        Self::Unknown
    }

    /// Render the device provisioning file for this vendor.
    ///
    /// Pure text generation from the merged settings, consumed by the
    /// CLI preview. `Unknown` is rejected, never guessed.
    pub fn render_config(self, settings: &EffectiveSettings) -> Result<String, ValidationError> {
        match self {
            Self::Yealink => Ok(render_yealink_config(settings)),
            Self::Fanvil => Ok(render_fanvil_config(settings)),
            Self::Unknown => Err(ValidationError::UnknownVendor {
                mac: settings.mac.clone(),
                model: settings.model.clone(),
            }),
        }
    }

    /// Render the shared phonebook in this vendor's directory format.
    pub fn render_phonebook(
        self,
        title: &str,
        entries: &[PhonebookEntry],
    ) -> Result<String, ValidationError> {
        match self {
            Self::Yealink => Ok(render_yealink_phonebook(title, entries)),
            Self::Fanvil => Ok(render_fanvil_phonebook(title, entries)),
            Self::Unknown => Err(ValidationError::UnknownPhonebookVendor),
        }
    }
}

/// Vendor model series: a vendor letter followed directly by a digit.
fn starts_with_series(model: &str, letter: char) -> bool {
    let mut chars = model.chars();
    chars.next() == Some(letter) && chars.next().is_some_and(|c| c.is_ascii_digit())
}

// ── OUI table ───────────────────────────────────────────────────────

/// OUI-prefix to vendor lookup table.
///
/// Keys are held as six uppercase hex digits; `insert` accepts the
/// same separator forms as full hardware addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OuiTable {
    prefixes: HashMap<String, Vendor>,
}

impl OuiTable {
    /// An empty table; detection falls back to model-name heuristics.
    pub fn empty() -> Self {
        Self {
            prefixes: HashMap::new(),
        }
    }

    /// The vendor prefixes shipped by default.
    pub fn builtin() -> Self {
        let mut prefixes = HashMap::new();
        for (oui, vendor) in [
            ("001565", Vendor::Yealink),
            ("805E0C", Vendor::Yealink),
            ("805EC0", Vendor::Yealink),
            ("0C383E", Vendor::Fanvil),
            ("7C2F80", Vendor::Fanvil),
        ] {
            prefixes.insert(oui.to_owned(), vendor);
        }
        Self { prefixes }
    }

    /// Register a prefix for `vendor`, replacing any previous owner.
    pub fn insert(&mut self, oui: &str, vendor: Vendor) -> Result<(), ValidationError> {
        let key: String = oui
            .trim()
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | '.'))
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if key.len() != 6 || !key.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidOui {
                input: oui.trim().to_owned(),
            });
        }
        self.prefixes.insert(key, vendor);
        Ok(())
    }

    /// Vendor registered for this prefix, if any.
    pub fn vendor_for(&self, oui: &str) -> Option<Vendor> {
        self.prefixes.get(&oui.to_ascii_uppercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

impl Default for OuiTable {
    /// The builtin table, not the empty one.
    fn default() -> Self {
        Self::builtin()
    }
}

// ── Vendor renderers ────────────────────────────────────────────────

fn render_yealink_config(s: &EffectiveSettings) -> String {
    let mut out = String::from("#!version:1.0.0.1\n\n");
    let _ = writeln!(out, "account.1.enable = 1");
    let _ = writeln!(out, "account.1.label = {}", s.label);
    let _ = writeln!(out, "account.1.display_name = {}", s.display_name);
    let _ = writeln!(out, "account.1.auth_name = {}", s.extension);
    let _ = writeln!(out, "account.1.user_name = {}", s.extension);
    if let Some(password) = &s.password {
        let _ = writeln!(out, "account.1.password = {password}");
    }
    let _ = writeln!(out, "account.1.sip_server.1.address = {}", s.pbx_server);
    let _ = writeln!(out, "account.1.sip_server.1.port = {}", s.pbx_port);
    let _ = writeln!(
        out,
        "account.1.sip_server.1.transport_type = {}",
        yealink_transport(s.transport)
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "local_time.ntp_server1 = {}", s.ntp_server);
    let _ = writeln!(out, "local_time.time_zone_name = {}", s.timezone);
    out
}

/// Yealink encodes the transport as an index: UDP 0, TCP 1, TLS 2.
fn yealink_transport(transport: Transport) -> u8 {
    match transport {
        Transport::Udp => 0,
        Transport::Tcp => 1,
        Transport::Tls => 2,
    }
}

fn render_fanvil_config(s: &EffectiveSettings) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(out, "<sysConf version=\"2.0002\">");
    let _ = writeln!(out, "  <sip>");
    let _ = writeln!(out, "    <line id=\"1\">");
    let _ = writeln!(out, "      <PhoneNumber>{}</PhoneNumber>", xml_escape(&s.extension));
    let _ = writeln!(out, "      <DisplayName>{}</DisplayName>", xml_escape(&s.display_name));
    let _ = writeln!(out, "      <RegisterAddr>{}</RegisterAddr>", xml_escape(&s.pbx_server));
    let _ = writeln!(out, "      <RegisterPort>{}</RegisterPort>", s.pbx_port);
    let _ = writeln!(out, "      <RegisterUser>{}</RegisterUser>", xml_escape(&s.extension));
    if let Some(password) = &s.password {
        let _ = writeln!(out, "      <RegisterPswd>{}</RegisterPswd>", xml_escape(password));
    }
    let _ = writeln!(out, "      <TransType>{}</TransType>", s.transport);
    let _ = writeln!(out, "    </line>");
    let _ = writeln!(out, "  </sip>");
    let _ = writeln!(out, "  <sntp>");
    let _ = writeln!(out, "    <Server>{}</Server>", xml_escape(&s.ntp_server));
    let _ = writeln!(out, "    <TimeZoneName>{}</TimeZoneName>", xml_escape(&s.timezone));
    let _ = writeln!(out, "  </sntp>");
    let _ = writeln!(out, "</sysConf>");
    out
}

fn render_yealink_phonebook(title: &str, entries: &[PhonebookEntry]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(out, "<YealinkIPPhoneBook>");
    let _ = writeln!(out, "  <Title>{}</Title>", xml_escape(title));
    let _ = writeln!(out, "  <Menu Name=\"{}\">", xml_escape(title));
    for entry in entries {
        let _ = writeln!(
            out,
            "    <Unit Name=\"{}\" Phone1=\"{}\" Phone2=\"\" Phone3=\"\"/>",
            xml_escape(&entry.name),
            xml_escape(&entry.number)
        );
    }
    let _ = writeln!(out, "  </Menu>");
    let _ = writeln!(out, "</YealinkIPPhoneBook>");
    out
}

fn render_fanvil_phonebook(title: &str, entries: &[PhonebookEntry]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(out, "<PhoneBook name=\"{}\">", xml_escape(title));
    for entry in entries {
        let _ = writeln!(out, "  <DirectoryEntry>");
        let _ = writeln!(out, "    <Name>{}</Name>", xml_escape(&entry.name));
        let _ = writeln!(out, "    <Telephone>{}</Telephone>", xml_escape(&entry.number));
        let _ = writeln!(out, "  </DirectoryEntry>");
    }
    let _ = writeln!(out, "</PhoneBook>");
    out
}

/// Minimal XML text/attribute escaping for the five reserved chars.
fn xml_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
