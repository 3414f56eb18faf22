// Switch configuration generator.
//
// Pure text generation: an inventory snapshot in, the two Asterisk
// artifacts out. No I/O and no clock — the banner is constant and the
// device order is a stable sort, so an unchanged snapshot always
// renders byte-identical output.

use std::cmp::Ordering;
use std::fmt;
use std::fmt::Write as _;

use crate::inventory::Inventory;
use crate::model::{EffectiveSettings, MacAddr, Phone, Vendor};

/// Leading comment for both generated files. Constant text: a
/// timestamp here would break idempotent regeneration.
const BANNER: &str = ";\n; Managed by dialtone. Do not edit by hand.\n; Manual changes are overwritten on the next inventory change.\n;\n\n";

/// The rendered switch configuration for one inventory snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedConfig {
    /// Endpoint/auth/AOR definitions (pjsip.conf payload).
    pub pjsip: String,
    /// Dialplan (extensions.conf payload).
    pub extensions: String,
    /// Devices excluded from the output, with the reason.
    pub warnings: Vec<GenerationWarning>,
}

/// A device excluded from generated output. Non-fatal: one bad record
/// must not block provisioning of the others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationWarning {
    pub mac: MacAddr,
    pub extension: String,
    pub reason: String,
}

impl fmt::Display for GenerationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "phone {} (extension {}) skipped: {}",
            self.mac, self.extension, self.reason
        )
    }
}

/// Maps inventory snapshots to switch configuration text.
#[derive(Debug, Clone)]
pub struct Generator {
    dialplan_context: String,
    dial_timeout_secs: u32,
}

impl Generator {
    pub fn new(dialplan_context: impl Into<String>, dial_timeout_secs: u32) -> Self {
        Self {
            dialplan_context: dialplan_context.into(),
            dial_timeout_secs,
        }
    }

    /// Render both artifacts for a snapshot.
    ///
    /// Devices are emitted sorted by extension, shorter first and then
    /// lexicographic, so extension 99 sorts before 100. A device whose
    /// vendor resolves to `Unknown` or whose effective credential is
    /// missing goes to `warnings` and appears in neither file.
    pub fn generate(&self, inventory: &Inventory) -> GeneratedConfig {
        let mut ordered: Vec<&Phone> = inventory.phones().iter().collect();
        ordered.sort_by(|a, b| extension_order(&a.extension, &b.extension));

        let mut pjsip = String::from(BANNER);
        let mut extensions = String::from(BANNER);
        let mut warnings = Vec::new();

        let _ = writeln!(extensions, "[{}]", self.dialplan_context);

        for phone in ordered {
            let effective = inventory.effective_settings(phone);
            if inventory.vendor_of(phone) == Vendor::Unknown {
                warnings.push(GenerationWarning {
                    mac: phone.mac.clone(),
                    extension: phone.extension.clone(),
                    reason: format!("unrecognized vendor for model {:?}", phone.model),
                });
                continue;
            }
            let Some(password) = effective.password.as_deref() else {
                warnings.push(GenerationWarning {
                    mac: phone.mac.clone(),
                    extension: phone.extension.clone(),
                    reason: "no credential configured".to_owned(),
                });
                continue;
            };
            self.push_endpoint(&mut pjsip, &effective, password);
            self.push_extension(&mut extensions, &effective.extension);
        }

        GeneratedConfig {
            pjsip,
            extensions,
            warnings,
        }
    }

    fn push_endpoint(&self, out: &mut String, effective: &EffectiveSettings, password: &str) {
        let extension = &effective.extension;
        let allow = effective
            .codecs
            .iter()
            .map(|codec| asterisk_codec(codec))
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(out, "[{extension}]");
        let _ = writeln!(out, "type=endpoint");
        let _ = writeln!(out, "context={}", self.dialplan_context);
        let _ = writeln!(out, "disallow=all");
        let _ = writeln!(out, "allow={allow}");
        let _ = writeln!(out, "auth={extension}-auth");
        let _ = writeln!(out, "aors={extension}");
        let _ = writeln!(out, "transport=transport-{}", effective.transport);
        let _ = writeln!(out, "callerid=\"{}\" <{extension}>", effective.display_name);
        let _ = writeln!(out, "direct_media=no");
        let _ = writeln!(out);
        let _ = writeln!(out, "[{extension}-auth]");
        let _ = writeln!(out, "type=auth");
        let _ = writeln!(out, "auth_type=userpass");
        let _ = writeln!(out, "username={extension}");
        let _ = writeln!(out, "password={password}");
        let _ = writeln!(out);
        let _ = writeln!(out, "[{extension}]");
        let _ = writeln!(out, "type=aor");
        let _ = writeln!(out, "max_contacts=1");
        let _ = writeln!(out);
    }

    fn push_extension(&self, out: &mut String, extension: &str) {
        let _ = writeln!(
            out,
            "exten => {extension},1,Dial(PJSIP/{extension},{})",
            self.dial_timeout_secs
        );
        let _ = writeln!(out, " same => n,Hangup()");
    }
}

/// Numeric-friendly extension ordering: shorter strings first, then
/// lexicographic, so "99" < "100".
fn extension_order(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Inventory codec names use IANA spellings; Asterisk wants its own.
fn asterisk_codec(codec: &str) -> String {
    match codec.to_ascii_uppercase().as_str() {
        "PCMU" => "ulaw".to_owned(),
        "PCMA" => "alaw".to_owned(),
        "G722" => "g722".to_owned(),
        "G729" => "g729".to_owned(),
        "OPUS" => "opus".to_owned(),
        _ => codec.to_ascii_lowercase(),
    }
}
