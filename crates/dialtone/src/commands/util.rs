//! Shared helpers for command handlers.

use std::fmt::Write as _;

use dialtone_core::{EffectiveSettings, MacStyle, PipelineOutcome, SyncOutcome, Vendor};

/// Report a mutation's reconciliation outcome on stderr.
///
/// Runs after the inventory write already succeeded, so the message
/// only qualifies what happened to the switch: reloaded, nothing to
/// reload, or left out of sync.
pub fn print_outcome(action: &str, outcome: &PipelineOutcome, switch_enabled: bool, quiet: bool) {
    for warning in &outcome.warnings {
        eprintln!("warning: {warning}");
    }
    if quiet {
        return;
    }
    match &outcome.sync {
        SyncOutcome::Done if switch_enabled => eprintln!("{action}; switch reloaded"),
        SyncOutcome::Done => eprintln!("{action}"),
        SyncOutcome::OutOfSync(error) => eprintln!("{action}; switch out of sync: {error}"),
    }
}

/// Key/value detail block for one phone's merged view.
pub fn render_effective(settings: &EffectiveSettings, vendor: Vendor) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "MAC:           {}", settings.mac.format(MacStyle::Colon, false));
    let _ = writeln!(out, "Model:         {}", settings.model);
    let _ = writeln!(out, "Vendor:        {vendor}");
    let _ = writeln!(out, "Extension:     {}", settings.extension);
    let _ = writeln!(out, "Display name:  {}", settings.display_name);
    let _ = writeln!(out, "Label:         {}", settings.label);
    let credential = if settings.password.is_some() { "(set)" } else { "(none)" };
    let _ = writeln!(out, "Password:      {credential}");
    let _ = writeln!(out, "PBX:           {}:{}", settings.pbx_server, settings.pbx_port);
    let _ = writeln!(out, "Transport:     {}", settings.transport);
    let _ = writeln!(out, "Codecs:        {}", settings.codecs.join(", "));
    let _ = writeln!(out, "NTP server:    {}", settings.ntp_server);
    let _ = write!(out, "Timezone:      {}", settings.timezone);
    out
}
