//! Switch-facing commands: render, sync, status.

use std::fmt::Write as _;

use owo_colors::AnsiColors;

use dialtone_core::Provisioner;

use crate::cli::{GlobalOpts, RenderArgs};
use crate::error::CliError;
use crate::output;

use super::util;

/// Preview generated config on stdout without writing any file.
pub fn render(
    provisioner: &Provisioner,
    args: RenderArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Some(mac) = args.mac {
        let rendered = provisioner.render_device(&mac)?;
        output::print_output(&rendered, global.quiet);
        return Ok(());
    }

    let generated = provisioner.preview();
    for warning in &generated.warnings {
        eprintln!("warning: {warning}");
    }
    let preview = format!(
        "; ---- pjsip ----\n{}\n; ---- extensions ----\n{}",
        generated.pjsip, generated.extensions
    );
    output::print_output(&preview, global.quiet);
    Ok(())
}

/// Regenerate, write, and reload from the current inventory.
pub async fn sync(provisioner: &Provisioner, global: &GlobalOpts) -> Result<(), CliError> {
    let outcome = provisioner.sync().await?;
    util::print_outcome(
        "Config written",
        &outcome,
        provisioner.status().switch_enabled,
        global.quiet,
    );
    Ok(())
}

/// Inventory counts plus switch integration state.
pub fn status(provisioner: &Provisioner, global: &GlobalOpts) -> Result<(), CliError> {
    let status = provisioner.status();

    let mut out = String::new();
    let _ = writeln!(out, "Phones:             {}", status.phone_count);
    let _ = writeln!(out, "Phonebook entries:  {}", status.phonebook_count);
    if status.switch_enabled {
        let _ = writeln!(out, "Switch:             enabled ({})", status.switch_target);
        let state = if status.out_of_sync {
            output::paint("out of sync", AnsiColors::Red)
        } else {
            output::paint("in sync", AnsiColors::Green)
        };
        let _ = write!(out, "Sync state:         {state}");
    } else {
        let _ = write!(out, "Switch:             disabled");
    }

    output::print_output(&out, global.quiet);
    Ok(())
}
