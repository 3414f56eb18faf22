//! Global settings command handlers.

use std::fmt::Write as _;

use dialtone_core::{GlobalSettings, Provisioner, SettingsUpdate};

use crate::cli::{GlobalOpts, SettingsArgs, SettingsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    provisioner: &Provisioner,
    args: SettingsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SettingsCommand::Show => {
            let snapshot = provisioner.snapshot();
            output::print_output(&render_settings(&snapshot.settings), global.quiet);
            Ok(())
        }

        SettingsCommand::Set {
            pbx_server,
            pbx_port,
            transport,
            codecs,
            ntp_server,
            timezone,
        } => {
            let update = SettingsUpdate {
                pbx_server,
                pbx_port,
                transport,
                codecs,
                ntp_server,
                timezone,
            };
            let outcome = provisioner.update_settings(update).await?;
            util::print_outcome(
                "Settings updated",
                &outcome,
                provisioner.status().switch_enabled,
                global.quiet,
            );
            Ok(())
        }
    }
}

fn render_settings(settings: &GlobalSettings) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "PBX server:  {}", settings.pbx_server);
    let _ = writeln!(out, "PBX port:    {}", settings.pbx_port);
    let _ = writeln!(out, "Transport:   {}", settings.transport);
    let _ = writeln!(out, "Codecs:      {}", settings.codecs.join(", "));
    let _ = writeln!(out, "NTP server:  {}", settings.ntp_server);
    let _ = write!(out, "Timezone:    {}", settings.timezone);
    out
}
