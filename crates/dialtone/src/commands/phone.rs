//! Phone command handlers.

use tabled::Tabled;

use dialtone_core::{MacStyle, Phone, PhoneUpdate, Provisioner, ValidationError};

use crate::cli::{GlobalOpts, PhoneArgs, PhoneCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct PhoneRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Ext")]
    extension: String,
    #[tabled(rename = "Display Name")]
    display_name: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Vendor")]
    vendor: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    provisioner: &Provisioner,
    args: PhoneArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        PhoneCommand::Add {
            mac,
            extension,
            name,
            model,
            label,
            password,
            transport,
            pbx_server,
            pbx_port,
            codecs,
        } => {
            let phone = Phone {
                mac,
                model,
                extension,
                display_name: name,
                label,
                password,
                transport,
                pbx_server,
                pbx_port,
                codecs,
            };
            let outcome = provisioner.add_phone(phone).await?;
            util::print_outcome(
                "Phone added",
                &outcome,
                provisioner.status().switch_enabled,
                global.quiet,
            );
            Ok(())
        }

        PhoneCommand::Set {
            mac,
            extension,
            name,
            model,
            label,
            password,
            transport,
            pbx_server,
            pbx_port,
            codecs,
            new_mac,
        } => {
            let update = PhoneUpdate {
                new_mac,
                model,
                extension,
                display_name: name,
                label,
                password,
                transport,
                pbx_server,
                pbx_port,
                codecs,
            };
            let outcome = provisioner.update_phone(&mac, update).await?;
            util::print_outcome(
                "Phone updated",
                &outcome,
                provisioner.status().switch_enabled,
                global.quiet,
            );
            Ok(())
        }

        PhoneCommand::Rm { mac } => {
            let outcome = provisioner.remove_phone(&mac).await?;
            util::print_outcome(
                "Phone removed",
                &outcome,
                provisioner.status().switch_enabled,
                global.quiet,
            );
            Ok(())
        }

        PhoneCommand::List => {
            let snapshot = provisioner.snapshot();
            let rows: Vec<PhoneRow> = snapshot
                .phones()
                .iter()
                .map(|phone| PhoneRow {
                    mac: phone.mac.format(MacStyle::Colon, false),
                    extension: phone.extension.clone(),
                    display_name: phone.display_name.clone(),
                    model: phone.model.clone(),
                    vendor: snapshot.vendor_of(phone).to_string(),
                })
                .collect();
            output::print_output(&output::render_table(&rows), global.quiet);
            Ok(())
        }

        PhoneCommand::Show { mac } => {
            let snapshot = provisioner.snapshot();
            let phone = snapshot
                .lookup(&mac)
                .ok_or(ValidationError::NotFound { mac })?;
            let vendor = snapshot.vendor_of(phone);
            let effective = snapshot.effective_settings(phone);
            output::print_output(&util::render_effective(&effective, vendor), global.quiet);
            Ok(())
        }
    }
}
