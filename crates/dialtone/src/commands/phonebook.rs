//! Phonebook command handlers.
//!
//! Phonebook entries feed handset directories, not the switch, so
//! these mutations persist without a reconciliation pass.

use tabled::Tabled;

use dialtone_core::{PhonebookEntry, Provisioner};

use crate::cli::{GlobalOpts, PhonebookArgs, PhonebookCommand};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Number")]
    number: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    provisioner: &Provisioner,
    args: PhonebookArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        PhonebookCommand::Add { name, number } => {
            provisioner
                .add_phonebook_entry(PhonebookEntry { name, number })
                .await?;
            if !global.quiet {
                eprintln!("Phonebook entry added");
            }
            Ok(())
        }

        PhonebookCommand::Set {
            index,
            name,
            number,
        } => {
            provisioner.update_phonebook_entry(index, name, number).await?;
            if !global.quiet {
                eprintln!("Phonebook entry updated");
            }
            Ok(())
        }

        PhonebookCommand::Rm { index } => {
            provisioner.remove_phonebook_entry(index).await?;
            if !global.quiet {
                eprintln!("Phonebook entry removed");
            }
            Ok(())
        }

        PhonebookCommand::List => {
            let snapshot = provisioner.snapshot();
            let rows: Vec<EntryRow> = snapshot
                .phonebook
                .iter()
                .enumerate()
                .map(|(position, entry)| EntryRow {
                    index: position + 1,
                    name: entry.name.clone(),
                    number: entry.number.clone(),
                })
                .collect();
            output::print_output(&output::render_table(&rows), global.quiet);
            Ok(())
        }
    }
}
