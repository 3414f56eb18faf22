//! Command dispatch: bridges CLI args → provisioner calls → output.

pub mod phone;
pub mod phonebook;
pub mod settings;
pub mod switch;
pub mod util;

use dialtone_core::Provisioner;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a provisioner-bound command to the appropriate handler.
pub async fn dispatch(
    command: Command,
    provisioner: &Provisioner,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match command {
        Command::Phone(args) => phone::handle(provisioner, args, global).await,
        Command::Phonebook(args) => phonebook::handle(provisioner, args, global).await,
        Command::Settings(args) => settings::handle(provisioner, args, global).await,
        Command::Render(args) => switch::render(provisioner, args, global),
        Command::Sync => switch::sync(provisioner, global).await,
        Command::Status => switch::status(provisioner, global),
        // Completions are handled before dispatch
        Command::Completions(_) => unreachable!(),
    }
}
