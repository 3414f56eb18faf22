mod cli;
mod commands;
mod error;
mod output;

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dialtone_core::Provisioner;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Completions never need the config or the inventory.
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "dialtone", &mut std::io::stdout());
            Ok(())
        }

        command => {
            let provisioner = open_provisioner(&cli.global)?;
            tracing::debug!(command = ?command, "dispatching command");
            commands::dispatch(command, &provisioner, &cli.global).await
        }
    }
}

/// Load the operator config and assemble the provisioning pipeline.
///
/// Relative paths in the config resolve against the config file's own
/// directory, so a deployment can keep its artifacts next to it.
fn open_provisioner(global: &GlobalOpts) -> Result<Provisioner, CliError> {
    let path = global
        .config
        .clone()
        .unwrap_or_else(dialtone_config::config_path);
    let as_config_error = |source| CliError::Config {
        path: path.display().to_string(),
        source,
    };

    let config = dialtone_config::load_config(&path).map_err(as_config_error)?;
    let base = path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

    let store = config.store_config(&base);
    let switch = config.switch_config(&base).map_err(as_config_error)?;
    let oui_table = config.oui_table().map_err(as_config_error)?;

    Ok(Provisioner::open(store, switch, oui_table)?)
}
