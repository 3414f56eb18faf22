//! Clap derive structures for the `dialtone` CLI.
//!
//! Defines the complete command tree and global flags.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use dialtone_core::{MacAddr, Transport};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// dialtone -- declarative VOIP handset provisioning
#[derive(Debug, Parser)]
#[command(
    name = "dialtone",
    version,
    about = "Provision VOIP handsets and keep an Asterisk switch in sync",
    long_about = "Manages a declarative handset inventory (phones, global \
        defaults, phonebook),\ngenerates Asterisk PJSIP endpoint and dialplan \
        config from it, and reloads the\nswitch over AMI after every change.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file path (default: ~/.config/dialtone/config.toml)
    #[arg(long, short = 'c', env = "DIALTONE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage provisioned phones
    #[command(alias = "p")]
    Phone(PhoneArgs),

    /// Manage the shared phonebook served to handsets
    #[command(alias = "pb")]
    Phonebook(PhonebookArgs),

    /// View or change deployment-wide defaults
    Settings(SettingsArgs),

    /// Preview generated switch config without writing anything
    Render(RenderArgs),

    /// Regenerate switch config, write it, and reload the switch now
    Sync,

    /// Show inventory counts and switch integration state
    Status,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PHONE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PhoneArgs {
    #[command(subcommand)]
    pub command: PhoneCommand,
}

#[derive(Debug, Subcommand)]
pub enum PhoneCommand {
    /// Provision a new phone
    Add {
        /// Hardware address (bare hex or `:`/`-`/`.` separated)
        #[arg(long)]
        mac: MacAddr,

        /// Dialable extension (digits only)
        #[arg(long, short = 'e')]
        extension: String,

        /// Display name used for caller ID
        #[arg(long, short = 'n')]
        name: String,

        /// Handset model, e.g. T54W or X5U
        #[arg(long, short = 'm')]
        model: String,

        /// Line label shown on the handset (defaults to the name)
        #[arg(long)]
        label: Option<String>,

        /// SIP registration password
        #[arg(long)]
        password: Option<String>,

        /// Override the global transport (udp, tcp, tls)
        #[arg(long)]
        transport: Option<Transport>,

        /// Override the global PBX server
        #[arg(long)]
        pbx_server: Option<String>,

        /// Override the global PBX port
        #[arg(long)]
        pbx_port: Option<u16>,

        /// Override the global codec list
        #[arg(long, value_delimiter = ',', value_name = "CODEC,...")]
        codecs: Option<Vec<String>>,
    },

    /// Update fields on an existing phone
    Set {
        /// Hardware address of the phone to update
        mac: MacAddr,

        #[arg(long, short = 'e')]
        extension: Option<String>,

        /// Display name used for caller ID
        #[arg(long, short = 'n')]
        name: Option<String>,

        #[arg(long, short = 'm')]
        model: Option<String>,

        #[arg(long)]
        label: Option<String>,

        #[arg(long)]
        password: Option<String>,

        #[arg(long)]
        transport: Option<Transport>,

        #[arg(long)]
        pbx_server: Option<String>,

        #[arg(long)]
        pbx_port: Option<u16>,

        #[arg(long, value_delimiter = ',', value_name = "CODEC,...")]
        codecs: Option<Vec<String>>,

        /// Move the phone to a new hardware address
        #[arg(long)]
        new_mac: Option<MacAddr>,
    },

    /// Remove a phone
    #[command(alias = "remove")]
    Rm {
        /// Hardware address of the phone to remove
        mac: MacAddr,
    },

    /// List provisioned phones
    #[command(alias = "ls")]
    List,

    /// Show one phone's effective settings and detected vendor
    Show {
        /// Hardware address of the phone to show
        mac: MacAddr,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PHONEBOOK
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PhonebookArgs {
    #[command(subcommand)]
    pub command: PhonebookCommand,
}

#[derive(Debug, Subcommand)]
pub enum PhonebookCommand {
    /// Add a directory entry
    Add {
        /// Name shown on handset displays
        #[arg(long, short = 'n')]
        name: String,

        /// Number dialed when selected
        #[arg(long)]
        number: String,
    },

    /// Update a directory entry
    Set {
        /// 1-based entry index (see `phonebook list`)
        index: usize,

        #[arg(long, short = 'n')]
        name: Option<String>,

        #[arg(long)]
        number: Option<String>,
    },

    /// Remove a directory entry
    #[command(alias = "remove")]
    Rm {
        /// 1-based entry index (see `phonebook list`)
        index: usize,
    },

    /// List directory entries
    #[command(alias = "ls")]
    List,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SETTINGS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Show the deployment-wide defaults
    Show,

    /// Change deployment-wide defaults (triggers a reload)
    Set {
        /// PBX server handsets register against
        #[arg(long)]
        pbx_server: Option<String>,

        #[arg(long)]
        pbx_port: Option<u16>,

        /// Default transport (udp, tcp, tls)
        #[arg(long)]
        transport: Option<Transport>,

        /// Default codec list
        #[arg(long, value_delimiter = ',', value_name = "CODEC,...")]
        codecs: Option<Vec<String>>,

        #[arg(long)]
        ntp_server: Option<String>,

        /// IANA timezone name, e.g. America/New_York
        #[arg(long)]
        timezone: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RENDER / COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Render one device's vendor provisioning file instead of the
    /// switch config
    #[arg(long)]
    pub mac: Option<MacAddr>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
