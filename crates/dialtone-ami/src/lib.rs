// dialtone-ami: Async Rust client for the Asterisk Manager Interface (AMI)

pub mod client;
pub mod error;
pub mod protocol;

pub use client::AmiClient;
pub use error::Error;
pub use protocol::{Action, Packet};
