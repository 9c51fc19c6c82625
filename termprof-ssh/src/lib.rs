//! SSH client configuration reader for termprof.
//!
//! Turns `Host` entries of `~/.ssh/config` into [`SshHost`] records that the
//! generator converts into profiles.

pub mod config_parser;
pub mod types;

pub use config_parser::{parse_ssh_config, parse_ssh_config_str};
pub use types::SshHost;
