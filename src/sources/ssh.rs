//! One profile per concrete `Host` of the ssh client configuration.

use super::ProfileGenerator;
use std::path::PathBuf;
use termprof_config::{Profile, ProfileOrigin};
use termprof_ssh::{SshHost, parse_ssh_config};

pub struct SshHostSource {
    path: PathBuf,
}

impl SshHostSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// `ssh <alias>`, quoted for the shell.
fn ssh_command(host: &SshHost) -> String {
    let mut words = vec!["ssh".to_string()];
    words.extend(host.ssh_args());
    shell_words::join(words)
}

fn host_profile(host: &SshHost) -> Profile {
    Profile::new(format!("ssh-{}", host.alias))
        .command(ssh_command(host))
        .tags(["ssh", host.connection_target()])
        .badge_text(host.connection_string())
        .origin(ProfileOrigin::Ssh {
            alias: host.alias.clone(),
        })
}

impl ProfileGenerator for SshHostSource {
    fn label(&self) -> &'static str {
        "ssh"
    }

    fn generate(&self) -> Vec<Profile> {
        parse_ssh_config(&self.path).iter().map(host_profile).collect()
    }
}
