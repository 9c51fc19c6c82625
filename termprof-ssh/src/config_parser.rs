//! Parser for ~/.ssh/config files.
//!
//! Extracts connectable `Host` entries. Wildcard patterns are defaults, not
//! targets, and are skipped; settings under `Match` blocks are ignored.

use super::types::SshHost;
use std::path::Path;

/// Parse an SSH config file. A missing or unreadable file yields no hosts.
pub fn parse_ssh_config(path: &Path) -> Vec<SshHost> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_ssh_config_str(&content),
        Err(e) => {
            log::debug!("Cannot read ssh config {:?}: {}", path, e);
            Vec::new()
        }
    }
}

/// Settings collected for the `Host` line currently being read.
#[derive(Default)]
struct HostBlock {
    aliases: Vec<String>,
    template: Option<SshHost>,
}

impl HostBlock {
    fn start(patterns: &str) -> Self {
        let aliases: Vec<String> = patterns
            .split_whitespace()
            .filter(|a| !a.contains('*') && !a.contains('?') && !a.starts_with('!'))
            .map(String::from)
            .collect();
        Self {
            template: (!aliases.is_empty()).then(|| SshHost::new(String::new())),
            aliases,
        }
    }

    fn apply(&mut self, key: &str, value: &str) {
        let Some(host) = self.template.as_mut() else {
            return;
        };
        // First value wins, as in ssh(1)
        match key {
            "hostname" => {
                host.hostname.get_or_insert_with(|| value.to_string());
            }
            "user" => {
                host.user.get_or_insert_with(|| value.to_string());
            }
            "port" => {
                if host.port.is_none() {
                    host.port = value.parse().ok();
                }
            }
            "identityfile" => {
                host.identity_file
                    .get_or_insert_with(|| expand_home(value));
            }
            "proxyjump" => {
                host.proxy_jump.get_or_insert_with(|| value.to_string());
            }
            _ => {}
        }
    }

    fn flush(self, hosts: &mut Vec<SshHost>) {
        let Some(template) = self.template else {
            return;
        };
        for alias in self.aliases {
            if hosts.iter().any(|h| h.alias == alias) {
                continue;
            }
            hosts.push(SshHost {
                alias,
                ..template.clone()
            });
        }
    }
}

/// Parse SSH config from a string.
///
/// Multi-host lines like `Host foo bar` produce one entry per alias.
pub fn parse_ssh_config_str(content: &str) -> Vec<SshHost> {
    let mut hosts = Vec::new();
    let mut block = HostBlock::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = split_directive(line) else {
            continue;
        };

        match key.as_str() {
            "host" => {
                std::mem::take(&mut block).flush(&mut hosts);
                block = HostBlock::start(value);
            }
            "match" => {
                std::mem::take(&mut block).flush(&mut hosts);
            }
            "include" => log::debug!("ssh config Include '{}' not followed", value),
            _ => block.apply(&key, value),
        }
    }
    block.flush(&mut hosts);

    hosts
}

/// Split `Key value` or `Key=value` into a lowercased key and its value.
fn split_directive(line: &str) -> Option<(String, &str)> {
    let split_at = line.find(|c: char| c == '=' || c.is_whitespace())?;
    let (key, rest) = line.split_at(split_at);
    let value = rest
        .trim_start()
        .strip_prefix('=')
        .unwrap_or(rest)
        .trim()
        .trim_matches('"');
    if value.is_empty() {
        return None;
    }
    Some((key.to_lowercase(), value))
}

fn expand_home(value: &str) -> String {
    match (value.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest).display().to_string(),
        _ => value.to_string(),
    }
}
