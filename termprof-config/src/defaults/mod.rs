//! Default value functions for configuration.
//!
//! Used as `#[serde(default = "crate::defaults::...")]` attributes on
//! `Config` fields and by `Config::default()`.

use std::collections::BTreeMap;

pub fn bool_false() -> bool {
    false
}

pub fn output() -> String {
    "~/Library/Application Support/iTerm2/DynamicProfiles/termprof.json".to_string()
}

pub fn aws_config() -> String {
    "~/.aws/config".to_string()
}

pub fn aws_credentials() -> String {
    "~/.aws/credentials".to_string()
}

pub fn kube_config() -> String {
    "~/.kube/config".to_string()
}

pub fn ssh_config() -> String {
    "~/.ssh/config".to_string()
}

pub fn secret_service() -> String {
    "termprof".to_string()
}

pub fn discovery_concurrency() -> usize {
    8
}

pub fn default_profile_name() -> String {
    "default-profile".to_string()
}

pub fn identity_files() -> Vec<String> {
    vec!["~/.ssh/id_rsa".to_string(), "~/.ssh/id_ed25519".to_string()]
}

/// Missing tool → package providing it
pub fn remediation_packages() -> BTreeMap<String, String> {
    [
        ("ssh-add", "openssh-client"),
        ("git", "git"),
        ("ping", "iputils-ping"),
    ]
    .into_iter()
    .map(|(tool, package)| (tool.to_string(), package.to_string()))
    .collect()
}
