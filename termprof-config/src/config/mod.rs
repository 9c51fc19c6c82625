//! The termprof configuration file.
//!
//! Stored at `~/.config/termprof/config.yaml`. Every field is optional;
//! command-line flags override whatever the file says.

mod env_vars;
mod persistence;

pub use env_vars::{
    ALLOWED_ENV_VARS, is_env_var_allowed, substitute_variables,
    substitute_variables_with_allowlist,
};
pub use persistence::expand_tilde;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A profile declared by hand in the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfileConfig {
    pub name: String,
    /// Explicit identity; derived from `name` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_text: Option<String>,
    /// Raw iTerm2 keys copied into the profile
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Dynamic profiles document written in write mode and read in diff mode
    #[serde(default = "crate::defaults::output")]
    pub output: String,

    #[serde(default = "crate::defaults::aws_config")]
    pub aws_config: String,

    #[serde(default = "crate::defaults::aws_credentials")]
    pub aws_credentials: String,

    #[serde(default = "crate::defaults::kube_config")]
    pub kube_config: String,

    #[serde(default = "crate::defaults::ssh_config")]
    pub ssh_config: String,

    /// Secret-store service whose entries become profiles
    #[serde(default = "crate::defaults::secret_service")]
    pub secret_service: String,

    /// Upper bound on scopes discovered at the same time
    #[serde(default = "crate::defaults::discovery_concurrency")]
    pub discovery_concurrency: usize,

    #[serde(default = "crate::defaults::default_profile_name")]
    pub default_profile_name: String,

    /// Keys whose passphrase prompts get a password-manager trigger
    #[serde(default = "crate::defaults::identity_files")]
    pub identity_files: Vec<String>,

    /// Missing tool → package installed by the remediation trigger
    #[serde(default = "crate::defaults::remediation_packages")]
    pub remediation_packages: BTreeMap<String, String>,

    /// Directory holding per-profile `<name>.json` trigger lists.
    /// Defaults to `<config dir>/triggers`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggers_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<UserProfileConfig>,

    /// Resolve any `${VAR}`, not just allowlisted ones
    #[serde(default = "crate::defaults::bool_false")]
    pub allow_all_env_vars: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: crate::defaults::output(),
            aws_config: crate::defaults::aws_config(),
            aws_credentials: crate::defaults::aws_credentials(),
            kube_config: crate::defaults::kube_config(),
            ssh_config: crate::defaults::ssh_config(),
            secret_service: crate::defaults::secret_service(),
            discovery_concurrency: crate::defaults::discovery_concurrency(),
            default_profile_name: crate::defaults::default_profile_name(),
            identity_files: crate::defaults::identity_files(),
            remediation_packages: crate::defaults::remediation_packages(),
            triggers_dir: None,
            profiles: Vec::new(),
            allow_all_env_vars: false,
        }
    }
}

impl Config {
    /// Check semantic constraints serde cannot express.
    ///
    /// Returns a list of problems; empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.discovery_concurrency == 0 {
            problems.push("discovery_concurrency must be at least 1".to_string());
        }
        if self.secret_service.trim().is_empty() {
            problems.push("secret_service must not be empty".to_string());
        }
        let mut guids: BTreeMap<&str, usize> = BTreeMap::new();
        for (idx, profile) in self.profiles.iter().enumerate() {
            if let Some(guid) = profile.guid.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
                let first = *guids.entry(guid).or_insert(idx);
                if first != idx {
                    problems.push(format!(
                        "profiles[{idx}] ('{}') reuses the guid of profiles[{first}]",
                        profile.name
                    ));
                }
            }
            if profile.name.trim().is_empty() {
                problems.push(format!("profiles[{idx}] has no name"));
            }
            if profile.guid.as_deref().is_some_and(|g| g.trim().is_empty()) {
                problems.push(format!("profiles[{idx}] ('{}') has an empty guid", profile.name));
            }
        }
        problems
    }
}
