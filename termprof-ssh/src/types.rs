//! SSH host types.

use serde::{Deserialize, Serialize};

/// A connectable host declared in the ssh client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshHost {
    /// The `Host` alias; `ssh <alias>` picks up every other setting
    pub alias: String,
    /// Resolved hostname or IP address
    pub hostname: Option<String>,
    pub user: Option<String>,
    /// SSH port (None means default 22)
    pub port: Option<u16>,
    pub identity_file: Option<String>,
    pub proxy_jump: Option<String>,
}

impl SshHost {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            hostname: None,
            user: None,
            port: None,
            identity_file: None,
            proxy_jump: None,
        }
    }

    /// Get the connection target (hostname or alias)
    pub fn connection_target(&self) -> &str {
        self.hostname.as_deref().unwrap_or(&self.alias)
    }

    /// Arguments for `ssh` that reach this host through the config entry.
    pub fn ssh_args(&self) -> Vec<String> {
        vec![self.alias.clone()]
    }

    /// `user@host:port`, omitting parts that are defaults
    pub fn connection_string(&self) -> String {
        let mut s = String::new();
        if let Some(ref user) = self.user {
            s.push_str(user);
            s.push('@');
        }
        s.push_str(self.connection_target());
        if let Some(port) = self.port
            && port != 22
        {
            s.push(':');
            s.push_str(&port.to_string());
        }
        s
    }

    pub fn is_jumped(&self) -> bool {
        self.proxy_jump.is_some()
    }
}
