//! Credential scopes read from the AWS config file.

use std::path::Path;
use termprof_config::{AwsSection, read_aws_ini};

/// One AWS CLI profile under which discovery runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub name: String,
    /// Region hint from the same section; empty when unset
    pub region: String,
}

impl Scope {
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
        }
    }
}

/// Scopes in file order. An unreadable file yields no scopes.
pub fn read_scopes(path: &Path) -> Vec<Scope> {
    match read_aws_ini(path) {
        Ok(sections) => scopes_from_sections(&sections),
        Err(e) => {
            crate::debug_error!("DISCOVERY", "Failed to parse AWS config {:?}: {}", path, e);
            Vec::new()
        }
    }
}

pub fn scopes_from_sections(sections: &[AwsSection]) -> Vec<Scope> {
    sections
        .iter()
        .filter(|s| !s.name.is_empty())
        .map(|s| Scope::new(&s.name, s.region().unwrap_or_default()))
        .collect()
}
