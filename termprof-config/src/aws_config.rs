//! Reader for the AWS CLI's INI files (`~/.aws/config`, `~/.aws/credentials`).
//!
//! Only the subset the generator needs is understood: `[section]` headers,
//! `key = value` pairs, and `#`/`;` comment lines. Nested sub-sections
//! (indented `s3 =` blocks) are folded into their parent as plain keys.

use std::collections::BTreeMap;
use std::path::Path;

/// One named section of an AWS INI file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AwsSection {
    /// Profile name with any `profile ` prefix removed.
    pub name: String,
    pub values: BTreeMap<String, String>,
}

impl AwsSection {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn region(&self) -> Option<&str> {
        self.get("region").filter(|r| !r.is_empty())
    }

    pub fn source_profile(&self) -> Option<&str> {
        self.get("source_profile").filter(|s| !s.is_empty())
    }
}

/// Read and parse an AWS INI file.
///
/// Returns an error only when the file cannot be read; malformed lines are
/// skipped with a debug log.
pub fn read_aws_ini(path: &Path) -> std::io::Result<Vec<AwsSection>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_aws_ini_str(&content))
}

/// Parse AWS INI content. Sections keep file order; a repeated section
/// name merges into the first occurrence.
pub fn parse_aws_ini_str(content: &str) -> Vec<AwsSection> {
    let mut sections: Vec<AwsSection> = Vec::new();
    let mut current: Option<usize> = None;

    for (line_no, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = section_name(header);
            if name.is_empty() {
                current = None;
                continue;
            }
            current = match sections.iter().position(|s| s.name == name) {
                Some(idx) => Some(idx),
                None => {
                    sections.push(AwsSection {
                        name: name.to_string(),
                        values: BTreeMap::new(),
                    });
                    Some(sections.len() - 1)
                }
            };
            continue;
        }

        let Some(idx) = current else {
            log::debug!("aws ini line {} outside any section, skipped", line_no + 1);
            continue;
        };

        match line.split_once('=') {
            Some((key, value)) => {
                let key = key.trim();
                if key.is_empty() {
                    continue;
                }
                sections[idx]
                    .values
                    .entry(key.to_string())
                    .or_insert_with(|| value.trim().to_string());
            }
            None => log::debug!("aws ini line {} has no '=', skipped", line_no + 1),
        }
    }

    sections
}

/// Merge credentials-file sections into config-file sections.
///
/// Config sections come first and keep their values; keys only present in
/// the credentials file are added, and credentials-only profiles are appended.
pub fn merge_sections(config: Vec<AwsSection>, credentials: Vec<AwsSection>) -> Vec<AwsSection> {
    let mut merged = config;
    for cred in credentials {
        match merged.iter_mut().find(|s| s.name == cred.name) {
            Some(existing) => {
                for (key, value) in cred.values {
                    existing.values.entry(key).or_insert(value);
                }
            }
            None => merged.push(cred),
        }
    }
    merged
}

fn section_name(header: &str) -> &str {
    let header = header.trim();
    header
        .strip_prefix("profile ")
        .map(str::trim)
        .unwrap_or(header)
}
