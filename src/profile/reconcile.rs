//! Decide what happens to a freshly generated collection.
//!
//! Exactly one [`OutputMode`] applies per run: persist it, print it, or
//! compare it with the persisted document and report the difference.

use super::storage;
use crate::error::GenerateError;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Write;
use std::path::Path;
use termprof_config::Profiles;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Replace the output file
    Write,
    /// Report the difference against the output file
    Diff,
    /// Print the document to stdout
    Print,
}

impl OutputMode {
    /// Resolve the `--write` / `--diff` flags. Both at once is a usage error.
    pub fn from_flags(write: bool, diff: bool) -> Result<Self, GenerateError> {
        match (write, diff) {
            (true, true) => Err(GenerateError::ConflictingModes),
            (true, false) => Ok(Self::Write),
            (false, true) => Ok(Self::Diff),
            (false, false) => Ok(Self::Print),
        }
    }
}

/// One difference between the persisted and the new collection, keyed by guid.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffEntry {
    Added {
        guid: String,
        name: String,
    },
    Removed {
        guid: String,
        name: String,
    },
    /// `None` means the key is absent on that side.
    Changed {
        guid: String,
        name: String,
        key: String,
        current: Option<Value>,
        new: Option<Value>,
    },
}

fn compact(value: &Option<Value>) -> String {
    match value {
        Some(v) => serde_json::to_string(v).unwrap_or_else(|_| v.to_string()),
        None => "<absent>".to_string(),
    }
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { guid, name } => write!(f, "+ {name} ({guid})"),
            Self::Removed { guid, name } => write!(f, "- {name} ({guid})"),
            Self::Changed {
                name,
                key,
                current,
                new,
                ..
            } => write!(
                f,
                "~ {name} [{key}]\n    - {}\n    + {}",
                compact(current),
                compact(new)
            ),
        }
    }
}

/// Profiles as JSON objects keyed by guid. The first of a repeated guid wins.
fn by_guid(profiles: &Profiles) -> Result<BTreeMap<String, serde_json::Map<String, Value>>, GenerateError> {
    let mut sorted = profiles.clone();
    sorted.sort_by_guid();

    let mut map = BTreeMap::new();
    for profile in sorted.iter() {
        let Value::Object(object) = serde_json::to_value(profile).map_err(GenerateError::Serialize)?
        else {
            continue;
        };
        map.entry(profile.guid.to_string()).or_insert(object);
    }
    Ok(map)
}

fn name_of(object: &serde_json::Map<String, Value>) -> String {
    object
        .get("Name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Structural difference between `current` and `new`, order-independent.
pub fn diff_profiles(current: &Profiles, new: &Profiles) -> Result<Vec<DiffEntry>, GenerateError> {
    let current = by_guid(current)?;
    let new = by_guid(new)?;
    let guids: BTreeSet<&String> = current.keys().chain(new.keys()).collect();

    let mut entries = Vec::new();
    for guid in guids {
        match (current.get(guid), new.get(guid)) {
            (Some(old), None) => entries.push(DiffEntry::Removed {
                guid: guid.clone(),
                name: name_of(old),
            }),
            (None, Some(added)) => entries.push(DiffEntry::Added {
                guid: guid.clone(),
                name: name_of(added),
            }),
            (Some(old), Some(updated)) => {
                let keys: BTreeSet<&String> = old.keys().chain(updated.keys()).collect();
                for key in keys {
                    let (before, after) = (old.get(key), updated.get(key));
                    if before != after {
                        entries.push(DiffEntry::Changed {
                            guid: guid.clone(),
                            name: name_of(updated),
                            key: key.clone(),
                            current: before.cloned(),
                            new: after.cloned(),
                        });
                    }
                }
            }
            (None, None) => {}
        }
    }
    Ok(entries)
}

/// What a reconciliation did.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    Written { count: usize },
    Printed { count: usize },
    Diffed { entries: Vec<DiffEntry> },
}

/// Write the diff report; nothing at all when there is no difference.
pub fn write_diff_report(entries: &[DiffEntry], out: &mut dyn Write) -> std::io::Result<()> {
    if entries.is_empty() {
        return Ok(());
    }
    writeln!(out, "Updating (-current +new):")?;
    for entry in entries {
        writeln!(out, "{entry}")?;
    }
    Ok(())
}

/// Apply `mode` to `profiles`. Print and diff output goes to `out`.
pub fn reconcile(
    mode: OutputMode,
    profiles: &Profiles,
    output_path: &Path,
    out: &mut dyn Write,
) -> anyhow::Result<ReconcileOutcome> {
    use anyhow::Context;

    match mode {
        OutputMode::Write => {
            storage::write_profiles(output_path, profiles)?;
            Ok(ReconcileOutcome::Written {
                count: profiles.len(),
            })
        }
        OutputMode::Print => {
            let json = storage::to_json(profiles)?;
            out.write_all(json.as_bytes())
                .context("Failed to print profiles")?;
            Ok(ReconcileOutcome::Printed {
                count: profiles.len(),
            })
        }
        OutputMode::Diff => {
            let persisted = storage::read_profiles(output_path)?;
            let entries = diff_profiles(&persisted, profiles)?;
            write_diff_report(&entries, out).context("Failed to print diff")?;
            Ok(ReconcileOutcome::Diffed { entries })
        }
    }
}
