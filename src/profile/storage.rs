//! Reading and writing the profiles document and the instance cache.
//!
//! The document is `{ "Profiles": [...] }` with four-space indentation.
//! `&` and `>` are emitted literally (serde_json never escapes them), which
//! the terminal's profile loader relies on. Writes go to a temporary file in
//! the destination directory and are renamed into place, so a failed write
//! never leaves a truncated document behind.

use crate::error::GenerateError;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use termprof_config::{Config, Profile, Profiles};

/// File name of the discovered-instance cache inside the cache directory
pub const INSTANCE_CACHE_FILE: &str = "instances.json";

/// `<platform cache dir>/termprof/instances.json`
pub fn default_cache_path() -> Result<PathBuf, GenerateError> {
    Config::cache_dir()
        .map(|dir| dir.join(INSTANCE_CACHE_FILE))
        .ok_or(GenerateError::CacheDirUnavailable)
}

fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, GenerateError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(GenerateError::Serialize)?;
    buf.push(b'\n');
    // serde_json only emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Serialize the profiles document.
pub fn to_json(profiles: &Profiles) -> Result<String, GenerateError> {
    to_pretty_json(profiles)
}

/// Write `contents` to `path` all-or-nothing.
fn atomic_write(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "profiles".to_string());
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    let result = fs::write(&tmp, contents).and_then(|()| fs::rename(&tmp, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Replace the profiles document at `path`.
pub fn write_profiles(path: &Path, profiles: &Profiles) -> Result<(), GenerateError> {
    let json = to_json(profiles)?;
    atomic_write(path, &json).map_err(|source| GenerateError::WriteOutput {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Saved {} profiles to {:?}", profiles.len(), path);
    Ok(())
}

/// Read a previously written profiles document.
pub fn read_profiles(path: &Path) -> Result<Profiles, GenerateError> {
    let contents = fs::read_to_string(path).map_err(|source| GenerateError::ReadPersisted {
        path: path.to_path_buf(),
        source,
    })?;
    let profiles: Profiles =
        serde_json::from_str(&contents).map_err(|source| GenerateError::ParsePersisted {
            path: path.to_path_buf(),
            source,
        })?;
    crate::debug_info!("STORAGE", "Read {} persisted profiles from {:?}", profiles.len(), path);
    Ok(profiles)
}

/// Store the discovered instances as a JSON array.
pub fn write_instance_cache(path: &Path, profiles: &[Profile]) -> Result<(), GenerateError> {
    let json = to_pretty_json(profiles)?;
    atomic_write(path, &json).map_err(|source| GenerateError::WriteCache {
        path: path.to_path_buf(),
        source,
    })?;
    crate::debug_info!("STORAGE", "Cached {} instance profiles at {:?}", profiles.len(), path);
    Ok(())
}

/// Read the instances stored by the last live discovery.
pub fn read_instance_cache(path: &Path) -> Result<Vec<Profile>, GenerateError> {
    let contents = fs::read_to_string(path).map_err(|source| GenerateError::ReadCache {
        path: path.to_path_buf(),
        source,
    })?;
    let profiles: Vec<Profile> =
        serde_json::from_str(&contents).map_err(|source| GenerateError::ParseCache {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("Using {} cached instance profiles from {:?}", profiles.len(), path);
    Ok(profiles)
}
