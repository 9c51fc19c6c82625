//! Merge candidate profiles from every source into one collection.
//!
//! Candidates arrive concatenated in source precedence order; the first
//! profile with a given name wins and later ones are dropped. A guid is
//! likewise held by one profile only.

use std::collections::{HashMap, HashSet};
use termprof_config::{Profile, Profiles};

/// Outcome of a merge.
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// Unique-by-name collection in first-seen order
    pub profiles: Profiles,
    /// Names of dropped duplicates, once per dropped candidate
    pub duplicates: Vec<String>,
    /// Candidates dropped for a missing name or identity, with the reason
    pub rejected: Vec<String>,
}

/// Merge candidates, keeping the first occurrence of each name.
pub fn merge_profiles(candidates: impl IntoIterator<Item = Profile>) -> MergeReport {
    let mut report = MergeReport::default();
    let mut seen: HashSet<String> = HashSet::new();
    // guid → name of the profile holding it
    let mut guids: HashMap<String, String> = HashMap::new();

    for candidate in candidates {
        if candidate.name.trim().is_empty() {
            log::warn!("Dropping profile without a name (guid '{}')", candidate.guid);
            report
                .rejected
                .push(format!("unnamed profile (guid '{}')", candidate.guid));
            continue;
        }
        if candidate.guid.is_empty() {
            log::warn!("Dropping profile '{}' without a guid", candidate.name);
            report
                .rejected
                .push(format!("profile '{}' has no guid", candidate.name));
            continue;
        }
        if !seen.insert(candidate.name.clone()) {
            log::warn!("Duplicate profile '{}' dropped", candidate.name);
            report.duplicates.push(candidate.name);
            continue;
        }
        if let Some(holder) = guids.get(candidate.guid.as_str()) {
            log::warn!(
                "Dropping profile '{}': guid '{}' already belongs to '{}'",
                candidate.name,
                candidate.guid,
                holder
            );
            report.rejected.push(format!(
                "profile '{}' reuses the guid of '{}'",
                candidate.name, holder
            ));
            continue;
        }
        guids.insert(candidate.guid.to_string(), candidate.name.clone());
        report.profiles.push(candidate);
    }

    crate::debug_info!(
        "MERGE",
        "Merged {} profiles ({} duplicates, {} rejected)",
        report.profiles.len(),
        report.duplicates.len(),
        report.rejected.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use termprof_config::ProfileGuid;

    #[test]
    fn test_first_occurrence_wins() {
        let report = merge_profiles(vec![
            Profile::new("x-foo").command("from-a"),
            Profile::new("x-foo").command("from-b"),
            Profile::new("x-bar"),
        ]);
        assert_eq!(report.profiles.names(), vec!["x-foo", "x-bar"]);
        assert_eq!(report.profiles.profiles[0].command, "from-a");
        assert_eq!(report.duplicates, vec!["x-foo"]);
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let once = merge_profiles(vec![
            Profile::new("a"),
            Profile::new("b"),
            Profile::new("a"),
        ]);
        let twice = merge_profiles(once.profiles.clone());
        assert_eq!(once.profiles, twice.profiles);
        assert!(twice.duplicates.is_empty());
    }

    #[test]
    fn test_invalid_candidates_are_rejected() {
        let report = merge_profiles(vec![
            Profile::new(""),
            Profile::new("no-guid").with_guid(ProfileGuid::new(" ")),
            Profile::new("ok"),
        ]);
        assert_eq!(report.profiles.names(), vec!["ok"]);
        assert_eq!(report.rejected.len(), 2);
    }

    #[test]
    fn test_repeated_guid_keeps_the_first_holder() {
        let shared = ProfileGuid::new("7E57C0DE-0000-5000-8000-000000000001");
        let report = merge_profiles(vec![
            Profile::new("vim").with_guid(shared.clone()),
            Profile::new("nvim").with_guid(shared),
            Profile::new("htop"),
        ]);
        assert_eq!(report.profiles.names(), vec!["vim", "htop"]);
        assert_eq!(report.rejected.len(), 1);
        assert!(report.rejected[0].contains("nvim"));
    }
}
