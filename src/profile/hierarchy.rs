//! Parent/child grouping of dependent profiles.
//!
//! A child carries the identity of the login profile that must run before
//! it. The hierarchy groups children by their credential source label and
//! is rebuilt from the flat collection whenever it is needed.

use crate::error::GenerateError;
use std::collections::BTreeMap;
use termprof_config::{Profile, Profiles};

/// A login parent and the profiles that depend on it.
#[derive(Debug, Clone)]
pub struct HierarchyGroup<'a> {
    pub parent: &'a Profile,
    /// Children in collection order
    pub children: Vec<&'a Profile>,
}

/// Source label → group, ordered by label.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy<'a> {
    groups: BTreeMap<String, HierarchyGroup<'a>>,
}

impl<'a> Hierarchy<'a> {
    pub fn get(&self, label: &str) -> Option<&HierarchyGroup<'a>> {
        self.groups.get(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HierarchyGroup<'a>)> {
        self.groups.iter().map(|(label, group)| (label.as_str(), group))
    }

    pub fn labels(&self) -> Vec<&str> {
        self.groups.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn child_count(&self) -> usize {
        self.groups.values().map(|g| g.children.len()).sum()
    }
}

/// Group every profile that names a parent under that parent.
///
/// A parent missing from the collection is fatal: consumers assume it exists.
pub fn derive_hierarchy(profiles: &Profiles) -> Result<Hierarchy<'_>, GenerateError> {
    let mut groups: BTreeMap<String, HierarchyGroup<'_>> = BTreeMap::new();

    for child in profiles {
        let Some(ref parent_guid) = child.parent else {
            continue;
        };
        let label = child
            .origin
            .source_label()
            .unwrap_or(parent_guid.as_str())
            .to_string();

        let Some(parent) = profiles.find_by_guid(parent_guid) else {
            return Err(GenerateError::MissingParent {
                child: child.name.clone(),
                parent: child
                    .origin
                    .source_label()
                    .map(crate::sources::login_name)
                    .unwrap_or_else(|| parent_guid.to_string()),
            });
        };

        groups
            .entry(label)
            .or_insert_with(|| HierarchyGroup {
                parent,
                children: Vec::new(),
            })
            .children
            .push(child);
    }

    crate::debug_log!("HIERARCHY", "Derived {} parent groups", groups.len());
    Ok(Hierarchy { groups })
}
