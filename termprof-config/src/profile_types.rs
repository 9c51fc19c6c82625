//! Profile record and collection types.
//!
//! A [`Profile`] serializes to one entry of an iTerm2 dynamic profiles
//! document; [`Profiles`] is the whole `{ "Profiles": [...] }` document.
//! Runtime-only fields (`parent`, `origin`) never reach the output file.

use crate::automation::{KeyboardAction, SmartSelectionRule, Trigger};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

/// Namespace for name-derived profile identifiers. Changing it changes every GUID.
const PROFILE_NAMESPACE: Uuid = Uuid::from_u128(0x3b0f_6c2e_9a41_4d57_8e1f_52c7_a0d4_19e6);

/// Stable cross-run identity of a profile (the iTerm2 `Guid`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileGuid(String);

impl ProfileGuid {
    /// Derive the identifier for a profile name.
    ///
    /// Same name, same GUID, on every run and every machine.
    pub fn from_name(name: &str) -> Self {
        let id = Uuid::new_v5(&PROFILE_NAMESPACE, name.as_bytes());
        Self(id.hyphenated().to_string().to_uppercase())
    }

    /// Wrap an identifier supplied explicitly by a source.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ProfileGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a profile came from (runtime-only, not persisted).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProfileOrigin {
    /// User-declared, or read back from a persisted file.
    #[default]
    Local,
    /// An AWS CLI profile. `source_profile` is set when the profile borrows
    /// credentials from another one.
    AwsAccount {
        aws_profile: String,
        source_profile: Option<String>,
    },
    /// The login profile that must be activated before its dependents.
    AwsLogin { aws_profile: String },
    /// A managed instance found by discovery.
    Instance { scope: String, instance_id: String },
    /// A kubeconfig context.
    Kube { context: String },
    /// An entry of the local secret store.
    SecretStore { service: String, account: String },
    /// A host from the ssh client configuration.
    Ssh { alias: String },
}

impl ProfileOrigin {
    /// Label of the credential source this profile depends on, if any.
    pub fn source_label(&self) -> Option<&str> {
        match self {
            Self::AwsAccount {
                source_profile: Some(source),
                ..
            } => Some(source),
            _ => None,
        }
    }

    pub fn is_login(&self) -> bool {
        matches!(self, Self::AwsLogin { .. })
    }

    /// Short label for log output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::AwsAccount { .. } => "aws",
            Self::AwsLogin { .. } => "aws-login",
            Self::Instance { .. } => "instance",
            Self::Kube { .. } => "k8s",
            Self::SecretStore { .. } => "secret",
            Self::Ssh { .. } => "ssh",
        }
    }
}

/// `"Custom Command"` is a `"Yes"`/`"No"` string in the iTerm2 schema.
mod yes_no {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "Yes" } else { "No" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.eq_ignore_ascii_case("yes"))
    }
}

/// A connection/automation profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Guid", default)]
    pub guid: ProfileGuid,

    /// Whether `command` replaces the login shell.
    #[serde(rename = "Custom Command", with = "yes_no", default)]
    pub custom_command: bool,

    #[serde(rename = "Command", default, skip_serializing_if = "String::is_empty")]
    pub command: String,

    /// Text sent to the session once the shell is up
    #[serde(rename = "Initial Text", default, skip_serializing_if = "Option::is_none")]
    pub initial_text: Option<String>,

    #[serde(rename = "Tags", default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,

    #[serde(rename = "Badge Text", default, skip_serializing_if = "Option::is_none")]
    pub badge_text: Option<String>,

    /// Chord identifier (`0x<key>-0x<modifiers>`) → action
    #[serde(rename = "Keyboard Map", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub keyboard_map: BTreeMap<String, KeyboardAction>,

    #[serde(rename = "Triggers", default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<Trigger>,

    #[serde(
        rename = "Smart Selection Rules",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub smart_selection_rules: Vec<SmartSelectionRule>,

    /// Any other iTerm2 keys, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,

    /// Identity of the login profile that must be activated first.
    #[serde(skip)]
    pub parent: Option<ProfileGuid>,

    #[serde(skip)]
    pub origin: ProfileOrigin,
}

impl Profile {
    /// Create a profile whose GUID is derived from its name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            guid: ProfileGuid::from_name(&name),
            name,
            custom_command: false,
            command: String::new(),
            initial_text: None,
            tags: BTreeSet::new(),
            badge_text: None,
            keyboard_map: BTreeMap::new(),
            triggers: Vec::new(),
            smart_selection_rules: Vec::new(),
            extra: BTreeMap::new(),
            parent: None,
            origin: ProfileOrigin::Local,
        }
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    pub fn with_guid(mut self, guid: ProfileGuid) -> Self {
        self.guid = guid;
        self
    }

    /// Set the command; an empty command falls back to the login shell.
    pub fn command(mut self, cmd: impl Into<String>) -> Self {
        self.command = cmd.into();
        self.custom_command = !self.command.is_empty();
        self
    }

    pub fn initial_text(mut self, text: impl Into<String>) -> Self {
        self.initial_text = Some(text.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !tag.trim().is_empty() {
            self.tags.insert(tag);
        }
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            self = self.tag(tag);
        }
        self
    }

    pub fn badge_text(mut self, text: impl Into<String>) -> Self {
        self.badge_text = Some(text.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn parent(mut self, parent: ProfileGuid) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn origin(mut self, origin: ProfileOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// Validate the fields the engine relies on.
    ///
    /// Returns a list of problems; empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() {
            problems.push("profile name is empty".to_string());
        }
        if self.guid.is_empty() {
            problems.push(format!("profile '{}' has an empty Guid", self.name));
        }
        for trigger in &self.triggers {
            if let Err(e) = trigger.validate() {
                problems.push(format!(
                    "profile '{}' has an invalid trigger regex '{}': {e}",
                    self.name, trigger.regex
                ));
            }
        }
        problems
    }
}

/// An ordered profile collection, serialized as `{ "Profiles": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profiles {
    #[serde(rename = "Profiles", default)]
    pub profiles: Vec<Profile>,
}

impl Profiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(profiles: Vec<Profile>) -> Self {
        Self { profiles }
    }

    pub fn push(&mut self, profile: Profile) {
        self.profiles.push(profile);
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Profile> {
        self.profiles.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Profile> {
        self.profiles.iter_mut()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn find_by_guid(&self, guid: &ProfileGuid) -> Option<&Profile> {
        self.profiles.iter().find(|p| &p.guid == guid)
    }

    /// Names in collection order
    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }

    /// Sort in place by identity key, for order-independent comparison.
    pub fn sort_by_guid(&mut self) {
        self.profiles.sort_by(|a, b| a.guid.cmp(&b.guid));
    }

    pub fn into_vec(self) -> Vec<Profile> {
        self.profiles
    }
}

impl IntoIterator for Profiles {
    type Item = Profile;
    type IntoIter = std::vec::IntoIter<Profile>;

    fn into_iter(self) -> Self::IntoIter {
        self.profiles.into_iter()
    }
}

impl<'a> IntoIterator for &'a Profiles {
    type Item = &'a Profile;
    type IntoIter = std::slice::Iter<'a, Profile>;

    fn into_iter(self) -> Self::IntoIter {
        self.profiles.iter()
    }
}
