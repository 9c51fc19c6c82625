//! Profiles declared in the `profiles:` list of the config file.

use super::ProfileGenerator;
use termprof_config::{Profile, ProfileGuid, UserProfileConfig};

pub struct UserProfileSource {
    profiles: Vec<UserProfileConfig>,
}

impl UserProfileSource {
    pub fn new(profiles: Vec<UserProfileConfig>) -> Self {
        Self { profiles }
    }
}

fn to_profile(declared: &UserProfileConfig) -> Profile {
    let mut profile = Profile::new(&declared.name).tags(declared.tags.iter().cloned());
    if let Some(ref guid) = declared.guid {
        profile = profile.with_guid(ProfileGuid::new(guid));
    }
    if let Some(ref command) = declared.command {
        profile = profile.command(command);
    }
    if let Some(ref text) = declared.initial_text {
        profile = profile.initial_text(text);
    }
    if let Some(ref badge) = declared.badge_text {
        profile = profile.badge_text(badge);
    }
    for (key, value) in &declared.extra {
        profile = profile.extra(key, value.clone());
    }
    profile
}

impl ProfileGenerator for UserProfileSource {
    fn label(&self) -> &'static str {
        "user"
    }

    fn generate(&self) -> Vec<Profile> {
        self.profiles.iter().map(to_profile).collect()
    }
}
