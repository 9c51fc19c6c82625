use super::ProfileGenerator;
use termprof_config::Profile;

/// The plain local-shell profile.
pub struct DefaultProfileSource {
    name: String,
}

impl DefaultProfileSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ProfileGenerator for DefaultProfileSource {
    fn label(&self) -> &'static str {
        "default"
    }

    fn generate(&self) -> Vec<Profile> {
        vec![
            Profile::new(&self.name)
                .badge_text("")
                .extra("Allow Title Setting", serde_json::Value::Bool(true)),
        ]
    }
}
