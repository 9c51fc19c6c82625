//! AWS account and login profiles from the AWS CLI config files.
//!
//! Every AWS CLI profile becomes a profile that opens a login shell with
//! `AWS_PROFILE` set. Profiles that hold their own credentials (no
//! `source_profile`) also get a `login-<name>` profile running the matching
//! login tool; profiles borrowing credentials point at that login profile
//! through [`Profile::parent`].

use super::ProfileGenerator;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use termprof_config::{
    AwsSection, Profile, ProfileGuid, ProfileOrigin, merge_sections, read_aws_ini,
};

pub const LOGIN_PREFIX: &str = "login-";

/// Name of the login profile for an AWS profile that holds credentials.
pub fn login_name(aws_profile: &str) -> String {
    format!("{LOGIN_PREFIX}{aws_profile}")
}

pub struct AwsAccountSource {
    config_path: PathBuf,
    credentials_path: PathBuf,
    user: String,
    search_path: Option<OsString>,
}

impl AwsAccountSource {
    pub fn new(config_path: impl Into<PathBuf>, credentials_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            credentials_path: credentials_path.into(),
            user: current_user(),
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Local account used by `/usr/bin/login`
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// `PATH`-style list searched for the login tools
    pub fn search_path(mut self, path: Option<OsString>) -> Self {
        self.search_path = path;
        self
    }

    /// Sections of the config file with the credentials file folded in.
    fn sections(&self) -> Option<Vec<AwsSection>> {
        let config = match read_aws_ini(&self.config_path) {
            Ok(sections) => sections,
            Err(e) => {
                log::error!("Failed to parse AWS config {:?}: {}", self.config_path, e);
                return None;
            }
        };
        let credentials = read_aws_ini(&self.credentials_path).unwrap_or_else(|e| {
            crate::debug_log!(
                "AWS",
                "No AWS credentials read from {:?}: {}",
                self.credentials_path,
                e
            );
            Vec::new()
        });
        Some(merge_sections(config, credentials))
    }

    fn account_profile(&self, section: &AwsSection) -> Profile {
        let mut profile = Profile::new(&section.name)
            .command(format!(
                "/usr/bin/env AWS_PROFILE={} /usr/bin/login -fp {}",
                section.name, self.user
            ))
            .tag("AWS")
            .origin(ProfileOrigin::AwsAccount {
                aws_profile: section.name.clone(),
                source_profile: section.source_profile().map(String::from),
            });
        if let Some(region) = section.region() {
            profile = profile.tag(region);
        }
        if let Some(source) = section.source_profile() {
            profile = profile.parent(ProfileGuid::from_name(&login_name(source)));
        }
        profile
    }

    fn login_profile(&self, section: &AwsSection) -> Profile {
        Profile::new(login_name(&section.name))
            .command(self.login_command(section))
            .tags(["AWS", "login"])
            .origin(ProfileOrigin::AwsLogin {
                aws_profile: section.name.clone(),
            })
    }

    /// `bash -c '... || sleep 60'` running the login tool the section needs.
    ///
    /// The trailing sleep keeps the session open long enough to read a failure.
    pub fn login_command(&self, section: &AwsSection) -> String {
        let (tool, args) = if section.has("azure_tenant_id") {
            ("aws-azure-login", "--no-prompt")
        } else if section.has("sso_start_url") || section.has("sso_session") {
            ("aws", "sso login")
        } else {
            ("aws", "sts get-caller-identity")
        };

        let path = match find_in_path(tool, self.search_path.as_deref()) {
            Some(dir) => format!("{}:$PATH", dir.display()),
            None => {
                log::warn!("Cannot find '{}' on PATH for profile '{}'", tool, section.name);
                "$PATH".to_string()
            }
        };

        format!(
            "bash -c 'AWS_PROFILE={} PATH={} {} {} || sleep 60'",
            section.name, path, tool, args
        )
    }
}

impl ProfileGenerator for AwsAccountSource {
    fn label(&self) -> &'static str {
        "aws"
    }

    fn generate(&self) -> Vec<Profile> {
        let Some(sections) = self.sections() else {
            return Vec::new();
        };

        let mut profiles = Vec::new();
        for section in sections.iter().filter(|s| !s.name.is_empty()) {
            profiles.push(self.account_profile(section));
            if section.source_profile().is_none() {
                profiles.push(self.login_profile(section));
            }
        }
        profiles
    }
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| {
            log::warn!("Cannot determine the current user, using 'root' for login commands");
            "root".to_string()
        })
}

/// Directory containing `tool` among the entries of a `PATH`-style list.
fn find_in_path(tool: &str, search_path: Option<&std::ffi::OsStr>) -> Option<PathBuf> {
    let search_path = search_path?;
    std::env::split_paths(search_path)
        .find(|dir| is_file(&dir.join(tool)))
}

fn is_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CONFIG: &str = "[profile root]\nregion = eu-west-1\n\n[profile dev]\nsource_profile = root\n\n[profile corp]\nazure_tenant_id = t\n\n[profile sso]\nsso_start_url = https://x\n";

    fn source(dir: &TempDir) -> AwsAccountSource {
        fs::write(dir.path().join("config"), CONFIG).unwrap();
        AwsAccountSource::new(dir.path().join("config"), dir.path().join("credentials"))
            .user("alice")
            .search_path(None)
    }

    #[test]
    fn test_account_and_login_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let profiles = source(&dir).generate();
        let names: Vec<_> = profiles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["root", "login-root", "dev", "corp", "login-corp", "sso", "login-sso"]
        );

        let root = &profiles[0];
        assert_eq!(root.command, "/usr/bin/env AWS_PROFILE=root /usr/bin/login -fp alice");
        assert!(root.tags.contains("AWS"));
        assert!(root.tags.contains("eu-west-1"));
        assert_eq!(root.parent, None);
    }

    #[test]
    fn test_dependent_profile_points_at_login_parent() {
        let dir = tempfile::tempdir().unwrap();
        let profiles = source(&dir).generate();
        let dev = profiles.iter().find(|p| p.name == "dev").unwrap();
        let login = profiles.iter().find(|p| p.name == "login-root").unwrap();
        assert_eq!(dev.parent.as_ref(), Some(&login.guid));
        assert_eq!(dev.origin.source_label(), Some("root"));
        assert!(login.origin.is_login());
    }

    #[test]
    fn test_login_tool_selection() {
        let dir = tempfile::tempdir().unwrap();
        let profiles = source(&dir).generate();
        let command = |name: &str| {
            profiles
                .iter()
                .find(|p| p.name == name)
                .map(|p| p.command.clone())
                .unwrap()
        };
        assert_eq!(
            command("login-corp"),
            "bash -c 'AWS_PROFILE=corp PATH=$PATH aws-azure-login --no-prompt || sleep 60'"
        );
        assert!(command("login-sso").contains("aws sso login || sleep 60'"));
        assert!(command("login-root").contains("aws sts get-caller-identity"));
    }

    #[test]
    fn test_login_tool_directory_is_prepended() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir(&bin).unwrap();
        fs::write(bin.join("aws"), "").unwrap();

        let source = source(&dir).search_path(Some(bin.clone().into_os_string()));
        let section = termprof_config::parse_aws_ini_str("[x]\n").remove(0);
        assert_eq!(
            source.login_command(&section),
            format!(
                "bash -c 'AWS_PROFILE=x PATH={}:$PATH aws sts get-caller-identity || sleep 60'",
                bin.display()
            )
        );
    }

    #[test]
    fn test_credentials_only_profiles_are_included() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("credentials"), "[static]\naws_access_key_id = K\n").unwrap();
        let names: Vec<_> = source(&dir).generate().into_iter().map(|p| p.name).collect();
        assert!(names.contains(&"static".to_string()));
        assert!(names.contains(&"login-static".to_string()));
    }

    #[test]
    fn test_missing_config_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = AwsAccountSource::new(dir.path().join("config"), dir.path().join("credentials"));
        assert!(source.generate().is_empty());
    }
}
