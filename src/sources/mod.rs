//! Profile sources.
//!
//! Each source turns one kind of local configuration into candidate
//! profiles. Sources never fail: a source that cannot read its input logs
//! the cause and yields nothing, and the run carries on with the others.
//!
//! Discovered instances are not a [`ProfileGenerator`]; they come from the
//! asynchronous fan-out in [`crate::discovery`].

mod aws;
mod default;
mod keychain;
mod kube;
mod ssh;
mod user;

pub use aws::{AwsAccountSource, LOGIN_PREFIX, login_name};
pub use default::DefaultProfileSource;
pub use keychain::{SecretStoreSource, parse_dump_keychain};
pub use kube::KubeContextSource;
pub use ssh::SshHostSource;
pub use user::UserProfileSource;

use termprof_config::{Config, Profile};

/// A synchronous producer of candidate profiles.
pub trait ProfileGenerator {
    /// Short name used in log output
    fn label(&self) -> &'static str;

    fn generate(&self) -> Vec<Profile>;
}

/// The configured sources, in merge precedence order.
pub fn default_sources(config: &Config) -> Vec<Box<dyn ProfileGenerator>> {
    vec![
        Box::new(AwsAccountSource::new(
            config.aws_config_path(),
            config.aws_credentials_path(),
        )),
        Box::new(KubeContextSource::new(config.kube_config_path())),
        Box::new(SecretStoreSource::new(&config.secret_service)),
        Box::new(DefaultProfileSource::new(&config.default_profile_name)),
        Box::new(SshHostSource::new(config.ssh_config_path())),
        Box::new(UserProfileSource::new(config.profiles.clone())),
    ]
}

/// Run every source in order and concatenate their output.
pub fn collect(sources: &[Box<dyn ProfileGenerator>]) -> Vec<Profile> {
    let mut candidates = Vec::new();
    for source in sources {
        let profiles = source.generate();
        crate::debug_info!(
            "SOURCES",
            "{} produced {} profiles",
            source.label(),
            profiles.len()
        );
        candidates.extend(profiles);
    }
    candidates
}
