//! Shared integration test helpers for termprof.
//!
//! Include with `mod common;` at the top of a test file. The
//! `#[allow(dead_code)]` keeps files that use only part of it warning-free.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use termprof::discovery::{DiscoveryError, InstanceDirectory, Scope};
use termprof::sources::{
    AwsAccountSource, DefaultProfileSource, ProfileGenerator, UserProfileSource,
};
use termprof_config::Config;
use tempfile::TempDir;

fn denied(step: &'static str) -> DiscoveryError {
    DiscoveryError::CommandFailed {
        step,
        status: "exit status: 255".to_string(),
        stderr: "AccessDenied".to_string(),
    }
}

/// Canned answers for one scope.
#[derive(Debug, Clone, Default)]
pub struct FakeAccount {
    account_id: Option<String>,
    alias: Option<String>,
    fail_alias: bool,
    instances: Option<Vec<String>>,
    names: HashMap<String, String>,
    fail_names: bool,
}

impl FakeAccount {
    pub fn new(account_id: &str) -> Self {
        Self {
            account_id: Some(account_id.to_string()),
            instances: Some(Vec::new()),
            ..Self::default()
        }
    }

    /// Identity lookup fails.
    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn instance(mut self, id: &str, name: &str) -> Self {
        self.instances.get_or_insert_with(Vec::new).push(id.to_string());
        self.names.insert(id.to_string(), name.to_string());
        self
    }

    pub fn unnamed_instance(mut self, id: &str) -> Self {
        self.instances.get_or_insert_with(Vec::new).push(id.to_string());
        self
    }

    pub fn failing_alias(mut self) -> Self {
        self.fail_alias = true;
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.instances = None;
        self
    }

    pub fn failing_names(mut self) -> Self {
        self.fail_names = true;
        self
    }
}

/// In-memory [`InstanceDirectory`] keyed by scope name.
#[derive(Debug, Default)]
pub struct FakeDirectory {
    accounts: HashMap<String, FakeAccount>,
    name_lookups: AtomicUsize,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(mut self, name: &str, account: FakeAccount) -> Self {
        self.accounts.insert(name.to_string(), account);
        self
    }

    pub fn name_lookups(&self) -> usize {
        self.name_lookups.load(Ordering::SeqCst)
    }

    fn account(&self, scope: &Scope) -> Option<&FakeAccount> {
        self.accounts.get(&scope.name)
    }
}

impl InstanceDirectory for FakeDirectory {
    fn caller_account(&self, scope: &Scope) -> Result<String, DiscoveryError> {
        self.account(scope)
            .and_then(|a| a.account_id.clone())
            .ok_or_else(|| denied("sts get-caller-identity"))
    }

    fn account_alias(&self, scope: &Scope) -> Result<Option<String>, DiscoveryError> {
        match self.account(scope) {
            Some(a) if a.fail_alias => Err(denied("iam list-account-aliases")),
            Some(a) => Ok(a.alias.clone()),
            None => Ok(None),
        }
    }

    fn managed_instances(&self, scope: &Scope) -> Result<Vec<String>, DiscoveryError> {
        self.account(scope)
            .and_then(|a| a.instances.clone())
            .ok_or_else(|| denied("ssm describe-instance-information"))
    }

    fn instance_name(&self, scope: &Scope, instance_id: &str) -> Result<Option<String>, DiscoveryError> {
        self.name_lookups.fetch_add(1, Ordering::SeqCst);
        match self.account(scope) {
            Some(a) if a.fail_names => Err(denied("ec2 describe-instances")),
            Some(a) => Ok(a.names.get(instance_id).cloned()),
            None => Ok(None),
        }
    }
}

/// A temporary home for one generation run.
///
/// Every path the config names points inside the temp dir, so nothing on
/// the real machine is read or written.
pub struct TestContext {
    pub temp_dir: TempDir,
    pub config: Config,
}

impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path();
        let path = |name: &str| root.join(name).to_string_lossy().into_owned();
        let config = Config {
            output: path("DynamicProfiles/termprof.json"),
            aws_config: path("aws/config"),
            aws_credentials: path("aws/credentials"),
            kube_config: path("kube/config"),
            ssh_config: path("ssh/config"),
            identity_files: Vec::new(),
            triggers_dir: Some(path("triggers")),
            ..Config::default()
        };
        Self { temp_dir, config }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn output_path(&self) -> PathBuf {
        self.config.output_path()
    }

    pub fn cache_path(&self) -> PathBuf {
        self.root().join("cache").join("instances.json")
    }

    /// Write the AWS config file.
    pub fn aws_config(&self, contents: &str) {
        write_file(&self.config.aws_config_path(), contents);
    }

    /// Sources with no dependence on the host machine.
    pub fn sources(&self) -> Vec<Box<dyn ProfileGenerator>> {
        vec![
            Box::new(
                AwsAccountSource::new(
                    self.config.aws_config_path(),
                    self.config.aws_credentials_path(),
                )
                .user("tester")
                .search_path(None),
            ),
            Box::new(DefaultProfileSource::new(&self.config.default_profile_name)),
            Box::new(UserProfileSource::new(self.config.profiles.clone())),
        ]
    }
}

pub fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(path, contents).expect("Failed to write file");
}
