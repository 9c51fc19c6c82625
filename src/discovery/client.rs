//! Remote calls made while discovering one scope.
//!
//! [`InstanceDirectory`] is the seam between the fan-out and the cloud API.
//! [`AwsCliDirectory`] implements it by shelling out to the `aws` CLI with
//! `--output json` and decoding the responses with serde.

use super::error::DiscoveryError;
use super::scopes::Scope;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::process::Command;

/// Blocking lookups against the remote API for one scope.
pub trait InstanceDirectory: Send + Sync {
    /// Account identity of the caller
    fn caller_account(&self, scope: &Scope) -> Result<String, DiscoveryError>;

    /// First account alias, if the account has one
    fn account_alias(&self, scope: &Scope) -> Result<Option<String>, DiscoveryError>;

    /// Ids of the managed instances reachable under the scope
    fn managed_instances(&self, scope: &Scope) -> Result<Vec<String>, DiscoveryError>;

    /// Value of the instance's `Name` tag
    fn instance_name(&self, scope: &Scope, instance_id: &str)
    -> Result<Option<String>, DiscoveryError>;
}

const STS_IDENTITY: &str = "aws sts get-caller-identity";
const IAM_ALIASES: &str = "aws iam list-account-aliases";
const SSM_INSTANCES: &str = "aws ssm describe-instance-information";
const EC2_INSTANCES: &str = "aws ec2 describe-instances";

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CallerIdentity {
    #[serde(default)]
    account: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AccountAliases {
    #[serde(default)]
    account_aliases: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceInformationList {
    #[serde(default)]
    instance_information_list: Vec<InstanceInformation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceInformation {
    instance_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstances {
    #[serde(default)]
    reservations: Vec<Reservation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Reservation {
    #[serde(default)]
    instances: Vec<Ec2Instance>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Ec2Instance {
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Tag {
    key: String,
    #[serde(default)]
    value: String,
}

fn decode<T: DeserializeOwned>(step: &'static str, stdout: &[u8]) -> Result<T, DiscoveryError> {
    serde_json::from_slice(stdout).map_err(|source| DiscoveryError::Parse { step, source })
}

fn parse_caller_account(stdout: &[u8]) -> Result<String, DiscoveryError> {
    decode::<CallerIdentity>(STS_IDENTITY, stdout)?
        .account
        .filter(|a| !a.is_empty())
        .ok_or(DiscoveryError::Missing {
            step: STS_IDENTITY,
            what: "account id",
        })
}

fn parse_account_alias(stdout: &[u8]) -> Result<Option<String>, DiscoveryError> {
    Ok(decode::<AccountAliases>(IAM_ALIASES, stdout)?
        .account_aliases
        .into_iter()
        .next())
}

fn parse_instance_ids(stdout: &[u8]) -> Result<Vec<String>, DiscoveryError> {
    Ok(decode::<InstanceInformationList>(SSM_INSTANCES, stdout)?
        .instance_information_list
        .into_iter()
        .map(|i| i.instance_id)
        .collect())
}

fn parse_name_tag(stdout: &[u8]) -> Result<Option<String>, DiscoveryError> {
    let described = decode::<DescribeInstances>(EC2_INSTANCES, stdout)?;
    let instance = described
        .reservations
        .into_iter()
        .flat_map(|r| r.instances)
        .next()
        .ok_or(DiscoveryError::Missing {
            step: EC2_INSTANCES,
            what: "instance",
        })?;
    Ok(instance
        .tags
        .into_iter()
        .find(|t| t.key == "Name")
        .map(|t| t.value))
}

/// [`InstanceDirectory`] backed by the `aws` command-line client.
///
/// Scopes name profiles in the AWS config termprof read them from, so the
/// child process is pointed at those same files.
#[derive(Debug, Clone)]
pub struct AwsCliDirectory {
    program: String,
    config_file: Option<PathBuf>,
    credentials_file: Option<PathBuf>,
}

impl Default for AwsCliDirectory {
    fn default() -> Self {
        Self::new("aws")
    }
}

impl AwsCliDirectory {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            config_file: None,
            credentials_file: None,
        }
    }

    /// Resolve `--profile` against these files instead of the CLI's defaults.
    pub fn aws_files(mut self, config_file: impl Into<PathBuf>, credentials_file: impl Into<PathBuf>) -> Self {
        self.config_file = Some(config_file.into());
        self.credentials_file = Some(credentials_file.into());
        self
    }

    /// Run `aws <args>` for `scope` and return its stdout.
    fn run(&self, step: &'static str, scope: &Scope, args: &[&str]) -> Result<Vec<u8>, DiscoveryError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .args(["--profile", scope.name.as_str(), "--output", "json"]);
        if !scope.region.is_empty() {
            cmd.args(["--region", scope.region.as_str()]);
        }
        if let Some(ref path) = self.config_file {
            cmd.env("AWS_CONFIG_FILE", path);
        }
        if let Some(ref path) = self.credentials_file {
            cmd.env("AWS_SHARED_CREDENTIALS_FILE", path);
        }

        crate::debug_trace!("DISCOVERY", "[{}] {}", scope.name, step);
        let output = cmd
            .output()
            .map_err(|source| DiscoveryError::Spawn { step, source })?;
        if !output.status.success() {
            return Err(DiscoveryError::CommandFailed {
                step,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

impl InstanceDirectory for AwsCliDirectory {
    fn caller_account(&self, scope: &Scope) -> Result<String, DiscoveryError> {
        let stdout = self.run(STS_IDENTITY, scope, &["sts", "get-caller-identity"])?;
        parse_caller_account(&stdout)
    }

    fn account_alias(&self, scope: &Scope) -> Result<Option<String>, DiscoveryError> {
        let stdout = self.run(IAM_ALIASES, scope, &["iam", "list-account-aliases"])?;
        parse_account_alias(&stdout)
    }

    fn managed_instances(&self, scope: &Scope) -> Result<Vec<String>, DiscoveryError> {
        let stdout = self.run(
            SSM_INSTANCES,
            scope,
            &["ssm", "describe-instance-information"],
        )?;
        parse_instance_ids(&stdout)
    }

    fn instance_name(
        &self,
        scope: &Scope,
        instance_id: &str,
    ) -> Result<Option<String>, DiscoveryError> {
        let stdout = self.run(
            EC2_INSTANCES,
            scope,
            &["ec2", "describe-instances", "--instance-ids", instance_id],
        )?;
        parse_name_tag(&stdout)
    }
}
