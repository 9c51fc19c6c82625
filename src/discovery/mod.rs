//! Concurrent discovery of managed instances across AWS credential scopes.
//!
//! - **Scopes** (`scopes`): one per AWS CLI profile, read from the AWS config file
//! - **Client** (`client`): the [`InstanceDirectory`] seam and its `aws` CLI implementation
//! - **Accumulator** (`accumulator`): instance-id dedup shared by every worker
//!
//! Each scope runs a sequential four-step chain (account id, alias, instance
//! list, per-instance name). Every step carries a [`FailurePolicy`]; a single
//! driver applies it, so a failing scope either contributes nothing or
//! continues with a fallback value. Scopes run as tokio tasks joined before
//! returning, with the blocking chain on the blocking pool and a semaphore
//! bounding how many run at once.

mod accumulator;
mod client;
mod error;
mod scopes;

pub use accumulator::DiscoveryAccumulator;
pub use client::{AwsCliDirectory, InstanceDirectory};
pub use error::DiscoveryError;
pub use scopes::{Scope, read_scopes, scopes_from_sections};

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use termprof_config::{Profile, ProfileOrigin};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// The remote calls made for one scope, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStep {
    AccountId,
    AccountAlias,
    ListInstances,
    InstanceName,
}

/// What a failed step does to the rest of its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The scope contributes nothing.
    Abort,
    /// Continue with a fallback value.
    Degrade,
}

impl DiscoveryStep {
    pub fn failure_policy(self) -> FailurePolicy {
        match self {
            Self::AccountId | Self::ListInstances => FailurePolicy::Abort,
            Self::AccountAlias | Self::InstanceName => FailurePolicy::Degrade,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AccountId => "account id",
            Self::AccountAlias => "account alias",
            Self::ListInstances => "instance list",
            Self::InstanceName => "instance name",
        }
    }
}

/// Apply `step`'s failure policy to the outcome of its remote call.
///
/// `Break` means the scope is abandoned.
pub fn apply_policy<T>(
    step: DiscoveryStep,
    scope: &Scope,
    result: Result<T, DiscoveryError>,
    fallback: impl FnOnce() -> T,
) -> ControlFlow<(), T> {
    let error = match result {
        Ok(value) => return ControlFlow::Continue(value),
        Err(e) => e,
    };
    match step.failure_policy() {
        FailurePolicy::Abort => {
            log::warn!(
                "[{}] failed to retrieve {}, skipping scope: {}",
                scope.name,
                step.label(),
                error
            );
            ControlFlow::Break(())
        }
        FailurePolicy::Degrade => {
            log::info!(
                "[{}] failed to retrieve {}, using fallback: {}",
                scope.name,
                step.label(),
                error
            );
            ControlFlow::Continue(fallback())
        }
    }
}

/// Profile opening an SSM session to a discovered instance.
pub fn instance_profile(
    scope: &Scope,
    account_id: &str,
    alias: &str,
    instance_id: &str,
    name: &str,
) -> Profile {
    Profile::new(format!("{alias}:{}:ssm-{name}", scope.region))
        .initial_text(format!("bash -c 'AWS_PROFILE={} ssm {name}'", scope.name))
        .tags(["AWS".to_string(), alias.to_string(), format!("account={account_id}")])
        .origin(ProfileOrigin::Instance {
            scope: scope.name.clone(),
            instance_id: instance_id.to_string(),
        })
}

/// Run the four-step chain for one scope.
///
/// Blocking; never fails. Only instances won in `seen` are emitted.
pub fn discover_scope(
    directory: &dyn InstanceDirectory,
    scope: &Scope,
    seen: &DiscoveryAccumulator,
) -> Vec<Profile> {
    let ControlFlow::Continue(account_id) = apply_policy(
        DiscoveryStep::AccountId,
        scope,
        directory.caller_account(scope),
        String::new,
    ) else {
        return Vec::new();
    };

    let alias = match apply_policy(
        DiscoveryStep::AccountAlias,
        scope,
        directory.account_alias(scope),
        || None,
    ) {
        ControlFlow::Continue(Some(alias)) if !alias.is_empty() => alias,
        _ => account_id.clone(),
    };

    let ControlFlow::Continue(instance_ids) = apply_policy(
        DiscoveryStep::ListInstances,
        scope,
        directory.managed_instances(scope),
        Vec::new,
    ) else {
        return Vec::new();
    };

    crate::debug_log!(
        "DISCOVERY",
        "[{}] account {} ({}) has {} managed instances",
        scope.name,
        account_id,
        alias,
        instance_ids.len()
    );

    let mut profiles = Vec::new();
    for instance_id in instance_ids {
        if seen.contains(&instance_id) {
            crate::debug_log!("DISCOVERY", "[{}] {} already found", scope.name, instance_id);
            continue;
        }

        let name = match apply_policy(
            DiscoveryStep::InstanceName,
            scope,
            directory.instance_name(scope, &instance_id),
            || None,
        ) {
            ControlFlow::Continue(Some(name)) if !name.is_empty() => name,
            _ => instance_id.clone(),
        };

        if !seen.claim(&instance_id, &name) {
            crate::debug_log!("DISCOVERY", "[{}] {} claimed by another scope", scope.name, instance_id);
            continue;
        }

        crate::debug_trace!("DISCOVERY", "[{}] instance {} = {}", scope.name, instance_id, name);
        profiles.push(instance_profile(scope, &account_id, &alias, &instance_id, &name));
    }
    profiles
}

/// Result of one fan-out.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Emitted profiles, grouped by scope in input order
    pub profiles: Vec<Profile>,
    /// Final accumulator contents: instance id → name
    pub claimed: HashMap<String, String>,
    /// Scopes whose worker panicked
    pub failed_workers: usize,
}

/// Discover every scope concurrently and wait for all of them.
///
/// At most `concurrency` scopes (minimum 1) are in flight at once. There is
/// no cancellation; wrap the call in a timeout if latency must be bounded.
pub async fn fan_out(
    directory: Arc<dyn InstanceDirectory>,
    scopes: Vec<Scope>,
    concurrency: usize,
) -> DiscoveryReport {
    let seen = Arc::new(DiscoveryAccumulator::new());
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    crate::debug_info!(
        "DISCOVERY",
        "Discovering {} scopes ({} at a time)",
        scopes.len(),
        concurrency.max(1)
    );

    for (index, scope) in scopes.into_iter().enumerate() {
        let directory = Arc::clone(&directory);
        let seen = Arc::clone(&seen);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            // The semaphore is never closed, so acquire only fails on shutdown
            let _permit = permits.acquire_owned().await.ok();
            let name = scope.name.clone();
            let joined = tokio::task::spawn_blocking(move || {
                discover_scope(directory.as_ref(), &scope, &seen)
            })
            .await;
            (index, name, joined)
        });
    }

    let mut report = DiscoveryReport::default();
    let mut per_scope = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, _, Ok(profiles))) => per_scope.push((index, profiles)),
            Ok((_, name, Err(e))) => {
                log::error!("Discovery worker for scope '{}' failed: {}", name, e);
                report.failed_workers += 1;
            }
            Err(e) => {
                log::error!("Discovery task failed: {}", e);
                report.failed_workers += 1;
            }
        }
    }

    per_scope.sort_by_key(|(index, _)| *index);
    report.profiles = per_scope.into_iter().flat_map(|(_, p)| p).collect();
    report.claimed = seen.snapshot();

    crate::debug_info!(
        "DISCOVERY",
        "Discovered {} instances",
        report.profiles.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> Scope {
        Scope::new("p1", "eu-west-1")
    }

    fn failure() -> DiscoveryError {
        DiscoveryError::Missing {
            step: "test",
            what: "anything",
        }
    }

    #[test]
    fn test_failure_policies() {
        assert_eq!(DiscoveryStep::AccountId.failure_policy(), FailurePolicy::Abort);
        assert_eq!(DiscoveryStep::ListInstances.failure_policy(), FailurePolicy::Abort);
        assert_eq!(DiscoveryStep::AccountAlias.failure_policy(), FailurePolicy::Degrade);
        assert_eq!(DiscoveryStep::InstanceName.failure_policy(), FailurePolicy::Degrade);
    }

    #[test]
    fn test_apply_policy() {
        let ok = apply_policy(DiscoveryStep::AccountId, &scope(), Ok(1), || 0);
        assert_eq!(ok, ControlFlow::Continue(1));

        let aborted = apply_policy(DiscoveryStep::AccountId, &scope(), Err(failure()), || 0);
        assert_eq!(aborted, ControlFlow::Break(()));

        let degraded = apply_policy(DiscoveryStep::InstanceName, &scope(), Err(failure()), || 7);
        assert_eq!(degraded, ControlFlow::Continue(7));
    }

    #[test]
    fn test_instance_profile_shape() {
        let profile = instance_profile(&scope(), "111", "prod", "i-123", "web");
        assert_eq!(profile.name, "prod:eu-west-1:ssm-web");
        assert!(!profile.custom_command);
        assert_eq!(
            profile.initial_text.as_deref(),
            Some("bash -c 'AWS_PROFILE=p1 ssm web'")
        );
        let tags: Vec<_> = profile.tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["AWS", "account=111", "prod"]);

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["Custom Command"], "No");
    }
}
