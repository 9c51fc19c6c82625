//! Collection-wide rewrites applied after merge.
//!
//! - **Triggers**: the standard automation triggers (passphrase auto-fill,
//!   missing-package remediation, tool-specific fixes) plus any per-profile
//!   trigger file, attached to every profile except login parents
//! - **Chords**: the keyboard chord that injects a keychain secret, for every
//!   keychain-backed profile
//! - **Smart selection**: an "open SSM session" action on instance ids, for
//!   AWS account profiles
//!
//! Every pass skips what a profile already carries, so running a pass twice
//! changes nothing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use termprof_config::automation::selection_action;
use termprof_config::{
    KeyboardAction, Profile, ProfileOrigin, Profiles, SelectionPrecision, SmartSelectionAction,
    SmartSelectionRule, Trigger, TriggerAction,
};

/// Chord bound on keychain-backed profiles.
///
/// Every such profile gets the same chord; see [`assign_chords`].
pub const SECRET_CHORD: &str = "0x61-0x80000";

/// Package names that differ under yum.
const YUM_RENAMES: &[(&str, &str)] = &[("openssh-client", "openssh-clients")];

/// Install `package` with whichever of apt, yum or apk the remote shell has.
pub fn remediation_chain(package: &str) -> String {
    let yum_package = YUM_RENAMES
        .iter()
        .find(|(apt, _)| *apt == package)
        .map(|(_, yum)| *yum)
        .unwrap_or(package);
    format!(
        "(apt-get update && apt-get --yes --no-install-recommends install {package}) || (yum install --assumeyes {yum_package}) || apk add --no-cache {package}"
    )
}

fn not_found_regex(tool: &str) -> String {
    format!("^(bash|/bin/sh): {}: (command )?not found", regex::escape(tool))
}

/// The triggers every eligible profile receives.
pub fn standard_triggers(identity_files: &[PathBuf], packages: &BTreeMap<String, String>) -> Vec<Trigger> {
    let mut triggers = Vec::new();

    for key in identity_files {
        let Some(file_name) = key.file_name() else {
            continue;
        };
        triggers.push(
            Trigger::new(
                format!(
                    "^Enter passphrase for (key ')?{}",
                    regex::escape(&key.display().to_string())
                ),
                TriggerAction::Password,
                file_name.to_string_lossy(),
            )
            .partial(),
        );
    }

    for (tool, package) in packages {
        triggers.push(Trigger::new(
            not_found_regex(tool),
            TriggerAction::SendText,
            remediation_chain(package),
        ));
    }

    triggers.push(Trigger::new(
        r#"^This module is not yet installed. Run "terraform init" to install all modules"#,
        TriggerAction::SendText,
        "terraform init",
    ));
    triggers.push(Trigger::new(
        "^zsh: permission denied: .*",
        TriggerAction::SendText,
        "chmod +x !:0 && !!",
    ));
    triggers.push(Trigger::new(
        "^To push the current branch and set the remote as upstream",
        TriggerAction::SendText,
        "git push --set-upstream origin $(git rev-parse --abbrev-ref HEAD)",
    ));

    triggers
}

/// File name used for a profile's extra triggers.
pub fn trigger_file_name(profile_name: &str) -> String {
    let sanitized: String = profile_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{sanitized}.json")
}

/// Extra triggers from `<dir>/<profile>.json`.
///
/// A missing file means none. A malformed file or an invalid regex is
/// logged and skipped.
pub fn load_profile_triggers(dir: &Path, profile_name: &str) -> Vec<Trigger> {
    let path = dir.join(trigger_file_name(profile_name));
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            log::warn!("Cannot read trigger file {:?}: {}", path, e);
            return Vec::new();
        }
    };

    let triggers: Vec<Trigger> = match serde_json::from_str(&contents) {
        Ok(triggers) => triggers,
        Err(e) => {
            log::warn!("Ignoring malformed trigger file {:?}: {}", path, e);
            return Vec::new();
        }
    };

    triggers
        .into_iter()
        .filter(|trigger| match trigger.validate() {
            Ok(()) => true,
            Err(e) => {
                log::warn!(
                    "Ignoring trigger '{}' in {:?}: invalid regex: {}",
                    trigger.regex,
                    path,
                    e
                );
                false
            }
        })
        .collect()
}

/// Login parents only authenticate; they get no automation.
fn wants_triggers(profile: &Profile) -> bool {
    !profile.origin.is_login()
}

/// Append `triggers` the profile does not already react to. Returns how many were added.
fn append_missing(profile: &mut Profile, triggers: &[Trigger]) -> usize {
    let mut added = 0;
    for trigger in triggers {
        if profile.triggers.iter().any(|t| t.collides_with(trigger)) {
            continue;
        }
        if trigger.action.is_dangerous() {
            crate::debug_trace!(
                "AUGMENT",
                "'{}' gets {} trigger on '{}'",
                profile.name,
                trigger.action.display_name(),
                trigger.regex
            );
        }
        profile.triggers.push(trigger.clone());
        added += 1;
    }
    added
}

/// Attach the standard triggers and per-profile extras to every eligible profile.
///
/// Returns the number of triggers added.
pub fn assign_triggers(profiles: &mut Profiles, standard: &[Trigger], extras_dir: Option<&Path>) -> usize {
    let mut added = 0;
    for profile in profiles.iter_mut().filter(|p| wants_triggers(p)) {
        added += append_missing(profile, standard);
        if let Some(dir) = extras_dir {
            let extras = load_profile_triggers(dir, &profile.name);
            added += append_missing(profile, &extras);
        }
    }
    crate::debug_info!("AUGMENT", "Added {} triggers", added);
    added
}

/// Command that reads a keychain secret and evaluates it in the session.
pub fn secret_command(service: &str, account: &str) -> String {
    format!("eval $(/usr/bin/security find-generic-password -s {service} -w -a {account})")
}

/// Names of the profiles holding each chord, for chords held more than once.
pub fn chord_collisions(profiles: &Profiles) -> BTreeMap<String, Vec<String>> {
    let mut holders: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for profile in profiles {
        for chord in profile.keyboard_map.keys() {
            holders
                .entry(chord.clone())
                .or_default()
                .push(profile.name.clone());
        }
    }
    holders.retain(|_, names| names.len() > 1);
    holders
}

/// Bind [`SECRET_CHORD`] on every keychain-backed profile.
///
/// An existing binding on the chord is kept. Bindings live per profile, so
/// holders do not clash inside the terminal, but the same keystroke does a
/// different thing in each; more than one holder is reported as a warning.
/// Returns the number of bindings added.
pub fn assign_chords(profiles: &mut Profiles) -> usize {
    let mut added = 0;
    for profile in profiles.iter_mut() {
        let ProfileOrigin::SecretStore {
            ref service,
            ref account,
        } = profile.origin
        else {
            continue;
        };
        if let Some(existing) = profile.keyboard_map.get(SECRET_CHORD) {
            if existing.text != secret_command(service, account) {
                log::warn!(
                    "Profile '{}' already binds {}, keeping the existing binding",
                    profile.name,
                    SECRET_CHORD
                );
            }
            continue;
        }
        let action = KeyboardAction::send_text(secret_command(service, account));
        profile.keyboard_map.insert(SECRET_CHORD.to_string(), action);
        added += 1;
    }

    if let Some(holders) = chord_collisions(profiles).get(SECRET_CHORD) {
        log::warn!(
            "Chord {} is bound by {} profiles: {}",
            SECRET_CHORD,
            holders.len(),
            holders.join(", ")
        );
    }
    added
}

const INSTANCE_ID_REGEX: &str = r"\bi-[0-9a-f]{8,17}\b";

/// Smart-selection rule that opens an SSM session on a selected instance id.
pub fn ssm_session_rule(aws_profile: &str) -> SmartSelectionRule {
    SmartSelectionRule {
        notes: "EC2 instance id".to_string(),
        precision: SelectionPrecision::High,
        regex: INSTANCE_ID_REGEX.to_string(),
        actions: vec![SmartSelectionAction {
            title: format!("SSM session ({aws_profile})"),
            action: selection_action::SEND_TEXT,
            parameter: format!("aws ssm start-session --profile {aws_profile} --target \\0\n"),
        }],
    }
}

/// Add the instance-id rule to every AWS account profile that lacks it.
pub fn assign_smart_selection(profiles: &mut Profiles) -> usize {
    let mut added = 0;
    for profile in profiles.iter_mut() {
        let ProfileOrigin::AwsAccount {
            ref aws_profile, ..
        } = profile.origin
        else {
            continue;
        };
        if profile
            .smart_selection_rules
            .iter()
            .any(|r| r.regex == INSTANCE_ID_REGEX)
        {
            continue;
        }
        let rule = ssm_session_rule(aws_profile);
        profile.smart_selection_rules.push(rule);
        added += 1;
    }
    added
}
